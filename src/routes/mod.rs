use axum::{Router, routing::get};

use crate::state::AppState;

pub mod addresses;
pub mod admin;
pub mod auth;
pub mod careers;
pub mod cart;
pub mod doc;
pub mod health;
pub mod orders;
pub mod params;
pub mod products;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .nest("/auth", auth::router())
        .merge(products::router())
        .merge(cart::router())
        .merge(addresses::router())
        .merge(orders::router(max_upload_bytes))
        .merge(careers::router(max_upload_bytes))
        .merge(admin::router())
}
