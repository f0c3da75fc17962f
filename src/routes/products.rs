use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};

use crate::{
    dto::products::{ProductList, StockMap, StockNotificationRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::{notification_service, product_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products))
        .route("/products/stocks", get(product_stocks))
        .route("/request_stock_notification", post(request_stock_notification))
}

#[utoipa::path(
    get,
    path = "/products",
    responses(
        (status = 200, description = "Full catalog", body = ApiResponse<ProductList>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    _user: AuthUser,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let resp = product_service::list_products(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/products/stocks",
    responses(
        (status = 200, description = "Available stock per product", body = ApiResponse<StockMap>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn product_stocks(
    State(state): State<AppState>,
    _user: AuthUser,
) -> AppResult<Json<ApiResponse<StockMap>>> {
    let resp = product_service::current_stocks(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/request_stock_notification",
    request_body = StockNotificationRequest,
    responses(
        (status = 200, description = "Added to the product waitlist", body = ApiResponse<serde_json::Value>),
        (status = 400, description = "Product ID is missing"),
        (status = 404, description = "Product not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn request_stock_notification(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<StockNotificationRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = notification_service::subscribe(&state, &user, payload).await?;
    Ok(Json(resp))
}
