use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::{
        outbox::{OutboxList, OutboxQuery},
        products::{DispatchRequest, DispatchSummary, RestockRequest, RestockResponse},
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::OutboxEvent,
    response::ApiResponse,
    services::{admin_service, notification_service, outbox_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/products/{id}/restock", post(restock_product))
        .route("/admin/notifications/dispatch", post(dispatch_notifications))
        .route("/admin/outbox", get(list_outbox))
        .route("/admin/outbox/{id}/retry", post(retry_outbox_event))
}

#[utoipa::path(
    post,
    path = "/admin/products/{id}/restock",
    params(("id" = String, Path, description = "Product ID")),
    request_body = RestockRequest,
    responses(
        (status = 200, description = "Stock increased; waitlisted users notified when the product was sold out", body = ApiResponse<RestockResponse>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Product not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn restock_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<RestockRequest>,
) -> AppResult<Json<ApiResponse<RestockResponse>>> {
    let resp = admin_service::restock(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/admin/notifications/dispatch",
    request_body = DispatchRequest,
    responses(
        (status = 200, description = "Back-in-stock emails queued", body = ApiResponse<DispatchSummary>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn dispatch_notifications(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<DispatchRequest>,
) -> AppResult<Json<ApiResponse<DispatchSummary>>> {
    let resp = notification_service::dispatch(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/admin/outbox",
    params(OutboxQuery),
    responses(
        (status = 200, description = "Outbox events, newest first", body = ApiResponse<OutboxList>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_outbox(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OutboxQuery>,
) -> AppResult<Json<ApiResponse<OutboxList>>> {
    let resp = outbox_service::list_events(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/admin/outbox/{id}/retry",
    params(("id" = Uuid, Path, description = "Outbox event ID")),
    responses(
        (status = 200, description = "Event requeued", body = ApiResponse<OutboxEvent>),
        (status = 400, description = "Event already processed"),
        (status = 404, description = "Outbox event not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn retry_outbox_event(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OutboxEvent>>> {
    let resp = outbox_service::retry_event(&state, &user, id).await?;
    Ok(Json(resp))
}
