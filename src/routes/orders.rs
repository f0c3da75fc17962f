use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
};

use crate::{
    dto::{
        orders::{OrderList, PlaceOrderRequest, PlaceOrderResponse},
        returns::{ReturnFormFields, ReturnRequestResponse, ReturnUpload},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Order,
    response::ApiResponse,
    routes::params::OrderListQuery,
    services::{
        invoice_service::{self, InvoiceFile, InvoiceKind},
        order_service, return_service,
    },
    state::AppState,
};

pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_orders))
        .route("/orders/{id}", get(get_order))
        .route("/place_order", post(place_order))
        .route(
            "/request_return",
            post(request_return).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/download_invoice/{order_id}", get(download_invoice))
        .route("/download_return_invoice/{order_id}", get(download_return_invoice))
}

#[utoipa::path(
    get,
    path = "/orders",
    params(OrderListQuery),
    responses(
        (status = 200, description = "Order history with items", body = ApiResponse<OrderList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = order_service::list_orders(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/orders/{id}",
    params(("id" = String, Path, description = "Order ID, e.g. ORD04213")),
    responses(
        (status = 200, description = "Order with items", body = ApiResponse<Order>),
        (status = 404, description = "Order not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = order_service::get_order(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/place_order",
    request_body = PlaceOrderRequest,
    responses(
        (status = 200, description = "Order placed. `orderId`, `invoiceId`, `status` and `totalAmount` are under `data`", body = ApiResponse<PlaceOrderResponse>),
        (status = 400, description = "Empty cart or invalid address; `data.error` repeats the message"),
        (status = 409, description = "Cart adjusted to current stock. `success` is false; `data.cart_updated` is true and `data.updated_cart` holds the stored cart")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn place_order(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<PlaceOrderRequest>,
) -> AppResult<Json<ApiResponse<PlaceOrderResponse>>> {
    let resp = order_service::place_order(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/request_return",
    request_body(content = ReturnUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Return requested. `newStatus` and `returnInvoiceId` are under `data`", body = ApiResponse<ReturnRequestResponse>),
        (status = 400, description = "Incomplete data or order not eligible"),
        (status = 404, description = "Order not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Returns"
)]
pub async fn request_return(
    State(state): State<AppState>,
    user: AuthUser,
    mut multipart: Multipart,
) -> AppResult<Json<ApiResponse<ReturnRequestResponse>>> {
    let malformed = |err: axum::extract::multipart::MultipartError| {
        tracing::debug!(error = %err, "unreadable return form");
        AppError::BadRequest("Malformed request data.".into())
    };

    let mut fields = ReturnFormFields::default();
    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "orderId" => fields.order_id = Some(field.text().await.map_err(malformed)?),
            "reason" => fields.reason = Some(field.text().await.map_err(malformed)?),
            "addressInfo" => fields.address_info = Some(field.text().await.map_err(malformed)?),
            "contactInfo" => fields.contact_info = Some(field.text().await.map_err(malformed)?),
            "videoFile" => fields.video = Some(field.bytes().await.map_err(malformed)?.to_vec()),
            _ => {}
        }
    }

    let resp = return_service::request_return(&state, &user, fields).await?;
    Ok(Json(resp))
}

fn pdf_attachment(file: InvoiceFile) -> Response {
    (
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file.filename),
            ),
        ],
        file.bytes,
    )
        .into_response()
}

#[utoipa::path(
    get,
    path = "/download_invoice/{order_id}",
    params(("order_id" = String, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Tax invoice PDF attachment"),
        (status = 404, description = "Order not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn download_invoice(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<String>,
) -> AppResult<Response> {
    let file = invoice_service::download_invoice(&state, &user, order_id, InvoiceKind::Tax).await?;
    Ok(pdf_attachment(file))
}

#[utoipa::path(
    get,
    path = "/download_return_invoice/{order_id}",
    params(("order_id" = String, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Return invoice PDF attachment"),
        (status = 404, description = "Order not found or no return invoice exists")
    ),
    security(("bearer_auth" = [])),
    tag = "Returns"
)]
pub async fn download_return_invoice(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<String>,
) -> AppResult<Response> {
    let file =
        invoice_service::download_invoice(&state, &user, order_id, InvoiceKind::Return).await?;
    Ok(pdf_attachment(file))
}
