use sea_orm::{
    ActiveModelTrait, EntityTrait, QuerySelect, Set, TransactionTrait, sea_query::LockType,
};

use crate::{
    audit::audit_best_effort,
    dto::products::{DispatchSummary, RestockRequest, RestockResponse},
    entity::products::{ActiveModel as ProductActive, Entity as Products},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    response::{ApiResponse, Meta},
    services::{notification_service::dispatch_in_txn, product_service::product_from_entity},
    state::AppState,
};

/// Add stock to a product. When the product comes back from zero, waiting
/// users are notified in the same transaction.
#[tracing::instrument(skip(state, user, payload), fields(admin = %user.user_key))]
pub async fn restock(
    state: &AppState,
    user: &AuthUser,
    product_id: String,
    payload: RestockRequest,
) -> AppResult<ApiResponse<RestockResponse>> {
    ensure_admin(user)?;
    if payload.quantity <= 0 {
        return Err(AppError::field("quantity", "Quantity must be greater than zero"));
    }

    let txn = state.orm.begin().await?;

    let product = Products::find_by_id(product_id.clone())
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found.".into()))?;

    let previous = product.stock;
    let stock = previous
        .checked_add(payload.quantity)
        .ok_or_else(|| AppError::field("quantity", "Quantity is too large"))?;

    let mut active: ProductActive = product.into();
    active.stock = Set(stock);
    let product = active.update(&txn).await?;

    let summary = if previous <= 0 {
        dispatch_in_txn(&txn, std::slice::from_ref(&product)).await?
    } else {
        DispatchSummary::default()
    };

    txn.commit().await?;

    audit_best_effort(
        &state.pool,
        Some(&user.user_key),
        "product_restocked",
        Some("products"),
        Some(serde_json::json!({
            "product_id": product.id,
            "previous": previous,
            "stock": stock,
            "notified_users": summary.notified_users,
        })),
    )
    .await;

    Ok(ApiResponse::success(
        "Stock updated",
        RestockResponse {
            product: product_from_entity(product),
            notified_users: summary.notified_users,
        },
        Some(Meta::empty()),
    ))
}
