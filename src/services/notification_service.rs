use std::collections::{BTreeMap, HashMap};

use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, EntityTrait, QueryFilter, QuerySelect, Set,
    TransactionTrait, sea_query::{LockType, OnConflict},
};

use crate::{
    audit::audit_best_effort,
    dto::products::{DispatchRequest, DispatchSummary, StockNotificationRequest},
    entity::{
        products::{Column as ProdCol, Entity as Products, Model as ProductModel},
        stock_notifications::{
            ActiveModel as WaitlistActive, Column as WaitCol, Entity as StockNotifications,
        },
        users::{Column as UserCol, Entity as Users},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    response::{ApiResponse, Meta},
    services::{
        email::{OutboxMessage, RestockedProduct},
        outbox_service,
    },
    state::AppState,
};

/// Invert `(product id, user key)` waitlist pairs into one product list per
/// user, covering only the restocked products. Products keep restock order.
pub fn plan_notifications(
    waitlist: &[(String, String)],
    restocked: &[RestockedProduct],
) -> BTreeMap<String, Vec<RestockedProduct>> {
    let mut plan: BTreeMap<String, Vec<RestockedProduct>> = BTreeMap::new();
    for product in restocked {
        for (_, user_key) in waitlist.iter().filter(|(pid, _)| *pid == product.id) {
            plan.entry(user_key.clone())
                .or_default()
                .push(product.clone());
        }
    }
    plan
}

/// Add the caller to a product's waitlist. Subscribing twice is a no-op.
pub async fn subscribe(
    state: &AppState,
    user: &AuthUser,
    payload: StockNotificationRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let product_id = payload
        .product_id
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::field("productId", "Product ID is missing."))?;

    Products::find_by_id(product_id.clone())
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found.".into()))?;

    let entry = WaitlistActive {
        product_id: Set(product_id.clone()),
        user_key: Set(user.user_key.clone()),
        created_at: Set(chrono::Utc::now().into()),
    };
    StockNotifications::insert(entry)
        .on_conflict(
            OnConflict::columns([WaitCol::ProductId, WaitCol::UserKey])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(&state.orm)
        .await?;

    tracing::info!(user = %user.user_key, product = %product_id, "stock notification registered");
    Ok(ApiResponse::success(
        "Notification request received.",
        serde_json::json!({ "productId": product_id }),
        Some(Meta::empty()),
    ))
}

/// Queue one back-in-stock email per waiting user and clear the handled
/// waitlist pairs. Runs inside the caller's transaction; products without
/// stock are ignored.
pub async fn dispatch_in_txn<C: ConnectionTrait>(
    conn: &C,
    products: &[ProductModel],
) -> AppResult<DispatchSummary> {
    let restocked: Vec<RestockedProduct> = products
        .iter()
        .filter(|p| p.stock > 0)
        .map(|p| RestockedProduct {
            id: p.id.clone(),
            name: p.name.clone(),
            price: p.price,
        })
        .collect();
    if restocked.is_empty() {
        return Ok(DispatchSummary::default());
    }

    let ids: Vec<String> = restocked.iter().map(|p| p.id.clone()).collect();
    let pairs: Vec<(String, String)> = StockNotifications::find()
        .filter(WaitCol::ProductId.is_in(ids))
        .lock(LockType::Update)
        .all(conn)
        .await?
        .into_iter()
        .map(|entry| (entry.product_id, entry.user_key))
        .collect();
    if pairs.is_empty() {
        return Ok(DispatchSummary::default());
    }

    let plan = plan_notifications(&pairs, &restocked);
    let users: HashMap<String, _> = Users::find()
        .filter(UserCol::UserKey.is_in(plan.keys().cloned()))
        .all(conn)
        .await?
        .into_iter()
        .map(|u| (u.user_key.clone(), u))
        .collect();

    let mut notified_users = 0;
    for (user_key, products) in plan {
        let Some(user) = users.get(&user_key) else {
            tracing::warn!(%user_key, "waitlisted user no longer exists; dropping entries");
            continue;
        };
        let name = if user.name.trim().is_empty() {
            "Valued Customer".to_string()
        } else {
            user.name.clone()
        };
        let message = OutboxMessage::BackInStock {
            email: user.email.clone(),
            name,
            products,
        };
        outbox_service::enqueue(conn, &message, None).await?;
        notified_users += 1;
    }

    let mut handled = Condition::any();
    for (product_id, user_key) in &pairs {
        handled = handled.add(
            Condition::all()
                .add(WaitCol::ProductId.eq(product_id.as_str()))
                .add(WaitCol::UserKey.eq(user_key.as_str())),
        );
    }
    let cleared = StockNotifications::delete_many()
        .filter(handled)
        .exec(conn)
        .await?;

    tracing::info!(
        notified_users,
        cleared = cleared.rows_affected,
        "stock notifications dispatched"
    );
    Ok(DispatchSummary {
        notified_users,
        cleared_entries: cleared.rows_affected as usize,
    })
}

pub async fn dispatch(
    state: &AppState,
    user: &AuthUser,
    payload: DispatchRequest,
) -> AppResult<ApiResponse<DispatchSummary>> {
    ensure_admin(user)?;
    if payload.product_ids.is_empty() {
        return Err(AppError::field("productIds", "At least one product id is required"));
    }

    let txn = state.orm.begin().await?;
    let products = Products::find()
        .filter(ProdCol::Id.is_in(payload.product_ids.clone()))
        .all(&txn)
        .await?;
    let summary = dispatch_in_txn(&txn, &products).await?;
    txn.commit().await?;

    audit_best_effort(
        &state.pool,
        Some(&user.user_key),
        "stock_notifications_dispatched",
        Some("stock_notifications"),
        Some(serde_json::json!({
            "product_ids": payload.product_ids,
            "notified_users": summary.notified_users,
        })),
    )
    .await;

    Ok(ApiResponse::success(
        "Notifications dispatched",
        summary,
        Some(Meta::empty()),
    ))
}
