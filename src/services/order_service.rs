use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use rand::Rng;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
    sea_query::{Expr, LockType},
};

use crate::{
    audit::audit_best_effort,
    dto::orders::{OrderList, PlaceOrderRequest, PlaceOrderResponse},
    entity::{
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
            Model as OrderItemModel,
        },
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        products::{Column as ProdCol, Entity as Products, Model as ProductModel},
        shipping_addresses::{Column as AddrCol, Entity as ShippingAddresses},
        users::{Column as UserCol, Entity as Users},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{
        AddressSnapshot, CartLine, DELIVERY_DATE_FORMAT, Order, OrderLineItem, OrderStatus,
        ReturnDetails,
    },
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::{
        address_service::snapshot_from_entity,
        cart_service::{load_cart, store_cart, validate_cart},
        email::OutboxMessage,
        id_service::{DbReservations, IdAllocator, IdCategory, reserve},
        outbox_service,
    },
    state::AppState,
};

/// Checkout: validate the cart against locked stock rows, then write the
/// order, clear the cart and decrement stock in one transaction.
#[tracing::instrument(skip(state, user, payload), fields(user = %user.user_key))]
pub async fn place_order(
    state: &AppState,
    user: &AuthUser,
    payload: PlaceOrderRequest,
) -> AppResult<ApiResponse<PlaceOrderResponse>> {
    let address_id = payload
        .address_id
        .ok_or_else(|| AppError::field("address_id", "Shipping address ID is required."))?;

    let txn = state.orm.begin().await?;

    let customer = Users::find_by_id(user.user_key.clone())
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found.".into()))?;

    let cart = load_cart(&txn, &customer.user_key).await?;
    if cart.is_empty() {
        return Err(AppError::BadRequest("Your cart is empty.".into()));
    }

    let address = ShippingAddresses::find_by_id(address_id)
        .filter(AddrCol::UserKey.eq(customer.user_key.as_str()))
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::BadRequest("Invalid shipping address selected.".into()))?;

    let wanted = aggregate_quantities(&cart);
    let products: HashMap<String, ProductModel> = Products::find()
        .filter(ProdCol::Id.is_in(wanted.keys().cloned()))
        .order_by_asc(ProdCol::Id)
        .lock(LockType::Update)
        .all(&txn)
        .await?
        .into_iter()
        .map(|p| (p.id.clone(), p))
        .collect();
    let stock: HashMap<String, i32> = products.iter().map(|(id, p)| (id.clone(), p.stock)).collect();

    let validation = validate_cart(&cart, &stock);
    if !validation.is_clean() {
        store_cart(&txn, &customer.user_key, &validation.lines).await?;
        txn.commit().await?;
        tracing::info!(adjustments = validation.adjustments.len(), "cart adjusted at checkout");
        return Err(AppError::CartChanged {
            message: validation.summary(),
            updated_cart: validation.lines,
        });
    }

    let items: Vec<OrderLineItem> = validation
        .lines
        .iter()
        .filter_map(|line| products.get(&line.id).map(|p| line_item(p, line.quantity)))
        .collect();
    let total_amount: i64 = items.iter().map(OrderLineItem::line_total).sum();

    let allocator = IdAllocator::default();
    let order_id = allocator
        .generate(&DbReservations(&txn), IdCategory::Orders)
        .await?;
    let invoice_id = allocator
        .generate(&DbReservations(&txn), IdCategory::Invoices)
        .await?;

    let status = pick_fulfilment_status();
    let now = Utc::now();
    let shipping_address = snapshot_from_entity(&address);

    OrderActive {
        order_id: Set(order_id.clone()),
        user_key: Set(customer.user_key.clone()),
        invoice_id: Set(invoice_id.clone()),
        status: Set(status.as_str().to_string()),
        shipping_address: Set(serde_json::to_value(&shipping_address).map_err(anyhow::Error::from)?),
        total_amount: Set(total_amount),
        delivered_at: Set((status == OrderStatus::Delivered).then(|| now.into())),
        return_invoice_id: Set(None),
        return_reason: Set(None),
        return_video_url: Set(None),
        return_pickup_address: Set(None),
        return_pickup_contact: Set(None),
        return_requested_at: Set(None),
        created_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;

    let rows = items.iter().enumerate().map(|(position, item)| OrderItemActive {
        order_id: Set(order_id.clone()),
        position: Set(position as i32),
        product_id: Set(item.id.clone()),
        name: Set(item.name.clone()),
        price: Set(item.price),
        quantity: Set(item.quantity),
        image: Set(item.image.clone()),
        description: Set(item.description.clone()),
    });
    OrderItems::insert_many(rows).exec(&txn).await?;

    store_cart(&txn, &customer.user_key, &[]).await?;

    Users::update_many()
        .col_expr(UserCol::OrderCount, Expr::col(UserCol::OrderCount).add(1))
        .filter(UserCol::UserKey.eq(customer.user_key.as_str()))
        .exec(&txn)
        .await?;

    reserve(&txn, IdCategory::Orders, &order_id).await?;
    reserve(&txn, IdCategory::Invoices, &invoice_id).await?;

    for (product_id, quantity) in &wanted {
        let updated = Products::update_many()
            .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).sub(*quantity))
            .filter(ProdCol::Id.eq(product_id.as_str()))
            .filter(ProdCol::Stock.gte(*quantity))
            .exec(&txn)
            .await?;
        if updated.rows_affected != 1 {
            return Err(AppError::BadRequest(format!(
                "Insufficient stock for product {product_id}"
            )));
        }
    }

    outbox_service::enqueue(
        &txn,
        &OutboxMessage::OrderConfirmation {
            email: customer.email.clone(),
            name: customer.name.clone(),
            order_id: order_id.clone(),
            items,
            shipping_address,
        },
        Some(format!("order_confirmation:{order_id}")),
    )
    .await?;

    txn.commit().await?;

    tracing::info!(%order_id, %invoice_id, status = %status, total_amount, "order placed");
    audit_best_effort(
        &state.pool,
        Some(&customer.user_key),
        "order_placed",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order_id, "total_amount": total_amount })),
    )
    .await;

    Ok(ApiResponse::success(
        "Order placed successfully!",
        PlaceOrderResponse {
            order_id,
            invoice_id,
            status,
            total_amount,
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all().add(OrderCol::UserKey.eq(user.user_key.as_str()));
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::Status.eq(status.clone()));
    }

    let mut finder = Orders::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;
    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let mut items_by_order: HashMap<String, Vec<OrderItemModel>> = HashMap::new();
    if !orders.is_empty() {
        let ids: Vec<String> = orders.iter().map(|o| o.order_id.clone()).collect();
        for item in OrderItems::find()
            .filter(OrderItemCol::OrderId.is_in(ids))
            .order_by_asc(OrderItemCol::Position)
            .all(&state.orm)
            .await?
        {
            items_by_order.entry(item.order_id.clone()).or_default().push(item);
        }
    }

    let items = orders
        .into_iter()
        .map(|order| {
            let lines = items_by_order.remove(&order.order_id).unwrap_or_default();
            order_from_entity(order, lines)
        })
        .collect::<AppResult<Vec<_>>>()?;

    Ok(ApiResponse::success(
        "Ok",
        OrderList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    order_id: String,
) -> AppResult<ApiResponse<Order>> {
    let order = fetch_order(&state.orm, &user.user_key, &order_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found.".into()))?;

    Ok(ApiResponse::success("OK", order, Some(Meta::empty())))
}

/// Load one of `user_key`'s orders together with its line items.
pub async fn fetch_order<C: ConnectionTrait>(
    conn: &C,
    user_key: &str,
    order_id: &str,
) -> AppResult<Option<Order>> {
    let Some(order) = Orders::find_by_id(order_id.to_string())
        .filter(OrderCol::UserKey.eq(user_key))
        .one(conn)
        .await?
    else {
        return Ok(None);
    };

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.order_id.as_str()))
        .order_by_asc(OrderItemCol::Position)
        .all(conn)
        .await?;

    order_from_entity(order, items).map(Some)
}

pub fn order_from_entity(model: OrderModel, items: Vec<OrderItemModel>) -> AppResult<Order> {
    let status: OrderStatus = model.status.parse()?;
    let shipping_address: AddressSnapshot =
        serde_json::from_value(model.shipping_address).map_err(anyhow::Error::from)?;
    let delivered_at = model.delivered_at.map(|t| t.with_timezone(&Utc));

    let return_details = match (model.return_reason, model.return_requested_at) {
        (Some(reason), Some(requested_at)) => Some(ReturnDetails {
            reason,
            video_url: model.return_video_url.unwrap_or_default(),
            pickup_address: model
                .return_pickup_address
                .map(serde_json::from_value)
                .transpose()
                .map_err(anyhow::Error::from)?
                .unwrap_or_else(|| shipping_address.clone()),
            pickup_contact: model.return_pickup_contact.unwrap_or_default(),
            requested_at: requested_at.with_timezone(&Utc),
        }),
        _ => None,
    };

    Ok(Order {
        order_id: model.order_id,
        invoice_id: model.invoice_id,
        placed_at: model.created_at.with_timezone(&Utc),
        status,
        items: items
            .into_iter()
            .map(|item| OrderLineItem {
                id: item.product_id,
                name: item.name,
                price: item.price,
                quantity: item.quantity,
                image: item.image,
                description: item.description,
            })
            .collect(),
        shipping_address,
        total_amount: model.total_amount,
        delivered_at,
        delivery_date: delivered_at.map(|t| t.format(DELIVERY_DATE_FORMAT).to_string()),
        return_invoice_id: model.return_invoice_id,
        return_details,
    })
}

/// Total quantity per product. Lines repeating a product share one stock row.
fn aggregate_quantities(cart: &[CartLine]) -> BTreeMap<String, i32> {
    let mut wanted = BTreeMap::new();
    for line in cart {
        *wanted.entry(line.id.clone()).or_insert(0) += line.quantity;
    }
    wanted
}

fn line_item(product: &ProductModel, quantity: i32) -> OrderLineItem {
    OrderLineItem {
        id: product.id.clone(),
        name: product.name.clone(),
        price: product.price,
        quantity,
        image: product.image.clone(),
        description: product.description.clone(),
    }
}

// Fulfilment is simulated.
fn pick_fulfilment_status() -> OrderStatus {
    let index = rand::rng().random_range(0..OrderStatus::FULFILMENT.len());
    OrderStatus::FULFILMENT[index]
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    use super::*;

    fn order_model() -> OrderModel {
        let placed = Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap();
        OrderModel {
            order_id: "ORD04213".into(),
            user_key: "alice_example_com".into(),
            invoice_id: "INV77120".into(),
            status: "Delivered".into(),
            shipping_address: json!({
                "address": "14 Lake Road",
                "city": "Coimbatore",
                "state": "Tamil Nadu",
                "pincode": "641001",
                "country": "India",
                "phone": "9876543210"
            }),
            total_amount: 2598,
            delivered_at: Some(Utc.with_ymd_and_hms(2025, 3, 4, 12, 0, 0).unwrap().into()),
            return_invoice_id: None,
            return_reason: None,
            return_video_url: None,
            return_pickup_address: None,
            return_pickup_contact: None,
            return_requested_at: None,
            created_at: placed.into(),
        }
    }

    fn item_model(position: i32) -> OrderItemModel {
        OrderItemModel {
            order_id: "ORD04213".into(),
            position,
            product_id: "item002".into(),
            name: "Urban Comfort Kurti".into(),
            price: 1299,
            quantity: 2,
            image: None,
            description: None,
        }
    }

    #[test]
    fn maps_order_rows_with_formatted_delivery_date() {
        let order = order_from_entity(order_model(), vec![item_model(0)]).unwrap();
        assert_eq!(order.status, OrderStatus::Delivered);
        assert_eq!(order.delivery_date.as_deref(), Some("04-Mar-2025"));
        assert_eq!(order.shipping_address.city, "Coimbatore");
        assert_eq!(order.items[0].line_total(), 2598);
        assert!(order.return_details.is_none());
    }

    #[test]
    fn return_without_custom_pickup_falls_back_to_shipping_address() {
        let mut model = order_model();
        model.status = "Return Requested".into();
        model.return_invoice_id = Some("RET00042".into());
        model.return_reason = Some("Wrong size".into());
        model.return_pickup_contact = Some("9876543210".into());
        model.return_requested_at = Some(Utc::now().into());

        let order = order_from_entity(model, vec![]).unwrap();
        let details = order.return_details.unwrap();
        assert_eq!(details.pickup_address.address, "14 Lake Road");
        assert_eq!(order.return_invoice_id.as_deref(), Some("RET00042"));
    }

    #[test]
    fn unknown_status_is_an_error() {
        let mut model = order_model();
        model.status = "Lost".into();
        assert!(order_from_entity(model, vec![]).is_err());
    }

    #[test]
    fn repeated_products_share_one_quantity() {
        let cart = vec![
            CartLine { id: "item002".into(), name: "Kurti".into(), quantity: 2 },
            CartLine { id: "item001".into(), name: "Saree".into(), quantity: 1 },
            CartLine { id: "item002".into(), name: "Kurti".into(), quantity: 3 },
        ];
        let wanted = aggregate_quantities(&cart);
        assert_eq!(wanted["item002"], 5);
        assert_eq!(wanted["item001"], 1);
    }

    #[test]
    fn fulfilment_status_never_starts_a_return() {
        for _ in 0..50 {
            assert!(!pick_fulfilment_status().is_return_processed());
        }
    }
}
