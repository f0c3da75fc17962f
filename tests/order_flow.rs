mod common;

use nila_store_api::{
    dto::{cart::ReplaceCartRequest, orders::PlaceOrderRequest},
    entity::{
        outbox_events::{Column as OutboxCol, Entity as OutboxEvents},
        products::Entity as Products,
        users::Entity as Users,
    },
    error::AppError,
    middleware::auth::AuthUser,
    models::CartLine,
    routes::params::OrderListQuery,
    services::{cart_service, order_service},
    state::AppState,
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

fn line(id: &str, name: &str, quantity: i32) -> CartLine {
    CartLine {
        id: id.to_string(),
        name: name.to_string(),
        quantity,
    }
}

// Checkout decrements stock, clears the cart, bumps the order count and
// queues the confirmation email.
#[tokio::test]
async fn checkout_places_order_and_decrements_stock() -> anyhow::Result<()> {
    let Some(database_url) = common::database_url() else {
        return Ok(());
    };
    let (state, _root) = common::setup_state(&database_url).await?;

    let alice = common::create_user(&state, "Alice", "customer").await?;
    let kurti = common::create_product(&state, "Urban Comfort Kurti", 1299, 25).await?;
    let address_id = common::create_address(&state, &alice).await?;

    cart_service::replace_cart(
        &state,
        &alice,
        ReplaceCartRequest {
            items: vec![line(&kurti, "Urban Comfort Kurti", 2)],
        },
    )
    .await?;

    let placed = order_service::place_order(
        &state,
        &alice,
        PlaceOrderRequest {
            address_id: Some(address_id),
        },
    )
    .await?;
    assert_eq!(placed.message, "Order placed successfully!");
    let placed = placed.data.expect("order data");
    assert_eq!(placed.total_amount, 2598);
    let id_shape = regex::Regex::new(r"^ORD(\d{5}|\d{8})$")?;
    assert!(id_shape.is_match(&placed.order_id), "{}", placed.order_id);
    assert!(placed.invoice_id.starts_with("INV"));

    let product = Products::find_by_id(kurti.clone())
        .one(&state.orm)
        .await?
        .expect("product");
    assert_eq!(product.stock, 23);

    let cart = cart_service::get_cart(&state, &alice).await?;
    assert!(cart.data.expect("cart").items.is_empty());

    let customer = Users::find_by_id(alice.user_key.clone())
        .one(&state.orm)
        .await?
        .expect("user");
    assert_eq!(customer.order_count, 1);

    let confirmation = OutboxEvents::find()
        .filter(OutboxCol::IdempotencyKey.eq(format!("order_confirmation:{}", placed.order_id)))
        .one(&state.orm)
        .await?
        .expect("confirmation event");
    assert_eq!(confirmation.kind, "order_confirmation");
    assert_eq!(confirmation.payload["email"], alice.email.as_str());

    let orders = order_service::list_orders(&state, &alice, OrderListQuery::default()).await?;
    let orders = orders.data.expect("orders").items;
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].items[0].quantity, 2);
    assert_eq!(orders[0].total_amount, 2598);

    Ok(())
}

// Over-quantity lines are clamped, sold-out lines dropped, and nothing is
// ordered until the shopper confirms the adjusted cart.
#[tokio::test]
async fn checkout_conflict_rewrites_cart() -> anyhow::Result<()> {
    let Some(database_url) = common::database_url() else {
        return Ok(());
    };
    let (state, _root) = common::setup_state(&database_url).await?;

    let bob = common::create_user(&state, "Bob", "customer").await?;
    let kurti = common::create_product(&state, "Kurti", 1299, 3).await?;
    let dupatta = common::create_product(&state, "Dupatta", 499, 0).await?;
    let address_id = common::create_address(&state, &bob).await?;

    cart_service::replace_cart(
        &state,
        &bob,
        ReplaceCartRequest {
            items: vec![line(&kurti, "Kurti", 5), line(&dupatta, "Dupatta", 1)],
        },
    )
    .await?;

    let err = order_service::place_order(
        &state,
        &bob,
        PlaceOrderRequest {
            address_id: Some(address_id),
        },
    )
    .await
    .expect_err("cart should conflict");

    let (message, updated_cart) = match err {
        AppError::CartChanged {
            message,
            updated_cart,
        } => (message, updated_cart),
        other => panic!("expected a cart conflict, got {other:?}"),
    };
    assert!(message.contains("Kurti"), "{message}");
    assert!(message.contains("Dupatta"), "{message}");
    assert_eq!(updated_cart, vec![line(&kurti, "Kurti", 3)]);

    let stored = cart_service::load_cart(&state.orm, &bob.user_key).await?;
    assert_eq!(stored, updated_cart);

    let product = Products::find_by_id(kurti.clone())
        .one(&state.orm)
        .await?
        .expect("product");
    assert_eq!(product.stock, 3);

    // The adjusted cart now goes through.
    let placed = order_service::place_order(
        &state,
        &bob,
        PlaceOrderRequest {
            address_id: Some(address_id),
        },
    )
    .await?
    .data
    .expect("order data");
    assert_eq!(placed.total_amount, 3 * 1299);

    Ok(())
}

// The same product on two lines is validated against one stock row.
#[tokio::test]
async fn repeated_product_lines_are_clamped_together() -> anyhow::Result<()> {
    let Some(database_url) = common::database_url() else {
        return Ok(());
    };
    let (state, _root) = common::setup_state(&database_url).await?;

    let carol = common::create_user(&state, "Carol", "customer").await?;
    let kurti = common::create_product(&state, "Kurti", 1299, 3).await?;
    let address_id = common::create_address(&state, &carol).await?;

    cart_service::replace_cart(
        &state,
        &carol,
        ReplaceCartRequest {
            items: vec![line(&kurti, "Kurti", 2), line(&kurti, "Kurti", 2)],
        },
    )
    .await?;

    let err = order_service::place_order(
        &state,
        &carol,
        PlaceOrderRequest {
            address_id: Some(address_id),
        },
    )
    .await
    .expect_err("cart should conflict");
    let updated_cart = match err {
        AppError::CartChanged { updated_cart, .. } => updated_cart,
        other => panic!("expected a cart conflict, got {other:?}"),
    };
    assert_eq!(
        updated_cart,
        vec![line(&kurti, "Kurti", 2), line(&kurti, "Kurti", 1)]
    );
    assert_eq!(
        cart_service::load_cart(&state.orm, &carol.user_key).await?,
        updated_cart
    );

    let placed = order_service::place_order(
        &state,
        &carol,
        PlaceOrderRequest {
            address_id: Some(address_id),
        },
    )
    .await?
    .data
    .expect("order data");
    assert_eq!(placed.total_amount, 3 * 1299);

    let product = Products::find_by_id(kurti).one(&state.orm).await?.expect("product");
    assert_eq!(product.stock, 0);

    Ok(())
}

async fn shopper_with_cart(
    state: &AppState,
    name: &str,
    product_id: &str,
    quantity: i32,
) -> anyhow::Result<(AuthUser, Uuid)> {
    let user = common::create_user(state, name, "customer").await?;
    let address_id = common::create_address(state, &user).await?;
    cart_service::replace_cart(
        state,
        &user,
        ReplaceCartRequest {
            items: vec![line(product_id, "Silk Saree", quantity)],
        },
    )
    .await?;
    Ok((user, address_id))
}

// Concurrent checkouts for the last units: one wins, the others see the
// stock change, and stock ends at zero.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_checkouts_never_oversell() -> anyhow::Result<()> {
    let Some(database_url) = common::database_url() else {
        return Ok(());
    };
    let (state, _root) = common::setup_state(&database_url).await?;
    let saree = common::create_product(&state, "Silk Saree", 4999, 2).await?;

    let mut shoppers = Vec::new();
    for i in 0..4 {
        shoppers.push(shopper_with_cart(&state, &format!("Shopper{i}"), &saree, 2).await?);
    }

    let mut handles = Vec::new();
    for (user, address_id) in shoppers {
        let state = state.clone();
        handles.push(tokio::spawn(async move {
            order_service::place_order(
                &state,
                &user,
                PlaceOrderRequest {
                    address_id: Some(address_id),
                },
            )
            .await
        }));
    }

    let mut placed = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await? {
            Ok(_) => placed += 1,
            Err(AppError::CartChanged { updated_cart, .. }) => {
                assert!(updated_cart.is_empty());
                conflicts += 1;
            }
            Err(other) => panic!("unexpected checkout error: {other:?}"),
        }
    }
    assert_eq!(placed, 1);
    assert_eq!(conflicts, 3);

    let product = Products::find_by_id(saree).one(&state.orm).await?.expect("product");
    assert_eq!(product.stock, 0);

    Ok(())
}
