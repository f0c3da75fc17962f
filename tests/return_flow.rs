mod common;

use chrono::{Duration, Utc};
use nila_store_api::{
    dto::{cart::ReplaceCartRequest, orders::PlaceOrderRequest, returns::ReturnFormFields},
    entity::orders::{ActiveModel as OrderActive, Entity as Orders},
    middleware::auth::AuthUser,
    models::{CartLine, OrderStatus},
    services::{
        cart_service,
        invoice_service::{self, InvoiceKind},
        order_service,
        return_service,
    },
    state::AppState,
};
use sea_orm::{ActiveModelTrait, EntityTrait, Set};

/// Place a one-line order and mark it delivered `days_ago`.
async fn delivered_order(state: &AppState, user: &AuthUser, days_ago: i64) -> anyhow::Result<String> {
    let product = common::create_product(state, "Handloom Dhoti", 899, 10).await?;
    let address_id = common::create_address(state, user).await?;
    cart_service::replace_cart(
        state,
        user,
        ReplaceCartRequest {
            items: vec![CartLine {
                id: product,
                name: "Handloom Dhoti".into(),
                quantity: 1,
            }],
        },
    )
    .await?;
    let placed = order_service::place_order(
        state,
        user,
        PlaceOrderRequest {
            address_id: Some(address_id),
        },
    )
    .await?
    .data
    .expect("order data");

    let order = Orders::find_by_id(placed.order_id.clone())
        .one(&state.orm)
        .await?
        .expect("order row");
    let mut active: OrderActive = order.into();
    active.status = Set(OrderStatus::Delivered.as_str().to_string());
    active.delivered_at = Set(Some((Utc::now() - Duration::days(days_ago)).into()));
    active.update(&state.orm).await?;

    Ok(placed.order_id)
}

fn return_form(order_id: &str) -> ReturnFormFields {
    ReturnFormFields {
        order_id: Some(order_id.to_string()),
        reason: Some("Size does not fit".into()),
        address_info: Some(r#"{"type":"same"}"#.into()),
        contact_info: Some(r#"{"type":"same"}"#.into()),
        video: Some(b"\x00\x00\x00\x18ftypmp42".to_vec()),
    }
}

#[tokio::test]
async fn delivered_order_can_be_returned_once() -> anyhow::Result<()> {
    let Some(database_url) = common::database_url() else {
        return Ok(());
    };
    let (state, root) = common::setup_state(&database_url).await?;
    let alice = common::create_user(&state, "Alice", "customer").await?;
    let order_id = delivered_order(&state, &alice, 3).await?;

    let no_return_yet = invoice_service::download_invoice(
        &state,
        &alice,
        order_id.clone(),
        InvoiceKind::Return,
    )
    .await
    .expect_err("no return invoice before a return");
    assert_eq!(no_return_yet.to_string(), "No return invoice exists for this order.");

    let resp = return_service::request_return(&state, &alice, return_form(&order_id)).await?;
    assert_eq!(resp.message, "Return requested successfully!");
    let data = resp.data.expect("return data");
    assert_eq!(data.new_status, OrderStatus::ReturnRequested);
    let return_id = data.return_invoice_id;
    assert!(return_id.starts_with("RET"));

    let video = root.join(format!("Alice/{return_id}/{return_id}_verification.mp4"));
    assert!(video.exists(), "missing {}", video.display());

    let order = order_service::get_order(&state, &alice, order_id.clone())
        .await?
        .data
        .expect("order");
    assert_eq!(order.status, OrderStatus::ReturnRequested);
    assert_eq!(order.return_invoice_id.as_deref(), Some(return_id.as_str()));
    let details = order.return_details.expect("return details");
    assert_eq!(details.pickup_contact, "9876543210");

    let again = return_service::request_return(&state, &alice, return_form(&order_id))
        .await
        .expect_err("second return");
    assert_eq!(again.to_string(), "Return already processed. Status: Return Requested");

    let invoice =
        invoice_service::download_invoice(&state, &alice, order_id, InvoiceKind::Return).await?;
    assert_eq!(invoice.filename, format!("NILA-Return-Invoice-{return_id}.pdf"));
    assert!(invoice.bytes.starts_with(b"%PDF"));

    let _ = tokio::fs::remove_dir_all(&root).await;
    Ok(())
}

#[tokio::test]
async fn returns_close_after_fifteen_days() -> anyhow::Result<()> {
    let Some(database_url) = common::database_url() else {
        return Ok(());
    };
    let (state, root) = common::setup_state(&database_url).await?;
    let bob = common::create_user(&state, "Bob", "customer").await?;
    let order_id = delivered_order(&state, &bob, 20).await?;

    let err = return_service::request_return(&state, &bob, return_form(&order_id))
        .await
        .expect_err("window expired");
    assert_eq!(err.to_string(), "The 15-day return window has expired.");
    let mut entries = tokio::fs::read_dir(&root).await?;
    assert!(entries.next_entry().await?.is_none(), "no video should be uploaded");
    let _ = tokio::fs::remove_dir_all(&root).await;

    Ok(())
}
