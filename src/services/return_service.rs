use chrono::{DateTime, Duration, NaiveTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QuerySelect, Set, TransactionTrait,
    sea_query::LockType,
};

use crate::{
    audit::audit_best_effort,
    dto::returns::{AddressInfo, ContactInfo, ReturnForm, ReturnFormFields, ReturnRequestResponse},
    entity::{
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        users::{Entity as Users, Model as UserModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{AddressSnapshot, OrderStatus},
    response::{ApiResponse, Meta},
    services::{
        email::OutboxMessage,
        id_service::{DbReservations, IdAllocator, IdCategory, reserve},
        outbox_service,
        storage::return_video_key,
    },
    state::AppState,
};

pub const RETURN_WINDOW_DAYS: i64 = 15;

const INCOMPLETE: &str = "Incomplete return request data.";
const SAME: &str = "same";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReturnRejection {
    #[error("Return already processed. Status: {0}")]
    AlreadyProcessed(OrderStatus),
    #[error("Only delivered items can be returned.")]
    NotDelivered,
    #[error("Delivery date not found.")]
    MissingDeliveryDate,
    #[error("The 15-day return window has expired.")]
    WindowExpired,
}

impl From<ReturnRejection> for AppError {
    fn from(value: ReturnRejection) -> Self {
        AppError::BadRequest(value.to_string())
    }
}

/// A return is allowed for delivered orders up to and including exactly
/// fifteen days after the start of the delivery day (UTC), the same day
/// shown as the order's delivery date.
pub fn check_return_eligibility(
    status: OrderStatus,
    delivered_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<(), ReturnRejection> {
    if status.is_return_processed() {
        return Err(ReturnRejection::AlreadyProcessed(status));
    }
    if status != OrderStatus::Delivered {
        return Err(ReturnRejection::NotDelivered);
    }
    let delivered_at = delivered_at.ok_or(ReturnRejection::MissingDeliveryDate)?;
    let delivery_day = delivered_at.date_naive().and_time(NaiveTime::MIN).and_utc();
    if now - delivery_day > Duration::days(RETURN_WINDOW_DAYS) {
        return Err(ReturnRejection::WindowExpired);
    }
    Ok(())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub fn parse_return_form(fields: ReturnFormFields) -> AppResult<ReturnForm> {
    let (Some(order_id), Some(reason), Some(address_info), Some(contact_info), Some(video)) = (
        non_empty(fields.order_id),
        non_empty(fields.reason),
        non_empty(fields.address_info),
        non_empty(fields.contact_info),
        fields.video.filter(|v| !v.is_empty()),
    ) else {
        return Err(AppError::BadRequest(INCOMPLETE.into()));
    };

    let malformed = |_| AppError::BadRequest("Malformed request data.".into());
    let address_info: AddressInfo = serde_json::from_str(&address_info).map_err(malformed)?;
    let contact_info: ContactInfo = serde_json::from_str(&contact_info).map_err(malformed)?;

    Ok(ReturnForm {
        order_id: order_id.trim().to_string(),
        reason: reason.trim().to_string(),
        address_info,
        contact_info,
        video,
    })
}

/// Pickup address and contact: the order's shipping details when the caller
/// asks for `same`, otherwise the supplied alternates.
pub fn resolve_pickup(
    form: &ReturnForm,
    shipping: &AddressSnapshot,
) -> AppResult<(AddressSnapshot, String)> {
    let mut address = if form.address_info.kind == SAME {
        shipping.clone()
    } else {
        form.address_info
            .custom_address
            .clone()
            .filter(|a| !a.address.trim().is_empty())
            .ok_or_else(|| AppError::BadRequest(INCOMPLETE.into()))?
    };

    let contact = if form.contact_info.kind == SAME {
        shipping.phone.clone()
    } else {
        form.contact_info
            .custom_contact
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .ok_or_else(|| AppError::BadRequest(INCOMPLETE.into()))?
    };

    if address.phone.is_empty() {
        address.phone = contact.clone();
    }
    Ok((address, contact))
}

fn order_status(order: &OrderModel) -> AppResult<OrderStatus> {
    Ok(order.status.parse()?)
}

/// Open a return: upload the verification video, then flip the order to
/// Return Requested. The upload happens before any write; if the write fails
/// the uploaded video is removed again.
#[tracing::instrument(skip(state, user, fields), fields(user = %user.user_key))]
pub async fn request_return(
    state: &AppState,
    user: &AuthUser,
    fields: ReturnFormFields,
) -> AppResult<ApiResponse<ReturnRequestResponse>> {
    let form = parse_return_form(fields)?;

    let customer = Users::find_by_id(user.user_key.clone())
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found.".into()))?;

    let order = Orders::find_by_id(form.order_id.clone())
        .filter(OrderCol::UserKey.eq(customer.user_key.as_str()))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found.".into()))?;

    let delivered_at = order.delivered_at.map(|t| t.with_timezone(&Utc));
    check_return_eligibility(order_status(&order)?, delivered_at, Utc::now())?;

    let shipping: AddressSnapshot =
        serde_json::from_value(order.shipping_address.clone()).map_err(anyhow::Error::from)?;
    let (pickup_address, pickup_contact) = resolve_pickup(&form, &shipping)?;

    let return_id = IdAllocator::default()
        .generate(&DbReservations(&state.orm), IdCategory::Returns)
        .await?;

    let user_name = if customer.name.trim().is_empty() {
        "AnonymousUser"
    } else {
        customer.name.as_str()
    };
    let video_key = return_video_key(user_name, &return_id);
    let video_url = state
        .storage
        .put(&video_key, form.video.clone(), "video/mp4")
        .await?;

    let committed = commit_return(
        state,
        &customer,
        &form,
        &return_id,
        video_url,
        pickup_address,
        pickup_contact,
    )
    .await;
    if let Err(err) = committed {
        if let Err(cleanup) = state.storage.delete(&video_key).await {
            tracing::warn!(error = %cleanup, key = %video_key, "failed to remove orphaned return video");
        }
        return Err(err);
    }

    tracing::info!(order_id = %form.order_id, %return_id, "return requested");
    audit_best_effort(
        &state.pool,
        Some(&customer.user_key),
        "return_requested",
        Some("orders"),
        Some(serde_json::json!({ "order_id": form.order_id, "return_id": return_id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Return requested successfully!",
        ReturnRequestResponse {
            new_status: OrderStatus::ReturnRequested,
            return_invoice_id: return_id,
        },
        Some(Meta::empty()),
    ))
}

async fn commit_return(
    state: &AppState,
    customer: &UserModel,
    form: &ReturnForm,
    return_id: &str,
    video_url: String,
    pickup_address: AddressSnapshot,
    pickup_contact: String,
) -> AppResult<()> {
    let txn = state.orm.begin().await?;

    let order = Orders::find_by_id(form.order_id.clone())
        .filter(OrderCol::UserKey.eq(customer.user_key.as_str()))
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found.".into()))?;

    // Another request may have opened a return since the first check.
    let delivered_at = order.delivered_at.map(|t| t.with_timezone(&Utc));
    check_return_eligibility(order_status(&order)?, delivered_at, Utc::now())?;

    let order_id = order.order_id.clone();
    let mut active: OrderActive = order.into();
    active.status = Set(OrderStatus::ReturnRequested.as_str().to_string());
    active.return_invoice_id = Set(Some(return_id.to_string()));
    active.return_reason = Set(Some(form.reason.clone()));
    active.return_video_url = Set(Some(video_url));
    active.return_pickup_address =
        Set(Some(serde_json::to_value(&pickup_address).map_err(anyhow::Error::from)?));
    active.return_pickup_contact = Set(Some(pickup_contact));
    active.return_requested_at = Set(Some(Utc::now().into()));
    active.update(&txn).await?;

    reserve(&txn, IdCategory::Returns, return_id).await?;

    outbox_service::enqueue(
        &txn,
        &OutboxMessage::ReturnRequested {
            email: customer.email.clone(),
            name: customer.name.clone(),
            order_id,
            return_id: return_id.to_string(),
            reason: form.reason.clone(),
        },
        Some(format!("return_requested:{return_id}")),
    )
    .await?;

    txn.commit().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn delivered() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap()
    }

    fn check_after(elapsed: Duration) -> Result<(), ReturnRejection> {
        check_return_eligibility(OrderStatus::Delivered, Some(delivered()), delivered() + elapsed)
    }

    // Delivered 10:00 on 1 March; the window runs from midnight that day.
    #[test]
    fn window_counts_from_the_delivery_day() {
        assert!(check_after(Duration::days(14)).is_ok());
        assert!(check_after(Duration::days(15) - Duration::hours(10)).is_ok());
        assert_eq!(
            check_after(Duration::days(15) - Duration::hours(10) + Duration::seconds(1)),
            Err(ReturnRejection::WindowExpired)
        );
        assert_eq!(
            check_after(Duration::days(15)),
            Err(ReturnRejection::WindowExpired)
        );
        assert_eq!(check_after(Duration::days(16)), Err(ReturnRejection::WindowExpired));
    }

    #[test]
    fn status_gates_come_before_the_window() {
        let now = delivered() + Duration::days(1);
        assert_eq!(
            check_return_eligibility(OrderStatus::Shipped, Some(delivered()), now),
            Err(ReturnRejection::NotDelivered)
        );
        let err = check_return_eligibility(OrderStatus::ReturnRequested, None, now).unwrap_err();
        assert_eq!(err.to_string(), "Return already processed. Status: Return Requested");
        assert_eq!(
            check_return_eligibility(OrderStatus::Delivered, None, now),
            Err(ReturnRejection::MissingDeliveryDate)
        );
    }

    fn fields() -> ReturnFormFields {
        ReturnFormFields {
            order_id: Some("ORD04213".into()),
            reason: Some("Colour differs from the photo".into()),
            address_info: Some(r#"{"type":"same"}"#.into()),
            contact_info: Some(r#"{"type":"custom","customContact":"9123456780"}"#.into()),
            video: Some(vec![0, 1, 2]),
        }
    }

    #[test]
    fn missing_video_is_incomplete() {
        let mut raw = fields();
        raw.video = Some(Vec::new());
        let err = parse_return_form(raw).unwrap_err();
        assert_eq!(err.to_string(), INCOMPLETE);
    }

    #[test]
    fn bad_json_is_malformed() {
        let mut raw = fields();
        raw.address_info = Some("{not json".into());
        let err = parse_return_form(raw).unwrap_err();
        assert_eq!(err.to_string(), "Malformed request data.");
    }

    #[test]
    fn pickup_uses_shipping_address_and_custom_contact() {
        let form = parse_return_form(fields()).unwrap();
        let shipping = AddressSnapshot {
            address: "14 Lake Road".into(),
            city: "Coimbatore".into(),
            phone: "9876543210".into(),
            ..Default::default()
        };
        let (address, contact) = resolve_pickup(&form, &shipping).unwrap();
        assert_eq!(address.address, "14 Lake Road");
        assert_eq!(contact, "9123456780");
    }

    #[test]
    fn custom_address_must_be_supplied() {
        let mut raw = fields();
        raw.address_info = Some(r#"{"type":"custom"}"#.into());
        let form = parse_return_form(raw).unwrap();
        assert!(resolve_pickup(&form, &AddressSnapshot::default()).is_err());
    }
}
