use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::{
    dto::addresses::{AddressList, CreateAddressRequest},
    entity::shipping_addresses::{
        ActiveModel as AddressActive, Column as AddrCol, Entity as ShippingAddresses,
        Model as AddressModel,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{AddressSnapshot, ShippingAddress},
    response::{ApiResponse, Meta},
    state::AppState,
    validation::{is_valid_phone, required},
};

pub async fn list_addresses(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<AddressList>> {
    let items = ShippingAddresses::find()
        .filter(AddrCol::UserKey.eq(user.user_key.as_str()))
        .order_by_asc(AddrCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(address_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Ok",
        AddressList { items },
        Some(Meta::empty()),
    ))
}

pub async fn create_address(
    state: &AppState,
    user: &AuthUser,
    payload: CreateAddressRequest,
) -> AppResult<ApiResponse<ShippingAddress>> {
    let address = required("address", payload.address.as_deref())?;
    let city = required("city", payload.city.as_deref())?;
    let region = required("state", payload.state.as_deref())?;
    let pincode = required("pincode", payload.pincode.as_deref())?;
    let country = required("country", payload.country.as_deref())?;
    let phone = required("phone", payload.phone.as_deref())?;
    if !is_valid_phone(phone) {
        return Err(AppError::field("phone", "Invalid phone"));
    }
    let label = payload
        .label
        .as_deref()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .unwrap_or("Home");

    let model = AddressActive {
        id: Set(Uuid::new_v4()),
        user_key: Set(user.user_key.clone()),
        label: Set(label.to_string()),
        address: Set(address.to_string()),
        city: Set(city.to_string()),
        state: Set(region.to_string()),
        pincode: Set(pincode.to_string()),
        country: Set(country.to_string()),
        phone: Set(phone.to_string()),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;

    Ok(ApiResponse::success(
        "Address saved",
        address_from_entity(model),
        Some(Meta::empty()),
    ))
}

pub fn snapshot_from_entity(model: &AddressModel) -> AddressSnapshot {
    AddressSnapshot {
        address: model.address.clone(),
        city: model.city.clone(),
        state: model.state.clone(),
        pincode: model.pincode.clone(),
        country: model.country.clone(),
        phone: model.phone.clone(),
    }
}

fn address_from_entity(model: AddressModel) -> ShippingAddress {
    ShippingAddress {
        details: snapshot_from_entity(&model),
        id: model.id,
        label: model.label,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
