use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{AddressSnapshot, OrderStatus};

/// `addressInfo` form field: `{"type": "same"}` or a custom pickup address.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddressInfo {
    #[serde(rename = "type")]
    pub kind: String,
    pub custom_address: Option<AddressSnapshot>,
}

/// `contactInfo` form field: `{"type": "same"}` or a custom contact number.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactInfo {
    #[serde(rename = "type")]
    pub kind: String,
    pub custom_contact: Option<String>,
}

/// Raw multipart fields of a return request, before validation.
#[derive(Debug, Default)]
pub struct ReturnFormFields {
    pub order_id: Option<String>,
    pub reason: Option<String>,
    pub address_info: Option<String>,
    pub contact_info: Option<String>,
    pub video: Option<Vec<u8>>,
}

/// Validated return request.
#[derive(Debug)]
pub struct ReturnForm {
    pub order_id: String,
    pub reason: String,
    pub address_info: AddressInfo,
    pub contact_info: ContactInfo,
    pub video: Vec<u8>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReturnRequestResponse {
    pub new_status: OrderStatus,
    pub return_invoice_id: String,
}

/// Multipart schema for the API docs.
#[allow(dead_code)]
#[derive(ToSchema)]
#[schema(rename_all = "camelCase")]
pub struct ReturnUpload {
    pub order_id: String,
    pub reason: String,
    /// JSON-encoded [`AddressInfo`].
    pub address_info: String,
    /// JSON-encoded [`ContactInfo`].
    pub contact_info: String,
    #[schema(format = Binary)]
    pub video_file: String,
}
