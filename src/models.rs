use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Display format used for delivery dates, e.g. `07-Mar-2025`.
pub const DELIVERY_DATE_FORMAT: &str = "%d-%b-%Y";

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserProfile {
    pub key: String,
    pub email: String,
    pub name: String,
    pub phone: String,
    pub organization: String,
    pub country: String,
    pub state: String,
    pub district: String,
    pub address: String,
    pub pincode: String,
    pub order_count: i32,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub price: i64,
    pub available_stock: i32,
    pub image: Option<String>,
    pub description: Option<String>,
}

/// One entry of a stored cart, in the order the user added it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CartLine {
    pub id: String,
    pub name: String,
    pub quantity: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum OrderStatus {
    Shipped,
    #[serde(rename = "Out for Delivery")]
    OutForDelivery,
    Delivered,
    #[serde(rename = "Return Requested")]
    ReturnRequested,
    Returned,
}

impl OrderStatus {
    /// Statuses a freshly placed order may start in.
    pub const FULFILMENT: [OrderStatus; 3] = [
        OrderStatus::Shipped,
        OrderStatus::OutForDelivery,
        OrderStatus::Delivered,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Shipped => "Shipped",
            OrderStatus::OutForDelivery => "Out for Delivery",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::ReturnRequested => "Return Requested",
            OrderStatus::Returned => "Returned",
        }
    }

    pub fn is_return_processed(&self) -> bool {
        matches!(self, OrderStatus::ReturnRequested | OrderStatus::Returned)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Shipped" => Ok(OrderStatus::Shipped),
            "Out for Delivery" => Ok(OrderStatus::OutForDelivery),
            "Delivered" => Ok(OrderStatus::Delivered),
            "Return Requested" => Ok(OrderStatus::ReturnRequested),
            "Returned" => Ok(OrderStatus::Returned),
            other => Err(anyhow::anyhow!("unknown order status {other:?}")),
        }
    }
}

/// Address as frozen into an order or a return pickup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct AddressSnapshot {
    pub address: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub country: String,
    pub phone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ShippingAddress {
    pub id: Uuid,
    pub label: String,
    #[serde(flatten)]
    pub details: AddressSnapshot,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OrderLineItem {
    pub id: String,
    pub name: String,
    pub price: i64,
    pub quantity: i32,
    pub image: Option<String>,
    pub description: Option<String>,
}

impl OrderLineItem {
    pub fn line_total(&self) -> i64 {
        self.price * i64::from(self.quantity)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReturnDetails {
    pub reason: String,
    pub video_url: String,
    pub pickup_address: AddressSnapshot,
    pub pickup_contact: String,
    pub requested_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_id: String,
    pub invoice_id: String,
    pub placed_at: DateTime<Utc>,
    pub status: OrderStatus,
    pub items: Vec<OrderLineItem>,
    pub shipping_address: AddressSnapshot,
    pub total_amount: i64,
    pub delivered_at: Option<DateTime<Utc>>,
    pub delivery_date: Option<String>,
    pub return_invoice_id: Option<String>,
    pub return_details: Option<ReturnDetails>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,
    pub number: i32,
    pub title: String,
    pub location: String,
    pub category: String,
    #[serde(rename = "type")]
    pub employment_type: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Office {
    pub id: String,
    pub city: String,
    #[serde(rename = "type")]
    pub office_type: String,
    pub address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobApplication {
    pub application_id: String,
    pub job_id: String,
    pub applicant_name: String,
    pub primary_email: String,
    pub secondary_email: String,
    pub experience: String,
    pub work_type: String,
    pub qualification: String,
    pub skills: String,
    pub cover_letter: String,
    pub resume_url: String,
    pub status: String,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OutboxEvent {
    pub id: Uuid,
    pub kind: String,
    pub status: String,
    pub attempts: i32,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub next_attempt_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub failed_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_status_uses_display_names_on_the_wire() {
        let json = serde_json::to_string(&OrderStatus::OutForDelivery).unwrap();
        assert_eq!(json, "\"Out for Delivery\"");
        let parsed: OrderStatus = "Return Requested".parse().unwrap();
        assert_eq!(parsed, OrderStatus::ReturnRequested);
        assert!("Lost".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn address_snapshot_tolerates_missing_fields() {
        let addr: AddressSnapshot =
            serde_json::from_str(r#"{"address":"12 Lake Rd","city":"Coimbatore"}"#).unwrap();
        assert_eq!(addr.city, "Coimbatore");
        assert!(addr.phone.is_empty());
    }
}
