use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::CartLine;

#[derive(Debug, Serialize, ToSchema)]
pub struct CartView {
    pub items: Vec<CartLine>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReplaceCartRequest {
    pub items: Vec<CartLine>,
}
