use std::{collections::HashMap, fmt};

use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set};

use crate::{
    dto::cart::{CartView, ReplaceCartRequest},
    entity::cart_items::{ActiveModel as CartActive, Column as CartCol, Entity as CartItems},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::CartLine,
    response::{ApiResponse, Meta},
    state::AppState,
};

const CART_UPDATED_PREFIX: &str =
    "Your cart has been updated due to stock changes. Please review and proceed.";

/// A change the validator had to make to a cart line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartAdjustment {
    Unavailable { name: String },
    OutOfStock { name: String },
    Reduced { name: String, quantity: i32 },
}

impl fmt::Display for CartAdjustment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CartAdjustment::Unavailable { name } => {
                write!(f, "'{name}' was removed as it is no longer available.")
            }
            CartAdjustment::OutOfStock { name } => {
                write!(f, "'{name}' was removed as it is now out of stock.")
            }
            CartAdjustment::Reduced { name, quantity } => {
                write!(f, "Quantity for '{name}' reduced to {quantity} due to low stock.")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartValidation {
    pub lines: Vec<CartLine>,
    pub adjustments: Vec<CartAdjustment>,
}

impl CartValidation {
    pub fn is_clean(&self) -> bool {
        self.adjustments.is_empty()
    }

    /// Message shown to the shopper when checkout had to stop.
    pub fn summary(&self) -> String {
        let mut message = CART_UPDATED_PREFIX.to_string();
        for adjustment in &self.adjustments {
            message.push(' ');
            message.push_str(&adjustment.to_string());
        }
        message
    }
}

/// Reconcile a cart against live stock (`product id -> available stock`).
/// Lines keep their original order. Lines repeating a product draw on the
/// same stock, earlier lines first.
pub fn validate_cart(cart: &[CartLine], stock: &HashMap<String, i32>) -> CartValidation {
    let mut lines = Vec::with_capacity(cart.len());
    let mut adjustments = Vec::new();
    let mut remaining = stock.clone();

    for line in cart {
        let name = if line.name.trim().is_empty() {
            "An item".to_string()
        } else {
            line.name.clone()
        };

        let Some(available) = remaining.get_mut(&line.id) else {
            adjustments.push(CartAdjustment::Unavailable { name });
            continue;
        };

        if *available <= 0 {
            adjustments.push(CartAdjustment::OutOfStock { name });
            continue;
        }

        let taken = line.quantity.min(*available);
        *available -= taken;

        if line.quantity > taken {
            adjustments.push(CartAdjustment::Reduced {
                name,
                quantity: taken,
            });
            lines.push(CartLine {
                quantity: taken,
                ..line.clone()
            });
            continue;
        }

        lines.push(line.clone());
    }

    CartValidation { lines, adjustments }
}

pub async fn load_cart<C: ConnectionTrait>(conn: &C, user_key: &str) -> AppResult<Vec<CartLine>> {
    let lines = CartItems::find()
        .filter(CartCol::UserKey.eq(user_key))
        .order_by_asc(CartCol::Position)
        .all(conn)
        .await?
        .into_iter()
        .map(|row| CartLine {
            id: row.product_id,
            name: row.name,
            quantity: row.quantity,
        })
        .collect();
    Ok(lines)
}

/// Replace the stored cart with `lines`, preserving their order.
pub async fn store_cart<C: ConnectionTrait>(
    conn: &C,
    user_key: &str,
    lines: &[CartLine],
) -> AppResult<()> {
    CartItems::delete_many()
        .filter(CartCol::UserKey.eq(user_key))
        .exec(conn)
        .await?;

    if lines.is_empty() {
        return Ok(());
    }

    let rows = lines.iter().enumerate().map(|(position, line)| CartActive {
        user_key: Set(user_key.to_string()),
        position: Set(position as i32),
        product_id: Set(line.id.clone()),
        name: Set(line.name.clone()),
        quantity: Set(line.quantity),
    });
    CartItems::insert_many(rows).exec(conn).await?;
    Ok(())
}

pub async fn get_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartView>> {
    let items = load_cart(&state.orm, &user.user_key).await?;
    Ok(ApiResponse::success(
        "Ok",
        CartView { items },
        Some(Meta::empty()),
    ))
}

pub async fn replace_cart(
    state: &AppState,
    user: &AuthUser,
    payload: ReplaceCartRequest,
) -> AppResult<ApiResponse<CartView>> {
    for line in &payload.items {
        if line.id.trim().is_empty() {
            return Err(AppError::field("items", "Every cart item needs a product id"));
        }
        if line.quantity <= 0 {
            return Err(AppError::field(
                "items",
                format!("Quantity for '{}' must be greater than zero", line.name),
            ));
        }
    }

    store_cart(&state.orm, &user.user_key, &payload.items).await?;
    tracing::debug!(user = %user.user_key, lines = payload.items.len(), "cart replaced");

    Ok(ApiResponse::success(
        "Cart updated",
        CartView {
            items: payload.items,
        },
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(id: &str, name: &str, quantity: i32) -> CartLine {
        CartLine {
            id: id.into(),
            name: name.into(),
            quantity,
        }
    }

    fn stock(entries: &[(&str, i32)]) -> HashMap<String, i32> {
        entries.iter().map(|(id, s)| (id.to_string(), *s)).collect()
    }

    #[test]
    fn clean_cart_passes_unchanged() {
        let cart = vec![line("item002", "Urban Comfort Kurti", 2)];
        let result = validate_cart(&cart, &stock(&[("item002", 25)]));
        assert!(result.is_clean());
        assert_eq!(result.lines, cart);
    }

    #[test]
    fn out_of_stock_line_is_removed() {
        let cart = vec![
            line("item008", "Handloom Cotton Towels", 1),
            line("item002", "Urban Comfort Kurti", 1),
        ];
        let result = validate_cart(&cart, &stock(&[("item008", 0), ("item002", 25)]));
        assert!(!result.is_clean());
        assert_eq!(result.lines, vec![line("item002", "Urban Comfort Kurti", 1)]);
        assert_eq!(
            result.adjustments,
            vec![CartAdjustment::OutOfStock {
                name: "Handloom Cotton Towels".into()
            }]
        );
        assert!(result.summary().contains("out of stock"));
    }

    #[test]
    fn over_stock_line_is_clamped() {
        let cart = vec![line("item006", "Bridal Lehenga", 9)];
        let result = validate_cart(&cart, &stock(&[("item006", 5)]));
        assert_eq!(result.lines, vec![line("item006", "Bridal Lehenga", 5)]);
        assert_eq!(
            result.summary(),
            "Your cart has been updated due to stock changes. Please review and proceed. \
             Quantity for 'Bridal Lehenga' reduced to 5 due to low stock."
        );
    }

    #[test]
    fn missing_product_is_dropped_and_order_is_kept() {
        let cart = vec![
            line("item001", "Ethereal Silk Saree", 1),
            line("gone", "", 3),
            line("item003", "Festive Anarkali", 2),
        ];
        let result = validate_cart(&cart, &stock(&[("item001", 10), ("item003", 8)]));
        let ids: Vec<_> = result.lines.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, ["item001", "item003"]);
        assert_eq!(
            result.adjustments[0].to_string(),
            "'An item' was removed as it is no longer available."
        );
    }

    #[test]
    fn repeated_product_lines_share_stock() {
        let cart = vec![
            line("item002", "Urban Comfort Kurti", 2),
            line("item002", "Urban Comfort Kurti", 2),
            line("item002", "Urban Comfort Kurti", 1),
        ];
        let result = validate_cart(&cart, &stock(&[("item002", 3)]));
        assert!(!result.is_clean());
        assert_eq!(
            result.lines,
            vec![
                line("item002", "Urban Comfort Kurti", 2),
                line("item002", "Urban Comfort Kurti", 1),
            ]
        );
        assert_eq!(
            result.adjustments,
            vec![
                CartAdjustment::Reduced {
                    name: "Urban Comfort Kurti".into(),
                    quantity: 1
                },
                CartAdjustment::OutOfStock {
                    name: "Urban Comfort Kurti".into()
                },
            ]
        );
    }

    #[test]
    fn repeated_lines_within_stock_are_clean() {
        let cart = vec![line("item002", "Kurti", 2), line("item002", "Kurti", 1)];
        assert!(validate_cart(&cart, &stock(&[("item002", 3)])).is_clean());
    }

    #[test]
    fn quantity_equal_to_stock_is_kept() {
        let cart = vec![line("item003", "Festive Anarkali", 8)];
        assert!(validate_cart(&cart, &stock(&[("item003", 8)])).is_clean());
    }
}
