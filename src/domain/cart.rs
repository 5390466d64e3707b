use bigdecimal::BigDecimal;

use super::errors::DomainError;
use super::order::Availability;

#[derive(Debug, Clone, PartialEq)]
pub struct MenuItem {
    pub item_id: i32,
    pub truck_id: i32,
    pub name: String,
    pub price: BigDecimal,
    pub status: Availability,
}

/// A stored cart row, as written by add/edit.
#[derive(Debug, Clone, PartialEq)]
pub struct CartEntry {
    pub cart_id: i32,
    pub user_id: i32,
    pub item_id: i32,
    pub quantity: i32,
    pub price: BigDecimal,
}

/// Quantity of an existing line after adding `added` more of the same item.
pub fn accumulate_quantity(current: i32, added: i32) -> Result<i32, DomainError> {
    current
        .checked_add(added)
        .ok_or_else(|| DomainError::invalid("invalid itemId or quantity"))
}

#[derive(Debug, Clone, PartialEq)]
pub struct CartViewLine {
    pub cart_id: i32,
    pub item_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub truck_id: i32,
    pub unit_price: BigDecimal,
    pub quantity: i32,
    pub line_total: BigDecimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CartView {
    pub lines: Vec<CartViewLine>,
    pub total_quantity: i64,
    pub total_price: BigDecimal,
}
