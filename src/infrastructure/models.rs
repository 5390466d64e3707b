use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::domain::errors::DomainError;
use crate::domain::order::{OrderStatus, Truck};
use crate::schema::{carts, menu_items, order_items, orders, trucks};

pub(crate) fn parse_stored_status(raw: &str) -> Result<OrderStatus, DomainError> {
    raw.parse()
        .map_err(|_| DomainError::Internal(format!("stored order status '{raw}' is unknown")))
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = trucks)]
#[diesel(primary_key(truck_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TruckRow {
    pub truck_id: i32,
    pub truck_name: String,
    pub owner_id: i32,
    pub truck_status: String,
    pub order_status: String,
}

impl From<TruckRow> for Truck {
    fn from(row: TruckRow) -> Self {
        Truck {
            truck_id: row.truck_id,
            truck_name: row.truck_name,
            owner_id: row.owner_id,
            truck_status: row.truck_status.as_str().into(),
            order_status: row.order_status.as_str().into(),
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = menu_items)]
#[diesel(primary_key(item_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct MenuItemRow {
    pub item_id: i32,
    pub truck_id: i32,
    pub name: String,
    pub price: BigDecimal,
    pub status: String,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = carts)]
#[diesel(primary_key(cart_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CartRow {
    pub cart_id: i32,
    pub user_id: i32,
    pub item_id: i32,
    pub quantity: i32,
    pub price: BigDecimal,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = carts)]
pub struct NewCartRow {
    pub user_id: i32,
    pub item_id: i32,
    pub quantity: i32,
    pub price: BigDecimal,
}

/// Cart row joined with its menu item, in `select` column order.
#[derive(Debug, Queryable)]
pub struct CartLineRow {
    pub cart_id: i32,
    pub item_id: i32,
    pub item_name: String,
    pub quantity: i32,
    pub cart_price: BigDecimal,
    pub menu_price: BigDecimal,
    pub item_status: String,
    pub item_truck_id: i32,
}

#[derive(Debug, Queryable)]
pub struct CartViewRow {
    pub cart_id: i32,
    pub item_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub truck_id: i32,
    pub price: BigDecimal,
    pub quantity: i32,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = orders)]
#[diesel(primary_key(order_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderRow {
    pub order_id: i32,
    pub user_id: i32,
    pub truck_id: i32,
    pub order_status: String,
    pub total_price: BigDecimal,
    pub scheduled_pickup_time: DateTime<Utc>,
    pub estimated_earliest_pickup: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = orders)]
pub struct NewOrderRow {
    pub user_id: i32,
    pub truck_id: i32,
    pub order_status: String,
    pub total_price: BigDecimal,
    pub scheduled_pickup_time: DateTime<Utc>,
    pub estimated_earliest_pickup: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = order_items)]
pub struct NewOrderItemRow {
    pub order_id: i32,
    pub item_id: i32,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub line_total: BigDecimal,
}

/// Order joined with its truck, in `select` column order.
#[derive(Debug, Queryable)]
pub struct OrderSummaryRow {
    pub order_id: i32,
    pub user_id: i32,
    pub truck_id: i32,
    pub truck_name: String,
    pub truck_owner_id: i32,
    pub order_status: String,
    pub total_price: BigDecimal,
    pub scheduled_pickup_time: DateTime<Utc>,
    pub estimated_earliest_pickup: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Queryable)]
pub struct OrderItemViewRow {
    pub order_item_id: i32,
    pub item_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub line_total: BigDecimal,
}
