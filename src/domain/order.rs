use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};

use super::errors::DomainError;

/// Operational flag shared by trucks and menu items. Anything other than
/// the literal `available` reads as unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Available,
    Unavailable,
}

impl Availability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Availability::Available => "available",
            Availability::Unavailable => "unavailable",
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Availability::Available)
    }
}

impl From<&str> for Availability {
    fn from(s: &str) -> Self {
        if s == "available" {
            Availability::Available
        } else {
            Availability::Unavailable
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Preparing,
    Ready,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "preparing" => Ok(OrderStatus::Preparing),
            "ready" => Ok(OrderStatus::Ready),
            "completed" => Ok(OrderStatus::Completed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(DomainError::invalid(format!("unknown order status '{other}'"))),
        }
    }
}

// ── Snapshot read inside the placement transaction ───────────────────────────

/// A cart line joined with the current state of its menu item.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    pub cart_id: i32,
    pub item_id: i32,
    pub item_name: String,
    pub quantity: i32,
    /// Price copied into the cart when the item was added. Advisory only.
    pub cart_price: BigDecimal,
    pub menu_price: BigDecimal,
    pub item_status: Availability,
    pub item_truck_id: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Truck {
    pub truck_id: i32,
    pub truck_name: String,
    pub owner_id: i32,
    pub truck_status: Availability,
    pub order_status: Availability,
}

impl Truck {
    pub fn accepts_orders(&self) -> bool {
        self.truck_status.is_available() && self.order_status.is_available()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceOrderRequest {
    pub truck_id: i32,
    pub scheduled_pickup_time: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ValidationOptions {
    pub require_customer_role: bool,
}

// ── Validator output ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedLine {
    pub cart_id: i32,
    pub item_id: i32,
    pub name: String,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub line_total: BigDecimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedOrder {
    pub user_id: i32,
    pub truck_id: i32,
    pub pickup_time: DateTime<Utc>,
    pub validated_at: DateTime<Utc>,
    pub lines: Vec<ValidatedLine>,
    pub total_price: BigDecimal,
}

// ── Assembler output ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct OrderDraft {
    pub user_id: i32,
    pub truck_id: i32,
    pub order_status: OrderStatus,
    pub total_price: BigDecimal,
    pub scheduled_pickup_time: DateTime<Utc>,
    pub estimated_earliest_pickup: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderItemDraft {
    pub item_id: i32,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub line_total: BigDecimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssembledOrder {
    pub order: OrderDraft,
    pub items: Vec<OrderItemDraft>,
}

// ── Persisted / read models ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct OrderRecord {
    pub order_id: i32,
    pub user_id: i32,
    pub truck_id: i32,
    pub order_status: OrderStatus,
    pub total_price: BigDecimal,
    pub scheduled_pickup_time: DateTime<Utc>,
    pub estimated_earliest_pickup: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedOrder {
    pub order_id: i32,
    pub truck_id: i32,
    pub total_price: BigDecimal,
    pub order_status: OrderStatus,
    pub scheduled_pickup_time: DateTime<Utc>,
    pub item_count: usize,
}

/// An order joined with its truck, as listed to customers and owners.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderSummary {
    pub order_id: i32,
    pub user_id: i32,
    pub truck_id: i32,
    pub truck_name: String,
    pub truck_owner_id: i32,
    pub order_status: OrderStatus,
    pub total_price: BigDecimal,
    pub scheduled_pickup_time: DateTime<Utc>,
    pub estimated_earliest_pickup: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderItemView {
    pub order_item_id: i32,
    pub item_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub line_total: BigDecimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderDetails {
    pub order: OrderSummary,
    pub items: Vec<OrderItemView>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn availability_only_accepts_exact_literal() {
        assert_eq!(Availability::from("available"), Availability::Available);
        assert_eq!(Availability::from("Available"), Availability::Unavailable);
        assert_eq!(Availability::from("closed"), Availability::Unavailable);
    }

    #[test]
    fn truck_needs_both_flags_available() {
        let mut truck = Truck {
            truck_id: 1,
            truck_name: "Taco Loco".to_string(),
            owner_id: 9,
            truck_status: Availability::Available,
            order_status: Availability::Available,
        };
        assert!(truck.accepts_orders());
        truck.order_status = Availability::Unavailable;
        assert!(!truck.accepts_orders());
        truck.order_status = Availability::Available;
        truck.truck_status = Availability::Unavailable;
        assert!(!truck.accepts_orders());
    }

    #[test]
    fn order_status_round_trips_through_str() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Preparing,
            OrderStatus::Ready,
            OrderStatus::Completed,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
    }

    #[test]
    fn unknown_order_status_is_invalid_input() {
        let err = "shipped".parse::<OrderStatus>().unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }
}
