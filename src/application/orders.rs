use crate::domain::errors::DomainError;
use crate::domain::identity::{authorize, require_caller, Caller, Role};
use crate::domain::order::{OrderDetails, OrderStatus, OrderSummary};
use crate::domain::ports::OrderQueries;

/// Read side of orders plus the owner-driven status transitions.
pub struct OrderService<Q> {
    queries: Q,
}

impl<Q: OrderQueries> OrderService<Q> {
    pub fn new(queries: Q) -> Self {
        Self { queries }
    }

    pub fn my_orders(&self, caller: Option<&Caller>) -> Result<Vec<OrderSummary>, DomainError> {
        let caller = require_caller(caller)?;
        self.queries.orders_for_customer(caller.user_id)
    }

    pub fn order_details(
        &self,
        caller: Option<&Caller>,
        order_id: i32,
    ) -> Result<OrderDetails, DomainError> {
        let caller = require_caller(caller)?;
        let details = self.details(order_id)?;
        if details.order.user_id != caller.user_id {
            return Err(DomainError::forbidden("order belongs to another user"));
        }
        Ok(details)
    }

    pub fn truck_orders(&self, caller: Option<&Caller>) -> Result<Vec<OrderSummary>, DomainError> {
        let caller = require_caller(caller)?;
        authorize(caller, Role::TruckOwner)?;
        if !self.queries.owner_has_trucks(caller.user_id)? {
            return Err(DomainError::not_found("no trucks found for this owner"));
        }
        self.queries.orders_for_owner(caller.user_id)
    }

    pub fn owner_order_details(
        &self,
        caller: Option<&Caller>,
        order_id: i32,
    ) -> Result<OrderDetails, DomainError> {
        let caller = require_caller(caller)?;
        authorize(caller, Role::TruckOwner)?;
        let details = self.details(order_id)?;
        if details.order.truck_owner_id != caller.user_id {
            return Err(DomainError::forbidden("not your truck"));
        }
        Ok(details)
    }

    /// The only change an order accepts after placement.
    pub fn update_status(
        &self,
        caller: Option<&Caller>,
        order_id: i32,
        status: &str,
    ) -> Result<OrderSummary, DomainError> {
        let caller = require_caller(caller)?;
        authorize(caller, Role::TruckOwner)?;
        if order_id <= 0 {
            return Err(DomainError::invalid("invalid orderId"));
        }
        let status: OrderStatus = status.parse()?;

        let summary = self
            .queries
            .find_summary(order_id)?
            .ok_or_else(|| DomainError::not_found("order not found"))?;
        if summary.truck_owner_id != caller.user_id {
            return Err(DomainError::forbidden("not authorized to modify this order"));
        }

        self.queries.set_status(order_id, status)?;
        log::info!(
            "Order {} moved from {} to {} by owner {}",
            order_id,
            summary.order_status,
            status,
            caller.user_id
        );
        Ok(OrderSummary {
            order_status: status,
            ..summary
        })
    }

    fn details(&self, order_id: i32) -> Result<OrderDetails, DomainError> {
        if order_id <= 0 {
            return Err(DomainError::invalid("invalid orderId"));
        }
        self.queries
            .find_details(order_id)?
            .ok_or_else(|| DomainError::not_found("order not found"))
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use bigdecimal::BigDecimal;
    use chrono::{Duration, Utc};
    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::application::placement::PlacementCoordinator;
    use crate::domain::order::{PlaceOrderRequest, ValidationOptions};
    use crate::infrastructure::memory_store::MemoryStore;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).expect("valid decimal")
    }

    /// One placed order by customer 11 on truck 3 (owned by 50).
    fn with_order() -> (MemoryStore, i32) {
        let store = MemoryStore::new();
        store.add_user(11, "customer");
        store.add_user(12, "customer");
        store.add_user(50, "truckOwner");
        store.add_user(51, "truckOwner");
        store.add_truck(3, "Taco Loco", 50, "available", "available");
        store.add_menu_item(5, 3, "Al pastor", dec("10.00"), "available");
        store.add_cart_line(11, 5, 2, dec("10.00"));

        let placed = PlacementCoordinator::new(
            store.clone(),
            ValidationOptions {
                require_customer_role: true,
            },
        )
        .place_order(
            Some(&Caller::customer(11)),
            &PlaceOrderRequest {
                truck_id: 3,
                scheduled_pickup_time: (Utc::now() + Duration::hours(2)).to_rfc3339(),
            },
            &CancellationToken::new(),
        )
        .expect("seed order");
        (store, placed.order_id)
    }

    #[test]
    fn customer_sees_own_orders_only() {
        let (store, order_id) = with_order();
        let service = OrderService::new(store);

        let mine = service.my_orders(Some(&Caller::customer(11))).unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].order_id, order_id);
        assert_eq!(mine[0].truck_name, "Taco Loco");

        assert!(service
            .my_orders(Some(&Caller::customer(12)))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn details_are_private_to_the_customer() {
        let (store, order_id) = with_order();
        let service = OrderService::new(store);

        let details = service
            .order_details(Some(&Caller::customer(11)), order_id)
            .unwrap();
        assert_eq!(details.items.len(), 1);
        assert_eq!(details.items[0].line_total, dec("20.00"));

        assert!(matches!(
            service
                .order_details(Some(&Caller::customer(12)), order_id)
                .unwrap_err(),
            DomainError::Forbidden(_)
        ));
        assert!(matches!(
            service
                .order_details(Some(&Caller::customer(11)), order_id + 100)
                .unwrap_err(),
            DomainError::NotFound(_)
        ));
    }

    #[test]
    fn owner_lists_orders_for_their_trucks() {
        let (store, order_id) = with_order();
        let service = OrderService::new(store);

        let orders = service.truck_orders(Some(&Caller::truck_owner(50))).unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].order_id, order_id);

        assert!(matches!(
            service
                .truck_orders(Some(&Caller::truck_owner(51)))
                .unwrap_err(),
            DomainError::NotFound(_)
        ));
        assert!(matches!(
            service.truck_orders(Some(&Caller::customer(11))).unwrap_err(),
            DomainError::Forbidden(_)
        ));
    }

    #[test]
    fn owner_details_require_truck_ownership() {
        let (store, order_id) = with_order();
        let service = OrderService::new(store);

        assert!(service
            .owner_order_details(Some(&Caller::truck_owner(50)), order_id)
            .is_ok());
        assert!(matches!(
            service
                .owner_order_details(Some(&Caller::truck_owner(51)), order_id)
                .unwrap_err(),
            DomainError::Forbidden(_)
        ));
    }

    #[test]
    fn owner_moves_order_through_statuses() {
        let (store, order_id) = with_order();
        let service = OrderService::new(store.clone());
        let owner = Caller::truck_owner(50);

        let updated = service
            .update_status(Some(&owner), order_id, "preparing")
            .unwrap();
        assert_eq!(updated.order_status, OrderStatus::Preparing);

        let reread = service
            .owner_order_details(Some(&owner), order_id)
            .unwrap();
        assert_eq!(reread.order.order_status, OrderStatus::Preparing);
        assert_eq!(reread.order.total_price, dec("20.00"));
    }

    #[test]
    fn status_update_rejects_unknown_status_and_strangers() {
        let (store, order_id) = with_order();
        let service = OrderService::new(store);

        assert!(matches!(
            service
                .update_status(Some(&Caller::truck_owner(50)), order_id, "teleported")
                .unwrap_err(),
            DomainError::InvalidInput(_)
        ));
        assert!(matches!(
            service
                .update_status(Some(&Caller::truck_owner(51)), order_id, "ready")
                .unwrap_err(),
            DomainError::Forbidden(_)
        ));
        assert!(matches!(
            service
                .update_status(Some(&Caller::customer(11)), order_id, "ready")
                .unwrap_err(),
            DomainError::Forbidden(_)
        ));
    }
}
