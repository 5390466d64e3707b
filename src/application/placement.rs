use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::domain::assembler::assemble;
use crate::domain::errors::DomainError;
use crate::domain::identity::{require_caller, Caller};
use crate::domain::order::{PlaceOrderRequest, PlacedOrder, ValidationOptions};
use crate::domain::ports::OrderStore;
use crate::domain::validator::validate;

/// Turns a caller's cart into an order inside one unit of work.
pub struct PlacementCoordinator<S> {
    store: S,
    options: ValidationOptions,
}

impl<S: OrderStore> PlacementCoordinator<S> {
    pub fn new(store: S, options: ValidationOptions) -> Self {
        Self { store, options }
    }

    /// Validate, price, insert the order and its items, and clear the cart.
    ///
    /// Nothing is written unless every step succeeds. If `cancel` fires
    /// before commit the transaction is rolled back.
    pub fn place_order(
        &self,
        caller: Option<&Caller>,
        request: &PlaceOrderRequest,
        cancel: &CancellationToken,
    ) -> Result<PlacedOrder, DomainError> {
        let caller = require_caller(caller)?;

        self.store.in_transaction(|uow| {
            let cart = uow.load_cart_for_update(caller.user_id)?;
            let truck = if request.truck_id > 0 {
                uow.load_truck(request.truck_id)?
            } else {
                None
            };

            let validated = validate(
                Some(caller),
                request,
                &cart,
                truck.as_ref(),
                Utc::now(),
                self.options,
            )?;
            let assembled = assemble(&validated);

            let order = uow.insert_order(&assembled.order)?;
            for item in &assembled.items {
                uow.insert_order_item(order.order_id, item)?;
            }

            let cleared = uow.clear_cart(validated.user_id)?;
            if cleared != cart.len() {
                return Err(DomainError::Internal(format!(
                    "cart for user {} changed during placement ({} lines read, {} deleted)",
                    validated.user_id,
                    cart.len(),
                    cleared
                )));
            }

            if cancel.is_cancelled() {
                return Err(DomainError::Internal(
                    "request cancelled before commit".to_string(),
                ));
            }

            log::info!(
                "Placed order {} for user {} on truck {} ({} items, total {})",
                order.order_id,
                order.user_id,
                order.truck_id,
                assembled.items.len(),
                order.total_price
            );

            Ok(PlacedOrder {
                order_id: order.order_id,
                truck_id: order.truck_id,
                total_price: order.total_price,
                order_status: order.order_status,
                scheduled_pickup_time: order.scheduled_pickup_time,
                item_count: assembled.items.len(),
            })
        })
    }
}
