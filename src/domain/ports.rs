use uuid::Uuid;

use super::cart::{CartEntry, CartViewLine, MenuItem};
use super::errors::DomainError;
use super::identity::Caller;
use super::order::{
    CartLine, OrderDetails, OrderDraft, OrderItemDraft, OrderRecord, OrderStatus, OrderSummary,
    Truck,
};

/// Persistence operations available inside one placement transaction.
pub trait UnitOfWork {
    /// Locks the user's cart rows and returns them joined with the current
    /// menu price, status and truck of each item, ordered by `cart_id`.
    fn load_cart_for_update(&mut self, user_id: i32) -> Result<Vec<CartLine>, DomainError>;
    fn load_truck(&mut self, truck_id: i32) -> Result<Option<Truck>, DomainError>;
    fn insert_order(&mut self, order: &OrderDraft) -> Result<OrderRecord, DomainError>;
    fn insert_order_item(&mut self, order_id: i32, item: &OrderItemDraft)
        -> Result<(), DomainError>;
    /// Returns the number of deleted cart rows.
    fn clear_cart(&mut self, user_id: i32) -> Result<usize, DomainError>;
}

/// Runs a closure as one atomic unit: committed when it returns `Ok`,
/// rolled back entirely when it returns `Err`.
pub trait OrderStore: Send + Sync + 'static {
    fn in_transaction<T, F>(&self, work: F) -> Result<T, DomainError>
    where
        F: FnOnce(&mut dyn UnitOfWork) -> Result<T, DomainError>;
}

pub trait CartRepository: Send + Sync + 'static {
    fn find_menu_item(&self, item_id: i32) -> Result<Option<MenuItem>, DomainError>;
    fn find_entry(&self, cart_id: i32) -> Result<Option<CartEntry>, DomainError>;
    /// Inserts the line, or adds `quantity` to an existing line for the same
    /// item and refreshes its price.
    fn upsert_entry(
        &self,
        user_id: i32,
        item_id: i32,
        quantity: i32,
        price: &bigdecimal::BigDecimal,
    ) -> Result<CartEntry, DomainError>;
    fn set_quantity(&self, cart_id: i32, quantity: i32) -> Result<CartEntry, DomainError>;
    fn delete_entry(&self, cart_id: i32) -> Result<(), DomainError>;
    fn lines_for_user(&self, user_id: i32) -> Result<Vec<CartViewLine>, DomainError>;
}

pub trait OrderQueries: Send + Sync + 'static {
    fn orders_for_customer(&self, user_id: i32) -> Result<Vec<OrderSummary>, DomainError>;
    fn orders_for_owner(&self, owner_id: i32) -> Result<Vec<OrderSummary>, DomainError>;
    fn owner_has_trucks(&self, owner_id: i32) -> Result<bool, DomainError>;
    fn find_summary(&self, order_id: i32) -> Result<Option<OrderSummary>, DomainError>;
    fn find_details(&self, order_id: i32) -> Result<Option<OrderDetails>, DomainError>;
    fn set_status(&self, order_id: i32, status: OrderStatus) -> Result<(), DomainError>;
}

/// Resolves a session token issued by the login service.
pub trait CallerResolver: Send + Sync + 'static {
    fn resolve(&self, token: Uuid) -> Result<Option<Caller>, DomainError>;
}

/// Everything the HTTP layer needs from one persistence technology.
pub trait Backend:
    OrderStore + CartRepository + OrderQueries + CallerResolver + Clone
{
}

impl<T> Backend for T where
    T: OrderStore + CartRepository + OrderQueries + CallerResolver + Clone
{
}
