//! In-process adapter for every persistence port.
//!
//! A unit of work runs against a copy of the state while holding the store
//! lock, and the copy replaces the state only when the work succeeds. Units
//! are therefore serialized and all-or-nothing, the same guarantees the
//! Postgres adapter gets from a SERIALIZABLE transaction.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::cart::{accumulate_quantity, CartEntry, CartViewLine, MenuItem};
use crate::domain::errors::DomainError;
use crate::domain::identity::Caller;
use crate::domain::money::line_total;
use crate::domain::order::{
    Availability, CartLine, OrderDetails, OrderDraft, OrderItemDraft, OrderItemView, OrderRecord,
    OrderStatus, OrderSummary, Truck,
};
use crate::domain::ports::{CallerResolver, CartRepository, OrderQueries, OrderStore, UnitOfWork};

#[derive(Debug, Clone)]
struct MenuRow {
    item_id: i32,
    truck_id: i32,
    name: String,
    description: Option<String>,
    category: String,
    price: BigDecimal,
    status: Availability,
}

#[derive(Debug, Clone)]
struct OrderItemRow {
    order_item_id: i32,
    order_id: i32,
    item_id: i32,
    quantity: i32,
    unit_price: BigDecimal,
    line_total: BigDecimal,
}

#[derive(Debug, Clone, Default)]
struct State {
    users: BTreeMap<i32, String>,
    sessions: HashMap<Uuid, (i32, DateTime<Utc>)>,
    trucks: BTreeMap<i32, Truck>,
    menu: BTreeMap<i32, MenuRow>,
    carts: BTreeMap<i32, CartEntry>,
    orders: BTreeMap<i32, OrderRecord>,
    order_items: BTreeMap<i32, OrderItemRow>,
    last_cart_id: i32,
    last_order_id: i32,
    last_order_item_id: i32,
}

impl State {
    fn summary(&self, order: &OrderRecord) -> Result<OrderSummary, DomainError> {
        let truck = self.trucks.get(&order.truck_id).ok_or_else(|| {
            DomainError::Internal(format!("order {} references a missing truck", order.order_id))
        })?;
        Ok(OrderSummary {
            order_id: order.order_id,
            user_id: order.user_id,
            truck_id: order.truck_id,
            truck_name: truck.truck_name.clone(),
            truck_owner_id: truck.owner_id,
            order_status: order.order_status,
            total_price: order.total_price.clone(),
            scheduled_pickup_time: order.scheduled_pickup_time,
            estimated_earliest_pickup: order.estimated_earliest_pickup,
            created_at: order.created_at,
        })
    }

    /// Newest first, ties broken by id.
    fn summaries<'a>(
        &self,
        orders: impl Iterator<Item = &'a OrderRecord>,
    ) -> Result<Vec<OrderSummary>, DomainError> {
        let mut list = orders
            .map(|o| self.summary(o))
            .collect::<Result<Vec<_>, _>>()?;
        list.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then(b.order_id.cmp(&a.order_id))
        });
        Ok(list)
    }

    fn item_views(&self, order_id: i32) -> Vec<OrderItemView> {
        self.order_items
            .values()
            .filter(|i| i.order_id == order_id)
            .map(|i| {
                let menu = self.menu.get(&i.item_id);
                OrderItemView {
                    order_item_id: i.order_item_id,
                    item_id: i.item_id,
                    name: menu.map(|m| m.name.clone()).unwrap_or_default(),
                    description: menu.and_then(|m| m.description.clone()),
                    category: menu.map(|m| m.category.clone()).unwrap_or_default(),
                    quantity: i.quantity,
                    unit_price: i.unit_price.clone(),
                    line_total: i.line_total.clone(),
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Seeding, normally done by the adjacent services ──────────────────────

    pub fn add_user(&self, user_id: i32, role: &str) {
        self.lock().users.insert(user_id, role.to_string());
    }

    pub fn add_session(&self, token: Uuid, user_id: i32, expires_at: DateTime<Utc>) {
        self.lock().sessions.insert(token, (user_id, expires_at));
    }

    pub fn add_truck(
        &self,
        truck_id: i32,
        truck_name: &str,
        owner_id: i32,
        truck_status: &str,
        order_status: &str,
    ) {
        self.lock().trucks.insert(
            truck_id,
            Truck {
                truck_id,
                truck_name: truck_name.to_string(),
                owner_id,
                truck_status: Availability::from(truck_status),
                order_status: Availability::from(order_status),
            },
        );
    }

    pub fn set_truck_status(&self, truck_id: i32, truck_status: &str, order_status: &str) {
        if let Some(truck) = self.lock().trucks.get_mut(&truck_id) {
            truck.truck_status = Availability::from(truck_status);
            truck.order_status = Availability::from(order_status);
        }
    }

    pub fn add_menu_item(
        &self,
        item_id: i32,
        truck_id: i32,
        name: &str,
        price: BigDecimal,
        status: &str,
    ) {
        self.lock().menu.insert(
            item_id,
            MenuRow {
                item_id,
                truck_id,
                name: name.to_string(),
                description: None,
                category: "main".to_string(),
                price,
                status: Availability::from(status),
            },
        );
    }

    pub fn set_menu_price(&self, item_id: i32, price: BigDecimal) {
        if let Some(item) = self.lock().menu.get_mut(&item_id) {
            item.price = price;
        }
    }

    pub fn set_menu_status(&self, item_id: i32, status: Availability) {
        if let Some(item) = self.lock().menu.get_mut(&item_id) {
            item.status = status;
        }
    }

    pub fn move_menu_item(&self, item_id: i32, truck_id: i32) {
        if let Some(item) = self.lock().menu.get_mut(&item_id) {
            item.truck_id = truck_id;
        }
    }

    pub fn add_cart_line(&self, user_id: i32, item_id: i32, quantity: i32, price: BigDecimal) -> i32 {
        let mut state = self.lock();
        state.last_cart_id += 1;
        let cart_id = state.last_cart_id;
        state.carts.insert(
            cart_id,
            CartEntry {
                cart_id,
                user_id,
                item_id,
                quantity,
                price,
            },
        );
        cart_id
    }

    pub fn clear_cart_of(&self, user_id: i32) {
        self.lock().carts.retain(|_, c| c.user_id != user_id);
    }

    // ── Inspection ───────────────────────────────────────────────────────────

    pub fn cart_len(&self, user_id: i32) -> usize {
        self.lock()
            .carts
            .values()
            .filter(|c| c.user_id == user_id)
            .count()
    }

    pub fn order_count(&self) -> usize {
        self.lock().orders.len()
    }

    pub fn order_item_count(&self) -> usize {
        self.lock().order_items.len()
    }

    pub fn order_items_for(&self, order_id: i32) -> Vec<OrderItemView> {
        self.lock().item_views(order_id)
    }
}

// ── Placement unit of work ───────────────────────────────────────────────────

struct MemoryUnit<'a> {
    state: &'a mut State,
}

impl UnitOfWork for MemoryUnit<'_> {
    fn load_cart_for_update(&mut self, user_id: i32) -> Result<Vec<CartLine>, DomainError> {
        self.state
            .carts
            .values()
            .filter(|c| c.user_id == user_id)
            .map(|c| {
                let item = self.state.menu.get(&c.item_id).ok_or_else(|| {
                    DomainError::Internal(format!("cart {} references a missing item", c.cart_id))
                })?;
                Ok(CartLine {
                    cart_id: c.cart_id,
                    item_id: c.item_id,
                    item_name: item.name.clone(),
                    quantity: c.quantity,
                    cart_price: c.price.clone(),
                    menu_price: item.price.clone(),
                    item_status: item.status,
                    item_truck_id: item.truck_id,
                })
            })
            .collect()
    }

    fn load_truck(&mut self, truck_id: i32) -> Result<Option<Truck>, DomainError> {
        Ok(self.state.trucks.get(&truck_id).cloned())
    }

    fn insert_order(&mut self, order: &OrderDraft) -> Result<OrderRecord, DomainError> {
        if !self.state.trucks.contains_key(&order.truck_id) {
            return Err(DomainError::Internal(
                "orders.truck_id violates foreign key".to_string(),
            ));
        }
        self.state.last_order_id += 1;
        let record = OrderRecord {
            order_id: self.state.last_order_id,
            user_id: order.user_id,
            truck_id: order.truck_id,
            order_status: order.order_status,
            total_price: order.total_price.clone(),
            scheduled_pickup_time: order.scheduled_pickup_time,
            estimated_earliest_pickup: order.estimated_earliest_pickup,
            created_at: Utc::now(),
        };
        self.state.orders.insert(record.order_id, record.clone());
        Ok(record)
    }

    fn insert_order_item(
        &mut self,
        order_id: i32,
        item: &OrderItemDraft,
    ) -> Result<(), DomainError> {
        if !self.state.orders.contains_key(&order_id) {
            return Err(DomainError::Internal(
                "order_items.order_id violates foreign key".to_string(),
            ));
        }
        if !self.state.menu.contains_key(&item.item_id) {
            return Err(DomainError::Internal(
                "order_items.item_id violates foreign key".to_string(),
            ));
        }
        if self
            .state
            .order_items
            .values()
            .any(|i| i.order_id == order_id && i.item_id == item.item_id)
        {
            return Err(DomainError::Internal(
                "order_items (order_id, item_id) must be unique".to_string(),
            ));
        }
        self.state.last_order_item_id += 1;
        let order_item_id = self.state.last_order_item_id;
        self.state.order_items.insert(
            order_item_id,
            OrderItemRow {
                order_item_id,
                order_id,
                item_id: item.item_id,
                quantity: item.quantity,
                unit_price: item.unit_price.clone(),
                line_total: item.line_total.clone(),
            },
        );
        Ok(())
    }

    fn clear_cart(&mut self, user_id: i32) -> Result<usize, DomainError> {
        let before = self.state.carts.len();
        self.state.carts.retain(|_, c| c.user_id != user_id);
        Ok(before - self.state.carts.len())
    }
}

impl OrderStore for MemoryStore {
    fn in_transaction<T, F>(&self, work: F) -> Result<T, DomainError>
    where
        F: FnOnce(&mut dyn UnitOfWork) -> Result<T, DomainError>,
    {
        let mut guard = self.lock();
        let mut working = guard.clone();
        let result = work(&mut MemoryUnit {
            state: &mut working,
        })?;
        *guard = working;
        Ok(result)
    }
}

// ── Cart ─────────────────────────────────────────────────────────────────────

impl CartRepository for MemoryStore {
    fn find_menu_item(&self, item_id: i32) -> Result<Option<MenuItem>, DomainError> {
        Ok(self.lock().menu.get(&item_id).map(|m| MenuItem {
            item_id: m.item_id,
            truck_id: m.truck_id,
            name: m.name.clone(),
            price: m.price.clone(),
            status: m.status,
        }))
    }

    fn find_entry(&self, cart_id: i32) -> Result<Option<CartEntry>, DomainError> {
        Ok(self.lock().carts.get(&cart_id).cloned())
    }

    fn upsert_entry(
        &self,
        user_id: i32,
        item_id: i32,
        quantity: i32,
        price: &BigDecimal,
    ) -> Result<CartEntry, DomainError> {
        let mut state = self.lock();
        if let Some(existing) = state
            .carts
            .values_mut()
            .find(|c| c.user_id == user_id && c.item_id == item_id)
        {
            existing.quantity = accumulate_quantity(existing.quantity, quantity)?;
            existing.price = price.clone();
            return Ok(existing.clone());
        }
        state.last_cart_id += 1;
        let entry = CartEntry {
            cart_id: state.last_cart_id,
            user_id,
            item_id,
            quantity,
            price: price.clone(),
        };
        state.carts.insert(entry.cart_id, entry.clone());
        Ok(entry)
    }

    fn set_quantity(&self, cart_id: i32, quantity: i32) -> Result<CartEntry, DomainError> {
        let mut state = self.lock();
        let entry = state
            .carts
            .get_mut(&cart_id)
            .ok_or_else(|| DomainError::not_found("cart item not found"))?;
        entry.quantity = quantity;
        Ok(entry.clone())
    }

    fn delete_entry(&self, cart_id: i32) -> Result<(), DomainError> {
        self.lock().carts.remove(&cart_id);
        Ok(())
    }

    fn lines_for_user(&self, user_id: i32) -> Result<Vec<CartViewLine>, DomainError> {
        let state = self.lock();
        Ok(state
            .carts
            .values()
            .filter(|c| c.user_id == user_id)
            .filter_map(|c| {
                state.menu.get(&c.item_id).map(|m| CartViewLine {
                    cart_id: c.cart_id,
                    item_id: c.item_id,
                    name: m.name.clone(),
                    description: m.description.clone(),
                    category: m.category.clone(),
                    truck_id: m.truck_id,
                    unit_price: c.price.clone(),
                    quantity: c.quantity,
                    line_total: line_total(&c.price, c.quantity),
                })
            })
            .collect())
    }
}

// ── Order read side ──────────────────────────────────────────────────────────

impl OrderQueries for MemoryStore {
    fn orders_for_customer(&self, user_id: i32) -> Result<Vec<OrderSummary>, DomainError> {
        let state = self.lock();
        state.summaries(state.orders.values().filter(|o| o.user_id == user_id))
    }

    fn orders_for_owner(&self, owner_id: i32) -> Result<Vec<OrderSummary>, DomainError> {
        let state = self.lock();
        state.summaries(state.orders.values().filter(|o| {
            state
                .trucks
                .get(&o.truck_id)
                .is_some_and(|t| t.owner_id == owner_id)
        }))
    }

    fn owner_has_trucks(&self, owner_id: i32) -> Result<bool, DomainError> {
        Ok(self.lock().trucks.values().any(|t| t.owner_id == owner_id))
    }

    fn find_summary(&self, order_id: i32) -> Result<Option<OrderSummary>, DomainError> {
        let state = self.lock();
        state
            .orders
            .get(&order_id)
            .map(|o| state.summary(o))
            .transpose()
    }

    fn find_details(&self, order_id: i32) -> Result<Option<OrderDetails>, DomainError> {
        let state = self.lock();
        let Some(order) = state.orders.get(&order_id) else {
            return Ok(None);
        };
        Ok(Some(OrderDetails {
            order: state.summary(order)?,
            items: state.item_views(order_id),
        }))
    }

    fn set_status(&self, order_id: i32, status: OrderStatus) -> Result<(), DomainError> {
        let mut state = self.lock();
        let order = state
            .orders
            .get_mut(&order_id)
            .ok_or_else(|| DomainError::not_found("order not found"))?;
        order.order_status = status;
        Ok(())
    }
}

// ── Sessions ─────────────────────────────────────────────────────────────────

impl CallerResolver for MemoryStore {
    fn resolve(&self, token: Uuid) -> Result<Option<Caller>, DomainError> {
        let state = self.lock();
        let Some(&(user_id, expires_at)) = state.sessions.get(&token) else {
            return Ok(None);
        };
        if expires_at <= Utc::now() {
            return Ok(None);
        }
        let Some(role) = state.users.get(&user_id) else {
            return Ok(None);
        };
        Ok(Some(Caller {
            user_id,
            role: role.parse()?,
        }))
    }
}
