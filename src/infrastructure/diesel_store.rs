use bigdecimal::BigDecimal;
use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::upsert::excluded;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::cart::{accumulate_quantity, CartEntry, CartViewLine, MenuItem};
use crate::domain::errors::DomainError;
use crate::domain::identity::Caller;
use crate::domain::money::line_total;
use crate::domain::order::{
    CartLine, OrderDetails, OrderDraft, OrderItemDraft, OrderItemView, OrderRecord, OrderStatus,
    OrderSummary, Truck,
};
use crate::domain::ports::{CallerResolver, CartRepository, OrderQueries, OrderStore, UnitOfWork};
use crate::schema::{carts, menu_items, order_items, orders, sessions, trucks, users};

use super::models::{
    parse_stored_status, CartLineRow, CartRow, CartViewRow, MenuItemRow, NewCartRow,
    NewOrderItemRow, NewOrderRow, OrderItemViewRow, OrderRow, OrderSummaryRow, TruckRow,
};

// ── Error conversions (infrastructure concern only) ──────────────────────────

impl From<DieselError> for DomainError {
    fn from(e: DieselError) -> Self {
        match &e {
            DieselError::DatabaseError(DatabaseErrorKind::SerializationFailure, _) => {
                log::warn!("Transaction lost a serialization race: {}", e);
            }
            _ => log::error!("Database error: {}", e),
        }
        DomainError::Internal(e.to_string())
    }
}

impl From<r2d2::Error> for DomainError {
    fn from(e: r2d2::Error) -> Self {
        log::error!("Connection pool error: {}", e);
        DomainError::Internal(e.to_string())
    }
}

// ── Row mapping ──────────────────────────────────────────────────────────────

impl TryFrom<OrderSummaryRow> for OrderSummary {
    type Error = DomainError;

    fn try_from(row: OrderSummaryRow) -> Result<Self, Self::Error> {
        Ok(OrderSummary {
            order_id: row.order_id,
            user_id: row.user_id,
            truck_id: row.truck_id,
            truck_name: row.truck_name,
            truck_owner_id: row.truck_owner_id,
            order_status: parse_stored_status(&row.order_status)?,
            total_price: row.total_price,
            scheduled_pickup_time: row.scheduled_pickup_time,
            estimated_earliest_pickup: row.estimated_earliest_pickup,
            created_at: row.created_at,
        })
    }
}

impl From<CartRow> for CartEntry {
    fn from(row: CartRow) -> Self {
        CartEntry {
            cart_id: row.cart_id,
            user_id: row.user_id,
            item_id: row.item_id,
            quantity: row.quantity,
            price: row.price,
        }
    }
}

// ── Placement unit of work ───────────────────────────────────────────────────

struct DieselUnit<'a> {
    conn: &'a mut PgConnection,
}

impl UnitOfWork for DieselUnit<'_> {
    fn load_cart_for_update(&mut self, user_id: i32) -> Result<Vec<CartLine>, DomainError> {
        // Row locks on the cart only; menu items stay unlocked so concurrent
        // orders for the same item do not contend.
        carts::table
            .filter(carts::user_id.eq(user_id))
            .select(carts::cart_id)
            .for_update()
            .load::<i32>(self.conn)?;

        let rows = carts::table
            .inner_join(menu_items::table)
            .filter(carts::user_id.eq(user_id))
            .order(carts::cart_id.asc())
            .select((
                carts::cart_id,
                carts::item_id,
                menu_items::name,
                carts::quantity,
                carts::price,
                menu_items::price,
                menu_items::status,
                menu_items::truck_id,
            ))
            .load::<CartLineRow>(self.conn)?;

        Ok(rows
            .into_iter()
            .map(|r| CartLine {
                cart_id: r.cart_id,
                item_id: r.item_id,
                item_name: r.item_name,
                quantity: r.quantity,
                cart_price: r.cart_price,
                menu_price: r.menu_price,
                item_status: r.item_status.as_str().into(),
                item_truck_id: r.item_truck_id,
            })
            .collect())
    }

    fn load_truck(&mut self, truck_id: i32) -> Result<Option<Truck>, DomainError> {
        let row = trucks::table
            .find(truck_id)
            .select(TruckRow::as_select())
            .first(self.conn)
            .optional()?;
        Ok(row.map(Truck::from))
    }

    fn insert_order(&mut self, order: &OrderDraft) -> Result<OrderRecord, DomainError> {
        let row = diesel::insert_into(orders::table)
            .values(&NewOrderRow {
                user_id: order.user_id,
                truck_id: order.truck_id,
                order_status: order.order_status.as_str().to_string(),
                total_price: order.total_price.clone(),
                scheduled_pickup_time: order.scheduled_pickup_time,
                estimated_earliest_pickup: order.estimated_earliest_pickup,
            })
            .returning(OrderRow::as_returning())
            .get_result(self.conn)?;

        Ok(OrderRecord {
            order_id: row.order_id,
            user_id: row.user_id,
            truck_id: row.truck_id,
            order_status: parse_stored_status(&row.order_status)?,
            total_price: row.total_price,
            scheduled_pickup_time: row.scheduled_pickup_time,
            estimated_earliest_pickup: row.estimated_earliest_pickup,
            created_at: row.created_at,
        })
    }

    fn insert_order_item(
        &mut self,
        order_id: i32,
        item: &OrderItemDraft,
    ) -> Result<(), DomainError> {
        diesel::insert_into(order_items::table)
            .values(&NewOrderItemRow {
                order_id,
                item_id: item.item_id,
                quantity: item.quantity,
                unit_price: item.unit_price.clone(),
                line_total: item.line_total.clone(),
            })
            .execute(self.conn)?;
        Ok(())
    }

    fn clear_cart(&mut self, user_id: i32) -> Result<usize, DomainError> {
        Ok(diesel::delete(carts::table.filter(carts::user_id.eq(user_id))).execute(self.conn)?)
    }
}

// ── Store ────────────────────────────────────────────────────────────────────

/// Postgres adapter for every persistence port.
#[derive(Clone)]
pub struct DieselStore {
    pool: DbPool,
}

impl DieselStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl OrderStore for DieselStore {
    fn in_transaction<T, F>(&self, work: F) -> Result<T, DomainError>
    where
        F: FnOnce(&mut dyn UnitOfWork) -> Result<T, DomainError>,
    {
        let mut conn = self.pool.get()?;
        conn.build_transaction()
            .serializable()
            .run::<_, DomainError, _>(|conn| work(&mut DieselUnit { conn }))
    }
}

impl CartRepository for DieselStore {
    fn find_menu_item(&self, item_id: i32) -> Result<Option<MenuItem>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = menu_items::table
            .find(item_id)
            .select(MenuItemRow::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(row.map(|m| MenuItem {
            item_id: m.item_id,
            truck_id: m.truck_id,
            name: m.name,
            price: m.price,
            status: m.status.as_str().into(),
        }))
    }

    fn find_entry(&self, cart_id: i32) -> Result<Option<CartEntry>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = carts::table
            .find(cart_id)
            .select(CartRow::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(row.map(CartEntry::from))
    }

    fn upsert_entry(
        &self,
        user_id: i32,
        item_id: i32,
        quantity: i32,
        price: &BigDecimal,
    ) -> Result<CartEntry, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let existing = carts::table
                .filter(carts::user_id.eq(user_id))
                .filter(carts::item_id.eq(item_id))
                .select(CartRow::as_select())
                .for_update()
                .first(conn)
                .optional()?;

            if let Some(existing) = existing {
                let quantity = accumulate_quantity(existing.quantity, quantity)?;
                let row = diesel::update(carts::table.find(existing.cart_id))
                    .set((carts::quantity.eq(quantity), carts::price.eq(price.clone())))
                    .returning(CartRow::as_returning())
                    .get_result(conn)?;
                return Ok(row.into());
            }

            let row = diesel::insert_into(carts::table)
                .values(&NewCartRow {
                    user_id,
                    item_id,
                    quantity,
                    price: price.clone(),
                })
                .on_conflict((carts::user_id, carts::item_id))
                .do_update()
                .set((
                    carts::quantity.eq(carts::quantity + excluded(carts::quantity)),
                    carts::price.eq(excluded(carts::price)),
                ))
                .returning(CartRow::as_returning())
                .get_result(conn)?;
            Ok(row.into())
        })
    }

    fn set_quantity(&self, cart_id: i32, quantity: i32) -> Result<CartEntry, DomainError> {
        let mut conn = self.pool.get()?;
        let row = diesel::update(carts::table.find(cart_id))
            .set(carts::quantity.eq(quantity))
            .returning(CartRow::as_returning())
            .get_result(&mut conn)
            .optional()?;
        row.map(CartEntry::from)
            .ok_or_else(|| DomainError::not_found("cart item not found"))
    }

    fn delete_entry(&self, cart_id: i32) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;
        diesel::delete(carts::table.find(cart_id)).execute(&mut conn)?;
        Ok(())
    }

    fn lines_for_user(&self, user_id: i32) -> Result<Vec<CartViewLine>, DomainError> {
        let mut conn = self.pool.get()?;
        let rows = carts::table
            .inner_join(menu_items::table)
            .filter(carts::user_id.eq(user_id))
            .order(carts::cart_id.asc())
            .select((
                carts::cart_id,
                carts::item_id,
                menu_items::name,
                menu_items::description,
                menu_items::category,
                menu_items::truck_id,
                carts::price,
                carts::quantity,
            ))
            .load::<CartViewRow>(&mut conn)?;

        Ok(rows
            .into_iter()
            .map(|r| CartViewLine {
                line_total: line_total(&r.price, r.quantity),
                cart_id: r.cart_id,
                item_id: r.item_id,
                name: r.name,
                description: r.description,
                category: r.category,
                truck_id: r.truck_id,
                unit_price: r.price,
                quantity: r.quantity,
            })
            .collect())
    }
}

// ── Order read side ──────────────────────────────────────────────────────────

type SummaryColumns = (
    orders::order_id,
    orders::user_id,
    orders::truck_id,
    trucks::truck_name,
    trucks::owner_id,
    orders::order_status,
    orders::total_price,
    orders::scheduled_pickup_time,
    orders::estimated_earliest_pickup,
    orders::created_at,
);

const SUMMARY_COLUMNS: SummaryColumns = (
    orders::order_id,
    orders::user_id,
    orders::truck_id,
    trucks::truck_name,
    trucks::owner_id,
    orders::order_status,
    orders::total_price,
    orders::scheduled_pickup_time,
    orders::estimated_earliest_pickup,
    orders::created_at,
);

fn into_summaries(rows: Vec<OrderSummaryRow>) -> Result<Vec<OrderSummary>, DomainError> {
    rows.into_iter().map(OrderSummary::try_from).collect()
}

fn load_summary(
    conn: &mut PgConnection,
    order_id: i32,
) -> Result<Option<OrderSummary>, DomainError> {
    orders::table
        .inner_join(trucks::table)
        .filter(orders::order_id.eq(order_id))
        .select(SUMMARY_COLUMNS)
        .first::<OrderSummaryRow>(conn)
        .optional()?
        .map(OrderSummary::try_from)
        .transpose()
}

impl OrderQueries for DieselStore {
    fn orders_for_customer(&self, user_id: i32) -> Result<Vec<OrderSummary>, DomainError> {
        let mut conn = self.pool.get()?;
        let rows = orders::table
            .inner_join(trucks::table)
            .filter(orders::user_id.eq(user_id))
            .order((orders::created_at.desc(), orders::order_id.desc()))
            .select(SUMMARY_COLUMNS)
            .load::<OrderSummaryRow>(&mut conn)?;
        into_summaries(rows)
    }

    fn orders_for_owner(&self, owner_id: i32) -> Result<Vec<OrderSummary>, DomainError> {
        let mut conn = self.pool.get()?;
        let rows = orders::table
            .inner_join(trucks::table)
            .filter(trucks::owner_id.eq(owner_id))
            .order((orders::created_at.desc(), orders::order_id.desc()))
            .select(SUMMARY_COLUMNS)
            .load::<OrderSummaryRow>(&mut conn)?;
        into_summaries(rows)
    }

    fn owner_has_trucks(&self, owner_id: i32) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        Ok(diesel::select(diesel::dsl::exists(
            trucks::table.filter(trucks::owner_id.eq(owner_id)),
        ))
        .get_result::<bool>(&mut conn)?)
    }

    fn find_summary(&self, order_id: i32) -> Result<Option<OrderSummary>, DomainError> {
        let mut conn = self.pool.get()?;
        load_summary(&mut conn, order_id)
    }

    fn find_details(&self, order_id: i32) -> Result<Option<OrderDetails>, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let Some(order) = load_summary(conn, order_id)? else {
                return Ok(None);
            };

            let items = order_items::table
                .inner_join(menu_items::table)
                .filter(order_items::order_id.eq(order_id))
                .order(order_items::order_item_id.asc())
                .select((
                    order_items::order_item_id,
                    order_items::item_id,
                    menu_items::name,
                    menu_items::description,
                    menu_items::category,
                    order_items::quantity,
                    order_items::unit_price,
                    order_items::line_total,
                ))
                .load::<OrderItemViewRow>(conn)?;

            Ok(Some(OrderDetails {
                order,
                items: items
                    .into_iter()
                    .map(|i| OrderItemView {
                        order_item_id: i.order_item_id,
                        item_id: i.item_id,
                        name: i.name,
                        description: i.description,
                        category: i.category,
                        quantity: i.quantity,
                        unit_price: i.unit_price,
                        line_total: i.line_total,
                    })
                    .collect(),
            }))
        })
    }

    fn set_status(&self, order_id: i32, status: OrderStatus) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;
        let updated = diesel::update(orders::table.find(order_id))
            .set(orders::order_status.eq(status.as_str()))
            .execute(&mut conn)?;
        if updated == 0 {
            return Err(DomainError::not_found("order not found"));
        }
        Ok(())
    }
}

// ── Sessions ─────────────────────────────────────────────────────────────────

impl CallerResolver for DieselStore {
    fn resolve(&self, token: Uuid) -> Result<Option<Caller>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = sessions::table
            .inner_join(users::table)
            .filter(sessions::token.eq(token))
            .filter(sessions::expires_at.gt(Utc::now()))
            .select((users::user_id, users::role))
            .first::<(i32, String)>(&mut conn)
            .optional()?;

        row.map(|(user_id, role)| {
            Ok(Caller {
                user_id,
                role: role.parse()?,
            })
        })
        .transpose()
    }
}
