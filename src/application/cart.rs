use crate::domain::cart::{CartEntry, CartView};
use crate::domain::errors::DomainError;
use crate::domain::identity::{require_caller, Caller};
use crate::domain::money::sum_money;
use crate::domain::ports::CartRepository;

pub struct CartService<R> {
    repo: R,
}

impl<R: CartRepository> CartService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Adds `quantity` of a menu item, pricing the line from the menu.
    pub fn add_item(
        &self,
        caller: Option<&Caller>,
        item_id: i32,
        quantity: i32,
    ) -> Result<CartEntry, DomainError> {
        let caller = require_caller(caller)?;
        if item_id <= 0 || quantity <= 0 {
            return Err(DomainError::invalid("invalid itemId or quantity"));
        }
        let item = self
            .repo
            .find_menu_item(item_id)?
            .ok_or_else(|| DomainError::not_found("menu item not found"))?;
        self.repo
            .upsert_entry(caller.user_id, item.item_id, quantity, &item.price)
    }

    pub fn view(&self, caller: Option<&Caller>) -> Result<CartView, DomainError> {
        let caller = require_caller(caller)?;
        let lines = self.repo.lines_for_user(caller.user_id)?;
        let total_quantity = lines.iter().map(|l| i64::from(l.quantity)).sum();
        let total_price = sum_money(lines.iter().map(|l| &l.line_total));
        Ok(CartView {
            lines,
            total_quantity,
            total_price,
        })
    }

    pub fn update_quantity(
        &self,
        caller: Option<&Caller>,
        cart_id: i32,
        quantity: i32,
    ) -> Result<CartEntry, DomainError> {
        let caller = require_caller(caller)?;
        if cart_id <= 0 || quantity <= 0 {
            return Err(DomainError::invalid("invalid cartId or quantity"));
        }
        self.owned_entry(caller, cart_id)?;
        self.repo.set_quantity(cart_id, quantity)
    }

    pub fn remove(&self, caller: Option<&Caller>, cart_id: i32) -> Result<(), DomainError> {
        let caller = require_caller(caller)?;
        self.owned_entry(caller, cart_id)?;
        self.repo.delete_entry(cart_id)
    }

    fn owned_entry(&self, caller: &Caller, cart_id: i32) -> Result<CartEntry, DomainError> {
        let entry = self
            .repo
            .find_entry(cart_id)?
            .ok_or_else(|| DomainError::not_found("cart item not found"))?;
        if entry.user_id != caller.user_id {
            return Err(DomainError::forbidden("cart item belongs to another user"));
        }
        Ok(entry)
    }
}
