//! Pre-placement checks over data read inside the placement transaction.
//!
//! Prices and availability come from the menu rows joined into each
//! [`CartLine`], never from the price stored in the cart.

use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDateTime, Utc};

use super::errors::DomainError;
use super::identity::{authorize, Caller, Role};
use super::money::{fits_storage, line_total, sum_money};
use super::order::{
    CartLine, PlaceOrderRequest, Truck, ValidatedLine, ValidatedOrder, ValidationOptions,
};

/// Accepts RFC 3339, or a naive `YYYY-MM-DDTHH:MM[:SS]` taken as UTC.
pub fn parse_pickup_time(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Validates a placement and prices it from the current menu. Fails on the
/// first violation.
pub fn validate(
    caller: Option<&Caller>,
    request: &PlaceOrderRequest,
    cart: &[CartLine],
    truck: Option<&Truck>,
    now: DateTime<Utc>,
    options: ValidationOptions,
) -> Result<ValidatedOrder, DomainError> {
    let caller = caller.ok_or(DomainError::Unauthorized)?;

    let pickup_time = parse_pickup_time(&request.scheduled_pickup_time)
        .ok_or_else(|| DomainError::invalid("scheduledPickupTime is invalid"))?;
    if pickup_time <= now {
        return Err(DomainError::invalid(
            "scheduledPickupTime must be in the future",
        ));
    }

    if options.require_customer_role {
        authorize(caller, Role::Customer)
            .map_err(|_| DomainError::forbidden("only customers can place orders"))?;
    }

    if cart.is_empty() {
        return Err(DomainError::invalid("cart is empty"));
    }

    if request.truck_id <= 0 {
        return Err(DomainError::not_found("truck not found"));
    }
    let truck = truck
        .filter(|t| t.truck_id == request.truck_id)
        .ok_or_else(|| DomainError::not_found("truck not found"))?;
    if !truck.accepts_orders() {
        return Err(DomainError::invalid("truck not available"));
    }

    let lines = cart
        .iter()
        .map(|line| validate_line(line, request.truck_id))
        .collect::<Result<Vec<_>, _>>()?;
    let total_price = sum_money(lines.iter().map(|l| &l.line_total));
    if !fits_storage(&total_price) {
        return Err(DomainError::invalid("order total is too large"));
    }

    Ok(ValidatedOrder {
        user_id: caller.user_id,
        truck_id: request.truck_id,
        pickup_time,
        validated_at: now,
        lines,
        total_price,
    })
}

fn validate_line(line: &CartLine, truck_id: i32) -> Result<ValidatedLine, DomainError> {
    if line.quantity <= 0 {
        return Err(DomainError::invalid(format!(
            "invalid quantity for itemId {}",
            line.item_id
        )));
    }
    if line.item_truck_id != truck_id {
        return Err(DomainError::invalid(
            "cart contains items from a different truck",
        ));
    }
    if !line.item_status.is_available() {
        return Err(DomainError::invalid(format!(
            "menu item \"{}\" is not available",
            line.item_name
        )));
    }
    if line.menu_price < BigDecimal::from(0) {
        return Err(DomainError::invalid(format!(
            "invalid price for itemId {}",
            line.item_id
        )));
    }

    let total = line_total(&line.menu_price, line.quantity);
    if !fits_storage(&total) {
        return Err(DomainError::invalid(format!(
            "line total too large for itemId {}",
            line.item_id
        )));
    }

    Ok(ValidatedLine {
        cart_id: line.cart_id,
        item_id: line.item_id,
        name: line.item_name.clone(),
        quantity: line.quantity,
        unit_price: line.menu_price.clone(),
        line_total: total,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use std::str::FromStr;

    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::domain::order::Availability;

    pub(crate) fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).expect("valid decimal")
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn truck(truck_id: i32) -> Truck {
        Truck {
            truck_id,
            truck_name: "Falafel Express".to_string(),
            owner_id: 50,
            truck_status: Availability::Available,
            order_status: Availability::Available,
        }
    }

    fn line(cart_id: i32, item_id: i32, qty: i32, price: &str, truck_id: i32) -> CartLine {
        CartLine {
            cart_id,
            item_id,
            item_name: format!("item {item_id}"),
            quantity: qty,
            cart_price: dec(price),
            menu_price: dec(price),
            item_status: Availability::Available,
            item_truck_id: truck_id,
        }
    }

    fn request(truck_id: i32, pickup: DateTime<Utc>) -> PlaceOrderRequest {
        PlaceOrderRequest {
            truck_id,
            scheduled_pickup_time: pickup.to_rfc3339(),
        }
    }

    fn strict() -> ValidationOptions {
        ValidationOptions {
            require_customer_role: true,
        }
    }

    fn run(
        caller: Option<&Caller>,
        req: &PlaceOrderRequest,
        cart: &[CartLine],
        truck: Option<&Truck>,
    ) -> Result<ValidatedOrder, DomainError> {
        validate(caller, req, cart, truck, now(), strict())
    }

    #[test]
    fn prices_example_cart() {
        let cart = vec![line(1, 5, 2, "10.00", 3), line(2, 7, 1, "3.50", 3)];
        let validated = run(
            Some(&Caller::customer(11)),
            &request(3, now() + Duration::hours(1)),
            &cart,
            Some(&truck(3)),
        )
        .expect("valid order");

        assert_eq!(validated.total_price, dec("23.50"));
        assert_eq!(validated.lines.len(), 2);
        assert_eq!(validated.lines[0].line_total, dec("20.00"));
        assert_eq!(validated.lines[1].line_total, dec("3.50"));
        assert_eq!(validated.user_id, 11);
        assert_eq!(validated.validated_at, now());
    }

    #[test]
    fn uses_menu_price_not_cart_snapshot() {
        let mut stale = line(1, 5, 2, "10.00", 3);
        stale.cart_price = dec("1.00");
        let validated = run(
            Some(&Caller::customer(11)),
            &request(3, now() + Duration::hours(1)),
            &[stale],
            Some(&truck(3)),
        )
        .unwrap();
        assert_eq!(validated.lines[0].unit_price, dec("10.00"));
        assert_eq!(validated.total_price, dec("20.00"));
    }

    #[test]
    fn missing_caller_is_unauthorized_before_anything_else() {
        let req = PlaceOrderRequest {
            truck_id: -1,
            scheduled_pickup_time: "garbage".to_string(),
        };
        assert_eq!(
            run(None, &req, &[], None).unwrap_err(),
            DomainError::Unauthorized
        );
    }

    #[test]
    fn unparseable_pickup_time_is_invalid() {
        let req = PlaceOrderRequest {
            truck_id: 3,
            scheduled_pickup_time: "tomorrow-ish".to_string(),
        };
        let err = run(Some(&Caller::customer(1)), &req, &[], None).unwrap_err();
        assert_eq!(err, DomainError::invalid("scheduledPickupTime is invalid"));
    }

    #[test]
    fn pickup_time_equal_to_now_is_rejected() {
        let cart = vec![line(1, 5, 1, "1.00", 3)];
        let err = run(
            Some(&Caller::customer(1)),
            &request(3, now()),
            &cart,
            Some(&truck(3)),
        )
        .unwrap_err();
        assert_eq!(
            err,
            DomainError::invalid("scheduledPickupTime must be in the future")
        );
    }

    #[test]
    fn pickup_time_in_the_past_is_rejected() {
        let err = run(
            Some(&Caller::customer(1)),
            &request(3, now() - Duration::minutes(5)),
            &[],
            None,
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[test]
    fn truck_owner_is_forbidden_when_customer_role_required() {
        let err = run(
            Some(&Caller::truck_owner(1)),
            &request(3, now() + Duration::hours(1)),
            &[line(1, 5, 1, "1.00", 3)],
            Some(&truck(3)),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[test]
    fn truck_owner_may_order_when_role_not_required() {
        let result = validate(
            Some(&Caller::truck_owner(1)),
            &request(3, now() + Duration::hours(1)),
            &[line(1, 5, 1, "1.00", 3)],
            Some(&truck(3)),
            now(),
            ValidationOptions::default(),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn empty_cart_is_invalid() {
        let err = run(
            Some(&Caller::customer(1)),
            &request(3, now() + Duration::hours(1)),
            &[],
            Some(&truck(3)),
        )
        .unwrap_err();
        assert_eq!(err, DomainError::invalid("cart is empty"));
    }

    #[test]
    fn non_positive_truck_id_is_not_found() {
        let err = run(
            Some(&Caller::customer(1)),
            &request(0, now() + Duration::hours(1)),
            &[line(1, 5, 1, "1.00", 3)],
            None,
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[test]
    fn missing_truck_is_not_found() {
        let err = run(
            Some(&Caller::customer(1)),
            &request(3, now() + Duration::hours(1)),
            &[line(1, 5, 1, "1.00", 3)],
            None,
        )
        .unwrap_err();
        assert_eq!(err, DomainError::not_found("truck not found"));
    }

    #[test]
    fn unavailable_truck_is_invalid() {
        let mut closed = truck(3);
        closed.truck_status = Availability::Unavailable;
        let err = run(
            Some(&Caller::customer(1)),
            &request(3, now() + Duration::hours(1)),
            &[line(1, 5, 1, "1.00", 3)],
            Some(&closed),
        )
        .unwrap_err();
        assert_eq!(err, DomainError::invalid("truck not available"));
    }

    #[test]
    fn truck_not_taking_orders_is_invalid() {
        let mut paused = truck(3);
        paused.order_status = Availability::Unavailable;
        let err = run(
            Some(&Caller::customer(1)),
            &request(3, now() + Duration::hours(1)),
            &[line(1, 5, 1, "1.00", 3)],
            Some(&paused),
        )
        .unwrap_err();
        assert_eq!(err, DomainError::invalid("truck not available"));
    }

    #[test]
    fn cross_truck_cart_is_invalid() {
        let cart = vec![line(1, 5, 2, "10.00", 3), line(2, 7, 1, "3.50", 4)];
        let err = run(
            Some(&Caller::customer(1)),
            &request(3, now() + Duration::hours(1)),
            &cart,
            Some(&truck(3)),
        )
        .unwrap_err();
        assert_eq!(
            err,
            DomainError::invalid("cart contains items from a different truck")
        );
    }

    #[test]
    fn unavailable_item_is_invalid() {
        let mut sold_out = line(1, 5, 1, "1.00", 3);
        sold_out.item_status = Availability::Unavailable;
        let err = run(
            Some(&Caller::customer(1)),
            &request(3, now() + Duration::hours(1)),
            &[sold_out],
            Some(&truck(3)),
        )
        .unwrap_err();
        assert_eq!(err, DomainError::invalid("menu item \"item 5\" is not available"));
    }

    #[test]
    fn zero_quantity_is_invalid() {
        let err = run(
            Some(&Caller::customer(1)),
            &request(3, now() + Duration::hours(1)),
            &[line(1, 5, 0, "1.00", 3)],
            Some(&truck(3)),
        )
        .unwrap_err();
        assert_eq!(err, DomainError::invalid("invalid quantity for itemId 5"));
    }

    #[test]
    fn negative_price_is_invalid() {
        let err = run(
            Some(&Caller::customer(1)),
            &request(3, now() + Duration::hours(1)),
            &[line(1, 5, 1, "-0.01", 3)],
            Some(&truck(3)),
        )
        .unwrap_err();
        assert_eq!(err, DomainError::invalid("invalid price for itemId 5"));
    }

    #[test]
    fn free_item_is_allowed() {
        let validated = run(
            Some(&Caller::customer(1)),
            &request(3, now() + Duration::hours(1)),
            &[line(1, 5, 3, "0.00", 3)],
            Some(&truck(3)),
        )
        .unwrap();
        assert_eq!(validated.total_price, dec("0.00"));
    }

    #[test]
    fn first_bad_line_wins() {
        let mut unavailable = line(1, 5, 1, "1.00", 3);
        unavailable.item_status = Availability::Unavailable;
        let foreign = line(2, 7, 1, "1.00", 4);
        let err = run(
            Some(&Caller::customer(1)),
            &request(3, now() + Duration::hours(1)),
            &[unavailable, foreign],
            Some(&truck(3)),
        )
        .unwrap_err();
        assert_eq!(err, DomainError::invalid("menu item \"item 5\" is not available"));
    }

    #[test]
    fn parse_pickup_time_accepts_offsets_and_naive_times() {
        let expected = Utc.with_ymd_and_hms(2025, 6, 1, 13, 30, 0).unwrap();
        assert_eq!(parse_pickup_time("2025-06-01T13:30:00Z"), Some(expected));
        assert_eq!(parse_pickup_time("2025-06-01T15:30:00+02:00"), Some(expected));
        assert_eq!(parse_pickup_time("2025-06-01T13:30"), Some(expected));
        assert_eq!(parse_pickup_time("2025-06-01 13:30:00"), Some(expected));
        assert_eq!(parse_pickup_time(""), None);
    }

    #[test]
    fn line_total_beyond_storage_is_invalid() {
        let cart = vec![line(1, 5, 2_000_000_000, "10.00", 3)];
        let err = run(
            Some(&Caller::customer(1)),
            &request(3, now() + Duration::hours(1)),
            &cart,
            Some(&truck(3)),
        )
        .unwrap_err();
        assert_eq!(err, DomainError::invalid("line total too large for itemId 5"));
    }

    #[test]
    fn order_total_beyond_storage_is_invalid() {
        // Each line fits on its own; the sum does not.
        let cart = vec![
            line(1, 5, 6, "10000000.00", 3),
            line(2, 7, 6, "10000000.00", 3),
        ];
        let err = run(
            Some(&Caller::customer(1)),
            &request(3, now() + Duration::hours(1)),
            &cart,
            Some(&truck(3)),
        )
        .unwrap_err();
        assert_eq!(err, DomainError::invalid("order total is too large"));
    }
}
