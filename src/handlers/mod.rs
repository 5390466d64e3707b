pub mod cart;
pub mod orders;
pub mod session;

use actix_web::web;
use bigdecimal::BigDecimal;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::errors::DomainError;
use crate::domain::money::round_money;
use crate::errors::AppError;

/// Runs synchronous store work on the blocking pool.
pub(crate) async fn blocking<T, F>(work: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, DomainError> + Send + 'static,
    T: Send + 'static,
{
    Ok(web::block(work)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??)
}

/// Unwraps a body whose extraction was deferred until after the session
/// check, so an anonymous request is answered 401 whatever it sent.
pub(crate) fn json_body<T>(body: Result<web::Json<T>, actix_web::Error>) -> Result<T, AppError> {
    body.map(web::Json::into_inner).map_err(|e| AppError::BadRequest(e.to_string()))
}

/// Money on the wire: a decimal string with two fractional digits.
pub(crate) fn money(amount: &BigDecimal) -> String {
    round_money(amount).to_string()
}

#[derive(OpenApi)]
#[openapi(
    paths(
        orders::place_order,
        orders::my_orders,
        orders::order_details,
        orders::truck_orders,
        orders::owner_order_details,
        orders::update_status,
        cart::add_to_cart,
        cart::view_cart,
        cart::edit_cart_item,
        cart::delete_cart_item,
    ),
    components(schemas(
        orders::PlaceOrderBody,
        orders::PlacedOrderResponse,
        orders::OrderResponse,
        orders::OrderItemResponse,
        orders::OrderListResponse,
        orders::TruckOrderListResponse,
        orders::OrderDetailsResponse,
        orders::UpdateStatusBody,
        orders::UpdatedOrderResponse,
        cart::AddToCartBody,
        cart::EditCartBody,
        cart::CartEntryResponse,
        cart::CartResponse,
        cart::CartItemResponse,
        cart::CartTotals,
        cart::CartViewResponse,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "orders", description = "Order placement and tracking"),
        (name = "cart", description = "Customer cart"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}
