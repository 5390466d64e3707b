use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::session::current_caller;
use super::{blocking, json_body, money};
use crate::application::cart::CartService;
use crate::domain::cart::{CartEntry, CartView, CartViewLine};
use crate::domain::identity::require_caller;
use crate::domain::ports::Backend;
use crate::errors::AppError;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartBody {
    pub item_id: i32,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct EditCartBody {
    pub quantity: i32,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartEntryResponse {
    pub cart_id: i32,
    pub item_id: i32,
    pub quantity: i32,
    pub price: String,
}

impl From<CartEntry> for CartEntryResponse {
    fn from(e: CartEntry) -> Self {
        Self {
            cart_id: e.cart_id,
            item_id: e.item_id,
            quantity: e.quantity,
            price: money(&e.price),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartResponse {
    pub cart: CartEntryResponse,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartItemResponse {
    pub cart_id: i32,
    pub item_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub truck_id: i32,
    pub price: String,
    pub quantity: i32,
    pub line_total: String,
}

impl From<CartViewLine> for CartItemResponse {
    fn from(l: CartViewLine) -> Self {
        Self {
            cart_id: l.cart_id,
            item_id: l.item_id,
            name: l.name,
            description: l.description,
            category: l.category,
            truck_id: l.truck_id,
            price: money(&l.unit_price),
            quantity: l.quantity,
            line_total: money(&l.line_total),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub total_quantity: i64,
    pub total_price: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartViewResponse {
    pub items: Vec<CartItemResponse>,
    pub totals: CartTotals,
}

impl From<CartView> for CartViewResponse {
    fn from(v: CartView) -> Self {
        Self {
            items: v.lines.into_iter().map(Into::into).collect(),
            totals: CartTotals {
                total_quantity: v.total_quantity,
                total_price: money(&v.total_price),
            },
        }
    }
}

/// POST /cart/new
///
/// Adding an item already in the cart increases its quantity.
#[utoipa::path(
    post,
    path = "/cart/new",
    request_body = AddToCartBody,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Cart line after the change", body = CartResponse),
        (status = 400, description = "Invalid item id or quantity"),
        (status = 401, description = "No valid session"),
        (status = 404, description = "Menu item not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "cart"
)]
pub async fn add_to_cart<S: Backend>(
    req: HttpRequest,
    store: web::Data<S>,
    body: Result<web::Json<AddToCartBody>, actix_web::Error>,
) -> Result<HttpResponse, AppError> {
    let caller = current_caller(&store, &req).await?;
    require_caller(caller.as_ref())?;
    let AddToCartBody { item_id, quantity } = json_body(body)?;
    let service = CartService::new(store.get_ref().clone());
    let entry = blocking(move || service.add_item(caller.as_ref(), item_id, quantity)).await?;

    Ok(HttpResponse::Ok().json(CartResponse { cart: entry.into() }))
}

/// GET /cart/view
#[utoipa::path(
    get,
    path = "/cart/view",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Cart lines with totals", body = CartViewResponse),
        (status = 401, description = "No valid session"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "cart"
)]
pub async fn view_cart<S: Backend>(
    req: HttpRequest,
    store: web::Data<S>,
) -> Result<HttpResponse, AppError> {
    let caller = current_caller(&store, &req).await?;
    let service = CartService::new(store.get_ref().clone());
    let view = blocking(move || service.view(caller.as_ref())).await?;

    Ok(HttpResponse::Ok().json(CartViewResponse::from(view)))
}

/// PUT /cart/edit/{cartId}
#[utoipa::path(
    put,
    path = "/cart/edit/{cartId}",
    params(("cartId" = i32, Path, description = "Cart line id")),
    request_body = EditCartBody,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Updated cart line", body = CartResponse),
        (status = 400, description = "Invalid quantity"),
        (status = 401, description = "No valid session"),
        (status = 403, description = "Line belongs to another user"),
        (status = 404, description = "Cart line not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "cart"
)]
pub async fn edit_cart_item<S: Backend>(
    req: HttpRequest,
    store: web::Data<S>,
    path: web::Path<i32>,
    body: Result<web::Json<EditCartBody>, actix_web::Error>,
) -> Result<HttpResponse, AppError> {
    let caller = current_caller(&store, &req).await?;
    require_caller(caller.as_ref())?;
    let cart_id = path.into_inner();
    let quantity = json_body(body)?.quantity;
    let service = CartService::new(store.get_ref().clone());
    let entry =
        blocking(move || service.update_quantity(caller.as_ref(), cart_id, quantity)).await?;

    Ok(HttpResponse::Ok().json(CartResponse { cart: entry.into() }))
}

/// DELETE /cart/delete/{cartId}
#[utoipa::path(
    delete,
    path = "/cart/delete/{cartId}",
    params(("cartId" = i32, Path, description = "Cart line id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "Line removed"),
        (status = 401, description = "No valid session"),
        (status = 403, description = "Line belongs to another user"),
        (status = 404, description = "Cart line not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "cart"
)]
pub async fn delete_cart_item<S: Backend>(
    req: HttpRequest,
    store: web::Data<S>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let caller = current_caller(&store, &req).await?;
    let cart_id = path.into_inner();
    let service = CartService::new(store.get_ref().clone());
    blocking(move || service.remove(caller.as_ref(), cart_id)).await?;

    Ok(HttpResponse::NoContent().finish())
}
