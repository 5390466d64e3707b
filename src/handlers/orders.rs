use actix_web::{web, HttpRequest, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use utoipa::ToSchema;

use super::session::current_caller;
use super::{blocking, json_body, money};
use crate::application::orders::OrderService;
use crate::application::placement::PlacementCoordinator;
use crate::domain::identity::require_caller;
use crate::domain::order::{
    OrderDetails, OrderItemView, OrderSummary, PlaceOrderRequest, PlacedOrder, ValidationOptions,
};
use crate::domain::ports::Backend;
use crate::errors::AppError;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderBody {
    pub truck_id: i32,
    /// RFC 3339 timestamp, e.g. "2025-06-01T12:30:00Z"
    pub scheduled_pickup_time: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlacedOrderResponse {
    pub order_id: i32,
    pub truck_id: i32,
    pub total_price: String,
    pub order_status: String,
    pub scheduled_pickup_time: DateTime<Utc>,
    pub item_count: usize,
}

impl From<PlacedOrder> for PlacedOrderResponse {
    fn from(p: PlacedOrder) -> Self {
        Self {
            order_id: p.order_id,
            truck_id: p.truck_id,
            total_price: money(&p.total_price),
            order_status: p.order_status.to_string(),
            scheduled_pickup_time: p.scheduled_pickup_time,
            item_count: p.item_count,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub order_id: i32,
    pub user_id: i32,
    pub truck_id: i32,
    pub truck_name: String,
    pub order_status: String,
    pub total_price: String,
    pub scheduled_pickup_time: DateTime<Utc>,
    pub estimated_earliest_pickup: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<OrderSummary> for OrderResponse {
    fn from(o: OrderSummary) -> Self {
        Self {
            order_id: o.order_id,
            user_id: o.user_id,
            truck_id: o.truck_id,
            truck_name: o.truck_name,
            order_status: o.order_status.to_string(),
            total_price: money(&o.total_price),
            scheduled_pickup_time: o.scheduled_pickup_time,
            estimated_earliest_pickup: o.estimated_earliest_pickup,
            created_at: o.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemResponse {
    pub order_item_id: i32,
    pub item_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub quantity: i32,
    pub unit_price: String,
    pub line_total: String,
}

impl From<OrderItemView> for OrderItemResponse {
    fn from(i: OrderItemView) -> Self {
        Self {
            order_item_id: i.order_item_id,
            item_id: i.item_id,
            name: i.name,
            description: i.description,
            category: i.category,
            quantity: i.quantity,
            unit_price: money(&i.unit_price),
            line_total: money(&i.line_total),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderListResponse {
    pub orders: Vec<OrderResponse>,
    pub count: usize,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TruckOrderListResponse {
    pub orders: Vec<OrderResponse>,
    pub order_count: usize,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetailsResponse {
    pub order: OrderResponse,
    pub items: Vec<OrderItemResponse>,
    pub item_count: usize,
}

impl From<OrderDetails> for OrderDetailsResponse {
    fn from(d: OrderDetails) -> Self {
        let items: Vec<OrderItemResponse> = d.items.into_iter().map(Into::into).collect();
        Self {
            order: d.order.into(),
            item_count: items.len(),
            items,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusBody {
    /// One of pending, preparing, ready, completed, cancelled
    pub order_status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UpdatedOrderResponse {
    pub order: OrderResponse,
}

fn summaries(orders: Vec<OrderSummary>) -> Vec<OrderResponse> {
    orders.into_iter().map(Into::into).collect()
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /order/new
///
/// Turns the caller's cart into an order for one truck. The order, its items
/// and the emptied cart are committed together or not at all.
#[utoipa::path(
    post,
    path = "/order/new",
    request_body = PlaceOrderBody,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Order placed", body = PlacedOrderResponse),
        (status = 400, description = "Cart, truck or pickup time rejected"),
        (status = 401, description = "No valid session"),
        (status = 403, description = "Caller is not a customer"),
        (status = 404, description = "Truck not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn place_order<S: Backend>(
    req: HttpRequest,
    store: web::Data<S>,
    options: web::Data<ValidationOptions>,
    body: Result<web::Json<PlaceOrderBody>, actix_web::Error>,
) -> Result<HttpResponse, AppError> {
    let caller = current_caller(&store, &req).await?;
    require_caller(caller.as_ref())?;
    let body = json_body(body)?;
    let request = PlaceOrderRequest {
        truck_id: body.truck_id,
        scheduled_pickup_time: body.scheduled_pickup_time,
    };
    let coordinator = PlacementCoordinator::new(store.get_ref().clone(), *options.get_ref());

    // Dropping this future (client went away) cancels the token, and the
    // coordinator rolls back instead of committing.
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let placed =
        blocking(move || coordinator.place_order(caller.as_ref(), &request, &cancel)).await?;

    Ok(HttpResponse::Created().json(PlacedOrderResponse::from(placed)))
}

/// GET /order/myOrders
#[utoipa::path(
    get,
    path = "/order/myOrders",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Caller's orders, newest first", body = OrderListResponse),
        (status = 401, description = "No valid session"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn my_orders<S: Backend>(
    req: HttpRequest,
    store: web::Data<S>,
) -> Result<HttpResponse, AppError> {
    let caller = current_caller(&store, &req).await?;
    let service = OrderService::new(store.get_ref().clone());
    let orders = blocking(move || service.my_orders(caller.as_ref())).await?;

    let orders = summaries(orders);
    Ok(HttpResponse::Ok().json(OrderListResponse {
        count: orders.len(),
        orders,
    }))
}

/// GET /order/details/{orderId}
#[utoipa::path(
    get,
    path = "/order/details/{orderId}",
    params(("orderId" = i32, Path, description = "Order id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Order with its items", body = OrderDetailsResponse),
        (status = 401, description = "No valid session"),
        (status = 403, description = "Order belongs to another user"),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn order_details<S: Backend>(
    req: HttpRequest,
    store: web::Data<S>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let caller = current_caller(&store, &req).await?;
    let order_id = path.into_inner();
    let service = OrderService::new(store.get_ref().clone());
    let details = blocking(move || service.order_details(caller.as_ref(), order_id)).await?;

    Ok(HttpResponse::Ok().json(OrderDetailsResponse::from(details)))
}

/// GET /order/truckOrders
///
/// All orders across the trucks the caller owns.
#[utoipa::path(
    get,
    path = "/order/truckOrders",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Orders for the owner's trucks", body = TruckOrderListResponse),
        (status = 401, description = "No valid session"),
        (status = 403, description = "Caller is not a truck owner"),
        (status = 404, description = "Owner has no trucks"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn truck_orders<S: Backend>(
    req: HttpRequest,
    store: web::Data<S>,
) -> Result<HttpResponse, AppError> {
    let caller = current_caller(&store, &req).await?;
    let service = OrderService::new(store.get_ref().clone());
    let orders = blocking(move || service.truck_orders(caller.as_ref())).await?;

    let orders = summaries(orders);
    Ok(HttpResponse::Ok().json(TruckOrderListResponse {
        order_count: orders.len(),
        orders,
    }))
}

/// GET /order/truckOwner/{orderId}
#[utoipa::path(
    get,
    path = "/order/truckOwner/{orderId}",
    params(("orderId" = i32, Path, description = "Order id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Order with its items", body = OrderDetailsResponse),
        (status = 401, description = "No valid session"),
        (status = 403, description = "Order is for another owner's truck"),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn owner_order_details<S: Backend>(
    req: HttpRequest,
    store: web::Data<S>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let caller = current_caller(&store, &req).await?;
    let order_id = path.into_inner();
    let service = OrderService::new(store.get_ref().clone());
    let details = blocking(move || service.owner_order_details(caller.as_ref(), order_id)).await?;

    Ok(HttpResponse::Ok().json(OrderDetailsResponse::from(details)))
}

/// PUT /order/updateStatus/{orderId}
#[utoipa::path(
    put,
    path = "/order/updateStatus/{orderId}",
    params(("orderId" = i32, Path, description = "Order id")),
    request_body = UpdateStatusBody,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Status updated", body = UpdatedOrderResponse),
        (status = 400, description = "Unknown status"),
        (status = 401, description = "No valid session"),
        (status = 403, description = "Order is for another owner's truck"),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn update_status<S: Backend>(
    req: HttpRequest,
    store: web::Data<S>,
    path: web::Path<i32>,
    body: Result<web::Json<UpdateStatusBody>, actix_web::Error>,
) -> Result<HttpResponse, AppError> {
    let caller = current_caller(&store, &req).await?;
    require_caller(caller.as_ref())?;
    let order_id = path.into_inner();
    let status = json_body(body)?.order_status;
    let service = OrderService::new(store.get_ref().clone());
    let order =
        blocking(move || service.update_status(caller.as_ref(), order_id, &status)).await?;

    Ok(HttpResponse::Ok().json(UpdatedOrderResponse {
        order: order.into(),
    }))
}
