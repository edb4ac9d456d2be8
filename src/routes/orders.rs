use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    audit,
    dto::orders::{CancelOrderRequest, CheckoutRequest, OrderList, OrderTracking},
    error::{AppError, AppResult},
    middleware::{
        auth::{AuthUser, MaybeAuthUser},
        cart_session::CartSession,
    },
    models::Order,
    response::{ApiResponse, Meta},
    services::{checkout_service, order_service},
    state::AppState,
};

pub fn route() -> Router<AppState> {
    Router::new()
        .route("/", get(list_order))
        .route("/checkout", post(checkout))
        .route("/track/{order_number}", get(track_order))
        .route("/{id}", get(get_order))
        .route("/{id}/cancel", post(cancel_order))
}

/// Owners see their orders, staff see every order.
async fn owned_order(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<Order> {
    let order = order_service::get_order(state, id).await?;
    if order.user_id != Some(user.user_id) && !user.role.is_staff() {
        return Err(AppError::NotFound);
    }
    Ok(order)
}

#[utoipa::path(
    get,
    path = "/api/orders",
    responses(
        (status = 200, description = "Orders of the current user, newest first", body = ApiResponse<OrderList>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn list_order(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let orders = order_service::orders_by_user(&state, user.user_id).await?;
    let total = orders.len() as i64;
    let meta = Meta::new(1, total.max(1), total);
    let data = OrderList { items: orders };
    Ok(Json(ApiResponse::success("Ok", data, Some(meta))))
}

#[utoipa::path(
    post,
    path = "/api/orders/checkout",
    params(("x-cart-id" = String, Header, description = "Cart identifier")),
    request_body = CheckoutRequest,
    responses(
        (status = 201, description = "Order placed and cart emptied", body = ApiResponse<Order>),
        (status = 400, description = "Empty cart or insufficient stock"),
        (status = 422, description = "Invalid shipping form or coupon"),
    ),
    tag = "Orders"
)]
pub async fn checkout(
    State(state): State<AppState>,
    MaybeAuthUser(user): MaybeAuthUser,
    CartSession(cart_id): CartSession,
    Json(payload): Json<CheckoutRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Order>>)> {
    let user_id = user.map(|u| u.user_id);
    let order = checkout_service::checkout(&state, &cart_id, user_id, payload).await?;

    audit::record(
        &state,
        user_id,
        "order_checkout",
        "orders",
        serde_json::json!({ "order_id": order.id, "total": order.total_amount }),
    )
    .await;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Order placed", order, None)),
    ))
}

#[utoipa::path(
    get,
    path = "/api/orders/track/{order_number}",
    params(("order_number" = String, Path, description = "Order number")),
    responses(
        (status = 200, description = "Order status", body = ApiResponse<OrderTracking>),
        (status = 404, description = "Not Found")
    ),
    tag = "Orders"
)]
pub async fn track_order(
    State(state): State<AppState>,
    Path(order_number): Path<String>,
) -> AppResult<Json<ApiResponse<OrderTracking>>> {
    let order = order_service::get_order_by_number(&state, &order_number).await?;
    Ok(Json(ApiResponse::success("OK", OrderTracking::from(order), None)))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order with its lines", body = ApiResponse<Order>),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let order = owned_order(&state, &user, id).await?;
    Ok(Json(ApiResponse::success("OK", order, None)))
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/cancel",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = CancelOrderRequest,
    responses(
        (status = 200, description = "Order cancelled and stock restored", body = ApiResponse<Order>),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Order can no longer be cancelled")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn cancel_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CancelOrderRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    owned_order(&state, &user, id).await?;
    let order = order_service::cancel_order(&state, id, payload.reason).await?;
    audit::record(
        &state,
        Some(user.user_id),
        "order_cancel",
        "orders",
        serde_json::json!({ "order_id": id }),
    )
    .await;
    Ok(Json(ApiResponse::success("Order cancelled", order, None)))
}
