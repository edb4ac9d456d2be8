use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch, post},
};
use uuid::Uuid;

use crate::{
    audit,
    dto::orders::{
        CancelOrderRequest, OrderList, OrderStats, RevenueReport, UpdateOrderStatusRequest,
        UpdatePaymentStatusRequest,
    },
    error::AppResult,
    middleware::auth::{AuthUser, ensure_staff},
    models::Order,
    response::ApiResponse,
    routes::params::{DateRangeQuery, OrderListQuery},
    services::order_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_all_orders))
        .route("/orders/stats", get(order_stats))
        .route("/orders/revenue", get(revenue_report))
        .route("/orders/{id}", get(get_order_admin))
        .route("/orders/{id}/status", patch(update_order_status))
        .route("/orders/{id}/payment", patch(update_payment_status))
        .route("/orders/{id}/cancel", post(cancel_order_admin))
}

#[utoipa::path(
    get,
    path = "/api/admin/orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("q" = Option<String>, Query, description = "Order number, shipping name or address, status")
    ),
    responses(
        (status = 200, description = "Get all orders (staff only)", body = ApiResponse<OrderList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_all_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    ensure_staff(&user)?;
    let page = order_service::list_orders(&state, query).await?;
    let meta = page.meta();
    Ok(Json(ApiResponse::success(
        "OK",
        OrderList { items: page.items },
        Some(meta),
    )))
}

#[utoipa::path(
    get,
    path = "/api/admin/orders/stats",
    responses(
        (status = 200, description = "Counts per status and revenue", body = ApiResponse<OrderStats>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn order_stats(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<OrderStats>>> {
    ensure_staff(&user)?;
    let stats = order_service::order_stats(&state).await?;
    Ok(Json(ApiResponse::success("OK", stats, None)))
}

#[utoipa::path(
    get,
    path = "/api/admin/orders/revenue",
    params(
        ("from" = String, Query, description = "RFC 3339 start, inclusive"),
        ("to" = String, Query, description = "RFC 3339 end, inclusive")
    ),
    responses(
        (status = 200, description = "Revenue of non-cancelled orders in the range", body = ApiResponse<RevenueReport>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn revenue_report(
    State(state): State<AppState>,
    user: AuthUser,
    Query(range): Query<DateRangeQuery>,
) -> AppResult<Json<ApiResponse<RevenueReport>>> {
    ensure_staff(&user)?;
    let report = order_service::revenue_by_date_range(&state, range.from, range.to).await?;
    Ok(Json(ApiResponse::success("OK", report, None)))
}

#[utoipa::path(
    get,
    path = "/api/admin/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Get any order (staff only)", body = ApiResponse<Order>),
        (status = 404, description = "Not Found"),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn get_order_admin(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Order>>> {
    ensure_staff(&user)?;
    let order = order_service::get_order(&state, id).await?;
    Ok(Json(ApiResponse::success("OK", order, None)))
}

#[utoipa::path(
    patch,
    path = "/api/admin/orders/{id}/status",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Update order status", body = ApiResponse<Order>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Order already cancelled"),
        (status = 422, description = "Invalid status"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    ensure_staff(&user)?;
    let order = order_service::update_order_status(&state, id, payload.status).await?;
    audit::record(
        &state,
        Some(user.user_id),
        "order_status_update",
        "orders",
        serde_json::json!({ "order_id": id, "status": payload.status }),
    )
    .await;
    Ok(Json(ApiResponse::success("Order status updated", order, None)))
}

#[utoipa::path(
    patch,
    path = "/api/admin/orders/{id}/payment",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = UpdatePaymentStatusRequest,
    responses(
        (status = 200, description = "Update payment status", body = ApiResponse<Order>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_payment_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePaymentStatusRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    ensure_staff(&user)?;
    let order = order_service::update_payment_status(&state, id, payload.payment_status).await?;
    audit::record(
        &state,
        Some(user.user_id),
        "order_payment_update",
        "orders",
        serde_json::json!({ "order_id": id, "payment_status": payload.payment_status }),
    )
    .await;
    Ok(Json(ApiResponse::success("Payment status updated", order, None)))
}

#[utoipa::path(
    post,
    path = "/api/admin/orders/{id}/cancel",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = CancelOrderRequest,
    responses(
        (status = 200, description = "Order cancelled and stock restored", body = ApiResponse<Order>),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Order can no longer be cancelled"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn cancel_order_admin(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CancelOrderRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    ensure_staff(&user)?;
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
