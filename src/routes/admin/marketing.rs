use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    audit,
    dto::coupons::{CouponList, CouponQuote, CreateCouponRequest, UpdateCouponRequest, ValidateCouponRequest},
    error::AppResult,
    middleware::auth::{AuthUser, ensure_staff},
    models::Coupon,
    response::{ApiResponse, Meta},
    services::coupon_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/coupons", get(list_coupons).post(create_coupon))
        .route("/coupons/validate", post(validate_coupon))
        .route(
            "/coupons/{id}",
            get(get_coupon).patch(update_coupon).delete(delete_coupon),
        )
}

#[utoipa::path(
    get,
    path = "/api/admin/coupons",
    responses(
        (status = 200, description = "Coupons, newest first", body = ApiResponse<CouponList>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_coupons(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<CouponList>>> {
    ensure_staff(&user)?;
    let items = coupon_service::all_coupons(&state).await?;
    Ok(Json(ApiResponse::success("Coupons", CouponList { items }, None)))
}

#[utoipa::path(
    get,
    path = "/api/admin/coupons/{id}",
    params(("id" = Uuid, Path, description = "Coupon ID")),
    responses(
        (status = 200, description = "Coupon", body = ApiResponse<Coupon>),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn get_coupon(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Coupon>>> {
    ensure_staff(&user)?;
    let coupon = coupon_service::get_coupon(&state, id).await?;
    Ok(Json(ApiResponse::success("Coupon", coupon, None)))
}

#[utoipa::path(
    post,
    path = "/api/admin/coupons",
    request_body = CreateCouponRequest,
    responses(
        (status = 201, description = "Coupon created", body = ApiResponse<Coupon>),
        (status = 409, description = "Code already exists"),
        (status = 422, description = "Invalid terms")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn create_coupon(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateCouponRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Coupon>>)> {
    ensure_staff(&user)?;
    let coupon = coupon_service::create_coupon(&state, payload).await?;
    audit::record(
        &state,
        Some(user.user_id),
        "coupon_create",
        "coupons",
        serde_json::json!({ "coupon_id": coupon.id, "code": coupon.code }),
    )
    .await;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Coupon created", coupon, None)),
    ))
}

#[utoipa::path(
    patch,
    path = "/api/admin/coupons/{id}",
    params(("id" = Uuid, Path, description = "Coupon ID")),
    request_body = UpdateCouponRequest,
    responses(
        (status = 200, description = "Coupon updated", body = ApiResponse<Coupon>),
        (status = 404, description = "Not Found"),
        (status = 422, description = "Invalid terms")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_coupon(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCouponRequest>,
) -> AppResult<Json<ApiResponse<Coupon>>> {
    ensure_staff(&user)?;
    let coupon = coupon_service::update_coupon(&state, id, payload).await?;
    Ok(Json(ApiResponse::success("Coupon updated", coupon, None)))
}

#[utoipa::path(
    delete,
    path = "/api/admin/coupons/{id}",
    params(("id" = Uuid, Path, description = "Coupon ID")),
    responses(
        (status = 200, description = "Coupon deleted", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn delete_coupon(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    ensure_staff(&user)?;
    coupon_service::delete_coupon(&state, id).await?;
    audit::record(
        &state,
        Some(user.user_id),
        "coupon_delete",
        "coupons",
        serde_json::json!({ "coupon_id": id }),
    )
    .await;
    Ok(Json(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    post,
    path = "/api/admin/coupons/validate",
    request_body = ValidateCouponRequest,
    responses(
        (status = 200, description = "Discount the code would give", body = ApiResponse<CouponQuote>),
        (status = 422, description = "Coupon rejected")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn validate_coupon(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<ValidateCouponRequest>,
) -> AppResult<Json<ApiResponse<CouponQuote>>> {
    ensure_staff(&user)?;
    let quote = coupon_service::quote(&state, &payload.code, payload.subtotal).await?;
    Ok(Json(ApiResponse::success("Coupon valid", quote, None)))
}
