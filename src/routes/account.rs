use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{patch, post, put},
};
use uuid::Uuid;

use crate::{
    audit,
    dto::users::{AddressRequest, ChangePasswordRequest, UpdateAddressRequest, UpdateProfileRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::User,
    response::{ApiResponse, Meta},
    services::user_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profile", patch(update_profile))
        .route("/password", put(change_password))
        .route("/addresses", post(add_address))
        .route(
            "/addresses/{address_id}",
            patch(update_address).delete(remove_address),
        )
}

#[utoipa::path(
    patch,
    path = "/api/account/profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = ApiResponse<User>),
        (status = 422, description = "Invalid fields")
    ),
    security(("bearer_auth" = [])),
    tag = "Account"
)]
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    let updated = user_service::update_profile(&state, user.user_id, payload).await?;
    Ok(Json(ApiResponse::success("Profile updated", updated, None)))
}

#[utoipa::path(
    put,
    path = "/api/account/password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = ApiResponse<serde_json::Value>),
        (status = 422, description = "Current password wrong or new one too short")
    ),
    security(("bearer_auth" = [])),
    tag = "Account"
)]
pub async fn change_password(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    user_service::change_password(
        &state,
        user.user_id,
        &payload.current_password,
        &payload.new_password,
    )
    .await?;
    audit::record(
        &state,
        Some(user.user_id),
        "password_change",
        "users",
        serde_json::json!({ "user_id": user.user_id }),
    )
    .await;
    Ok(Json(ApiResponse::success(
        "Password changed",
        serde_json::json!({}),
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    post,
    path = "/api/account/addresses",
    request_body = AddressRequest,
    responses(
        (status = 200, description = "Address added", body = ApiResponse<User>),
        (status = 422, description = "Missing fields")
    ),
    security(("bearer_auth" = [])),
    tag = "Account"
)]
pub async fn add_address(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<AddressRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    let updated = user_service::add_address(&state, user.user_id, payload).await?;
    Ok(Json(ApiResponse::success("Address added", updated, None)))
}

#[utoipa::path(
    patch,
    path = "/api/account/addresses/{address_id}",
    params(("address_id" = Uuid, Path, description = "Address ID")),
    request_body = UpdateAddressRequest,
    responses(
        (status = 200, description = "Address updated", body = ApiResponse<User>),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Account"
)]
pub async fn update_address(
    State(state): State<AppState>,
    user: AuthUser,
    Path(address_id): Path<Uuid>,
    Json(payload): Json<UpdateAddressRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    let updated = user_service::update_address(&state, user.user_id, address_id, payload).await?;
    Ok(Json(ApiResponse::success("Address updated", updated, None)))
}

#[utoipa::path(
    delete,
    path = "/api/account/addresses/{address_id}",
    params(("address_id" = Uuid, Path, description = "Address ID")),
    responses(
        (status = 200, description = "Address removed", body = ApiResponse<User>),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Account"
)]
pub async fn remove_address(
    State(state): State<AppState>,
    user: AuthUser,
    Path(address_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<User>>> {
    let updated = user_service::remove_address(&state, user.user_id, address_id).await?;
    Ok(Json(ApiResponse::success("Address removed", updated, None)))
}
