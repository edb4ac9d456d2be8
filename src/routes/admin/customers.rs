use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch, post},
};
use uuid::Uuid;

use crate::{
    audit,
    dto::{
        orders::OrderList,
        users::{UpdateRoleRequest, UserList, UserStats},
    },
    error::AppResult,
    middleware::auth::{AuthUser, ensure_admin, ensure_staff},
    models::User,
    response::ApiResponse,
    routes::params::UserListQuery,
    services::{order_service, user_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/stats", get(user_stats))
        .route("/users/recent", get(recent_users))
        .route("/users/{id}", get(get_user).delete(deactivate_user))
        .route("/users/{id}/orders", get(user_orders))
        .route("/users/{id}/activate", post(activate_user))
        .route("/users/{id}/verify-email", post(verify_email))
        .route("/users/{id}/role", patch(update_role))
}

#[utoipa::path(
    get,
    path = "/api/admin/users",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("role" = Option<String>, Query, description = "admin, editor or customer"),
        ("q" = Option<String>, Query, description = "Search name, email and phone")
    ),
    responses(
        (status = 200, description = "Users, newest first", body = ApiResponse<UserList>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_users(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<UserListQuery>,
) -> AppResult<Json<ApiResponse<UserList>>> {
    ensure_staff(&user)?;
    let page = user_service::list_users(&state, query).await?;
    let meta = page.meta();
    Ok(Json(ApiResponse::success(
        "Users",
        UserList { items: page.items },
        Some(meta),
    )))
}

#[utoipa::path(
    get,
    path = "/api/admin/users/stats",
    responses(
        (status = 200, description = "User statistics", body = ApiResponse<UserStats>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn user_stats(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<UserStats>>> {
    ensure_staff(&user)?;
    let stats = user_service::user_stats(&state).await?;
    Ok(Json(ApiResponse::success("OK", stats, None)))
}

#[utoipa::path(
    get,
    path = "/api/admin/users/recent",
    responses(
        (status = 200, description = "Latest registrations", body = ApiResponse<UserList>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn recent_users(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<UserList>>> {
    ensure_staff(&user)?;
    let items = user_service::recent_users(&state, None).await?;
    Ok(Json(ApiResponse::success("Users", UserList { items }, None)))
}

#[utoipa::path(
    get,
    path = "/api/admin/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User", body = ApiResponse<User>),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn get_user(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<User>>> {
    ensure_staff(&user)?;
    let found = user_service::get_user(&state, id).await?;
    Ok(Json(ApiResponse::success("User", found, None)))
}

#[utoipa::path(
    get,
    path = "/api/admin/users/{id}/orders",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Orders placed by the user", body = ApiResponse<OrderList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn user_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    ensure_staff(&user)?;
    let items = order_service::orders_by_user(&state, id).await?;
    Ok(Json(ApiResponse::success("OK", OrderList { items }, None)))
}

#[utoipa::path(
    delete,
    path = "/api/admin/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deactivated", body = ApiResponse<User>),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn deactivate_user(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<User>>> {
    ensure_staff(&user)?;
    let updated = user_service::delete_user(&state, id).await?;
    audit::record(
        &state,
        Some(user.user_id),
        "user_deactivate",
        "users",
        serde_json::json!({ "user_id": id }),
    )
    .await;
    Ok(Json(ApiResponse::success("User deactivated", updated, None)))
}

#[utoipa::path(
    post,
    path = "/api/admin/users/{id}/activate",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User activated", body = ApiResponse<User>),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn activate_user(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<User>>> {
    ensure_staff(&user)?;
    let updated = user_service::set_active(&state, id, true).await?;
    Ok(Json(ApiResponse::success("User activated", updated, None)))
}

#[utoipa::path(
    post,
    path = "/api/admin/users/{id}/verify-email",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Email marked verified", body = ApiResponse<User>),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn verify_email(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<User>>> {
    ensure_staff(&user)?;
    let updated = user_service::verify_email(&state, id).await?;
    Ok(Json(ApiResponse::success("Email verified", updated, None)))
}

#[utoipa::path(
    patch,
    path = "/api/admin/users/{id}/role",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Role changed (admin only)", body = ApiResponse<User>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_role(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRoleRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    ensure_admin(&user)?;
    let updated = user_service::update_role(&state, id, payload.role).await?;
    audit::record(
        &state,
        Some(user.user_id),
        "user_role_update",
        "users",
        serde_json::json!({ "user_id": id, "role": payload.role }),
    )
    .await;
    Ok(Json(ApiResponse::success("Role updated", updated, None)))
}
