use std::collections::BTreeMap;

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};

use crate::{
    audit::{self, AuditEntry},
    dto::dashboard::DashboardOverview,
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin, ensure_staff},
    query::{DatabaseStats, HealthReport, Table},
    response::{ApiResponse, Meta},
    services::{dashboard_service, seed_service::{self, SeedReport}},
    state::AppState,
    storage::{StorageError, StorageStats},
};

const AUDIT_PAGE: u64 = 100;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/system/storage", get(storage_stats))
        .route("/system/storage/cleanup", post(cleanup_storage))
        .route("/system/storage/backup", get(backup_storage))
        .route("/system/storage/restore", post(restore_storage))
        .route("/system/database", get(database_stats))
        .route("/system/database/health", get(database_health))
        .route("/system/database/tables", get(table_counts))
        .route("/system/database/cache/clear", post(clear_query_cache))
        .route("/system/audit", get(audit_entries))
        .route("/system/seed", post(seed))
}

#[utoipa::path(
    get,
    path = "/api/admin/dashboard",
    responses(
        (status = 200, description = "Back-office overview", body = ApiResponse<DashboardOverview>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn dashboard(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<DashboardOverview>>> {
    ensure_staff(&user)?;
    let overview = dashboard_service::overview(&state).await?;
    Ok(Json(ApiResponse::success("Dashboard", overview, None)))
}

#[utoipa::path(
    get,
    path = "/api/admin/system/storage",
    responses(
        (status = 200, description = "Per-key sizes and expiry", body = ApiResponse<StorageStats>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "System"
)]
pub async fn storage_stats(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<StorageStats>>> {
    ensure_admin(&user)?;
    let stats = state.storage.stats()?;
    Ok(Json(ApiResponse::success("OK", stats, None)))
}

#[utoipa::path(
    post,
    path = "/api/admin/system/storage/cleanup",
    responses(
        (status = 200, description = "Expired and corrupt records removed", body = ApiResponse<serde_json::Value>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "System"
)]
pub async fn cleanup_storage(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    ensure_admin(&user)?;
    let removed = state.storage.cleanup_expired()?;
    Ok(Json(ApiResponse::success(
        "Storage cleaned",
        serde_json::json!({ "removed": removed }),
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    get,
    path = "/api/admin/system/storage/backup",
    responses(
        (status = 200, description = "Raw snapshot of every storage key", body = ApiResponse<serde_json::Value>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "System"
)]
pub async fn backup_storage(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    ensure_admin(&user)?;
    let backup = state.storage.backup()?;
    audit::record(&state, Some(user.user_id), "storage_backup", "storage", serde_json::json!({})).await;
    Ok(Json(ApiResponse::success("Backup", backup, None)))
}

#[utoipa::path(
    post,
    path = "/api/admin/system/storage/restore",
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Storage replaced by the backup", body = ApiResponse<serde_json::Value>),
        (status = 400, description = "Backup has no data object"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "System"
)]
pub async fn restore_storage(
    State(state): State<AppState>,
    user: AuthUser,
    Json(backup): Json<serde_json::Value>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    ensure_admin(&user)?;
    let restored = state.storage.restore(&backup).map_err(|err| match err {
        StorageError::InvalidBackup(msg) => AppError::BadRequest(msg),
        other => AppError::Storage(other),
    })?;
    state.db.clear_cache();
    audit::record(
        &state,
        Some(user.user_id),
        "storage_restore",
        "storage",
        serde_json::json!({ "restored": restored }),
    )
    .await;
    Ok(Json(ApiResponse::success(
        "Storage restored",
        serde_json::json!({ "restored": restored }),
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    get,
    path = "/api/admin/system/database",
    responses(
        (status = 200, description = "Query counters and cache size", body = ApiResponse<DatabaseStats>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "System"
)]
pub async fn database_stats(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<DatabaseStats>>> {
    ensure_admin(&user)?;
    Ok(Json(ApiResponse::success("OK", state.db.stats(), None)))
}

#[utoipa::path(
    get,
    path = "/api/admin/system/database/health",
    responses(
        (status = 200, description = "Backend reachability", body = ApiResponse<HealthReport>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "System"
)]
pub async fn database_health(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<HealthReport>>> {
    ensure_staff(&user)?;
    let report = state.db.health_check().await;
    Ok(Json(ApiResponse::success("OK", report, None)))
}

#[utoipa::path(
    get,
    path = "/api/admin/system/database/tables",
    responses(
        (status = 200, description = "Row count per table", body = ApiResponse<BTreeMap<String, usize>>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "System"
)]
pub async fn table_counts(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<BTreeMap<String, usize>>>> {
    ensure_admin(&user)?;
    let mut counts = BTreeMap::new();
    for table in Table::ALL {
        counts.insert(table.to_string(), state.db.table_stats(table).await?);
    }
    Ok(Json(ApiResponse::success("OK", counts, None)))
}

#[utoipa::path(
    post,
    path = "/api/admin/system/database/cache/clear",
    responses(
        (status = 200, description = "Query cache emptied", body = ApiResponse<serde_json::Value>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "System"
)]
pub async fn clear_query_cache(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    ensure_admin(&user)?;
    state.db.clear_cache();
    Ok(Json(ApiResponse::success(
        "Cache cleared",
        serde_json::json!({}),
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    get,
    path = "/api/admin/system/audit",
    responses(
        (status = 200, description = "Latest audit entries; empty without Postgres", body = ApiResponse<Vec<AuditEntry>>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "System"
)]
pub async fn audit_entries(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Vec<AuditEntry>>>> {
    ensure_admin(&user)?;
    let entries = audit::recent_entries(&state, AUDIT_PAGE).await?;
    Ok(Json(ApiResponse::success("OK", entries, None)))
}

#[utoipa::path(
    post,
    path = "/api/admin/system/seed",
    responses(
        (status = 200, description = "Starter data written into empty tables", body = ApiResponse<SeedReport>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "System"
)]
pub async fn seed(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<SeedReport>>> {
    ensure_admin(&user)?;
    let report = seed_service::seed_if_empty(&state).await?;
    Ok(Json(ApiResponse::success("Seeded", report, None)))
}
