use chrono::{DateTime, Utc};
use sea_orm::{EntityTrait, QueryOrder, QuerySelect};
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    db::{DbPool, create_orm_conn},
    entity::{AuditLogs, audit_logs},
    error::AppResult,
    state::AppState,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct AuditEntry {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub action: String,
    pub resource: Option<String>,
    pub metadata: Option<Value>,
    pub created_at: DateTime<Utc>,
}

impl From<audit_logs::Model> for AuditEntry {
    fn from(model: audit_logs::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            action: model.action,
            resource: model.resource,
            metadata: model.metadata,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

pub async fn log_audit(
    pool: &DbPool,
    user_id: Option<Uuid>,
    action: &str,
    resource: Option<&str>,
    metadata: Option<Value>,
) -> AppResult<()> {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO audit_logs (id, user_id, action, resource, metadata)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(action)
    .bind(resource)
    .bind(metadata)
    .execute(pool)
    .await?;

    Ok(())
}

/// Writes an audit entry; without Postgres the entry goes to the `audit` log target.
/// Failures are logged and never reach the caller.
pub async fn record(
    state: &AppState,
    user_id: Option<Uuid>,
    action: &str,
    resource: &str,
    metadata: Value,
) {
    match &state.pool {
        Some(pool) => {
            if let Err(err) = log_audit(pool, user_id, action, Some(resource), Some(metadata)).await {
                tracing::warn!(error = %err, action, "audit log failed");
            }
        }
        None => {
            tracing::info!(target: "audit", user_id = ?user_id, action, resource, %metadata, "audit entry");
        }
    }
}

/// Newest entries first. Empty without Postgres, where entries only reach the log.
pub async fn recent_entries(state: &AppState, limit: u64) -> AppResult<Vec<AuditEntry>> {
    let Some(pool) = &state.pool else {
        return Ok(Vec::new());
    };
    let rows = AuditLogs::find()
        .order_by_desc(audit_logs::Column::CreatedAt)
        .limit(limit)
        .all(&create_orm_conn(pool))
        .await?;
    Ok(rows.into_iter().map(AuditEntry::from).collect())
}
