//! Table-oriented data access through a small SQL dialect.
//!
//! Services talk to [`Database`] with statements such as
//! `SELECT * FROM orders WHERE user_id = ? ORDER BY created_at DESC`.
//! The same statements run against local storage or against Postgres.

mod backend;
mod cache;
pub mod parse;

use std::{
    fmt,
    str::FromStr,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::{Duration, Instant},
};

use chrono::{SecondsFormat, Utc};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Value, json};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

pub use backend::TableBackend;
use cache::QueryCache;
use parse::{Statement, compare_values};

use crate::storage::StorageError;

pub type Row = serde_json::Map<String, Value>;

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);
const SLOW_QUERY: Duration = Duration::from_secs(1);
const RETRY_BACKOFF: Duration = Duration::from_millis(100);

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("no table in statement: {0}")]
    MissingTable(String),

    #[error("unknown table: {0}")]
    UnknownTable(String),

    #[error("unsupported clause: {0}")]
    UnsupportedClause(String),

    #[error("missing parameter {0}")]
    MissingParameter(usize),

    #[error("invalid record: {0}")]
    InvalidRecord(String),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("remote table error: {0}")]
    Orm(#[from] sea_orm::DbErr),

    #[error("row decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("table lock poisoned")]
    Poisoned,
}

impl QueryError {
    /// Backend failures may succeed on a second attempt; malformed statements never do.
    fn is_transient(&self) -> bool {
        matches!(
            self,
            QueryError::Storage(_) | QueryError::Orm(_) | QueryError::Poisoned
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Products,
    Orders,
    Users,
    Categories,
    Reviews,
    Settings,
    Wishlist,
    Coupons,
}

impl Table {
    pub const ALL: [Table; 8] = [
        Table::Products,
        Table::Orders,
        Table::Users,
        Table::Categories,
        Table::Reviews,
        Table::Settings,
        Table::Wishlist,
        Table::Coupons,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Products => "products",
            Table::Orders => "orders",
            Table::Users => "users",
            Table::Categories => "categories",
            Table::Reviews => "reviews",
            Table::Settings => "settings",
            Table::Wishlist => "wishlist",
            Table::Coupons => "coupons",
        }
    }

    pub fn storage_key(&self) -> String {
        format!("db_{}", self.as_str())
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Table {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Table::ALL
            .into_iter()
            .find(|table| table.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| QueryError::UnknownTable(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct QueryOptions {
    pub cache: bool,
    pub cache_ttl: Option<Duration>,
    pub retries: u32,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            cache: true,
            cache_ttl: None,
            retries: 0,
        }
    }
}

impl QueryOptions {
    pub fn uncached() -> Self {
        Self {
            cache: false,
            ..Self::default()
        }
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }
}

#[derive(Debug, Clone)]
pub struct QueryResult {
    pub rows: Vec<Row>,
    pub row_count: usize,
    pub duration_ms: u64,
    pub from_cache: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DatabaseStats {
    pub backend: String,
    pub queries: u64,
    pub cache_hits: u64,
    pub cache_entries: usize,
    pub slow_queries: u64,
    pub failures: u64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HealthReport {
    /// `healthy` or `unhealthy`.
    pub status: String,
    pub details: Value,
}

#[derive(Default)]
struct Counters {
    queries: AtomicU64,
    cache_hits: AtomicU64,
    slow_queries: AtomicU64,
    failures: AtomicU64,
}

struct Inner {
    backend: TableBackend,
    cache: QueryCache,
    cache_ttl: Duration,
    counters: Counters,
}

/// Cheap to clone; clones share backend, cache and counters.
#[derive(Clone)]
pub struct Database {
    inner: Arc<Inner>,
}

pub(crate) fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl Database {
    pub fn new(backend: TableBackend, cache_ttl: Duration) -> Self {
        tracing::info!(backend = backend.name(), ttl_secs = cache_ttl.as_secs(), "database ready");
        Self {
            inner: Arc::new(Inner {
                backend,
                cache: QueryCache::default(),
                cache_ttl,
                counters: Counters::default(),
            }),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.inner.backend.name()
    }

    pub async fn query(
        &self,
        sql: &str,
        params: &[Value],
        options: QueryOptions,
    ) -> Result<QueryResult, QueryError> {
        let started = Instant::now();
        let counters = &self.inner.counters;
        counters.queries.fetch_add(1, Ordering::Relaxed);

        let statement = Statement::parse(sql).inspect_err(|_| {
            counters.failures.fetch_add(1, Ordering::Relaxed);
        })?;
        let cacheable = options.cache && matches!(statement, Statement::Select { .. });
        let cache_key = format!("{sql}|{}", Value::Array(params.to_vec()));

        if cacheable {
            if let Some(rows) = self.inner.cache.get(&cache_key) {
                counters.cache_hits.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(sql, "query cache hit");
                return Ok(QueryResult {
                    row_count: rows.len(),
                    rows,
                    duration_ms: started.elapsed().as_millis() as u64,
                    from_cache: true,
                });
            }
        }

        let generation = statement
            .table()
            .filter(|_| cacheable)
            .and_then(|table| self.inner.cache.generation(table));

        let mut attempt = 0;
        let rows = loop {
            match self.execute(&statement, params).await {
                Ok(rows) => break rows,
                Err(err) if err.is_transient() && attempt < options.retries => {
                    attempt += 1;
                    tracing::warn!(sql, attempt, error = %err, "query failed, retrying");
                    tokio::time::sleep(RETRY_BACKOFF * attempt).await;
                }
                Err(err) => {
                    counters.failures.fetch_add(1, Ordering::Relaxed);
                    tracing::error!(sql, error = %err, "query failed");
                    return Err(err);
                }
            }
        };

        if let Some(table) = statement.table() {
            if let Some(generation) = generation {
                let ttl = options.cache_ttl.unwrap_or(self.inner.cache_ttl);
                let stored = self
                    .inner
                    .cache
                    .insert(cache_key, table, generation, rows.clone(), ttl);
                if !stored {
                    tracing::debug!(table = %table, "table written during read, result not cached");
                }
            } else if !statement.is_read() {
                let evicted = self.inner.cache.evict_table(table);
                if evicted > 0 {
                    tracing::debug!(table = %table, evicted, "query cache evicted");
                }
            }
        }

        let elapsed = started.elapsed();
        if elapsed > SLOW_QUERY {
            counters.slow_queries.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(sql, ms = elapsed.as_millis() as u64, "slow query");
        } else {
            tracing::debug!(sql, ms = elapsed.as_millis() as u64, rows = rows.len(), "query executed");
        }

        Ok(QueryResult {
            row_count: rows.len(),
            rows,
            duration_ms: elapsed.as_millis() as u64,
            from_cache: false,
        })
    }

    async fn execute(&self, statement: &Statement, params: &[Value]) -> Result<Vec<Row>, QueryError> {
        let backend = &self.inner.backend;
        match statement {
            Statement::Ping => {
                backend.ping().await?;
                let mut row = Row::new();
                row.insert("ok".into(), json!(1));
                Ok(vec![row])
            }
            Statement::Select {
                table,
                filter,
                order,
                limit,
            } => {
                let filter = filter.as_ref().map(|f| f.bind(params)).transpose()?;
                let mut rows: Vec<Row> = backend
                    .rows(*table)
                    .await?
                    .into_iter()
                    .filter(|row| filter.as_ref().is_none_or(|f| f.matches(row)))
                    .collect();
                if let Some(order) = order {
                    rows.sort_by(|a, b| {
                        let ordering = compare_values(a.get(&order.column), b.get(&order.column));
                        if order.descending { ordering.reverse() } else { ordering }
                    });
                }
                if let Some(limit) = limit {
                    rows.truncate(*limit);
                }
                Ok(rows)
            }
            Statement::Insert { table } => {
                let mut row = object_param(params, 0)?;
                let now = timestamp();
                if !matches!(row.get("id"), Some(Value::String(_) | Value::Number(_))) {
                    row.insert("id".into(), Value::String(Uuid::new_v4().to_string()));
                }
                if row.get("created_at").is_none_or(Value::is_null) {
                    row.insert("created_at".into(), Value::String(now.clone()));
                }
                row.insert("updated_at".into(), Value::String(now));
                Ok(vec![backend.insert(*table, row).await?])
            }
            Statement::Update { table, filter } => {
                let Some(filter) = filter else {
                    tracing::warn!(table = %table, "UPDATE without WHERE ignored");
                    return Ok(Vec::new());
                };
                let patch = object_param(params, 0)?;
                backend.update(*table, &filter.bind(params)?, &patch).await
            }
            Statement::Delete { table, filter } => {
                let Some(filter) = filter else {
                    tracing::warn!(table = %table, "DELETE without WHERE ignored");
                    return Ok(Vec::new());
                };
                backend.delete(*table, &filter.bind(params)?).await
            }
        }
    }

    /// Runs a SELECT and decodes every row.
    pub async fn fetch_all<T: DeserializeOwned>(
        &self,
        sql: &str,
        params: &[Value],
    ) -> Result<Vec<T>, QueryError> {
        self.query(sql, params, QueryOptions::default())
            .await?
            .rows
            .into_iter()
            .map(|row| serde_json::from_value(Value::Object(row)).map_err(QueryError::from))
            .collect()
    }

    pub async fn fetch_optional<T: DeserializeOwned>(
        &self,
        sql: &str,
        params: &[Value],
    ) -> Result<Option<T>, QueryError> {
        Ok(self.fetch_all(sql, params).await?.into_iter().next())
    }

    pub async fn insert<T: Serialize + DeserializeOwned>(
        &self,
        table: Table,
        record: &T,
    ) -> Result<T, QueryError> {
        let sql = format!("INSERT INTO {table}");
        let result = self
            .query(&sql, &[serde_json::to_value(record)?], QueryOptions::uncached())
            .await?;
        first_row(result)
    }

    /// Applies a partial update to the row with `id`.
    pub async fn update<T: DeserializeOwned>(
        &self,
        table: Table,
        id: &str,
        patch: &impl Serialize,
    ) -> Result<Option<T>, QueryError> {
        let sql = format!("UPDATE {table} SET ? WHERE id = ?");
        let result = self
            .query(&sql, &[serde_json::to_value(patch)?, json!(id)], QueryOptions::uncached())
            .await?;
        if result.rows.is_empty() {
            return Ok(None);
        }
        first_row(result).map(Some)
    }

    pub async fn delete(&self, table: Table, id: &str) -> Result<usize, QueryError> {
        let sql = format!("DELETE FROM {table} WHERE id = ?");
        Ok(self
            .query(&sql, &[json!(id)], QueryOptions::uncached())
            .await?
            .row_count)
    }

    pub async fn health_check(&self) -> HealthReport {
        let started = Instant::now();
        match self.query("SELECT 1", &[], QueryOptions::uncached()).await {
            Ok(_) => HealthReport {
                status: "healthy".into(),
                details: json!({
                    "backend": self.backend_name(),
                    "latency_ms": started.elapsed().as_millis() as u64,
                    "cache_entries": self.inner.cache.len(),
                }),
            },
            Err(err) => HealthReport {
                status: "unhealthy".into(),
                details: json!({
                    "backend": self.backend_name(),
                    "error": err.to_string(),
                }),
            },
        }
    }

    pub async fn table_stats(&self, table: Table) -> Result<usize, QueryError> {
        let sql = format!("SELECT * FROM {table}");
        Ok(self
            .query(&sql, &[], QueryOptions::uncached())
            .await?
            .row_count)
    }

    pub fn clear_cache(&self) {
        self.inner.cache.clear();
        tracing::info!("query cache cleared");
    }

    pub fn stats(&self) -> DatabaseStats {
        let counters = &self.inner.counters;
        DatabaseStats {
            backend: self.backend_name().to_string(),
            queries: counters.queries.load(Ordering::Relaxed),
            cache_hits: counters.cache_hits.load(Ordering::Relaxed),
            cache_entries: self.inner.cache.len(),
            slow_queries: counters.slow_queries.load(Ordering::Relaxed),
            failures: counters.failures.load(Ordering::Relaxed),
        }
    }
}

fn object_param(params: &[Value], index: usize) -> Result<Row, QueryError> {
    match params.get(index) {
        Some(Value::Object(row)) => Ok(row.clone()),
        Some(_) => Err(QueryError::InvalidRecord(format!(
            "parameter {index} must be an object"
        ))),
        None => Err(QueryError::MissingParameter(index)),
    }
}

fn first_row<T: DeserializeOwned>(result: QueryResult) -> Result<T, QueryError> {
    let row = result
        .rows
        .into_iter()
        .next()
        .ok_or_else(|| QueryError::InvalidRecord("statement returned no row".into()))?;
    Ok(serde_json::from_value(Value::Object(row))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{Cipher, LocalStorage, MemoryBackend};

    fn database() -> Database {
        let storage = LocalStorage::new(MemoryBackend::new(), Cipher::new("test"));
        Database::new(TableBackend::local(storage), DEFAULT_CACHE_TTL)
    }

    async fn seed(db: &Database) {
        for (name, price, status) in [("Tee", 900, "active"), ("Cap", 500, "active"), ("Bag", 2500, "inactive")] {
            db.query(
                "INSERT INTO products",
                &[json!({ "name": name, "price": price, "status": status })],
                QueryOptions::default(),
            )
            .await
            .unwrap();
        }
    }

    #[tokio::test]
    async fn insert_assigns_identity_and_timestamps() {
        let db = database();
        let result = db
            .query("INSERT INTO products", &[json!({ "name": "Tee" })], QueryOptions::default())
            .await
            .unwrap();
        let row = &result.rows[0];
        assert!(row["id"].as_str().is_some_and(|id| !id.is_empty()));
        assert!(row.contains_key("created_at"));
        assert!(row.contains_key("updated_at"));
    }

    #[tokio::test]
    async fn select_filters_orders_and_limits() {
        let db = database();
        seed(&db).await;

        let result = db
            .query(
                "SELECT * FROM products WHERE status = 'active' ORDER BY price DESC LIMIT 1",
                &[],
                QueryOptions::default(),
            )
            .await
            .unwrap();
        assert_eq!(result.row_count, 1);
        assert_eq!(result.rows[0]["name"], "Tee");
    }

    #[tokio::test]
    async fn cached_select_is_evicted_by_a_write() {
        let db = database();
        seed(&db).await;
        let sql = "SELECT * FROM products WHERE status = ?";

        let first = db.query(sql, &[json!("active")], QueryOptions::default()).await.unwrap();
        assert!(!first.from_cache);
        let second = db.query(sql, &[json!("active")], QueryOptions::default()).await.unwrap();
        assert!(second.from_cache);

        let id = first.rows[0]["id"].as_str().unwrap().to_string();
        db.query(
            "UPDATE products SET ? WHERE id = ?",
            &[json!({ "status": "inactive" }), json!(id)],
            QueryOptions::default(),
        )
        .await
        .unwrap();

        let third = db.query(sql, &[json!("active")], QueryOptions::default()).await.unwrap();
        assert!(!third.from_cache);
        assert_eq!(third.row_count, 1);
        assert_eq!(db.stats().cache_hits, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_reads_never_cache_rows_older_than_a_finished_write() {
        let db = database();
        seed(&db).await;
        let sql = "SELECT * FROM products WHERE name = ?";
        let params = [json!("Tee")];
        let id = db.query(sql, &params, QueryOptions::uncached()).await.unwrap().rows[0]["id"]
            .as_str()
            .unwrap()
            .to_string();

        for price in 1..=200 {
            db.clear_cache();
            let reader = {
                let db = db.clone();
                tokio::spawn(async move {
                    db.query(sql, &[json!("Tee")], QueryOptions::default()).await.unwrap();
                })
            };
            let writer = {
                let db = db.clone();
                let id = id.clone();
                tokio::spawn(async move {
                    db.query(
                        "UPDATE products SET ? WHERE id = ?",
                        &[json!({ "price": price }), json!(id)],
                        QueryOptions::default(),
                    )
                    .await
                    .unwrap();
                })
            };
            reader.await.unwrap();
            writer.await.unwrap();

            let after = db.query(sql, &params, QueryOptions::default()).await.unwrap();
            assert_eq!(after.rows[0]["price"], json!(price), "round {price}");
        }
    }

    #[tokio::test]
    async fn update_and_delete_need_a_where_clause() {
        let db = database();
        seed(&db).await;

        let updated = db
            .query("UPDATE products SET ?", &[json!({ "price": 1 })], QueryOptions::default())
            .await
            .unwrap();
        assert_eq!(updated.row_count, 0);

        let deleted = db
            .query("DELETE FROM products WHERE status = ?", &[json!("inactive")], QueryOptions::default())
            .await
            .unwrap();
        assert_eq!(deleted.row_count, 1);
        assert_eq!(db.table_stats(Table::Products).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn unknown_tables_are_rejected() {
        let db = database();
        let err = db
            .query("SELECT * FROM invoices", &[], QueryOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::UnknownTable(_)));
        assert_eq!(db.stats().failures, 1);
        assert_eq!(db.health_check().await.status, "healthy");
    }
}
