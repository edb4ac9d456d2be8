use std::{
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use moka::{Expiry, sync::Cache};

use super::{Row, Table};

const MAX_ENTRIES: u64 = 10_000;

#[derive(Debug, Clone)]
struct CachedRows {
    table: Table,
    rows: Arc<Vec<Row>>,
    ttl: Duration,
}

/// Each entry lives for the TTL it was stored with.
struct PerEntryTtl;

impl Expiry<String, CachedRows> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedRows,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// SELECT results keyed by statement text and parameters.
///
/// Every eviction bumps the table's generation. A read only stores its rows
/// when the generation it started under is still current, so rows read
/// before a write can never outlive that write in the cache.
pub struct QueryCache {
    entries: Cache<String, CachedRows>,
    generations: Mutex<[u64; Table::ALL.len()]>,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self {
            entries: Cache::builder()
                .max_capacity(MAX_ENTRIES)
                .expire_after(PerEntryTtl)
                .build(),
            generations: Mutex::new([0; Table::ALL.len()]),
        }
    }
}

impl std::fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache")
            .field("entries", &self.entries.entry_count())
            .finish()
    }
}

impl QueryCache {
    pub fn get(&self, key: &str) -> Option<Vec<Row>> {
        self.entries
            .get(key)
            .map(|cached| cached.rows.as_ref().clone())
    }

    /// Snapshot to pass back to [`QueryCache::insert`] once the read finished.
    pub fn generation(&self, table: Table) -> Option<u64> {
        let generations = self.generations.lock().ok()?;
        Some(generations[table as usize])
    }

    /// Stores rows unless `table` was written since `generation` was taken.
    pub fn insert(
        &self,
        key: String,
        table: Table,
        generation: u64,
        rows: Vec<Row>,
        ttl: Duration,
    ) -> bool {
        let Ok(generations) = self.generations.lock() else {
            return false;
        };
        if generations[table as usize] != generation {
            return false;
        }
        self.entries.insert(
            key,
            CachedRows {
                table,
                rows: Arc::new(rows),
                ttl,
            },
        );
        true
    }

    /// Drops every cached result read from `table`.
    pub fn evict_table(&self, table: Table) -> usize {
        let mut generations = match self.generations.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        generations[table as usize] += 1;

        let mut evicted = 0;
        for (key, cached) in self.entries.iter() {
            if cached.table == table {
                self.entries.invalidate(key.as_str());
                evicted += 1;
            }
        }
        evicted
    }

    pub fn clear(&self) {
        self.entries.invalidate_all();
        self.entries.run_pending_tasks();
    }

    pub fn len(&self) -> usize {
        self.entries.run_pending_tasks();
        self.entries.entry_count() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(cache: &QueryCache, key: &str, table: Table, ttl: Duration) -> bool {
        let generation = cache.generation(table).unwrap();
        cache.insert(key.into(), table, generation, vec![], ttl)
    }

    #[test]
    fn eviction_is_scoped_to_one_table() {
        let cache = QueryCache::default();
        let ttl = Duration::from_secs(60);
        store(&cache, "a", Table::Products, ttl);
        store(&cache, "b", Table::Orders, ttl);

        assert_eq!(cache.evict_table(Table::Products), 1);
        assert!(cache.get("a").is_none());
        assert!(cache.get("b").is_some());
    }

    #[test]
    fn stale_entries_are_not_served() {
        let cache = QueryCache::default();
        store(&cache, "a", Table::Products, Duration::ZERO);
        assert!(cache.get("a").is_none());
    }

    #[test]
    fn rows_read_before_a_write_are_not_stored() {
        let cache = QueryCache::default();
        let before_write = cache.generation(Table::Products).unwrap();
        cache.evict_table(Table::Products);

        let ttl = Duration::from_secs(60);
        assert!(!cache.insert("a".into(), Table::Products, before_write, vec![], ttl));
        assert!(cache.get("a").is_none());

        let other = cache.generation(Table::Orders).unwrap();
        assert!(cache.insert("b".into(), Table::Orders, other, vec![], ttl));
    }
}
