use std::sync::Arc;

use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Value, json};
use utoipa::ToSchema;

use super::{
    Cipher, Envelope, KEY_PREFIX, StorageBackend, StorageConfig, StorageError, now_millis,
};

const BACKUP_VERSION: &str = "1.0";

#[derive(Debug, Clone, serde::Serialize, ToSchema)]
pub struct StorageItemStat {
    pub key: String,
    pub size: usize,
    pub has_expiry: bool,
    pub is_expired: bool,
}

#[derive(Debug, Clone, serde::Serialize, ToSchema)]
pub struct StorageStats {
    pub total_items: usize,
    pub used_space: usize,
    pub used_space_formatted: String,
    pub items: Vec<StorageItemStat>,
}

/// Envelope-aware façade over a [`StorageBackend`].
///
/// Cheap to clone; clones share the backend.
#[derive(Clone)]
pub struct LocalStorage {
    backend: Arc<dyn StorageBackend>,
    cipher: Cipher,
    prefix: Arc<str>,
}

impl LocalStorage {
    pub fn new(backend: impl StorageBackend + 'static, cipher: Cipher) -> Self {
        Self {
            backend: Arc::new(backend),
            cipher,
            prefix: Arc::from(KEY_PREFIX),
        }
    }

    fn storage_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    pub fn set_item<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        self.set_item_with(key, value, StorageConfig::for_key(key))
    }

    pub fn set_item_with<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        config: StorageConfig,
    ) -> Result<(), StorageError> {
        let value = serde_json::to_value(value)?;
        let mut envelope = Envelope::new(value, now_millis(), config.expiry);
        if config.encrypt {
            let plaintext = serde_json::to_vec(&envelope.value)?;
            envelope.value = Value::String(self.cipher.seal(&plaintext)?);
            envelope.encrypted = true;
        }
        self.backend
            .set(&self.storage_key(key), serde_json::to_string(&envelope)?)
    }

    /// Reads a value, dropping it when expired.
    ///
    /// Corrupt, undecryptable or mistyped records read as absent.
    pub fn get_item<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        let storage_key = self.storage_key(key);
        let Some(raw) = self.backend.get(&storage_key)? else {
            return Ok(None);
        };

        let envelope: Envelope = match serde_json::from_str(&raw) {
            Ok(envelope) => envelope,
            Err(err) => {
                tracing::warn!(key, error = %err, "unreadable storage record");
                return Ok(None);
            }
        };

        if envelope.is_expired(now_millis()) {
            tracing::debug!(key, "storage record expired");
            self.backend.remove(&storage_key)?;
            return Ok(None);
        }

        let value = if envelope.encrypted {
            match self.open_sealed(&envelope.value) {
                Ok(value) => value,
                Err(err) => {
                    tracing::warn!(key, error = %err, "could not open sealed storage record");
                    return Ok(None);
                }
            }
        } else {
            envelope.value
        };

        match serde_json::from_value(value) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                tracing::warn!(key, error = %err, "storage record has unexpected shape");
                Ok(None)
            }
        }
    }

    fn open_sealed(&self, value: &Value) -> Result<Value, StorageError> {
        let sealed = value.as_str().ok_or(StorageError::Decrypt)?;
        let plaintext = self.cipher.open(sealed)?;
        Ok(serde_json::from_slice(&plaintext)?)
    }

    pub fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.backend.remove(&self.storage_key(key))
    }

    pub fn has_item(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.backend.get(&self.storage_key(key))?.is_some())
    }

    /// Removes every application key, leaving foreign keys in place.
    pub fn clear(&self) -> Result<(), StorageError> {
        for key in self.app_keys()? {
            self.backend.remove(&key)?;
        }
        Ok(())
    }

    fn app_keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self
            .backend
            .keys()?
            .into_iter()
            .filter(|key| key.starts_with(&*self.prefix))
            .collect())
    }

    pub fn used_space(&self) -> Result<usize, StorageError> {
        let mut total = 0;
        for key in self.app_keys()? {
            if let Some(value) = self.backend.get(&key)? {
                total += key.len() + value.len();
            }
        }
        Ok(total)
    }

    pub fn stats(&self) -> Result<StorageStats, StorageError> {
        let now = now_millis();
        let keys = self.app_keys()?;
        let mut items = Vec::with_capacity(keys.len());
        let mut used_space = 0;

        for key in &keys {
            let Some(value) = self.backend.get(key)? else {
                continue;
            };
            let size = key.len() + value.len();
            used_space += size;

            let (has_expiry, is_expired) = match serde_json::from_str::<Envelope>(&value) {
                Ok(envelope) => (envelope.expiry.is_some(), envelope.is_expired(now)),
                Err(_) => (false, false),
            };
            items.push(StorageItemStat {
                key: key.trim_start_matches(&*self.prefix).to_string(),
                size,
                has_expiry,
                is_expired,
            });
        }

        Ok(StorageStats {
            total_items: items.len(),
            used_space,
            used_space_formatted: format_bytes(used_space),
            items,
        })
    }

    /// Drops expired and unparseable records; returns how many were removed.
    pub fn cleanup_expired(&self) -> Result<usize, StorageError> {
        let now = now_millis();
        let mut cleaned = 0;
        for key in self.app_keys()? {
            let Some(value) = self.backend.get(&key)? else {
                continue;
            };
            let drop = match serde_json::from_str::<Envelope>(&value) {
                Ok(envelope) => envelope.is_expired(now),
                Err(_) => true,
            };
            if drop {
                self.backend.remove(&key)?;
                cleaned += 1;
            }
        }
        if cleaned > 0 {
            tracing::info!(cleaned, "removed expired storage records");
        }
        Ok(cleaned)
    }

    /// Raw snapshot of every application key.
    pub fn backup(&self) -> Result<Value, StorageError> {
        let mut data = serde_json::Map::new();
        for key in self.app_keys()? {
            if let Some(value) = self.backend.get(&key)? {
                data.insert(key, Value::String(value));
            }
        }
        Ok(json!({
            "timestamp": now_millis(),
            "version": BACKUP_VERSION,
            "data": data,
        }))
    }

    /// Replaces all application keys with the entries of a backup.
    pub fn restore(&self, backup: &Value) -> Result<usize, StorageError> {
        let data = backup
            .get("data")
            .and_then(Value::as_object)
            .ok_or_else(|| StorageError::InvalidBackup("missing data object".into()))?;

        self.clear()?;

        let mut restored = 0;
        for (key, value) in data {
            if let Value::String(raw) = value {
                self.backend.set(key, raw.clone())?;
                restored += 1;
            }
        }
        tracing::info!(restored, "storage restored from backup");
        Ok(restored)
    }

    /// Moves records written before the envelope format into it.
    pub fn migrate_legacy(&self) -> Result<usize, StorageError> {
        let mut migrated = 0;

        if let Some(raw) = self.backend.get("user")? {
            if !self.has_item("user")? {
                match serde_json::from_str::<Value>(&raw) {
                    Ok(user) => {
                        self.set_item("user", &user)?;
                        self.backend.remove("user")?;
                        migrated += 1;
                    }
                    Err(err) => tracing::warn!(error = %err, "legacy user record is not json"),
                }
            }
        }

        if let Some(token) = self.backend.get("csrf-token")? {
            if !self.has_item("csrf_token")? {
                self.set_item("csrf_token", &token)?;
                self.backend.remove("csrf-token")?;
                migrated += 1;
            }
        }

        if migrated > 0 {
            tracing::info!(migrated, "migrated legacy storage records");
        }
        Ok(migrated)
    }
}

pub(crate) fn format_bytes(bytes: usize) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = format!("{value:.2}");
    let rounded = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{rounded} {}", UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryBackend;

    fn storage() -> LocalStorage {
        LocalStorage::new(MemoryBackend::new(), Cipher::new("test-secret"))
    }

    #[test]
    fn formats_sizes_like_a_file_browser() {
        assert_eq!(format_bytes(0), "0 Bytes");
        assert_eq!(format_bytes(512), "512 Bytes");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(1024 * 1024), "1 MB");
    }

    #[test]
    fn sealed_keys_do_not_store_plaintext() {
        let storage = storage();
        storage
            .set_item("session", &json!({ "token": "abc123" }))
            .unwrap();
        let raw = storage.backend.get("yapee_session").unwrap().unwrap();
        assert!(!raw.contains("abc123"));
        assert!(raw.contains(r#""encrypted":true"#));

        let value: Value = storage.get_item("session").unwrap().unwrap();
        assert_eq!(value["token"], "abc123");
    }

    #[test]
    fn legacy_records_are_wrapped() {
        let storage = storage();
        storage
            .backend
            .set("user", r#"{"email":"old@example.com"}"#.into())
            .unwrap();
        storage.backend.set("csrf-token", "tok".into()).unwrap();

        assert_eq!(storage.migrate_legacy().unwrap(), 2);
        assert!(storage.backend.get("user").unwrap().is_none());
        let user: Value = storage.get_item("user").unwrap().unwrap();
        assert_eq!(user["email"], "old@example.com");
        let token: String = storage.get_item("csrf_token").unwrap().unwrap();
        assert_eq!(token, "tok");
    }

    /// Lists a key that is gone by the time it is read.
    struct VanishingKey(MemoryBackend);

    impl StorageBackend for VanishingKey {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.0.get(key)
        }
        fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
            self.0.set(key, value)
        }
        fn remove(&self, key: &str) -> Result<(), StorageError> {
            self.0.remove(key)
        }
        fn keys(&self) -> Result<Vec<String>, StorageError> {
            let mut keys = self.0.keys()?;
            keys.push("yapee_gone".into());
            Ok(keys)
        }
    }

    #[test]
    fn stats_count_only_records_that_were_read() {
        let storage = LocalStorage::new(VanishingKey(MemoryBackend::new()), Cipher::new("test"));
        storage.set_item("theme", &"dark").unwrap();

        let stats = storage.stats().unwrap();
        assert_eq!(stats.total_items, 1);
        assert_eq!(stats.items.len(), 1);
        assert_eq!(stats.items[0].key, "theme");
    }
}
