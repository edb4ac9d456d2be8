use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

const HOUR: Duration = Duration::from_secs(60 * 60);
const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Per-key persistence options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StorageConfig {
    pub encrypt: bool,
    pub expiry: Option<Duration>,
}

impl StorageConfig {
    /// Defaults for a key. `cart:abc` resolves to the defaults of `cart`.
    pub fn for_key(key: &str) -> Self {
        let base = key.split(':').next().unwrap_or(key);
        match base {
            "user" => Self::sealed(Some(DAY)),
            "cart" => Self::plain(Some(DAY * 7)),
            "csrf_token" => Self::sealed(Some(HOUR)),
            "session" => Self::sealed(Some(Duration::from_secs(30 * 60))),
            "orders" => Self::sealed(None),
            "recently_viewed" => Self::plain(Some(DAY * 30)),
            "search_history" => Self::plain(Some(DAY * 7)),
            _ => Self::plain(None),
        }
    }

    pub fn plain(expiry: Option<Duration>) -> Self {
        Self {
            encrypt: false,
            expiry,
        }
    }

    pub fn sealed(expiry: Option<Duration>) -> Self {
        Self {
            encrypt: true,
            expiry,
        }
    }

    pub fn with_expiry(mut self, expiry: Duration) -> Self {
        self.expiry = Some(expiry);
        self
    }

    pub fn without_expiry(mut self) -> Self {
        self.expiry = None;
        self
    }

    pub fn with_encryption(mut self, encrypt: bool) -> Self {
        self.encrypt = encrypt;
        self
    }
}

/// The JSON record written for every key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub value: Value,
    pub timestamp: i64,
    pub expiry: Option<i64>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub encrypted: bool,
}

impl Envelope {
    pub fn new(value: Value, now: i64, ttl: Option<Duration>) -> Self {
        Self {
            value,
            timestamp: now,
            expiry: ttl.map(|ttl| now.saturating_add(ttl.as_millis() as i64)),
            encrypted: false,
        }
    }

    pub fn is_expired(&self, now: i64) -> bool {
        self.expiry.is_some_and(|expiry| now > expiry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespaced_keys_share_base_defaults() {
        assert_eq!(StorageConfig::for_key("cart:abc"), StorageConfig::for_key("cart"));
        assert!(StorageConfig::for_key("session").encrypt);
        assert_eq!(StorageConfig::for_key("theme"), StorageConfig::plain(None));
    }

    #[test]
    fn expiry_is_strictly_after_deadline() {
        let env = Envelope::new(Value::Null, 1_000, Some(Duration::from_millis(10)));
        assert_eq!(env.expiry, Some(1_010));
        assert!(!env.is_expired(1_010));
        assert!(env.is_expired(1_011));
        assert!(!Envelope::new(Value::Null, 0, None).is_expired(i64::MAX));
    }
}
