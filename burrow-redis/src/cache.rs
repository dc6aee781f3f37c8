//! Typed key/value cache over a [`RedisService`].

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

use crate::{RedisError, RedisService, Result};

/// JSON values stored under plain keys, each written with the cache's
/// default lifetime.
///
/// ```rust,no_run
/// use burrow_redis::{RedisCache, RedisConfig, RedisService};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// fn main() -> burrow_redis::Result<()> {
///     let redis = Arc::new(RedisService::connect(RedisConfig::default())?);
///     let cache = RedisCache::new(redis, Some(Duration::from_secs(300)));
///
///     cache.set("rates:usd", &[1.0, 0.92, 0.79])?;
///     let rates: Option<Vec<f64>> = cache.get("rates:usd")?;
///     assert!(cache.contains("rates:usd")?);
///     cache.delete("rates:usd")?;
///     # let _ = rates;
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RedisCache {
    service: Arc<RedisService>,
    default_ttl: Option<Duration>,
}

impl RedisCache {
    /// `default_ttl` of `None` stores keys without expiry.
    pub fn new(service: Arc<RedisService>, default_ttl: Option<Duration>) -> Self {
        Self {
            service,
            default_ttl,
        }
    }

    pub fn default_ttl(&self) -> Option<Duration> {
        self.default_ttl
    }

    pub fn service(&self) -> &RedisService {
        &self.service
    }

    /// The stored value, or `None` when the key does not exist.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.service.get_bytes(key)? {
            Some(bytes) => decode(&bytes).map(Some),
            None => Ok(None),
        }
    }

    /// Store `value` with the default lifetime.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        self.set_with_ttl(key, value, self.default_ttl)
    }

    pub fn set_with_ttl<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> Result<()> {
        let bytes = encode(value)?;
        self.service.set_ex_bytes(key, &bytes, ttl)
    }

    /// Returns true when a key was removed.
    pub fn delete(&self, key: &str) -> Result<bool> {
        self.service.delete(key)
    }

    pub fn contains(&self, key: &str) -> Result<bool> {
        self.service.exists(key)
    }
}

fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| RedisError::Serialization(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| RedisError::Serialization(e.to_string()))
}
