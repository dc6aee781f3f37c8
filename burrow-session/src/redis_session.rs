//! Shared cache session storage.
//!
//! Sessions are stored under `<namespace>:<session_id>` (by default
//! `session:<session_id>`) as a JSON snapshot, and the key's TTL is
//! refreshed on every save. Use this backend when several application
//! instances must see the same session state.

use crate::config::SessionConfig;
use crate::error::SessionResult;
use crate::traits::{BackendFactory, SessionBackend, SessionData, decode_snapshot, encode_snapshot};
use burrow_log::debug;
use std::sync::Arc;
use std::time::Duration;

const LOG_TARGET: &str = "burrow::session::redis";

/// The cache operations the session backend needs.
///
/// Implemented for [`burrow_redis::RedisService`] with the `redis` feature;
/// any other key/value server with per-key expiry can be plugged in.
pub trait CacheClient: Send + Sync {
    fn exists(&self, key: &str) -> SessionResult<bool>;

    fn get(&self, key: &str) -> SessionResult<Option<Vec<u8>>>;

    /// Store `value` without an expiry.
    fn set(&self, key: &str, value: &[u8]) -> SessionResult<()>;

    fn expire(&self, key: &str, ttl: Duration) -> SessionResult<()>;

    fn delete(&self, key: &str) -> SessionResult<()>;
}

#[cfg(feature = "redis")]
impl CacheClient for burrow_redis::RedisService {
    fn exists(&self, key: &str) -> SessionResult<bool> {
        Ok(burrow_redis::RedisService::exists(self, key)?)
    }

    fn get(&self, key: &str) -> SessionResult<Option<Vec<u8>>> {
        Ok(self.get_bytes(key)?)
    }

    fn set(&self, key: &str, value: &[u8]) -> SessionResult<()> {
        Ok(self.set_bytes(key, value)?)
    }

    fn expire(&self, key: &str, ttl: Duration) -> SessionResult<()> {
        burrow_redis::RedisService::expire(self, key, ttl)?;
        Ok(())
    }

    fn delete(&self, key: &str) -> SessionResult<()> {
        burrow_redis::RedisService::delete(self, key)?;
        Ok(())
    }
}

/// Builds a [`RedisSessionStore`] per session over one shared client.
///
/// # Examples
///
/// ```no_run
/// use burrow_redis::{RedisConfig, RedisService};
/// use burrow_session::{RedisSessionManager, Session, SessionConfig, DEFAULT_EXPIRE};
/// use std::sync::Arc;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let redis = Arc::new(RedisService::connect(RedisConfig::from_env().build())?);
/// let sessions = RedisSessionManager::new(redis, &SessionConfig::redis());
///
/// let mut session = Session::new("4f1c2a", &sessions, DEFAULT_EXPIRE)?;
/// session.set("theme", "dark")?;
/// session.save()?;
/// # Ok(())
/// # }
/// ```
pub struct RedisSessionManager {
    client: Arc<dyn CacheClient>,
    config: SessionConfig,
}

impl RedisSessionManager {
    pub fn new(client: Arc<dyn CacheClient>, config: &SessionConfig) -> Self {
        Self {
            client,
            config: config.clone(),
        }
    }

    /// Cache key that stores `session_id`.
    pub fn session_key(&self, session_id: &str) -> String {
        self.config.session_key(session_id)
    }
}

impl BackendFactory for RedisSessionManager {
    fn create(&self, expire: Duration, session_id: &str) -> SessionResult<Box<dyn SessionBackend>> {
        Ok(Box::new(RedisSessionStore {
            client: Arc::clone(&self.client),
            key: self.session_key(session_id),
            expire: self.config.cap_expire(expire),
        }))
    }
}

/// Cache backend for one session.
pub struct RedisSessionStore {
    client: Arc<dyn CacheClient>,
    key: String,
    expire: Duration,
}

impl RedisSessionStore {
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl SessionBackend for RedisSessionStore {
    /// Merge the stored snapshot over `data`. Keys missing from the
    /// snapshot are kept.
    fn load(&self, data: &mut SessionData) -> SessionResult<()> {
        if !self.client.exists(&self.key)? {
            return Ok(());
        }

        // The key can expire between the two calls.
        if let Some(bytes) = self.client.get(&self.key)? {
            data.extend(decode_snapshot(&bytes)?);
            debug!(target: LOG_TARGET, "loaded {} keys from {}", data.len(), self.key);
        }
        Ok(())
    }

    /// Write the snapshot, then refresh the TTL. Empty sessions are not
    /// written. The two commands are not atomic: if the second fails the
    /// key keeps whatever expiry the server had for it.
    fn save(&self, data: &SessionData) -> SessionResult<()> {
        if data.is_empty() {
            return Ok(());
        }

        let bytes = encode_snapshot(data)?;
        self.client.set(&self.key, &bytes)?;
        self.client.expire(&self.key, self.expire)?;

        debug!(target: LOG_TARGET, "saved {} keys to {} for {}s", data.len(), self.key, self.expire.as_secs());
        Ok(())
    }

    fn clear(&self, data: &mut SessionData) -> SessionResult<()> {
        data.clear();
        if let Err(e) = self.client.delete(&self.key) {
            debug!(target: LOG_TARGET, "ignoring failed delete of {}: {}", self.key, e);
        }
        Ok(())
    }
}
