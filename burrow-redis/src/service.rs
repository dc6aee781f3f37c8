//! Shared Redis handle.

use parking_lot::Mutex;
use redis::{Commands, Connection};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::{RedisConfig, RedisError, Result};

/// A connected Redis client shared by every session in the process.
///
/// Commands are blocking and run over a single connection guarded by a
/// mutex. A dropped connection is discarded and re-established on the next
/// command.
pub struct RedisService {
    config: RedisConfig,
    client: redis::Client,
    conn: Mutex<Option<Connection>>,
}

impl RedisService {
    /// Connect and verify the server answers `PING`.
    pub fn connect(config: RedisConfig) -> Result<Self> {
        config.validate()?;

        let client = redis::Client::open(config.connection_url()?)
            .map_err(|e| RedisError::Connection(e.to_string()))?;

        let service = Self {
            config,
            client,
            conn: Mutex::new(None),
        };
        service.health_check()?;

        info!(url = %service.config.url, "Redis connection established");

        Ok(service)
    }

    /// A service that has not contacted the server yet.
    #[cfg(test)]
    pub(crate) fn unconnected(config: RedisConfig) -> Result<Self> {
        let client = redis::Client::open(config.connection_url()?)
            .map_err(|e| RedisError::Connection(e.to_string()))?;
        Ok(Self {
            config,
            client,
            conn: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &RedisConfig {
        &self.config
    }

    pub fn health_check(&self) -> Result<()> {
        let reply: String = self.with_connection(|conn| redis::cmd("PING").query(conn))?;
        if reply != "PONG" {
            return Err(RedisError::Command(format!("unexpected PING reply: {}", reply)));
        }
        Ok(())
    }

    pub fn exists(&self, key: &str) -> Result<bool> {
        self.with_connection(|conn| conn.exists(key))
    }

    pub fn get_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.with_connection(|conn| conn.get(key))
    }

    /// `SET` without expiry. Any existing TTL on the key is discarded by
    /// the server.
    pub fn set_bytes(&self, key: &str, value: &[u8]) -> Result<()> {
        self.with_connection(|conn| conn.set(key, value))
    }

    /// `SET key value EX seconds` in one command, or a plain `SET` when
    /// `ttl` is `None`. Sub-second lifetimes are rounded up to one second.
    pub fn set_ex_bytes(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<()> {
        match expiry_seconds(ttl) {
            Some(seconds) => self.with_connection(|conn| conn.set_ex(key, value, seconds)),
            None => self.set_bytes(key, value),
        }
    }

    /// `EXPIRE key seconds`. Returns false when the key does not exist.
    pub fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        let seconds = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        self.with_connection(|conn| conn.expire(key, seconds))
    }

    /// Remaining lifetime of `key`. `None` when the key is missing or has
    /// no expiry.
    pub fn ttl(&self, key: &str) -> Result<Option<Duration>> {
        let seconds: i64 = self.with_connection(|conn| conn.ttl(key))?;
        Ok(u64::try_from(seconds).ok().map(Duration::from_secs))
    }

    /// `DEL key`. Returns true when a key was removed.
    pub fn delete(&self, key: &str) -> Result<bool> {
        let removed: usize = self.with_connection(|conn| conn.del(key))?;
        Ok(removed > 0)
    }

    fn open(&self) -> Result<Connection> {
        let conn = self
            .client
            .get_connection_with_timeout(self.config.connection_timeout)
            .map_err(|e| RedisError::Connection(e.to_string()))?;

        conn.set_read_timeout(Some(self.config.command_timeout))?;
        conn.set_write_timeout(Some(self.config.command_timeout))?;

        let mut conn = conn;
        if let Some(name) = &self.config.connection_name {
            redis::cmd("CLIENT")
                .arg("SETNAME")
                .arg(name)
                .query::<()>(&mut conn)?;
        }

        debug!(url = %self.config.url, "opened Redis connection");
        Ok(conn)
    }

    fn with_connection<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> redis::RedisResult<T>,
    {
        let mut slot = self.conn.lock();
        if slot.is_none() {
            *slot = Some(self.open()?);
        }

        let Some(conn) = slot.as_mut() else {
            return Err(RedisError::Connection("no connection available".to_string()));
        };

        match op(conn) {
            Ok(value) => Ok(value),
            Err(err) => {
                if err.is_connection_dropped() || err.is_io_error() {
                    warn!(error = %err, "Redis connection lost, will reconnect");
                    *slot = None;
                }
                Err(err.into())
            }
        }
    }
}

/// Whole seconds for `EX`. Redis rejects `EX 0`, so anything shorter than
/// a second becomes one.
pub(crate) fn expiry_seconds(ttl: Option<Duration>) -> Option<u64> {
    ttl.map(|ttl| ttl.as_secs().max(1))
}

impl std::fmt::Debug for RedisService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisService")
            .field("url", &self.config.url)
            .finish_non_exhaustive()
    }
}
