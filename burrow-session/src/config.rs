//! Session configuration.

use crate::error::{SessionError, SessionResult};
use crate::file_session::FileSessionManager;
use crate::redis_session::{CacheClient, RedisSessionManager};
use crate::traits::{BackendFactory, DEFAULT_EXPIRE};
use burrow_log::debug;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Which store sessions are persisted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// One file per session under `<app_root>/tmp`
    File,
    /// Shared Redis cache
    Redis,
}

impl FromStr for BackendKind {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(BackendKind::File),
            "redis" => Ok(BackendKind::Redis),
            other => Err(SessionError::Config(format!(
                "unknown session backend {}, expected file or redis",
                other
            ))),
        }
    }
}

/// Session configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub backend: BackendKind,
    /// Application root; file sessions live in its `tmp` directory
    pub app_root: PathBuf,
    /// Cache key prefix
    pub namespace: String,
    /// Lifetime used when the caller does not pick one
    pub default_expire: Duration,
    /// Upper bound applied to every session's lifetime
    pub max_expire: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::File,
            app_root: PathBuf::from("."),
            namespace: "session".to_string(),
            default_expire: DEFAULT_EXPIRE,
            max_expire: Duration::from_secs(86400 * 7), // 7 days
        }
    }
}

impl SessionConfig {
    /// File sessions under `<app_root>/tmp`.
    ///
    /// ```
    /// use burrow_session::{BackendKind, SessionConfig};
    ///
    /// let config = SessionConfig::file("/srv/app");
    /// assert_eq!(config.backend, BackendKind::File);
    /// ```
    pub fn file(app_root: impl AsRef<Path>) -> Self {
        Self {
            backend: BackendKind::File,
            app_root: app_root.as_ref().to_path_buf(),
            ..Default::default()
        }
    }

    /// Sessions in the shared Redis cache.
    pub fn redis() -> Self {
        Self {
            backend: BackendKind::Redis,
            ..Default::default()
        }
    }

    /// Read `BURROW_SESSION_BACKEND`, `BURROW_APP_ROOT`,
    /// `BURROW_SESSION_NAMESPACE` and `BURROW_SESSION_EXPIRE` (seconds).
    pub fn from_env() -> SessionResult<Self> {
        let mut config = Self::default();

        if let Ok(backend) = std::env::var("BURROW_SESSION_BACKEND") {
            config.backend = backend.parse()?;
        }

        if let Ok(root) = std::env::var("BURROW_APP_ROOT") {
            config.app_root = PathBuf::from(root);
        }

        if let Ok(namespace) = std::env::var("BURROW_SESSION_NAMESPACE") {
            config.namespace = namespace;
        }

        if let Ok(expire) = std::env::var("BURROW_SESSION_EXPIRE") {
            let secs: u64 = expire.trim().parse().map_err(|_| {
                SessionError::Config(format!("BURROW_SESSION_EXPIRE is not a number: {}", expire))
            })?;
            config.default_expire = Duration::from_secs(secs);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_namespace(mut self, namespace: &str) -> Self {
        self.namespace = namespace.to_string();
        self
    }

    pub fn with_default_expire(mut self, expire: Duration) -> Self {
        self.default_expire = expire;
        self
    }

    pub fn with_max_expire(mut self, expire: Duration) -> Self {
        self.max_expire = expire;
        self
    }

    pub fn validate(&self) -> SessionResult<()> {
        if self.namespace.is_empty() {
            return Err(SessionError::Config("namespace must not be empty".to_string()));
        }
        if self.default_expire > self.max_expire {
            return Err(SessionError::Config(format!(
                "default expire {}s exceeds max expire {}s",
                self.default_expire.as_secs(),
                self.max_expire.as_secs()
            )));
        }
        Ok(())
    }

    /// Build the session key with namespace.
    pub fn session_key(&self, session_id: &str) -> String {
        format!("{}:{}", self.namespace, session_id)
    }

    /// Clamp a requested lifetime to `max_expire`.
    pub fn cap_expire(&self, expire: Duration) -> Duration {
        clamp_expire(expire, self.max_expire)
    }

    /// Build the backend factory this configuration selects.
    ///
    /// The Redis backend needs the process's shared cache client; the file
    /// backend ignores it.
    pub fn build_factory(
        &self,
        cache: Option<Arc<dyn CacheClient>>,
    ) -> SessionResult<Arc<dyn BackendFactory>> {
        self.validate()?;
        match self.backend {
            BackendKind::File => Ok(Arc::new(FileSessionManager::from_config(self))),
            BackendKind::Redis => {
                let client = cache.ok_or_else(|| {
                    SessionError::Config("redis backend selected but no cache client given".to_string())
                })?;
                Ok(Arc::new(RedisSessionManager::new(client, self)))
            }
        }
    }
}

/// `expire` limited to `max`. A shortened lifetime is logged.
pub(crate) fn clamp_expire(expire: Duration, max: Duration) -> Duration {
    if expire > max {
        debug!(
            target: "burrow::session",
            "requested expire {}s exceeds max expire, using {}s",
            expire.as_secs(),
            max.as_secs()
        );
        return max;
    }
    expire
}
