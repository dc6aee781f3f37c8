//! Redis connection settings.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{RedisError, Result};

/// Where and how to reach the Redis server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedisConfig {
    /// Redis URL (`redis://host:port`, or `rediss://host:port` for TLS).
    pub url: String,
    /// Time allowed to establish the connection.
    #[serde(with = "duration_secs", default = "default_connection_timeout")]
    pub connection_timeout: Duration,
    /// Read/write timeout applied to every command.
    #[serde(with = "duration_secs", default = "default_command_timeout")]
    pub command_timeout: Duration,
    /// Database number (0-15).
    #[serde(default)]
    pub database: Option<u8>,
    /// Username for Redis 6+ ACL.
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub tls: bool,
    /// Sent with `CLIENT SETNAME` after connecting.
    #[serde(default)]
    pub connection_name: Option<String>,
}

fn default_connection_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_command_timeout() -> Duration {
    Duration::from_secs(30)
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            connection_timeout: default_connection_timeout(),
            command_timeout: default_command_timeout(),
            database: None,
            username: None,
            password: None,
            tls: false,
            connection_name: None,
        }
    }
}

impl RedisConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn builder() -> RedisConfigBuilder {
        RedisConfigBuilder::new()
    }

    /// Start a builder seeded from `REDIS_URL`, `REDIS_DATABASE`,
    /// `REDIS_USERNAME`, `REDIS_PASSWORD` and `REDIS_TLS`.
    pub fn from_env() -> RedisConfigBuilder {
        let mut builder = RedisConfigBuilder::new();

        if let Ok(url) = std::env::var("REDIS_URL") {
            builder = builder.url(url);
        }

        if let Ok(db) = std::env::var("REDIS_DATABASE")
            && let Ok(db) = db.parse()
        {
            builder = builder.database(db);
        }

        if let Ok(username) = std::env::var("REDIS_USERNAME") {
            builder = builder.username(username);
        }

        if let Ok(password) = std::env::var("REDIS_PASSWORD") {
            builder = builder.password(password);
        }

        if std::env::var("REDIS_TLS").is_ok() {
            builder = builder.tls(true);
        }

        builder
    }

    /// Reject URLs the client could never connect with.
    pub fn validate(&self) -> Result<()> {
        let parsed = url::Url::parse(&self.url)
            .map_err(|e| RedisError::Config(format!("invalid url {}: {}", self.url, e)))?;

        match parsed.scheme() {
            "redis" | "rediss" => {}
            other => {
                return Err(RedisError::Config(format!(
                    "unsupported scheme {}, expected redis:// or rediss://",
                    other
                )));
            }
        }

        if parsed.host_str().is_none() {
            return Err(RedisError::Config(format!("missing host in {}", self.url)));
        }

        if let Some(db) = self.database
            && db > 15
        {
            return Err(RedisError::Config(format!("database {} out of range", db)));
        }

        Ok(())
    }

    /// The URL with credentials and database folded in. Reserved
    /// characters in the username and password are percent-encoded.
    pub fn connection_url(&self) -> Result<String> {
        let mut url = url::Url::parse(&self.url)
            .map_err(|e| RedisError::Config(format!("invalid url {}: {}", self.url, e)))?;

        if let Some(username) = &self.username {
            url.set_username(username)
                .map_err(|_| RedisError::Config(format!("cannot set username on {}", self.url)))?;
        }

        if let Some(password) = &self.password {
            url.set_password(Some(password))
                .map_err(|_| RedisError::Config(format!("cannot set password on {}", self.url)))?;
        }

        if let Some(db) = self.database
            && matches!(url.path(), "" | "/")
        {
            url.set_path(&db.to_string());
        }

        Ok(url.to_string())
    }
}

/// Builder for [`RedisConfig`].
#[derive(Debug, Default)]
pub struct RedisConfigBuilder {
    config: RedisConfig,
}

impl RedisConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.config.url = url.into();
        self
    }

    pub fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.config.connection_timeout = timeout;
        self
    }

    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.config.command_timeout = timeout;
        self
    }

    pub fn database(mut self, db: u8) -> Self {
        self.config.database = Some(db);
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.config.username = Some(username.into());
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.config.password = Some(password.into());
        self
    }

    /// Enable TLS. Rewrites a `redis://` URL to `rediss://`.
    pub fn tls(mut self, enabled: bool) -> Self {
        self.config.tls = enabled;
        if enabled && self.config.url.starts_with("redis://") {
            self.config.url = self.config.url.replacen("redis://", "rediss://", 1);
        }
        self
    }

    pub fn connection_name(mut self, name: impl Into<String>) -> Self {
        self.config.connection_name = Some(name.into());
        self
    }

    pub fn build(self) -> RedisConfig {
        self.config
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
