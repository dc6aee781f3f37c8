//! # Burrow Redis
//!
//! The shared cache client behind Burrow's Redis session backend.
//!
//! A single [`RedisService`] is created at start-up from a [`RedisConfig`]
//! and handed to every session store that needs it. All calls block the
//! current thread.
//!
//! ```rust,no_run
//! use burrow_redis::{RedisConfig, RedisService};
//! use std::time::Duration;
//!
//! fn main() -> burrow_redis::Result<()> {
//!     let config = RedisConfig::from_env()
//!         .command_timeout(Duration::from_secs(2))
//!         .build();
//!
//!     let redis = RedisService::connect(config)?;
//!     redis.set_bytes("greeting", b"hello")?;
//!     redis.expire("greeting", Duration::from_secs(60))?;
//!     assert_eq!(redis.get_bytes("greeting")?, Some(b"hello".to_vec()));
//!     Ok(())
//! }
//! ```

mod cache;
mod config;
mod error;
mod service;

pub use cache::RedisCache;
pub use config::{RedisConfig, RedisConfigBuilder};
pub use error::{RedisError, Result};
pub use service::RedisService;

// Re-export redis crate for convenience
pub use redis;

pub mod prelude {
    pub use crate::cache::RedisCache;
    pub use crate::config::{RedisConfig, RedisConfigBuilder};
    pub use crate::error::{RedisError, Result};
    pub use crate::service::RedisService;
}
