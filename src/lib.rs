// Burrow - server-side session storage for Rust
//
// Per-visitor key/value sessions persisted to local files or a shared Redis
// cache, with cookie-based session IDs.

// Re-export session functionality
pub use burrow_session::*;

// Re-export the logging crate
pub use burrow_log as log;

// Re-export the Redis client
#[cfg(feature = "redis")]
pub use burrow_redis as redis;

/// Re-export commonly used types
pub mod prelude {
    pub use burrow_session::prelude::*;

    #[cfg(feature = "redis")]
    pub use burrow_redis::{RedisConfig, RedisService};
}
