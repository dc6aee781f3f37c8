//! Server-side session storage for Burrow.
//!
//! A [`Session`] is a key/value mapping for one visitor, identified by an
//! opaque ID carried in a cookie. Its state is loaded once when it is
//! created and written back only by an explicit [`Session::save`].
//!
//! Persistence is pluggable through [`SessionBackend`]; a
//! [`BackendFactory`] builds one backend per session.
//!
//! # Features
//!
//! - `redis` - Redis session storage through `burrow-redis` (enabled by default)
//!
//! The file store and the cookie helpers are always available.
//!
//! # Examples
//!
//! ## File Session Store
//!
//! ```no_run
//! use burrow_session::*;
//! use std::time::Duration;
//!
//! fn main() -> Result<(), SessionError> {
//!     // Shared by every request in the process
//!     let files = FileSessionManager::new("/srv/app");
//!
//!     // Work out which session the request belongs to
//!     let mut request = CookieRequest::new("shop.example.com", Some(b"shop_example_com=4f1c2a"));
//!     let id = resolve_session_id(&mut request);
//!
//!     let mut session = Session::new(id, &files, Duration::from_secs(1800))?;
//!     session.set("user_id", 123)?;
//!     session.save()?;
//!
//!     let user_id: Option<i32> = session.get_as("user_id");
//!     println!("User ID: {:?}", user_id);
//!
//!     // Logout
//!     session.clear()?;
//!     Ok(())
//! }
//! ```
//!
//! ## Redis Session Store
//!
//! ```no_run
//! use burrow_redis::{RedisConfig, RedisService};
//! use burrow_session::*;
//! use std::sync::Arc;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let redis = Arc::new(RedisService::connect(RedisConfig::new("redis://localhost:6379"))?);
//!
//!     let config = SessionConfig::redis().with_namespace("myapp:session");
//!     let factory = config.build_factory(Some(redis))?;
//!
//!     let mut session = Session::new("4f1c2a", factory.as_ref(), config.default_expire)?;
//!     session.set("username", "alice")?;
//!     session.save()?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod cookie;
pub mod error;
pub mod file_session;
pub mod redis_session;
pub mod session;
pub mod traits;

pub use config::{BackendKind, SessionConfig};
pub use cookie::{
    CookieRequest, SessionRequest, SetCookie, cookie_name, parse_cookie_header, resolve_session_id,
};
pub use error::{SessionError, SessionResult};
pub use file_session::{FileSessionManager, FileSessionStore};
pub use redis_session::{CacheClient, RedisSessionManager, RedisSessionStore};
pub use session::Session;
pub use traits::{
    BackendFactory, DEFAULT_EXPIRE, NullBackend, SessionBackend, SessionData, decode_session_id,
    generate_session_id,
};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{BackendKind, SessionConfig};
    pub use crate::cookie::{CookieRequest, SessionRequest, resolve_session_id};
    pub use crate::error::{SessionError, SessionResult};
    pub use crate::file_session::FileSessionManager;
    pub use crate::redis_session::{CacheClient, RedisSessionManager};
    pub use crate::session::Session;
    pub use crate::traits::{BackendFactory, DEFAULT_EXPIRE, SessionBackend, generate_session_id};
}
