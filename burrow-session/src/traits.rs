//! Backend contract shared by every session store.

use crate::error::{SessionError, SessionResult};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

/// The key/value mapping a session holds.
pub type SessionData = HashMap<String, Value>;

/// Default session lifetime.
pub const DEFAULT_EXPIRE: Duration = Duration::from_secs(3600);

/// Persistence for the data of one session.
///
/// A backend is created per session by a [`BackendFactory`] and is bound to
/// that session's ID for its whole life. The session lends its data to the
/// backend for each call: `load` and `clear` may mutate it in place, `save`
/// only reads it.
///
/// Every operation defaults to a no-op, so a backend implements only what
/// it supports.
pub trait SessionBackend: Send + Sync {
    /// Merge the persisted snapshot into `data`.
    fn load(&self, _data: &mut SessionData) -> SessionResult<()> {
        Ok(())
    }

    /// Persist a snapshot of `data`.
    fn save(&self, _data: &SessionData) -> SessionResult<()> {
        Ok(())
    }

    /// Drop both the in-memory and the persisted state.
    fn clear(&self, _data: &mut SessionData) -> SessionResult<()> {
        Ok(())
    }
}

/// Backend used when a session has no persistence. Every call is a no-op.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullBackend;

impl SessionBackend for NullBackend {}

/// Builds the backend for a single session.
pub trait BackendFactory: Send + Sync {
    /// Create a backend bound to `session_id` whose state lives for
    /// `expire`.
    fn create(&self, expire: Duration, session_id: &str) -> SessionResult<Box<dyn SessionBackend>>;
}

/// Generate a new random session ID.
pub fn generate_session_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Decode raw session ID bytes without loss: every byte becomes the
/// character with the same code point (ISO-8859-1).
pub fn decode_session_id(raw: &[u8]) -> String {
    raw.iter().map(|&b| char::from(b)).collect()
}

pub(crate) fn encode_snapshot(data: &SessionData) -> SessionResult<Vec<u8>> {
    serde_json::to_vec(data).map_err(|e| SessionError::Serialization(e.to_string()))
}

pub(crate) fn decode_snapshot(bytes: &[u8]) -> SessionResult<SessionData> {
    serde_json::from_slice(bytes).map_err(|e| SessionError::Deserialization(e.to_string()))
}
