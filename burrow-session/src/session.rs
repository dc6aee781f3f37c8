//! The per-visitor session object.

use crate::error::{SessionError, SessionResult};
use crate::traits::{BackendFactory, DEFAULT_EXPIRE, NullBackend, SessionBackend, SessionData};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::hash_map;
use std::fmt;
use std::ops::Index;
use std::time::Duration;

/// Key/value state for one visitor, bound to exactly one backend.
///
/// State is loaded from the backend when the session is constructed and is
/// only written back by an explicit [`Session::save`]. Dropping a session
/// never persists anything.
///
/// # Examples
///
/// ```no_run
/// use burrow_session::{FileSessionManager, Session, DEFAULT_EXPIRE};
///
/// # fn example() -> burrow_session::SessionResult<()> {
/// let files = FileSessionManager::new("/srv/app");
///
/// let mut session = Session::new("4f1c2a", &files, DEFAULT_EXPIRE)?;
/// session.set("user_id", 42)?;
/// session.save()?;
/// # Ok(())
/// # }
/// ```
pub struct Session {
    id: String,
    data: SessionData,
    expire: Duration,
    backend: Box<dyn SessionBackend>,
}

impl Session {
    /// Create a session persisted through `factory` and load its state.
    pub fn new(
        id: impl Into<String>,
        factory: &dyn BackendFactory,
        expire: Duration,
    ) -> SessionResult<Self> {
        Self::with_backend(id, Some(factory), expire)
    }

    /// Create a session that lives only in memory.
    pub fn in_memory(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            data: SessionData::new(),
            expire: DEFAULT_EXPIRE,
            backend: Box::new(NullBackend),
        }
    }

    /// Create a session with an optional backend and load its state.
    ///
    /// Without a factory the session is bound to [`NullBackend`].
    pub fn with_backend(
        id: impl Into<String>,
        factory: Option<&dyn BackendFactory>,
        expire: Duration,
    ) -> SessionResult<Self> {
        let id = id.into();
        let backend = match factory {
            Some(factory) => factory.create(expire, &id)?,
            None => Box::new(NullBackend),
        };

        let mut session = Self {
            id,
            data: SessionData::new(),
            expire,
            backend,
        };
        session.load()?;
        Ok(session)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn expire(&self) -> Duration {
        self.expire
    }

    /// The whole mapping.
    pub fn data(&self) -> &SessionData {
        &self.data
    }

    /// Lenient lookup.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Lenient lookup with a fallback value.
    pub fn get_or(&self, key: &str, default: Value) -> Value {
        self.data.get(key).cloned().unwrap_or(default)
    }

    /// Lenient typed lookup. Missing keys and values of another shape both
    /// yield `None`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.data
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Strict lookup: a missing key is an error.
    pub fn item(&self, key: &str) -> SessionResult<&Value> {
        self.data
            .get(key)
            .ok_or_else(|| SessionError::KeyNotFound(key.to_string()))
    }

    /// Store any serializable value, replacing what was there.
    pub fn set<T: Serialize>(&mut self, key: impl Into<String>, value: T) -> SessionResult<()> {
        let value =
            serde_json::to_value(value).map_err(|e| SessionError::Serialization(e.to_string()))?;
        self.data.insert(key.into(), value);
        Ok(())
    }

    /// Store a JSON value, replacing what was there.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.data.insert(key.into(), value)
    }

    /// Remove a key. Absent keys are ignored.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.data.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.data.keys()
    }

    pub fn iter(&self) -> hash_map::Iter<'_, String, Value> {
        self.data.iter()
    }

    /// Merge the backend's stored state into this session.
    pub fn load(&mut self) -> SessionResult<()> {
        self.backend.load(&mut self.data)
    }

    /// Write this session's state to the backend.
    pub fn save(&self) -> SessionResult<()> {
        self.backend.save(&self.data)
    }

    /// Drop this session's state in memory and in the backend.
    ///
    /// An in-memory session has no backend to clear, so this leaves its
    /// data untouched; use [`Session::clear_data`] for that.
    pub fn clear(&mut self) -> SessionResult<()> {
        self.backend.clear(&mut self.data)
    }

    /// Empty the in-memory mapping without touching the backend.
    pub fn clear_data(&mut self) {
        self.data.clear();
    }
}

impl Index<&str> for Session {
    type Output = Value;

    /// Panics if the key is absent; see [`Session::item`] for the fallible
    /// form.
    fn index(&self, key: &str) -> &Value {
        match self.data.get(key) {
            Some(value) => value,
            None => panic!("key not found in session: {}", key),
        }
    }
}

impl<'a> IntoIterator for &'a Session {
    type Item = (&'a String, &'a Value);
    type IntoIter = hash_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("expire", &self.expire)
            .field("keys", &self.data.len())
            .finish_non_exhaustive()
    }
}
