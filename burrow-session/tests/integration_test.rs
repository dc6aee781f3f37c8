//! Integration tests for burrow-session

use burrow_session::*;
use parking_lot::Mutex;
use serde_json::json;
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, SystemTime};

/// In-process stand-in for the shared cache.
#[derive(Default)]
struct MemoryCache {
    entries: Mutex<HashMap<String, Vec<u8>>>,
    ttls: Mutex<HashMap<String, Duration>>,
    writes: Mutex<usize>,
}

impl CacheClient for MemoryCache {
    fn exists(&self, key: &str) -> SessionResult<bool> {
        Ok(self.entries.lock().contains_key(key))
    }

    fn get(&self, key: &str) -> SessionResult<Option<Vec<u8>>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> SessionResult<()> {
        *self.writes.lock() += 1;
        self.entries.lock().insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn expire(&self, key: &str, ttl: Duration) -> SessionResult<()> {
        *self.writes.lock() += 1;
        self.ttls.lock().insert(key.to_string(), ttl);
        Ok(())
    }

    fn delete(&self, key: &str) -> SessionResult<()> {
        self.entries.lock().remove(key);
        self.ttls.lock().remove(key);
        Ok(())
    }
}

fn file_manager() -> (tempfile::TempDir, Arc<FileSessionManager>) {
    let root = tempfile::tempdir().unwrap();
    fs::create_dir(root.path().join("tmp")).unwrap();
    let manager = Arc::new(FileSessionManager::new(root.path()));
    (root, manager)
}

fn redis_manager() -> (Arc<MemoryCache>, RedisSessionManager) {
    let cache = Arc::new(MemoryCache::default());
    let client: Arc<dyn CacheClient> = cache.clone();
    let manager = RedisSessionManager::new(client, &SessionConfig::redis());
    (cache, manager)
}

#[test]
fn test_file_round_trip() {
    let (_root, manager) = file_manager();

    let mut session = Session::new("visitor1", manager.as_ref(), DEFAULT_EXPIRE).unwrap();
    session.set("user", "alice").unwrap();
    session.set("cart", vec![1, 2, 3]).unwrap();
    session.set("prefs", json!({"theme": "dark"})).unwrap();
    session.save().unwrap();

    let reloaded = Session::new("visitor1", manager.as_ref(), DEFAULT_EXPIRE).unwrap();
    assert_eq!(reloaded.data(), session.data());
}

#[test]
fn test_redis_round_trip() {
    let (_cache, manager) = redis_manager();

    let mut session = Session::new("visitor1", &manager, DEFAULT_EXPIRE).unwrap();
    session.set("user", "alice").unwrap();
    session.set("visits", 7).unwrap();
    session.save().unwrap();

    let reloaded = Session::new("visitor1", &manager, DEFAULT_EXPIRE).unwrap();
    assert_eq!(reloaded.data(), session.data());
}

#[test]
fn test_file_load_merges_into_unsaved_keys() {
    let (_root, manager) = file_manager();

    let mut writer = Session::new("visitor1", manager.as_ref(), DEFAULT_EXPIRE).unwrap();
    writer.set("user", "bob").unwrap();
    writer.set("theme", "dark").unwrap();
    writer.save().unwrap();

    let mut reader = Session::new("visitor2", manager.as_ref(), DEFAULT_EXPIRE).unwrap();
    fs::copy(manager.path_for("visitor1"), manager.path_for("visitor2")).unwrap();
    reader.set("user", "alice").unwrap();
    reader.set("local", 1).unwrap();
    reader.load().unwrap();

    assert_eq!(reader["user"], json!("bob"));
    assert_eq!(reader["theme"], json!("dark"));
    assert_eq!(reader["local"], json!(1));
    assert_eq!(reader.len(), 3);
}

#[test]
fn test_file_expired_session_loads_empty_and_file_remains() {
    let (_root, manager) = file_manager();
    let expire = Duration::from_secs(30);

    let mut session = Session::new("old", manager.as_ref(), expire).unwrap();
    session.set("user", "alice").unwrap();
    session.save().unwrap();

    let path = manager.path_for("old");
    let file = OpenOptions::new().write(true).open(&path).unwrap();
    file.set_modified(SystemTime::now() - Duration::from_secs(600)).unwrap();
    drop(file);

    let session = Session::new("old", manager.as_ref(), expire).unwrap();
    assert!(session.is_empty());
    assert!(path.exists());
}

#[test]
fn test_redis_empty_save_does_not_touch_key() {
    let (cache, manager) = redis_manager();

    let mut session = Session::new("visitor1", &manager, DEFAULT_EXPIRE).unwrap();
    session.set("user", "alice").unwrap();
    session.save().unwrap();
    let writes = *cache.writes.lock();
    let stored = cache.entries.lock()["session:visitor1"].clone();

    session.clear_data();
    session.save().unwrap();

    assert_eq!(*cache.writes.lock(), writes);
    assert_eq!(cache.entries.lock()["session:visitor1"], stored);
}

#[test]
fn test_file_empty_save_overwrites_snapshot() {
    let (_root, manager) = file_manager();

    let mut session = Session::new("visitor1", manager.as_ref(), DEFAULT_EXPIRE).unwrap();
    session.set("user", "alice").unwrap();
    session.save().unwrap();

    session.clear_data();
    session.save().unwrap();

    assert_eq!(fs::read(manager.path_for("visitor1")).unwrap(), b"{}");
    let reloaded = Session::new("visitor1", manager.as_ref(), DEFAULT_EXPIRE).unwrap();
    assert!(reloaded.is_empty());
}

#[test]
fn test_clear_twice_file() {
    let (_root, manager) = file_manager();
    let path = manager.path_for("visitor1");

    let mut session = Session::new("visitor1", manager.as_ref(), DEFAULT_EXPIRE).unwrap();
    session.set("user", "alice").unwrap();
    session.save().unwrap();
    assert!(path.exists());

    for _ in 0..2 {
        session.clear().unwrap();
        assert!(session.is_empty());
        assert!(!path.exists());
    }
}

#[test]
fn test_clear_twice_redis() {
    let (cache, manager) = redis_manager();

    let mut session = Session::new("visitor1", &manager, DEFAULT_EXPIRE).unwrap();
    session.set("user", "alice").unwrap();
    session.save().unwrap();

    for _ in 0..2 {
        session.clear().unwrap();
        assert!(session.is_empty());
        assert!(!cache.entries.lock().contains_key("session:visitor1"));
    }
}

#[test]
fn test_strict_and_lenient_reads() {
    let (_root, manager) = file_manager();
    let session = Session::new("visitor1", manager.as_ref(), DEFAULT_EXPIRE).unwrap();

    assert_eq!(session.get("missing"), None);
    assert_eq!(session.get_or("missing", json!(0)), json!(0));
    assert!(matches!(
        session.item("missing"),
        Err(SessionError::KeyNotFound(_))
    ));
}

#[test]
fn test_concurrent_file_saves_are_serialized() {
    let (_root, manager) = file_manager();

    let handles: Vec<_> = (0..4)
        .map(|n| {
            let manager = Arc::clone(&manager);
            thread::spawn(move || {
                let id = format!("visitor{}", n);
                let mut session = Session::new(&id, manager.as_ref(), DEFAULT_EXPIRE).unwrap();
                session.set("payload", "x".repeat(64 * 1024)).unwrap();
                session.set("owner", n).unwrap();
                session.save().unwrap();
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    for n in 0..4 {
        let session = Session::new(format!("visitor{}", n), manager.as_ref(), DEFAULT_EXPIRE).unwrap();
        assert_eq!(session["owner"], json!(n));
        assert_eq!(session.get_as::<String>("payload").map(|p| p.len()), Some(64 * 1024));
    }
}

#[test]
fn test_cookie_to_session_flow() {
    let (_root, manager) = file_manager();

    // First visit: no cookie, the request ID becomes the session ID
    let mut first = CookieRequest::new("shop.example.com", None).with_request_id("req42");
    let id = resolve_session_id(&mut first);
    assert_eq!(id, "req42");
    let headers = first.set_cookie_headers();
    assert_eq!(headers, vec!["shop_example_com=req42; Domain=shop.example.com; Path=/"]);

    let mut session = Session::new(id, manager.as_ref(), DEFAULT_EXPIRE).unwrap();
    session.set("user", "alice").unwrap();
    session.save().unwrap();

    // Second visit carries the cookie back
    let mut second = CookieRequest::new("shop.example.com", Some(b"shop_example_com=req42"));
    let id = resolve_session_id(&mut second);
    assert!(second.set_cookies().is_empty());

    let session = Session::new(id, manager.as_ref(), DEFAULT_EXPIRE).unwrap();
    assert_eq!(session["user"], json!("alice"));
}

#[test]
fn test_config_builds_file_factory() {
    let root = tempfile::tempdir().unwrap();
    fs::create_dir(root.path().join("tmp")).unwrap();
    let config = SessionConfig::file(root.path()).with_default_expire(Duration::from_secs(600));
    let factory = config.build_factory(None).unwrap();

    let mut session = Session::new("visitor1", factory.as_ref(), config.default_expire).unwrap();
    session.set("k", true).unwrap();
    session.save().unwrap();
    assert!(root.path().join("tmp/visitor1.session").exists());
}

#[test]
fn test_config_builds_redis_factory() {
    let cache = Arc::new(MemoryCache::default());
    let client: Arc<dyn CacheClient> = cache.clone();
    let config = SessionConfig::redis().with_namespace("shop:sess");
    let factory = config.build_factory(Some(client)).unwrap();

    let mut session = Session::new("visitor1", factory.as_ref(), Duration::from_secs(120)).unwrap();
    session.set("k", true).unwrap();
    session.save().unwrap();

    assert!(cache.entries.lock().contains_key("shop:sess:visitor1"));
    assert_eq!(cache.ttls.lock()["shop:sess:visitor1"], Duration::from_secs(120));
}

// Note: These tests would require Redis running
// They are disabled by default but can be run with: cargo test -- --ignored

#[cfg(feature = "redis")]
#[test]
#[ignore]
fn test_live_redis_session() {
    use burrow_redis::{RedisConfig, RedisService};

    let redis = RedisService::connect(RedisConfig::new("redis://localhost:6379")).unwrap();
    let client: Arc<dyn CacheClient> = Arc::new(redis);
    let manager = RedisSessionManager::new(client, &SessionConfig::redis());
    let id = generate_session_id();

    let mut session = Session::new(id.as_str(), &manager, Duration::from_secs(60)).unwrap();
    session.set("user", "alice").unwrap();
    session.save().unwrap();

    let mut reloaded = Session::new(id.as_str(), &manager, Duration::from_secs(60)).unwrap();
    assert_eq!(reloaded["user"], json!("alice"));

    reloaded.clear().unwrap();
    let gone = Session::new(id.as_str(), &manager, Duration::from_secs(60)).unwrap();
    assert!(gone.is_empty());
}
