//! Integration tests for common Burrow workflows.
//!
//! These tests drive the facade crate the way an application would.

use burrow::prelude::*;
use serde_json::json;
use std::fs;
use std::time::Duration;

// =============================================================================
// File Session Tests
// =============================================================================

#[test]
fn test_login_then_logout() {
    let root = tempfile::tempdir().unwrap();
    fs::create_dir(root.path().join("tmp")).unwrap();
    let files = FileSessionManager::new(root.path());

    let mut request = CookieRequest::new("app.example.org", None);
    let id = resolve_session_id(&mut request);
    assert_eq!(request.set_cookies().len(), 1);

    // Login
    let mut session = Session::new(id.clone(), &files, Duration::from_secs(1800)).unwrap();
    session.set("user_id", 42).unwrap();
    session.save().unwrap();

    // Next request sees the user
    let mut session = Session::new(id.clone(), &files, Duration::from_secs(1800)).unwrap();
    assert_eq!(session.get_as::<u32>("user_id"), Some(42));

    // Logout
    session.clear().unwrap();
    let session = Session::new(id, &files, Duration::from_secs(1800)).unwrap();
    assert!(session.get("user_id").is_none());
}

#[test]
fn test_unsaved_changes_are_not_persisted() {
    let root = tempfile::tempdir().unwrap();
    fs::create_dir(root.path().join("tmp")).unwrap();
    let files = FileSessionManager::new(root.path());

    let mut session = Session::new("draft", &files, DEFAULT_EXPIRE).unwrap();
    session.set("saved", true).unwrap();
    session.save().unwrap();
    session.set("unsaved", true).unwrap();
    drop(session);

    let session = Session::new("draft", &files, DEFAULT_EXPIRE).unwrap();
    assert_eq!(session["saved"], json!(true));
    assert!(!session.contains("unsaved"));
}

// =============================================================================
// In-Memory Session Tests
// =============================================================================

#[test]
fn test_in_memory_session() {
    let mut session = Session::in_memory(generate_session_id());
    session.set("flash", "Saved!").unwrap();
    session.save().unwrap();
    assert_eq!(session.get_or("flash", json!("")), json!("Saved!"));
}

// =============================================================================
// Logging Tests
// =============================================================================

#[test]
fn test_log_level_controls() {
    burrow::log::set_level(burrow::log::Level::Warn);
    assert!(!burrow::log::is_level_enabled(burrow::log::Level::Debug));
    assert!(burrow::log::is_level_enabled(burrow::log::Level::Error));
}
