// Integration tests for persistent stores over a durable redb medium.
//
// Each "restart" drops every store and the database handle, then reopens
// the database from the same directory.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use statehold_store::{
    DarkModeToggle, KeyValueMedium, LoadState, PersistentStore, RedbMedium, StoreError,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Layout {
    sidebar_width: u32,
    panels: Vec<String>,
}

fn layout() -> Layout {
    Layout {
        sidebar_width: 240,
        panels: vec!["files".to_string(), "search".to_string()],
    }
}

// ── Round-trip across restarts ─────────────────────────────────────────

#[test]
fn test_value_survives_restart() {
    let dir = tempfile::tempdir().unwrap();

    {
        let medium = RedbMedium::open_dir(dir.path(), None).unwrap();
        let mut store: PersistentStore<Layout> =
            PersistentStore::open("layout", layout(), medium).unwrap();
        let mut wide = layout();
        wide.sidebar_width = 400;
        store.set(wide).unwrap();
    }

    let medium = RedbMedium::open_dir(dir.path(), None).unwrap();
    let store: PersistentStore<Layout> =
        PersistentStore::open("layout", layout(), medium).unwrap();
    assert_eq!(store.load_state(), LoadState::Ready);
    assert_eq!(store.value().map(|l| l.sidebar_width), Some(400));
}

#[test]
fn test_removed_value_stays_removed_until_reload_default() {
    let dir = tempfile::tempdir().unwrap();

    {
        let medium = RedbMedium::open_dir(dir.path(), None).unwrap();
        let mut store: PersistentStore<u32> =
            PersistentStore::open("count", 1, medium.clone()).unwrap();
        store.set(9).unwrap();
        store.remove().unwrap();
        assert!(medium.read("count").unwrap().is_none());
    }

    let medium = RedbMedium::open_dir(dir.path(), None).unwrap();
    let store: PersistentStore<u32> = PersistentStore::open("count", 1, medium).unwrap();
    assert_eq!(store.value(), Some(&1));
}

// ── Concrete scenarios ─────────────────────────────────────────────────

#[test]
fn test_empty_medium_default_then_set() {
    let dir = tempfile::tempdir().unwrap();
    let medium = RedbMedium::open_dir(dir.path(), None).unwrap();

    let mut store: PersistentStore<bool> = PersistentStore::new("k", false, medium.clone());
    store.load().unwrap();
    assert_eq!(store.get(), (Some(&false), LoadState::Ready));

    store.set(true).unwrap();
    let raw = medium.read_entry("k").unwrap().unwrap();
    assert!(serde_json::from_str::<bool>(&raw).unwrap());
}

#[test]
fn test_stored_true_discards_default() {
    let dir = tempfile::tempdir().unwrap();
    let medium = RedbMedium::open_dir(dir.path(), None).unwrap();
    medium.write("k", "true").unwrap();

    let store: PersistentStore<bool> = PersistentStore::open("k", false, medium).unwrap();
    assert_eq!(store.get(), (Some(&true), LoadState::Ready));
}

// ── Race policy ────────────────────────────────────────────────────────

#[test]
fn test_deferred_load_is_authoritative() {
    let dir = tempfile::tempdir().unwrap();
    let medium = RedbMedium::open_dir(dir.path(), None).unwrap();
    medium.write("layout", &serde_json::to_string(&layout()).unwrap()).unwrap();

    let mut store: PersistentStore<Layout> = PersistentStore::new(
        "layout",
        Layout {
            sidebar_width: 0,
            panels: Vec::new(),
        },
        medium.clone(),
    );
    store.begin_load();

    // A consumer writes before the load has landed
    store
        .update(|current| {
            assert!(current.is_none());
            Layout {
                sidebar_width: 1,
                panels: Vec::new(),
            }
        })
        .unwrap();
    store.remove().unwrap();
    store.set(Layout {
        sidebar_width: 2,
        panels: Vec::new(),
    })
    .unwrap();

    let raw = medium.read("layout").unwrap().unwrap();
    assert_eq!(serde_json::from_str::<Layout>(&raw).unwrap(), layout());

    store.finish_load().unwrap();
    assert_eq!(store.value(), Some(&layout()));
}

// ── Shared medium ──────────────────────────────────────────────────────

#[test]
fn test_two_stores_same_key_last_write_wins() {
    let dir = tempfile::tempdir().unwrap();
    let medium = RedbMedium::open_dir(dir.path(), None).unwrap();

    let mut a: PersistentStore<String> =
        PersistentStore::open("shared", "init".to_string(), medium.clone()).unwrap();
    let mut b: PersistentStore<String> =
        PersistentStore::open("shared", "ignored".to_string(), medium.clone()).unwrap();
    assert_eq!(b.value().map(String::as_str), Some("init"));

    a.set("from-a".to_string()).unwrap();
    b.set("from-b".to_string()).unwrap();

    let fresh: PersistentStore<String> =
        PersistentStore::open("shared", String::new(), medium).unwrap();
    assert_eq!(fresh.value().map(String::as_str), Some("from-b"));
}

#[test]
fn test_different_keys_are_isolated() {
    let dir = tempfile::tempdir().unwrap();
    let medium = RedbMedium::open_dir(dir.path(), None).unwrap();

    let mut flag: PersistentStore<bool> =
        PersistentStore::open("flag", false, medium.clone()).unwrap();
    let mut name: PersistentStore<String> =
        PersistentStore::open("name", "anon".to_string(), medium.clone()).unwrap();
    flag.set(true).unwrap();
    name.remove().unwrap();

    assert_eq!(medium.list_keys().unwrap(), vec!["flag"]);
}

// ── Failures ───────────────────────────────────────────────────────────

#[test]
fn test_capacity_limit_reported_and_previous_entry_kept() {
    let dir = tempfile::tempdir().unwrap();
    let medium = RedbMedium::open_dir(dir.path(), Some(16)).unwrap();

    let mut store: PersistentStore<String> =
        PersistentStore::open("note", "short".to_string(), medium.clone()).unwrap();
    let err = store.set("x".repeat(64)).unwrap_err();
    assert!(matches!(err, StoreError::WriteFailure { .. }));
    assert_eq!(store.value().map(String::len), Some(64));
    assert_eq!(medium.read("note").unwrap().as_deref(), Some("\"short\""));
}

#[test]
fn test_corrupt_entry_on_disk_recovers() {
    let dir = tempfile::tempdir().unwrap();
    let medium = RedbMedium::open_dir(dir.path(), None).unwrap();
    medium.write("layout", "{\"sidebar_width\": \"wide\"}").unwrap();

    let store: PersistentStore<Layout> =
        PersistentStore::open("layout", layout(), medium.clone()).unwrap();
    assert_eq!(store.value(), Some(&layout()));
    assert!(store.load_diagnostic().is_some());

    // Default replaced the broken entry on disk
    assert_eq!(
        medium.read("layout").unwrap().as_deref(),
        Some(serde_json::to_string(&layout()).unwrap().as_str())
    );
    let fresh: PersistentStore<Layout> = PersistentStore::open(
        "layout",
        Layout {
            sidebar_width: 0,
            panels: Vec::new(),
        },
        medium,
    )
    .unwrap();
    assert_eq!(fresh.value(), Some(&layout()));
    assert!(fresh.load_diagnostic().is_none());
}

// ── Dark mode ──────────────────────────────────────────────────────────

#[test]
fn test_dark_mode_choice_survives_restart() {
    let dir = tempfile::tempdir().unwrap();

    {
        let medium = RedbMedium::open_dir(dir.path(), None).unwrap();
        let mut toggle = DarkModeToggle::new("useDarkMode", None, Arc::new(|| false), medium);
        toggle.load().unwrap();
        assert!(!toggle.enabled());
        assert!(toggle.toggle(None).unwrap());
    }

    let medium = RedbMedium::open_dir(dir.path(), None).unwrap();
    let mut toggle = DarkModeToggle::new("useDarkMode", None, Arc::new(|| false), medium);
    toggle.load().unwrap();
    assert!(toggle.enabled());
}
