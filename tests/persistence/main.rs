use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use canvas_history::codec::Lz4Transform;
use canvas_history::{
    FileKeyValueStore, InMemoryKeyValueStore, KeyValueStore, PersistenceError,
    PersistenceGateway, ProjectId, ProjectRecord, Snapshot,
};

static TICK: AtomicU64 = AtomicU64::new(1_000);

/// Strictly increasing timestamps, one second apart.
fn ticking_clock() -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(TICK.fetch_add(1, Ordering::SeqCst))
}

fn snapshot(n: usize) -> Snapshot {
    Snapshot::from(format!("{{\"n\":{}}}", n))
}

// ============================================================================
// Retention
// ============================================================================

#[test]
fn sixth_save_evicts_exactly_the_oldest() {
    let store = InMemoryKeyValueStore::new();
    let gateway = PersistenceGateway::new(store.clone()).with_clock(ticking_clock);

    let mut saved: Vec<ProjectRecord> = Vec::new();
    for n in 0..5 {
        let report = gateway.save_project(&format!("p{}", n), &snapshot(n)).unwrap();
        assert!(report.evicted.is_empty());
        saved.push(report.record.unwrap());
    }

    let report = gateway.save_project("p5", &snapshot(5)).unwrap();
    assert_eq!(report.evicted, vec![saved[0].id.clone()]);

    let listed = gateway.list_projects().unwrap();
    assert_eq!(listed.len(), 5);
    assert_eq!(listed[0].name, "p5");
    assert!(listed.iter().all(|r| r.id != saved[0].id));
}

#[test]
fn retention_never_exceeds_limit() {
    let gateway = PersistenceGateway::new(InMemoryKeyValueStore::new())
        .with_clock(ticking_clock)
        .with_retention_limit(3);

    for n in 0..10 {
        gateway.save_project("p", &snapshot(n)).unwrap();
        assert!(gateway.list_projects().unwrap().len() <= 3);
    }
}

#[test]
fn preferences_are_outside_retention() {
    let store = InMemoryKeyValueStore::new();
    let gateway = PersistenceGateway::new(store.clone())
        .with_clock(ticking_clock)
        .with_retention_limit(1);
    gateway
        .save_preferences(&canvas_history::Preferences::default())
        .unwrap();

    gateway.save_project("a", &snapshot(0)).unwrap();
    gateway.save_project("b", &snapshot(1)).unwrap();

    assert!(gateway.load_preferences().is_some());
    assert_eq!(store.len().unwrap(), 2);
}

// ============================================================================
// Failure handling
// ============================================================================

#[test]
fn quota_exceeded_propagates() {
    let gateway = PersistenceGateway::new(InMemoryKeyValueStore::with_quota(64));
    let err = gateway.save_project("big", &snapshot(0)).unwrap_err();
    assert!(err.is_quota_exceeded());
    assert!(gateway.list_projects().unwrap().is_empty());
}

#[test]
fn corrupt_entries_are_purged_before_eviction() {
    let store = InMemoryKeyValueStore::new();
    let gateway = PersistenceGateway::new(store.clone())
        .with_clock(ticking_clock)
        .with_retention_limit(2);
    let kept = gateway.save_project("kept", &snapshot(0)).unwrap().record.unwrap();
    store.set("project_garbage", "!!not base64!!".into()).unwrap();

    // the corrupt entry does not count, so nothing valid is evicted
    let report = gateway.save_project("new", &snapshot(1)).unwrap();
    assert_eq!(report.purged, vec!["project_garbage".to_string()]);
    assert!(report.evicted.is_empty());
    assert!(gateway.load_project(&kept.id).is_ok());
}

#[test]
fn load_reports_missing_and_corrupt() {
    let store = InMemoryKeyValueStore::new();
    let gateway = PersistenceGateway::new(store.clone());
    store.set("project_broken", "e30=".into()).unwrap();

    assert!(matches!(
        gateway.load_project(&ProjectId::from("nope")),
        Err(PersistenceError::NotFound { .. })
    ));
    assert!(matches!(
        gateway.load_project(&ProjectId::from("broken")),
        Err(PersistenceError::Corrupt { .. })
    ));
}

// ============================================================================
// Transforms and stores
// ============================================================================

#[test]
fn lz4_records_round_trip() {
    let gateway = PersistenceGateway::new(InMemoryKeyValueStore::new())
        .with_transform(Box::new(Lz4Transform));
    let body = format!("{{\"text\":\"{}\"}}", "ab".repeat(500));
    let record = gateway
        .save_project("compressed", &Snapshot::from(body.as_str()))
        .unwrap()
        .record
        .unwrap();

    let loaded = gateway.load_project(&record.id).unwrap();
    assert_eq!(loaded.snapshot.as_str(), body);
}

#[test]
fn file_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let id = {
        let gateway = PersistenceGateway::new(FileKeyValueStore::open(dir.path()).unwrap());
        gateway.save_project("on disk", &snapshot(7)).unwrap().record.unwrap().id
    };

    let gateway = PersistenceGateway::new(FileKeyValueStore::open(dir.path()).unwrap());
    let record = gateway.load_project(&id).unwrap();
    assert_eq!(record.name, "on disk");
    assert_eq!(record.snapshot, snapshot(7));
}

#[test]
fn file_store_quota_is_enforced() {
    let dir = tempfile::tempdir().unwrap();
    let gateway =
        PersistenceGateway::new(FileKeyValueStore::open(dir.path()).unwrap().with_quota(32));
    let err = gateway.save_project("too big", &snapshot(1)).unwrap_err();
    assert!(err.is_quota_exceeded());
}
