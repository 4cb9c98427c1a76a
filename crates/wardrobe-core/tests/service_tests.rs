//! Behavioural tests for the service: revision accounting, long-poll
//! resolution, eviction, and persistence hand-off.
//!
//! Long-poll tests run on a paused Tokio clock so deadlines can be
//! crossed without real sleeping. Record timestamps come from a
//! [`ManualClock`].

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use wardrobe_core::{ManualClock, WardrobeConfig, WardrobeError, WardrobeService, load_snapshot};
use wardrobe_db::{MemoryStore, PersistedState, SnapshotStore, SnapshotWriter};
use wardrobe_types::{CapeWrite, EmoteSnapshot, EmoteWrite, PlayerId};

const START: i64 = 1_700_000_000_000;
const LONG_POLL: Duration = Duration::from_secs(25);

fn service_with(config: &WardrobeConfig) -> (Arc<WardrobeService>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(START));
    let service = WardrobeService::new(config, clock.clone(), SnapshotWriter::disabled());
    (Arc::new(service), clock)
}

fn service() -> (Arc<WardrobeService>, Arc<ManualClock>) {
    service_with(&WardrobeConfig::default())
}

fn emote(emote_type: &str, active: bool) -> EmoteWrite {
    EmoteWrite {
        name: None,
        emote_type: Some(emote_type.to_owned()),
        active: Some(active),
    }
}

fn id(raw: &str) -> PlayerId {
    PlayerId::parse(raw).unwrap()
}

fn spawn_poll(service: &Arc<WardrobeService>, since_rev: u64) -> JoinHandle<EmoteSnapshot> {
    let service = Arc::clone(service);
    tokio::spawn(async move { service.await_emote_changes_for(since_rev, LONG_POLL).await })
}

async fn wait_for_observers(service: &WardrobeService, count: usize) {
    while service.pending_observers() < count {
        tokio::task::yield_now().await;
    }
}

// =========================================================================
// Revision accounting
// =========================================================================

#[test]
fn revision_increases_by_one_per_write_and_not_on_reads() {
    let (service, clock) = service();

    for expected in 1..=5 {
        let rev = service.write_emote("p", &emote("wave", true)).unwrap();
        assert_eq!(rev, expected);
        assert_eq!(service.emote_snapshot().revision, expected);
    }

    // Let everything expire; the sweep must not move the revision.
    clock.advance(Duration::from_secs(120));
    let snapshot = service.emote_snapshot();
    assert!(snapshot.records.is_empty());
    assert_eq!(snapshot.revision, 5);
}

#[test]
fn blank_emote_id_is_rejected_without_advancing() {
    let (service, _clock) = service();
    let result = service.write_emote("   ", &emote("wave", true));
    assert!(matches!(result, Err(WardrobeError::Validation(_))));
    assert_eq!(service.revision(), 0);
}

#[test]
fn started_at_follows_transition_rule() {
    let (service, clock) = service();

    service.write_emote("p", &emote("wave", true)).unwrap();
    let first = service.emote_snapshot().records[&id("p")].clone();

    clock.advance(Duration::from_secs(1));
    service.write_emote("p", &emote("wave", true)).unwrap();
    let second = service.emote_snapshot().records[&id("p")].clone();
    assert_eq!(second.started_at, first.started_at);
    assert!(second.last_seen > first.last_seen);

    clock.advance(Duration::from_secs(1));
    service.write_emote("p", &emote("dance", true)).unwrap();
    let third = service.emote_snapshot().records[&id("p")].clone();
    assert_eq!(third.started_at, START + 2_000);

    clock.advance(Duration::from_secs(1));
    service.write_emote("p", &emote("dance", false)).unwrap();
    clock.advance(Duration::from_secs(1));
    service.write_emote("p", &emote("dance", true)).unwrap();
    let fifth = service.emote_snapshot().records[&id("p")].clone();
    assert_eq!(fifth.started_at, START + 4_000);
}

#[test]
fn snapshot_carries_server_time() {
    let (service, clock) = service();
    clock.set(START + 42);
    assert_eq!(service.emote_snapshot().server_now, START + 42);
}

// =========================================================================
// Long-poll
// =========================================================================

#[tokio::test(start_paused = true)]
async fn behind_observer_resolves_immediately() {
    let (service, _clock) = service();
    service.write_emote("p", &emote("wave", true)).unwrap();

    let started = tokio::time::Instant::now();
    let snapshot = service.await_emote_changes_for(0, LONG_POLL).await;

    assert_eq!(started.elapsed(), Duration::ZERO);
    assert_eq!(snapshot.revision, 1);
    assert_eq!(service.pending_observers(), 0);
}

#[tokio::test(start_paused = true)]
async fn current_observer_resolves_only_by_timeout() {
    let (service, _clock) = service();
    service.write_emote("p", &emote("wave", true)).unwrap();

    let poll = spawn_poll(&service, 1);
    wait_for_observers(&service, 1).await;

    tokio::time::sleep(LONG_POLL - Duration::from_millis(100)).await;
    assert!(!poll.is_finished());

    let snapshot = poll.await.unwrap();
    assert_eq!(snapshot.revision, 1);
    assert_eq!(snapshot.records.len(), 1);
    assert_eq!(service.pending_observers(), 0);
}

#[tokio::test(start_paused = true)]
async fn observer_ahead_of_revision_is_not_woken_by_smaller_advance() {
    let (service, _clock) = service();

    // Observer claims to have seen revision 2 while the ledger is at 0.
    let poll = spawn_poll(&service, 2);
    wait_for_observers(&service, 1).await;

    service.write_emote("p", &emote("wave", true)).unwrap();
    service.write_emote("p", &emote("wave", true)).unwrap();
    tokio::task::yield_now().await;
    assert!(!poll.is_finished());

    service.write_emote("p", &emote("wave", true)).unwrap();
    let snapshot = poll.await.unwrap();
    assert_eq!(snapshot.revision, 3);
}

#[tokio::test(start_paused = true)]
async fn two_observers_both_receive_post_write_snapshot() {
    let (service, _clock) = service();

    let first = spawn_poll(&service, 0);
    let second = spawn_poll(&service, 0);
    wait_for_observers(&service, 2).await;

    service.write_emote("p", &emote("wave", true)).unwrap();

    let (a, b) = futures::join!(first, second);
    let (a, b) = (a.unwrap(), b.unwrap());
    assert_eq!(a.revision, 1);
    assert_eq!(a, b);
    assert_eq!(a.records[&id("p")].emote_type, "wave");
    assert_eq!(service.pending_observers(), 0);
}

#[tokio::test(start_paused = true)]
async fn back_to_back_writes_coalesce_into_latest_snapshot() {
    let (service, _clock) = service();

    let poll = spawn_poll(&service, 0);
    wait_for_observers(&service, 1).await;

    service.write_emote("p", &emote("wave", true)).unwrap();
    service.write_emote("q", &emote("dance", true)).unwrap();

    // The observer was resolved by the first write and removed; the
    // second write finds nobody waiting.
    let snapshot = poll.await.unwrap();
    assert_eq!(snapshot.revision, 1);

    // A client re-polling with what it saw gets the newer state at once.
    let next = service.await_emote_changes_for(snapshot.revision, LONG_POLL).await;
    assert_eq!(next.revision, 2);
    assert_eq!(next.records.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn disconnect_removes_observer() {
    let (service, _clock) = service();

    let poll = spawn_poll(&service, 0);
    wait_for_observers(&service, 1).await;

    poll.abort();
    assert!(poll.await.unwrap_err().is_cancelled());
    assert_eq!(service.pending_observers(), 0);

    // A later write has nobody to wake.
    service.write_emote("p", &emote("wave", true)).unwrap();
    assert_eq!(service.pending_observers(), 0);
}

#[tokio::test(start_paused = true)]
async fn configured_timeout_is_used() {
    let config = WardrobeConfig::parse("emotes:\n  long_poll_timeout_ms: 500\n").unwrap();
    let (service, _clock) = service_with(&config);

    let started = tokio::time::Instant::now();
    let snapshot = service.await_emote_changes(0).await;

    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(500), "{elapsed:?}");
    assert!(elapsed < Duration::from_secs(1), "{elapsed:?}");
    assert_eq!(snapshot.revision, 0);
}

// =========================================================================
// Eviction
// =========================================================================

#[tokio::test(start_paused = true)]
async fn eviction_is_silent_by_default() {
    let (service, clock) = service();
    service.write_emote("p", &emote("wave", true)).unwrap();
    clock.advance(Duration::from_secs(61));

    let snapshot = service.await_emote_changes_for(1, Duration::from_secs(1)).await;

    assert_eq!(snapshot.revision, 1);
    assert!(snapshot.records.is_empty());
}

#[tokio::test(start_paused = true)]
async fn eviction_notify_mode_advances_revision() {
    let config = WardrobeConfig::parse("emotes:\n  notify_on_eviction: true\n").unwrap();
    let (service, clock) = service_with(&config);
    service.write_emote("p", &emote("wave", true)).unwrap();

    let poll = spawn_poll(&service, 1);
    wait_for_observers(&service, 1).await;

    clock.advance(Duration::from_secs(61));
    let snapshot = service.emote_snapshot();
    assert_eq!(snapshot.revision, 2);
    assert!(snapshot.records.is_empty());

    let woken = poll.await.unwrap();
    assert_eq!(woken.revision, 2);
    assert!(woken.records.is_empty());
}

#[test]
fn inactive_and_active_records_share_one_ttl() {
    let config = WardrobeConfig::parse("emotes:\n  ttl_secs: 20\n").unwrap();
    let (service, clock) = service_with(&config);
    service.write_emote("on", &emote("wave", true)).unwrap();
    service.write_emote("off", &emote("wave", false)).unwrap();

    clock.advance(Duration::from_secs(20));
    assert_eq!(service.emote_snapshot().records.len(), 2);

    clock.advance(Duration::from_millis(1));
    assert!(service.emote_snapshot().records.is_empty());
}

// =========================================================================
// Capes
// =========================================================================

#[test]
fn cape_key_rules() {
    let (service, _clock) = service();
    let write = |key: &str| CapeWrite {
        client_key: Some(key.to_owned()),
        ..CapeWrite::default()
    };

    let short = service.write_cape("p", write(&"k".repeat(15)));
    assert!(matches!(short, Err(WardrobeError::Validation(_))));

    service.write_cape("p", write(&"k".repeat(16))).unwrap();

    let other = service.write_cape("p", write(&"x".repeat(16)));
    assert!(matches!(other, Err(WardrobeError::Auth(_))));

    assert_eq!(service.cape_snapshot().len(), 1);
}

#[test]
fn cape_writes_do_not_touch_emote_revision() {
    let (service, _clock) = service();
    let write = CapeWrite {
        client_key: Some("k".repeat(16)),
        ..CapeWrite::default()
    };
    service.write_cape("p", write).unwrap();
    assert_eq!(service.revision(), 0);
}

#[test]
fn capes_expire_after_a_week() {
    let (service, clock) = service();
    let write = CapeWrite {
        client_key: Some("k".repeat(16)),
        ..CapeWrite::default()
    };
    service.write_cape("p", write).unwrap();

    clock.advance(Duration::from_secs(7 * 24 * 60 * 60));
    assert_eq!(service.cape_snapshot().len(), 1);
    clock.advance(Duration::from_millis(1));
    assert!(service.cape_snapshot().is_empty());
}

// =========================================================================
// Persistence
// =========================================================================

#[tokio::test]
async fn writes_reach_the_store() {
    let store = Arc::new(MemoryStore::new());
    let (writer, _task) = SnapshotWriter::spawn(store.clone(), Duration::ZERO);
    let clock = Arc::new(ManualClock::new(START));
    let service = WardrobeService::new(&WardrobeConfig::default(), clock, writer);

    service.write_emote("p", &emote("wave", true)).unwrap();
    service
        .write_cape(
            "p",
            CapeWrite {
                client_key: Some("k".repeat(16)),
                ..CapeWrite::default()
            },
        )
        .unwrap();
    service.writer().flush().await;

    let saved = store.latest().unwrap();
    assert_eq!(saved.emotes_rev, 1);
    assert_eq!(saved.emotes.len(), 1);
    assert_eq!(saved.capes.len(), 1);
    assert_eq!(saved, service.persisted_state());
}

#[test]
fn restore_continues_revision() {
    let mut restored = PersistedState {
        emotes_rev: 10,
        ..PersistedState::default()
    };
    restored.emotes.insert(
        id("p"),
        wardrobe_types::EmoteRecord {
            name: String::new(),
            emote_type: String::from("wave"),
            active: true,
            started_at: START,
            last_seen: START,
        },
    );
    let store = MemoryStore::with_state(restored);
    let state = load_snapshot(&store);

    let clock = Arc::new(ManualClock::new(START));
    let service = WardrobeService::restore(
        &WardrobeConfig::default(),
        state,
        clock,
        SnapshotWriter::disabled(),
    );

    assert_eq!(service.emote_snapshot().records.len(), 1);
    assert_eq!(service.write_emote("p", &emote("wave", true)).unwrap(), 11);
}

#[test]
fn unreadable_snapshot_starts_empty() {
    struct Broken;
    impl SnapshotStore for Broken {
        fn load(&self) -> Result<Option<PersistedState>, wardrobe_db::DbError> {
            Err(wardrobe_db::DbError::Malformed("garbage".to_owned()))
        }
        fn save(&self, _state: &PersistedState) -> Result<(), wardrobe_db::DbError> {
            Ok(())
        }
    }

    assert_eq!(load_snapshot(&Broken), PersistedState::default());
}
