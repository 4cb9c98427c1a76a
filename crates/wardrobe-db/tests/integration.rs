//! End-to-end persistence tests: the background writer saving through a
//! real file store, and the file store reading documents written by
//! earlier deployments.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use wardrobe_db::{JsonFileStore, PersistedState, SnapshotStore, SnapshotWriter};
use wardrobe_types::{CapeRecord, EmoteRecord, PlayerId};

fn id(raw: &str) -> PlayerId {
    PlayerId::parse(raw).unwrap()
}

fn sample_state(revision: u64) -> PersistedState {
    let mut state = PersistedState {
        emotes_rev: revision,
        ..PersistedState::default()
    };
    state.capes.insert(
        id("player-1"),
        CapeRecord {
            name: "Steve".to_owned(),
            cape_id: "red".to_owned(),
            custom_url: String::new(),
            enabled: true,
            client_key: "0123456789abcdef".to_owned(),
            last_seen: 1_700_000_000_000,
        },
    );
    state.emotes.insert(
        id("player-1"),
        EmoteRecord {
            name: "Steve".to_owned(),
            emote_type: "wave".to_owned(),
            active: true,
            started_at: 1_700_000_000_000,
            last_seen: 1_700_000_000_500,
        },
    );
    state
}

#[tokio::test]
async fn writer_persists_newest_document_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data").join("wardrobe.json");
    let store = Arc::new(JsonFileStore::new(&path));

    let (writer, task) = SnapshotWriter::spawn(store.clone(), Duration::ZERO);
    writer.submit(sample_state(1));
    writer.submit(sample_state(2));
    writer.flush().await;

    let loaded = store.load().unwrap().unwrap();
    assert_eq!(loaded, sample_state(2));
    assert!(!dir.path().join("data").join("wardrobe.json.tmp").exists());

    drop(writer);
    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .unwrap()
        .unwrap();
}

#[test]
fn missing_and_empty_files_load_as_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wardrobe.json");
    let store = JsonFileStore::new(&path);
    assert!(store.load().unwrap().is_none());

    std::fs::write(&path, "  \n").unwrap();
    assert!(store.load().unwrap().is_none());
}

#[test]
fn corrupt_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wardrobe.json");
    std::fs::write(&path, "{ not json").unwrap();
    assert!(JsonFileStore::new(&path).load().is_err());
}

#[test]
fn legacy_cape_only_file_loads() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wardrobe.json");
    std::fs::write(
        &path,
        r#"{
            "player-1": {
                "name": "Steve",
                "capeId": "red",
                "enabled": true,
                "clientKey": "0123456789abcdef",
                "lastSeen": 1700000000000
            }
        }"#,
    )
    .unwrap();

    let loaded = JsonFileStore::new(&path).load().unwrap().unwrap();
    assert_eq!(loaded.capes.len(), 1);
    assert_eq!(loaded.capes[&id("player-1")].cape_id, "red");
    assert!(loaded.emotes.is_empty());
    assert_eq!(loaded.emotes_rev, 0);
}

#[test]
fn saved_file_uses_current_layout() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wardrobe.json");
    JsonFileStore::new(&path).save(&sample_state(7)).unwrap();

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw["emotesRev"], 7);
    assert_eq!(raw["capes"]["player-1"]["clientKey"], "0123456789abcdef");
    assert_eq!(raw["emotes"]["player-1"]["type"], "wave");
    assert_eq!(raw["emotes"]["player-1"]["startedAt"], 1_700_000_000_000_i64);
}
