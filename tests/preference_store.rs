//! Preference store lifecycle against real file-backed storage.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tempfile::TempDir;

use skycast::store::{
    FileStorage, KeyValueStorage, PreferenceStore, SavedLocation, StorageError,
    RECENT_SEARCHES_KEY, SAVED_LOCATIONS_KEY, TEMPERATURE_UNIT_KEY,
};
use skycast::weather::{Coordinates, TemperatureUnit};

fn prefs_path(dir: &TempDir) -> PathBuf {
    dir.path().join("preferences.json")
}

async fn store_at(path: &PathBuf) -> PreferenceStore {
    let storage = Arc::new(FileStorage::open(path.clone()).await.unwrap());
    PreferenceStore::new(storage)
}

fn calgary() -> SavedLocation {
    SavedLocation {
        id: "51.05--114.07".to_string(),
        city: "Calgary".to_string(),
        country: "CA".to_string(),
        coordinates: Coordinates {
            latitude: 51.05,
            longitude: -114.07,
        },
        is_favorite: false,
        added_at: 1_700_000_000_000,
    }
}

#[tokio::test]
async fn fresh_store_loads_defaults_and_becomes_ready() {
    let dir = TempDir::new().unwrap();
    let store = store_at(&prefs_path(&dir)).await;

    assert!(!store.is_ready());
    store.load().await;

    assert!(store.is_ready());
    assert_eq!(store.temperature_unit(), TemperatureUnit::Metric);
    assert_eq!(store.selected_city(), "Calgary");
    assert!(store.saved_locations().is_empty());
    assert!(store.recent_searches().is_empty());
}

#[tokio::test]
async fn mutations_survive_a_restart() {
    let dir = TempDir::new().unwrap();
    let path = prefs_path(&dir);

    let store = store_at(&path).await;
    store.load().await;

    store.add_location(calgary());
    store.set_temperature_unit(TemperatureUnit::Imperial);
    store.add_recent_search("Oslo");
    store.add_recent_search("Rome");
    store.set_selected_city("Oslo");
    store.flush().await;

    let restarted = store_at(&path).await;
    restarted.load().await;

    assert_eq!(restarted.saved_locations(), vec![calgary()]);
    assert_eq!(restarted.temperature_unit(), TemperatureUnit::Imperial);
    assert_eq!(restarted.recent_searches(), vec!["Rome", "Oslo"]);
    assert_eq!(restarted.selected_city(), "Oslo");
}

#[tokio::test]
async fn clearing_the_last_item_survives_a_restart() {
    let dir = TempDir::new().unwrap();
    let path = prefs_path(&dir);

    let store = store_at(&path).await;
    store.load().await;
    store.add_location(calgary());
    store.add_recent_search("Oslo");
    store.flush().await;

    store.clear_locations();
    store.clear_recent_searches();
    store.flush().await;

    let restarted = store_at(&path).await;
    restarted.load().await;

    assert!(restarted.saved_locations().is_empty());
    assert!(restarted.recent_searches().is_empty());
}

#[tokio::test]
async fn corrupted_slice_leaves_only_that_slice_at_default() {
    let dir = TempDir::new().unwrap();
    let path = prefs_path(&dir);

    let mut entries = HashMap::new();
    entries.insert(RECENT_SEARCHES_KEY.to_string(), "not json".to_string());
    entries.insert(TEMPERATURE_UNIT_KEY.to_string(), "imperial".to_string());
    std::fs::write(&path, serde_json::to_string(&entries).unwrap()).unwrap();

    let store = store_at(&path).await;
    store.load().await;

    assert!(store.is_ready());
    assert!(store.recent_searches().is_empty());
    assert_eq!(store.temperature_unit(), TemperatureUnit::Imperial);
}

#[tokio::test]
async fn unknown_stored_unit_falls_back_to_metric() {
    let dir = TempDir::new().unwrap();
    let path = prefs_path(&dir);

    let mut entries = HashMap::new();
    entries.insert(TEMPERATURE_UNIT_KEY.to_string(), "kelvin".to_string());
    std::fs::write(&path, serde_json::to_string(&entries).unwrap()).unwrap();

    let store = store_at(&path).await;
    store.load().await;

    assert_eq!(store.temperature_unit(), TemperatureUnit::Metric);
}

#[tokio::test]
async fn upsert_round_trips_through_disk() {
    let dir = TempDir::new().unwrap();
    let path = prefs_path(&dir);

    let store = store_at(&path).await;
    store.load().await;

    store.add_location(calgary());
    let mut renamed = calgary();
    renamed.city = "Cowtown".to_string();
    store.add_location(renamed);
    store.flush().await;

    let restarted = store_at(&path).await;
    restarted.load().await;

    let locations = restarted.saved_locations();
    assert_eq!(locations.len(), 1);
    assert_eq!(locations[0].city, "Cowtown");
}

/// Storage whose writes always fail; reads see nothing.
struct BrokenStorage;

#[async_trait]
impl KeyValueStorage for BrokenStorage {
    async fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            "disk full",
        )))
    }

    async fn remove(&self, _key: &str) -> Result<(), StorageError> {
        Ok(())
    }
}

#[tokio::test]
async fn write_failures_leave_memory_authoritative() {
    let store = PreferenceStore::new(Arc::new(BrokenStorage));
    store.load().await;

    store.add_location(calgary());
    store.set_selected_city("Oslo");
    store.flush().await;

    // Every durable write failed, but the session state is intact.
    assert_eq!(store.saved_locations().len(), 1);
    assert_eq!(store.selected_city(), "Oslo");
}

#[tokio::test]
async fn stored_locations_use_the_documented_json_shape() {
    let dir = TempDir::new().unwrap();
    let path = prefs_path(&dir);

    let store = store_at(&path).await;
    store.load().await;
    store.add_location(calgary());
    store.flush().await;

    let content = std::fs::read_to_string(&path).unwrap();
    let entries: HashMap<String, String> = serde_json::from_str(&content).unwrap();
    let raw = entries.get(SAVED_LOCATIONS_KEY).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(raw).unwrap();

    assert_eq!(parsed[0]["id"], "51.05--114.07");
    assert_eq!(parsed[0]["isFavorite"], false);
    assert_eq!(parsed[0]["coordinates"]["lat"], 51.05);
}
