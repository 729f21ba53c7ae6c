use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::{mpsc, oneshot};

use super::models::SavedLocation;
use super::storage::KeyValueStorage;
use crate::weather::TemperatureUnit;

pub const SAVED_LOCATIONS_KEY: &str = "weather_saved_locations";
pub const TEMPERATURE_UNIT_KEY: &str = "weather_temperature_unit";
pub const RECENT_SEARCHES_KEY: &str = "weather_recent_searches";
pub const SELECTED_CITY_KEY: &str = "weather_selected_city";

const RECENT_SEARCH_CAP: usize = 10;
const DEFAULT_CITY: &str = "Calgary";

enum WriteRequest {
    Persist { key: &'static str, payload: String },
    Flush(oneshot::Sender<()>),
}

#[derive(Debug)]
struct Slices {
    saved_locations: Vec<SavedLocation>,
    temperature_unit: TemperatureUnit,
    recent_searches: Vec<String>,
    selected_city: String,
}

impl Default for Slices {
    fn default() -> Self {
        Self {
            saved_locations: Vec::new(),
            temperature_unit: TemperatureUnit::default(),
            recent_searches: Vec::new(),
            selected_city: DEFAULT_CITY.to_string(),
        }
    }
}

/// Process-wide preference state: saved locations, temperature unit, recent
/// searches, and the selected city.
///
/// Mutations are synchronous against the in-memory slices; each mutation
/// enqueues a durable write that a single background task applies in FIFO
/// order, so writes to one key can never interleave. Write failures are
/// logged and dropped; the in-memory value stays authoritative for the rest
/// of the session.
///
/// The store starts in a loading state with compiled-in defaults and becomes
/// ready once [`PreferenceStore::load`] finishes, whether or not every slice
/// could be read back. The transition is one-way.
pub struct PreferenceStore {
    storage: Arc<dyn KeyValueStorage>,
    slices: RwLock<Slices>,
    ready: AtomicBool,
    generation: AtomicU64,
    tx: mpsc::UnboundedSender<WriteRequest>,
}

impl PreferenceStore {
    /// Construct the store and spawn its writer task. Must be called from
    /// within a tokio runtime.
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_writer(Arc::clone(&storage), rx));

        Self {
            storage,
            slices: RwLock::new(Slices::default()),
            ready: AtomicBool::new(false),
            generation: AtomicU64::new(0),
            tx,
        }
    }

    /// Read every persisted slice back from storage, then mark the store
    /// ready. A slice that is missing, unreadable, or unparseable stays at
    /// its default; it never blocks the others. The selected city is applied
    /// last so a stored value cannot be clobbered by the default.
    pub async fn load(&self) {
        if let Some(raw) = self.read_slice(SAVED_LOCATIONS_KEY).await {
            match serde_json::from_str(&raw) {
                Ok(locations) => self.slices.write().saved_locations = locations,
                Err(err) => {
                    tracing::warn!(error = %err, "stored locations unreadable, keeping defaults");
                }
            }
        }

        if let Some(raw) = self.read_slice(TEMPERATURE_UNIT_KEY).await {
            match TemperatureUnit::parse(&raw) {
                Some(unit) => self.slices.write().temperature_unit = unit,
                None => {
                    tracing::warn!(value = %raw, "unknown stored temperature unit, keeping default");
                }
            }
        }

        if let Some(raw) = self.read_slice(RECENT_SEARCHES_KEY).await {
            match serde_json::from_str(&raw) {
                Ok(searches) => self.slices.write().recent_searches = searches,
                Err(err) => {
                    tracing::warn!(error = %err, "stored searches unreadable, keeping defaults");
                }
            }
        }

        if let Some(city) = self.read_slice(SELECTED_CITY_KEY).await {
            self.slices.write().selected_city = city;
        }

        self.ready.store(true, Ordering::Release);

        let slices = self.slices.read();
        tracing::info!(
            locations = slices.saved_locations.len(),
            searches = slices.recent_searches.len(),
            unit = %slices.temperature_unit,
            city = %slices.selected_city,
            "preference store ready"
        );
    }

    async fn read_slice(&self, key: &'static str) -> Option<String> {
        match self.storage.get(key).await {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(key, error = %err, "failed to read preference slice");
                None
            }
        }
    }

    /// True once the initial load has completed.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    // ------------------------------------------------------------------
    // Saved locations
    // ------------------------------------------------------------------

    pub fn saved_locations(&self) -> Vec<SavedLocation> {
        self.slices.read().saved_locations.clone()
    }

    /// Upsert by id: an existing entry with the same id is replaced.
    pub fn add_location(&self, location: SavedLocation) {
        let payload = {
            let mut slices = self.slices.write();
            slices.saved_locations.retain(|loc| loc.id != location.id);
            slices.saved_locations.push(location);
            serde_json::to_string(&slices.saved_locations)
        };
        self.enqueue(SAVED_LOCATIONS_KEY, payload);
    }

    /// Remove the entry with the given id; no-op when absent.
    pub fn remove_location(&self, id: &str) {
        let payload = {
            let mut slices = self.slices.write();
            slices.saved_locations.retain(|loc| loc.id != id);
            serde_json::to_string(&slices.saved_locations)
        };
        self.enqueue(SAVED_LOCATIONS_KEY, payload);
    }

    pub fn clear_locations(&self) {
        let payload = {
            let mut slices = self.slices.write();
            slices.saved_locations.clear();
            serde_json::to_string(&slices.saved_locations)
        };
        self.enqueue(SAVED_LOCATIONS_KEY, payload);
    }

    // ------------------------------------------------------------------
    // Temperature unit
    // ------------------------------------------------------------------

    pub fn temperature_unit(&self) -> TemperatureUnit {
        self.slices.read().temperature_unit
    }

    pub fn set_temperature_unit(&self, unit: TemperatureUnit) {
        self.slices.write().temperature_unit = unit;
        self.enqueue(TEMPERATURE_UNIT_KEY, Ok(unit.as_str().to_string()));
    }

    // ------------------------------------------------------------------
    // Recent searches
    // ------------------------------------------------------------------

    pub fn recent_searches(&self) -> Vec<String> {
        self.slices.read().recent_searches.clone()
    }

    /// Prepend a city, dropping any prior occurrence and capping at 10.
    pub fn add_recent_search(&self, city: &str) {
        let payload = {
            let mut slices = self.slices.write();
            slices.recent_searches.retain(|entry| entry != city);
            slices.recent_searches.insert(0, city.to_string());
            slices.recent_searches.truncate(RECENT_SEARCH_CAP);
            serde_json::to_string(&slices.recent_searches)
        };
        self.enqueue(RECENT_SEARCHES_KEY, payload);
    }

    pub fn clear_recent_searches(&self) {
        let payload = {
            let mut slices = self.slices.write();
            slices.recent_searches.clear();
            serde_json::to_string(&slices.recent_searches)
        };
        self.enqueue(RECENT_SEARCHES_KEY, payload);
    }

    // ------------------------------------------------------------------
    // Selected city
    // ------------------------------------------------------------------

    pub fn selected_city(&self) -> String {
        self.slices.read().selected_city.clone()
    }

    /// Change the selected city. Bumps the fetch generation so callers can
    /// discard in-flight results for the previous city.
    pub fn set_selected_city(&self, city: &str) {
        self.slices.write().selected_city = city.to_string();
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.enqueue(SELECTED_CITY_KEY, Ok(city.to_string()));
    }

    /// Generation token to snapshot before issuing fetches for the selected
    /// city. Fetches are never cancelled; a result whose token is no longer
    /// current should be discarded by the caller.
    pub fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::Acquire) == generation
    }

    // ------------------------------------------------------------------
    // Persistence plumbing
    // ------------------------------------------------------------------

    fn enqueue(&self, key: &'static str, payload: Result<String, serde_json::Error>) {
        match payload {
            Ok(payload) => {
                if self
                    .tx
                    .send(WriteRequest::Persist { key, payload })
                    .is_err()
                {
                    tracing::warn!(key, "preference writer is gone, change not persisted");
                }
            }
            Err(err) => {
                tracing::warn!(key, error = %err, "failed to serialize preference slice");
            }
        }
    }

    /// Wait until every write enqueued so far has been applied. Mutators
    /// never call this; it exists for shutdown and tests.
    pub async fn flush(&self) {
        let (ack, done) = oneshot::channel();
        if self.tx.send(WriteRequest::Flush(ack)).is_ok() {
            let _ = done.await;
        }
    }
}

async fn run_writer(
    storage: Arc<dyn KeyValueStorage>,
    mut rx: mpsc::UnboundedReceiver<WriteRequest>,
) {
    while let Some(request) = rx.recv().await {
        match request {
            WriteRequest::Persist { key, payload } => {
                // No retry: the in-memory slice stays authoritative and the
                // next mutation writes the full slice again anyway.
                if let Err(err) = storage.set(key, &payload).await {
                    tracing::warn!(key, error = %err, "failed to persist preference slice");
                }
            }
            WriteRequest::Flush(ack) => {
                let _ = ack.send(());
            }
        }
    }
    tracing::debug!("preference writer stopped");
}
