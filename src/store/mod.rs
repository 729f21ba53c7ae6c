mod models;
mod service;
mod storage;

pub use models::SavedLocation;
pub use service::{
    PreferenceStore, RECENT_SEARCHES_KEY, SAVED_LOCATIONS_KEY, SELECTED_CITY_KEY,
    TEMPERATURE_UNIT_KEY,
};
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage, StorageError};
