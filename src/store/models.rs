use serde::{Deserialize, Serialize};

use crate::weather::{CitySearchResult, Coordinates};

/// A city the user chose to keep. Persisted as part of the saved-locations
/// slice; field names match the stored JSON shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedLocation {
    /// Composite key, `"{lat}-{lon}"`. At most one entry per id is kept.
    pub id: String,
    pub city: String,
    pub country: String,
    pub coordinates: Coordinates,
    pub is_favorite: bool,
    /// When the location was added, epoch milliseconds.
    pub added_at: i64,
}

impl SavedLocation {
    pub fn key_for(latitude: f64, longitude: f64) -> String {
        format!("{latitude}-{longitude}")
    }

    /// Build a location from a geocoding match, the way selecting a search
    /// result does.
    pub fn from_search(result: &CitySearchResult, added_at: i64) -> Self {
        Self {
            id: Self::key_for(result.coordinates.latitude, result.coordinates.longitude),
            city: result.name.clone(),
            country: result.country.clone(),
            coordinates: result.coordinates,
            is_favorite: false,
            added_at,
        }
    }
}
