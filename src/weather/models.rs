use std::fmt;

use serde::{Deserialize, Serialize};

/// Temperature unit for API requests and display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Metric,
    Imperial,
}

impl TemperatureUnit {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Metric => "metric",
            Self::Imperial => "imperial",
        }
    }

    /// Parse the raw string form used in durable storage.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "metric" => Some(Self::Metric),
            "imperial" => Some(Self::Imperial),
            _ => None,
        }
    }

    /// Display suffix for temperatures in this unit.
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Metric => "°C",
            Self::Imperial => "°F",
        }
    }
}

impl fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lon")]
    pub longitude: f64,
}

// ============================================================================
// Domain records returned to callers
// ============================================================================

/// Immutable point-in-time weather reading for one city.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherSnapshot {
    pub city: String,
    pub country: String,
    pub coordinates: Coordinates,
    pub weather: WeatherDetails,
    /// Observation time, epoch seconds, taken verbatim from the provider.
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherDetails {
    pub temperature: f64,
    pub feels_like: f64,
    /// Condition category, e.g. "Clouds"
    pub condition: String,
    pub description: String,
    pub humidity: u32,
    pub wind_speed: f64,
    pub pressure: u32,
    pub visibility: u32,
    pub icon: String,
    pub sunrise: i64,
    pub sunset: i64,
}

/// One representative forecast per calendar date, selected from the raw
/// 3-hour timeseries (nearest to local noon).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyForecastEntry {
    /// ISO calendar date of the representative sample
    pub date: String,
    pub timestamp: i64,
    pub temp: TemperatureRange,
    pub condition: String,
    pub description: String,
    pub humidity: u32,
    pub wind_speed: f64,
    pub icon: String,
    /// Probability of precipitation, 0 when absent upstream
    pub pop: f64,
}

/// The 3-hour forecast endpoint carries no true day/night split, so `day`
/// and `night` both hold the representative sample's instantaneous reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TemperatureRange {
    pub min: f64,
    pub max: f64,
    pub day: f64,
    pub night: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyForecastEntry {
    pub timestamp: i64,
    pub temperature: f64,
    pub condition: String,
    pub icon: String,
    pub pop: f64,
}

/// Geocoding match for a search query. Ephemeral, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CitySearchResult {
    pub name: String,
    pub country: String,
    pub state: Option<String>,
    pub coordinates: Coordinates,
}

// ============================================================================
// Raw OpenWeatherMap responses (internal)
// Deserialization is fail-closed: a missing required field is treated the
// same as a failed request.
// ============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct CurrentConditionsResponse {
    pub name: String,
    pub sys: SysInfo,
    pub coord: RawCoord,
    pub main: MainInfo,
    pub weather: Vec<ConditionInfo>,
    pub wind: WindInfo,
    #[serde(default)]
    pub visibility: u32,
    pub dt: i64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SysInfo {
    pub country: String,
    pub sunrise: i64,
    pub sunset: i64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawCoord {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MainInfo {
    pub temp: f64,
    pub feels_like: f64,
    pub humidity: u32,
    pub pressure: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ConditionInfo {
    pub main: String,
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WindInfo {
    pub speed: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ForecastResponse {
    pub list: Vec<ForecastSample>,
}

/// One 3-hour sample of the 5-day forecast timeseries.
#[derive(Debug, Deserialize)]
pub(crate) struct ForecastSample {
    pub dt: i64,
    pub main: SampleMain,
    pub weather: Vec<ConditionInfo>,
    pub wind: WindInfo,
    #[serde(default)]
    pub pop: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SampleMain {
    pub temp: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub humidity: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GeoResult {
    pub name: String,
    pub country: String,
    pub state: Option<String>,
    pub lat: f64,
    pub lon: f64,
}

impl From<GeoResult> for CitySearchResult {
    fn from(raw: GeoResult) -> Self {
        CitySearchResult {
            name: raw.name,
            country: raw.country,
            state: raw.state,
            coordinates: Coordinates {
                latitude: raw.lat,
                longitude: raw.lon,
            },
        }
    }
}
