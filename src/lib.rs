//! Weather lookup client for OpenWeatherMap.
//!
//! Two independent components:
//! - [`weather::WeatherService`] fetches current conditions, daily and hourly
//!   forecasts, and city search results, normalizing provider responses into
//!   stable domain records. Failures degrade to `None`/empty, never panic.
//! - [`store::PreferenceStore`] holds saved locations, the temperature unit,
//!   recent searches, and the selected city, persisting each slice through an
//!   asynchronous key-value capability.
//!
//! The binary in `main.rs` composes the two; the library keeps them apart.

pub mod config;
pub mod display;
pub mod store;
pub mod weather;
