mod models;
mod service;

pub use models::{
    CitySearchResult, Coordinates, DailyForecastEntry, HourlyForecastEntry, TemperatureRange,
    TemperatureUnit, WeatherDetails, WeatherSnapshot,
};
pub use service::{icon_url, WeatherError, WeatherService, DEFAULT_HOURLY_LIMIT};
