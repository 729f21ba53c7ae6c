use chrono::{DateTime, FixedOffset, Local, NaiveDate, Offset, TimeZone, Timelike, Utc};
use indexmap::IndexMap;
use reqwest::Client;
use thiserror::Error;

use super::models::*;
use crate::config::AppConfig;

const ICON_URL_BASE: &str = "https://openweathermap.org/img/wn";

/// Number of 3-hour samples returned by default from the hourly view.
pub const DEFAULT_HOURLY_LIMIT: usize = 8;

/// Maximum geocoding matches requested per search.
const SEARCH_RESULT_LIMIT: usize = 5;

#[derive(Error, Debug)]
pub enum WeatherError {
    #[error("failed to fetch data: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API returned HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("invalid API response: {0}")]
    InvalidResponse(String),
}

/// Stateless client for the OpenWeatherMap current-conditions, 5-day/3-hour
/// forecast, and direct-geocoding endpoints.
///
/// Every public fetch degrades to `None` or an empty sequence on failure;
/// errors never escape to the caller. This is a best-effort display layer:
/// a screen composed of three independent calls must not fall over because
/// one of them failed.
pub struct WeatherService {
    client: Client,
    api_key: String,
    data_url: String,
    geo_url: String,
    /// UTC offset used to derive local calendar dates when bucketing.
    offset: FixedOffset,
}

impl WeatherService {
    pub fn new(client: Client, config: &AppConfig) -> Self {
        Self {
            client,
            api_key: config.openweathermap_api_key.clone(),
            data_url: config.api_base_url.clone(),
            geo_url: config.geo_base_url.clone(),
            offset: *Local::now().offset(),
        }
    }

    /// Construct against explicit base URLs with a fixed UTC offset.
    /// Used by tests to point the service at a mock server.
    pub fn with_base_urls(
        client: Client,
        api_key: &str,
        data_url: impl Into<String>,
        geo_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_key: api_key.to_string(),
            data_url: data_url.into(),
            geo_url: geo_url.into(),
            offset: Utc.fix(),
        }
    }

    /// Current conditions for a city, or `None` when anything goes wrong.
    pub async fn fetch_current(
        &self,
        city: &str,
        units: TemperatureUnit,
    ) -> Option<WeatherSnapshot> {
        match self.request_current(city, units).await {
            Ok(snapshot) => Some(snapshot),
            Err(err) => {
                tracing::warn!(city = %city, error = %err, "current conditions unavailable");
                None
            }
        }
    }

    async fn request_current(
        &self,
        city: &str,
        units: TemperatureUnit,
    ) -> Result<WeatherSnapshot, WeatherError> {
        tracing::debug!(city = %city, units = %units, "fetching current conditions");

        // Query builder handles URL encoding for city names with spaces.
        // The API key goes into the query string and must stay out of logs.
        let response = self
            .client
            .get(format!("{}/weather", self.data_url))
            .query(&[("q", city), ("units", units.as_str()), ("appid", &self.api_key)])
            .send()
            .await?;

        let status = response.status();
        tracing::debug!(status = %status, "received current conditions response");

        if !status.is_success() {
            return Err(WeatherError::Status(status));
        }

        let data: CurrentConditionsResponse = response.json().await?;
        map_current(data)
    }

    /// One forecast entry per calendar date covered by the provider's
    /// 3-hour timeseries, each the sample nearest local noon. Empty on
    /// failure, never an error.
    pub async fn fetch_daily_forecast(
        &self,
        city: &str,
        units: TemperatureUnit,
    ) -> Vec<DailyForecastEntry> {
        match self.request_forecast(city, units).await {
            Ok(samples) => bucket_daily(samples, self.offset),
            Err(err) => {
                tracing::warn!(city = %city, error = %err, "daily forecast unavailable");
                Vec::new()
            }
        }
    }

    /// First `limit` raw 3-hour samples, verbatim. Empty on failure.
    pub async fn fetch_hourly_forecast(
        &self,
        city: &str,
        units: TemperatureUnit,
        limit: usize,
    ) -> Vec<HourlyForecastEntry> {
        match self.request_forecast(city, units).await {
            Ok(samples) => samples
                .into_iter()
                .take(limit)
                .filter_map(hourly_entry)
                .collect(),
            Err(err) => {
                tracing::warn!(city = %city, error = %err, "hourly forecast unavailable");
                Vec::new()
            }
        }
    }

    async fn request_forecast(
        &self,
        city: &str,
        units: TemperatureUnit,
    ) -> Result<Vec<ForecastSample>, WeatherError> {
        tracing::debug!(city = %city, units = %units, "fetching forecast timeseries");

        let response = self
            .client
            .get(format!("{}/forecast", self.data_url))
            .query(&[("q", city), ("units", units.as_str()), ("appid", &self.api_key)])
            .send()
            .await?;

        let status = response.status();
        tracing::debug!(status = %status, "received forecast response");

        if !status.is_success() {
            return Err(WeatherError::Status(status));
        }

        let data: ForecastResponse = response.json().await?;
        Ok(data.list)
    }

    /// Geocoding lookup for a city name, capped at 5 matches.
    /// A blank query returns empty without touching the network.
    pub async fn search_cities(&self, query: &str) -> Vec<CitySearchResult> {
        if query.trim().is_empty() {
            return Vec::new();
        }

        match self.request_search(query).await {
            Ok(results) => results,
            Err(err) => {
                tracing::warn!(query = %query, error = %err, "city search failed");
                Vec::new()
            }
        }
    }

    async fn request_search(&self, query: &str) -> Result<Vec<CitySearchResult>, WeatherError> {
        tracing::debug!(query = %query, "searching cities");

        let limit = SEARCH_RESULT_LIMIT.to_string();
        let response = self
            .client
            .get(format!("{}/direct", self.geo_url))
            .query(&[("q", query), ("limit", &limit), ("appid", &self.api_key)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(WeatherError::Status(status));
        }

        let results: Vec<GeoResult> = response.json().await?;
        Ok(results.into_iter().map(Into::into).collect())
    }
}

/// Image URL for a provider icon code. Pure, no network.
pub fn icon_url(code: &str) -> String {
    format!("{ICON_URL_BASE}/{code}@2x.png")
}

fn map_current(data: CurrentConditionsResponse) -> Result<WeatherSnapshot, WeatherError> {
    // The first condition entry is authoritative.
    let condition = data.weather.first().ok_or_else(|| {
        WeatherError::InvalidResponse("no weather condition in response".to_string())
    })?;

    Ok(WeatherSnapshot {
        city: data.name,
        country: data.sys.country,
        coordinates: Coordinates {
            latitude: data.coord.lat,
            longitude: data.coord.lon,
        },
        weather: WeatherDetails {
            temperature: data.main.temp,
            feels_like: data.main.feels_like,
            condition: condition.main.clone(),
            description: condition.description.clone(),
            humidity: data.main.humidity,
            wind_speed: data.wind.speed,
            pressure: data.main.pressure,
            visibility: data.visibility,
            icon: condition.icon.clone(),
            sunrise: data.sys.sunrise,
            sunset: data.sys.sunset,
        },
        timestamp: data.dt,
    })
}

/// Group the 3-hour timeseries by local calendar date and keep the sample
/// whose hour is nearest 12:00 per date. Replacement requires a strictly
/// smaller distance, so the earliest sample wins ties. Output preserves the
/// order in which dates were first encountered.
fn bucket_daily(samples: Vec<ForecastSample>, offset: FixedOffset) -> Vec<DailyForecastEntry> {
    let mut by_date: IndexMap<NaiveDate, (i64, ForecastSample)> = IndexMap::new();

    for sample in samples {
        let Some(local) = local_time(sample.dt, offset) else {
            tracing::debug!(dt = sample.dt, "skipping sample with unrepresentable timestamp");
            continue;
        };
        let date = local.date_naive();
        let distance = (i64::from(local.hour()) - 12).abs();

        match by_date.get(&date) {
            Some((kept_distance, _)) if distance >= *kept_distance => {}
            _ => {
                by_date.insert(date, (distance, sample));
            }
        }
    }

    by_date
        .into_iter()
        .filter_map(|(date, (_, sample))| daily_entry(date, sample))
        .collect()
}

fn local_time(dt: i64, offset: FixedOffset) -> Option<DateTime<FixedOffset>> {
    offset.timestamp_opt(dt, 0).single()
}

fn daily_entry(date: NaiveDate, sample: ForecastSample) -> Option<DailyForecastEntry> {
    let Some(condition) = sample.weather.first() else {
        tracing::debug!(dt = sample.dt, "skipping sample with no weather condition");
        return None;
    };

    Some(DailyForecastEntry {
        date: date.format("%Y-%m-%d").to_string(),
        timestamp: sample.dt,
        temp: TemperatureRange {
            min: sample.main.temp_min,
            max: sample.main.temp_max,
            day: sample.main.temp,
            night: sample.main.temp,
        },
        condition: condition.main.clone(),
        description: condition.description.clone(),
        humidity: sample.main.humidity,
        wind_speed: sample.wind.speed,
        icon: condition.icon.clone(),
        pop: sample.pop,
    })
}

fn hourly_entry(sample: ForecastSample) -> Option<HourlyForecastEntry> {
    let Some(condition) = sample.weather.first() else {
        tracing::debug!(dt = sample.dt, "skipping sample with no weather condition");
        return None;
    };

    Some(HourlyForecastEntry {
        timestamp: sample.dt,
        temperature: sample.main.temp,
        condition: condition.main.clone(),
        icon: condition.icon.clone(),
        pop: sample.pop,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc() -> FixedOffset {
        Utc.fix()
    }

    fn sample(dt: i64, temp: f64) -> ForecastSample {
        ForecastSample {
            dt,
            main: SampleMain {
                temp,
                temp_min: temp - 2.0,
                temp_max: temp + 2.0,
                humidity: 60,
            },
            weather: vec![ConditionInfo {
                main: "Clouds".to_string(),
                description: "scattered clouds".to_string(),
                icon: "03d".to_string(),
            }],
            wind: WindInfo { speed: 4.2 },
            pop: 0.1,
        }
    }

    /// 2023-11-15 00:00:00 UTC
    const DAY_START: i64 = 1700006400;
    const HOUR: i64 = 3600;

    /// Standard provider shape: 40 samples, 3 hours apart, starting at
    /// midnight. Spans exactly 5 calendar dates.
    fn five_day_timeseries() -> Vec<ForecastSample> {
        (0..40)
            .map(|i| sample(DAY_START + i * 3 * HOUR, 10.0 + i as f64))
            .collect()
    }

    #[test]
    fn buckets_one_entry_per_date() {
        let entries = bucket_daily(five_day_timeseries(), utc());

        assert_eq!(entries.len(), 5);
        assert_eq!(entries[0].date, "2023-11-15");
        assert_eq!(entries[4].date, "2023-11-19");
    }

    #[test]
    fn picks_sample_nearest_noon() {
        let entries = bucket_daily(five_day_timeseries(), utc());

        // Samples land on hours 0,3,6,9,12,... so noon itself is present.
        for entry in &entries {
            let local = local_time(entry.timestamp, utc()).unwrap();
            assert_eq!(local.hour(), 12, "date {}", entry.date);
        }
    }

    #[test]
    fn bucketing_is_deterministic() {
        let first = bucket_daily(five_day_timeseries(), utc());
        let second = bucket_daily(five_day_timeseries(), utc());
        assert_eq!(first, second);
    }

    #[test]
    fn tie_breaks_to_first_seen_sample() {
        // Hours 10 and 14, both 2 hours from noon: the earlier one wins.
        let ten = sample(DAY_START + 10 * HOUR, 1.0);
        let fourteen = sample(DAY_START + 14 * HOUR, 2.0);

        let entries = bucket_daily(vec![ten, fourteen], utc());
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].timestamp, DAY_START + 10 * HOUR);
        assert_eq!(entries[0].temp.day, 1.0);
    }

    #[test]
    fn dates_keep_first_encounter_order() {
        // Second day appears before the first day in the source sequence.
        let late = sample(DAY_START + 24 * HOUR + 12 * HOUR, 1.0);
        let early = sample(DAY_START + 12 * HOUR, 2.0);

        let entries = bucket_daily(vec![late, early], utc());
        assert_eq!(entries[0].date, "2023-11-16");
        assert_eq!(entries[1].date, "2023-11-15");
    }

    #[test]
    fn bucketing_empty_input_yields_empty() {
        assert!(bucket_daily(Vec::new(), utc()).is_empty());
    }

    #[test]
    fn daily_entry_copies_instantaneous_temp_into_day_and_night() {
        let entries = bucket_daily(vec![sample(DAY_START + 12 * HOUR, 7.5)], utc());
        assert_eq!(entries[0].temp.day, 7.5);
        assert_eq!(entries[0].temp.night, 7.5);
        assert_eq!(entries[0].temp.min, 5.5);
        assert_eq!(entries[0].temp.max, 9.5);
    }

    #[test]
    fn sample_without_condition_is_dropped() {
        let mut bad = sample(DAY_START + 12 * HOUR, 7.5);
        bad.weather.clear();

        assert!(bucket_daily(vec![bad], utc()).is_empty());
    }

    #[test]
    fn map_current_requires_a_condition() {
        let data = CurrentConditionsResponse {
            name: "Calgary".to_string(),
            sys: SysInfo {
                country: "CA".to_string(),
                sunrise: 1700054000,
                sunset: 1700088000,
            },
            coord: RawCoord {
                lat: 51.05,
                lon: -114.07,
            },
            main: MainInfo {
                temp: -3.0,
                feels_like: -8.0,
                humidity: 70,
                pressure: 1021,
            },
            weather: Vec::new(),
            wind: WindInfo { speed: 6.0 },
            visibility: 10000,
            dt: 1700070000,
        };

        assert!(matches!(
            map_current(data),
            Err(WeatherError::InvalidResponse(_))
        ));
    }

    #[test]
    fn icon_url_points_at_provider_assets() {
        assert_eq!(
            icon_url("10d"),
            "https://openweathermap.org/img/wn/10d@2x.png"
        );
    }
}
