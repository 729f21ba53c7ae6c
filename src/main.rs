use std::sync::Arc;
use std::time::Duration;

use chrono::DateTime;
use reqwest::Client;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use skycast::config::AppConfig;
use skycast::display::{condition_glyph, format_temperature};
use skycast::store::{FileStorage, PreferenceStore};
use skycast::weather::{WeatherService, DEFAULT_HOURLY_LIMIT};

/// Shared HTTP client configuration
const HTTP_TIMEOUT_SECS: u64 = 30;
const HTTP_CONNECT_TIMEOUT_SECS: u64 = 5;
const HTTP_POOL_IDLE_TIMEOUT_SECS: u64 = 90;

/// Create shared HTTP client with connection pooling
fn create_http_client() -> Client {
    Client::builder()
        .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
        .connect_timeout(Duration::from_secs(HTTP_CONNECT_TIMEOUT_SECS))
        .pool_idle_timeout(Duration::from_secs(HTTP_POOL_IDLE_TIMEOUT_SECS))
        .build()
        .expect("Failed to create HTTP client")
}

fn format_hour(timestamp: i64) -> String {
    DateTime::from_timestamp(timestamp, 0)
        .map(|t| t.format("%H:%M").to_string())
        .unwrap_or_else(|| "--:--".to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "skycast=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load()?;
    tracing::info!("Configuration loaded successfully");

    // Restore preferences from the last session
    let storage = Arc::new(FileStorage::open(&config.preferences_path).await?);
    let store = PreferenceStore::new(storage);
    store.load().await;

    let service = WeatherService::new(create_http_client(), &config);

    let city = store.selected_city();
    let unit = store.temperature_unit();
    let generation = store.current_generation();

    // The three views are independent: issue them together and let each
    // degrade on its own.
    let (current, daily, hourly) = tokio::join!(
        service.fetch_current(&city, unit),
        service.fetch_daily_forecast(&city, unit),
        service.fetch_hourly_forecast(&city, unit, DEFAULT_HOURLY_LIMIT),
    );

    if !store.is_current(generation) {
        tracing::info!("selected city changed mid-fetch, discarding results");
        return Ok(());
    }

    match current {
        Some(snapshot) => {
            println!(
                "{} {}, {} — {} (feels like {}), {}",
                condition_glyph(&snapshot.weather.condition),
                snapshot.city,
                snapshot.country,
                format_temperature(snapshot.weather.temperature, unit),
                format_temperature(snapshot.weather.feels_like, unit),
                snapshot.weather.description,
            );
            println!(
                "   humidity {}%  wind {}  pressure {} hPa",
                snapshot.weather.humidity, snapshot.weather.wind_speed, snapshot.weather.pressure,
            );
        }
        None => println!("No current conditions available for {city}"),
    }

    if !hourly.is_empty() {
        println!("\nNext hours:");
        for entry in &hourly {
            println!(
                "  {}  {} {}  ({:.0}% precip)",
                format_hour(entry.timestamp),
                condition_glyph(&entry.condition),
                format_temperature(entry.temperature, unit),
                entry.pop * 100.0,
            );
        }
    }

    if !daily.is_empty() {
        println!("\nComing days:");
        for entry in &daily {
            println!(
                "  {}  {} {}  H: {}  L: {}",
                entry.date,
                condition_glyph(&entry.condition),
                entry.description,
                format_temperature(entry.temp.max, unit),
                format_temperature(entry.temp.min, unit),
            );
        }
    }

    // Make sure queued preference writes hit disk before exiting.
    store.flush().await;

    Ok(())
}
