use config::{Case, Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// OpenWeatherMap API key
    pub openweathermap_api_key: String,

    /// Base URL for the data API (current conditions and forecast)
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Base URL for the geocoding API
    #[serde(default = "default_geo_base_url")]
    pub geo_base_url: String,

    /// Path of the preference file
    #[serde(default = "default_preferences_path")]
    pub preferences_path: String,
}

fn default_api_base_url() -> String {
    "https://api.openweathermap.org/data/2.5".to_string()
}

fn default_geo_base_url() -> String {
    "https://api.openweathermap.org/geo/1.0".to_string()
}

fn default_preferences_path() -> String {
    "data/preferences.json".to_string()
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present
        let _ = dotenvy::dotenv();

        let config = Config::builder()
            .set_default("api_base_url", default_api_base_url())?
            .set_default("geo_base_url", default_geo_base_url())?
            .set_default("preferences_path", default_preferences_path())?
            // Load from config file if present
            .add_source(File::with_name("config").required(false))
            .add_source(File::with_name("config.local").required(false))
            // Override with environment variables (prefixed with SKYCAST_)
            .add_source(
                Environment::with_prefix("SKYCAST")
                    .prefix_separator("_")
                    .separator("__")
                    .convert_case(Case::Snake)
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
