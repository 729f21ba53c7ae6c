//! Presentation helpers shared by whatever renders the domain records.

use crate::weather::TemperatureUnit;

/// Glyph for an OpenWeatherMap condition category.
pub fn condition_glyph(condition: &str) -> &'static str {
    match condition.to_lowercase().as_str() {
        "clear" => "☀️",
        "clouds" => "☁️",
        "rain" => "🌧️",
        "drizzle" => "🌦️",
        "snow" => "❄️",
        "thunderstorm" => "⛈️",
        "mist" | "smoke" | "haze" | "dust" | "fog" | "sand" => "🌫️",
        "ash" => "🌋",
        "squall" => "💨",
        "tornado" => "🌪️",
        _ => "☀️",
    }
}

/// Round to the nearest whole degree and attach the unit suffix.
pub fn format_temperature(value: f64, unit: TemperatureUnit) -> String {
    format!("{}{}", value.round() as i64, unit.suffix())
}
