//! Weather record types

use serde::{Serialize, Serializer};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};
use std::fmt;

/// Fixed-point decimal with one fractional digit, stored as a count of tenths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Tenths(i64);

impl Tenths {
    pub const fn new(tenths: i64) -> Self {
        Self(tenths)
    }

    /// Raw count of tenths
    pub const fn tenths(self) -> i64 {
        self.0
    }

    pub fn as_f64(self) -> f64 {
        self.0 as f64 / 10.0
    }
}

impl fmt::Display for Tenths {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{}", sign, abs / 10, abs % 10)
    }
}

// Serialized as a plain JSON number so clients see `18.5`, not `185`.
impl Serialize for Tenths {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

/// Cached weather record as persisted in the `clima` table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherRecord {
    pub id: i64,
    /// Exact-match lookup key, e.g. `"Madrid,es"`
    pub query: String,
    /// Status mirrored into the response body
    pub status_code: i64,
    pub description: String,
    pub icon_code: String,
    pub temperature: Tenths,
    /// Relative humidity (%)
    pub humidity: i64,
    pub wind_speed: Tenths,
    pub display_name: String,
    pub country_code: String,
}

impl<'r> FromRow<'r, SqliteRow> for WeatherRecord {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            query: row.try_get("query")?,
            status_code: row.try_get("cod")?,
            description: row.try_get("weather_desc")?,
            icon_code: row.try_get("weather_icon")?,
            temperature: Tenths::new(row.try_get("main_temp_tenths")?),
            humidity: row.try_get("main_humidity")?,
            wind_speed: Tenths::new(row.try_get("wind_speed_tenths")?),
            display_name: row.try_get("name")?,
            country_code: row.try_get("sys_country")?,
        })
    }
}

/// Record to be inserted; the id is assigned by the database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWeatherRecord {
    pub query: String,
    pub status_code: i64,
    pub description: String,
    pub icon_code: String,
    pub temperature: Tenths,
    pub humidity: i64,
    pub wind_speed: Tenths,
    pub display_name: String,
    pub country_code: String,
}

impl NewWeatherRecord {
    /// New record with the default status code of 200
    pub fn new(query: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            status_code: 200,
            description: String::new(),
            icon_code: String::new(),
            temperature: Tenths::default(),
            humidity: 0,
            wind_speed: Tenths::default(),
            display_name: display_name.into(),
            country_code: String::new(),
        }
    }

    pub fn with_condition(mut self, description: impl Into<String>, icon_code: impl Into<String>) -> Self {
        self.description = description.into();
        self.icon_code = icon_code.into();
        self
    }

    pub fn with_readings(mut self, temperature: Tenths, humidity: i64, wind_speed: Tenths) -> Self {
        self.temperature = temperature;
        self.humidity = humidity;
        self.wind_speed = wind_speed;
        self
    }

    pub fn with_country(mut self, country_code: impl Into<String>) -> Self {
        self.country_code = country_code.into();
        self
    }
}
