//! Weather Routes

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use storage::{Tenths, WeatherRecord};
use tracing::debug;

use crate::error::ApiError;
use crate::AppState;

/// Query parameters for weather endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherQuery {
    /// Exact lookup key, e.g. `Madrid,es`
    pub q: String,
}

impl WeatherQuery {
    /// Pick `q` out of decoded query pairs. When repeated, the last value wins.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Option<Self> {
        pairs
            .into_iter()
            .rev()
            .find(|(key, _)| key == "q")
            .map(|(_, q)| Self { q })
    }
}

/// Response for weather endpoint.
///
/// A miss is still served with HTTP 200; only the body carries `cod: 404`.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum WeatherResponse {
    Found(WeatherReport),
    NotFound(NotFoundBody),
}

#[derive(Debug, Serialize)]
pub struct WeatherReport {
    pub cod: i64,
    pub weather: Vec<Condition>,
    pub main: MainReadings,
    pub wind: Wind,
    pub name: String,
    pub sys: Sys,
}

#[derive(Debug, Serialize)]
pub struct Condition {
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Serialize)]
pub struct MainReadings {
    pub temp: Tenths,
    pub humidity: i64,
}

#[derive(Debug, Serialize)]
pub struct Wind {
    pub speed: Tenths,
}

#[derive(Debug, Serialize)]
pub struct Sys {
    pub country: String,
}

#[derive(Debug, Serialize)]
pub struct NotFoundBody {
    pub cod: i64,
    pub message: &'static str,
}

impl WeatherResponse {
    pub fn not_found() -> Self {
        WeatherResponse::NotFound(NotFoundBody {
            cod: 404,
            message: "city not found",
        })
    }
}

impl From<WeatherRecord> for WeatherReport {
    fn from(record: WeatherRecord) -> Self {
        Self {
            cod: record.status_code,
            weather: vec![Condition {
                description: record.description,
                icon: record.icon_code,
            }],
            main: MainReadings {
                temp: record.temperature,
                humidity: record.humidity,
            },
            wind: Wind {
                speed: record.wind_speed,
            },
            name: record.display_name,
            sys: Sys {
                country: record.country_code,
            },
        }
    }
}

/// Get cached weather for a city
pub async fn get_weather(
    State(state): State<Arc<AppState>>,
    pairs: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<WeatherResponse>, ApiError> {
    let Query(pairs) = pairs.map_err(|rejection| ApiError::InvalidQuery(rejection.body_text()))?;
    let params = WeatherQuery::from_pairs(pairs).ok_or(ApiError::MissingParameter("q"))?;

    let response = match state.repository.find_by_query(&params.q).await? {
        Some(record) => {
            metrics::counter!("weather_lookups_total", "outcome" => "found").increment(1);
            WeatherResponse::Found(record.into())
        }
        None => {
            debug!("No weather record for query {:?}", params.q);
            metrics::counter!("weather_lookups_total", "outcome" => "not_found").increment(1);
            WeatherResponse::not_found()
        }
    };

    Ok(Json(response))
}
