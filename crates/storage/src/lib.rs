//! Storage Layer
//!
//! Provides SQLite persistence for cached weather records with repository pattern.

mod record;
mod repository;
mod seed;

pub use record::{NewWeatherRecord, Tenths, WeatherRecord};
pub use repository::{StorageConfig, WeatherRepository};
pub use seed::{initialize, seed_records, SeedOutcome};

use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("A record for query {0:?} already exists")]
    DuplicateQuery(String),
    #[error("Invalid record: {0}")]
    InvalidRecord(String),
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        StorageError::DatabaseError(err.to_string())
    }
}
