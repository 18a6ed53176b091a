//! One-time schema setup and seeding

use crate::record::{NewWeatherRecord, Tenths};
use crate::repository::WeatherRepository;
use crate::StorageError;
use tracing::info;

/// Result of [`initialize`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    /// Store was empty and the default records were written
    Seeded { inserted: usize },
    /// Store already held data; nothing was written
    AlreadyPopulated { existing: i64 },
}

/// Default records written into an empty store
pub fn seed_records() -> Vec<NewWeatherRecord> {
    vec![
        NewWeatherRecord::new("Coquimbo,cl", "Coquimbo")
            .with_condition("nubes dispersas", "03d")
            .with_readings(Tenths::new(185), 77, Tenths::new(41))
            .with_country("CL"),
        NewWeatherRecord::new("Tokyo", "Tokyo")
            .with_condition("parcialmente nublado", "02d")
            .with_readings(Tenths::new(220), 65, Tenths::new(30))
            .with_country("JP"),
        NewWeatherRecord::new("Madrid,es", "Madrid")
            .with_condition("soleado", "01d")
            .with_readings(Tenths::new(250), 30, Tenths::new(25))
            .with_country("ES"),
    ]
}

/// Ensure the schema exists and seed the default records if the store is empty.
///
/// Must run before the server accepts traffic. Any storage error is returned
/// unchanged so the caller can abort startup.
pub async fn initialize(repo: &WeatherRepository) -> Result<SeedOutcome, StorageError> {
    repo.ensure_schema().await?;

    let existing = repo.count().await?;
    if existing > 0 {
        info!("Weather store already has {} records, skipping seed", existing);
        return Ok(SeedOutcome::AlreadyPopulated { existing });
    }

    info!("Weather store is empty, inserting default records");
    let inserted = repo.insert_all(&seed_records()).await?;
    Ok(SeedOutcome::Seeded { inserted })
}
