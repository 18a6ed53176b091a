//! Repository Implementation

use crate::record::{NewWeatherRecord, WeatherRecord};
use crate::StorageError;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, Transaction};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

// Column layout shared with databases written by earlier deployments of the
// service. Decimal columns hold one fractional digit.
const CREATE_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS clima (
        id INTEGER NOT NULL PRIMARY KEY,
        query VARCHAR NOT NULL,
        cod INTEGER NOT NULL DEFAULT 200,
        weather_desc VARCHAR NOT NULL,
        weather_icon VARCHAR NOT NULL,
        main_temp NUMERIC(5, 1) NOT NULL,
        main_humidity INTEGER NOT NULL,
        wind_speed NUMERIC(4, 1) NOT NULL,
        name VARCHAR NOT NULL,
        sys_country VARCHAR NOT NULL
    )";

const CREATE_QUERY_INDEX: &str =
    "CREATE UNIQUE INDEX IF NOT EXISTS ix_clima_query ON clima (query)";

const REQUIRED_COLUMNS: [&str; 10] = [
    "id",
    "query",
    "cod",
    "weather_desc",
    "weather_icon",
    "main_temp",
    "main_humidity",
    "wind_speed",
    "name",
    "sys_country",
];

const INSERT_RECORD: &str = "
    INSERT INTO clima (
        query, cod, weather_desc, weather_icon, main_temp,
        main_humidity, wind_speed, name, sys_country
    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)";

// NUMERIC affinity may store `22.0` as the integer 22, so decimals are
// normalized to tenths in SQL.
const SELECT_BY_QUERY: &str = "
    SELECT id, query, cod, weather_desc, weather_icon,
           CAST(ROUND(main_temp * 10) AS INTEGER) AS main_temp_tenths,
           main_humidity,
           CAST(ROUND(wind_speed * 10) AS INTEGER) AS wind_speed_tenths,
           name, sys_country
    FROM clima
    WHERE query = ?
    LIMIT 1";

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite connection URL
    pub database_url: String,
    /// Maximum pooled connections
    pub max_connections: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://clima.db".to_string(),
            max_connections: 5,
        }
    }
}

/// Repository for weather records backed by a SQLite pool.
///
/// Cloning is cheap: clones share the same pool.
#[derive(Debug, Clone)]
pub struct WeatherRepository {
    pub(crate) pool: SqlitePool,
}

impl WeatherRepository {
    /// Open (creating if missing) the database described by `config`
    pub async fn connect(config: &StorageConfig) -> Result<Self, StorageError> {
        info!("Opening SQLite database at {}", config.database_url);

        let options = SqliteConnectOptions::from_str(&config.database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Private in-memory database.
    ///
    /// Every SQLite in-memory connection is its own database, so the pool is
    /// pinned to a single connection that is never recycled.
    pub async fn in_memory() -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Create the table and its unique index if absent. Never drops data.
    ///
    /// An existing table missing any expected column is rejected with
    /// [`StorageError::SchemaMismatch`] rather than served.
    pub async fn ensure_schema(&self) -> Result<(), StorageError> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;

        let columns: Vec<String> =
            sqlx::query_scalar("SELECT name FROM pragma_table_info('clima')")
                .fetch_all(&self.pool)
                .await?;
        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|required| !columns.iter().any(|c| c == required))
            .collect();
        if !missing.is_empty() {
            return Err(StorageError::SchemaMismatch(format!(
                "table clima is missing columns: {}",
                missing.join(", ")
            )));
        }

        sqlx::query(CREATE_QUERY_INDEX).execute(&self.pool).await?;
        debug!("Schema for table clima is in place");
        Ok(())
    }

    /// Total number of stored records
    pub async fn count(&self) -> Result<i64, StorageError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM clima")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Insert a single record, returning its id
    pub async fn insert(&self, record: &NewWeatherRecord) -> Result<i64, StorageError> {
        let mut tx = self.pool.begin().await?;
        let id = insert_in(&mut tx, record).await?;
        tx.commit().await?;
        Ok(id)
    }

    /// Insert all records in one transaction. Nothing is written if any insert fails.
    pub async fn insert_all(&self, records: &[NewWeatherRecord]) -> Result<usize, StorageError> {
        let mut tx = self.pool.begin().await?;
        for record in records {
            insert_in(&mut tx, record).await?;
        }
        tx.commit().await?;

        debug!("Inserted {} weather records", records.len());
        Ok(records.len())
    }

    /// Exact-match lookup on the `query` column (case and whitespace sensitive).
    ///
    /// The pooled connection is held only for this call and returned to the
    /// pool when it goes out of scope, on success and on error alike.
    pub async fn find_by_query(&self, query: &str) -> Result<Option<WeatherRecord>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        let record = sqlx::query_as::<_, WeatherRecord>(SELECT_BY_QUERY)
            .bind(query)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| match e {
                sqlx::Error::ColumnDecode { index, source } => StorageError::InvalidRecord(
                    format!("query {:?}, column {}: {}", query, index, source),
                ),
                other => StorageError::from(other),
            })?;
        Ok(record)
    }

    /// Close the pool, waiting for checked-out connections to be returned
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

async fn insert_in(
    tx: &mut Transaction<'_, Sqlite>,
    record: &NewWeatherRecord,
) -> Result<i64, StorageError> {
    let result = sqlx::query(INSERT_RECORD)
        .bind(&record.query)
        .bind(record.status_code)
        .bind(&record.description)
        .bind(&record.icon_code)
        .bind(record.temperature.as_f64())
        .bind(record.humidity)
        .bind(record.wind_speed.as_f64())
        .bind(&record.display_name)
        .bind(&record.country_code)
        .execute(&mut **tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db) = &e {
                if db.is_unique_violation() {
                    return StorageError::DuplicateQuery(record.query.clone());
                }
            }
            StorageError::from(e)
        })?;

    Ok(result.last_insert_rowid())
}
