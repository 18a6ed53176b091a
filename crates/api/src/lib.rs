//! Weather Lookup API Server
//!
//! Serves cached weather records from the local SQLite store over HTTP.

use axum::{routing::get, Router};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

pub mod config;
pub mod error;
pub mod routes;

pub use config::ServerConfig;
pub use error::ApiError;

use storage::{SeedOutcome, WeatherRepository};

/// Application state shared across handlers
pub struct AppState {
    /// Storage repository
    pub repository: WeatherRepository,
    /// Version string
    pub version: String,
}

impl AppState {
    /// Create new application state around an opened repository
    pub fn new(repository: WeatherRepository) -> Self {
        Self {
            repository,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/weather", get(routes::weather::get_weather))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::very_permissive()),
        )
        .with_state(state)
}

/// Initialize logging
pub fn init_logging() -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
}

/// Open storage, seed it if empty, then serve until interrupted
pub async fn run_server(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let repository = WeatherRepository::connect(&config.storage).await?;

    match storage::initialize(&repository).await? {
        SeedOutcome::Seeded { inserted } => info!("Seeded {} weather records", inserted),
        SeedOutcome::AlreadyPopulated { existing } => {
            info!("Serving {} existing weather records", existing)
        }
    }

    let state = Arc::new(AppState::new(repository.clone()));
    info!("Weather service v{} starting", state.version);
    let app = create_router(state);

    info!("Starting API server on {}", config.bind_addr);

    let listener = TcpListener::bind(&config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped, closing database");
    repository.close().await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::net::SocketAddr;

    async fn spawn_server() -> SocketAddr {
        let repo = WeatherRepository::in_memory().await.unwrap();
        storage::initialize(&repo).await.unwrap();
        let app = create_router(Arc::new(AppState::new(repo)));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    #[tokio::test]
    async fn test_end_to_end_lookup() {
        let addr = spawn_server().await;
        let client = reqwest::Client::new();

        let response = client
            .get(format!("http://{addr}/weather"))
            .query(&[("q", "Madrid,es")])
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);

        let body: Value = response.json().await.unwrap();
        assert_eq!(body["cod"], json!(200));
        assert_eq!(body["name"], json!("Madrid"));
        assert_eq!(body["main"]["temp"], json!(25.0));
    }

    #[tokio::test]
    async fn test_cors_allows_any_origin() {
        let addr = spawn_server().await;
        let client = reqwest::Client::new();
        let origin = "http://localhost:3000";

        let preflight = client
            .request(reqwest::Method::OPTIONS, format!("http://{addr}/weather?q=Tokyo"))
            .header("Origin", origin)
            .header("Access-Control-Request-Method", "GET")
            .header("Access-Control-Request-Headers", "x-custom-header")
            .send()
            .await
            .unwrap();
        assert!(preflight.status().is_success());
        assert_eq!(
            preflight.headers()["access-control-allow-origin"],
            origin
        );

        let response = client
            .get(format!("http://{addr}/weather?q=Tokyo"))
            .header("Origin", origin)
            .send()
            .await
            .unwrap();
        assert_eq!(response.headers()["access-control-allow-origin"], origin);
        assert_eq!(response.headers()["access-control-allow-credentials"], "true");
    }

    #[tokio::test]
    async fn test_concurrent_requests() {
        let addr = spawn_server().await;
        let client = reqwest::Client::new();

        let mut handles = Vec::new();
        for i in 0..24 {
            let client = client.clone();
            let (query, expected_name) = match i % 4 {
                0 => ("Coquimbo,cl", Some("Coquimbo")),
                1 => ("Tokyo", Some("Tokyo")),
                2 => ("Madrid,es", Some("Madrid")),
                _ => ("Lima,pe", None),
            };
            handles.push(tokio::spawn(async move {
                let body: Value = client
                    .get(format!("http://{addr}/weather"))
                    .query(&[("q", query)])
                    .send()
                    .await
                    .unwrap()
                    .json()
                    .await
                    .unwrap();
                (body, expected_name)
            }));
        }

        for handle in handles {
            let (body, expected_name) = handle.await.unwrap();
            match expected_name {
                Some(name) => {
                    assert_eq!(body["cod"], json!(200));
                    assert_eq!(body["name"], json!(name));
                }
                None => assert_eq!(body, json!({"cod": 404, "message": "city not found"})),
            }
        }
    }
}
