//! Weather Lookup Service - Main Entry Point

use api::{init_logging, run_server, ServerConfig};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging()?;

    info!("=== Weather Service v{} ===", env!("CARGO_PKG_VERSION"));

    run_server(ServerConfig::default()).await?;

    Ok(())
}
