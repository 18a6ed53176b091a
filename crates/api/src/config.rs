//! Server configuration

use serde::{Deserialize, Serialize};
use storage::StorageConfig;

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listener address
    pub bind_addr: String,
    /// Database settings
    pub storage: StorageConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8001".to_string(),
            storage: StorageConfig::default(),
        }
    }
}
