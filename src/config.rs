use cosmic::cosmic_config::{self, CosmicConfigEntry, cosmic_config_derive::CosmicConfigEntry};
use serde::{Deserialize, Serialize};

pub const CONFIG_VERSION: u64 = 1;

fn env_or(var: &str, fallback: &str) -> String {
    std::env::var(var).unwrap_or_else(|_| fallback.to_string())
}

/// Store and identity settings. The collection path is scoped by `app_id`,
/// so several deployments can share one Firestore project without seeing
/// each other's records.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize, CosmicConfigEntry)]
pub struct AppConfig {
    pub project_id: String,
    pub api_key: String,
    pub app_id: String,
    pub debug_logging: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            project_id: env_or("VISADESK_PROJECT_ID", ""),
            api_key: env_or("VISADESK_API_KEY", ""),
            app_id: env_or("VISADESK_APP_ID", "default-app-id"),
            debug_logging: false,
        }
    }
}

impl AppConfig {
    /// True when enough is configured to reach the store at all.
    pub fn store_ready(&self) -> bool {
        !self.project_id.is_empty() && !self.api_key.is_empty()
    }

    /// Relative path of the shared service collection inside the database.
    pub fn collection_path(&self) -> String {
        format!("artifacts/{}/public/data/services", self.app_id)
    }
}
