//! Service configuration

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

/// RBAC service settings, read from `RBAC_*` environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct RbacConfig {
    /// Address the HTTP server binds to
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// Leading URI segment that marks API routes in the manifest
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,
    /// Path to the generated route manifest
    #[serde(default = "default_manifest_path")]
    pub manifest_path: String,
}

fn default_bind_addr() -> String {
    "0.0.0.0:3001".to_string()
}

fn default_api_prefix() -> String {
    "api".to_string()
}

fn default_manifest_path() -> String {
    "manifest/routes.json".to_string()
}

impl RbacConfig {
    /// Load configuration from the environment
    ///
    /// # Environment Variables
    /// - `RBAC_BIND_ADDR` (default: "0.0.0.0:3001")
    /// - `RBAC_API_PREFIX` (default: "api")
    /// - `RBAC_MANIFEST_PATH` (default: "manifest/routes.json")
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Environment::with_prefix("RBAC"))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RbacConfig::from_env().expect("Failed to load config");
        assert!(!config.bind_addr.is_empty());
        assert!(!config.api_prefix.is_empty());
        assert!(!config.manifest_path.is_empty());
    }
}
