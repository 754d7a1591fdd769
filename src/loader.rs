//! Configuration loading
//!
//! Layers embedded defaults, files and environment into a [`SwitchyardConfig`].

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use std::path::Path;
use switchyard_llm::SwitchyardConfig;

/// Embedded default configuration (compiled into binary)
pub const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

/// Load configuration from files and environment
///
/// An explicit `--config` file is applied last and must exist.
pub fn load_config(explicit: Option<&Path>) -> Result<SwitchyardConfig> {
    let env_name = std::env::var("SWITCHYARD_ENV").unwrap_or_else(|_| "development".to_string());

    let mut builder = Config::builder()
        // 1. Embedded defaults (always available)
        .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
        // 2. External overrides (optional)
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name(&format!("config/{env_name}")).required(false))
        .add_source(File::with_name("config/local").required(false))
        // 3. Environment variables
        // SWITCHYARD_EXECUTOR__MAX_RETRIES_PER_CANDIDATE=5
        .add_source(
            Environment::with_prefix("SWITCHYARD")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

    if let Some(path) = explicit {
        builder = builder.add_source(File::from(path).required(true));
    }

    let config: SwitchyardConfig = builder
        .build()
        .context("Failed to build configuration")?
        .try_deserialize()
        .context("Failed to deserialize configuration")?;

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_defaults_parse() {
        let config: SwitchyardConfig = toml::from_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.executor.max_retries_per_candidate, 3);
        assert_eq!(config.routing.min_capability_score, 5);
        assert!(config.models.is_empty());
    }
}
