//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::SiteConfig;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {0}")]
    Validation(String),
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<SiteConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: SiteConfig = toml::from_str(&content)?;
    validate_config(&config)?;
    Ok(config)
}

/// Semantic checks on top of what serde already enforces.
fn validate_config(config: &SiteConfig) -> Result<(), ConfigError> {
    if !config.canonical_scheme.is_empty()
        && config.canonical_scheme != "http"
        && config.canonical_scheme != "https"
    {
        return Err(ConfigError::Validation(format!(
            "canonical_scheme must be \"http\" or \"https\", got {:?}",
            config.canonical_scheme
        )));
    }
    if config.rate_limit.window_secs == 0 {
        return Err(ConfigError::Validation(
            "rate_limit.window_secs must be > 0".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_parses_with_defaults() {
        let config: SiteConfig = toml::from_str("canonical_host = \"example.com\"").unwrap();
        assert_eq!(config.canonical_host, "example.com");
        assert_eq!(config.canonical_scheme, "https");
        assert_eq!(config.rate_limit.max_hits, 10);
        assert!(!config.show_tracebacks);
    }

    #[test]
    fn bad_scheme_is_rejected() {
        let config: SiteConfig = toml::from_str("canonical_scheme = \"gopher\"").unwrap();
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::Validation(_))
        ));
    }
}
