mod store;
mod types;

pub use store::{ConfigEvent, ConfigStore};
pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    // Try default locations
    let default_paths = ["./config.toml", "./couchtube.toml"];

    for path_str in default_paths {
        let path = Path::new(path_str);
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
fn validate_config(config: &Config) -> Result<()> {
    if config.sponsorblock.api_base_url.is_empty() {
        anyhow::bail!("sponsorblock.api_base_url cannot be empty");
    }

    if config.sponsorblock.skip_tolerance_secs < 0.0 {
        anyhow::bail!("sponsorblock.skip_tolerance_secs cannot be negative");
    }

    if config.page.video_poll_interval_ms == 0 {
        anyhow::bail!("page.video_poll_interval_ms cannot be 0");
    }

    if config.page.scrubber_poll_interval_ms == 0 {
        anyhow::bail!("page.scrubber_poll_interval_ms cannot be 0");
    }

    if config.page.video_selector.is_empty() || config.page.scrubber_selector.is_empty() {
        anyhow::bail!("page selectors cannot be empty");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert!(validate_config(&config).is_ok());
        assert!(config.sponsorblock.enabled);
        assert!(!config.sponsorblock.skip_filler);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [sponsorblock]
            skip_filler = true
            manual_skip_categories = ["sponsor"]
            "#,
        )
        .unwrap();
        assert!(config.sponsorblock.skip_filler);
        assert_eq!(config.sponsorblock.manual_skip_categories, vec!["sponsor"]);
        assert_eq!(config.page.video_poll_interval_ms, 100);
        assert!(config.adfilter.enabled);
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let config: Config = toml::from_str(
            r#"
            [page]
            video_poll_interval_ms = 0
            "#,
        )
        .unwrap();
        assert!(validate_config(&config).is_err());
    }
}
