mod types;

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
    let default_paths = [
        "./config.toml",
        "./bookbinder.toml",
        "~/.config/bookbinder/config.toml",
        "/etc/bookbinder/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
fn validate_config(config: &Config) -> Result<()> {
    if config.sources.timeout_secs == 0 {
        anyhow::bail!("Source timeout cannot be 0 seconds");
    }

    if config.covers.root_dir.as_os_str().is_empty() {
        anyhow::bail!("Covers root directory cannot be empty");
    }

    if config.sources.locale.is_empty() {
        anyhow::bail!("Source locale cannot be empty");
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
        assert_eq!(config.sources.timeout_secs, 10);
        assert!(config.sources.google_books.enabled);
        assert!(config.sources.open_library.enabled);
        assert!(!config.sources.mercado_editorial.enabled);
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
            [sources]
            timeout_secs = 5
            locale = "pt-BR"

            [sources.google_books]
            enabled = true
            api_key = "secret"
            country = "BR"

            [sources.mercado_editorial]
            enabled = true

            [covers]
            root_dir = "/var/lib/bookbinder/covers"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.sources.timeout_secs, 5);
        assert_eq!(config.sources.locale, "pt-BR");
        assert_eq!(config.sources.google_books.api_key.as_deref(), Some("secret"));
        assert!(config.sources.mercado_editorial.enabled);
        assert_eq!(
            config.covers.root_dir,
            std::path::PathBuf::from("/var/lib/bookbinder/covers")
        );
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn rejects_zero_timeout() {
        let toml = r#"
            [sources]
            timeout_secs = 0
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn empty_toml_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.sources.locale, "en");
        assert_eq!(
            config.covers.root_dir,
            std::path::PathBuf::from("./data/covers")
        );
    }

    #[test]
    fn load_missing_custom_path_fails() {
        let err = load_config(Path::new("/nonexistent/bookbinder.toml"));
        assert!(err.is_err());
    }
}
