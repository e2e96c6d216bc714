use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub sources: SourcesConfig,

    #[serde(default)]
    pub covers: CoversConfig,
}

/// Configuration for external metadata sources.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourcesConfig {
    /// Per-source timeout applied to each branch of an aggregation fan-out,
    /// in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Preferred locale for provider queries (BCP-47 tag, e.g. "en" or
    /// "pt-BR").
    #[serde(default = "default_locale")]
    pub locale: String,

    #[serde(default)]
    pub google_books: GoogleBooksConfig,

    #[serde(default)]
    pub open_library: OpenLibraryConfig,

    #[serde(default)]
    pub mercado_editorial: MercadoEditorialConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GoogleBooksConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Optional API key. Searches work unauthenticated at a lower quota.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Optional two-letter country code restricting result availability.
    #[serde(default)]
    pub country: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OpenLibraryConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MercadoEditorialConfig {
    #[serde(default)]
    pub enabled: bool,
}

/// Configuration for derived cover artifacts.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CoversConfig {
    /// Root directory under which per-book artifact directories are created.
    #[serde(default = "default_covers_dir")]
    pub root_dir: PathBuf,
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_locale() -> String {
    "en".to_string()
}

fn default_covers_dir() -> PathBuf {
    PathBuf::from("./data/covers")
}

fn default_true() -> bool {
    true
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            locale: default_locale(),
            google_books: GoogleBooksConfig::default(),
            open_library: OpenLibraryConfig::default(),
            mercado_editorial: MercadoEditorialConfig::default(),
        }
    }
}

impl Default for GoogleBooksConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: None,
            country: None,
        }
    }
}

impl Default for OpenLibraryConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Default for CoversConfig {
    fn default() -> Self {
        Self {
            root_dir: default_covers_dir(),
        }
    }
}
