use crate::common::constants::{
    DEFAULT_CONFIG_PATH, DEFAULT_LOG_DIR, DEFAULT_LOG_FILE, DEFAULT_LOG_FILTER, DEFAULT_POLITENESS_DELAY_MS, DEFAULT_REGION_SUFFIX,
    DEFAULT_SNAPSHOT_PATH, DEFAULT_USER_AGENT, GOOGLE_API_KEY_ENV, GOOGLE_GEOCODE_URL,
    MONTREAL_RINKS_URL, NOMINATIM_SEARCH_URL,
};
use crate::common::error::{Result, ScraperError};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source: SourceConfig,
    pub snapshot: SnapshotConfig,
    pub geocoding: GeocodingConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub url: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: MONTREAL_RINKS_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    /// Where the snapshot is written.
    pub path: PathBuf,
    /// Snapshot used to seed the cache. Defaults to `path`.
    pub cache_path: Option<PathBuf>,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_SNAPSHOT_PATH),
            cache_path: None,
        }
    }
}

impl SnapshotConfig {
    pub fn cache_source(&self) -> &Path {
        self.cache_path.as_deref().unwrap_or(&self.path)
    }
}

/// Where the JSON log file goes and what is logged when `RUST_LOG` is unset.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub directory: PathBuf,
    /// Base name of the daily rotated file; the date is appended to it.
    pub file_name: String,
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(DEFAULT_LOG_DIR),
            file_name: DEFAULT_LOG_FILE.to_string(),
            filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

/// Everything the provider chain needs: endpoints, identification, the
/// optional credential and the throttle.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeocodingConfig {
    pub nominatim_url: String,
    pub google_url: String,
    pub user_agent: String,
    pub region_suffix: String,
    pub politeness_delay_ms: u64,
    pub request_timeout_secs: Option<u64>,
    /// Never read from the config file, only from the environment.
    #[serde(skip)]
    pub google_api_key: Option<String>,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            nominatim_url: NOMINATIM_SEARCH_URL.to_string(),
            google_url: GOOGLE_GEOCODE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            region_suffix: DEFAULT_REGION_SUFFIX.to_string(),
            politeness_delay_ms: DEFAULT_POLITENESS_DELAY_MS,
            request_timeout_secs: None,
            google_api_key: None,
        }
    }
}

impl GeocodingConfig {
    pub fn politeness_delay(&self) -> Duration {
        Duration::from_millis(self.politeness_delay_ms)
    }

    /// Builds the HTTP client shared by both providers.
    pub fn http_client(&self) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder().user_agent(self.user_agent.clone());
        if let Some(secs) = self.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Ok(builder.build()?)
    }
}

impl Config {
    /// Loads configuration from `path`, or from `rinks.toml` when no path is
    /// given. A missing default file yields the built-in defaults; an
    /// explicitly requested file must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_PATH);
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    debug!("No {} found, using defaults", DEFAULT_CONFIG_PATH);
                    Self::default()
                }
            }
        };
        config.geocoding.google_api_key = Self::api_key_from_env();
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ScraperError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: Config = toml::from_str(&content)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    fn api_key_from_env() -> Option<String> {
        std::env::var(GOOGLE_API_KEY_ENV)
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_point_at_montreal_listing() {
        let config = Config::default();
        assert_eq!(config.source.url, MONTREAL_RINKS_URL);
        assert_eq!(config.geocoding.politeness_delay(), Duration::from_secs(1));
        assert_eq!(config.snapshot.cache_source(), Path::new(DEFAULT_SNAPSHOT_PATH));
        assert!(config.geocoding.google_api_key.is_none());
    }

    #[test]
    fn test_partial_toml_keeps_other_defaults() {
        let config: Config = toml::from_str(
            r#"
            [geocoding]
            politeness_delay_ms = 2500
            region_suffix = "Laval, QC"

            [snapshot]
            path = "out/rinks.xml"
            cache_path = "previous.xml"
            "#,
        )
        .unwrap();

        assert_eq!(config.geocoding.politeness_delay_ms, 2500);
        assert_eq!(config.geocoding.region_suffix, "Laval, QC");
        assert_eq!(config.geocoding.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(config.snapshot.cache_source(), Path::new("previous.xml"));
        assert_eq!(config.source.url, MONTREAL_RINKS_URL);
    }

    #[test]
    fn test_logging_section() {
        let config = Config::default();
        assert_eq!(config.logging.directory, Path::new(DEFAULT_LOG_DIR));
        assert_eq!(config.logging.file_name, DEFAULT_LOG_FILE);
        assert_eq!(config.logging.filter, DEFAULT_LOG_FILTER);

        let config: Config = toml::from_str(
            r#"
            [logging]
            directory = "/var/log/rinks"
            filter = "rink_scraper=debug"
            "#,
        )
        .unwrap();
        assert_eq!(config.logging.directory, Path::new("/var/log/rinks"));
        assert_eq!(config.logging.file_name, DEFAULT_LOG_FILE);
        assert_eq!(config.logging.filter, "rink_scraper=debug");
    }

    #[test]
    fn test_api_key_is_not_read_from_file() {
        let config: Config = toml::from_str(
            r#"
            [geocoding]
            google_api_key = "from-file"
            "#,
        )
        .unwrap();
        assert!(config.geocoding.google_api_key.is_none());
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load(Some(&dir.path().join("nope.toml")));
        assert!(matches!(result, Err(ScraperError::Config(_))));
    }
}
