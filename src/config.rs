//! Settings file for the `reelsim` binary
//!
//! Every field has a default, so an empty JSON object (or no file at all) is a
//! valid configuration. Command-line flags and environment variables override
//! whatever the file sets.

use anyhow::Context;
use reelsim_core::{EngineConfig, Metric, VectorizerConfig};
use reelsim_oracle::{TmdbConfig, DEFAULT_TTL};
use reelsim_storage::DEFAULT_DESCRIPTION_COLUMN;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_HTTP_PORT: u16 = 8080;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub engine: EngineConfig,
    pub vectorizer: VectorizerConfig,
    pub metric: Metric,
    pub description_column: String,
    /// Refuse a model whose catalog fingerprint differs from the loaded catalog
    pub verify_fingerprint: bool,
    /// Static category table; takes precedence over TMDB
    pub categories_file: Option<PathBuf>,
    pub tmdb: TmdbConfig,
    pub cache_ttl_secs: u64,
    pub http: HttpSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub port: u16,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self { port: DEFAULT_HTTP_PORT }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            vectorizer: VectorizerConfig::default(),
            metric: Metric::default(),
            description_column: DEFAULT_DESCRIPTION_COLUMN.to_string(),
            verify_fingerprint: true,
            categories_file: None,
            tmdb: TmdbConfig::default(),
            cache_ttl_secs: DEFAULT_TTL.as_secs(),
            http: HttpSettings::default(),
        }
    }
}

impl Settings {
    /// Load from `path`, or defaults when no path is given
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read settings file {}", path.display()))?;
        let settings: Settings = serde_json::from_str(&json)
            .with_context(|| format!("invalid settings file {}", path.display()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.engine.validate()?;
        self.vectorizer.validate()?;
        if self.description_column.trim().is_empty() {
            anyhow::bail!("description_column cannot be empty");
        }
        Ok(())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelsim_core::StopWords;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings = Settings::load(None).unwrap();
        assert_eq!(settings.engine.pool_min, 50);
        assert_eq!(settings.engine.expansion_factor, 8);
        assert_eq!(settings.metric, Metric::Cosine);
        assert_eq!(settings.description_column, "overview");
        assert_eq!(settings.cache_ttl(), Duration::from_secs(24 * 3600));
        assert_eq!(settings.http.port, DEFAULT_HTTP_PORT);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"engine": {{"pool_min": 20}}, "metric": "jaccard",
                "vectorizer": {{"stop_words": "none"}}, "tmdb": {{"api_key": "k"}}}}"#
        )
        .unwrap();

        let settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(settings.engine.pool_min, 20);
        assert_eq!(settings.engine.expansion_factor, 8);
        assert_eq!(settings.metric, Metric::Jaccard);
        assert_eq!(settings.vectorizer.stop_words, StopWords::None);
        assert_eq!(settings.vectorizer.max_features, 5000);
        assert_eq!(settings.tmdb.api_key, "k");
        assert_eq!(settings.tmdb.timeout_secs, 10);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"vectorizer": {{"max_features": 0}}}}"#).unwrap();
        assert!(Settings::load(Some(file.path())).is_err());

        assert!(Settings::load(Some(Path::new("/nonexistent/reelsim.json"))).is_err());
    }
}
