use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

pub const DEFAULT_POOL_MIN: usize = 50;
pub const DEFAULT_EXPANSION_FACTOR: usize = 8;
pub const DEFAULT_MAX_FEATURES: usize = 5000;
pub const DEFAULT_MIN_TOKEN_LEN: usize = 2;

/// Tuning for the query engine's candidate pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Lower bound on the number of ranked candidates drawn per query
    pub pool_min: usize,
    /// Candidates drawn per requested result
    pub expansion_factor: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pool_min: DEFAULT_POOL_MIN,
            expansion_factor: DEFAULT_EXPANSION_FACTOR,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.pool_min == 0 && self.expansion_factor == 0 {
            return Err(Error::InvalidConfig(
                "pool_min and expansion_factor cannot both be zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Stop-word handling for the vectorizer
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopWords {
    /// Built-in English list
    #[default]
    English,
    None,
    Custom(Vec<String>),
}

impl FromStr for StopWords {
    type Err = Error;

    /// Accepts `english`, `none`, or a comma separated word list.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "english" => Ok(StopWords::English),
            "none" | "" => Ok(StopWords::None),
            other => Ok(StopWords::Custom(
                other
                    .split(',')
                    .map(|w| w.trim().to_string())
                    .filter(|w| !w.is_empty())
                    .collect(),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorizerConfig {
    /// Vocabulary cap (V)
    pub max_features: usize,
    pub stop_words: StopWords,
    pub min_token_len: usize,
}

impl Default for VectorizerConfig {
    fn default() -> Self {
        Self {
            max_features: DEFAULT_MAX_FEATURES,
            stop_words: StopWords::default(),
            min_token_len: DEFAULT_MIN_TOKEN_LEN,
        }
    }
}

impl VectorizerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_features == 0 {
            return Err(Error::InvalidConfig("max_features must be at least 1".to_string()));
        }
        if self.min_token_len == 0 {
            return Err(Error::InvalidConfig("min_token_len must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Pairwise similarity metric used by the model builder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    #[default]
    Cosine,
    Jaccard,
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Cosine => write!(f, "cosine"),
            Metric::Jaccard => write!(f, "jaccard"),
        }
    }
}

impl FromStr for Metric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "cosine" => Ok(Metric::Cosine),
            "jaccard" => Ok(Metric::Jaccard),
            other => Err(Error::InvalidConfig(format!("unknown metric '{}'", other))),
        }
    }
}
