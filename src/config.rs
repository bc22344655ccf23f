//! YAML configuration for the analyzer.
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! working configuration:
//!
//! ```yaml
//! fetch:
//!   timeout_secs: 30
//!   user_agent: "word_frequency/0.1"
//!   catalog_base: "https://www.gutenberg.org"
//!   text_suffix: ".txt.utf-8"
//!
//! analysis:
//!   top_words: 15
//!   cloud_words: 200
//!   keywords: 5
//!   keyword_ngram_max: 1
//!   page_size: 20
//!
//! cache:
//!   capacity: 64
//!   path: "wordfreq-cache.db"   # persistent cache, `cache` feature only
//!   max_entries: 256
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WordFreqError};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    #[serde(default)]
    pub fetch: FetchConfig,

    #[serde(default)]
    pub analysis: AnalysisConfig,

    #[serde(default)]
    pub cache: CacheConfig,
}

impl AnalyzerConfig {
    /// Load a YAML configuration file from the given path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse YAML configuration from a string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: AnalyzerConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.fetch.validate()?;
        self.analysis.validate()?;
        self.cache.validate()
    }
}

/// Network fetch settings shared by the catalog and generic URL paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_catalog_base")]
    pub catalog_base: String,

    #[serde(default = "default_text_suffix")]
    pub text_suffix: String,
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            return Err(WordFreqError::Config(
                "fetch.timeout_secs must be greater than 0".into(),
            ));
        }
        url::Url::parse(&self.catalog_base).map_err(|e| {
            WordFreqError::Config(format!("fetch.catalog_base '{}': {e}", self.catalog_base))
        })?;
        Ok(())
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            catalog_base: default_catalog_base(),
            text_suffix: default_text_suffix(),
        }
    }
}

/// Sizes of the derived views handed to renderers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_top_words")]
    pub top_words: usize,

    #[serde(default = "default_cloud_words")]
    pub cloud_words: usize,

    #[serde(default = "default_keywords")]
    pub keywords: usize,

    /// Longest keyword phrase, in words.
    #[serde(default = "default_keyword_ngram_max")]
    pub keyword_ngram_max: usize,

    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl AnalysisConfig {
    fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(WordFreqError::Config(
                "analysis.page_size must be greater than 0".into(),
            ));
        }
        if !(1..=3).contains(&self.keyword_ngram_max) {
            return Err(WordFreqError::Config(format!(
                "analysis.keyword_ngram_max must be between 1 and 3, got {}",
                self.keyword_ngram_max
            )));
        }
        Ok(())
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            top_words: default_top_words(),
            cloud_words: default_cloud_words(),
            keywords: default_keywords(),
            keyword_ngram_max: default_keyword_ngram_max(),
            page_size: default_page_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// In-memory LRU capacity, in fetched documents.
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,

    /// SQLite file for the persistent cache. Ignored without the `cache` feature.
    #[serde(default)]
    pub path: Option<String>,

    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

impl CacheConfig {
    fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(WordFreqError::Config(
                "cache.capacity must be greater than 0".into(),
            ));
        }
        if self.max_entries == 0 {
            return Err(WordFreqError::Config(
                "cache.max_entries must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_cache_capacity(),
            path: None,
            max_entries: default_max_entries(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}
fn default_user_agent() -> String {
    format!("word_frequency/{}", env!("CARGO_PKG_VERSION"))
}
fn default_catalog_base() -> String {
    "https://www.gutenberg.org".into()
}
fn default_text_suffix() -> String {
    ".txt.utf-8".into()
}
fn default_top_words() -> usize {
    15
}
fn default_cloud_words() -> usize {
    200
}
fn default_keywords() -> usize {
    5
}
fn default_keyword_ngram_max() -> usize {
    1
}
fn default_page_size() -> usize {
    20
}
fn default_cache_capacity() -> usize {
    64
}
fn default_max_entries() -> usize {
    256
}
