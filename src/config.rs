use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawl: CrawlConfig,
    #[serde(default)]
    pub wikidata: WikidataConfig,
    pub query: QueryConfig,
}

/// Graph construction configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlConfig {
    /// Display names of the figures the crawl starts from.
    pub roots: Vec<String>,
    /// Maximum number of edges away from any root to include.
    pub max_depth: u32,
    /// Directory checkpoints are written into.
    pub checkpoint_dir: PathBuf,
    /// Write a checkpoint once the store has grown by more than this many
    /// entities since the last one.
    #[serde(default = "default_checkpoint_every")]
    pub checkpoint_every: usize,
}

/// Knowledge source endpoints and retry behavior
#[derive(Debug, Clone, Deserialize)]
pub struct WikidataConfig {
    #[serde(default = "default_sparql_endpoint")]
    pub sparql_endpoint: String,
    #[serde(default = "default_search_endpoint")]
    pub search_endpoint: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Attempt cap for the rate-limit retry loop. Raise it to approximate
    /// unbounded retrying under sustained rate limiting.
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,
    /// Capacity of the name-resolution LRU cache; 0 disables it.
    #[serde(default = "default_resolve_cache_capacity")]
    pub resolve_cache_capacity: usize,
}

impl Default for WikidataConfig {
    fn default() -> Self {
        Self {
            sparql_endpoint: default_sparql_endpoint(),
            search_endpoint: default_search_endpoint(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            resolve_cache_capacity: default_resolve_cache_capacity(),
        }
    }
}

/// Query-time configuration
#[derive(Debug, Clone, Deserialize)]
pub struct QueryConfig {
    /// The checkpoint read at startup by the query-time binaries.
    pub graph_file: PathBuf,
    /// Fixed seed for race tie-breaks; omit for entropy-seeded ties.
    #[serde(default)]
    pub tie_seed: Option<u64>,
}

fn default_checkpoint_every() -> usize {
    100
}

fn default_sparql_endpoint() -> String {
    "https://query.wikidata.org/sparql".to_string()
}

fn default_search_endpoint() -> String {
    "https://www.wikidata.org/w/api.php".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> usize {
    25
}

fn default_resolve_cache_capacity() -> usize {
    1000
}

impl Config {
    /// Load configuration from file
    ///
    /// Loads environment variables from .env file (if present) before loading
    /// config. Looks for the config file in this order:
    /// 1. Path specified in BLOODLINE_CONFIG environment variable
    /// 2. ./config.toml in current directory
    pub fn load() -> Result<Self> {
        // Load .env file if it exists (ignore errors - file is optional)
        let _ = dotenv::dotenv();

        let config_path = std::env::var("BLOODLINE_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.toml"));

        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: Config = toml::from_str(&config_str)
            .context("Failed to parse config.toml")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if self.crawl.roots.is_empty() {
            anyhow::bail!("crawl.roots must name at least one figure to start from");
        }

        if self.crawl.roots.iter().any(|r| r.trim().is_empty()) {
            anyhow::bail!("crawl.roots must not contain blank names");
        }

        if self.crawl.checkpoint_every == 0 {
            anyhow::bail!("crawl.checkpoint_every must be greater than 0");
        }

        if self.wikidata.timeout_secs == 0 {
            anyhow::bail!("wikidata.timeout_secs must be greater than 0");
        }

        if self.wikidata.sparql_endpoint.is_empty() || self.wikidata.search_endpoint.is_empty() {
            anyhow::bail!("wikidata endpoints must not be empty");
        }

        Ok(())
    }

    /// Get the checkpoint file the query-time binaries load
    pub fn graph_file(&self) -> &Path {
        &self.query.graph_file
    }

    /// Get the checkpoint directory
    pub fn checkpoint_dir(&self) -> &Path {
        &self.crawl.checkpoint_dir
    }
}
