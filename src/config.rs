use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::graph::IndirectOptions;

/// Upper bound on `analysis.max_hops`; path enumeration grows quickly past it.
const MAX_HOPS_LIMIT: usize = 6;

const MAX_RETRIES_LIMIT: usize = 10;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub input: InputConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
}

/// Where owner pages are read from
#[derive(Debug, Clone, Deserialize)]
pub struct InputConfig {
    /// Directory of saved owner pages (`*.html`), walked recursively.
    pub html_dir: PathBuf,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Export locations
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_out_dir")]
    pub out_dir: PathBuf,
    #[serde(default = "default_relationships_file")]
    pub relationships_file: String,
    #[serde(default = "default_owners_file")]
    pub owners_file: String,
    #[serde(default = "default_entities_file")]
    pub entities_file: String,
    #[serde(default = "default_adjacency_file")]
    pub adjacency_file: String,
    #[serde(default = "default_graphml_file")]
    pub graphml_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            out_dir: default_out_dir(),
            relationships_file: default_relationships_file(),
            owners_file: default_owners_file(),
            entities_file: default_entities_file(),
            adjacency_file: default_adjacency_file(),
            graphml_file: default_graphml_file(),
        }
    }
}

/// Indirect ownership tuning
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_max_hops")]
    pub max_hops: usize,
    #[serde(default = "default_materiality_threshold")]
    pub materiality_threshold: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_hops: default_max_hops(),
            materiality_threshold: default_materiality_threshold(),
        }
    }
}

impl AnalysisConfig {
    pub fn indirect_options(&self) -> IndirectOptions {
        IndirectOptions {
            max_hops: self.max_hops,
            materiality_threshold: self.materiality_threshold,
        }
    }
}

/// Remote page fetching
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Listing page linking to every owner detail page.
    #[serde(default = "default_listing_url")]
    pub listing_url: String,
    /// Substring a resolved link path must contain to count as a detail page.
    #[serde(default = "default_link_pattern")]
    pub link_pattern: String,
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,
    /// First retry delay; doubled on each further attempt.
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            listing_url: default_listing_url(),
            link_pattern: default_link_pattern(),
            delay_ms: default_delay_ms(),
            max_retries: default_max_retries(),
            backoff_ms: default_backoff_ms(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_out_dir() -> PathBuf {
    PathBuf::from("out")
}

fn default_relationships_file() -> String {
    "media_ownership_relationships.csv".to_string()
}

fn default_owners_file() -> String {
    "media_owners.csv".to_string()
}

fn default_entities_file() -> String {
    "media_entities.csv".to_string()
}

fn default_adjacency_file() -> String {
    "media_ownership_adjacency_matrix.csv".to_string()
}

fn default_graphml_file() -> String {
    "media_ownership_network.graphml".to_string()
}

fn default_max_hops() -> usize {
    crate::graph::indirect::DEFAULT_MAX_HOPS
}

fn default_materiality_threshold() -> f64 {
    crate::graph::indirect::MATERIALITY_THRESHOLD
}

fn default_listing_url() -> String {
    "https://sri-lanka.mom-gmr.org/en/owners/individual-owners/".to_string()
}

fn default_link_pattern() -> String {
    "/owners/individual-owners/detail/".to_string()
}

fn default_delay_ms() -> u64 {
    2000
}

fn default_max_retries() -> usize {
    3
}

fn default_backoff_ms() -> u64 {
    1000
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    concat!("ownergraph/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Config {
    /// Load configuration from file
    ///
    /// Loads environment variables from .env file (if present) before loading config.
    /// Looks for config file in this order:
    /// 1. Path specified in OWNERGRAPH_CONFIG environment variable
    /// 2. ./config.toml in current directory
    pub fn load() -> Result<Self> {
        let _ = dotenv::dotenv();

        let config_path = std::env::var("OWNERGRAPH_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.toml"));

        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        Self::from_toml_str(&config_str)
            .with_context(|| format!("Invalid config file: {}", config_path.display()))
    }

    /// Parse and validate configuration text
    pub fn from_toml_str(config_str: &str) -> Result<Self> {
        let config: Config = toml::from_str(config_str).context("Failed to parse config.toml")?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if self.input.html_dir.as_os_str().is_empty() {
            anyhow::bail!("input.html_dir must not be empty");
        }

        if self.analysis.max_hops == 0 || self.analysis.max_hops > MAX_HOPS_LIMIT {
            anyhow::bail!(
                "analysis.max_hops must be between 1 and {}",
                MAX_HOPS_LIMIT
            );
        }

        let threshold = self.analysis.materiality_threshold;
        if !threshold.is_finite() || !(0.0..100.0).contains(&threshold) {
            anyhow::bail!("analysis.materiality_threshold must be in [0, 100)");
        }

        url::Url::parse(&self.fetch.listing_url)
            .with_context(|| format!("fetch.listing_url is not a valid URL: {}", self.fetch.listing_url))?;

        if self.fetch.link_pattern.trim().is_empty() {
            anyhow::bail!("fetch.link_pattern must not be empty");
        }

        if self.fetch.max_retries > MAX_RETRIES_LIMIT {
            anyhow::bail!("fetch.max_retries must be at most {}", MAX_RETRIES_LIMIT);
        }

        if self.fetch.timeout_secs == 0 {
            anyhow::bail!("fetch.timeout_secs must be greater than 0");
        }

        Ok(())
    }

    /// Get the owner page directory
    pub fn html_dir(&self) -> &Path {
        &self.input.html_dir
    }

    /// Get the export directory
    pub fn out_dir(&self) -> &Path {
        &self.output.out_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Serialize config tests that mutate process-wide env so they don't race.
    static CONFIG_TEST_LOCK: Mutex<()> = Mutex::new(());

    const MINIMAL: &str = r#"
[input]
html_dir = "pages"
"#;

    #[test]
    fn test_defaults() {
        let config = Config::from_toml_str(MINIMAL).unwrap();
        assert_eq!(config.html_dir(), Path::new("pages"));
        assert_eq!(config.input.log_level, "info");
        assert_eq!(config.out_dir(), Path::new("out"));
        assert_eq!(config.analysis.max_hops, 3);
        assert_eq!(config.analysis.materiality_threshold, 1.0);
        assert_eq!(config.fetch.delay_ms, 2000);
        assert_eq!(config.output.graphml_file, "media_ownership_network.graphml");
    }

    #[test]
    fn test_full_config() {
        let config = Config::from_toml_str(
            r#"
[input]
html_dir = "/data/owners"
log_level = "debug"

[output]
out_dir = "/tmp/export"
relationships_file = "rels.csv"

[analysis]
max_hops = 2
materiality_threshold = 5.0

[fetch]
listing_url = "https://example.org/owners/"
link_pattern = "/owners/detail/"
delay_ms = 10
max_retries = 1
"#,
        )
        .unwrap();
        assert_eq!(config.output.relationships_file, "rels.csv");
        assert_eq!(config.output.owners_file, "media_owners.csv");
        let options = config.analysis.indirect_options();
        assert_eq!(options.max_hops, 2);
        assert_eq!(options.materiality_threshold, 5.0);
        assert_eq!(config.fetch.max_retries, 1);
    }

    #[test]
    fn test_example_config_is_valid() {
        let config = Config::from_toml_str(include_str!("../config.example.toml")).unwrap();
        assert_eq!(config.fetch.backoff_ms, 1000);
        assert_eq!(config.output.adjacency_file, "media_ownership_adjacency_matrix.csv");
    }

    #[test]
    fn test_missing_input_section() {
        assert!(Config::from_toml_str("[analysis]\nmax_hops = 3\n").is_err());
    }

    #[test]
    fn test_invalid_ranges() {
        let zero_hops = format!("{}\n[analysis]\nmax_hops = 0\n", MINIMAL);
        assert!(Config::from_toml_str(&zero_hops).is_err());

        let many_hops = format!("{}\n[analysis]\nmax_hops = 12\n", MINIMAL);
        assert!(Config::from_toml_str(&many_hops).is_err());

        let bad_threshold = format!("{}\n[analysis]\nmateriality_threshold = -1.0\n", MINIMAL);
        let err = Config::from_toml_str(&bad_threshold).unwrap_err();
        assert!(err.to_string().contains("materiality_threshold"));

        let bad_url = format!("{}\n[fetch]\nlisting_url = \"not a url\"\n", MINIMAL);
        assert!(Config::from_toml_str(&bad_url).is_err());

        let many_retries = format!("{}\n[fetch]\nmax_retries = 64\n", MINIMAL);
        let err = Config::from_toml_str(&many_retries).unwrap_err();
        assert!(err.to_string().contains("max_retries"));

        let most_retries = format!("{}\n[fetch]\nmax_retries = 10\n", MINIMAL);
        assert!(Config::from_toml_str(&most_retries).is_ok());
    }

    #[test]
    fn test_config_load_from_env_path() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("ownergraph.toml");
        fs::write(&config_path, MINIMAL).unwrap();

        let original = std::env::var("OWNERGRAPH_CONFIG").ok();
        std::env::set_var("OWNERGRAPH_CONFIG", &config_path);
        let config = Config::load();
        std::env::remove_var("OWNERGRAPH_CONFIG");
        if let Some(v) = original {
            std::env::set_var("OWNERGRAPH_CONFIG", v);
        }

        let config = config.unwrap();
        assert_eq!(config.html_dir(), Path::new("pages"));
    }

    #[test]
    fn test_config_invalid_path() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        let original = std::env::var("OWNERGRAPH_CONFIG").ok();
        std::env::set_var("OWNERGRAPH_CONFIG", "nonexistent.toml");
        let config = Config::load();
        assert!(config.is_err());
        std::env::remove_var("OWNERGRAPH_CONFIG");
        if let Some(v) = original {
            std::env::set_var("OWNERGRAPH_CONFIG", v);
        }
    }
}
