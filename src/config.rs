use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use tender_draft_core::context::SelectionParams;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub oracle: OracleConfig,
    #[serde(default)]
    pub upload: UploadConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_direct_limit")]
    pub direct_limit: usize,
    #[serde(default = "default_fallback_count")]
    pub fallback_count: usize,
    #[serde(default = "default_excerpt_chars")]
    pub excerpt_chars: usize,
    #[serde(default = "default_max_selected")]
    pub max_selected: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            direct_limit: default_direct_limit(),
            fallback_count: default_fallback_count(),
            excerpt_chars: default_excerpt_chars(),
            max_selected: default_max_selected(),
        }
    }
}

impl RetrievalConfig {
    pub fn selection_params(&self) -> SelectionParams {
        SelectionParams {
            direct_limit: self.direct_limit,
            fallback_count: self.fallback_count,
            excerpt_chars: self.excerpt_chars,
            max_selected: self.max_selected,
        }
    }
}

fn default_direct_limit() -> usize {
    5
}
fn default_fallback_count() -> usize {
    3
}
fn default_excerpt_chars() -> usize {
    1500
}
fn default_max_selected() -> usize {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct OracleConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    /// Base URL override (tests, proxies, OpenAI-compatible servers).
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Minimum delay between two oracle calls.
    #[serde(default)]
    pub min_interval_ms: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            url: None,
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
            min_interval_ms: 0,
        }
    }
}

impl OracleConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_max_retries() -> u32 {
    3
}
fn default_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Deserialize, Clone)]
pub struct UploadConfig {
    /// Files larger than this are rejected before extraction.
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: default_max_file_bytes(),
        }
    }
}

fn default_max_file_bytes() -> u64 {
    50 * 1024 * 1024
}

impl Config {
    /// Defaults for commands that work without a config file.
    pub fn minimal() -> Self {
        Self {
            db: DbConfig {
                path: PathBuf::from("./data/tdraft.sqlite"),
            },
            retrieval: RetrievalConfig::default(),
            oracle: OracleConfig::default(),
            upload: UploadConfig::default(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    // Validate retrieval
    if config.retrieval.direct_limit == 0 {
        anyhow::bail!("retrieval.direct_limit must be >= 1");
    }
    if config.retrieval.fallback_count == 0 {
        anyhow::bail!("retrieval.fallback_count must be >= 1");
    }
    if config.retrieval.excerpt_chars == 0 {
        anyhow::bail!("retrieval.excerpt_chars must be >= 1");
    }

    // Validate oracle
    if config.oracle.is_enabled() && config.oracle.model.is_none() {
        anyhow::bail!(
            "oracle.model must be specified when provider is '{}'",
            config.oracle.provider
        );
    }

    match config.oracle.provider.as_str() {
        "disabled" | "gemini" | "openai" => {}
        other => anyhow::bail!(
            "Unknown oracle provider: '{}'. Must be disabled, gemini, or openai.",
            other
        ),
    }

    Ok(())
}
