// src/config.rs
//
// Run configuration. Built once at startup, read-only afterwards.

use std::fs;
use std::path::PathBuf;

use serde::Deserialize;
use tracing::{error, warn};

pub const DEFAULT_MODEL: &str = "gpt-4-turbo-preview";
pub const DEFAULT_MAX_TOKENS: u32 = 2000;
pub const DEFAULT_TEMPERATURE: f32 = 0.5;
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_JEST_CONFIG: &str = "jest.config.js";

pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_MODEL: &str = "OPENAI_MODEL";
pub const ENV_MAX_TOKENS: &str = "OPENAI_MAX_TOKENS";
pub const ENV_BASE_URL: &str = "OPENAI_BASE_URL";
pub const ENV_JEST_CONFIG: &str = "TESTGEN_JEST_CONFIG";
pub const ENV_TEST_ROOT: &str = "TESTGEN_TEST_ROOT";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("OPENAI_API_KEY environment variable is not set")]
    MissingApiKey,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub endpoint: String,
    /// Directory searched for existing Python tests. Defaults to the
    /// directory holding the running executable, not the target project.
    pub test_root: PathBuf,
    pub jest_config: PathBuf,
}

/// Optional on-disk overrides. The API key is deliberately absent.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    model: Option<String>,
    max_tokens: Option<u32>,
    endpoint: Option<String>,
    jest_config: Option<PathBuf>,
    test_root: Option<PathBuf>,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let file = load_file_config();
        Self::resolve(file, |key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup, ignoring the config file.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::resolve(FileConfig::default(), lookup)
    }

    fn resolve<F>(file: FileConfig, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(ENV_API_KEY)
            .filter(|k| !k.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        let model = lookup(ENV_MODEL)
            .or(file.model)
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let max_tokens = match lookup(ENV_MAX_TOKENS) {
            Some(raw) => parse_max_tokens(&raw),
            None => file.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        };

        let endpoint = lookup(ENV_BASE_URL)
            .or(file.endpoint)
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

        let jest_config = lookup(ENV_JEST_CONFIG)
            .map(PathBuf::from)
            .or(file.jest_config)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_JEST_CONFIG));

        let test_root = lookup(ENV_TEST_ROOT)
            .map(PathBuf::from)
            .or(file.test_root)
            .unwrap_or_else(executable_dir);

        Ok(Self {
            api_key,
            model,
            max_tokens,
            temperature: DEFAULT_TEMPERATURE,
            endpoint,
            test_root,
            jest_config,
        })
    }
}

fn parse_max_tokens(raw: &str) -> u32 {
    match raw.trim().parse::<u32>() {
        Ok(n) => n,
        Err(_) => {
            error!(
                "Invalid value for {ENV_MAX_TOKENS}. Using default value: {DEFAULT_MAX_TOKENS}"
            );
            DEFAULT_MAX_TOKENS
        }
    }
}

fn executable_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("testgen/config.json")
}

fn load_file_config() -> FileConfig {
    let path = config_path();
    let Ok(raw) = fs::read_to_string(&path) else {
        return FileConfig::default();
    };

    match serde_json::from_str(&raw) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("Ignoring malformed config file {}: {e}", path.display());
            FileConfig::default()
        }
    }
}
