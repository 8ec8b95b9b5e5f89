//! Startup configuration resolution
//!
//! Every setting is resolved in this priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! Credentials and the database URL have no default. A missing or malformed
//! value is a [`Error::StartupConfig`], which the binary treats as fatal.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8501";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_IDEOGRAM_BASE_URL: &str = "https://api.ideogram.ai";

/// Environment variable names
pub mod env_vars {
    pub const CONFIG_FILE: &str = "SOCIALGEN_CONFIG";
    pub const GEMINI_API_KEY: &str = "GEMINI_API_KEY";
    pub const IDEOGRAM_API_KEY: &str = "IDEOGRAM_API_KEY";
    pub const DATABASE_URL: &str = "DATABASE_URL";
    pub const BIND_ADDRESS: &str = "SOCIALGEN_BIND";
    pub const GEMINI_MODEL: &str = "SOCIALGEN_GEMINI_MODEL";
    pub const GEMINI_BASE_URL: &str = "SOCIALGEN_GEMINI_BASE_URL";
    pub const IDEOGRAM_BASE_URL: &str = "SOCIALGEN_IDEOGRAM_BASE_URL";
    pub const REQUEST_TIMEOUT_SECS: &str = "SOCIALGEN_REQUEST_TIMEOUT_SECS";
}

/// Contents of `config.toml`; every key is optional
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub gemini_api_key: Option<String>,
    pub ideogram_api_key: Option<String>,
    pub database_url: Option<String>,
    pub bind_address: Option<String>,
    pub gemini_model: Option<String>,
    pub gemini_base_url: Option<String>,
    pub ideogram_base_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_file: Option<PathBuf>,
    pub gemini_api_key: Option<String>,
    pub ideogram_api_key: Option<String>,
    pub database_url: Option<String>,
    pub bind_address: Option<String>,
    pub gemini_model: Option<String>,
    pub gemini_base_url: Option<String>,
    pub ideogram_base_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

/// Fully resolved startup configuration
#[derive(Clone, PartialEq)]
pub struct AppConfig {
    pub gemini_api_key: String,
    pub ideogram_api_key: String,
    pub database_url: String,
    pub bind_address: String,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub ideogram_base_url: String,
    /// None keeps the HTTP client's default
    pub request_timeout: Option<Duration>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("gemini_api_key", &"<redacted>")
            .field("ideogram_api_key", &"<redacted>")
            .field("database_url", &self.database_url)
            .field("bind_address", &self.bind_address)
            .field("gemini_model", &self.gemini_model)
            .field("gemini_base_url", &self.gemini_base_url)
            .field("ideogram_base_url", &self.ideogram_base_url)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl AppConfig {
    /// Resolve configuration from the command line, process environment and
    /// config file
    pub fn resolve(cli: &ConfigOverrides) -> Result<Self> {
        let env = |name: &str| std::env::var(name).ok();
        let file = load_toml_config(cli.config_file.as_deref(), &env)?;
        Self::from_sources(cli, &env, &file)
    }

    /// Resolve from explicit sources
    ///
    /// `env` looks up an environment variable by name; tests pass a closure
    /// over a map instead of touching the process environment.
    pub fn from_sources<E>(cli: &ConfigOverrides, env: &E, file: &TomlConfig) -> Result<Self>
    where
        E: Fn(&str) -> Option<String>,
    {
        let pick = |cli_value: &Option<String>, var: &str, file_value: &Option<String>| {
            cli_value
                .clone()
                .or_else(|| env(var))
                .or_else(|| file_value.clone())
        };

        let gemini_api_key = require_credential(
            "Gemini API key",
            env_vars::GEMINI_API_KEY,
            pick(&cli.gemini_api_key, env_vars::GEMINI_API_KEY, &file.gemini_api_key),
        )?;
        let ideogram_api_key = require_credential(
            "Ideogram API key",
            env_vars::IDEOGRAM_API_KEY,
            pick(&cli.ideogram_api_key, env_vars::IDEOGRAM_API_KEY, &file.ideogram_api_key),
        )?;
        let database_url = require_database_url(pick(
            &cli.database_url,
            env_vars::DATABASE_URL,
            &file.database_url,
        ))?;

        let bind_address = pick(&cli.bind_address, env_vars::BIND_ADDRESS, &file.bind_address)
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());
        let gemini_model = pick(&cli.gemini_model, env_vars::GEMINI_MODEL, &file.gemini_model)
            .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string());
        let gemini_base_url = pick(&cli.gemini_base_url, env_vars::GEMINI_BASE_URL, &file.gemini_base_url)
            .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string());
        let ideogram_base_url = pick(
            &cli.ideogram_base_url,
            env_vars::IDEOGRAM_BASE_URL,
            &file.ideogram_base_url,
        )
        .unwrap_or_else(|| DEFAULT_IDEOGRAM_BASE_URL.to_string());

        let timeout_secs = match cli.request_timeout_secs {
            Some(secs) => Some(secs),
            None => match env(env_vars::REQUEST_TIMEOUT_SECS) {
                Some(raw) => Some(raw.trim().parse::<u64>().map_err(|_| {
                    Error::StartupConfig(format!(
                        "{} must be a whole number of seconds, got {:?}",
                        env_vars::REQUEST_TIMEOUT_SECS,
                        raw
                    ))
                })?),
                None => file.request_timeout_secs,
            },
        };
        let request_timeout = match timeout_secs {
            Some(0) => {
                return Err(Error::StartupConfig(
                    "request timeout must be greater than zero".to_string(),
                ))
            }
            other => other.map(Duration::from_secs),
        };

        Ok(Self {
            gemini_api_key,
            ideogram_api_key,
            database_url,
            bind_address: bind_address.trim().to_string(),
            gemini_model: gemini_model.trim().to_string(),
            gemini_base_url: trim_base_url(&gemini_base_url),
            ideogram_base_url: trim_base_url(&ideogram_base_url),
            request_timeout,
        })
    }
}

fn require_credential(label: &str, var: &str, value: Option<String>) -> Result<String> {
    let value = value.ok_or_else(|| {
        Error::StartupConfig(format!("{} is not configured (set {})", label, var))
    })?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::StartupConfig(format!("{} is blank", label)));
    }
    if trimmed.chars().any(char::is_whitespace) {
        return Err(Error::StartupConfig(format!("{} contains whitespace", label)));
    }
    Ok(trimmed.to_string())
}

fn require_database_url(value: Option<String>) -> Result<String> {
    let value = value.ok_or_else(|| {
        Error::StartupConfig(format!(
            "database URL is not configured (set {})",
            env_vars::DATABASE_URL
        ))
    })?;
    let trimmed = value.trim();
    if !trimmed.starts_with("sqlite:") {
        return Err(Error::StartupConfig(format!(
            "database URL must be a sqlite: URL, got {:?}",
            trimmed
        )));
    }
    Ok(trimmed.to_string())
}

fn trim_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

/// Default config file location: `<config_dir>/socialgen/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("socialgen").join("config.toml"))
}

/// Load the TOML config file
///
/// An explicitly named file (flag or `SOCIALGEN_CONFIG`) must exist. The
/// default location is optional: when absent, an empty config is returned.
pub fn load_toml_config<E>(explicit: Option<&Path>, env: &E) -> Result<TomlConfig>
where
    E: Fn(&str) -> Option<String>,
{
    let named = explicit
        .map(Path::to_path_buf)
        .or_else(|| env(env_vars::CONFIG_FILE).map(PathBuf::from));

    if let Some(path) = named {
        if !path.exists() {
            return Err(Error::StartupConfig(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        return read_toml_file(&path);
    }

    match default_config_path() {
        Some(path) if path.exists() => read_toml_file(&path),
        Some(path) => {
            debug!(path = %path.display(), "No config file at default location");
            Ok(TomlConfig::default())
        }
        None => {
            warn!("Could not determine config directory; skipping config file");
            Ok(TomlConfig::default())
        }
    }
}

fn read_toml_file(path: &Path) -> Result<TomlConfig> {
    let text = std::fs::read_to_string(path)?;
    let config: TomlConfig = toml::from_str(&text)?;
    info!(path = %path.display(), "Loaded config file");
    Ok(config)
}
