//! # Runtime Configuration Module
//!
//! Settings are layered, later sources winning:
//!
//! 1. built-in defaults;
//! 2. an optional YAML file (`--config blog.yaml`);
//! 3. a `.env` file in the working directory, then the process environment;
//! 4. command-line flags (applied by the CLI).
//!
//! ## Environment Variables
//!
//! | Variable           | Field        | Notes                                    |
//! |--------------------|--------------|------------------------------------------|
//! | `BLOG_BASE_PATH`   | `base_path`  | mount prefix, e.g. `/blog`               |
//! | `BLOG_SCRIPT_NAME` | `script_name`| entry script path; prefix is its dirname |
//! | `BLOG_ADDR`        | `addr`       | listen address                           |
//! | `BLOG_STACK_SIZE`  | `stack_size` | decimal (`16384`) or hex (`0x4000`)      |
//! | `BLOG_LOG_LEVEL`   | `log_level`  |                                          |
//! | `BLOG_LOG_FORMAT`  | `log_format` | `json` or `pretty`                       |
//!
//! ```yaml
//! base_path: /blog
//! addr: 0.0.0.0:8080
//! stack_size: 0x8000
//! log_format: pretty
//! ```

use crate::dispatcher::MountPrefix;
use crate::logging::{LogConfig, LogFormat};
use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer};
use std::env;
use std::path::Path;

pub const DEFAULT_STACK_SIZE: usize = 0x4000;
pub const DEFAULT_ADDR: &str = "127.0.0.1:8080";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Mount prefix; empty means the server root
    pub base_path: String,
    /// Entry script path, used to derive the prefix when `base_path` is empty
    pub script_name: Option<String>,
    pub addr: String,
    /// Coroutine stack size in bytes (default: 16 KB / 0x4000)
    #[serde(deserialize_with = "deserialize_stack_size")]
    pub stack_size: usize,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            base_path: String::new(),
            script_name: None,
            addr: DEFAULT_ADDR.to_string(),
            stack_size: DEFAULT_STACK_SIZE,
            log_level: "info".to_string(),
            log_format: LogFormat::Json,
        }
    }
}

/// Parse a stack size written in decimal or `0x`-prefixed hex.
pub fn parse_stack_size(raw: &str) -> Option<usize> {
    let raw = raw.trim();
    match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16).ok(),
        None => raw.parse().ok(),
    }
}

fn deserialize_stack_size<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(usize),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => parse_stack_size(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid stack size '{s}'"))),
    }
}

impl RuntimeConfig {
    /// Defaults, then `path` (if any), then `.env` and the environment.
    ///
    /// # Errors
    ///
    /// Unreadable or malformed config file, or an invalid environment value.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        dotenv_result(dotenvy::dotenv().map(|_| ()))?;
        config.apply_env_from(|key| env::var(key).ok())?;
        Ok(config)
    }

    /// Load a `.env` file from `path` into the process environment.
    ///
    /// # Errors
    ///
    /// A file that exists but cannot be read or parsed. A missing file is fine.
    pub fn load_dotenv_from(path: &Path) -> Result<()> {
        dotenv_result(dotenvy::from_path(path))
    }

    /// # Errors
    ///
    /// Unreadable file or invalid YAML.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_yaml_str(&content).with_context(|| format!("parsing {}", path.display()))
    }

    /// # Errors
    ///
    /// Invalid YAML or unknown keys.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Apply `BLOG_*` overrides from `lookup`.
    ///
    /// # Errors
    ///
    /// `BLOG_STACK_SIZE` that is neither decimal nor hex.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base_path) = lookup("BLOG_BASE_PATH") {
            self.base_path = base_path;
        }
        if let Some(script_name) = lookup("BLOG_SCRIPT_NAME") {
            self.script_name = Some(script_name);
        }
        if let Some(addr) = lookup("BLOG_ADDR") {
            self.addr = addr;
        }
        if let Some(raw) = lookup("BLOG_STACK_SIZE") {
            self.stack_size = parse_stack_size(&raw)
                .with_context(|| format!("BLOG_STACK_SIZE: invalid value '{raw}'"))?;
        }
        if let Some(level) = lookup("BLOG_LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(format) = lookup("BLOG_LOG_FORMAT") {
            self.log_format = LogFormat::parse(&format);
        }
        Ok(())
    }

    /// The mount prefix: `base_path` when set, else the directory of `script_name`.
    pub fn mount_prefix(&self) -> MountPrefix {
        if !self.base_path.trim().is_empty() {
            return MountPrefix::new(&self.base_path);
        }
        self.script_name
            .as_deref()
            .map(MountPrefix::from_script_name)
            .unwrap_or_default()
    }

    /// Logging settings: level and format from this config, the rest from the
    /// environment.
    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            log_level: self.log_level.clone(),
            format: self.log_format,
            ..LogConfig::from_env()
        }
    }
}

fn dotenv_result(result: dotenvy::Result<()>) -> Result<()> {
    match result {
        Err(e) if !e.not_found() => Err(e).context("loading .env"),
        _ => Ok(()),
    }
}
