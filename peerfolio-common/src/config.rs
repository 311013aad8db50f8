//! Server configuration loading
//!
//! Each setting is resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`PEERFOLIO_*`)
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing config file is not an error; a malformed value is.

use crate::moderation::ModerationPolicy;
use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5740";
/// 30 days
pub const DEFAULT_SESSION_TTL_SECONDS: i64 = 30 * 24 * 60 * 60;
pub const DEFAULT_BCRYPT_COST: u32 = 10;
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5000;

pub const ENV_BIND_ADDR: &str = "PEERFOLIO_BIND_ADDR";
pub const ENV_DATABASE_PATH: &str = "PEERFOLIO_DATABASE_PATH";
pub const ENV_SESSION_TTL_SECONDS: &str = "PEERFOLIO_SESSION_TTL_SECONDS";
pub const ENV_BCRYPT_COST: &str = "PEERFOLIO_BCRYPT_COST";
pub const ENV_MODERATION: &str = "PEERFOLIO_MODERATION";
pub const ENV_BUSY_TIMEOUT_MS: &str = "PEERFOLIO_BUSY_TIMEOUT_MS";

/// Fully resolved settings for the server
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub database_path: PathBuf,
    pub session_ttl_seconds: i64,
    pub bcrypt_cost: u32,
    pub moderation: ModerationPolicy,
    pub busy_timeout_ms: u64,
}

/// Settings given on the command line; `None` means "not given"
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub bind_addr: Option<String>,
    pub database_path: Option<PathBuf>,
    pub moderation: Option<ModerationPolicy>,
}

/// Contents of `config.toml`; every key is optional
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    pub bind_addr: Option<String>,
    pub database_path: Option<PathBuf>,
    pub session_ttl_seconds: Option<i64>,
    pub bcrypt_cost: Option<u32>,
    pub moderation: Option<ModerationPolicy>,
    pub busy_timeout_ms: Option<u64>,
}

impl TomlConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid config file: {}", e)))
    }

    /// Read `path`; a missing file yields an empty config
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                info!("Loaded config file {}", path.display());
                Self::from_toml_str(&content)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Config file {} not found, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl ServerConfig {
    /// Resolve against the environment and the config file at `config_file`
    /// (or the platform location when `None`)
    pub fn load(cli: &CliOverrides, config_file: Option<&Path>) -> Result<Self> {
        let toml = match config_file {
            Some(path) => TomlConfig::load(path)?,
            None => match default_config_file() {
                Some(path) => TomlConfig::load(&path)?,
                None => TomlConfig::default(),
            },
        };
        Self::resolve(cli, &toml)
    }

    /// Apply CLI > environment > TOML > default for every key
    pub fn resolve(cli: &CliOverrides, toml: &TomlConfig) -> Result<Self> {
        let bind_addr = cli
            .bind_addr
            .clone()
            .or_else(|| env_value(ENV_BIND_ADDR))
            .or_else(|| toml.bind_addr.clone())
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        let database_path = cli
            .database_path
            .clone()
            .or_else(|| env_value(ENV_DATABASE_PATH).map(PathBuf::from))
            .or_else(|| toml.database_path.clone())
            .unwrap_or_else(default_database_path);

        let moderation = match cli.moderation {
            Some(policy) => policy,
            None => match env_value(ENV_MODERATION) {
                Some(value) => parse_moderation(&value)?,
                None => toml.moderation.unwrap_or_default(),
            },
        };

        let session_ttl_seconds = env_parsed(ENV_SESSION_TTL_SECONDS)?
            .or(toml.session_ttl_seconds)
            .unwrap_or(DEFAULT_SESSION_TTL_SECONDS);
        if session_ttl_seconds <= 0 {
            return Err(Error::Config(
                "session_ttl_seconds must be positive".to_string(),
            ));
        }

        let bcrypt_cost = env_parsed(ENV_BCRYPT_COST)?
            .or(toml.bcrypt_cost)
            .unwrap_or(DEFAULT_BCRYPT_COST);
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(Error::Config(format!(
                "bcrypt_cost must be between 4 and 31, got {}",
                bcrypt_cost
            )));
        }

        let busy_timeout_ms = env_parsed(ENV_BUSY_TIMEOUT_MS)?
            .or(toml.busy_timeout_ms)
            .unwrap_or(DEFAULT_BUSY_TIMEOUT_MS);

        Ok(Self {
            bind_addr,
            database_path,
            session_ttl_seconds,
            bcrypt_cost,
            moderation,
            busy_timeout_ms,
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            database_path: default_database_path(),
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            bcrypt_cost: DEFAULT_BCRYPT_COST,
            moderation: ModerationPolicy::default(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

impl FromStr for ModerationPolicy {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        parse_moderation(value)
    }
}

fn parse_moderation(value: &str) -> Result<ModerationPolicy> {
    match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
        "auto_approve" => Ok(ModerationPolicy::AutoApprove),
        "require_approval" => Ok(ModerationPolicy::RequireApproval),
        other => Err(Error::Config(format!(
            "Unknown moderation policy '{}' (expected auto_approve or require_approval)",
            other
        ))),
    }
}

/// Non-empty environment variable
fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_parsed<T: FromStr>(name: &str) -> Result<Option<T>> {
    match env_value(name) {
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::Config(format!("{} has an invalid value: {}", name, value))),
        None => Ok(None),
    }
}

/// First existing platform config file
///
/// Linux: `~/.config/peerfolio/config.toml`, then `/etc/peerfolio/config.toml`.
/// Elsewhere: the platform config directory only.
pub fn default_config_file() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("peerfolio").join("config.toml"));
    if let Some(path) = user_config.filter(|p| p.exists()) {
        return Some(path);
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/peerfolio/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }
    None
}

/// OS-dependent default database location
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("peerfolio"))
        .unwrap_or_else(|| PathBuf::from("./peerfolio_data"))
        .join("peerfolio.db")
}
