use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use clap::Parser;
use log::LevelFilter;
use serde::Deserialize;

use super::types::SeedConfig;
use crate::error_handling::types::ConfigError;

pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:5000";
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Command-line arguments.
///
/// Every option overrides the matching key of the configuration file.
#[derive(Parser, Debug, Clone)]
#[command(name = "registrar")]
#[command(version)]
#[command(about = "Student records administration service")]
pub struct Args {
    /// Path of the TOML configuration file
    pub config_file: PathBuf,

    /// Address the web interface listens on, as `host:port`
    ///
    /// # Command Line
    /// Use `--bind-address <ADDRESS>` or `REGISTRAR_BIND_ADDRESS`
    #[arg(long, env = "REGISTRAR_BIND_ADDRESS")]
    pub bind_address: Option<String>,

    /// SeaORM connection URL of the SQLite database
    ///
    /// # Command Line
    /// Use `--database-url <URL>` or `REGISTRAR_DATABASE_URL`
    #[arg(long, env = "REGISTRAR_DATABASE_URL")]
    pub database_url: Option<String>,

    /// One of `off`, `error`, `warn`, `info`, `debug`, `trace`
    #[arg(long)]
    pub log_level: Option<String>,
}

/// Application configuration.
///
/// Read from a TOML file, then overridden by [`Args`], then validated.
///
/// # Example file
///
/// ```toml
/// bind_address = "127.0.0.1:5000"
/// database_url = "sqlite://registrar.sqlite3?mode=rwc"
/// log_level = "info"
///
/// [[seed.students]]
/// id = "S1"
/// name = "Ann Lee"
///
/// [[seed.courses]]
/// code = "CST8002"
/// title = "Programming Language Research"
///
/// [[seed.roles]]
/// id = 1
/// title = "Instructor"
/// ```
///
/// # Fields Overview
///
/// - `bind_address`: where the web interface listens
/// - `database_url`: SQLite URL; tables are created on first connect
/// - `log_level`: default level handed to `env_logger` (`RUST_LOG` still wins)
/// - `seed`: reference rows inserted at startup when missing
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default)]
    pub database_url: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub seed: SeedConfig,
}

fn default_bind_address() -> String {
    DEFAULT_BIND_ADDRESS.to_string()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl Config {
    /// Parse and validate a configuration file, without command-line overrides.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::read_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Read `args.config_file`, apply the overrides in `args`, then validate.
    pub fn load(args: &Args) -> Result<Self, ConfigError> {
        let mut config = Self::read_file(&args.config_file)?;
        config.apply_args(args);
        config.validate()?;
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::TomlError(e.to_string()))
    }

    fn apply_args(&mut self, args: &Args) {
        if let Some(bind_address) = &args.bind_address {
            self.bind_address = bind_address.clone();
        }
        if let Some(database_url) = &args.database_url {
            self.database_url = database_url.clone();
        }
        if let Some(log_level) = &args.log_level {
            self.log_level = log_level.clone();
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let addr = SocketAddr::from_str(&self.bind_address).map_err(|e| {
            ConfigError::BadIPFormatting(format!("{}: {}", self.bind_address, e))
        })?;
        if addr.port() == 0 {
            return Err(ConfigError::NotInRange(
                "bind_address port must be between 1 and 65535".to_string(),
            ));
        }

        if self.database_url.trim().is_empty() {
            return Err(ConfigError::MissingDatabase(
                "database_url is not set".to_string(),
            ));
        }
        if !self.database_url.starts_with("sqlite:") {
            return Err(ConfigError::MissingDatabase(format!(
                "unsupported database url {}",
                self.database_url
            )));
        }

        self.log_filter()?;
        Ok(())
    }

    pub fn log_filter(&self) -> Result<LevelFilter, ConfigError> {
        LevelFilter::from_str(&self.log_level)
            .map_err(|_| ConfigError::NotInRange(format!("unknown log level {}", self.log_level)))
    }
}
