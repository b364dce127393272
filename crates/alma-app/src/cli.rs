//! CLI argument definitions for the Alma application.
//!
//! Uses `clap` with derive macros for ergonomic argument parsing.
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

/// Alma, an AI chat assistant with conversation modes and session memory.
#[derive(Parser, Debug)]
#[command(name = "alma", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// API server port.
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,

    /// Data directory for the SQLite session store.
    #[arg(short = 'd', long = "data-dir")]
    pub data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > ALMA_CONFIG env var > platform default (~/.alma/config.toml).
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("ALMA_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the API server port.
    ///
    /// Priority: --port flag > ALMA_PORT env var > config file value > 3030.
    pub fn resolve_port(&self, config_port: u16) -> u16 {
        if let Some(p) = self.port {
            return p;
        }
        if let Ok(val) = std::env::var("ALMA_PORT") {
            if let Ok(p) = val.parse::<u16>() {
                return p;
            }
        }
        if config_port != 0 {
            return config_port;
        }
        3030
    }

    /// Resolve the data directory path.
    ///
    /// Priority: --data-dir flag > config file value.
    /// Returns `None` if not overridden (use config default).
    pub fn resolve_data_dir(&self) -> Option<String> {
        self.data_dir
            .as_ref()
            .map(|p| p.to_string_lossy().to_string())
    }

    /// Resolve the log level.
    ///
    /// Priority: --log-level flag > config file value.
    /// Returns `None` if not overridden.
    pub fn resolve_log_level(&self) -> Option<String> {
        self.log_level.clone()
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".alma").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".alma").join("config.toml");
    }
    PathBuf::from("config.toml")
}
