//! CLI argument definitions for the Sage server.
//!
//! Uses `clap` with derive macros for ergonomic argument parsing.
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

use sage_core::config::SageConfig;
use sage_core::error::SageError;

/// Sage - a chat assistant that routes questions to math, lookup, or reasoning handlers.
#[derive(Parser, Debug)]
#[command(name = "sage", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// HTTP server port.
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Default completion-service key for sessions opened without one.
    #[arg(long = "api-key")]
    pub api_key: Option<String>,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > SAGE_CONFIG env var > platform default (~/.sage/config.toml).
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("SAGE_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the HTTP server port.
    ///
    /// Priority: --port flag > SAGE_PORT env var > config file value > 3030.
    pub fn resolve_port(&self, config_port: u16) -> u16 {
        if let Some(p) = self.port {
            return p;
        }
        if let Ok(val) = std::env::var("SAGE_PORT") {
            if let Ok(p) = val.parse::<u16>() {
                return p;
            }
        }
        if config_port != 0 {
            return config_port;
        }
        3030
    }

    /// Resolve the log level.
    ///
    /// Priority: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config_level.to_string())
    }

    /// Resolve the default API key.
    ///
    /// Priority: --api-key flag > the env var named by `llm.api_key_env`.
    /// Blank values count as unset.
    pub fn resolve_api_key(&self, key_env: &str) -> Option<String> {
        first_non_blank(self.api_key.clone(), std::env::var(key_env).ok())
    }

    /// Whether the config path was named by flag or environment.
    pub fn config_is_explicit(&self) -> bool {
        self.config.is_some() || std::env::var_os("SAGE_CONFIG").is_some()
    }

    /// Load the configuration file.
    ///
    /// An explicitly named file must load and validate. The platform default
    /// path falls back to built-in defaults with a warning.
    pub fn load_config(&self) -> Result<(PathBuf, SageConfig), SageError> {
        let path = self.resolve_config_path();
        let config = if self.config_is_explicit() {
            SageConfig::load(&path)?
        } else {
            SageConfig::load_or_default(&path)
        };
        Ok((path, config))
    }
}

fn first_non_blank(flag: Option<String>, env: Option<String>) -> Option<String> {
    let non_blank = |k: &String| !k.trim().is_empty();
    flag.filter(non_blank).or_else(|| env.filter(non_blank))
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".sage").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".sage").join("config.toml");
    }
    PathBuf::from("config.toml")
}
