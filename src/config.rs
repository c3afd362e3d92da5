//! Process configuration.
//!
//! - data file: first command-line argument, else `NAMESCOPE_DATA`, else
//!   [`DEFAULT_DATA_PATH`] in the working directory.
//! - log level: `NAMESCOPE_LOG`, else `info`. `RUST_LOG` still wins when set,
//!   since `env_logger` reads it first.

use std::path::PathBuf;

pub const DEFAULT_DATA_PATH: &str = "OGDEXT_VORNAMEN_1.csv";
pub const DEFAULT_LOG_LEVEL: &str = "info";

pub const DATA_PATH_ENV: &str = "NAMESCOPE_DATA";
pub const LOG_LEVEL_ENV: &str = "NAMESCOPE_LOG";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_path: PathBuf,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl Config {
    /// Read the configuration of the running process.
    pub fn from_env() -> Self {
        Self::resolve(
            std::env::args().nth(1),
            std::env::var(DATA_PATH_ENV).ok(),
            std::env::var(LOG_LEVEL_ENV).ok(),
        )
    }

    /// Combine the individual sources; empty values count as unset.
    pub fn resolve(arg_path: Option<String>, env_path: Option<String>, env_log: Option<String>) -> Self {
        let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        let defaults = Self::default();
        Self {
            data_path: non_empty(arg_path)
                .or_else(|| non_empty(env_path))
                .map(PathBuf::from)
                .unwrap_or(defaults.data_path),
            log_level: non_empty(env_log).unwrap_or(defaults.log_level),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argument_beats_environment() {
        let config = Config::resolve(Some("cli.csv".into()), Some("env.csv".into()), None);
        assert_eq!(config.data_path, PathBuf::from("cli.csv"));
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn falls_back_to_environment_then_default() {
        let config = Config::resolve(None, Some("env.parquet".into()), Some("debug".into()));
        assert_eq!(config.data_path, PathBuf::from("env.parquet"));
        assert_eq!(config.log_level, "debug");

        let config = Config::resolve(Some(" ".into()), None, Some(String::new()));
        assert_eq!(config, Config::default());
    }
}
