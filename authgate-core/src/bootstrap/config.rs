//! Configuration loading

use std::fmt;
use std::path::Path;

use super::StartupError;
use crate::Config;

const CONFIG_PATH_ENV: &str = "AUTHGATE_CONFIG_PATH";
const CWD_CONFIG: &str = "config.yml";
const MOUNTED_CONFIG: &str = "/config/config.yml";

/// Where the configuration was read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(String),
    Environment,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => f.write_str(path),
            Self::Environment => f.write_str("<env>"),
        }
    }
}

/// Load configuration from a config file and environment variables
///
/// Config file search order:
/// 1. `explicit` (the `--config` flag)
/// 2. `AUTHGATE_CONFIG_PATH` environment variable
/// 3. ./config.yml (current working directory)
/// 4. /config/config.yml (container mount path)
/// 5. Environment variables only
///
/// Runs before logging is initialized, so progress goes to stderr and the
/// caller logs the returned source once logging is up.
pub fn load_config(explicit: Option<&str>) -> Result<(Config, ConfigSource), StartupError> {
    let config_path = find_config_file(explicit, std::env::var(CONFIG_PATH_ENV).ok());

    let config = match &config_path {
        Some(path) => {
            eprintln!("Loading config from {path}");
            Config::from_file(path)
        }
        None => {
            eprintln!("No config file found, using environment variables");
            Config::from_env()
        }
    }
    .map_err(|e| StartupError::InvalidConfig(vec![e.to_string()]))?;

    config.validate().map_err(StartupError::InvalidConfig)?;

    let source = config_path.map_or(ConfigSource::Environment, ConfigSource::File);
    Ok((config, source))
}

fn find_config_file(explicit: Option<&str>, from_env: Option<String>) -> Option<String> {
    explicit
        .map(ToString::to_string)
        .into_iter()
        .chain(from_env)
        .chain([CWD_CONFIG.to_string(), MOUNTED_CONFIG.to_string()])
        .find(|path| Path::new(path).exists())
}
