use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "hostguard.yaml";

#[derive(Debug, Default, Deserialize, Clone)]
pub struct ProbeConfig {
    pub timeout_ms: Option<u64>,
    pub concurrency: Option<usize>,
    pub qps: Option<u32>,
    pub retries: Option<u32>,
    pub retry_delay_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize, Clone)]
pub struct Config {
    /// Ordered list of folders whose files the baseline supervises.
    #[serde(default)]
    pub supervised_folders: Vec<PathBuf>,
    pub probe: Option<ProbeConfig>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found: {0}")]
    NotFound(PathBuf),
    #[error("cannot read configuration {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse configuration {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => PathBuf::from(DEFAULT_CONFIG_FILE),
    };
    if !path.exists() {
        return Err(ConfigError::NotFound(path));
    }
    let s = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;
    serde_yaml::from_str(&s).map_err(|source| ConfigError::Parse { path, source })
}

/// Like `load_config`, but an absent file is not an error; commands that
/// can run without configuration use this.
pub fn try_load_config(path: Option<&Path>) -> Result<Option<Config>, ConfigError> {
    match load_config(path) {
        Ok(c) => Ok(Some(c)),
        Err(ConfigError::NotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}
