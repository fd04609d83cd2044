use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::tool_paths::Tool;

/// Environment variable that points at an alternative `zile.toml`
pub const CONFIG_ENV: &str = "ZILE_CONFIG";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// User settings read from `zile.toml`. Every key is optional.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compiler_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alternate_compiler_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attw_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publint_path: Option<String>,
    /// Kill the compiler if it runs longer than this
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compile_timeout_secs: Option<u64>,
}

impl Config {
    /// Location of the config file.
    ///
    /// `ZILE_CONFIG` wins when set and non-empty, otherwise the platform config
    /// directory is used (`~/.config/zile/zile.toml` on Unix).
    pub fn path() -> Option<PathBuf> {
        if let Ok(env_path) = std::env::var(CONFIG_ENV) {
            let trimmed = env_path.trim();
            if !trimmed.is_empty() {
                return Some(PathBuf::from(trimmed));
            }
        }

        #[cfg(not(target_os = "windows"))]
        let default = dirs::home_dir().map(|home| home.join(".config").join("zile").join("zile.toml"));

        #[cfg(target_os = "windows")]
        let default = dirs::config_dir().map(|dir| dir.join("zile").join("zile.toml"));

        default
    }

    /// Load from the default location, falling back to defaults when absent
    pub fn load() -> Result<Self, ConfigError> {
        match Self::path() {
            Some(path) => Self::load_from_path(&path),
            None => Ok(Config::default()),
        }
    }

    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Explicit binary path configured for a tool, if any
    pub fn tool_override(&self, tool: Tool) -> Option<&str> {
        let value = match tool {
            Tool::Compiler => self.compiler_path.as_deref(),
            Tool::AlternateCompiler => self.alternate_compiler_path.as_deref(),
            Tool::Attw => self.attw_path.as_deref(),
            Tool::Publint => self.publint_path.as_deref(),
        };
        value.map(str::trim).filter(|v| !v.is_empty())
    }

    pub fn compile_timeout(&self) -> Option<Duration> {
        self.compile_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}
