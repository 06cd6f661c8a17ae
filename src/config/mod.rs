//! Server configuration: listen address, knowledge table, buffer URI, log filter.
//!
//! Explicit file: `--config <path>` (must parse).
//! Project file: `.pyintel/config.yaml` (ignored with a warning when malformed).
//!
//! Resolution: file (explicit or project) → defaults for missing keys →
//! `PYINTEL_*` env vars → CLI flags (applied by the binary).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Project-level config path, relative to the working directory.
pub const PROJECT_CONFIG: &str = ".pyintel/config.yaml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid value for {var}: '{value}'")]
    InvalidEnv { var: &'static str, value: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Replacement knowledge table. The built-in table when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub knowledge_base: Option<PathBuf>,
    /// URI reported for definitions inside the request buffer.
    pub buffer_uri: String,
    /// Default `tracing` directive, added on top of `RUST_LOG`.
    pub log_filter: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8000,
            knowledge_base: None,
            buffer_uri: "untitled.py".into(),
            log_filter: "pyintel=info".into(),
        }
    }
}

/// A resolved config plus the project file error that was skipped, if any.
/// Logging is not up yet when the file is read, so the caller reports it.
#[derive(Debug)]
pub struct Loaded {
    pub config: ServerConfig,
    pub ignored: Option<ConfigError>,
}

impl ServerConfig {
    /// Load from `explicit`, or from the project file when present.
    pub fn load(explicit: Option<&Path>) -> ConfigResult<Loaded> {
        if let Some(path) = explicit {
            return Ok(Loaded {
                config: Self::load_file(path)?,
                ignored: None,
            });
        }
        Ok(Self::load_project(Path::new(PROJECT_CONFIG)))
    }

    /// Load and parse one file. Missing keys take defaults.
    pub fn load_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&content).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Project file: absent means defaults, malformed means defaults plus the error.
    fn load_project(path: &Path) -> Loaded {
        if !path.exists() {
            return Loaded {
                config: Self::default(),
                ignored: None,
            };
        }
        match Self::load_file(path) {
            Ok(config) => Loaded {
                config,
                ignored: None,
            },
            Err(e) => Loaded {
                config: Self::default(),
                ignored: Some(e),
            },
        }
    }

    /// Apply `PYINTEL_HOST`, `PYINTEL_PORT` and `PYINTEL_KNOWLEDGE_BASE`.
    pub fn apply_env(&mut self) -> ConfigResult<()> {
        self.apply_env_with(|var| std::env::var(var).ok())
    }

    /// Same as [`apply_env`](Self::apply_env) with an injectable lookup.
    pub fn apply_env_with(&mut self, var: impl Fn(&str) -> Option<String>) -> ConfigResult<()> {
        if let Some(host) = var("PYINTEL_HOST").filter(|h| !h.is_empty()) {
            self.host = host;
        }
        if let Some(port) = var("PYINTEL_PORT") {
            self.port = port.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                var: "PYINTEL_PORT",
                value: port.clone(),
            })?;
        }
        if let Some(kb) = var("PYINTEL_KNOWLEDGE_BASE").filter(|p| !p.is_empty()) {
            self.knowledge_base = Some(PathBuf::from(kb));
        }
        Ok(())
    }

    /// `host:port` for binding.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
