use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default port when none is given on the command line.
pub const DEFAULT_PORT: u16 = 4040;

/// Optional settings loaded from a TOML file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Name of the ignore file looked up in the root and each ancestor
    #[serde(default = "default_ignore_file")]
    pub ignore_file: String,

    /// Syntect theme used for highlighted source
    #[serde(default = "default_theme")]
    pub theme: String,

    /// Text files above this size are streamed raw instead of rendered
    #[serde(default = "default_max_render_bytes")]
    pub max_render_bytes: u64,

    /// Script URL that renders Mermaid diagrams in the browser
    #[serde(default = "default_mermaid_script")]
    pub mermaid_script: String,
}

fn default_ignore_file() -> String {
    ".gitignore".to_string()
}

fn default_theme() -> String {
    "InspiredGitHub".to_string()
}

fn default_max_render_bytes() -> u64 {
    2 * 1024 * 1024 // 2 MB
}

fn default_mermaid_script() -> String {
    "https://cdn.jsdelivr.net/npm/mermaid@10/dist/mermaid.min.js".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ignore_file: default_ignore_file(),
            theme: default_theme(),
            max_render_bytes: default_max_render_bytes(),
            mermaid_script: default_mermaid_script(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadSettings {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::ParseSettings {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Startup configuration. Built once from the command line and never mutated.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Canonical root directory
    pub root_dir: PathBuf,
    pub port: u16,
    pub bind: String,
    pub settings: Settings,
}

impl ServerConfig {
    /// Resolve the root directory to an absolute path and check it is a directory.
    pub fn new(root: &Path, port: u16, bind: String, settings: Settings) -> Result<Self, ConfigError> {
        let root_dir = root
            .canonicalize()
            .map_err(|_| ConfigError::RootNotFound(root.to_path_buf()))?;

        if !root_dir.is_dir() {
            return Err(ConfigError::NotADirectory(root_dir));
        }

        Ok(Self {
            root_dir,
            port,
            bind,
            settings,
        })
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.bind, self.port);
        addr.parse().map_err(|_| ConfigError::InvalidAddress(addr))
    }
}
