//! Local documentation server.
//!
//! Browses a directory tree over HTTP: directories become listings, Markdown is
//! rendered, source files are highlighted and HTML pages get a navigation
//! header. Paths hidden by `.gitignore` rules behave as if they did not exist.

pub mod classify;
pub mod config;
pub mod error;
pub mod guard;
pub mod handlers;
pub mod ignore_rules;
pub mod listing;
pub mod render;
pub mod routes;

use std::path::PathBuf;
use std::sync::Arc;

pub use config::{ServerConfig, Settings};
pub use error::{ConfigError, ServerError};
pub use ignore_rules::IgnoreCache;
pub use render::{HtmlRenderer, Renderer};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Root directory to serve files from
    pub root_dir: PathBuf,
    /// Settings
    pub settings: Arc<Settings>,
    /// Ignore rules per root, built on first use
    pub ignore: Arc<IgnoreCache>,
    /// Produces the HTML for listings and files
    pub renderer: Arc<dyn Renderer>,
}

impl AppState {
    /// Create a new AppState with the given root directory and default settings.
    pub fn new(root_dir: PathBuf) -> Self {
        Self::with_settings(root_dir, Settings::default())
    }

    /// Create a new AppState with the given root directory and settings.
    pub fn with_settings(root_dir: PathBuf, settings: Settings) -> Self {
        let ignore = Arc::new(IgnoreCache::new(settings.ignore_file.clone()));
        let renderer: Arc<dyn Renderer> = Arc::new(HtmlRenderer::new(&settings));
        Self {
            root_dir,
            settings: Arc::new(settings),
            ignore,
            renderer,
        }
    }

    /// Swap in a different ignore cache, e.g. a pre-seeded one.
    pub fn with_ignore_cache(mut self, ignore: Arc<IgnoreCache>) -> Self {
        self.ignore = ignore;
        self
    }

    /// Swap in a different renderer.
    pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = renderer;
        self
    }
}

impl From<&ServerConfig> for AppState {
    fn from(config: &ServerConfig) -> Self {
        Self::with_settings(config.root_dir.clone(), config.settings.clone())
    }
}
