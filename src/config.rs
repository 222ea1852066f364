//! Configuration for blogstore
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{BlogError, Result};

/// Environment variable that overrides the storage root
pub const STORAGE_ROOT_ENV: &str = "BLOG_STORAGE_ROOT";

/// Default storage root, relative to the working directory
pub const DEFAULT_STORAGE_ROOT: &str = "blogs";

/// Main configuration for a BlogStorage instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for the index and all blog directories
    /// Internal structure:
    ///   {storage_root}/
    ///     ├── metadata.json                 (index)
    ///     └── {slug}_{YYYYMMDD_HHMMSS}/
    ///           ├── draft_blog_post.md
    ///           └── final_blog_post.md
    pub storage_root: PathBuf,

    // -------------------------------------------------------------------------
    // Session Configuration
    // -------------------------------------------------------------------------
    /// How saves of the same topic map onto directories
    pub session_policy: SessionPolicy,
}

/// Directory allocation policy for repeated saves of one topic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPolicy {
    /// The first save of a topic creates its directory; later saves of the
    /// same topic through the same `BlogStorage` add stage files to it
    Accumulate,

    /// Every save creates a fresh directory
    DirectoryPerSave,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_root: PathBuf::from(DEFAULT_STORAGE_ROOT),
            session_policy: SessionPolicy::Accumulate,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Default config with the storage root taken from `BLOG_STORAGE_ROOT`
    /// when it is set
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();
        if let Some(root) = std::env::var_os(STORAGE_ROOT_ENV) {
            if root.is_empty() {
                return Err(BlogError::Config(format!("{} is set but empty", STORAGE_ROOT_ENV)));
            }
            config.storage_root = PathBuf::from(root);
        }
        Ok(config)
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the storage root directory
    pub fn storage_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.storage_root = path.into();
        self
    }

    /// Set the session policy
    pub fn session_policy(mut self, policy: SessionPolicy) -> Self {
        self.config.session_policy = policy;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
