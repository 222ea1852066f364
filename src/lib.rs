//! # blogstore
//!
//! Storage for generated blog posts:
//! - One directory per blog, one markdown file per stage
//! - A JSON metadata index kept consistent with the files
//! - List, read, latest, search, delete and statistics queries
//! - Consistency checks and repair for index/filesystem desync
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │            Content producer / CLI / renderers                │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ (topic, content, stage)
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                     BlogStorage                              │
//! │        (load → modify → persist, one writer at a time)       │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌──────────────┐         ┌───────────────┐
//!   │ metadata.json│         │ {directory}/  │
//!   │   (index)    │         │ {stage}_blog_ │
//!   │              │         │   post.md     │
//!   └──────────────┘         └───────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod storage;
pub mod content;
pub mod blog_storage;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{BlogError, Result};
pub use config::{Config, SessionPolicy};
pub use blog_storage::BlogStorage;
pub use storage::{BlogEntry, ConsistencyReport, StorageStats};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of blogstore
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
