//! Storage Module
//!
//! Building blocks behind `BlogStorage`: the entry model, the naming
//! scheme, the JSON index, statistics, and consistency checks.
//!
//! ## Responsibilities
//! - Name blog directories and stage files deterministically
//! - Load and atomically persist the metadata index
//! - Answer lookups over the index (by key, by directory, latest)
//! - Compare the index against the content tree
//!
//! ## On-disk Layout
//! ```text
//! {storage_root}/
//! ├── metadata.json                         [ {topic, directory, stage,
//! │                                            filename, created_at,
//! │                                            file_path}, ... ]
//! ├── ai_and_robotics_20240101_120000/
//! │   ├── draft_blog_post.md
//! │   └── final_blog_post.md
//! └── rust_tips_20240102_093000/
//!     └── final_blog_post.md
//! ```

mod consistency;
mod entry;
mod index;
mod stats;

pub mod naming;

pub use consistency::{ConsistencyReport, OrphanFile};
pub use entry::{parse_created_at, stage_rank, BlogEntry, CREATED_AT_FORMAT, STAGE_DRAFT, STAGE_FINAL};
pub use index::{MetadataIndex, INDEX_FILENAME, INDEX_TEMP_FILENAME};
pub use stats::StorageStats;
