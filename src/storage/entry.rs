//! Blog Entry
//!
//! One indexed `(directory, stage)` record pointing to a content file.

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Conventional stage for work-in-progress text
pub const STAGE_DRAFT: &str = "draft";

/// Conventional stage for the published text; the default read stage
pub const STAGE_FINAL: &str = "final";

/// Format of `created_at` values written by this crate
pub const CREATED_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// A single saved post-version
///
/// Field names and order match the on-disk `metadata.json` layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogEntry {
    /// User-supplied subject
    pub topic: String,

    /// Blog directory name; primary key of a blog
    pub directory: String,

    /// Free-text stage tag (`draft`, `final`, or anything else)
    pub stage: String,

    /// `{stage}_blog_post.md`
    pub filename: String,

    /// ISO-8601 save time
    pub created_at: String,

    /// `{storage_root}/{directory}/{filename}`
    pub file_path: String,
}

impl BlogEntry {
    /// True when this entry is the `(directory, stage)` record
    pub fn is_key(&self, directory: &str, stage: &str) -> bool {
        self.directory == directory && self.stage == stage
    }

    /// Parsed `created_at`, if it is a recognizable ISO-8601 timestamp
    ///
    /// Accepts naive local timestamps (what this crate writes) and RFC 3339
    /// timestamps with an offset.
    pub fn created_at_time(&self) -> Option<NaiveDateTime> {
        parse_created_at(&self.created_at)
    }

    /// Chronological comparison of `created_at`
    ///
    /// Parsed timestamps compare by time. Entries whose timestamp does not
    /// parse sort before those that do, and among themselves by raw string.
    pub fn cmp_created(&self, other: &BlogEntry) -> Ordering {
        match (self.created_at_time(), other.created_at_time()) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => self.created_at.cmp(&other.created_at),
        }
    }
}

/// Parse a `created_at` string
pub fn parse_created_at(value: &str) -> Option<NaiveDateTime> {
    if let Ok(time) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(time);
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|time| time.naive_local())
}

/// Preference rank of a stage when choosing among several stages of one
/// blog: lower is preferred. `final` ranks 0, `draft` 1, anything else 2.
pub fn stage_rank(stage: &str) -> u8 {
    match stage {
        STAGE_FINAL => 0,
        STAGE_DRAFT => 1,
        _ => 2,
    }
}
