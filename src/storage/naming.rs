//! Naming Scheme
//!
//! Maps topics and stages onto filesystem names.
//!
//! ```text
//! "AI and Robotics" ─slugify→ "ai_and_robotics"
//!                   ─+ timestamp→ "ai_and_robotics_20240101_120000"
//!                   ─+ collision→ "ai_and_robotics_20240101_120000_2"
//! stage "draft"     ─→ "draft_blog_post.md"
//! ```

use chrono::NaiveDateTime;

use crate::error::{BlogError, Result};

/// Maximum slug length in characters
pub const MAX_SLUG_LEN: usize = 50;

/// Slug used when a topic has no alphanumeric characters at all
pub const FALLBACK_SLUG: &str = "blog";

/// Timestamp suffix format for directory names
pub const DIRECTORY_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Suffix shared by every stage file
pub const STAGE_FILE_SUFFIX: &str = "_blog_post.md";

/// Convert a topic into a filesystem-safe slug
///
/// Lowercases, collapses every run of non-alphanumeric characters into a
/// single `_`, trims leading/trailing `_`, and caps the length.
pub fn slugify(topic: &str) -> String {
    let mut slug = String::with_capacity(topic.len());
    let mut pending_sep = false;

    for c in topic.chars() {
        if c.is_alphanumeric() {
            if pending_sep && !slug.is_empty() {
                slug.push('_');
            }
            pending_sep = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_sep = true;
        }
    }

    // Truncate on a char boundary, then drop a dangling separator
    let mut slug: String = slug.chars().take(MAX_SLUG_LEN).collect();
    while slug.ends_with('_') {
        slug.pop();
    }

    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

/// Base directory name: `{slug}_{YYYYMMDD_HHMMSS}`
pub fn directory_name(slug: &str, at: NaiveDateTime) -> String {
    format!("{}_{}", slug, at.format(DIRECTORY_TIMESTAMP_FORMAT))
}

/// Directory name for the n-th attempt at a base name
///
/// Attempt 1 is the base itself; later attempts append `_2`, `_3`, ...
pub fn disambiguated(base: &str, attempt: u32) -> String {
    if attempt <= 1 {
        base.to_string()
    } else {
        format!("{}_{}", base, attempt)
    }
}

/// Content filename for a stage: `{stage}_blog_post.md`
pub fn stage_filename(stage: &str) -> String {
    format!("{}{}", stage, STAGE_FILE_SUFFIX)
}

/// Stage encoded in a content filename
/// "draft_blog_post.md" → Some("draft")
pub fn parse_stage_filename(filename: &str) -> Option<&str> {
    let stage = filename.strip_suffix(STAGE_FILE_SUFFIX)?;
    if stage.is_empty() {
        None
    } else {
        Some(stage)
    }
}

/// Reject names that would escape their parent directory
///
/// Applies to stages and directory names supplied by callers.
pub fn validate_component(kind: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(BlogError::InvalidInput(format!("{} must not be empty", kind)));
    }
    if value == "." || value == ".." || value.contains(['/', '\\', '\0']) {
        return Err(BlogError::InvalidInput(format!(
            "{} '{}' is not a valid path component",
            kind, value
        )));
    }
    Ok(())
}
