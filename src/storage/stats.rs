//! Storage Statistics
//!
//! Read-only aggregation over the index and the content files.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use super::entry::BlogEntry;
use super::naming::stage_filename;

/// Aggregate view of a storage root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageStats {
    /// Number of index entries
    pub total_entries: usize,

    /// Number of distinct blog directories
    pub total_directories: usize,

    /// Sum of the sizes of all content files present on disk
    pub total_bytes: u64,

    /// Entries whose content file is missing (not counted in `total_bytes`)
    pub missing_files: usize,

    /// Entry count per stage, ordered by stage name
    pub stages: BTreeMap<String, usize>,

    /// `created_at` of the oldest entry
    pub oldest_created_at: Option<String>,

    /// `created_at` of the newest entry
    pub newest_created_at: Option<String>,

    /// Root the stats were collected from
    pub storage_root: PathBuf,
}

impl StorageStats {
    /// Aggregate `entries` whose files live under `root`
    pub fn collect(root: &Path, entries: &[BlogEntry]) -> Self {
        let mut directories = HashSet::new();
        let mut stages: BTreeMap<String, usize> = BTreeMap::new();
        let mut total_bytes = 0u64;
        let mut missing_files = 0usize;

        for entry in entries {
            directories.insert(entry.directory.as_str());
            *stages.entry(entry.stage.clone()).or_insert(0) += 1;

            let path = root.join(&entry.directory).join(stage_filename(&entry.stage));
            match fs::metadata(&path) {
                Ok(meta) if meta.is_file() => total_bytes += meta.len(),
                _ => missing_files += 1,
            }
        }

        let oldest = entries.iter().min_by(|a, b| a.cmp_created(b));
        let newest = entries.iter().max_by(|a, b| a.cmp_created(b));

        Self {
            total_entries: entries.len(),
            total_directories: directories.len(),
            total_bytes,
            missing_files,
            stages,
            oldest_created_at: oldest.map(|e| e.created_at.clone()),
            newest_created_at: newest.map(|e| e.created_at.clone()),
            storage_root: root.to_path_buf(),
        }
    }

    /// Total size in megabytes, rounded to two decimals
    pub fn total_size_mb(&self) -> f64 {
        let mb = self.total_bytes as f64 / (1024.0 * 1024.0);
        (mb * 100.0).round() / 100.0
    }
}
