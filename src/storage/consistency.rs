//! Consistency Checks
//!
//! Detects disagreement between the index and the content tree.
//!
//! ## What counts as a desync
//! - Dangling entry: indexed, but its content file is gone
//! - Orphan directory: a directory under the root with no index entries
//!   (left behind by an interrupted delete or a failed index write)
//! - Orphan file: a `{stage}_blog_post.md` inside an indexed directory with
//!   no `(directory, stage)` entry

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::error::{BlogError, Result};

use super::entry::BlogEntry;
use super::index::MetadataIndex;
use super::naming::{parse_stage_filename, stage_filename};

/// A stage file on disk that the index does not know about
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrphanFile {
    pub directory: String,
    pub stage: String,
}

/// Result of comparing the index with the filesystem
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsistencyReport {
    /// Entries whose content file is missing
    pub dangling_entries: Vec<BlogEntry>,

    /// Directories under the root without any index entry (sorted)
    pub orphan_directories: Vec<String>,

    /// Stage files in indexed directories without an entry (sorted)
    pub orphan_files: Vec<OrphanFile>,
}

impl ConsistencyReport {
    /// True when index and filesystem agree
    pub fn is_consistent(&self) -> bool {
        self.dangling_entries.is_empty()
            && self.orphan_directories.is_empty()
            && self.orphan_files.is_empty()
    }

    /// Compare `index` with the tree under `root`
    pub fn scan(root: &Path, index: &MetadataIndex) -> Result<Self> {
        let mut report = ConsistencyReport::default();

        for entry in index.entries() {
            let path = root.join(&entry.directory).join(stage_filename(&entry.stage));
            if !path.is_file() {
                report.dangling_entries.push(entry.clone());
            }
        }

        let dir_iter = match fs::read_dir(root) {
            Ok(iter) => iter,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(report),
            Err(e) => return Err(BlogError::index(root, e)),
        };

        for dir_entry in dir_iter {
            let dir_entry = dir_entry.map_err(|e| BlogError::index(root, e))?;
            let path = dir_entry.path();
            if !path.is_dir() {
                // metadata.json, its temp file, and stray files are not blogs
                continue;
            }

            let name = dir_entry.file_name().to_string_lossy().into_owned();
            if !index.contains_directory(&name) {
                report.orphan_directories.push(name);
                continue;
            }

            for file in fs::read_dir(&path).map_err(|e| BlogError::index(&path, e))? {
                let file = file.map_err(|e| BlogError::index(&path, e))?;
                let file_name = file.file_name().to_string_lossy().into_owned();
                if let Some(stage) = parse_stage_filename(&file_name) {
                    if index.find(&name, stage).is_none() {
                        report.orphan_files.push(OrphanFile {
                            directory: name.clone(),
                            stage: stage.to_string(),
                        });
                    }
                }
            }
        }

        report.orphan_directories.sort();
        report
            .orphan_files
            .sort_by(|a, b| (&a.directory, &a.stage).cmp(&(&b.directory, &b.stage)));

        Ok(report)
    }
}
