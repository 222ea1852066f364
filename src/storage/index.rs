//! Metadata Index
//!
//! The authoritative list of blog entries, persisted as one JSON document.
//!
//! ## Update discipline
//! Every mutation is load-entire → modify-in-memory → persist-entire.
//! Persisting writes `metadata.json.tmp`, fsyncs it, then renames it over
//! `metadata.json`, so a reader sees either the old or the new index.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{BlogError, Result};

use super::entry::{stage_rank, BlogEntry};

/// Index filename inside the storage root
pub const INDEX_FILENAME: &str = "metadata.json";

/// Temp file used for atomic index replacement
pub const INDEX_TEMP_FILENAME: &str = "metadata.json.tmp";

/// Accepted on-disk shapes
///
/// The current format is a bare list. Older stores wrapped it as
/// `{"blogs": [...]}`; those load fine and are rewritten on next persist.
#[derive(Deserialize)]
#[serde(untagged)]
enum IndexDocument {
    List(Vec<BlogEntry>),
    Wrapped { blogs: Vec<BlogEntry> },
}

/// In-memory copy of the index for the duration of one operation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataIndex {
    /// Entries in creation order
    entries: Vec<BlogEntry>,
}

impl MetadataIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the index from `path`
    ///
    /// A missing file is an empty index. An unreadable or malformed file is a
    /// `StorageIndex` error.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::new()),
            Err(e) => return Err(BlogError::index(path, e)),
        };

        // An empty file is what a crash during the very first write leaves
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::new());
        }

        let document: IndexDocument =
            serde_json::from_slice(&bytes).map_err(|e| BlogError::index(path, e))?;

        let entries = match document {
            IndexDocument::List(entries) => entries,
            IndexDocument::Wrapped { blogs } => blogs,
        };

        Ok(Self { entries })
    }

    /// Persist the whole index to `path` atomically
    pub fn persist(&self, path: &Path) -> Result<()> {
        let json =
            serde_json::to_string_pretty(&self.entries).map_err(|e| BlogError::index(path, e))?;

        let temp_path = temp_path_for(path);
        let write_temp = || -> std::io::Result<()> {
            let mut file = File::create(&temp_path)?;
            file.write_all(json.as_bytes())?;
            file.write_all(b"\n")?;
            file.sync_all()
        };
        write_temp().map_err(|e| BlogError::index(&temp_path, e))?;

        fs::rename(&temp_path, path).map_err(|e| BlogError::index(path, e))?;

        tracing::debug!(path = %path.display(), entries = self.entries.len(), "index persisted");
        Ok(())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// All entries in creation order
    pub fn entries(&self) -> &[BlogEntry] {
        &self.entries
    }

    /// Consume into the entry list
    pub fn into_entries(self) -> Vec<BlogEntry> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The `(directory, stage)` entry
    pub fn find(&self, directory: &str, stage: &str) -> Option<&BlogEntry> {
        self.entries.iter().find(|e| e.is_key(directory, stage))
    }

    /// Every entry of one directory, in index order
    pub fn entries_for(&self, directory: &str) -> Vec<&BlogEntry> {
        self.entries
            .iter()
            .filter(|e| e.directory == directory)
            .collect()
    }

    /// True when any entry belongs to `directory`
    pub fn contains_directory(&self, directory: &str) -> bool {
        self.entries.iter().any(|e| e.directory == directory)
    }

    /// Most preferred entry of a directory, skipping `exclude_stage`
    ///
    /// Preference: `final`, then `draft`, then any other stage. Within one
    /// rank the newest `created_at` wins, then the later index position.
    pub fn preferred_entry(&self, directory: &str, exclude_stage: Option<&str>) -> Option<&BlogEntry> {
        self.entries_for(directory)
            .into_iter()
            .enumerate()
            .filter(|(_, e)| exclude_stage != Some(e.stage.as_str()))
            .max_by(|(ia, a), (ib, b)| {
                // Lower rank is better, so reverse it for max_by
                stage_rank(&b.stage)
                    .cmp(&stage_rank(&a.stage))
                    .then_with(|| a.cmp_created(b))
                    .then_with(|| ia.cmp(ib))
            })
            .map(|(_, e)| e)
    }

    /// Entry with the maximal `created_at`
    ///
    /// Ties prefer the most final stage, then the later index position.
    pub fn latest(&self) -> Option<&BlogEntry> {
        self.entries
            .iter()
            .enumerate()
            .max_by(|(ia, a), (ib, b)| {
                a.cmp_created(b)
                    .then_with(|| stage_rank(&b.stage).cmp(&stage_rank(&a.stage)))
                    .then_with(|| ia.cmp(ib))
            })
            .map(|(_, e)| e)
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Insert or replace the entry keyed by `(directory, stage)`
    ///
    /// A replaced entry keeps its index position. Returns true when an
    /// existing entry was replaced.
    pub fn upsert(&mut self, entry: BlogEntry) -> bool {
        match self
            .entries
            .iter_mut()
            .find(|e| e.is_key(&entry.directory, &entry.stage))
        {
            Some(existing) => {
                *existing = entry;
                true
            }
            None => {
                self.entries.push(entry);
                false
            }
        }
    }

    /// Remove every entry of `directory`, returning the removed entries
    pub fn remove_directory(&mut self, directory: &str) -> Vec<BlogEntry> {
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|e| e.directory == directory);
        self.entries = kept;
        removed
    }

    /// Keep only the entries for which `keep` returns true
    pub fn retain<F>(&mut self, keep: F)
    where
        F: FnMut(&BlogEntry) -> bool,
    {
        self.entries.retain(keep);
    }
}

/// Temp path next to the index file
fn temp_path_for(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) => parent.join(INDEX_TEMP_FILENAME),
        None => PathBuf::from(INDEX_TEMP_FILENAME),
    }
}
