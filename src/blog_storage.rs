//! Blog Storage
//!
//! Coordinates the metadata index and the content tree.
//!
//! ## Responsibilities
//! - Allocate unique blog directories and write stage files
//! - Keep the index consistent with the files on every mutation
//! - Answer list/content/latest/search/stats queries
//! - Detect and repair index/filesystem desync

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDateTime};
use parking_lot::Mutex;

use crate::config::{Config, SessionPolicy};
use crate::error::{BlogError, Result};
use crate::storage::naming::{self, stage_filename, validate_component};
use crate::storage::{
    BlogEntry, ConsistencyReport, MetadataIndex, StorageStats, CREATED_AT_FORMAT, INDEX_FILENAME,
    STAGE_FINAL,
};

/// Metadata-indexed store of generated blog posts
///
/// ## Concurrency Model
///
/// Every mutating call is one load → modify → persist cycle on the index,
/// serialized by `write_lock`. Readers load the index without the lock; the
/// index file is replaced by rename, so they never see a partial write.
/// Nothing here coordinates across processes.
///
/// ## Sessions
///
/// `sessions` maps a topic to the directory its first save created. It is
/// only consulted under `SessionPolicy::Accumulate` and lives as long as
/// this value.
pub struct BlogStorage {
    /// Storage configuration
    config: Config,

    /// `{storage_root}/metadata.json`
    index_path: PathBuf,

    /// Topic → directory of the current generation session
    sessions: Mutex<HashMap<String, String>>,

    /// Serializes index read-modify-write cycles
    write_lock: Mutex<()>,
}

impl BlogStorage {
    /// Create a storage handle for the given config
    ///
    /// Nothing is touched on disk until the first save; a missing root reads
    /// as an empty store.
    pub fn open(config: Config) -> Self {
        let index_path = config.storage_root.join(INDEX_FILENAME);
        Self {
            config,
            index_path,
            sessions: Mutex::new(HashMap::new()),
            write_lock: Mutex::new(()),
        }
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified storage root
    pub fn open_path(path: &Path) -> Self {
        Self::open(Config::builder().storage_root(path).build())
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Save one stage of a blog post and index it
    ///
    /// Under `SessionPolicy::Accumulate` the first save of a topic creates its
    /// directory and later saves of the same topic reuse it. Re-saving a stage
    /// overwrites the file and replaces its index entry.
    ///
    /// Returns the path of the written file.
    pub fn save_blog_post(&self, topic: &str, content: &str, stage: &str) -> Result<PathBuf> {
        let topic = validate_topic(topic)?;
        validate_component("stage", stage)?;

        let _write_guard = self.write_lock.lock();
        let mut index = self.load_index()?;
        let now = Local::now().naive_local();

        let directory = match self.session_directory(topic, &index) {
            Some(directory) => directory,
            None => {
                let directory = self.allocate_directory(topic, now, &index)?;
                if self.config.session_policy == SessionPolicy::Accumulate {
                    self.sessions.lock().insert(topic.to_string(), directory.clone());
                }
                directory
            }
        };

        self.write_stage(&mut index, &directory, topic, content, stage, now)
    }

    /// Save a stage into an existing blog directory
    ///
    /// Same write and upsert semantics as `save_blog_post`, without
    /// allocating a directory. Fails with `NotFound` when the directory has
    /// no index entries.
    pub fn save_to_directory(
        &self,
        directory: &str,
        topic: &str,
        content: &str,
        stage: &str,
    ) -> Result<PathBuf> {
        let topic = validate_topic(topic)?;
        validate_component("stage", stage)?;
        validate_component("directory", directory)?;

        let _write_guard = self.write_lock.lock();
        let mut index = self.load_index()?;
        if !index.contains_directory(directory) {
            return Err(BlogError::NotFound {
                directory: directory.to_string(),
                stage: None,
            });
        }

        let now = Local::now().naive_local();
        self.write_stage(&mut index, directory, topic, content, stage, now)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// All entries in creation order
    pub fn get_blog_list(&self) -> Result<Vec<BlogEntry>> {
        Ok(self.load_index()?.into_entries())
    }

    /// Read the content of one stage of a blog
    ///
    /// When the stage is absent and `fallback` is set, the most preferred
    /// other stage of the directory is read instead (`final`, then `draft`,
    /// then the newest other stage).
    ///
    /// ## Errors
    /// - `NotFound`: no entries for the directory, or stage absent without
    ///   an applicable fallback
    /// - `Desync`: the resolved entry's file is missing on disk
    pub fn get_blog_content(&self, directory: &str, stage: &str, fallback: bool) -> Result<String> {
        let index = self.load_index()?;

        if !index.contains_directory(directory) {
            return Err(BlogError::NotFound {
                directory: directory.to_string(),
                stage: None,
            });
        }

        let entry = match index.find(directory, stage) {
            Some(entry) => entry,
            None if fallback => index
                .preferred_entry(directory, Some(stage))
                .ok_or_else(|| BlogError::NotFound {
                    directory: directory.to_string(),
                    stage: Some(stage.to_string()),
                })?,
            None => {
                return Err(BlogError::NotFound {
                    directory: directory.to_string(),
                    stage: Some(stage.to_string()),
                })
            }
        };

        self.read_entry(entry)
    }

    /// `get_blog_content(directory, "final", true)`
    pub fn get_final_content(&self, directory: &str) -> Result<String> {
        self.get_blog_content(directory, STAGE_FINAL, true)
    }

    /// The most recently created entry, or `None` for an empty index
    ///
    /// Only the index is consulted: the entry may be dangling, in which case
    /// reading it fails with `Desync`. `check_consistency` reports such
    /// entries up front.
    pub fn get_latest_blog(&self) -> Result<Option<BlogEntry>> {
        Ok(self.load_index()?.latest().cloned())
    }

    /// Entries whose topic or directory contains `query`, ignoring case
    ///
    /// An empty query matches everything. Results keep index order.
    pub fn search_blogs(&self, query: &str) -> Result<Vec<BlogEntry>> {
        let needle = query.to_lowercase();
        let index = self.load_index()?;

        Ok(index
            .into_entries()
            .into_iter()
            .filter(|e| {
                needle.is_empty()
                    || e.topic.to_lowercase().contains(&needle)
                    || e.directory.to_lowercase().contains(&needle)
            })
            .collect())
    }

    /// Map a user-facing id onto a directory
    ///
    /// An indexed directory name resolves to itself. Otherwise the newest
    /// directory whose topic equals `blog_id` (ignoring case) is returned.
    pub fn resolve_blog_id(&self, blog_id: &str) -> Result<Option<String>> {
        let index = self.load_index()?;
        if index.contains_directory(blog_id) {
            return Ok(Some(blog_id.to_string()));
        }

        let wanted = blog_id.trim().to_lowercase();
        Ok(index
            .entries()
            .iter()
            .filter(|e| e.topic.to_lowercase() == wanted)
            .max_by(|a, b| a.cmp_created(b))
            .map(|e| e.directory.clone()))
    }

    /// Aggregate statistics over the index and content files
    pub fn get_storage_stats(&self) -> Result<StorageStats> {
        let index = self.load_index()?;
        Ok(StorageStats::collect(self.storage_root(), index.entries()))
    }

    // =========================================================================
    // Deletes
    // =========================================================================

    /// Delete every stage of a blog and its directory
    ///
    /// The index is persisted without the directory before any file is
    /// removed, so an interruption leaves at worst an orphan directory.
    ///
    /// Returns false, with the index untouched, when the directory is not
    /// indexed.
    pub fn delete_blog(&self, directory: &str) -> Result<bool> {
        let _write_guard = self.write_lock.lock();
        let mut index = self.load_index()?;

        let removed = index.remove_directory(directory);
        if removed.is_empty() {
            return Ok(false);
        }
        validate_component("directory", directory)?;

        index.persist(&self.index_path)?;
        self.sessions.lock().retain(|_, dir| dir != directory);

        let dir_path = self.storage_root().join(directory);
        match fs::remove_dir_all(&dir_path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(BlogError::write(&dir_path, e)),
        }

        tracing::debug!(directory, entries = removed.len(), "blog deleted");
        Ok(true)
    }

    // =========================================================================
    // Consistency
    // =========================================================================

    /// Compare the index with the content tree (read-only)
    pub fn check_consistency(&self) -> Result<ConsistencyReport> {
        let index = self.load_index()?;
        ConsistencyReport::scan(self.storage_root(), &index)
    }

    /// Bring the index back in line with the content tree
    ///
    /// - Dangling entries are dropped from the index
    /// - Orphan stage files in indexed directories are indexed, borrowing the
    ///   topic of a sibling entry and the file's modification time
    /// - Orphan directories are removed only when `prune_orphan_directories`.
    ///   This includes directories left without entries once their dangling
    ///   entries are dropped; without pruning they stay reported as orphans
    ///
    /// Re-indexed files are appended to the index with their modification
    /// time as `created_at`, so they may sit after newer entries.
    ///
    /// Returns the report that was acted on.
    pub fn repair(&self, prune_orphan_directories: bool) -> Result<ConsistencyReport> {
        let _write_guard = self.write_lock.lock();
        let mut index = self.load_index()?;
        let mut report = ConsistencyReport::scan(self.storage_root(), &index)?;

        // Topics must be captured before dangling siblings are dropped
        let topics: HashMap<String, String> = index
            .entries()
            .iter()
            .map(|e| (e.directory.clone(), e.topic.clone()))
            .collect();

        let changed = !report.dangling_entries.is_empty() || !report.orphan_files.is_empty();

        index.retain(|e| {
            !report
                .dangling_entries
                .iter()
                .any(|d| e.is_key(&d.directory, &d.stage))
        });

        for orphan in &report.orphan_files {
            let path = self.stage_path(&orphan.directory, &orphan.stage);
            let created_at = fs::metadata(&path)
                .and_then(|meta| meta.modified())
                .map(|time| DateTime::<Local>::from(time).naive_local())
                .unwrap_or_else(|_| Local::now().naive_local());
            let topic = topics
                .get(&orphan.directory)
                .cloned()
                .unwrap_or_else(|| orphan.directory.clone());

            index.upsert(self.make_entry(&orphan.directory, &topic, &orphan.stage, created_at));
        }

        // Directories whose every entry dangled are orphans from here on
        for entry in &report.dangling_entries {
            let directory = &entry.directory;
            if !index.contains_directory(directory)
                && self.storage_root().join(directory).is_dir()
                && !report.orphan_directories.contains(directory)
            {
                report.orphan_directories.push(directory.clone());
            }
        }
        report.orphan_directories.sort();

        if changed {
            index.persist(&self.index_path)?;
        }

        if prune_orphan_directories {
            for directory in &report.orphan_directories {
                validate_component("directory", directory)?;
                let dir_path = self.storage_root().join(directory);
                fs::remove_dir_all(&dir_path).map_err(|e| BlogError::write(&dir_path, e))?;
            }
        }

        tracing::debug!(
            dangling = report.dangling_entries.len(),
            orphan_files = report.orphan_files.len(),
            orphan_directories = report.orphan_directories.len(),
            pruned = prune_orphan_directories,
            "storage repaired"
        );
        Ok(report)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Root directory of this store
    pub fn storage_root(&self) -> &Path {
        &self.config.storage_root
    }

    /// Path of the metadata index file
    pub fn index_path(&self) -> &Path {
        &self.index_path
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn load_index(&self) -> Result<MetadataIndex> {
        MetadataIndex::load(&self.index_path)
    }

    fn stage_path(&self, directory: &str, stage: &str) -> PathBuf {
        self.storage_root().join(directory).join(stage_filename(stage))
    }

    /// Directory of the running session for `topic`, if it is still alive
    fn session_directory(&self, topic: &str, index: &MetadataIndex) -> Option<String> {
        if self.config.session_policy != SessionPolicy::Accumulate {
            return None;
        }

        let mut sessions = self.sessions.lock();
        let directory = sessions.get(topic)?.clone();
        if index.contains_directory(&directory) || self.storage_root().join(&directory).is_dir() {
            Some(directory)
        } else {
            sessions.remove(topic);
            None
        }
    }

    /// Claim a fresh directory for `topic`
    ///
    /// `{slug}_{YYYYMMDD_HHMMSS}`, with `_2`, `_3`, ... appended while the
    /// name is taken in the index or on disk. The directory is created here
    /// so the claim holds for the rest of the save.
    fn allocate_directory(&self, topic: &str, now: NaiveDateTime, index: &MetadataIndex) -> Result<String> {
        let root = self.storage_root();
        fs::create_dir_all(root).map_err(|e| BlogError::write(root, e))?;

        let base = naming::directory_name(&naming::slugify(topic), now);
        let mut attempt = 1u32;
        loop {
            let candidate = naming::disambiguated(&base, attempt);
            attempt += 1;

            if index.contains_directory(&candidate) {
                continue;
            }

            let dir_path = root.join(&candidate);
            match fs::create_dir(&dir_path) {
                Ok(()) => return Ok(candidate),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(BlogError::write(&dir_path, e)),
            }
        }
    }

    /// Write a stage file, upsert its entry, persist the index
    fn write_stage(
        &self,
        index: &mut MetadataIndex,
        directory: &str,
        topic: &str,
        content: &str,
        stage: &str,
        now: NaiveDateTime,
    ) -> Result<PathBuf> {
        let dir_path = self.storage_root().join(directory);
        fs::create_dir_all(&dir_path).map_err(|e| BlogError::write(&dir_path, e))?;

        let file_path = dir_path.join(stage_filename(stage));
        fs::write(&file_path, content).map_err(|e| BlogError::write(&file_path, e))?;

        // From here a failure leaves an orphan file that repair() can index
        let replaced = index.upsert(self.make_entry(directory, topic, stage, now));
        index.persist(&self.index_path)?;

        tracing::debug!(
            directory,
            stage,
            bytes = content.len(),
            replaced,
            "blog stage saved"
        );
        Ok(file_path)
    }

    fn make_entry(&self, directory: &str, topic: &str, stage: &str, created_at: NaiveDateTime) -> BlogEntry {
        let filename = stage_filename(stage);
        let file_path = self.storage_root().join(directory).join(&filename);
        BlogEntry {
            topic: topic.to_string(),
            directory: directory.to_string(),
            stage: stage.to_string(),
            filename,
            created_at: created_at.format(CREATED_AT_FORMAT).to_string(),
            file_path: file_path.to_string_lossy().into_owned(),
        }
    }

    fn read_entry(&self, entry: &BlogEntry) -> Result<String> {
        let path = self.stage_path(&entry.directory, &entry.stage);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::warn!(
                    directory = %entry.directory,
                    stage = %entry.stage,
                    path = %path.display(),
                    "indexed content file is missing"
                );
                Err(BlogError::Desync {
                    directory: entry.directory.clone(),
                    stage: entry.stage.clone(),
                    path,
                })
            }
            Err(e) => Err(BlogError::read(&path, e)),
        }
    }
}

/// Trimmed topic, or `InvalidInput` when nothing is left
fn validate_topic(topic: &str) -> Result<&str> {
    let trimmed = topic.trim();
    if trimmed.is_empty() {
        return Err(BlogError::InvalidInput("topic must not be empty".to_string()));
    }
    Ok(trimmed)
}
