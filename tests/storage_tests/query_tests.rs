//! Tests for read and query operations
//!
//! These tests verify:
//! - Listing in creation order, including the empty store
//! - Stage fallback when reading content
//! - NotFound versus Desync on reads
//! - Latest-entry selection
//! - Search semantics
//! - Storage statistics and id resolution

use std::fs;
use std::thread;
use std::time::Duration;

use blogstore::config::{Config, SessionPolicy};
use blogstore::{BlogError, BlogStorage};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_storage() -> (TempDir, BlogStorage) {
    let temp_dir = TempDir::new().unwrap();
    let storage = BlogStorage::open_path(&temp_dir.path().join("blogs"));
    (temp_dir, storage)
}

fn directory_of(storage: &BlogStorage, topic: &str) -> String {
    storage
        .get_blog_list()
        .unwrap()
        .into_iter()
        .find(|e| e.topic == topic)
        .map(|e| e.directory)
        .unwrap()
}

// =============================================================================
// Empty Store Tests
// =============================================================================

#[test]
fn test_empty_store_lists_nothing() {
    let (_temp, storage) = setup_temp_storage();

    assert!(storage.get_blog_list().unwrap().is_empty());
    assert!(storage.get_latest_blog().unwrap().is_none());
    assert!(storage.search_blogs("").unwrap().is_empty());
}

#[test]
fn test_root_is_regular_file_is_index_error() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("blogs");
    fs::write(&root, "not a directory").unwrap();
    let storage = BlogStorage::open_path(&root);

    assert!(matches!(storage.get_blog_list(), Err(BlogError::StorageIndex { .. })));
    assert!(matches!(storage.get_latest_blog(), Err(BlogError::StorageIndex { .. })));
    assert!(matches!(storage.search_blogs(""), Err(BlogError::StorageIndex { .. })));
}

#[test]
fn test_reads_do_not_create_root() {
    let (_temp, storage) = setup_temp_storage();

    storage.get_blog_list().unwrap();
    storage.get_storage_stats().unwrap();

    assert!(!storage.storage_root().exists());
}

#[test]
fn test_list_preserves_creation_order() {
    let (_temp, storage) = setup_temp_storage();

    for topic in ["One", "Two", "Three"] {
        storage.save_blog_post(topic, topic, "final").unwrap();
    }

    let topics: Vec<String> = storage
        .get_blog_list()
        .unwrap()
        .into_iter()
        .map(|e| e.topic)
        .collect();
    assert_eq!(topics, vec!["One", "Two", "Three"]);
}

// =============================================================================
// Content / Fallback Tests
// =============================================================================

#[test]
fn test_default_read_falls_back_to_draft() {
    let (_temp, storage) = setup_temp_storage();

    storage.save_blog_post("Only Draft", "draft text", "draft").unwrap();
    let directory = directory_of(&storage, "Only Draft");

    assert_eq!(storage.get_final_content(&directory).unwrap(), "draft text");
}

#[test]
fn test_no_fallback_reports_missing_stage() {
    let (_temp, storage) = setup_temp_storage();

    storage.save_blog_post("Only Draft", "draft text", "draft").unwrap();
    let directory = directory_of(&storage, "Only Draft");

    let err = storage.get_blog_content(&directory, "final", false).unwrap_err();
    match err {
        BlogError::NotFound { directory: d, stage } => {
            assert_eq!(d, directory);
            assert_eq!(stage.as_deref(), Some("final"));
        }
        other => panic!("expected NotFound, got {:?}", other),
    }
}

#[test]
fn test_fallback_prefers_final_then_draft() {
    let (_temp, storage) = setup_temp_storage();

    storage.save_blog_post("Ranked", "outline", "outline").unwrap();
    storage.save_blog_post("Ranked", "draft", "draft").unwrap();
    storage.save_blog_post("Ranked", "final", "final").unwrap();
    let directory = directory_of(&storage, "Ranked");

    // Requesting an absent stage picks final over draft and outline
    assert_eq!(storage.get_blog_content(&directory, "review", true).unwrap(), "final");
}

#[test]
fn test_fallback_among_other_stages_prefers_newest() {
    let (_temp, storage) = setup_temp_storage();

    storage.save_blog_post("Others", "outline", "outline").unwrap();
    thread::sleep(Duration::from_millis(5));
    storage.save_blog_post("Others", "notes", "notes").unwrap();
    let directory = directory_of(&storage, "Others");

    assert_eq!(storage.get_final_content(&directory).unwrap(), "notes");
}

#[test]
fn test_unknown_directory_is_not_found() {
    let (_temp, storage) = setup_temp_storage();

    let err = storage.get_blog_content("missing_20240101_000000", "final", true).unwrap_err();

    assert!(err.is_not_found());
    assert!(matches!(err, BlogError::NotFound { stage: None, .. }));
}

#[test]
fn test_missing_file_is_desync() {
    let (_temp, storage) = setup_temp_storage();

    let path = storage.save_blog_post("Vanishing", "text", "final").unwrap();
    let directory = directory_of(&storage, "Vanishing");
    fs::remove_file(&path).unwrap();

    let err = storage.get_blog_content(&directory, "final", true).unwrap_err();

    assert!(err.is_desync());
    assert!(!err.is_not_found());
    match err {
        BlogError::Desync { directory: d, stage, path: p } => {
            assert_eq!(d, directory);
            assert_eq!(stage, "final");
            assert_eq!(p, path);
        }
        other => panic!("expected Desync, got {:?}", other),
    }
}

// =============================================================================
// Latest Tests
// =============================================================================

#[test]
fn test_latest_is_newest_entry() {
    let (_temp, storage) = setup_temp_storage();

    storage.save_blog_post("Older", "a", "final").unwrap();
    thread::sleep(Duration::from_millis(5));
    storage.save_blog_post("Newer", "b", "final").unwrap();

    assert_eq!(storage.get_latest_blog().unwrap().unwrap().topic, "Newer");
}

#[test]
fn test_latest_follows_resave() {
    let (_temp, storage) = setup_temp_storage();

    storage.save_blog_post("First", "a", "draft").unwrap();
    thread::sleep(Duration::from_millis(5));
    storage.save_blog_post("Second", "b", "draft").unwrap();
    thread::sleep(Duration::from_millis(5));
    storage.save_blog_post("First", "a2", "final").unwrap();

    let latest = storage.get_latest_blog().unwrap().unwrap();
    assert_eq!(latest.topic, "First");
    assert_eq!(latest.stage, "final");
}

#[test]
fn test_latest_may_be_dangling() {
    let (_temp, storage) = setup_temp_storage();

    storage.save_blog_post("Older", "a", "final").unwrap();
    thread::sleep(Duration::from_millis(5));
    let newest = storage.save_blog_post("Newer", "b", "final").unwrap();
    fs::remove_file(newest).unwrap();

    let latest = storage.get_latest_blog().unwrap().unwrap();
    assert_eq!(latest.topic, "Newer");

    let err = storage.get_blog_content(&latest.directory, &latest.stage, true).unwrap_err();
    assert!(err.is_desync());
    assert_eq!(storage.check_consistency().unwrap().dangling_entries, vec![latest]);
}

#[test]
fn test_latest_tie_prefers_final_stage() {
    let (_temp, storage) = setup_temp_storage();

    storage.save_blog_post("Tie", "final", "final").unwrap();
    storage.save_blog_post("Tie", "draft", "draft").unwrap();

    // Force identical timestamps
    let mut blogs = storage.get_blog_list().unwrap();
    let stamp = "2024-01-01T12:00:00.000000".to_string();
    for entry in &mut blogs {
        entry.created_at = stamp.clone();
    }
    fs::write(storage.index_path(), serde_json::to_string_pretty(&blogs).unwrap()).unwrap();

    assert_eq!(storage.get_latest_blog().unwrap().unwrap().stage, "final");
}

// =============================================================================
// Search Tests
// =============================================================================

#[test]
fn test_search_is_case_insensitive_substring() {
    let (_temp, storage) = setup_temp_storage();

    storage.save_blog_post("AI and Robotics", "a", "final").unwrap();
    storage.save_blog_post("Cooking Pasta", "b", "final").unwrap();
    storage.save_blog_post("Ethics of AI", "c", "final").unwrap();

    let results = storage.search_blogs("ai").unwrap();
    let topics: Vec<&str> = results.iter().map(|e| e.topic.as_str()).collect();
    assert_eq!(topics, vec!["AI and Robotics", "Ethics of AI"]);

    assert_eq!(storage.search_blogs("PASTA").unwrap().len(), 1);
}

#[test]
fn test_search_empty_query_returns_all() {
    let (_temp, storage) = setup_temp_storage();

    storage.save_blog_post("One", "a", "draft").unwrap();
    storage.save_blog_post("One", "a", "final").unwrap();
    storage.save_blog_post("Two", "b", "final").unwrap();

    assert_eq!(storage.search_blogs("").unwrap(), storage.get_blog_list().unwrap());
}

#[test]
fn test_search_no_match_is_empty() {
    let (_temp, storage) = setup_temp_storage();

    storage.save_blog_post("Rust", "a", "final").unwrap();

    assert!(storage.search_blogs("haskell").unwrap().is_empty());
}

#[test]
fn test_search_matches_directory() {
    let (_temp, storage) = setup_temp_storage();

    storage.save_blog_post("Rust Tips", "a", "final").unwrap();
    let directory = directory_of(&storage, "Rust Tips");

    // "rust_tips" only appears in the directory, not the topic
    let results = storage.search_blogs("rust_tips").unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].directory, directory);
}

// =============================================================================
// Stats Tests
// =============================================================================

#[test]
fn test_stats_empty_store() {
    let (_temp, storage) = setup_temp_storage();

    let stats = storage.get_storage_stats().unwrap();

    assert_eq!(stats.total_entries, 0);
    assert_eq!(stats.total_directories, 0);
    assert_eq!(stats.total_bytes, 0);
    assert!(stats.stages.is_empty());
    assert!(stats.oldest_created_at.is_none());
    assert!(stats.newest_created_at.is_none());
}

#[test]
fn test_stats_aggregates() {
    let (_temp, storage) = setup_temp_storage();

    storage.save_blog_post("Alpha", "12345", "draft").unwrap();
    storage.save_blog_post("Alpha", "1234567890", "final").unwrap();
    thread::sleep(Duration::from_millis(5));
    storage.save_blog_post("Beta", "abc", "final").unwrap();

    let stats = storage.get_storage_stats().unwrap();
    let list = storage.get_blog_list().unwrap();

    assert_eq!(stats.total_entries, list.len());
    assert_eq!(stats.total_entries, 3);
    assert_eq!(stats.total_directories, 2);
    assert_eq!(stats.total_bytes, 18);
    assert_eq!(stats.missing_files, 0);
    assert_eq!(stats.stages.get("draft"), Some(&1));
    assert_eq!(stats.stages.get("final"), Some(&2));
    assert_eq!(stats.oldest_created_at.as_deref(), Some(list[0].created_at.as_str()));
    assert_eq!(stats.newest_created_at.as_deref(), Some(list[2].created_at.as_str()));
    assert_eq!(stats.storage_root, storage.storage_root());
}

#[test]
fn test_stats_counts_missing_files() {
    let (_temp, storage) = setup_temp_storage();

    let path = storage.save_blog_post("Gone", "abcdef", "final").unwrap();
    storage.save_blog_post("Kept", "xyz", "final").unwrap();
    fs::remove_file(path).unwrap();

    let stats = storage.get_storage_stats().unwrap();
    assert_eq!(stats.total_entries, 2);
    assert_eq!(stats.total_bytes, 3);
    assert_eq!(stats.missing_files, 1);
}

#[test]
fn test_total_size_mb_rounds() {
    let (_temp, storage) = setup_temp_storage();

    storage.save_blog_post("Big", &"x".repeat(1024 * 1024 + 10_000), "final").unwrap();

    assert_eq!(storage.get_storage_stats().unwrap().total_size_mb(), 1.01);
}

// =============================================================================
// Resolve Tests
// =============================================================================

#[test]
fn test_resolve_directory_and_topic() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .storage_root(temp_dir.path().join("blogs"))
        .session_policy(SessionPolicy::DirectoryPerSave)
        .build();
    let storage = BlogStorage::open(config);

    storage.save_blog_post("Repeated Topic", "old", "final").unwrap();
    thread::sleep(Duration::from_millis(5));
    storage.save_blog_post("Repeated Topic", "new", "final").unwrap();
    let blogs = storage.get_blog_list().unwrap();

    assert_eq!(
        storage.resolve_blog_id(&blogs[0].directory).unwrap().as_deref(),
        Some(blogs[0].directory.as_str())
    );
    assert_eq!(
        storage.resolve_blog_id("repeated topic").unwrap().as_deref(),
        Some(blogs[1].directory.as_str())
    );
    assert_eq!(storage.resolve_blog_id("unknown").unwrap(), None);
}
