//! blogstore CLI
//!
//! Command-line interface for managing stored blog posts.

use std::fs;
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use blogstore::content::{preview, strip_code_fence};
use blogstore::config::STORAGE_ROOT_ENV;
use blogstore::storage::STAGE_FINAL;
use blogstore::{BlogEntry, BlogError, BlogStorage, Config, Result, SessionPolicy};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

/// Characters shown by `latest`
const PREVIEW_CHARS: usize = 200;

/// blogstore CLI
#[derive(Parser, Debug)]
#[command(name = "blogstore-cli")]
#[command(about = "Manage generated blog posts and their metadata index")]
#[command(version)]
struct Args {
    /// Storage root directory [default: ./blogs]
    #[arg(short = 'r', long, env = STORAGE_ROOT_ENV)]
    storage_root: Option<PathBuf>,

    /// Create a new directory for every save instead of grouping stages
    #[arg(long)]
    new_directory_per_save: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Save a blog post (content from --file or stdin)
    Save {
        /// The blog topic
        topic: String,

        /// Stage tag (draft, final, ...)
        #[arg(short, long, default_value = STAGE_FINAL)]
        stage: String,

        /// Read content from this file instead of stdin
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Remove a wrapping markdown code fence first
        #[arg(long)]
        strip_fence: bool,
    },

    /// List all stored blog posts
    List,

    /// Show a blog post by directory or topic
    Show {
        /// Directory name or topic
        blog_id: String,

        /// Stage to read
        #[arg(short, long, default_value = STAGE_FINAL)]
        stage: String,

        /// Fail instead of reading another stage when this one is missing
        #[arg(long)]
        no_fallback: bool,
    },

    /// Search blog posts by topic or directory
    Search {
        /// Case-insensitive substring; empty matches everything
        #[arg(default_value = "")]
        query: String,
    },

    /// Show the most recently created blog post
    Latest,

    /// Delete a blog post by directory or topic
    Delete {
        /// Directory name or topic
        blog_id: String,
    },

    /// Show storage statistics
    Stats,

    /// Check that the index matches the files on disk
    Check {
        /// Drop dangling entries and index orphan stage files
        #[arg(long)]
        repair: bool,

        /// With --repair, also remove directories the index does not know
        #[arg(long, requires = "repair")]
        prune_orphans: bool,
    },
}

fn main() -> ExitCode {
    // Initialize tracing/logging (stderr, quiet by default)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let policy = if args.new_directory_per_save {
        SessionPolicy::DirectoryPerSave
    } else {
        SessionPolicy::Accumulate
    };
    let mut config = Config::default();
    if let Some(root) = args.storage_root {
        config.storage_root = root;
    }
    config.session_policy = policy;

    tracing::debug!("blogstore v{}, storage root {}", blogstore::VERSION, config.storage_root.display());

    let storage = BlogStorage::open(config);
    match run(&storage, args.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("command failed: {}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(storage: &BlogStorage, command: Commands) -> Result<()> {
    match command {
        Commands::Save {
            topic,
            stage,
            file,
            strip_fence,
        } => {
            let mut content = read_content(file)?;
            if strip_fence {
                content = strip_code_fence(&content);
            }
            let path = storage.save_blog_post(&topic, &content, &stage)?;
            println!("Saved to {}", path.display());
        }

        Commands::List => {
            let blogs = storage.get_blog_list()?;
            if blogs.is_empty() {
                println!("No blog posts found in storage.");
                return Ok(());
            }

            println!("Stored blog posts:");
            println!("{}", "=".repeat(60));
            for (i, blog) in blogs.iter().enumerate() {
                print_entry(i + 1, blog);
            }
        }

        Commands::Show {
            blog_id,
            stage,
            no_fallback,
        } => {
            let directory = resolve(storage, &blog_id)?;
            let content = storage.get_blog_content(&directory, &stage, !no_fallback)?;
            println!("{}", content);
        }

        Commands::Search { query } => {
            let results = storage.search_blogs(&query)?;
            if results.is_empty() {
                println!("No blogs found matching '{}'.", query);
                return Ok(());
            }

            println!("Search results for '{}':", query);
            println!("{}", "=".repeat(60));
            for (i, blog) in results.iter().enumerate() {
                print_entry(i + 1, blog);
            }
        }

        Commands::Latest => match storage.get_latest_blog()? {
            Some(latest) => {
                println!("Latest blog:");
                println!("{}", "=".repeat(30));
                println!("Topic:     {}", latest.topic);
                println!("Directory: {}", latest.directory);
                println!("Stage:     {}", latest.stage);
                println!("Created:   {}", latest.created_at);

                let content = storage.get_blog_content(&latest.directory, &latest.stage, true)?;
                println!();
                println!("{}", preview(&content, PREVIEW_CHARS));
            }
            None => println!("No blog posts found in storage."),
        },

        Commands::Delete { blog_id } => {
            let directory = storage.resolve_blog_id(&blog_id)?.unwrap_or(blog_id);
            if storage.delete_blog(&directory)? {
                println!("Blog '{}' deleted.", directory);
            } else {
                println!("Blog '{}' not found.", directory);
            }
        }

        Commands::Stats => {
            let stats = storage.get_storage_stats()?;
            println!("Storage statistics:");
            println!("{}", "=".repeat(30));
            println!("Entries:       {}", stats.total_entries);
            println!("Blogs:         {}", stats.total_directories);
            println!("Total size:    {} bytes ({} MB)", stats.total_bytes, stats.total_size_mb());
            if stats.missing_files > 0 {
                println!("Missing files: {}", stats.missing_files);
            }
            for (stage, count) in &stats.stages {
                println!("  {:<12} {}", stage, count);
            }
            if let (Some(oldest), Some(newest)) = (&stats.oldest_created_at, &stats.newest_created_at) {
                println!("Oldest:        {}", oldest);
                println!("Newest:        {}", newest);
            }
            println!("Storage root:  {}", stats.storage_root.display());
        }

        Commands::Check {
            repair,
            prune_orphans,
        } => {
            let report = if repair {
                storage.repair(prune_orphans)?
            } else {
                storage.check_consistency()?
            };

            if report.is_consistent() {
                println!("Index and files are consistent.");
                return Ok(());
            }

            for entry in &report.dangling_entries {
                println!("dangling entry: {}/{} ({})", entry.directory, entry.stage, entry.file_path);
            }
            for file in &report.orphan_files {
                println!("orphan file:    {}/{}", file.directory, file.stage);
            }
            for directory in &report.orphan_directories {
                println!("orphan dir:     {}", directory);
            }
            if repair {
                println!("Repaired.");
            }
        }
    }

    Ok(())
}

/// Resolve a directory name or topic, failing with `NotFound`
fn resolve(storage: &BlogStorage, blog_id: &str) -> Result<String> {
    storage
        .resolve_blog_id(blog_id)?
        .ok_or_else(|| BlogError::NotFound {
            directory: blog_id.to_string(),
            stage: None,
        })
}

fn read_content(file: Option<PathBuf>) -> Result<String> {
    match file {
        Some(path) => fs::read_to_string(&path).map_err(|e| BlogError::StorageRead { path, source: e }),
        None => {
            let mut content = String::new();
            std::io::stdin()
                .read_to_string(&mut content)
                .map_err(|e| BlogError::StorageRead {
                    path: PathBuf::from("<stdin>"),
                    source: e,
                })?;
            Ok(content)
        }
    }
}

fn print_entry(position: usize, blog: &BlogEntry) {
    println!("{}. Topic: {}", position, blog.topic);
    println!("   Directory: {}", blog.directory);
    println!("   Stage: {}", blog.stage);
    println!("   Created: {}", blog.created_at);
    println!("   File: {}", blog.filename);
    println!("{}", "-".repeat(40));
}
