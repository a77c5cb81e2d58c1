// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Screenshot Gallery command line
//!
//! Scans a screenshot folder, prints the category index and writes
//! thumbnails on request.

use clap::{Parser, Subcommand};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use screenshot_gallery::cache::ClassificationCache;
use screenshot_gallery::classifier::{format_date, ClockFormat, RuleTable};
use screenshot_gallery::config::AppConfig;
use screenshot_gallery::db::{Database, KeyValueStore, MemoryStore};
use screenshot_gallery::index::{sort_entries, CategoryIndex, IndexEntry, SortOrder};
use screenshot_gallery::scanner::{CancelToken, ScanProgress, Scanner};
use screenshot_gallery::source::{picker_for, FileHandle};
use screenshot_gallery::thumbnail::{JpegRenderer, ThumbnailPipeline, ThumbnailSlot, ThumbnailState};
use screenshot_gallery::{GalleryError, Result};

/// Screenshot Gallery - categorized browsing for screenshot folders
#[derive(Parser, Debug)]
#[command(name = "gallery")]
#[command(author = "Jonathan D. A. Jewell <hyperpolymath>")]
#[command(version)]
#[command(about = "Organize screenshot folders into a categorized gallery", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (JSON format)
    #[arg(short, long, default_value = "gallery.json", global = true)]
    config: PathBuf,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable trace logging (most verbose)
    #[arg(long, global = true)]
    trace: bool,

    /// Output format for results
    #[arg(long, global = true, default_value = "text", value_parser = ["text", "json", "jsonl"])]
    format: String,

    /// Suppress non-essential output (quiet mode)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Keep classifications and thumbnails in memory only
    #[arg(long, global = true)]
    no_cache: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scan a screenshot folder and show its categories
    Scan {
        /// Folder to scan (falls back to config, then a prompt)
        dir: Option<PathBuf>,

        /// Only show this category
        #[arg(long)]
        category: Option<String>,

        /// Only show this subcategory (requires --category)
        #[arg(long, requires = "category")]
        subcategory: Option<String>,

        /// Entry ordering
        #[arg(long, default_value = "discovery", value_parser = ["discovery", "name", "newest", "oldest"])]
        sort: String,

        /// Clock style for dates
        #[arg(long, default_value = "24h", value_parser = ["24h", "12h"])]
        clock: String,

        /// Write thumbnails of the listed entries into this directory
        #[arg(long)]
        thumbnails: Option<PathBuf>,
    },

    /// Create (or fetch from cache) the thumbnail of one image
    Thumbnail {
        /// Image file
        file: PathBuf,

        /// Write the JPEG here instead of printing a data URL
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Bounding box width (overrides config)
        #[arg(long)]
        max_width: Option<u32>,

        /// Bounding box height (overrides config)
        #[arg(long)]
        max_height: Option<u32>,
    },

    /// Cache database operations
    Cache {
        #[command(subcommand)]
        action: CacheCommands,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
enum CacheCommands {
    /// Show cache statistics
    Stats,

    /// Vacuum database (reclaim space)
    Vacuum,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Generate default configuration file
    Generate {
        /// Output file path
        #[arg(short, long, default_value = "gallery.json")]
        output: PathBuf,
    },
}

/// Both caches, opened once per process
struct Stores {
    db: Option<Database>,
    classifications: Arc<dyn KeyValueStore>,
    thumbnails: Arc<dyn KeyValueStore>,
}

impl Stores {
    fn open(config: &AppConfig, no_cache: bool) -> Result<Self> {
        if no_cache {
            debug!("Using in-memory caches");
            return Ok(Self {
                db: None,
                classifications: Arc::new(MemoryStore::new()),
                thumbnails: Arc::new(MemoryStore::new()),
            });
        }

        let db = Database::open(&config.database.path)?;
        info!("Database initialized: {}", config.database.path);
        Ok(Self {
            classifications: Arc::new(db.classifications(config.classification.max_entries)),
            thumbnails: Arc::new(db.thumbnails(config.thumbnails.max_entries)),
            db: Some(db),
        })
    }

    fn thumbnail_pipeline(&self, config: &AppConfig) -> ThumbnailPipeline<Arc<dyn KeyValueStore>> {
        ThumbnailPipeline::new(
            Arc::clone(&self.thumbnails),
            JpegRenderer::new(config.thumbnails.quality),
        )
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("{}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::load(&cli.config)?;

    match cli.command {
        Commands::Scan { dir, category, subcategory, sort, clock, thumbnails } => {
            let stores = Stores::open(&config, cli.no_cache)?;
            let view = View {
                category,
                subcategory,
                sort: parse_sort(&sort),
                clock: parse_clock(&clock),
                format: cli.format,
            };
            run_scan(&config, &stores, dir, view, thumbnails).await
        }
        Commands::Thumbnail { file, out, max_width, max_height } => {
            let stores = Stores::open(&config, cli.no_cache)?;
            run_thumbnail(&config, &stores, file, out, max_width, max_height).await
        }
        Commands::Cache { action } => {
            let stores = Stores::open(&config, cli.no_cache)?;
            run_cache_command(&stores, action)
        }
        Commands::Config { action } => run_config_command(config, action),
    }
}

/// What part of the index to print, and how
struct View {
    category: Option<String>,
    subcategory: Option<String>,
    sort: SortOrder,
    clock: ClockFormat,
    format: String,
}

fn parse_sort(value: &str) -> SortOrder {
    match value {
        "name" => SortOrder::Name,
        "newest" => SortOrder::Newest,
        "oldest" => SortOrder::Oldest,
        _ => SortOrder::Discovery,
    }
}

fn parse_clock(value: &str) -> ClockFormat {
    match value {
        "12h" => ClockFormat::H12,
        _ => ClockFormat::H24,
    }
}

/// Pick a folder, scan it, index it and print the result
async fn run_scan(
    config: &AppConfig,
    stores: &Stores,
    dir: Option<PathBuf>,
    view: View,
    thumbnail_dir: Option<PathBuf>,
) -> Result<()> {
    let picker = picker_for(dir, config.scan.root.as_deref());
    let root = picker.pick().await?;

    // Ctrl+C cancels the walk
    let (cancel_tx, cancel) = CancelToken::new();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, cancelling scan...");
            let _ = cancel_tx.send(true);
        }
    });

    let (progress_tx, mut progress_rx) = mpsc::unbounded_channel();
    let progress = tokio::spawn(async move {
        while let Some(event) = progress_rx.recv().await {
            if let ScanProgress::Found(count) = event {
                if count % 250 == 0 {
                    info!("Found {} image(s)...", count);
                }
            }
        }
    });

    let records = {
        let scanner = Scanner::new(&config.scan.extensions).with_progress(progress_tx);
        scanner.scan(&root, &cancel).await?
    };
    let _ = progress.await;

    if records.is_empty() {
        warn!("No valid image files found in {:?}", root);
        return Ok(());
    }

    let rules = RuleTable::new(config.classification.folder_rules.clone());
    let cache = ClassificationCache::new(Arc::clone(&stores.classifications), rules);
    let index = CategoryIndex::build(&records, &cache).await?;
    info!("{} image(s) in {} categories", index.len(), index.categories().len());

    let mut entries = match &view.category {
        Some(category) => index.entries(category, view.subcategory.as_deref()),
        None => index
            .categories()
            .into_iter()
            .flat_map(|c| index.entries(c, None))
            .collect(),
    };
    sort_entries(&mut entries, view.sort);

    print_index(&index, &entries, &view)?;

    if let Some(out_dir) = thumbnail_dir {
        write_thumbnails(config, stores, &entries, &out_dir).await?;
    }
    Ok(())
}

fn print_index(index: &CategoryIndex, entries: &[&IndexEntry], view: &View) -> Result<()> {
    match view.format.as_str() {
        "json" => {
            if view.category.is_some() {
                println!("{}", serde_json::to_string_pretty(entries)?);
            } else {
                println!("{}", serde_json::to_string_pretty(index)?);
            }
        }
        "jsonl" => {
            for entry in entries {
                println!("{}", serde_json::to_string(entry)?);
            }
        }
        _ => match &view.category {
            Some(category) => {
                match &view.subcategory {
                    Some(sub) => println!("{} > {}", category, sub),
                    None => println!("{}", category),
                }
                for entry in entries {
                    println!(
                        "  {}  [{}]  {}",
                        entry.cleaned_name,
                        format_date(entry.date.as_ref(), view.clock),
                        entry.record.handle.path().display()
                    );
                }
            }
            None => {
                for category in index.categories() {
                    println!("{} ({})", category, index.entries(category, None).len());
                    for sub in index.subcategories(category) {
                        let count = index.bucket(category, sub).map_or(0, <[_]>::len);
                        println!("  {} ({})", sub, count);
                    }
                }
                println!("\nIndexed {} images", index.len());
            }
        },
    }
    Ok(())
}

/// Load the thumbnail of every listed entry, as a gallery grid would on display
async fn write_thumbnails(
    config: &AppConfig,
    stores: &Stores,
    entries: &[&IndexEntry],
    out_dir: &Path,
) -> Result<()> {
    tokio::fs::create_dir_all(out_dir).await?;
    let pipeline = stores.thumbnail_pipeline(config);
    let (max_width, max_height) = (config.thumbnails.max_width, config.thumbnails.max_height);

    let mut written = 0usize;
    let mut failed = 0usize;
    let mut taken = HashSet::new();
    for entry in entries {
        let mut slot = ThumbnailSlot::new(entry.record.handle.clone());
        match slot.load(&pipeline, max_width, max_height).await {
            ThumbnailState::Ready(thumbnail) => {
                let name = thumbnail_file_name(entry, &mut taken);
                tokio::fs::write(out_dir.join(name), thumbnail.bytes()).await?;
                written += 1;
            }
            _ => failed += 1,
        }
    }

    info!("Wrote {} thumbnail(s) to {:?}", written, out_dir);
    if failed > 0 {
        warn!("{} thumbnail(s) could not be created", failed);
    }
    Ok(())
}

/// Output name for an entry's thumbnail, suffixed when it would clash with an earlier one
fn thumbnail_file_name(entry: &IndexEntry, taken: &mut HashSet<String>) -> String {
    let stem = format!("{}_{}", entry.record.folder_name, entry.record.file_name);
    let mut name = format!("{}.jpg", stem);
    let mut n = 1;
    while !taken.insert(name.clone()) {
        name = format!("{}_{}.jpg", stem, n);
        n += 1;
    }
    name
}

/// Create or fetch a single thumbnail
async fn run_thumbnail(
    config: &AppConfig,
    stores: &Stores,
    file: PathBuf,
    out: Option<PathBuf>,
    max_width: Option<u32>,
    max_height: Option<u32>,
) -> Result<()> {
    let pipeline = stores.thumbnail_pipeline(config);
    let handle = FileHandle::new(file);
    let max_width = max_width.unwrap_or(config.thumbnails.max_width).max(1);
    let max_height = max_height.unwrap_or(config.thumbnails.max_height).max(1);

    let thumbnail = pipeline
        .get_thumbnail(&handle, max_width, max_height)
        .await
        .ok_or_else(|| {
            GalleryError::FileSystem(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("could not create a thumbnail for {:?}", handle.path()),
            ))
        })?;

    match out {
        Some(path) => {
            tokio::fs::write(&path, thumbnail.bytes()).await?;
            info!("Thumbnail written to {:?}", path);
        }
        None => println!("{}", thumbnail.to_data_url()),
    }
    Ok(())
}

/// Run cache database commands
fn run_cache_command(stores: &Stores, action: CacheCommands) -> Result<()> {
    let Some(db) = &stores.db else {
        println!("Caching is disabled (--no-cache)");
        return Ok(());
    };

    match action {
        CacheCommands::Stats => {
            let stats = db.get_stats()?;
            println!("Cache Statistics:");
            println!("  Classifications: {}", stats.classification_count);
            println!("  Thumbnails: {}", stats.thumbnail_count);
            println!("  Thumbnail bytes: {}", stats.thumbnail_bytes);
        }
        CacheCommands::Vacuum => {
            db.vacuum()?;
            println!("Database vacuumed successfully");
        }
    }
    Ok(())
}

/// Run configuration commands
fn run_config_command(config: AppConfig, action: ConfigCommands) -> Result<()> {
    match action {
        ConfigCommands::Show => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigCommands::Generate { output } => {
            AppConfig::default().save(&output)?;
            println!("Configuration written to {:?}", output);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use screenshot_gallery::scanner::FileRecord;

    fn entry(path: &str, folder: &str, file_name: &str, cleaned: &str) -> IndexEntry {
        IndexEntry {
            record: FileRecord {
                handle: FileHandle::new(path),
                file_name: file_name.to_string(),
                folder_name: folder.to_string(),
            },
            cleaned_name: cleaned.to_string(),
            date_str: None,
            date: None,
        }
    }

    #[test]
    fn test_thumbnail_names_never_clash() {
        let mut taken = HashSet::new();
        let png = entry("/shots/Pets/Olmlet.png", "Pets", "Olmlet.png", "Olmlet");
        let jpg = entry("/shots/Pets/Olmlet.jpg", "Pets", "Olmlet.jpg", "Olmlet");
        let nested = entry("/shots/old/Pets/Olmlet.png", "Pets", "Olmlet.png", "Olmlet");

        assert_eq!(thumbnail_file_name(&png, &mut taken), "Pets_Olmlet.png.jpg");
        assert_eq!(thumbnail_file_name(&jpg, &mut taken), "Pets_Olmlet.jpg.jpg");
        assert_eq!(thumbnail_file_name(&nested, &mut taken), "Pets_Olmlet.png_1.jpg");
        assert_eq!(taken.len(), 3);
    }

    #[test]
    fn test_cli_scan_defaults() {
        let cli = Cli::try_parse_from(["gallery", "scan"]).unwrap();
        assert!(!cli.verbose);
        assert!(!cli.no_cache);
        match cli.command {
            Commands::Scan { dir, sort, clock, category, .. } => {
                assert!(dir.is_none());
                assert!(category.is_none());
                assert_eq!(sort, "discovery");
                assert_eq!(clock, "24h");
            }
            _ => panic!("Expected Scan command"),
        }
    }

    #[test]
    fn test_cli_scan_filters() {
        let cli = Cli::try_parse_from([
            "gallery", "scan", "/tmp/shots", "--category", "Boss Kills",
            "--subcategory", "Zulrah", "--sort", "newest", "--no-cache",
        ]).unwrap();

        assert!(cli.no_cache);
        match cli.command {
            Commands::Scan { dir, category, subcategory, sort, .. } => {
                assert_eq!(dir, Some(PathBuf::from("/tmp/shots")));
                assert_eq!(category.as_deref(), Some("Boss Kills"));
                assert_eq!(subcategory.as_deref(), Some("Zulrah"));
                assert_eq!(parse_sort(&sort), SortOrder::Newest);
            }
            _ => panic!("Expected Scan command"),
        }
    }

    #[test]
    fn test_cli_subcategory_needs_category() {
        assert!(Cli::try_parse_from(["gallery", "scan", "--subcategory", "Zulrah"]).is_err());
    }

    #[test]
    fn test_cli_thumbnail_command() {
        let cli = Cli::try_parse_from([
            "gallery", "thumbnail", "/tmp/file.png", "--out", "/tmp/thumb.jpg", "--max-width", "120",
        ]).unwrap();

        match cli.command {
            Commands::Thumbnail { file, out, max_width, max_height } => {
                assert_eq!(file, PathBuf::from("/tmp/file.png"));
                assert_eq!(out, Some(PathBuf::from("/tmp/thumb.jpg")));
                assert_eq!(max_width, Some(120));
                assert_eq!(max_height, None);
            }
            _ => panic!("Expected Thumbnail command"),
        }
    }

    #[test]
    fn test_clock_parsing() {
        assert_eq!(parse_clock("12h"), ClockFormat::H12);
        assert_eq!(parse_clock("24h"), ClockFormat::H24);
    }
}
