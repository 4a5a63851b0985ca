use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use bookmark_cleaner::progress;
use bookmark_cleaner::report;
use bookmark_cleaner::{BookmarkStore, ChromiumFileStore, CleanerEngine, ScanMode, Settings};

#[derive(Parser)]
#[command(name = "bookmark-cleaner")]
#[command(about = "Find, group, and remove duplicate browser bookmarks", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to a Chromium Bookmarks file (auto-detected when omitted)
    #[arg(short, long, global = true)]
    file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan for duplicates and print a count summary
    Scan {
        /// Identity rule: url (URL only) or strict (URL + title)
        #[arg(short, long)]
        mode: Option<ScanMode>,
    },

    /// Show the full duplicate report
    Report {
        /// Identity rule: url (URL only) or strict (URL + title)
        #[arg(short, long)]
        mode: Option<ScanMode>,

        /// Show ids and dates for every copy
        #[arg(short, long)]
        detailed: bool,
    },

    /// Explore the bookmark tree with duplicates marked
    Tree {
        /// Identity rule: url (URL only) or strict (URL + title)
        #[arg(short, long)]
        mode: Option<ScanMode>,
    },

    /// Move all copies of each duplicate into the folder of the first one
    Group {
        /// Identity rule: url (URL only) or strict (URL + title)
        #[arg(short, long)]
        mode: Option<ScanMode>,

        /// Show what would be moved without making changes
        #[arg(long)]
        dry_run: bool,
    },

    /// Delete all copies of each duplicate except the first one
    Delete {
        /// Identity rule: url (URL only) or strict (URL + title)
        #[arg(short, long)]
        mode: Option<ScanMode>,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,

        /// Show what would be deleted without making changes
        #[arg(long)]
        dry_run: bool,
    },

    /// Show or update saved settings
    Config {
        /// Set the default scan mode
        #[arg(long)]
        mode: Option<ScanMode>,

        /// Require confirmation before deleting (true/false)
        #[arg(long)]
        confirm_deletions: Option<bool>,
    },
}

fn open_store(file: Option<PathBuf>) -> Result<ChromiumFileStore> {
    let path = match file {
        Some(path) => path,
        None => ChromiumFileStore::detect_path()?,
    };
    info!("Using bookmarks file: {:?}", path);
    Ok(ChromiumFileStore::open(&path)?)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    let settings = Settings::load()?;

    match cli.command {
        Commands::Scan { mode } => {
            let mode = mode.unwrap_or(settings.scan_mode);
            let mut engine = CleanerEngine::new(open_store(cli.file)?);

            let pb = progress::create_spinner("Scanning bookmarks...");
            let index = engine.scan(mode).await?.clone();
            progress::finish_with_success(
                &pb,
                &format!("Scanned {} bookmarks", engine.bookmarks().len()),
            );

            if index.is_empty() {
                println!("\n🎉 No duplicates found ({} mode)\n", mode);
            } else {
                println!(
                    "\n🔄 {} duplicate classes, {} bookmarks involved, {} removable ({} mode)",
                    index.len(),
                    index.total_duplicates(),
                    index.redundant_count(),
                    mode
                );
                println!("💡 Run `bookmark-cleaner report` for details\n");
            }
        }

        Commands::Report { mode, detailed } => {
            let mode = mode.unwrap_or(settings.scan_mode);
            let mut engine = CleanerEngine::new(open_store(cli.file)?);
            engine.scan(mode).await?;
            println!("{}", report::format_report(engine.duplicates(), detailed));
        }

        Commands::Tree { mode } => {
            let mode = mode.unwrap_or(settings.scan_mode);
            let mut engine = CleanerEngine::new(open_store(cli.file)?);
            engine.scan(mode).await?;
            let roots = engine.store().get_tree().await?;
            println!("{}", report::format_tree(&roots, engine.duplicates()));
        }

        Commands::Group { mode, dry_run } => {
            let mode = mode.unwrap_or(settings.scan_mode);
            let mut engine = CleanerEngine::new(open_store(cli.file)?);
            let index = engine.scan(mode).await?;

            if index.is_empty() {
                println!("\n🎉 No duplicates to group\n");
                return Ok(());
            }

            if dry_run {
                info!("🏃 Dry run mode - no changes will be made");
                for class in index.classes() {
                    let canonical = class.canonical();
                    let Some(target) = canonical.parent_id.as_deref() else {
                        continue;
                    };
                    for member in class.redundant() {
                        if member.parent_id.as_deref() != Some(target) {
                            println!(
                                "  would move {} ({}) into folder {}",
                                member.id, member.url, target
                            );
                        }
                    }
                }
                return Ok(());
            }

            let pb = progress::create_spinner("Grouping duplicates...");
            let summary = engine.group_duplicates().await?;
            progress::finish_with_success(&pb, "Grouping complete");
            summary.print_summary("Group");

            println!(
                "🔄 {} duplicate classes remain (grouping relocates, it does not remove)\n",
                engine.duplicates().len()
            );
        }

        Commands::Delete { mode, yes, dry_run } => {
            let mode = mode.unwrap_or(settings.scan_mode);
            let mut engine = CleanerEngine::new(open_store(cli.file)?);
            let index = engine.scan(mode).await?;

            if index.is_empty() {
                println!("\n🎉 No duplicates to delete\n");
                return Ok(());
            }

            if dry_run {
                info!("🏃 Dry run mode - no changes will be made");
                println!(
                    "\n  Would delete {} bookmarks across {} classes\n",
                    index.redundant_count(),
                    index.len()
                );
                return Ok(());
            }

            if settings.confirm_deletions && !yes {
                println!(
                    "\n⚠️  This will delete {} bookmarks, keeping the first copy of each.",
                    index.redundant_count()
                );
                println!("Use -y to confirm, or --dry-run to preview.\n");
                std::process::exit(0);
            }

            let pb = progress::create_spinner("Deleting duplicates...");
            let summary = engine.delete_duplicates().await?;
            progress::finish_with_success(
                &pb,
                &format!("Deleted {} duplicates", summary.succeeded),
            );
            summary.print_summary("Delete");
        }

        Commands::Config { mode, confirm_deletions } => {
            let mut settings = settings;
            let mut changed = false;
            if let Some(mode) = mode {
                settings.scan_mode = mode;
                changed = true;
            }
            if let Some(confirm) = confirm_deletions {
                settings.confirm_deletions = confirm;
                changed = true;
            }
            if changed {
                settings.save()?;
                info!("Settings saved");
            }
            println!("\n⚙️  Settings");
            println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
            println!("  scan_mode:         {}", settings.scan_mode);
            println!("  confirm_deletions: {}", settings.confirm_deletions);
            println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
        }
    }

    Ok(())
}
