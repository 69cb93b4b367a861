mod config;
mod entry;
mod notion;
mod parser;
mod pipeline;
mod source;

use std::sync::Arc;
use std::time::Instant;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "mono_sync", about = "Collect the 物 section of blog posts into Notion")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse posts and print their entries as JSON (nothing is written)
    Parse {
        #[command(flatten)]
        sources: SourceArgs,
    },
    /// Parse posts and upsert their entries into the Notion database
    Sync {
        #[command(flatten)]
        sources: SourceArgs,
    },
    /// List the post URLs for a month
    Resolve {
        /// Month to list (YYYY-MM)
        month: String,
        /// Repository as owner/name (overrides MONO_GITHUB_REPO)
        #[arg(long)]
        repo: Option<String>,
    },
}

#[derive(Args)]
struct SourceArgs {
    /// Post URL to read directly (repeatable)
    #[arg(short, long = "url")]
    urls: Vec<String>,
    /// Month whose posts to read, YYYY-MM (repeatable; default: current month)
    #[arg(short, long = "month")]
    months: Vec<String>,
    /// Repository as owner/name (overrides MONO_GITHUB_REPO)
    #[arg(long)]
    repo: Option<String>,
    /// Leave ratings out instead of deriving them from title glyphs
    #[arg(long)]
    no_rating: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let mut settings = config::Settings::load()?;

    let result = match cli.command {
        Commands::Parse { sources } => {
            let batch = collect_batch(&mut settings, sources).await?;
            println!("{}", serde_json::to_string_pretty(&batch.entries)?);
            eprintln!(
                "{} entries from {} documents ({} duplicates dropped, {} fetch errors)",
                batch.entries.len(),
                batch.documents,
                batch.duplicates,
                batch.fetch_errors
            );
            Ok(())
        }
        Commands::Sync { sources } => {
            // fail on missing credentials before fetching anything
            let store = notion::NotionStore::new(settings.notion()?)?;
            let batch = collect_batch(&mut settings, sources).await?;
            if batch.entries.is_empty() {
                println!("Nothing to sync.");
                return Ok(());
            }
            println!(
                "Syncing {} entries from {} documents ({} duplicates dropped, {} fetch errors)...",
                batch.entries.len(),
                batch.documents,
                batch.duplicates,
                batch.fetch_errors
            );
            let report = store.upsert_all(&batch.entries).await;
            println!(
                "Done: {} created, {} updated, {} failed.",
                report.created, report.updated, report.failed
            );
            Ok(())
        }
        Commands::Resolve { month, repo } => {
            if repo.is_some() {
                settings.github_repo = repo;
            }
            source::validate_month(&month)?;
            let repo = settings.repo()?;
            let documents = source::DocumentSource::new(repo.token.clone())?;
            let urls = documents.list_month(&repo, &month).await?;
            if urls.is_empty() {
                println!("No posts for {}.", month);
                return Ok(());
            }
            for url in &urls {
                println!("{}", url);
            }
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        eprintln!("\nDone in {}", format_duration(elapsed));
    }

    result
}

async fn collect_batch(
    settings: &mut config::Settings,
    args: SourceArgs,
) -> anyhow::Result<pipeline::Batch> {
    if args.repo.is_some() {
        settings.github_repo = args.repo;
    }
    if args.no_rating {
        settings.extract_rating = false;
    }

    let months = if args.urls.is_empty() && args.months.is_empty() {
        vec![source::current_month()]
    } else {
        args.months
    };
    for month in &months {
        source::validate_month(month)?;
    }
    let repo = if months.is_empty() {
        None
    } else {
        Some(settings.repo()?)
    };

    let documents = Arc::new(source::DocumentSource::new(settings.github_token.clone())?);
    let origins = pipeline::resolve(&documents, repo.as_ref(), &args.urls, &months).await?;
    if origins.is_empty() {
        tracing::info!("No documents to read");
    }

    Ok(pipeline::collect(
        documents,
        origins,
        settings.concurrency,
        settings.scan_options(),
        &settings.post_url(),
    )
    .await)
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
