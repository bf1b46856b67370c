//! Postboard CLI
//!
//! Operator entry point: create the store, ingest sources, answer queries.

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use postboard::{
    error::Result,
    models::Config,
    pipeline::{self, KindFilter},
    storage::{LocalStorage, PostingStore},
};

/// Postboard - event, job and internship postings
#[derive(Parser, Debug)]
#[command(
    name = "postboard",
    version,
    about = "Ingest postings from feeds and answer ranked queries"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(
        short,
        long,
        env = "POSTBOARD_CONFIG",
        default_value = "storage/config.toml"
    )]
    config: PathBuf,

    /// Override the store path from the configuration
    #[arg(long)]
    store: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an empty store with only the header row
    Init,

    /// Fetch sources and merge their postings into the store
    Ingest {
        /// Source names to ingest (default: every configured source)
        #[arg(short, long = "source")]
        sources: Vec<String>,
    },

    /// Search the store and print the formatted answer
    Query {
        /// Class of postings to search
        #[arg(short, long, value_enum)]
        kind: KindFilter,

        /// Print ranked postings as JSON instead of chat text
        #[arg(long)]
        json: bool,

        /// Search terms (empty lists the first postings in store order)
        terms: Vec<String>,
    },

    /// Validate the configuration file
    Validate,

    /// Show store location and per-kind counts
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load_or_default(&cli.config);
    if let Some(store) = cli.store {
        config.storage.path = store;
    }
    log::debug!("Using store {}", config.storage.path.display());

    let storage = LocalStorage::new(&config.storage.path);

    match cli.command {
        Command::Init => {
            storage.create().await?;
        }

        Command::Ingest { sources } => {
            config.validate()?;
            let results = pipeline::run_sources(&config, &storage, &sources).await?;

            let mut first_error = None;
            for (name, result) in results {
                match result {
                    Ok(summary) => log::info!(
                        "✓ {}: {} fetched, {} extracted, {} added, {} duplicates, {} without link ({} stored)",
                        name,
                        summary.fetched,
                        summary.extracted,
                        summary.added,
                        summary.duplicates,
                        summary.rejected_linkless,
                        summary.stored
                    ),
                    Err(e) => {
                        log::error!("✗ {}: {}", name, e);
                        first_error.get_or_insert(e);
                    }
                }
            }
            if let Some(e) = first_error {
                return Err(e);
            }
        }

        Command::Query { kind, json, terms } => {
            let search_text = terms.join(" ");
            if json {
                let result = pipeline::search(&storage, kind, &search_text, &config.query).await?;
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                let text = pipeline::answer(&storage, kind, &search_text, &config.query).await;
                println!("{text}");
            }
        }

        Command::Info => {
            log::info!("Store: {}", storage.describe());
            if !storage.exists().await? {
                log::info!("No store found yet. Run 'init' first.");
                return Ok(());
            }

            let postings = storage.load().await?;
            let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
            for posting in &postings {
                *counts.entry(posting.kind.as_str()).or_default() += 1;
            }
            log::info!("Postings: {}", postings.len());
            for (kind, count) in counts {
                log::info!("  {}: {}", kind, count);
            }
            if let Some(latest) = postings.iter().map(|p| p.ingested_at).max() {
                log::info!("Last ingested: {}", latest);
            }
            log::info!("Configured sources: {}", config.sources.len());
        }

        Command::Validate => {
            pipeline::run_validate(&cli.config)?;
        }
    }

    Ok(())
}
