use anyhow::{bail, Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use jellyfin_index::config::{
    Settings, DEFAULT_BATCH_SIZE, DEFAULT_DB_FILE, DEFAULT_FETCH_TIMEOUT, DEFAULT_SEARCH_TIMEOUT,
};
use jellyfin_index::models::SearchResult;
use jellyfin_index::progress::{format_duration, set_log_only};
use jellyfin_index::source::{CatalogSource, JellyfinSource, JsonFileSource};
use jellyfin_index::Store;
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "jellyfin-index")]
#[command(about = "Mirror a Jellyfin audio catalog into SQLite and search it")]
struct Args {
    /// SQLite database holding the mirrored catalog
    #[arg(long, env = "JELLYFIN_INDEX_DB", default_value = DEFAULT_DB_FILE, global = true)]
    db: PathBuf,

    /// Hide progress bars and log progress lines instead
    #[arg(long, global = true)]
    log_only: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch the catalog and merge it into the database
    Sync(SyncArgs),
    /// Run one or more ranked searches and print the results as JSON
    Search(SearchArgs),
    /// Print row counts of the mirrored tables
    Stats,
}

#[derive(ClapArgs)]
struct SyncArgs {
    /// Jellyfin server as host:port
    #[arg(long, env = "JELLYFIN_ADDR", required_unless_present = "from_file")]
    addr: Option<String>,

    #[arg(long, env = "JELLYFIN_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Read a saved /Items response instead of calling the server (takes precedence over --addr)
    #[arg(long)]
    from_file: Option<PathBuf>,

    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    #[arg(long, default_value_t = DEFAULT_FETCH_TIMEOUT.as_secs())]
    fetch_timeout_secs: u64,

    /// Write sync statistics as JSON to this path
    #[arg(long)]
    stats_json: Option<PathBuf>,
}

#[derive(ClapArgs)]
struct SearchArgs {
    /// Queries to run; none means the empty query (every song)
    queries: Vec<String>,

    #[arg(long, default_value_t = DEFAULT_SEARCH_TIMEOUT.as_millis() as u64)]
    timeout_ms: u64,

    #[arg(long, default_value = "0")]
    workers: usize,
}

#[derive(Serialize)]
struct QueryReport<'a> {
    query: &'a str,
    skipped_rows: usize,
    results: Vec<SearchResult>,
}

fn init_tracing() {
    // Use RUST_LOG env var if set, otherwise default to info level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_sync(args: SyncArgs, db: &Path) -> Result<()> {
    let settings = Settings {
        batch_size: args.batch_size,
        fetch_timeout: Duration::from_secs(args.fetch_timeout_secs),
        ..Settings::default()
    };

    let source: Box<dyn CatalogSource> = match (args.from_file, args.addr) {
        (Some(path), _) => Box::new(JsonFileSource::new(path)),
        (None, Some(addr)) => {
            let Some(api_key) = args.api_key else {
                bail!("--api-key (or JELLYFIN_API_KEY) is required when syncing from a server");
            };
            Box::new(
                JellyfinSource::new(&addr, &api_key, settings.fetch_timeout)
                    .context("Failed to configure Jellyfin client")?,
            )
        }
        (None, None) => bail!("either --addr or --from-file is required"),
    };

    let start = Instant::now();
    let store = Store::open(db, settings).context("Failed to open the database")?;
    let stats = store
        .sync_from(source.as_ref())
        .with_context(|| format!("Sync from {} failed", source.describe()))?;

    stats.log_phase("sync");
    if let Some(path) = args.stats_json {
        stats
            .write_to_file(&path)
            .with_context(|| format!("Failed to write stats to {}", path.display()))?;
    }

    println!("\n{:=<60}", "");
    println!("Sync complete!");
    println!("  Songs: {}", stats.songs_upserted);
    println!("  New artists: {}", stats.artists_created);
    println!("  New links: {}", stats.links_created);
    println!("  Date fallbacks: {}", stats.date_fallbacks);
    println!("  Elapsed: {}", format_duration(start.elapsed()));
    println!("{:=<60}", "");
    Ok(())
}

fn run_search(args: SearchArgs, db: &Path) -> Result<()> {
    if args.workers > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(args.workers)
            .build_global()
            .context("Failed to set thread pool size")?;
    }

    let settings = Settings {
        search_timeout: Duration::from_millis(args.timeout_ms),
        ..Settings::default()
    };
    let store = Store::open(db, settings).context("Failed to open the database")?;

    let queries = if args.queries.is_empty() {
        vec![String::new()]
    } else {
        args.queries
    };

    let reports = queries
        .par_iter()
        .map(|query| {
            let outcome = store
                .search(query)
                .with_context(|| format!("Search for {:?} failed", query))?;
            Ok(QueryReport {
                query,
                skipped_rows: outcome.skipped_rows,
                results: outcome.results,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    println!("{}", serde_json::to_string_pretty(&reports)?);
    Ok(())
}

fn run_stats(db: &Path) -> Result<()> {
    let store = Store::open(db, Settings::default()).context("Failed to open the database")?;
    let counts = store.counts().context("Failed to count catalog rows")?;
    println!("{}", serde_json::to_string_pretty(&counts)?);
    Ok(())
}

fn main() -> Result<()> {
    // A missing .env is fine; flags and the real environment still apply.
    dotenvy::dotenv().ok();

    let args = Args::parse();
    set_log_only(args.log_only);
    init_tracing();

    info!(db = %args.db.display(), "using database");

    match args.command {
        Command::Sync(sync_args) => run_sync(sync_args, &args.db),
        Command::Search(search_args) => run_search(search_args, &args.db),
        Command::Stats => run_stats(&args.db),
    }
}
