mod crawler;
mod db;
mod parser;
mod sink;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::sink::{Sink, SqliteSink};

#[derive(Parser)]
#[command(name = "oc_scraper", about = "Options-chain scraper for quote-site chain tables")]
struct Cli {
    /// SQLite database path
    #[arg(long, global = true, default_value = db::DEFAULT_DB_PATH)]
    db: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the storage schema
    Init,
    /// Crawl every symbol's option chains into the database
    Run {
        /// File with one ticker symbol per line
        #[arg(short, long, default_value = "symbols.txt")]
        symbols: PathBuf,
        /// Max in-flight requests per queue
        #[arg(short, long, default_value_t = crawler::DEFAULT_CONCURRENCY)]
        concurrency: usize,
        /// Override the request user-agent
        #[arg(long)]
        user_agent: Option<String>,
    },
    /// Show storage statistics
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init => {
            let sink = SqliteSink::open(&cli.db)?;
            sink.ensure_schema()?;
            println!("Schema ready at {}", cli.db.display());
            Ok(())
        }
        Commands::Run {
            symbols,
            concurrency,
            user_agent,
        } => {
            let list = read_symbols(&symbols)?;
            if list.is_empty() {
                println!("No symbols in {}.", symbols.display());
                return Ok(());
            }
            println!("Loaded {} symbols from {}", list.len(), symbols.display());

            let sink = Arc::new(SqliteSink::open(&cli.db)?);
            // No usable table means no crawl
            sink.ensure_schema()?;

            let crawler = crawler::Crawler::new(concurrency, user_agent.as_deref())?;
            let stats = crawler.run(&list, sink).await?;
            println!(
                "Done: {} symbols, {} chain pages, {} records, {} failed requests.",
                stats.symbols, stats.chain_pages, stats.records, stats.errors
            );
            Ok(())
        }
        Commands::Stats => {
            let conn = db::connect(&cli.db)?;
            db::init_schema(&conn)?;
            let s = db::get_stats(&conn)?;
            println!("Contracts:   {}", s.contracts);
            println!("Symbols:     {}", s.symbols);
            println!("Expirations: {}", s.expirations);
            println!("Calls:       {}", s.calls);
            println!("Puts:        {}", s.puts);
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

/// One symbol per line; blank lines are tolerated and skipped.
fn read_symbols(path: &Path) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading symbol list {}", path.display()))?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
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
