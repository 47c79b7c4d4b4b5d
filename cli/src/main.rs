use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;
use tracescan_core::{Instance, ScanRequest, DEFAULT_MAX_COUNT};

#[derive(Parser)]
#[command(name = "tracescan")]
#[command(about = "Range-scan JSON trace logs in a RocksDB store with typed predicates")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile-check a predicate file without opening a store
    Check {
        /// Predicate JSON file
        query: PathBuf,
    },

    /// Run a paginated filtered range scan
    Scan {
        /// Store data directory
        db: PathBuf,

        /// Predicate JSON file
        #[arg(short, long)]
        query: PathBuf,

        /// Open as a secondary (follower) with this writable scratch directory
        #[arg(long)]
        secondary: Option<PathBuf>,

        /// Resume key; the record at this key is excluded
        #[arg(long, default_value = "")]
        start: String,

        /// Exclusive upper key bound
        #[arg(long, default_value = "")]
        end: String,

        /// Page cutoff
        #[arg(long, default_value_t = DEFAULT_MAX_COUNT)]
        limit: usize,

        /// Follow the resume key across pages until the range is exhausted
        #[arg(long, default_value_t = false)]
        all: bool,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Compact)]
        format: OutputFormat,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum OutputFormat {
    /// One raw JSON document per line
    Compact,
    /// Pretty-printed JSON documents
    Pretty,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing. Logs go to stderr so stdout stays clean for data.
    let log_level = if cli.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Check { query } => {
            let bytes = fs::read(&query)
                .with_context(|| format!("Failed to read query file: {}", query.display()))?;
            match tracescan_core::compile(&bytes) {
                Ok(_) => println!("ok"),
                Err(err) => {
                    eprintln!("{}", err.to_json());
                    std::process::exit(1);
                }
            }
        }
        Commands::Scan {
            db,
            query,
            secondary,
            start,
            end,
            limit,
            all,
            format,
        } => {
            let query_bytes = fs::read(&query)
                .with_context(|| format!("Failed to read query file: {}", query.display()))?;

            let instance = match &secondary {
                Some(scratch) => {
                    let instance = Instance::open_secondary(&db, scratch)
                        .with_context(|| format!("Failed to open store: {}", db.display()))?;
                    instance
                        .catch_up_with_primary()
                        .context("Failed to catch up with primary")?;
                    instance
                }
                None => Instance::open(&db)
                    .with_context(|| format!("Failed to open store: {}", db.display()))?,
            };

            let mut request = ScanRequest {
                query: query_bytes,
                start_key: start.into_bytes(),
                end_key: end.into_bytes(),
                max_count: limit,
            };

            let mut total = 0usize;
            loop {
                let page = instance
                    .scan(&request)
                    .map_err(|err| anyhow::Error::from(err).context("Scan failed"))?;
                total += page.len();

                for value in page.values() {
                    print_value(value, format)?;
                }

                if all && page.more() {
                    request.start_key = page.last_key().to_vec();
                    continue;
                }
                if page.more() {
                    eprintln!(
                        "more results available; resume with --start '{}'",
                        String::from_utf8_lossy(page.last_key())
                    );
                }
                break;
            }
            tracing::debug!(total, "scan finished");
        }
    }

    Ok(())
}

fn print_value(value: &[u8], format: OutputFormat) -> Result<()> {
    let mut stdout = io::stdout().lock();
    match format {
        OutputFormat::Compact => {
            stdout.write_all(value)?;
            stdout.write_all(b"\n")?;
        }
        OutputFormat::Pretty => {
            let doc: serde_json::Value =
                serde_json::from_slice(value).context("Response value is not valid JSON")?;
            serde_json::to_writer_pretty(&mut stdout, &doc)?;
            stdout.write_all(b"\n")?;
        }
    }
    Ok(())
}
