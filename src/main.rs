//! Starlog CLI - download GitHub stars, re-emit them into a sink, search
//! the resulting archive.

use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use starlog::config::{self, StarlogConfig};
use starlog::github::{self, DownloadOptions};
use starlog::ingest::{self, IngestOptions};
use starlog::printer::{OutputFormat, SinkConfig};
use starlog::{search, DateFormat};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "starlog")]
#[command(version)]
#[command(about = "Archive GitHub starred repositories")]
#[command(long_about = r#"
Starlog saves the repositories you've starred on GitHub.

Example usage:
  starlog download --output stars.jsonl
  starlog format --input stars.jsonl --format csv --output stars.csv
  starlog format --input stars.jsonl --format sqlite --sqlite-dsn stars.db
  starlog search --sqlite-dsn stars.db --term "parser"
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to a starlog.toml with default values
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download starred repositories as newline-delimited JSON pages
    Download {
        /// GitHub token (falls back to $GITHUB_TOKEN)
        #[arg(long, env = "STARLOG_GITHUB_TOKEN")]
        token: Option<String>,

        /// Number of starred repos per page
        #[arg(long, default_value_t = 100)]
        page_size: u32,

        /// Max number of pages to fetch
        #[arg(long, default_value_t = 10)]
        max_pages: u32,

        /// Resume pagination after this cursor
        #[arg(long)]
        after: Option<String>,

        /// Fetch README text for each repository
        #[arg(long)]
        include_readmes: bool,

        /// Max languages fetched per repository
        #[arg(long, default_value_t = 20)]
        max_languages: u32,

        /// Max topics fetched per repository
        #[arg(long, default_value_t = 20)]
        max_repo_topics: u32,

        /// Per-request timeout in seconds
        #[arg(long, default_value_t = 600)]
        timeout: u64,

        /// Output file; stdout if omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Re-emit downloaded pages into an output sink
    Format {
        /// Output format
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,

        /// Input pages file; stdin if omitted
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output file; stdout if omitted (ignored by the sqlite format)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Keep README text instead of redacting it
        #[arg(long)]
        include_readmes: bool,

        /// strftime-style date format; stored timestamps pass through if omitted
        #[arg(long)]
        date_format: Option<String>,

        /// Max input line size in MiB
        #[arg(long, default_value_t = 32)]
        max_line_size: usize,

        /// SQLite database path (sqlite format only)
        #[arg(long)]
        sqlite_dsn: Option<String>,

        /// Target index name (bulk-index format only)
        #[arg(long)]
        index_name: Option<String>,
    },

    /// Full-text search over a sqlite archive
    Search {
        /// SQLite database path
        #[arg(long)]
        sqlite_dsn: Option<String>,

        /// FTS5 match expression
        #[arg(short, long)]
        term: String,

        /// Max number of results
        #[arg(short, long, default_value_t = 10)]
        limit: u32,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();

    let config = config::load_config(cli.config.as_deref())?.unwrap_or_default();

    match cli.command {
        Commands::Download {
            token,
            page_size,
            max_pages,
            after,
            include_readmes,
            max_languages,
            max_repo_topics,
            timeout,
            output,
        } => {
            let token = token
                .or_else(|| std::env::var("GITHUB_TOKEN").ok())
                .ok_or_else(|| {
                    anyhow::anyhow!("no GitHub token: pass --token or set GITHUB_TOKEN")
                })?;
            let out = open_output(output.as_deref())?;
            github::download(
                out,
                &DownloadOptions {
                    token,
                    page_size,
                    max_pages,
                    after,
                    include_readmes,
                    max_languages,
                    max_topics: max_repo_topics,
                    timeout: Duration::from_secs(timeout),
                },
            )?;
        }

        Commands::Format {
            format,
            input,
            output,
            include_readmes,
            date_format,
            max_line_size,
            sqlite_dsn,
            index_name,
        } => {
            // All configuration is validated before any input or output
            // byte moves.
            let format = resolve_format(format, &config)?;
            let date_format = date_format
                .or(config.date_format)
                .map(|pattern| DateFormat::new(&pattern))
                .transpose()?;
            let sink_config = SinkConfig {
                sqlite_dsn: sqlite_dsn
                    .or(config.database)
                    .unwrap_or_else(|| "starlog.db".to_string()),
                index_name: index_name
                    .or(config.index_name)
                    .unwrap_or_else(|| "starlog".to_string()),
            };

            let out = open_output(output.as_deref())?;
            let mut printer = format.new_printer(out, &sink_config)?;
            let reader = open_input(input.as_deref())?;

            tracing::info!(%format, "starting ingestion run");
            ingest::run(
                reader,
                printer.as_mut(),
                &IngestOptions {
                    date_format,
                    include_readmes,
                    max_line_bytes: max_line_size * 1024 * 1024,
                },
            )?;
        }

        Commands::Search {
            sqlite_dsn,
            term,
            limit,
        } => {
            let dsn = sqlite_dsn
                .or(config.database)
                .unwrap_or_else(|| "starlog.db".to_string());
            let hits = search::search(&dsn, &term, limit)?;
            if hits.is_empty() {
                println!("no matches");
            } else {
                search::print_hits(&hits);
            }
        }
    }

    Ok(())
}

fn resolve_format(
    flag: Option<OutputFormat>,
    config: &StarlogConfig,
) -> anyhow::Result<OutputFormat> {
    if let Some(format) = flag {
        return Ok(format);
    }
    match &config.format {
        Some(name) => Ok(name.parse()?),
        None => Ok(OutputFormat::Jsonl),
    }
}

fn open_output(path: Option<&Path>) -> anyhow::Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => Box::new(BufWriter::new(std::fs::File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout())),
    })
}

fn open_input(path: Option<&Path>) -> anyhow::Result<Box<dyn BufRead>> {
    Ok(match path {
        Some(path) => Box::new(BufReader::new(std::fs::File::open(path)?)),
        None => Box::new(BufReader::new(io::stdin())),
    })
}
