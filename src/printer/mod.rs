//! Output sinks
//!
//! Every output format implements [`Printer`]: `header` once, `line` once
//! per record in input order, `flush` once at the end (guaranteed by the
//! ingestion driver even when a line fails). Sink selection is the closed
//! [`OutputFormat`] enum; call sites dispatch through the trait and never
//! branch on format strings.

use std::io::Write;
use std::str::FromStr;

use crate::model::StarredEdge;
use crate::{Error, Result};

mod bulk;
mod csv;
mod jsonl;
mod sqlite;

pub use bulk::BulkIndexPrinter;
pub use csv::CsvPrinter;
pub use jsonl::JsonlPrinter;
pub use sqlite::SqlitePrinter;

/// Three-phase sink contract.
pub trait Printer {
    /// Write any sink-specific preamble. No-op for most sinks.
    fn header(&mut self) -> Result<()>;

    /// Render or persist one record.
    fn line(&mut self, edge: &StarredEdge) -> Result<()>;

    /// Finalize buffered output. Safe to call more than once, including
    /// after a failed `line`.
    fn flush(&mut self) -> Result<()>;
}

/// Closed set of output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Csv,
    Jsonl,
    Sqlite,
    BulkIndex,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Jsonl => "jsonl",
            OutputFormat::Sqlite => "sqlite",
            OutputFormat::BulkIndex => "bulk-index",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "csv" => Ok(OutputFormat::Csv),
            "jsonl" => Ok(OutputFormat::Jsonl),
            "sqlite" => Ok(OutputFormat::Sqlite),
            "bulk-index" => Ok(OutputFormat::BulkIndex),
            other => Err(Error::UnknownFormat(other.to_string())),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sink-specific knobs consumed by [`OutputFormat::new_printer`].
#[derive(Debug, Clone)]
pub struct SinkConfig {
    /// Database path, sqlite sink only.
    pub sqlite_dsn: String,
    /// Target index name, bulk-index sink only.
    pub index_name: String,
}

impl OutputFormat {
    /// Build the printer for this format. Stream sinks write to `out`; the
    /// sqlite sink opens its own database and ignores `out`.
    pub fn new_printer(self, out: Box<dyn Write>, config: &SinkConfig) -> Result<Box<dyn Printer>> {
        Ok(match self {
            OutputFormat::Csv => Box::new(CsvPrinter::new(out)),
            OutputFormat::Jsonl => Box::new(JsonlPrinter::new(out)),
            OutputFormat::Sqlite => Box::new(SqlitePrinter::open(&config.sqlite_dsn)?),
            OutputFormat::BulkIndex => {
                Box::new(BulkIndexPrinter::new(out, config.index_name.clone()))
            }
        })
    }
}
