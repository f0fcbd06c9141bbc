//! Ingestion driver
//!
//! Adapts a stream of newline-delimited JSON pages into sink contract calls:
//! `header` before the first page, `line` per record in input order, `flush`
//! guaranteed at the end even when decoding or a line fails partway. A
//! decode failure on any page is fatal to the whole run.

use std::io::{BufRead, Read};
use std::sync::Arc;

use crate::date::DateFormat;
use crate::model::Page;
use crate::printer::Printer;
use crate::{Error, Result};

#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Shared display format applied to every timestamp field; `None`
    /// passes stored text through unchanged.
    pub date_format: Option<DateFormat>,
    /// When false (the default), README text is redacted to empty before it
    /// reaches any sink.
    pub include_readmes: bool,
    /// Fatal cap on a single input line.
    pub max_line_bytes: usize,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            date_format: None,
            include_readmes: false,
            max_line_bytes: 32 * 1024 * 1024,
        }
    }
}

/// Drive `printer` over every record in `input`.
pub fn run<R: BufRead>(
    mut input: R,
    printer: &mut dyn Printer,
    options: &IngestOptions,
) -> Result<()> {
    printer.header()?;

    match pump(&mut input, printer, options) {
        Ok(()) => printer.flush(),
        Err(err) => {
            // The sink still gets its flush (the relational sink rolls back
            // here); its own failure is secondary to the run's error.
            if let Err(flush_err) = printer.flush() {
                tracing::warn!("flush after failed run: {flush_err}");
            }
            Err(err)
        }
    }
}

fn pump<R: BufRead>(
    input: &mut R,
    printer: &mut dyn Printer,
    options: &IngestOptions,
) -> Result<()> {
    let format = options.date_format.clone().map(Arc::new);
    let mut buf = Vec::new();
    let mut pages = 0u64;
    let mut records = 0u64;

    loop {
        buf.clear();
        // The cap bounds reading itself: each line is pulled through a
        // `take` one byte past the limit, so an oversized line stops
        // consuming input at the cap instead of buffering to the newline.
        let n = input
            .by_ref()
            .take(options.max_line_bytes as u64 + 1)
            .read_until(b'\n', &mut buf)?;
        if n == 0 {
            break;
        }
        if buf.len() > options.max_line_bytes {
            return Err(Error::LineTooLong {
                limit: options.max_line_bytes,
            });
        }
        let line = trim_line(&buf);
        if line.is_empty() {
            continue;
        }

        let page: Page = serde_json::from_slice(line)?;
        pages += 1;
        for mut edge in page.viewer.starred_repositories.edges {
            edge.set_date_format(format.clone());
            if !options.include_readmes {
                edge.node.redact_readme();
            }
            printer.line(&edge)?;
            records += 1;
        }
    }

    tracing::debug!(pages, records, "ingestion complete");
    Ok(())
}

fn trim_line(buf: &[u8]) -> &[u8] {
    let mut line = buf;
    while let [rest @ .., b'\n' | b'\r'] = line {
        line = rest;
    }
    line
}
