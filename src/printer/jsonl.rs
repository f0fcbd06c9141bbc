//! Line-delimited JSON sink: one JSON object plus newline per record, no
//! header or footer.

use std::io::Write;

use crate::model::StarredEdge;
use crate::printer::Printer;
use crate::Result;

pub struct JsonlPrinter<W: Write> {
    out: W,
}

impl<W: Write> JsonlPrinter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> Printer for JsonlPrinter<W> {
    fn header(&mut self) -> Result<()> {
        Ok(())
    }

    fn line(&mut self, edge: &StarredEdge) -> Result<()> {
        serde_json::to_writer(&mut self.out, edge)?;
        self.out.write_all(b"\n")?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}
