//! CSV sink: fixed column header, one row per record, scalar fields
//! flattened. Language and topic lists are space-joined name lists; `Count`
//! is a 1-based running line counter.

use std::io::Write;

use crate::model::StarredEdge;
use crate::printer::Printer;
use crate::Result;

const COLUMNS: [&str; 12] = [
    "Count",
    "Description",
    "HomepageURL",
    "NameWithOwner",
    "Languages",
    "PushedAt",
    "README",
    "StargazerCount",
    "StarredAt",
    "Topics",
    "UpdatedAt",
    "Url",
];

pub struct CsvPrinter<W: Write> {
    writer: csv::Writer<W>,
    count: u64,
}

impl<W: Write> CsvPrinter<W> {
    pub fn new(out: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(out),
            count: 1,
        }
    }
}

impl<W: Write> Printer for CsvPrinter<W> {
    fn header(&mut self) -> Result<()> {
        self.writer.write_record(COLUMNS)?;
        Ok(())
    }

    fn line(&mut self, edge: &StarredEdge) -> Result<()> {
        let pushed_at = edge.node.pushed_at.display("PushedAt")?;
        let starred_at = edge.starred_at.display("StarredAt")?;
        let updated_at = edge.node.updated_at.display("UpdatedAt")?;

        let count = self.count.to_string();
        let languages = edge.node.language_names();
        let topics = edge.node.topic_names();
        let stargazers = edge.node.stargazer_count.to_string();

        self.writer.write_record([
            count.as_str(),
            edge.node.description.as_str(),
            edge.node.homepage_url.as_str(),
            edge.node.name_with_owner.as_str(),
            languages.as_str(),
            pushed_at.as_str(),
            edge.node.readme(),
            stargazers.as_str(),
            starred_at.as_str(),
            topics.as_str(),
            updated_at.as_str(),
            edge.node.url.as_str(),
        ])?;
        self.count += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
