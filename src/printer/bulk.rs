//! Bulk-index sink: a streaming two-line-per-record format. Each record is
//! preceded by a one-line action header naming the target index, followed by
//! the record as a flattened JSON map.

use std::io::Write;

use serde_json::json;

use crate::model::StarredEdge;
use crate::printer::Printer;
use crate::Result;

pub struct BulkIndexPrinter<W: Write> {
    out: W,
    index_name: String,
}

impl<W: Write> BulkIndexPrinter<W> {
    pub fn new(out: W, index_name: String) -> Self {
        Self { out, index_name }
    }
}

impl<W: Write> Printer for BulkIndexPrinter<W> {
    fn header(&mut self) -> Result<()> {
        Ok(())
    }

    fn line(&mut self, edge: &StarredEdge) -> Result<()> {
        let action = json!({ "index": { "_index": self.index_name.as_str() } });
        serde_json::to_writer(&mut self.out, &action)?;
        self.out.write_all(b"\n")?;

        let item = json!({
            "Description": &edge.node.description,
            "HomepageURL": &edge.node.homepage_url,
            "NameWithOwner": &edge.node.name_with_owner,
            "Languages": edge.node.language_names(),
            "PushedAt": edge.node.pushed_at.display("PushedAt")?,
            "StargazerCount": edge.node.stargazer_count,
            "StarredAt": edge.starred_at.display("StarredAt")?,
            "Topics": edge.node.topic_names(),
            "UpdatedAt": edge.node.updated_at.display("UpdatedAt")?,
            "Url": &edge.node.url,
            "README": edge.node.readme(),
        });
        serde_json::to_writer(&mut self.out, &item)?;
        self.out.write_all(b"\n")?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tests::sample_edge;

    #[test]
    fn test_two_lines_per_record() {
        let mut buf = Vec::new();
        {
            let mut p = BulkIndexPrinter::new(&mut buf, "stars".to_string());
            p.header().unwrap();
            p.line(&sample_edge("a/b")).unwrap();
            p.flush().unwrap();
        }
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], r#"{"index":{"_index":"stars"}}"#);

        let item: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(item["NameWithOwner"], "a/b");
        assert_eq!(item["Languages"], "go rust");
        assert_eq!(item["Topics"], "cli");
        assert_eq!(item["StargazerCount"], 42);
        assert_eq!(item["StarredAt"], "2023-01-02T03:04:05Z");
        assert_eq!(item["README"], "# readme");
    }
}
