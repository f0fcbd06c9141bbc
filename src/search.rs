//! Full-text lookup over an ingested archive
//!
//! A thin validation query against the `Repo_fts` index; ranking and output
//! shape follow the ingestion schema, not a general search surface.

use owo_colors::OwoColorize;
use rusqlite::{params, Connection};

use crate::storage;
use crate::Result;

const SEARCH_SQL: &str = "\
    SELECT \
        'https://github.com/' || NameWithOwner AS Link, \
        StarredAt, \
        StargazerCount, \
        CASE \
            WHEN Description = '' THEN SUBSTR(Readme, 0, 50) || '...' \
            ELSE Description \
        END AS Description \
    FROM Repo_fts \
    WHERE Repo_fts MATCH ?1 \
    ORDER BY rank \
    LIMIT ?2";

#[derive(Debug)]
pub struct SearchHit {
    pub link: String,
    pub starred_at: Option<String>,
    pub stargazer_count: i64,
    pub description: String,
}

/// Run an FTS5 match against the archive at `dsn`.
pub fn search(dsn: &str, term: &str, limit: u32) -> Result<Vec<SearchHit>> {
    let conn = storage::open(dsn)?;
    query_hits(&conn, term, limit)
}

fn query_hits(conn: &Connection, term: &str, limit: u32) -> Result<Vec<SearchHit>> {
    let mut stmt = conn.prepare(SEARCH_SQL)?;
    let hits = stmt
        .query_map(params![term, limit], |row| {
            Ok(SearchHit {
                link: row.get(0)?,
                starred_at: row.get(1)?,
                stargazer_count: row.get(2)?,
                description: row.get(3)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(hits)
}

pub fn print_hits(hits: &[SearchHit]) {
    for hit in hits {
        println!("{}: {}", "Link".bold(), hit.link);
        println!(
            "{}: {}",
            "StarredAt".bold().green(),
            hit.starred_at.as_deref().unwrap_or("")
        );
        println!("{}: {}", "StargazerCount".bold().cyan(), hit.stargazer_count);
        println!("{}: {}", "Description".bold().yellow(), hit.description);
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tests::sample_edge;
    use crate::printer::{Printer, SqlitePrinter};

    #[test]
    fn test_match_over_ingested_data() {
        let dir = tempfile::tempdir().unwrap();
        let dsn = dir.path().join("stars.db");
        let dsn = dsn.to_str().unwrap();

        let mut p = SqlitePrinter::open(dsn).unwrap();
        p.line(&sample_edge("a/b")).unwrap();
        p.flush().unwrap();
        drop(p);

        // sample_edge's description is "a tool".
        let hits = search(dsn, "tool", 10).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].link, "https://github.com/a/b");
        assert_eq!(hits[0].stargazer_count, 42);
        assert_eq!(hits[0].description, "a tool");
    }

    #[test]
    fn test_no_match_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let dsn = dir.path().join("stars.db");
        let dsn = dsn.to_str().unwrap();

        let mut p = SqlitePrinter::open(dsn).unwrap();
        p.flush().unwrap();
        drop(p);

        assert!(search(dsn, "nothing", 10).unwrap().is_empty());
    }
}
