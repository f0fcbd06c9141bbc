//! Relational sink
//!
//! Upserts each record into the normalized schema inside one transaction
//! spanning the whole run. Construction opens the database, enables foreign
//! keys, runs pending migrations, and begins the transaction; any per-record
//! failure poisons the run so `flush` rolls back instead of committing.
//! Statements go through the connection's prepared-statement cache, keyed by
//! SQL text and scoped to the run.

use rusqlite::{params, Connection};

use crate::model::StarredEdge;
use crate::printer::Printer;
use crate::storage::{self, encode_instant, migrate};
use crate::{Error, Result};

const INSERT_REPO: &str = "\
    INSERT INTO Repo (StarredAt, Description, HomepageURL, NameWithOwner, Readme, \
                      PushedAt, StargazerCount, UpdatedAt, Url) \
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9) \
    RETURNING id";

const UPSERT_LANGUAGE: &str =
    "INSERT INTO Language (Name) VALUES (?1) ON CONFLICT (Name) DO NOTHING";

const SELECT_LANGUAGE_ID: &str = "SELECT id FROM Language WHERE Name = ?1";

// Re-seeing a (language, repo) pair accumulates its byte size rather than
// overwriting it.
const UPSERT_LANGUAGE_REPO: &str = "\
    INSERT INTO Language_Repo (Language_id, Repo_id, Size) VALUES (?1, ?2, ?3) \
    ON CONFLICT (Language_id, Repo_id) DO UPDATE SET Size = Size + excluded.Size";

// Single conflict target: a Url collision under a different Name surfaces as
// a constraint error and poisons the run.
const UPSERT_TOPIC: &str =
    "INSERT INTO Topic (Name, Url) VALUES (?1, ?2) ON CONFLICT (Name) DO NOTHING";

const SELECT_TOPIC_ID: &str = "SELECT id FROM Topic WHERE Name = ?1";

const INSERT_REPO_TOPIC: &str = "INSERT INTO Repo_Topic (Repo_id, Topic_id) VALUES (?1, ?2)";

pub struct SqlitePrinter {
    conn: Connection,
    poisoned: bool,
    finished: bool,
}

impl SqlitePrinter {
    /// Open the target database and start an ingestion run. Fails fatally if
    /// opening, migrating, or beginning the transaction fails.
    pub fn open(dsn: &str) -> Result<Self> {
        Self::start(storage::open(dsn)?)
    }

    /// In-memory variant, used by tests.
    pub fn open_in_memory() -> Result<Self> {
        Self::start(storage::open_in_memory()?)
    }

    fn start(mut conn: Connection) -> Result<Self> {
        migrate::run(&mut conn, migrate::MIGRATIONS)?;
        // The run's transaction begins only after the foreign-key pragma and
        // the migrations' own transactions are done.
        conn.execute_batch("BEGIN")?;
        Ok(Self {
            conn,
            poisoned: false,
            finished: false,
        })
    }

    fn insert(&mut self, edge: &StarredEdge) -> Result<()> {
        // Timestamps are converted first; a parse failure writes nothing.
        let starred_at = edge.starred_at.instant("StarredAt")?;
        let pushed_at = edge.node.pushed_at.instant("PushedAt")?;
        let updated_at = edge.node.updated_at.instant("UpdatedAt")?;

        let repo_id: i64 = self.conn.prepare_cached(INSERT_REPO)?.query_row(
            params![
                encode_instant(starred_at),
                edge.node.description,
                edge.node.homepage_url,
                edge.node.name_with_owner,
                edge.node.readme(),
                encode_instant(pushed_at),
                edge.node.stargazer_count,
                encode_instant(updated_at),
                edge.node.url,
            ],
            |row| row.get(0),
        )?;

        for lang in &edge.node.languages.edges {
            self.conn
                .prepare_cached(UPSERT_LANGUAGE)?
                .execute([lang.node.name.as_str()])?;
            let language_id: i64 = self.conn.prepare_cached(SELECT_LANGUAGE_ID)?.query_row(
                [lang.node.name.as_str()],
                |row| row.get(0),
            )?;
            self.conn
                .prepare_cached(UPSERT_LANGUAGE_REPO)?
                .execute(params![language_id, repo_id, lang.size])?;
        }

        for topic in &edge.node.repository_topics.nodes {
            self.conn
                .prepare_cached(UPSERT_TOPIC)?
                .execute(params![topic.topic.name, topic.url])?;
            let topic_id: i64 = self.conn.prepare_cached(SELECT_TOPIC_ID)?.query_row(
                [topic.topic.name.as_str()],
                |row| row.get(0),
            )?;
            // No dedup check: Repo_Topic links are append-only.
            self.conn
                .prepare_cached(INSERT_REPO_TOPIC)?
                .execute(params![repo_id, topic_id])?;
        }

        Ok(())
    }
}

impl Printer for SqlitePrinter {
    fn header(&mut self) -> Result<()> {
        Ok(())
    }

    fn line(&mut self, edge: &StarredEdge) -> Result<()> {
        self.insert(edge).map_err(|source| {
            self.poisoned = true;
            Error::for_repo(&edge.node.name_with_owner, source)
        })
    }

    /// Commit the run, or roll it back if poisoned. Exactly one of the two
    /// is issued; calling again is a no-op.
    fn flush(&mut self) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        if self.poisoned {
            self.conn.execute_batch("ROLLBACK")?;
        } else {
            self.conn.execute_batch("COMMIT")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date::FormattedDate;
    use crate::model::tests::sample_edge;
    use crate::model::{LanguageEdge, LanguageNode, Topic, TopicNode};

    fn count(conn: &Connection, sql: &str) -> i64 {
        conn.query_row(sql, [], |row| row.get(0)).unwrap()
    }

    #[test]
    fn test_repo_row_written_on_commit() {
        let mut p = SqlitePrinter::open_in_memory().unwrap();
        p.header().unwrap();
        p.line(&sample_edge("a/b")).unwrap();
        p.flush().unwrap();

        let (name, starred_at): (String, Option<String>) = p
            .conn
            .query_row("SELECT NameWithOwner, StarredAt FROM Repo", [], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .unwrap();
        assert_eq!(name, "a/b");
        assert_eq!(starred_at.as_deref(), Some("2023-01-02T03:04:05Z"));
    }

    #[test]
    fn test_absent_timestamp_stored_as_null() {
        let mut edge = sample_edge("a/b");
        edge.node.pushed_at = FormattedDate::new("");
        let mut p = SqlitePrinter::open_in_memory().unwrap();
        p.line(&edge).unwrap();
        p.flush().unwrap();

        let pushed_at: Option<String> = p
            .conn
            .query_row("SELECT PushedAt FROM Repo", [], |row| row.get(0))
            .unwrap();
        assert_eq!(pushed_at, None);
    }

    #[test]
    fn test_language_size_accumulates_on_conflict() {
        let mut edge = sample_edge("a/b");
        edge.node.languages.edges = vec![
            LanguageEdge {
                size: 100,
                node: LanguageNode {
                    name: "go".to_string(),
                },
            },
            LanguageEdge {
                size: 100,
                node: LanguageNode {
                    name: "go".to_string(),
                },
            },
        ];
        let mut p = SqlitePrinter::open_in_memory().unwrap();
        p.line(&edge).unwrap();
        p.flush().unwrap();

        assert_eq!(count(&p.conn, "SELECT COUNT(*) FROM Language_Repo"), 1);
        assert_eq!(count(&p.conn, "SELECT Size FROM Language_Repo"), 200);
        assert_eq!(count(&p.conn, "SELECT COUNT(*) FROM Language"), 1);
    }

    #[test]
    fn test_topic_deduped_across_repos() {
        let mut p = SqlitePrinter::open_in_memory().unwrap();
        p.line(&sample_edge("a/b")).unwrap();
        p.line(&sample_edge("c/d")).unwrap();
        p.flush().unwrap();

        assert_eq!(
            count(&p.conn, "SELECT COUNT(*) FROM Topic WHERE Name = 'cli'"),
            1
        );
        assert_eq!(count(&p.conn, "SELECT COUNT(*) FROM Repo_Topic"), 2);
    }

    #[test]
    fn test_reingested_repo_gets_second_row() {
        let mut p = SqlitePrinter::open_in_memory().unwrap();
        p.line(&sample_edge("a/b")).unwrap();
        p.line(&sample_edge("a/b")).unwrap();
        p.flush().unwrap();

        assert_eq!(count(&p.conn, "SELECT COUNT(*) FROM Repo"), 2);
    }

    #[test]
    fn test_topic_url_collision_rejected() {
        let mut first = sample_edge("a/b");
        first.node.repository_topics.nodes = vec![TopicNode {
            url: "http://same".to_string(),
            topic: Topic {
                name: "cli".to_string(),
            },
        }];
        let mut second = sample_edge("c/d");
        second.node.repository_topics.nodes = vec![TopicNode {
            url: "http://same".to_string(),
            topic: Topic {
                name: "tui".to_string(),
            },
        }];

        let mut p = SqlitePrinter::open_in_memory().unwrap();
        p.line(&first).unwrap();
        let err = p.line(&second).unwrap_err();
        assert!(matches!(err, Error::Record { repo, .. } if repo == "c/d"));
        assert!(p.poisoned);
    }

    #[test]
    fn test_bad_timestamp_poisons_whole_run() {
        let dir = tempfile::tempdir().unwrap();
        let dsn = dir.path().join("stars.db");
        let dsn = dsn.to_str().unwrap();

        let mut p = SqlitePrinter::open(dsn).unwrap();
        p.line(&sample_edge("a/b")).unwrap();

        let mut bad = sample_edge("c/d");
        bad.starred_at = FormattedDate::new("not a timestamp");
        let err = p.line(&bad).unwrap_err();
        assert!(err.to_string().contains("c/d"));

        p.flush().unwrap();
        drop(p);

        // Nothing from the run persisted, including the record that
        // succeeded before the failure.
        let conn = storage::open(dsn).unwrap();
        assert_eq!(count(&conn, "SELECT COUNT(*) FROM Repo"), 0);
        assert_eq!(count(&conn, "SELECT COUNT(*) FROM Language_Repo"), 0);
        assert_eq!(count(&conn, "SELECT COUNT(*) FROM Repo_Topic"), 0);
    }

    #[test]
    fn test_flush_is_idempotent() {
        let mut p = SqlitePrinter::open_in_memory().unwrap();
        p.line(&sample_edge("a/b")).unwrap();
        p.flush().unwrap();
        p.flush().unwrap();
        assert_eq!(count(&p.conn, "SELECT COUNT(*) FROM Repo"), 1);
    }
}
