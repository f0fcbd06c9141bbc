//! SQLite storage layer: connection opening, the nullable-instant text
//! encoding, and the migration runner.

pub mod migrate;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Connection;

use crate::{Error, Result};

/// Open a database file and enable foreign-key enforcement. SQLite does not
/// check foreign keys by default; every connection here opts in.
pub fn open(dsn: &str) -> Result<Connection> {
    let conn = Connection::open(dsn)?;
    conn.pragma_update(None, "foreign_keys", true)?;
    Ok(conn)
}

/// In-memory variant, used by tests.
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    conn.pragma_update(None, "foreign_keys", true)?;
    Ok(conn)
}

/// Encode an optional instant for a timestamp column: absent becomes SQL
/// NULL, present becomes RFC 3339 text in UTC.
pub fn encode_instant(t: Option<DateTime<Utc>>) -> Option<String> {
    t.map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
}

/// Inverse of [`encode_instant`].
pub fn decode_instant(text: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    match text {
        None => Ok(None),
        Some(s) => DateTime::parse_from_rfc3339(s)
            .map(|t| Some(t.with_timezone(&Utc)))
            .map_err(|source| Error::Timestamp {
                field: "stored",
                text: s.to_string(),
                source,
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_instant_round_trip() {
        let t = Utc.with_ymd_and_hms(2023, 1, 2, 3, 4, 5).unwrap();
        let text = encode_instant(Some(t)).unwrap();
        assert_eq!(text, "2023-01-02T03:04:05Z");
        assert_eq!(decode_instant(Some(&text)).unwrap(), Some(t));
    }

    #[test]
    fn test_absent_instant_is_null() {
        assert_eq!(encode_instant(None), None);
        assert_eq!(decode_instant(None).unwrap(), None);
    }

    #[test]
    fn test_foreign_keys_enabled() {
        let conn = open_in_memory().unwrap();
        let enabled: i64 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(enabled, 1);
    }
}
