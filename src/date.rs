//! Timestamp display formatting
//!
//! Stored timestamps are RFC 3339 text. By default every sink passes them
//! through unchanged; a `DateFormat` re-renders them with a strftime-style
//! pattern instead. The relational sink never uses the display path - it
//! parses the raw text via [`FormattedDate::instant`].

use std::sync::Arc;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{Error, Result};

/// A validated strftime-style pattern for rendering timestamps.
#[derive(Debug, Clone)]
pub struct DateFormat {
    pattern: String,
}

impl DateFormat {
    /// Validate and build a format. Unknown conversion specifiers are
    /// rejected here so rendering later cannot fail.
    pub fn new(pattern: &str) -> Result<Self> {
        if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
            return Err(Error::BadDateFormat(pattern.to_string()));
        }
        Ok(Self {
            pattern: pattern.to_string(),
        })
    }

    pub fn render(&self, t: DateTime<Utc>) -> String {
        t.format(&self.pattern).to_string()
    }
}

/// A timestamp as stored upstream (RFC 3339 text) plus an optional shared
/// display format.
///
/// Deserializes from a plain string; serializes to the formatted text, or to
/// the raw text unchanged when no format is set.
#[derive(Debug, Clone, Default)]
pub struct FormattedDate {
    raw: String,
    field: &'static str,
    format: Option<Arc<DateFormat>>,
}

impl FormattedDate {
    pub fn new(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            field: "",
            format: None,
        }
    }

    /// Raw stored text, unaffected by any display format.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Set the display format, remembering which field this timestamp is so
    /// serialization errors can name it.
    pub fn set_format(&mut self, field: &'static str, format: Option<Arc<DateFormat>>) {
        self.field = field;
        self.format = format;
    }

    /// Parse the raw text as an instant. Empty text is an absent instant,
    /// not a parse error.
    pub fn instant(&self, field: &'static str) -> Result<Option<DateTime<Utc>>> {
        if self.raw.is_empty() {
            return Ok(None);
        }
        DateTime::parse_from_rfc3339(&self.raw)
            .map(|t| Some(t.with_timezone(&Utc)))
            .map_err(|source| Error::Timestamp {
                field,
                text: self.raw.clone(),
                source,
            })
    }

    /// Text for display output: the raw text when no format is set,
    /// otherwise the parsed instant rendered through the format.
    pub fn display(&self, field: &'static str) -> Result<String> {
        match &self.format {
            None => Ok(self.raw.clone()),
            Some(format) => match self.instant(field)? {
                Some(t) => Ok(format.render(t)),
                None => Ok(String::new()),
            },
        }
    }
}

impl Serialize for FormattedDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        // The field name is only blank when no format is set, and the
        // passthrough path cannot fail.
        let field = if self.field.is_empty() {
            "timestamp"
        } else {
            self.field
        };
        let text = self.display(field).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&text)
    }
}

impl<'de> Deserialize<'de> for FormattedDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(FormattedDate {
            raw,
            field: "",
            format: None,
        })
    }
}
