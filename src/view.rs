//! View models for the document list.
//!
//! Pure functions from documents to display records. Binding them to an
//! actual UI belongs to the front end.

use chrono::{DateTime, FixedOffset, Local, Utc};

use crate::document::Document;

/// Title shown for documents without one.
pub const UNTITLED: &str = "Untitled Document";
/// Date shown for documents never published.
pub const UNPUBLISHED: &str = "Not published";

pub const LOADING_TEXT: &str = "Loading documents...";
pub const EMPTY_TEXT: &str = "No documents found. Create a new one to get started.";
pub const FAILED_TEXT: &str = "Failed to load documents. Check the log for details.";

/// One line of the document list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRow {
    pub id: String,
    pub title: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub display_date: String,
}

/// What the list area currently shows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ListView {
    #[default]
    Loading,
    Empty,
    Rows(Vec<DocumentRow>),
    Failed,
}

impl ListView {
    /// Placeholder text, for every state without rows.
    pub fn placeholder(&self) -> Option<&'static str> {
        match self {
            ListView::Loading => Some(LOADING_TEXT),
            ListView::Empty => Some(EMPTY_TEXT),
            ListView::Rows(_) => None,
            ListView::Failed => Some(FAILED_TEXT),
        }
    }

    pub fn rows(&self) -> &[DocumentRow] {
        match self {
            ListView::Rows(rows) => rows,
            _ => &[],
        }
    }
}

/// Timestamp layout for one locale.
///
/// Renders in the host's local time zone unless a fixed offset is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleFormat {
    pattern: String,
    offset: Option<FixedOffset>,
}

impl LocaleFormat {
    /// Layout rendered in the host's local time zone.
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            offset: None,
        }
    }

    pub fn en_us() -> Self {
        Self::new("%-m/%-d/%Y, %-I:%M:%S %p")
    }

    pub fn en_gb() -> Self {
        Self::new("%d/%m/%Y, %H:%M:%S")
    }

    pub fn de_de() -> Self {
        Self::new("%-d.%-m.%Y, %H:%M:%S")
    }

    pub fn fr_fr() -> Self {
        Self::new("%d/%m/%Y %H:%M:%S")
    }

    /// Format for a locale tag such as `en-us` or `de_DE`. Unknown tags get
    /// the US layout.
    pub fn for_locale(tag: &str) -> Self {
        match tag.to_ascii_lowercase().replace('_', "-").as_str() {
            "en-gb" => Self::en_gb(),
            "de-de" | "de" => Self::de_de(),
            "fr-fr" | "fr" => Self::fr_fr(),
            _ => Self::en_us(),
        }
    }

    /// Render in `offset` instead of the local time zone.
    pub fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn format(&self, timestamp: DateTime<Utc>) -> String {
        match self.offset {
            Some(offset) => timestamp
                .with_timezone(&offset)
                .format(&self.pattern)
                .to_string(),
            None => timestamp
                .with_timezone(&Local)
                .format(&self.pattern)
                .to_string(),
        }
    }
}

impl Default for LocaleFormat {
    fn default() -> Self {
        Self::en_us()
    }
}

/// Accepts RFC 3339 as well as the `+0000` offset style the repository uses.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z"))
        .map(|ts| ts.with_timezone(&Utc))
        .ok()
}

/// Title, or the untitled placeholder.
pub fn display_title(document: &Document) -> String {
    document.title().unwrap_or_else(|| UNTITLED.to_string())
}

pub fn render_row(document: &Document, format: &LocaleFormat) -> DocumentRow {
    let raw_date = document.publication_date();
    let timestamp = raw_date.and_then(parse_timestamp);

    let display_date = match (timestamp, raw_date) {
        (Some(ts), _) => format.format(ts),
        (None, Some(raw)) => raw.to_string(),
        (None, None) => UNPUBLISHED.to_string(),
    };

    DocumentRow {
        id: document.id.clone(),
        title: display_title(document),
        timestamp,
        display_date,
    }
}

pub fn render_list(documents: &[Document], format: &LocaleFormat) -> ListView {
    if documents.is_empty() {
        return ListView::Empty;
    }
    ListView::Rows(documents.iter().map(|d| render_row(d, format)).collect())
}

/// Question put to the operator before a delete.
pub fn delete_prompt(document: &Document) -> String {
    format!(
        "Are you sure you want to delete \"{}\"?",
        display_title(document)
    )
}
