//! Per-session state owned by the controller.
//!
//! Holds the cached master reference, the last fetched documents, what the
//! list shows, the status banner and the open form.

use std::time::Duration;

use crate::document::{Document, DocumentFields};
use crate::view::ListView;

/// How long a success banner stays visible.
pub const SUCCESS_BANNER_TTL: Duration = Duration::from_secs(5);

/// Connection lifecycle of a session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Uninitialized,
    /// Master reference resolved and cached.
    Ready { master_ref: String },
    /// Resolving the master reference failed. No automatic retry.
    Disconnected { reason: String },
}

impl ConnectionState {
    pub fn master_ref(&self) -> Option<&str> {
        match self {
            ConnectionState::Ready { master_ref } => Some(master_ref),
            _ => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, ConnectionState::Ready { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Success,
    Error,
}

/// Transient banner shown above the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub kind: StatusKind,
}

impl StatusMessage {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: StatusKind::Info,
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: StatusKind::Success,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: StatusKind::Error,
        }
    }

    /// Success banners hide themselves; others stay until replaced.
    pub fn auto_hide_after(&self) -> Option<Duration> {
        match self.kind {
            StatusKind::Success => Some(SUCCESS_BANNER_TTL),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit,
}

impl FormMode {
    pub fn heading(&self) -> &'static str {
        match self {
            FormMode::Create => "Create New Document",
            FormMode::Edit => "Edit Document",
        }
    }
}

/// Contents of the document form.
///
/// A non-empty `id` selects update semantics, an empty one create semantics.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DocumentForm {
    pub id: String,
    pub mutation_ref: String,
    pub title: String,
    pub content: String,
}

impl DocumentForm {
    /// Blank form for a new document.
    pub fn blank() -> Self {
        Self::default()
    }

    /// Form pre-filled from a listed document.
    pub fn for_document(document: &Document) -> Self {
        Self {
            id: document.id.clone(),
            mutation_ref: document.mutation_ref.clone().unwrap_or_default(),
            title: document.title().unwrap_or_default(),
            content: document.content_text(),
        }
    }

    pub fn mode(&self) -> FormMode {
        if self.id.is_empty() {
            FormMode::Create
        } else {
            FormMode::Edit
        }
    }

    pub fn fields(&self) -> DocumentFields {
        DocumentFields::new(self.title.clone(), self.content.clone())
    }
}

/// Explicit session context; the controller is its only owner.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    pub connection: ConnectionState,
    pub content_type: String,
    pub documents: Vec<Document>,
    pub list: ListView,
    pub status: Option<StatusMessage>,
    pub form: Option<DocumentForm>,
}

impl SessionContext {
    pub fn new(content_type: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            ..Self::default()
        }
    }

    pub fn document(&self, id: &str) -> Option<&Document> {
        self.documents.iter().find(|d| d.id == id)
    }
}
