//! Documents as the repository returns them, and the payloads the console
//! sends back.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Block type used for the title field.
pub const HEADING_BLOCK: &str = "heading1";
/// Block type used for the content field.
pub const PARAGRAPH_BLOCK: &str = "paragraph";

/// Field holding the document title.
pub const TITLE_FIELD: &str = "title";
/// Field holding the document body.
pub const CONTENT_FIELD: &str = "content";

/// One block of the repository's rich-text format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RichTextBlock {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub spans: Vec<Value>,
}

impl RichTextBlock {
    pub fn heading(text: impl Into<String>) -> Self {
        Self {
            kind: Some(HEADING_BLOCK.to_string()),
            text: text.into(),
            spans: Vec::new(),
        }
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        Self {
            kind: Some(PARAGRAPH_BLOCK.to_string()),
            text: text.into(),
            spans: Vec::new(),
        }
    }
}

/// A document listed by the search endpoint.
///
/// Only the fields the console reads are typed; everything else the upstream
/// sends is kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    /// Mutation token. Must match the document's latest ref for an update to
    /// be accepted upstream.
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub mutation_ref: Option<String>,
    #[serde(rename = "type", default)]
    pub content_type: String,
    #[serde(default)]
    pub lang: String,
    #[serde(default)]
    pub data: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_publication_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_publication_date: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Document {
    /// Rich-text blocks stored under `field`. Missing or differently shaped
    /// fields yield no blocks.
    pub fn blocks(&self, field: &str) -> Vec<RichTextBlock> {
        self.data
            .get(field)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
            .unwrap_or_default()
    }

    /// Text of the first title block, if any.
    pub fn title(&self) -> Option<String> {
        self.blocks(TITLE_FIELD)
            .into_iter()
            .next()
            .map(|block| block.text)
            .filter(|text| !text.is_empty())
    }

    /// Content paragraphs joined by a blank line.
    pub fn content_text(&self) -> String {
        self.blocks(CONTENT_FIELD)
            .into_iter()
            .map(|block| block.text)
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Last publication date, else first publication date.
    pub fn publication_date(&self) -> Option<&str> {
        self.last_publication_date
            .as_deref()
            .or(self.first_publication_date.as_deref())
    }
}

/// The two editable fields.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DocumentFields {
    pub title: String,
    pub content: String,
}

impl DocumentFields {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }

    /// Title as one heading block, content as one paragraph block.
    pub fn to_data(&self) -> DocumentData {
        DocumentData {
            title: vec![RichTextBlock::heading(self.title.clone())],
            content: vec![RichTextBlock::paragraph(self.content.clone())],
        }
    }
}

/// The `data` block sent on create and update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentData {
    pub title: Vec<RichTextBlock>,
    pub content: Vec<RichTextBlock>,
}

/// Body of a create request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewDocument {
    pub id: String,
    #[serde(rename = "type")]
    pub content_type: String,
    pub lang: String,
    pub data: DocumentData,
}

impl NewDocument {
    pub fn new(id: String, content_type: &str, lang: &str, fields: &DocumentFields) -> Self {
        Self {
            id,
            content_type: content_type.to_string(),
            lang: lang.to_string(),
            data: fields.to_data(),
        }
    }
}

/// Body of an update request. The whole data block is sent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentPatch {
    pub id: String,
    #[serde(rename = "ref")]
    pub mutation_ref: String,
    pub data: DocumentData,
}

impl DocumentPatch {
    pub fn new(id: &str, mutation_ref: &str, fields: &DocumentFields) -> Self {
        Self {
            id: id.to_string(),
            mutation_ref: mutation_ref.to_string(),
            data: fields.to_data(),
        }
    }
}

/// Mints identifiers for new documents.
///
/// Identity belongs to whoever owns the authoritative store, so the strategy
/// is injected rather than fixed.
pub trait IdentifierPolicy: Send + Sync {
    fn mint(&self) -> String;
}

/// Random v4 UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdentifiers;

impl IdentifierPolicy for UuidIdentifiers {
    fn mint(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_minimal_document() {
        let doc: Document = serde_json::from_value(json!({
            "id": "d1",
            "data": { "title": [{ "text": "Hello" }] },
            "last_publication_date": "2024-01-01T00:00:00Z"
        }))
        .unwrap();

        assert_eq!(doc.id, "d1");
        assert_eq!(doc.title().as_deref(), Some("Hello"));
        assert_eq!(doc.publication_date(), Some("2024-01-01T00:00:00Z"));
        assert!(doc.mutation_ref.is_none());
    }

    #[test]
    fn test_unknown_fields_are_kept() {
        let doc: Document = serde_json::from_value(json!({
            "id": "d2",
            "uid": "hello-world",
            "type": "blog-post",
            "tags": ["a"],
            "data": {}
        }))
        .unwrap();

        assert_eq!(doc.content_type, "blog-post");
        assert_eq!(doc.extra.get("uid"), Some(&json!("hello-world")));
        assert_eq!(doc.extra.get("tags"), Some(&json!(["a"])));
    }

    #[test]
    fn test_title_missing_or_misshapen() {
        let doc: Document = serde_json::from_value(json!({
            "id": "d3",
            "data": { "title": "not blocks" }
        }))
        .unwrap();
        assert!(doc.title().is_none());

        let doc: Document = serde_json::from_value(json!({ "id": "d4" })).unwrap();
        assert!(doc.title().is_none());
        assert_eq!(doc.content_text(), "");
    }

    #[test]
    fn test_publication_date_prefers_last() {
        let doc: Document = serde_json::from_value(json!({
            "id": "d5",
            "first_publication_date": "2023-05-01T10:00:00Z",
            "last_publication_date": "2024-02-01T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(doc.publication_date(), Some("2024-02-01T10:00:00Z"));

        let doc: Document = serde_json::from_value(json!({
            "id": "d6",
            "first_publication_date": "2023-05-01T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(doc.publication_date(), Some("2023-05-01T10:00:00Z"));
    }

    #[test]
    fn test_content_paragraphs_joined() {
        let doc: Document = serde_json::from_value(json!({
            "id": "d7",
            "data": { "content": [
                { "type": "paragraph", "text": "one" },
                { "type": "paragraph", "text": "two" }
            ] }
        }))
        .unwrap();
        assert_eq!(doc.content_text(), "one\n\ntwo");
    }

    #[test]
    fn test_new_document_body_shape() {
        let fields = DocumentFields::new("T", "C");
        let body = NewDocument::new("id-1".to_string(), "blog-post", "en-us", &fields);
        let value = serde_json::to_value(&body).unwrap();

        assert_eq!(
            value,
            json!({
                "id": "id-1",
                "type": "blog-post",
                "lang": "en-us",
                "data": {
                    "title": [{ "type": "heading1", "text": "T" }],
                    "content": [{ "type": "paragraph", "text": "C" }]
                }
            })
        );
    }

    #[test]
    fn test_patch_body_carries_ref() {
        let fields = DocumentFields::new("T", "");
        let value = serde_json::to_value(DocumentPatch::new("d1", "r9", &fields)).unwrap();

        assert_eq!(value["id"], "d1");
        assert_eq!(value["ref"], "r9");
        assert_eq!(value["data"]["content"][0]["text"], "");
        assert!(value.get("type").is_none());
    }

    #[test]
    fn test_sent_data_reads_back_through_document() {
        let fields = DocumentFields::new("Heading", "Body");
        let data = serde_json::to_value(fields.to_data()).unwrap();
        let doc: Document = serde_json::from_value(json!({ "id": "d9", "data": data })).unwrap();

        assert_eq!(doc.title().as_deref(), Some("Heading"));
        assert_eq!(doc.content_text(), "Body");
        assert_eq!(doc.blocks(TITLE_FIELD), fields.to_data().title);
        assert!(doc.data[TITLE_FIELD][0].get("spans").is_none());
    }

    #[test]
    fn test_uuid_identifiers_are_unique() {
        let ids = UuidIdentifiers;
        let a = ids.mint();
        let b = ids.mint();
        assert_ne!(a, b);
        assert!(Uuid::parse_str(&a).is_ok());
    }
}
