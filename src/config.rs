//! Console configuration
//!
//! Compiled-in defaults for the repository, its endpoints and the content
//! types the console knows about. An optional JSON override file is merged
//! over the defaults at startup; its top-level keys replace the defaults'
//! keys wholesale. Absence of the file is the normal case.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ConsoleError, ConsoleResult};

/// Environment variable that overrides the access token.
pub const ACCESS_TOKEN_ENV: &str = "CMA_ACCESS_TOKEN";

/// Content Management API endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CmaEndpoints {
    pub base: String,
    pub documents: String,
}

/// Every URL the controller talks to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    /// Repository metadata, lists the content-version references.
    pub repository: String,
    /// Document search.
    pub documents: String,
    pub cma: CmaEndpoints,
}

impl Endpoints {
    /// Endpoints routed through a local proxy at `base`.
    ///
    /// `/api` reaches repository metadata, `/documents` the search endpoint
    /// and `/cma` the CMA documents collection.
    pub fn through_proxy(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            repository: format!("{}/api/", base),
            documents: format!("{}/documents/search", base),
            cma: CmaEndpoints {
                base: base.to_string(),
                documents: format!("{}/cma", base),
            },
        }
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            repository: "https://zaheb.cdn.prismic.io/api/v2/".to_string(),
            documents: "https://zaheb.cdn.prismic.io/api/v2/documents/search".to_string(),
            cma: CmaEndpoints {
                base: "https://customtypes.prismic.io".to_string(),
                documents: "https://customtypes.prismic.io/documents".to_string(),
            },
        }
    }
}

/// Kind of a content type field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    Text,
    StructuredText,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    #[serde(rename = "type")]
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
}

/// Local-only description of a content type, used to drive the UI.
///
/// Never synchronized with the upstream schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentTypeDescriptor {
    pub name: String,
    pub fields: BTreeMap<String, FieldDescriptor>,
}

impl ContentTypeDescriptor {
    /// Names of the fields flagged as required.
    pub fn required_fields(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|(_, field)| field.required)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

/// Full console configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsoleConfig {
    pub repo_name: String,
    /// Bearer token with content management permissions.
    pub access_token: String,
    pub endpoints: Endpoints,
    /// Language code given to newly created documents.
    pub default_language: String,
    /// Locale used to format timestamps in the document list.
    pub display_locale: String,
    pub content_types: BTreeMap<String, ContentTypeDescriptor>,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(
            "title".to_string(),
            FieldDescriptor {
                kind: FieldKind::Text,
                required: true,
            },
        );
        fields.insert(
            "content".to_string(),
            FieldDescriptor {
                kind: FieldKind::StructuredText,
                required: true,
            },
        );

        let mut content_types = BTreeMap::new();
        content_types.insert(
            "blog-post".to_string(),
            ContentTypeDescriptor {
                name: "Blog Post".to_string(),
                fields,
            },
        );

        Self {
            repo_name: "zaheb".to_string(),
            access_token: String::new(),
            endpoints: Endpoints::default(),
            default_language: "en-us".to_string(),
            display_locale: "en-us".to_string(),
            content_types,
        }
    }
}

impl ConsoleConfig {
    /// Defaults, then the override file (if any), then the token from the
    /// environment.
    ///
    /// A malformed override file is logged and skipped; the defaults stay in
    /// effect.
    pub fn load(override_path: Option<&Path>) -> Self {
        let mut config = Self::default();

        if let Some(path) = override_path {
            if let Err(e) = config.apply_override_file(path) {
                log::error!("Failed to parse saved config {}: {}", path.display(), e);
            }
        }

        config.apply_token_override(std::env::var(ACCESS_TOKEN_ENV).ok());
        config
    }

    /// Merge the JSON object stored at `path` over this configuration.
    ///
    /// Returns `Ok(false)` when there is no file.
    pub fn apply_override_file(&mut self, path: &Path) -> ConsoleResult<bool> {
        if !path.exists() {
            return Ok(false);
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|e| ConsoleError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        let overlay: Value = serde_json::from_str(&raw)
            .map_err(|e| ConsoleError::Config(format!("invalid JSON: {}", e)))?;

        self.merge_override(overlay)?;
        log::info!("Loaded configuration override from {}", path.display());
        Ok(true)
    }

    /// Shallow merge: each top-level key of `overlay` replaces the same key
    /// here. Unknown keys are ignored. On error `self` is left untouched.
    pub fn merge_override(&mut self, overlay: Value) -> ConsoleResult<()> {
        let Value::Object(overlay) = overlay else {
            return Err(ConsoleError::Config(
                "override must be a JSON object".to_string(),
            ));
        };

        let mut merged = serde_json::to_value(&*self)
            .map_err(|e| ConsoleError::Config(e.to_string()))?;
        if let Value::Object(fields) = &mut merged {
            for (key, value) in overlay {
                fields.insert(key, value);
            }
        }

        *self = serde_json::from_value(merged)
            .map_err(|e| ConsoleError::Config(format!("override does not fit: {}", e)))?;
        Ok(())
    }

    /// Replace the token when a non-empty value is supplied.
    pub fn apply_token_override(&mut self, token: Option<String>) {
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            self.access_token = token;
        }
    }

    /// The content type selected when the console starts.
    pub fn first_content_type(&self) -> Option<&str> {
        self.content_types.keys().next().map(String::as_str)
    }
}
