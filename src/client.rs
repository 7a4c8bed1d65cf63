//! HTTP client for the repository and its Content Management API.
//!
//! `ContentApi` is the seam the controller depends on; `CmaClient` is the
//! reqwest implementation talking to the real (or proxied) endpoints.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::Value;

use crate::config::{ConsoleConfig, Endpoints};
use crate::document::{Document, DocumentPatch, NewDocument};
use crate::error::{ConsoleError, ConsoleResult};
use crate::predicate::{render_query, Predicate};

/// Upstream operations the console needs.
#[async_trait]
pub trait ContentApi: Send + Sync {
    /// Token of the reference flagged as master.
    async fn resolve_master_reference(&self) -> ConsoleResult<String>;

    /// Documents of `content_type` as of `reference`, in upstream order.
    async fn list_documents(
        &self,
        content_type: &str,
        reference: &str,
    ) -> ConsoleResult<Vec<Document>>;

    /// Create a document; returns the upstream's response body.
    async fn create_document(&self, document: &NewDocument) -> ConsoleResult<Value>;

    /// Update a document; returns the upstream's response body.
    async fn update_document(&self, patch: &DocumentPatch) -> ConsoleResult<Value>;

    async fn delete_document(&self, id: &str) -> ConsoleResult<()>;
}

/// One entry of the repository's reference list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RepositoryRef {
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(rename = "isMasterRef", default)]
    pub is_master_ref: bool,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RepositoryInfo {
    refs: Vec<RepositoryRef>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    results: Vec<Document>,
}

/// The reference flagged as master, if any.
pub fn find_master_reference(refs: &[RepositoryRef]) -> Option<&RepositoryRef> {
    refs.iter().find(|r| r.is_master_ref)
}

/// reqwest-backed `ContentApi`.
#[derive(Clone)]
pub struct CmaClient {
    http: Client,
    endpoints: Endpoints,
    access_token: String,
}

impl CmaClient {
    pub fn new(config: &ConsoleConfig) -> ConsoleResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ConsoleError::Config(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            endpoints: config.endpoints.clone(),
            access_token: config.access_token.clone(),
        })
    }

    fn document_url(&self, id: &str) -> String {
        format!("{}/{}", self.endpoints.cma.documents.trim_end_matches('/'), id)
    }

    /// JSON headers plus the bearer token.
    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .bearer_auth(&self.access_token)
    }
}

/// Fails with `API error: <status>` unless the status is 2xx.
async fn ensure_success(
    response: Response,
    to_error: fn(String) -> ConsoleError,
) -> ConsoleResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    log::debug!("Upstream answered {}: {}", status, body);
    Err(to_error(format!("API error: {}", status.as_u16())))
}

/// Mutation responses may be empty.
async fn mutation_body(response: Response) -> ConsoleResult<Value> {
    let text = response
        .text()
        .await
        .map_err(|e| ConsoleError::Mutation(format!("cannot read response: {}", e)))?;

    if text.trim().is_empty() {
        return Ok(Value::Null);
    }

    serde_json::from_str(&text)
        .map_err(|e| ConsoleError::Mutation(format!("invalid response: {}", e)))
}

#[async_trait]
impl ContentApi for CmaClient {
    async fn resolve_master_reference(&self) -> ConsoleResult<String> {
        log::debug!("GET {}", self.endpoints.repository);

        let response = self
            .authorized(self.http.get(&self.endpoints.repository))
            .send()
            .await
            .map_err(|e| ConsoleError::Connection(e.to_string()))?;
        let response = ensure_success(response, ConsoleError::Connection).await?;

        let info: RepositoryInfo = response
            .json()
            .await
            .map_err(|e| ConsoleError::Connection(format!("invalid repository info: {}", e)))?;

        find_master_reference(&info.refs)
            .map(|r| r.reference.clone())
            .ok_or_else(|| {
                ConsoleError::Connection("no reference is flagged as master".to_string())
            })
    }

    async fn list_documents(
        &self,
        content_type: &str,
        reference: &str,
    ) -> ConsoleResult<Vec<Document>> {
        let query = render_query(&[Predicate::document_type(content_type)]);
        log::debug!("GET {} ref={} q={}", self.endpoints.documents, reference, query);

        let response = self
            .authorized(self.http.get(&self.endpoints.documents))
            .query(&[("ref", reference), ("q", query.as_str())])
            .send()
            .await
            .map_err(|e| ConsoleError::Fetch(e.to_string()))?;
        let response = ensure_success(response, ConsoleError::Fetch).await?;

        let search: SearchResponse = response
            .json()
            .await
            .map_err(|e| ConsoleError::Fetch(format!("invalid search response: {}", e)))?;

        Ok(search.results)
    }

    async fn create_document(&self, document: &NewDocument) -> ConsoleResult<Value> {
        log::debug!("POST {} id={}", self.endpoints.cma.documents, document.id);

        let response = self
            .authorized(self.http.post(&self.endpoints.cma.documents))
            .json(document)
            .send()
            .await
            .map_err(|e| ConsoleError::Mutation(e.to_string()))?;
        let response = ensure_success(response, ConsoleError::Mutation).await?;

        mutation_body(response).await
    }

    async fn update_document(&self, patch: &DocumentPatch) -> ConsoleResult<Value> {
        let url = self.document_url(&patch.id);
        log::debug!("PATCH {}", url);

        let response = self
            .authorized(self.http.patch(&url))
            .json(patch)
            .send()
            .await
            .map_err(|e| ConsoleError::Mutation(e.to_string()))?;
        let response = ensure_success(response, ConsoleError::Mutation).await?;

        mutation_body(response).await
    }

    async fn delete_document(&self, id: &str) -> ConsoleResult<()> {
        let url = self.document_url(id);
        log::debug!("DELETE {}", url);

        let response = self
            .authorized(self.http.delete(&url))
            .send()
            .await
            .map_err(|e| ConsoleError::Mutation(e.to_string()))?;
        ensure_success(response, ConsoleError::Mutation).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_ref(reference: &str, master: bool) -> RepositoryRef {
        RepositoryRef {
            reference: reference.to_string(),
            is_master_ref: master,
            id: None,
            label: None,
        }
    }

    #[test]
    fn test_find_master_reference() {
        let refs = vec![make_ref("preview", false), make_ref("master-1", true)];
        assert_eq!(
            find_master_reference(&refs).map(|r| r.reference.as_str()),
            Some("master-1")
        );
    }

    #[test]
    fn test_no_master_reference() {
        let refs = vec![make_ref("a", false), make_ref("b", false)];
        assert!(find_master_reference(&refs).is_none());
        assert!(find_master_reference(&[]).is_none());
    }

    #[test]
    fn test_repository_ref_parsing() {
        let parsed: RepositoryRef = serde_json::from_str(
            r#"{ "id": "master", "ref": "ZXyz", "label": "Master", "isMasterRef": true }"#,
        )
        .unwrap();
        assert_eq!(parsed.reference, "ZXyz");
        assert!(parsed.is_master_ref);

        let parsed: RepositoryRef = serde_json::from_str(r#"{ "ref": "other" }"#).unwrap();
        assert!(!parsed.is_master_ref);
    }

    #[test]
    fn test_document_url() {
        let mut config = ConsoleConfig::default();
        config.endpoints = Endpoints::through_proxy("http://localhost:3000");
        let client = CmaClient::new(&config).unwrap();
        assert_eq!(client.document_url("d1"), "http://localhost:3000/cma/d1");
    }
}
