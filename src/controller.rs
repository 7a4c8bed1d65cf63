//! Client controller
//!
//! Drives the read/write lifecycle against a `ContentApi` and keeps the
//! session's list view consistent with the most recent successful fetch.
//! Every successful mutation is followed by a full re-fetch; nothing is
//! patched locally, so there is nothing to roll back on failure.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use crate::client::ContentApi;
use crate::config::{ConsoleConfig, ContentTypeDescriptor};
use crate::document::{
    DocumentFields, DocumentPatch, IdentifierPolicy, NewDocument, UuidIdentifiers,
};
use crate::error::{ConsoleError, ConsoleResult};
use crate::session::{ConnectionState, DocumentForm, FormMode, SessionContext, StatusMessage};
use crate::view::{delete_prompt, render_list, ListView, LocaleFormat};

pub struct ConsoleController {
    api: Arc<dyn ContentApi>,
    ids: Arc<dyn IdentifierPolicy>,
    content_types: BTreeMap<String, ContentTypeDescriptor>,
    default_language: String,
    format: LocaleFormat,
    session: SessionContext,
}

impl ConsoleController {
    pub fn new(config: &ConsoleConfig, api: Arc<dyn ContentApi>) -> Self {
        let content_type = config.first_content_type().unwrap_or_default().to_string();

        Self {
            api,
            ids: Arc::new(UuidIdentifiers),
            content_types: config.content_types.clone(),
            default_language: config.default_language.clone(),
            format: LocaleFormat::for_locale(&config.display_locale),
            session: SessionContext::new(content_type),
        }
    }

    /// Replace the strategy used to mint ids for new documents.
    pub fn with_identifier_policy(mut self, ids: Arc<dyn IdentifierPolicy>) -> Self {
        self.ids = ids;
        self
    }

    pub fn with_locale_format(mut self, format: LocaleFormat) -> Self {
        self.format = format;
        self
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// Resolve the master reference, then load the list.
    ///
    /// On failure the session becomes `Disconnected` and stays so until the
    /// operator retries (`fetch_documents` or `refresh_master_reference`).
    pub async fn initialize(&mut self) -> ConsoleResult<usize> {
        self.session.status = Some(StatusMessage::info("Connecting to content repository..."));
        self.refresh_master_reference().await?;
        self.session.status = Some(StatusMessage::success("Connected to content repository"));
        self.fetch_documents().await
    }

    /// Resolve the master reference again and cache it.
    pub async fn refresh_master_reference(&mut self) -> ConsoleResult<String> {
        match self.api.resolve_master_reference().await {
            Ok(master_ref) => {
                log::info!("Master reference is {}", master_ref);
                self.session.connection = ConnectionState::Ready {
                    master_ref: master_ref.clone(),
                };
                Ok(master_ref)
            }
            Err(e) => {
                log::error!("Failed to resolve master reference: {}", e);
                self.session.connection = ConnectionState::Disconnected {
                    reason: e.to_string(),
                };
                self.session.status = Some(StatusMessage::error(
                    "Failed to connect to the content repository. Check your API configuration.",
                ));
                Err(e)
            }
        }
    }

    /// Cached master reference, resolving it first when none is cached.
    async fn master_ref(&mut self) -> ConsoleResult<String> {
        match self.session.connection.master_ref() {
            Some(master_ref) => Ok(master_ref.to_string()),
            None => self.refresh_master_reference().await,
        }
    }

    /// Select which content type is listed and created.
    pub fn select_content_type(&mut self, content_type: &str) -> ConsoleResult<()> {
        if !self.content_types.contains_key(content_type) {
            let err = ConsoleError::Validation(format!("Unknown content type {}", content_type));
            self.session.status = Some(StatusMessage::error(err.to_string()));
            return Err(err);
        }
        self.session.content_type = content_type.to_string();
        Ok(())
    }

    /// List documents of the selected type and re-render.
    ///
    /// On failure the previous documents are kept in memory, the list shows
    /// its error placeholder and the banner reports the failure.
    pub async fn fetch_documents(&mut self) -> ConsoleResult<usize> {
        self.session.list = ListView::Loading;

        let result = match self.master_ref().await {
            Ok(master_ref) => {
                self.api
                    .list_documents(&self.session.content_type, &master_ref)
                    .await
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(documents) => {
                let count = documents.len();
                self.session.list = render_list(&documents, &self.format);
                self.session.documents = documents;
                self.session.status =
                    Some(StatusMessage::success(format!("{} documents loaded", count)));
                Ok(count)
            }
            Err(e) => {
                log::error!("Error fetching documents: {}", e);
                self.session.list = ListView::Failed;
                self.session.status = Some(StatusMessage::error(
                    "Failed to fetch documents from the repository",
                ));
                Err(e)
            }
        }
    }

    fn require_ready(&mut self) -> ConsoleResult<()> {
        if self.session.connection.is_ready() {
            return Ok(());
        }
        let err = ConsoleError::Connection("not connected to the content repository".to_string());
        self.session.status = Some(StatusMessage::error(err.to_string()));
        Err(err)
    }

    /// Report a mutation outcome; refresh the list after a success.
    async fn finish_mutation<T>(
        &mut self,
        action: &str,
        result: ConsoleResult<T>,
    ) -> ConsoleResult<T> {
        match result {
            Ok(value) => {
                self.session.status =
                    Some(StatusMessage::success(format!("Document {} successfully", action)));
                // A failed refresh reports itself; the mutation still succeeded.
                let _ = self.fetch_documents().await;
                Ok(value)
            }
            Err(e) => {
                log::error!("Document could not be {}: {}", action, e);
                self.session.status = Some(StatusMessage::error(format!(
                    "Error: document could not be {}. See the log for details.",
                    action
                )));
                Err(e)
            }
        }
    }

    /// Create a document of the selected type with a freshly minted id.
    pub async fn create_document(&mut self, title: &str, content: &str) -> ConsoleResult<Value> {
        self.create_from_fields(&DocumentFields::new(title, content)).await
    }

    async fn create_from_fields(&mut self, fields: &DocumentFields) -> ConsoleResult<Value> {
        self.require_ready()?;

        let document = NewDocument::new(
            self.ids.mint(),
            &self.session.content_type,
            &self.default_language,
            fields,
        );

        let result = self.api.create_document(&document).await;
        if result.is_ok() {
            log::info!("Created document {}", document.id);
        }
        self.finish_mutation("created", result).await
    }

    /// Update title and content of a document.
    ///
    /// `mutation_ref` should be the ref from the last fetch. An empty one is
    /// still sent; the upstream decides whether to accept it.
    pub async fn update_document(
        &mut self,
        id: &str,
        mutation_ref: &str,
        title: &str,
        content: &str,
    ) -> ConsoleResult<Value> {
        self.update_from_fields(id, mutation_ref, &DocumentFields::new(title, content)).await
    }

    async fn update_from_fields(
        &mut self,
        id: &str,
        mutation_ref: &str,
        fields: &DocumentFields,
    ) -> ConsoleResult<Value> {
        self.require_ready()?;

        if mutation_ref.is_empty() {
            log::warn!("Updating document {} without a mutation ref", id);
        }

        let patch = DocumentPatch::new(id, mutation_ref, fields);
        let result = self.api.update_document(&patch).await;
        if result.is_ok() {
            log::info!("Updated document {}", id);
        }
        self.finish_mutation("updated", result).await
    }

    pub async fn delete_document(&mut self, id: &str) -> ConsoleResult<()> {
        self.require_ready()?;

        let result = self.api.delete_document(id).await;
        if result.is_ok() {
            log::info!("Deleted document {}", id);
        }
        self.finish_mutation("deleted", result).await
    }

    /// Ask `confirm` with the document's title, delete only on `true`.
    ///
    /// Returns whether the delete was issued.
    pub async fn confirm_and_delete<F>(&mut self, id: &str, confirm: F) -> ConsoleResult<bool>
    where
        F: FnOnce(&str) -> bool,
    {
        let prompt = match self.session.document(id) {
            Some(document) => delete_prompt(document),
            None => {
                return Err(ConsoleError::Validation(format!("Unknown document {}", id)));
            }
        };

        if !confirm(&prompt) {
            return Ok(false);
        }

        self.delete_document(id).await?;
        Ok(true)
    }

    /// Open a blank form for a new document.
    pub fn open_create_form(&mut self) -> &DocumentForm {
        &*self.session.form.insert(DocumentForm::blank())
    }

    /// Open the form pre-filled from a listed document.
    pub fn open_edit_form(&mut self, id: &str) -> ConsoleResult<&DocumentForm> {
        let form = self
            .session
            .document(id)
            .map(DocumentForm::for_document)
            .ok_or_else(|| ConsoleError::Validation(format!("Unknown document {}", id)))?;
        Ok(&*self.session.form.insert(form))
    }

    pub fn cancel_form(&mut self) {
        self.session.form = None;
    }

    /// Validate and submit the form.
    ///
    /// An empty title fails before any network call. A non-empty id updates,
    /// otherwise a new document is created. The form closes on success.
    pub async fn submit_form(&mut self, form: DocumentForm) -> ConsoleResult<()> {
        if form.title.is_empty() {
            let err = ConsoleError::Validation("Title is required".to_string());
            self.session.status = Some(StatusMessage::error("Title is required"));
            return Err(err);
        }

        let fields = form.fields();
        match form.mode() {
            FormMode::Create => {
                self.create_from_fields(&fields).await?;
            }
            FormMode::Edit => {
                self.update_from_fields(&form.id, &form.mutation_ref, &fields).await?;
            }
        }

        self.session.form = None;
        Ok(())
    }
}
