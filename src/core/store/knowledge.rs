use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, warn};

use super::{Reconcile, upsert_by};
use crate::api::{ApiError, Result};
use crate::core::knowledge::{
    FileUpload, KnowledgeBaseItem, KnowledgeBaseService, UpdateKnowledgeRequest, UploadProgress,
};

pub struct KnowledgeBaseStore {
    service: KnowledgeBaseService,
    reconcile: Reconcile,
    items: Vec<KnowledgeBaseItem>,
    is_loading: bool,
    is_uploading: bool,
    progress: Arc<watch::Sender<UploadProgress>>,
    error: Option<String>,
}

impl KnowledgeBaseStore {
    pub fn new(service: KnowledgeBaseService, reconcile: Reconcile) -> Self {
        let (progress, _) = watch::channel(UploadProgress::default());
        Self {
            service,
            reconcile,
            items: Vec::new(),
            is_loading: false,
            is_uploading: false,
            progress: Arc::new(progress),
            error: None,
        }
    }

    pub fn items(&self) -> &[KnowledgeBaseItem] {
        &self.items
    }

    pub fn item(&self, id: &str) -> Option<&KnowledgeBaseItem> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn is_uploading(&self) -> bool {
        self.is_uploading
    }

    /// Percent of the current or last upload.
    pub fn upload_progress(&self) -> u8 {
        self.progress.borrow().percent()
    }

    /// Live progress updates; subscribe before starting an upload.
    pub fn subscribe_progress(&self) -> watch::Receiver<UploadProgress> {
        self.progress.subscribe()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    fn fail<T>(&mut self, err: ApiError) -> Result<T> {
        debug!(error = %err, "knowledge base action failed");
        self.error = Some(err.to_string());
        Err(err)
    }

    pub async fn fetch_items(&mut self) -> Result<()> {
        self.is_loading = true;
        self.error = None;
        let result = self.service.list().await;
        self.is_loading = false;
        match result {
            Ok(items) => {
                self.items = items;
                Ok(())
            }
            Err(e) => self.fail(e),
        }
    }

    async fn reload_after_change(&mut self) {
        if let Err(e) = self.fetch_items().await {
            warn!(error = %e, "knowledge base reload after change failed");
        }
    }

    /// Under `Refetch` a failed reload lands in `error`; the item the server
    /// accepted is still returned.
    async fn reconcile_item(&mut self, item: &KnowledgeBaseItem) {
        match self.reconcile {
            Reconcile::Local => upsert_by(&mut self.items, item.clone(), |i| i.id.as_str()),
            Reconcile::Refetch => self.reload_after_change().await,
        }
    }

    pub async fn add_text_knowledge(
        &mut self,
        title: &str,
        description: &str,
    ) -> Result<KnowledgeBaseItem> {
        self.is_loading = true;
        self.error = None;
        let result = self.service.add_text(title, description).await;
        self.is_loading = false;
        match result {
            Ok(item) => {
                self.reconcile_item(&item).await;
                Ok(item)
            }
            Err(e) => self.fail(e),
        }
    }

    /// Invalid files are rejected here, before any request, and surface as
    /// the store error like any other failure.
    pub async fn upload_file_knowledge(
        &mut self,
        upload: &FileUpload,
        title: &str,
        description: &str,
    ) -> Result<KnowledgeBaseItem> {
        self.error = None;
        let validation = upload.validate();
        if !validation.is_valid {
            let reason = validation
                .error
                .unwrap_or_else(|| "invalid file".to_string());
            return self.fail(ApiError::Validation(reason));
        }

        self.is_uploading = true;
        self.progress.send_replace(UploadProgress::default());
        let result = self
            .service
            .upload_file(upload, title, description, Some(self.progress.clone()))
            .await;
        self.is_uploading = false;

        match result {
            Ok(item) => {
                self.reconcile_item(&item).await;
                Ok(item)
            }
            Err(e) => {
                self.progress.send_replace(UploadProgress::default());
                self.fail(e)
            }
        }
    }

    pub async fn update_knowledge_item(
        &mut self,
        id: &str,
        patch: &UpdateKnowledgeRequest,
    ) -> Result<KnowledgeBaseItem> {
        self.error = None;
        match self.service.update(id, patch).await {
            Ok(item) => {
                self.reconcile_item(&item).await;
                Ok(item)
            }
            Err(e) => self.fail(e),
        }
    }

    pub async fn delete_knowledge_item(&mut self, id: &str) -> Result<()> {
        self.error = None;
        match self.service.delete(id).await {
            Ok(()) => {
                match self.reconcile {
                    Reconcile::Local => self.items.retain(|i| i.id != id),
                    Reconcile::Refetch => self.reload_after_change().await,
                }
                Ok(())
            }
            Err(e) => self.fail(e),
        }
    }
}
