use bytes::Bytes;
use reqwest::Body;
use reqwest::multipart::{Form, Part};
use std::sync::Arc;
use tokio::sync::watch;
use tokio_stream::StreamExt;
use tracing::{debug, info};

use super::model::{
    AddTextRequest, ContentResponse, ItemResponse, KnowledgeBaseItem, LIST_KEYS,
    UpdateKnowledgeRequest,
};
use super::validation::FileUpload;
use crate::api::records::decode_list;
use crate::api::{ApiClient, ApiError, Result};

const KNOWLEDGE_BASES: &str = "/admin/knowledge-bases";

/// Bytes per body chunk; progress moves once per chunk handed to the transport.
const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// Upload progress measured from the bytes reqwest has pulled off the body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadProgress {
    pub sent: u64,
    pub total: u64,
    /// Set only once the server has accepted the upload.
    pub done: bool,
}

impl UploadProgress {
    /// 0..=99 while bytes are in flight, 100 once the server has answered.
    pub fn percent(&self) -> u8 {
        if self.done {
            return 100;
        }
        if self.total == 0 {
            return 0;
        }
        ((self.sent.saturating_mul(100) / self.total).min(99)) as u8
    }
}

#[derive(Clone)]
pub struct KnowledgeBaseService {
    api: ApiClient,
}

impl KnowledgeBaseService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    fn item_path(id: &str) -> String {
        format!("{}/{}", KNOWLEDGE_BASES, urlencoding::encode(id))
    }

    pub async fn list(&self) -> Result<Vec<KnowledgeBaseItem>> {
        let body: serde_json::Value = self.api.get_json(KNOWLEDGE_BASES).await?;
        let items: Vec<KnowledgeBaseItem> = decode_list(body, LIST_KEYS, "item")?;
        debug!(count = items.len(), "knowledge base items fetched");
        Ok(items)
    }

    pub async fn add_text(&self, title: &str, description: &str) -> Result<KnowledgeBaseItem> {
        let request = AddTextRequest {
            title: title.trim().to_string(),
            description: description.trim().to_string(),
        };
        if request.title.is_empty() || request.description.is_empty() {
            return Err(ApiError::Validation(
                "title and content are required".to_string(),
            ));
        }

        let resp: ItemResponse = self.api.post_json(KNOWLEDGE_BASES, &request).await?;
        let item = resp.into_item();
        info!(id = %item.id, "text knowledge added");
        Ok(item)
    }

    /// Validates, then streams the file as multipart form data. When a
    /// `progress` sender is given it receives an update per chunk sent and a
    /// final `done` update after the server accepts the file.
    pub async fn upload_file(
        &self,
        upload: &FileUpload,
        title: &str,
        description: &str,
        progress: Option<Arc<watch::Sender<UploadProgress>>>,
    ) -> Result<KnowledgeBaseItem> {
        let validation = upload.validate();
        if !validation.is_valid {
            return Err(ApiError::Validation(
                validation
                    .error
                    .unwrap_or_else(|| "invalid file".to_string()),
            ));
        }

        let total = upload.size();
        let title = if title.trim().is_empty() {
            upload.file_name.clone()
        } else {
            title.trim().to_string()
        };

        let part = Part::stream_with_length(
            progress_body(upload.bytes.clone(), progress.clone()),
            total,
        )
        .file_name(upload.file_name.clone())
        .mime_str(&upload.mime_type)?;

        let form = Form::new()
            .text("title", title)
            .text("description", description.trim().to_string())
            .part("file", part);

        let resp: ItemResponse = self.api.post_multipart(KNOWLEDGE_BASES, form).await?;
        if let Some(tx) = progress {
            tx.send_replace(UploadProgress {
                sent: total,
                total,
                done: true,
            });
        }

        let item = resp.into_item();
        info!(id = %item.id, file = %upload.file_name, size = total, "file knowledge uploaded");
        Ok(item)
    }

    pub async fn update(
        &self,
        id: &str,
        request: &UpdateKnowledgeRequest,
    ) -> Result<KnowledgeBaseItem> {
        if request.is_empty() {
            return Err(ApiError::Validation("nothing to update".to_string()));
        }
        let resp: ItemResponse = self.api.put_json(&Self::item_path(id), request).await?;
        info!(id, "knowledge item updated");
        Ok(resp.into_item())
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.api.delete(&Self::item_path(id)).await?;
        info!(id, "knowledge item deleted");
        Ok(())
    }

    /// Rendered content of an item. Accepts `{"content": ...}` or a raw body.
    pub async fn content(&self, id: &str) -> Result<String> {
        let path = format!("{}/content", Self::item_path(id));
        let body = self.api.get_text(&path).await?;
        match serde_json::from_str::<ContentResponse>(&body) {
            Ok(parsed) => Ok(parsed.content),
            Err(_) => Ok(body),
        }
    }
}

fn progress_body(bytes: Bytes, progress: Option<Arc<watch::Sender<UploadProgress>>>) -> Body {
    let total = bytes.len() as u64;
    let chunks: Vec<Bytes> = (0..bytes.len())
        .step_by(UPLOAD_CHUNK_SIZE)
        .map(|start| bytes.slice(start..(start + UPLOAD_CHUNK_SIZE).min(bytes.len())))
        .collect();

    if let Some(tx) = &progress {
        tx.send_replace(UploadProgress {
            sent: 0,
            total,
            done: false,
        });
    }

    let mut sent = 0u64;
    let stream = tokio_stream::iter(chunks).map(move |chunk| {
        sent += chunk.len() as u64;
        if let Some(tx) = &progress {
            tx.send_replace(UploadProgress {
                sent,
                total,
                done: false,
            });
        }
        Ok::<Bytes, std::io::Error>(chunk)
    });
    Body::wrap_stream(stream)
}
