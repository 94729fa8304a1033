use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where the backend keeps an item's bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeMetadata {
    #[serde(default)]
    pub bucket: String,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeBaseItem {
    pub id: String,
    pub title: String,
    /// Markdown body.
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub file_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub metadata: KnowledgeMetadata,
}

impl KnowledgeBaseItem {
    /// Uploaded file rather than a pure-text entry. The backend writes the
    /// literal string "null" for text entries, so that counts as absent.
    pub fn is_file(&self) -> bool {
        self.file_name
            .as_deref()
            .is_some_and(|name| !name.trim().is_empty() && name != "null")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddTextRequest {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateKnowledgeRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl UpdateKnowledgeRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none()
    }
}

/// Keys the list endpoint wraps its items in.
pub(crate) const LIST_KEYS: &[&str] = &["items", "data"];

/// Response shapes of create/update: the item itself or wrapped in `item`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ItemResponse {
    Wrapped { item: KnowledgeBaseItem },
    Bare(KnowledgeBaseItem),
}

impl ItemResponse {
    pub(crate) fn into_item(self) -> KnowledgeBaseItem {
        match self {
            ItemResponse::Wrapped { item } => item,
            ItemResponse::Bare(item) => item,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ContentResponse {
    pub content: String,
}
