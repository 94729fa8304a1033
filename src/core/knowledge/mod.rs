//! Knowledge-base entries: text notes and uploaded reference files used by
//! the backend assistant.

pub mod model;
pub mod service;
pub mod validation;

pub use model::{KnowledgeBaseItem, KnowledgeMetadata, UpdateKnowledgeRequest};
pub use service::{KnowledgeBaseService, UploadProgress};
pub use validation::{
    FileUpload, FileValidation, MAX_FILE_SIZE, format_file_size, is_allowed_mime_type,
    validate_file,
};
