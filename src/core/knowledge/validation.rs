use bytes::Bytes;
use serde::Serialize;
use std::path::Path;

/// Uploads above this size are rejected before any request is made.
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "text/plain",
    "text/csv",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/json",
    "application/xml",
    "text/xml",
    "text/markdown",
    "text/x-markdown",
    "application/rtf",
    "text/rtf",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileValidation {
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileValidation {
    fn ok() -> Self {
        Self {
            is_valid: true,
            error: None,
        }
    }

    fn rejected(reason: String) -> Self {
        Self {
            is_valid: false,
            error: Some(reason),
        }
    }
}

/// `text/plain; charset=utf-8` -> `text/plain`
fn essence(mime_type: &str) -> String {
    mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

pub fn is_allowed_mime_type(mime_type: &str) -> bool {
    let essence = essence(mime_type);
    ALLOWED_MIME_TYPES.contains(&essence.as_str())
}

/// Size is checked before type: an oversized file is invalid whatever it is.
pub fn validate_file(size: u64, mime_type: &str) -> FileValidation {
    if size > MAX_FILE_SIZE {
        return FileValidation::rejected(format!(
            "File size ({}) exceeds the maximum allowed size of {}",
            format_file_size(size),
            format_file_size(MAX_FILE_SIZE)
        ));
    }
    if !is_allowed_mime_type(mime_type) {
        let shown = if mime_type.trim().is_empty() {
            "unknown"
        } else {
            mime_type.trim()
        };
        return FileValidation::rejected(format!(
            "File type '{}' is not supported. Allowed: PDF, Word, TXT, CSV, Excel, JSON, XML, Markdown, RTF",
            shown
        ));
    }
    FileValidation::ok()
}

const SIZE_UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// Human-readable size in base 1024 with at most two decimals:
/// `0 Bytes`, `1 KB`, `1.5 KB`, `10 MB`.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, SIZE_UNITS[unit])
}

/// A file staged for upload.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Bytes,
}

impl FileUpload {
    pub fn new(file_name: &str, mime_type: &str, bytes: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.to_string(),
            mime_type: mime_type.to_string(),
            bytes: bytes.into(),
        }
    }

    /// Reads the file and guesses its MIME type from the extension.
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload".to_string());
        let mime_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Ok(Self {
            file_name,
            mime_type,
            bytes: Bytes::from(bytes),
        })
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn validate(&self) -> FileValidation {
        validate_file(self.size(), &self.mime_type)
    }
}
