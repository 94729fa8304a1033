use reqwest::StatusCode;
use thiserror::Error;

pub const AUTH_FAILED_MESSAGE: &str = "Authentication failed. Please log in again.";

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP 401, or no bearer token available before the call.
    #[error("{0}")]
    Authentication(String),

    /// Rejected locally before any request was sent.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{message}")]
    Http { status: StatusCode, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The response did not match any known shape.
    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error("Credential store error: {0}")]
    Credentials(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    pub fn missing_token() -> Self {
        ApiError::Authentication(format!(
            "Authentication failed: no access token found. {}",
            "Run `bankops login` first."
        ))
    }

    /// Builds the error for a non-2xx status. `detail` is the server's
    /// `message`/`error` field when the body carried one.
    pub fn from_status(status: StatusCode, detail: Option<String>) -> Self {
        if status == StatusCode::UNAUTHORIZED {
            return ApiError::Authentication(AUTH_FAILED_MESSAGE.to_string());
        }
        let message = match detail {
            Some(detail) if !detail.trim().is_empty() => {
                format!("HTTP error! status: {} - {}", status.as_u16(), detail.trim())
            }
            _ => format!("HTTP error! status: {}", status.as_u16()),
        };
        ApiError::Http { status, message }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, ApiError::Authentication(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ApiError::Validation(_))
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            ApiError::Authentication(_) => Some(StatusCode::UNAUTHORIZED),
            ApiError::Network(e) => e.status(),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}
