//! HTTP plumbing shared by every console service.

pub mod error;
pub mod http;
pub(crate) mod records;

pub use error::{ApiError, Result};
pub use http::ApiClient;
