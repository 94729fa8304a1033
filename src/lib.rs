//! Operations console for the banking back office: automation tasks,
//! knowledge base, system logs and billing over the console REST API.

pub mod api;
pub mod cli;
pub mod core;
pub mod logging;
pub mod platform;

pub use api::{ApiClient, ApiError};
