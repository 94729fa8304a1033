pub mod fixtures;
pub mod model;
pub mod service;

pub use model::{BillingEntry, BillingSummary, LogEntry, LogFilter, LogLevel};
pub use service::AdminService;
