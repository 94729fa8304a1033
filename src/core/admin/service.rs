use tracing::debug;

use super::model::{BillingEntry, LogEntry};
use crate::api::records::decode_list;
use crate::api::{ApiClient, Result};

const LOGS_PATH: &str = "/admin/log";
const BILLING_PATH: &str = "/billing";

/// Read-only access to system logs and the billing series.
#[derive(Clone)]
pub struct AdminService {
    api: ApiClient,
}

impl AdminService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn fetch_logs(&self) -> Result<Vec<LogEntry>> {
        let body: serde_json::Value = self.api.get_json(LOGS_PATH).await?;
        let logs: Vec<LogEntry> = decode_list(body, &["logs", "data"], "log entry")?;
        debug!(count = logs.len(), "logs fetched");
        Ok(logs)
    }

    pub async fn fetch_billing(&self) -> Result<Vec<BillingEntry>> {
        let body: serde_json::Value = self.api.get_json(BILLING_PATH).await?;
        let billing: Vec<BillingEntry> = decode_list(body, &["billing", "data"], "billing day")?;
        debug!(count = billing.len(), "billing fetched");
        Ok(billing)
    }
}
