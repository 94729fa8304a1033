use tracing::warn;

use crate::api::Result;
use crate::core::admin::fixtures::{fallback_billing, fallback_logs};
use crate::core::admin::{AdminService, BillingEntry, BillingSummary, LogEntry, LogFilter};

/// One independently loaded dataset. On failure the error is kept and the
/// fixture data takes the place of the real rows.
#[derive(Debug, Clone)]
pub struct Slot<T> {
    pub data: Vec<T>,
    pub is_loading: bool,
    pub error: Option<String>,
    pub using_fallback: bool,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            is_loading: false,
            error: None,
            using_fallback: false,
        }
    }
}

impl<T> Slot<T> {
    fn settle(&mut self, what: &str, result: Result<Vec<T>>, fallback: fn() -> Vec<T>) {
        self.is_loading = false;
        match result {
            Ok(data) => {
                self.data = data;
                self.error = None;
                self.using_fallback = false;
            }
            Err(e) => {
                warn!(error = %e, "{} unavailable, showing demo data", what);
                self.data = fallback();
                self.error = Some(e.to_string());
                self.using_fallback = true;
            }
        }
    }
}

pub struct AdminDataStore {
    service: AdminService,
    logs: Slot<LogEntry>,
    billing: Slot<BillingEntry>,
}

impl AdminDataStore {
    pub fn new(service: AdminService) -> Self {
        Self {
            service,
            logs: Slot::default(),
            billing: Slot::default(),
        }
    }

    pub fn logs(&self) -> &Slot<LogEntry> {
        &self.logs
    }

    pub fn billing(&self) -> &Slot<BillingEntry> {
        &self.billing
    }

    pub fn filtered_logs(&self, filter: &LogFilter) -> Vec<&LogEntry> {
        filter.apply(&self.logs.data)
    }

    pub fn billing_summary(&self) -> BillingSummary {
        BillingSummary::from_entries(&self.billing.data)
    }

    pub async fn fetch_logs(&mut self) {
        self.logs.is_loading = true;
        let result = self.service.fetch_logs().await;
        self.logs.settle("logs", result, fallback_logs);
    }

    pub async fn fetch_billing(&mut self) {
        self.billing.is_loading = true;
        let result = self.service.fetch_billing().await;
        self.billing.settle("billing", result, fallback_billing);
    }

    /// Loads both datasets concurrently.
    pub async fn refresh(&mut self) {
        self.logs.is_loading = true;
        self.billing.is_loading = true;
        let (logs, billing) = tokio::join!(self.service.fetch_logs(), self.service.fetch_billing());
        self.logs.settle("logs", logs, fallback_logs);
        self.billing.settle("billing", billing, fallback_billing);
    }
}
