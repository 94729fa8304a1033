use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    /// Case-insensitive; `warning` is accepted for `WARN`.
    pub fn from_name(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "DEBUG" => Some(LogLevel::Debug),
            "INFO" => Some(LogLevel::Info),
            "WARN" | "WARNING" => Some(LogLevel::Warn),
            "ERROR" => Some(LogLevel::Error),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for LogLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        LogLevel::from_name(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown log level '{}'", raw)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub time: String,
    pub date: String,
    pub user_name: String,
    pub role: String,
    pub level: LogLevel,
    pub status_code: u16,
    pub message: String,
    pub service: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingEntry {
    pub date: String,
    pub cost: f64,
}

/// Client-side log filter. Every set criterion must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogFilter {
    pub level: Option<LogLevel>,
    pub service: Option<String>,
    /// Substring searched in message, user name and service, ignoring case.
    pub text: Option<String>,
}

impl LogFilter {
    pub fn matches(&self, entry: &LogEntry) -> bool {
        if self.level.is_some_and(|level| entry.level != level) {
            return false;
        }
        if let Some(service) = &self.service
            && !entry.service.eq_ignore_ascii_case(service.trim())
        {
            return false;
        }
        if let Some(text) = &self.text {
            let needle = text.trim().to_lowercase();
            if !needle.is_empty()
                && ![&entry.message, &entry.user_name, &entry.service]
                    .iter()
                    .any(|field| field.to_lowercase().contains(&needle))
            {
                return false;
            }
        }
        true
    }

    pub fn apply<'a>(&self, entries: &'a [LogEntry]) -> Vec<&'a LogEntry> {
        entries.iter().filter(|e| self.matches(e)).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingSummary {
    pub total: f64,
    pub average: f64,
    pub peak: Option<BillingEntry>,
    pub days: usize,
}

impl BillingSummary {
    pub fn from_entries(entries: &[BillingEntry]) -> Self {
        let total: f64 = entries.iter().map(|e| e.cost).sum();
        let average = if entries.is_empty() {
            0.0
        } else {
            total / entries.len() as f64
        };
        let peak = entries
            .iter()
            .max_by(|a, b| a.cost.total_cmp(&b.cost))
            .cloned();
        Self {
            total,
            average,
            peak,
            days: entries.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::records::decode_list;

    fn entry(level: LogLevel, service: &str, message: &str) -> LogEntry {
        LogEntry {
            time: "09:15:02".into(),
            date: "2025-07-07".into(),
            user_name: "nguyen.an".into(),
            role: "admin".into(),
            level,
            status_code: 200,
            message: message.into(),
            service: service.into(),
        }
    }

    #[test]
    fn level_decodes_case_insensitively() {
        for raw in ["\"warn\"", "\"WARN\"", "\"Warning\""] {
            assert_eq!(serde_json::from_str::<LogLevel>(raw).unwrap(), LogLevel::Warn);
        }
        assert!(serde_json::from_str::<LogLevel>("\"TRACE\"").is_err());
        assert_eq!(serde_json::to_string(&LogLevel::Error).unwrap(), "\"ERROR\"");
    }

    #[test]
    fn bad_log_level_names_the_entry() {
        let good = serde_json::to_value(entry(LogLevel::Info, "auth", "Signed in")).unwrap();
        let mut bad = good.clone();
        bad["level"] = serde_json::json!("TRACE");
        let err = decode_list::<LogEntry>(serde_json::json!({ "logs": [good, bad] }), &["logs"], "log entry")
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("log entry #1"), "{}", message);
        assert!(message.contains("TRACE"), "{}", message);
    }

    #[test]
    fn filter_combines_criteria() {
        let logs = vec![
            entry(LogLevel::Error, "payments", "Transfer rejected"),
            entry(LogLevel::Info, "payments", "Transfer accepted"),
            entry(LogLevel::Error, "auth", "Token expired"),
        ];
        let filter = LogFilter {
            level: Some(LogLevel::Error),
            service: Some("Payments".into()),
            text: None,
        };
        assert_eq!(filter.apply(&logs).len(), 1);

        let search = LogFilter {
            text: Some("TOKEN".into()),
            ..Default::default()
        };
        let hits = search.apply(&logs);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].service, "auth");
        assert_eq!(LogFilter::default().apply(&logs).len(), 3);
    }

    #[test]
    fn billing_summary_totals_and_peak() {
        let entries = vec![
            BillingEntry { date: "2025-07-01".into(), cost: 10.0 },
            BillingEntry { date: "2025-07-02".into(), cost: 30.0 },
            BillingEntry { date: "2025-07-03".into(), cost: 20.0 },
        ];
        let summary = BillingSummary::from_entries(&entries);
        assert_eq!(summary.total, 60.0);
        assert_eq!(summary.average, 20.0);
        assert_eq!(summary.peak.unwrap().date, "2025-07-02");

        let empty = BillingSummary::from_entries(&[]);
        assert_eq!(empty.average, 0.0);
        assert!(empty.peak.is_none());
    }
}
