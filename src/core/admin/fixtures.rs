//! Demo data shown when the log or billing endpoint is unreachable.

use super::model::{BillingEntry, LogEntry, LogLevel};

const LOGS: &[(&str, &str, &str, &str, LogLevel, u16, &str, &str)] = &[
    ("08:02:11", "2025-07-07", "tran.minh", "admin", LogLevel::Info, 200, "User signed in", "auth"),
    ("08:05:43", "2025-07-07", "le.hoa", "operator", LogLevel::Info, 201, "Knowledge base document uploaded", "knowledge-base"),
    ("08:17:09", "2025-07-07", "system", "service", LogLevel::Warn, 429, "Rate limit approaching for analysis workers", "analysis-task"),
    ("08:31:56", "2025-07-07", "pham.quang", "operator", LogLevel::Error, 500, "Scheduled report generation failed", "automation"),
    ("08:44:20", "2025-07-07", "system", "service", LogLevel::Debug, 200, "Cache warmed for billing aggregates", "billing"),
    ("09:01:37", "2025-07-07", "tran.minh", "admin", LogLevel::Info, 200, "Automation task activated", "automation"),
    ("09:12:05", "2025-07-07", "nguyen.lan", "viewer", LogLevel::Error, 401, "Token expired during request", "auth"),
    ("09:26:48", "2025-07-07", "system", "service", LogLevel::Info, 200, "Daily transaction digest delivered", "analysis-task"),
];

const BILLING: &[(&str, f64)] = &[
    ("2025-07-01", 42.18),
    ("2025-07-02", 39.74),
    ("2025-07-03", 51.02),
    ("2025-07-04", 47.36),
    ("2025-07-05", 28.90),
    ("2025-07-06", 25.47),
    ("2025-07-07", 44.63),
];

pub fn fallback_logs() -> Vec<LogEntry> {
    LOGS.iter()
        .map(
            |&(time, date, user_name, role, level, status_code, message, service)| LogEntry {
                time: time.to_string(),
                date: date.to_string(),
                user_name: user_name.to_string(),
                role: role.to_string(),
                level,
                status_code,
                message: message.to_string(),
                service: service.to_string(),
            },
        )
        .collect()
}

pub fn fallback_billing() -> Vec<BillingEntry> {
    BILLING
        .iter()
        .map(|&(date, cost)| BillingEntry {
            date: date.to_string(),
            cost,
        })
        .collect()
}
