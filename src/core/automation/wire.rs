//! Task records as the analysis backend sends and accepts them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::model::{AutomationTask, Frequency, TaskStatus};

/// `dayOfMonth` arrives as either `15` or `"15"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DayOfMonth {
    Number(u32),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scheduleType")]
pub enum TaskEvent {
    #[serde(rename = "one-time")]
    OneTime { time: String },
    #[serde(rename = "recurring", rename_all = "camelCase")]
    Recurring {
        frequency: Frequency,
        time: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        day_of_week: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        day_of_month: Option<DayOfMonth>,
    },
}

impl TaskEvent {
    pub fn once(datetime: impl Into<String>) -> Self {
        TaskEvent::OneTime {
            time: datetime.into(),
        }
    }

    pub fn recurring(frequency: Frequency, time: impl Into<String>) -> Self {
        TaskEvent::Recurring {
            frequency,
            time: time.into(),
            day_of_week: None,
            day_of_month: None,
        }
    }

    /// `day` is 0 = Sunday .. 6 = Saturday; ignored on one-time events.
    pub fn on_day_of_week(mut self, day: u8) -> Self {
        if let TaskEvent::Recurring { day_of_week, .. } = &mut self {
            *day_of_week = super::mapping::number_to_day_of_week(day).map(str::to_string);
        }
        self
    }

    /// Sent as a string, the same way task records carry it.
    pub fn on_day_of_month(mut self, date: u32) -> Self {
        if let TaskEvent::Recurring { day_of_month, .. } = &mut self {
            *day_of_month = Some(DayOfMonth::Text(date.to_string()));
        }
        self
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendResult {
    #[serde(default, alias = "resultId", alias = "executionId")]
    pub id: Option<String>,
    #[serde(alias = "executedAt")]
    pub timestamp: DateTime<Utc>,
    pub status: String,
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default, alias = "errorMessage")]
    pub error: Option<String>,
    #[serde(default, alias = "durationMs")]
    pub duration: Option<u64>,
    #[serde(default, alias = "s3Location")]
    pub content_location: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendTask {
    #[serde(alias = "taskId")]
    pub id: String,
    pub user_id: String,
    pub title: String,
    #[serde(alias = "prompt")]
    pub instruction: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub category: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub event: TaskEvent,
    #[serde(default)]
    pub results: Vec<BackendResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub user_id: String,
    pub title: String,
    pub instruction: String,
    pub category: String,
    pub event: TaskEvent,
    pub status: TaskStatus,
}

impl CreateTaskRequest {
    pub fn new(user_id: &str, title: &str, instruction: &str, event: TaskEvent) -> Self {
        Self {
            user_id: user_id.trim().to_string(),
            title: title.trim().to_string(),
            instruction: instruction.trim().to_string(),
            category: "general".to_string(),
            event,
            status: TaskStatus::Active,
        }
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.category = category.trim().to_string();
        self
    }

    /// First missing required field, if any.
    pub fn missing_field(&self) -> Option<&'static str> {
        [
            ("title", &self.title),
            ("instruction", &self.instruction),
            ("userId", &self.user_id),
        ]
        .into_iter()
        .find(|(_, value)| value.is_empty())
        .map(|(name, _)| name)
    }
}

/// The backend only echoes the new identifier.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateTaskResponse {
    #[serde(alias = "taskId")]
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instruction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<TaskEvent>,
}

impl UpdateTaskRequest {
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Update responses carry the task in UI shape, bare or under `task`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum TaskResponse {
    Wrapped { task: AutomationTask },
    Bare(AutomationTask),
}

impl TaskResponse {
    pub(crate) fn into_task(self) -> AutomationTask {
        match self {
            TaskResponse::Wrapped { task } | TaskResponse::Bare(task) => task,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteRequest {
    pub task_id: String,
    pub instruction: String,
    pub user_id: String,
    pub user_role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub co_code_ld: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::records::decode_list;
    use serde_json::json;

    #[test]
    fn events_carry_schedule_type_tag() {
        assert_eq!(
            serde_json::to_value(TaskEvent::once("2025-07-07T09:00:00Z")).unwrap(),
            json!({ "scheduleType": "one-time", "time": "2025-07-07T09:00:00Z" })
        );
        let weekly = TaskEvent::recurring(Frequency::Weekly, "09:00").on_day_of_week(1);
        assert_eq!(
            serde_json::to_value(weekly).unwrap(),
            json!({
                "scheduleType": "recurring",
                "frequency": "weekly",
                "time": "09:00",
                "dayOfWeek": "MON"
            })
        );
        let monthly = TaskEvent::recurring(Frequency::Monthly, "08:00").on_day_of_month(15);
        assert_eq!(
            serde_json::to_value(monthly).unwrap()["dayOfMonth"],
            json!("15")
        );
    }

    #[test]
    fn unknown_schedule_type_does_not_decode() {
        let result = serde_json::from_value::<TaskEvent>(json!({
            "scheduleType": "cron",
            "time": "* * * * *"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn create_request_reports_missing_fields_in_order() {
        let event = TaskEvent::once("2025-07-07T09:00:00Z");
        assert_eq!(
            CreateTaskRequest::new("u1", " ", "", event.clone()).missing_field(),
            Some("title")
        );
        assert_eq!(
            CreateTaskRequest::new("", "Report", "Summarise", event.clone()).missing_field(),
            Some("userId")
        );
        assert_eq!(
            CreateTaskRequest::new("u1", "Report", "Summarise", event).missing_field(),
            None
        );
    }

    #[test]
    fn update_request_serializes_only_set_fields() {
        let patch = UpdateTaskRequest::status(TaskStatus::Inactive);
        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            json!({ "status": "inactive" })
        );
        assert!(UpdateTaskRequest::default().is_empty());
        assert!(!patch.is_empty());
    }

    fn record(id: &str, event: serde_json::Value) -> serde_json::Value {
        json!({
            "taskId": id,
            "userId": "u1",
            "title": "Daily digest",
            "instruction": "Summarise overnight transactions",
            "createdAt": "2025-07-01T00:00:00Z",
            "updatedAt": "2025-07-01T00:00:00Z",
            "event": event
        })
    }

    #[test]
    fn task_lists_accept_envelopes() {
        let once = record("t1", json!({ "scheduleType": "one-time", "time": "2025-07-07T09:00:00Z" }));
        for body in [
            json!({ "tasks": [once.clone()] }),
            json!({ "data": [once.clone()] }),
            json!([once]),
        ] {
            let tasks = decode_list::<BackendTask>(body, &["tasks", "data"], "task").unwrap();
            assert_eq!(tasks.len(), 1);
            assert_eq!(tasks[0].id, "t1");
            assert_eq!(tasks[0].status, TaskStatus::Active);
        }
    }

    #[test]
    fn unknown_schedule_type_names_the_task() {
        let body = json!({ "tasks": [
            record("t1", json!({ "scheduleType": "one-time", "time": "2025-07-07T09:00:00Z" })),
            record("t-cron", json!({ "scheduleType": "cron", "time": "0 7 * * *" })),
        ] });
        let err = decode_list::<BackendTask>(body, &["tasks", "data"], "task").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("task t-cron"), "{}", message);
        assert!(message.contains("cron"), "{}", message);
    }
}
