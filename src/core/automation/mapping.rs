use chrono::{DateTime, Utc};
use tracing::warn;

use super::model::{AutomationTask, Schedule, TaskResult, TaskResultStatus, TriggerConfig};
use super::wire::{
    BackendResult, BackendTask, CreateTaskRequest, DayOfMonth, ExecuteResponse, TaskEvent,
};
use crate::api::{ApiError, Result};

const DAYS_OF_WEEK: [&str; 7] = ["SUN", "MON", "TUE", "WED", "THU", "FRI", "SAT"];

pub const GENERIC_FAILURE: &str = "Task execution failed";

/// `SUN`..`SAT` to 0..6. Anything else maps to 0 (Sunday); the loss is
/// logged rather than rejected so existing records keep loading.
pub fn day_of_week_to_number(day: &str) -> u8 {
    match DAYS_OF_WEEK.iter().position(|d| *d == day) {
        Some(index) => index as u8,
        None => {
            warn!(day, "unrecognised dayOfWeek, defaulting to Sunday");
            0
        }
    }
}

pub fn number_to_day_of_week(day: u8) -> Option<&'static str> {
    DAYS_OF_WEEK.get(day as usize).copied()
}

/// Leading digits, like `parseInt("15th") == 15`; 1..=31 only.
fn parse_day_of_month(value: &DayOfMonth) -> Result<u32> {
    let parsed = match value {
        DayOfMonth::Number(n) => Some(*n),
        DayOfMonth::Text(text) => {
            let digits: String = text
                .trim()
                .chars()
                .take_while(|c| c.is_ascii_digit())
                .collect();
            digits.parse().ok()
        }
    };
    parsed
        .filter(|d| (1..=31).contains(d))
        .ok_or_else(|| ApiError::Decode(format!("invalid dayOfMonth: {:?}", value)))
}

pub fn event_to_trigger(event: &TaskEvent) -> Result<TriggerConfig> {
    match event {
        TaskEvent::OneTime { time } => Ok(TriggerConfig::Once {
            datetime: time.clone(),
        }),
        TaskEvent::Recurring {
            frequency,
            time,
            day_of_week,
            day_of_month,
        } => Ok(TriggerConfig::Recurring {
            schedule: Schedule {
                frequency: *frequency,
                time: time.clone(),
                days: day_of_week
                    .as_deref()
                    .map(|day| vec![day_of_week_to_number(day)]),
                date: day_of_month.as_ref().map(parse_day_of_month).transpose()?,
            },
        }),
    }
}

/// Inverse of [`event_to_trigger`] for building requests from the UI model.
/// Only the first weekday survives: the backend event holds a single day.
pub fn trigger_to_event(trigger: &TriggerConfig) -> TaskEvent {
    match trigger {
        TriggerConfig::Once { datetime } => TaskEvent::once(datetime.clone()),
        TriggerConfig::Recurring { schedule } => {
            let mut event = TaskEvent::recurring(schedule.frequency, schedule.time.clone());
            if let Some(day) = schedule.days.as_ref().and_then(|d| d.first()) {
                event = event.on_day_of_week(*day);
            }
            if let Some(date) = schedule.date {
                event = event.on_day_of_month(date);
            }
            event
        }
    }
}

pub fn map_result(task_id: &str, index: usize, result: BackendResult) -> TaskResult {
    let (status, output) = if result.status == "success" {
        (TaskResultStatus::Success, result.output.unwrap_or_default())
    } else {
        let detail = result
            .error
            .or(result.output)
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| GENERIC_FAILURE.to_string());
        (TaskResultStatus::Error, detail)
    };

    TaskResult {
        id: result
            .id
            .unwrap_or_else(|| format!("{}-result-{}", task_id, index)),
        timestamp: result.timestamp,
        status,
        output,
        duration: result.duration.unwrap_or(0),
        content_location: result.content_location,
    }
}

pub fn map_task(task: BackendTask) -> Result<AutomationTask> {
    let trigger_config = event_to_trigger(&task.event).map_err(|e| match e {
        ApiError::Decode(msg) => ApiError::Decode(format!("task {}: {}", task.id, msg)),
        other => other,
    })?;
    let results: Vec<TaskResult> = task
        .results
        .into_iter()
        .enumerate()
        .map(|(i, r)| map_result(&task.id, i, r))
        .collect();
    let last_executed = results.iter().map(|r| r.timestamp).max();

    Ok(AutomationTask {
        id: task.id,
        title: task.title,
        instruction: task.instruction,
        trigger_config,
        status: task.status,
        created_at: task.created_at,
        updated_at: task.updated_at,
        last_executed,
        results,
        user_id: task.user_id,
        category: task.category,
    })
}

/// Builds the local view of a freshly created task from what was sent.
pub fn task_from_request(
    id: String,
    request: &CreateTaskRequest,
    now: DateTime<Utc>,
) -> Result<AutomationTask> {
    Ok(AutomationTask {
        id,
        title: request.title.clone(),
        instruction: request.instruction.clone(),
        trigger_config: event_to_trigger(&request.event)?,
        status: request.status,
        created_at: now,
        updated_at: now,
        last_executed: None,
        results: Vec::new(),
        user_id: request.user_id.clone(),
        category: request.category.clone(),
    })
}

/// Reads a [`TaskResult`] out of an execute response. `data` has no fixed
/// shape, so the usual field names are probed and the message is the
/// fallback output.
pub fn result_from_execution(resp: &ExecuteResponse, now: DateTime<Utc>) -> TaskResult {
    let data = resp.data.as_ref();
    let field = |keys: &[&str]| {
        data.and_then(|d| keys.iter().find_map(|k| d.get(*k)))
            .filter(|v| !v.is_null())
    };

    let output = field(&["output", "result", "response"])
        .map(|v| match v.as_str() {
            Some(s) => s.to_string(),
            None => v.to_string(),
        })
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| {
            if resp.message.trim().is_empty() && !resp.success {
                GENERIC_FAILURE.to_string()
            } else {
                resp.message.clone()
            }
        });

    TaskResult {
        id: resp
            .execution_id
            .clone()
            .unwrap_or_else(|| format!("exec-{}", now.timestamp_millis())),
        timestamp: now,
        status: if resp.success {
            TaskResultStatus::Success
        } else {
            TaskResultStatus::Error
        },
        output,
        duration: field(&["duration", "durationMs"])
            .and_then(|v| v.as_u64())
            .unwrap_or(0),
        content_location: field(&["contentLocation", "s3Location"])
            .and_then(|v| v.as_str())
            .map(str::to_string),
    }
}
