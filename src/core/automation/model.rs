use chrono::{DateTime, Datelike, Duration, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Active,
    Inactive,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Active => "active",
            TaskStatus::Inactive => "inactive",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
}

impl Frequency {
    pub fn as_str(self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
        }
    }

    pub fn from_name(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "daily" => Some(Frequency::Daily),
            "weekly" => Some(Frequency::Weekly),
            "monthly" => Some(Frequency::Monthly),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub frequency: Frequency,
    /// Wall-clock time of day, `HH:MM`.
    pub time: String,
    /// Days of week, 0 = Sunday .. 6 = Saturday.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days: Option<Vec<u8>>,
    /// Day of month, 1..=31.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<u32>,
}

/// When a task fires. The tag makes "exactly one of datetime or schedule"
/// impossible to violate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TriggerConfig {
    Once { datetime: String },
    Recurring { schedule: Schedule },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskResultStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResult {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub status: TaskResultStatus,
    /// Output on success, error message otherwise.
    pub output: String,
    /// Milliseconds; 0 when the backend did not report it.
    #[serde(default)]
    pub duration: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationTask {
    pub id: String,
    pub title: String,
    pub instruction: String,
    pub trigger_config: TriggerConfig,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub last_executed: Option<DateTime<Utc>>,
    #[serde(default)]
    pub results: Vec<TaskResult>,
    pub user_id: String,
    #[serde(default)]
    pub category: String,
}

impl AutomationTask {
    pub fn is_active(&self) -> bool {
        self.status == TaskStatus::Active
    }

    pub fn latest_result(&self) -> Option<&TaskResult> {
        self.results.iter().max_by_key(|r| r.timestamp)
    }
}

const DAY_ABBREVIATIONS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

pub(crate) fn parse_time_of_day(time: &str) -> Option<NaiveTime> {
    let time = time.trim();
    NaiveTime::parse_from_str(time, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M:%S"))
        .ok()
}

impl Schedule {
    /// Next fire time strictly after `now`. Times are interpreted as UTC.
    /// `None` when the schedule lacks what its frequency needs (weekly
    /// without days, monthly without a date) or the time is unparsable.
    pub fn next_run_after(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let at = parse_time_of_day(&self.time)?;
        let today = now.date_naive();

        match self.frequency {
            Frequency::Daily => (0..=1)
                .map(|offset| today + Duration::days(offset))
                .map(|day| Utc.from_utc_datetime(&day.and_time(at)))
                .find(|candidate| *candidate > now),
            Frequency::Weekly => {
                let days = self.days.as_ref().filter(|d| !d.is_empty())?;
                (0..=7)
                    .map(|offset| today + Duration::days(offset))
                    .filter(|day| days.contains(&(day.weekday().num_days_from_sunday() as u8)))
                    .map(|day| Utc.from_utc_datetime(&day.and_time(at)))
                    .find(|candidate| *candidate > now)
            }
            Frequency::Monthly => {
                let date = self.date.filter(|d| (1..=31).contains(d))?;
                let (mut year, mut month) = (today.year(), today.month());
                // Day 31 can skip several months; two years always contains a hit.
                for _ in 0..24 {
                    if let Some(day) = chrono::NaiveDate::from_ymd_opt(year, month, date) {
                        let candidate = Utc.from_utc_datetime(&day.and_time(at));
                        if candidate > now {
                            return Some(candidate);
                        }
                    }
                    if month == 12 {
                        year += 1;
                        month = 1;
                    } else {
                        month += 1;
                    }
                }
                None
            }
        }
    }

    pub fn describe(&self) -> String {
        match self.frequency {
            Frequency::Daily => format!("Daily at {}", self.time),
            Frequency::Weekly => {
                let days = self
                    .days
                    .as_deref()
                    .unwrap_or_default()
                    .iter()
                    .filter_map(|d| DAY_ABBREVIATIONS.get(*d as usize).copied())
                    .collect::<Vec<_>>();
                if days.is_empty() {
                    format!("Weekly at {}", self.time)
                } else {
                    format!("Weekly on {} at {}", days.join(", "), self.time)
                }
            }
            Frequency::Monthly => match self.date {
                Some(date) => format!("Monthly on day {} at {}", date, self.time),
                None => format!("Monthly at {}", self.time),
            },
        }
    }
}

impl TriggerConfig {
    pub fn once(datetime: impl Into<String>) -> Self {
        TriggerConfig::Once {
            datetime: datetime.into(),
        }
    }

    pub fn schedule(&self) -> Option<&Schedule> {
        match self {
            TriggerConfig::Recurring { schedule } => Some(schedule),
            TriggerConfig::Once { .. } => None,
        }
    }

    pub fn next_run_after(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            TriggerConfig::Once { datetime } => DateTime::parse_from_rfc3339(datetime)
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
                .filter(|dt| *dt > now),
            TriggerConfig::Recurring { schedule } => schedule.next_run_after(now),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            TriggerConfig::Once { datetime } => format!("Once at {}", datetime),
            TriggerConfig::Recurring { schedule } => schedule.describe(),
        }
    }
}
