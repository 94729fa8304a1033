//! Scheduled automation tasks: the UI task model, the backend's event
//! records and the translation between them.

pub mod mapping;
pub mod model;
pub mod service;
pub mod wire;

pub use mapping::{day_of_week_to_number, number_to_day_of_week};
pub use model::{
    AutomationTask, Frequency, Schedule, TaskResult, TaskResultStatus, TaskStatus, TriggerConfig,
};
pub use service::AutomationTaskService;
pub use wire::{CreateTaskRequest, ExecuteRequest, ExecuteResponse, TaskEvent, UpdateTaskRequest};
