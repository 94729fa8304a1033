use chrono::Utc;
use tracing::{debug, info};

use super::mapping::{map_task, task_from_request};
use super::model::{AutomationTask, TaskStatus};
use super::wire::{
    BackendTask, CreateTaskRequest, CreateTaskResponse, ExecuteRequest, ExecuteResponse,
    TaskResponse, UpdateTaskRequest,
};
use crate::api::records::decode_list;
use crate::api::{ApiClient, ApiError, Result};

const ANALYSIS_TASK: &str = "/analysis-task";
const AUTOMATION_TASKS: &str = "/automation/tasks";

#[derive(Clone)]
pub struct AutomationTaskService {
    api: ApiClient,
}

impl AutomationTaskService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    fn task_path(id: &str) -> String {
        format!("{}/{}", AUTOMATION_TASKS, urlencoding::encode(id))
    }

    pub async fn list(&self, user_id: &str) -> Result<Vec<AutomationTask>> {
        if user_id.trim().is_empty() {
            return Err(ApiError::Validation("userId is required".to_string()));
        }
        let path = format!("{}/{}", ANALYSIS_TASK, urlencoding::encode(user_id.trim()));
        let body: serde_json::Value = self.api.get_json(&path).await?;
        let tasks = decode_list::<BackendTask>(body, &["tasks", "data"], "task")?
            .into_iter()
            .map(map_task)
            .collect::<Result<Vec<_>>>()?;
        debug!(user_id, count = tasks.len(), "automation tasks fetched");
        Ok(tasks)
    }

    /// The backend answers with the new id only; the rest of the returned
    /// task is derived from `request`.
    pub async fn create(&self, request: &CreateTaskRequest) -> Result<AutomationTask> {
        if let Some(field) = request.missing_field() {
            return Err(ApiError::Validation(format!("{} is required", field)));
        }
        let path = format!("{}/create", ANALYSIS_TASK);
        let resp: CreateTaskResponse = self.api.post_json(&path, request).await?;
        let task = task_from_request(resp.id, request, Utc::now())?;
        info!(id = %task.id, title = %task.title, "automation task created");
        Ok(task)
    }

    /// Partial update. The server's task is returned as sent, without mapping.
    pub async fn update(&self, id: &str, patch: &UpdateTaskRequest) -> Result<AutomationTask> {
        if patch.is_empty() {
            return Err(ApiError::Validation("nothing to update".to_string()));
        }
        let resp: TaskResponse = self.api.patch_json(&Self::task_path(id), patch).await?;
        info!(id, "automation task updated");
        Ok(resp.into_task())
    }

    /// Status-only update; whatever the server answers is ignored.
    pub async fn set_status(&self, id: &str, status: TaskStatus) -> Result<()> {
        let _: serde_json::Value = self
            .api
            .patch_json(&Self::task_path(id), &UpdateTaskRequest::status(status))
            .await?;
        info!(id, status = status.as_str(), "automation task status changed");
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.api.delete(&Self::task_path(id)).await?;
        info!(id, "automation task deleted");
        Ok(())
    }

    pub async fn execute_immediately(&self, request: &ExecuteRequest) -> Result<ExecuteResponse> {
        if request.task_id.trim().is_empty() || request.instruction.trim().is_empty() {
            return Err(ApiError::Validation(
                "taskId and instruction are required".to_string(),
            ));
        }
        let path = format!("{}/execute", ANALYSIS_TASK);
        let resp: ExecuteResponse = self.api.post_json(&path, request).await?;
        info!(
            task_id = %request.task_id,
            success = resp.success,
            execution_id = ?resp.execution_id,
            "automation task executed"
        );
        Ok(resp)
    }

    /// Older single-argument execute endpoint. Its body has no fixed shape.
    pub async fn execute_legacy(&self, id: &str) -> Result<serde_json::Value> {
        let path = format!("{}/execute", Self::task_path(id));
        let resp = self
            .api
            .post_json(&path, &serde_json::json!({}))
            .await?;
        info!(id, "automation task executed via legacy endpoint");
        Ok(resp)
    }
}
