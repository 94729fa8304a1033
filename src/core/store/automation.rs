use chrono::Utc;
use tracing::{debug, warn};

use super::{Reconcile, upsert_by};
use crate::api::{ApiError, Result};
use crate::core::automation::mapping::result_from_execution;
use crate::core::automation::{
    AutomationTask, AutomationTaskService, CreateTaskRequest, ExecuteRequest, ExecuteResponse,
    TaskResult, TaskStatus, UpdateTaskRequest,
};

/// Who the console acts as when listing and executing tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operator {
    pub user_id: String,
    pub user_role: String,
    pub co_code_ld: Option<String>,
}

pub struct AutomationTaskStore {
    service: AutomationTaskService,
    operator: Operator,
    reconcile: Reconcile,
    tasks: Vec<AutomationTask>,
    is_loading: bool,
    is_executing: bool,
    error: Option<String>,
}

impl AutomationTaskStore {
    pub fn new(service: AutomationTaskService, operator: Operator, reconcile: Reconcile) -> Self {
        Self {
            service,
            operator,
            reconcile,
            tasks: Vec::new(),
            is_loading: false,
            is_executing: false,
            error: None,
        }
    }

    pub fn tasks(&self) -> &[AutomationTask] {
        &self.tasks
    }

    pub fn task(&self, id: &str) -> Option<&AutomationTask> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn operator(&self) -> &Operator {
        &self.operator
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn is_executing(&self) -> bool {
        self.is_executing
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    fn fail<T>(&mut self, err: ApiError) -> Result<T> {
        debug!(error = %err, "automation action failed");
        self.error = Some(err.to_string());
        Err(err)
    }

    pub async fn fetch_tasks(&mut self) -> Result<()> {
        self.is_loading = true;
        self.error = None;
        let result = self.service.list(&self.operator.user_id).await;
        self.is_loading = false;
        match result {
            Ok(tasks) => {
                self.tasks = tasks;
                Ok(())
            }
            Err(e) => self.fail(e),
        }
    }

    /// Reloads after a change the server already accepted. A failed reload
    /// is left in `error` and does not undo the change.
    async fn reload_after_change(&mut self) {
        if let Err(e) = self.fetch_tasks().await {
            warn!(error = %e, "task list reload after change failed");
        }
    }

    async fn reconcile_task(&mut self, task: &AutomationTask) {
        match self.reconcile {
            Reconcile::Local => upsert_by(&mut self.tasks, task.clone(), |t| t.id.as_str()),
            Reconcile::Refetch => self.reload_after_change().await,
        }
    }

    pub async fn create_task(&mut self, request: &CreateTaskRequest) -> Result<AutomationTask> {
        self.is_loading = true;
        self.error = None;
        let result = self.service.create(request).await;
        self.is_loading = false;
        match result {
            Ok(task) => {
                self.reconcile_task(&task).await;
                Ok(task)
            }
            Err(e) => self.fail(e),
        }
    }

    pub async fn update_task(
        &mut self,
        id: &str,
        patch: &UpdateTaskRequest,
    ) -> Result<AutomationTask> {
        self.error = None;
        match self.service.update(id, patch).await {
            Ok(task) => {
                self.reconcile_task(&task).await;
                Ok(task)
            }
            Err(e) => self.fail(e),
        }
    }

    pub async fn delete_task(&mut self, id: &str) -> Result<()> {
        self.error = None;
        match self.service.delete(id).await {
            Ok(()) => {
                match self.reconcile {
                    Reconcile::Local => self.tasks.retain(|t| t.id != id),
                    Reconcile::Refetch => self.reload_after_change().await,
                }
                Ok(())
            }
            Err(e) => self.fail(e),
        }
    }

    pub async fn activate_task(&mut self, id: &str) -> Result<()> {
        self.set_status(id, TaskStatus::Active).await
    }

    pub async fn deactivate_task(&mut self, id: &str) -> Result<()> {
        self.set_status(id, TaskStatus::Inactive).await
    }

    /// Under `Local` only `status` changes; the response body is not read.
    async fn set_status(&mut self, id: &str, status: TaskStatus) -> Result<()> {
        self.error = None;
        match self.service.set_status(id, status).await {
            Ok(()) => {
                match self.reconcile {
                    Reconcile::Local => {
                        if let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) {
                            task.status = status;
                        }
                    }
                    Reconcile::Refetch => self.reload_after_change().await,
                }
                Ok(())
            }
            Err(e) => self.fail(e),
        }
    }

    fn execute_request(&self, id: &str) -> Result<ExecuteRequest> {
        let task = self
            .task(id)
            .ok_or_else(|| ApiError::Validation(format!("task '{}' is not loaded", id)))?;
        Ok(ExecuteRequest {
            task_id: task.id.clone(),
            instruction: task.instruction.clone(),
            user_id: self.operator.user_id.clone(),
            user_role: self.operator.user_role.clone(),
            co_code_ld: self.operator.co_code_ld.clone(),
        })
    }

    /// Runs a loaded task now. Execution appends results server-side, so a
    /// successful call always reloads the list whatever the reconcile mode.
    /// The response is returned even when that reload fails.
    pub async fn execute_task_immediately(&mut self, id: &str) -> Result<ExecuteResponse> {
        self.error = None;
        let request = match self.execute_request(id) {
            Ok(request) => request,
            Err(e) => return self.fail(e),
        };

        self.is_executing = true;
        let result = self.service.execute_immediately(&request).await;
        self.is_executing = false;

        let resp = match result {
            Ok(resp) => resp,
            Err(e) => return self.fail(e),
        };
        let failure = (!resp.success).then(|| {
            warn!(task_id = id, message = %resp.message, "execution reported failure");
            if resp.message.trim().is_empty() {
                "Task execution failed".to_string()
            } else {
                resp.message.clone()
            }
        });
        self.reload_after_change().await;
        // The execution's own failure outranks a failed reload.
        if let Some(message) = failure {
            self.error = Some(message);
        }
        Ok(resp)
    }

    #[deprecated(note = "use execute_task_immediately")]
    pub async fn execute_task(&mut self, id: &str) -> Result<TaskResult> {
        let resp = self.execute_task_immediately(id).await?;
        Ok(result_from_execution(&resp, Utc::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiClient;
    use crate::core::credentials::StaticToken;
    use std::sync::Arc;

    #[tokio::test]
    async fn executing_an_unknown_task_is_a_local_error() {
        let api = ApiClient::new("http://127.0.0.1:9", Arc::new(StaticToken::new("t")));
        let mut store = AutomationTaskStore::new(
            AutomationTaskService::new(api),
            Operator {
                user_id: "u1".into(),
                user_role: "admin".into(),
                co_code_ld: None,
            },
            Reconcile::Local,
        );
        let err = store.execute_task_immediately("missing").await.unwrap_err();
        assert!(err.is_validation());
        assert!(store.error().unwrap().contains("missing"));
        assert!(!store.is_executing());
    }
}
