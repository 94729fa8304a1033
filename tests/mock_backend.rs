#![allow(dead_code)]

use axum::extract::{FromRequest, Multipart, Path, Request, State};
use axum::http::StatusCode;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post, put};
use axum::{Json, Router};
use bankops::api::ApiClient;
use bankops::core::credentials::StaticToken;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;
use uuid::Uuid;

pub type TestResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

pub const TEST_TOKEN: &str = "test-token";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedUpload {
    pub title: String,
    pub file_name: String,
    pub mime_type: String,
    pub size: usize,
}

#[derive(Default)]
struct Backend {
    items: Vec<Value>,
    tasks: Vec<Value>,
    uploads: Vec<ReceivedUpload>,
    task_list_hits: usize,
    item_list_hits: usize,
    fail_admin: bool,
    fail_task_list: bool,
    fail_item_list: bool,
}

#[derive(Clone, Default)]
struct MockState {
    backend: Arc<Mutex<Backend>>,
}

impl MockState {
    fn lock(&self) -> std::sync::MutexGuard<'_, Backend> {
        self.backend.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "message": "not found" }))).into_response()
}

async fn require_token(req: Request, next: Next) -> Response {
    let expected = format!("Bearer {}", TEST_TOKEN);
    let authorized = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        == Some(expected.as_str());
    if !authorized {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "invalid token" })),
        )
            .into_response();
    }
    next.run(req).await
}

// ---- knowledge base ----

fn list_unavailable() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "message": "list unavailable" })),
    )
        .into_response()
}

async fn list_items(State(state): State<MockState>) -> Response {
    let mut backend = state.lock();
    backend.item_list_hits += 1;
    if backend.fail_item_list {
        return list_unavailable();
    }
    Json(json!({ "items": backend.items })).into_response()
}

fn new_item(title: &str, description: &str, file: Option<(&str, &str, usize)>) -> Value {
    let id = Uuid::new_v4().to_string();
    let (file_name, mime, size) = match file {
        Some((name, mime, size)) => (json!(name), json!(mime), json!(size)),
        None => (json!("null"), Value::Null, Value::Null),
    };
    json!({
        "id": id,
        "title": title,
        "description": description,
        "fileName": file_name,
        "createdAt": now(),
        "updatedAt": now(),
        "metadata": { "bucket": "kb-bucket", "key": format!("kb/{}", id), "mimeType": mime, "size": size }
    })
}

async fn create_item(State(state): State<MockState>, req: Request) -> Response {
    let is_multipart = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("multipart/form-data"));

    let item = if is_multipart {
        let Ok(mut multipart) = Multipart::from_request(req, &state).await else {
            return StatusCode::BAD_REQUEST.into_response();
        };
        let mut title = String::new();
        let mut description = String::new();
        let mut file: Option<(String, String, usize)> = None;
        while let Ok(Some(field)) = multipart.next_field().await {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "title" => title = field.text().await.unwrap_or_default(),
                "description" => description = field.text().await.unwrap_or_default(),
                "file" => {
                    let name = field.file_name().unwrap_or_default().to_string();
                    let mime = field.content_type().unwrap_or_default().to_string();
                    let size = field.bytes().await.map(|b| b.len()).unwrap_or_default();
                    file = Some((name, mime, size));
                }
                _ => {}
            }
        }
        let Some((name, mime, size)) = file else {
            return StatusCode::BAD_REQUEST.into_response();
        };
        state.lock().uploads.push(ReceivedUpload {
            title: title.clone(),
            file_name: name.clone(),
            mime_type: mime.clone(),
            size,
        });
        new_item(&title, &description, Some((&name, &mime, size)))
    } else {
        let Ok(Json(body)) = Json::<Value>::from_request(req, &state).await else {
            return StatusCode::BAD_REQUEST.into_response();
        };
        new_item(
            body["title"].as_str().unwrap_or_default(),
            body["description"].as_str().unwrap_or_default(),
            None,
        )
    };

    state.lock().items.push(item.clone());
    (StatusCode::CREATED, Json(json!({ "item": item }))).into_response()
}

async fn update_item(
    State(state): State<MockState>,
    Path(id): Path<String>,
    Json(patch): Json<Value>,
) -> Response {
    let mut backend = state.lock();
    let Some(item) = backend.items.iter_mut().find(|i| i["id"] == id) else {
        return not_found();
    };
    for key in ["title", "description"] {
        if let Some(value) = patch.get(key) {
            item[key] = value.clone();
        }
    }
    item["updatedAt"] = json!(now());
    Json(item.clone()).into_response()
}

async fn delete_item(State(state): State<MockState>, Path(id): Path<String>) -> StatusCode {
    state.lock().items.retain(|i| i["id"] != id);
    StatusCode::NO_CONTENT
}

async fn item_content(State(state): State<MockState>, Path(id): Path<String>) -> Response {
    let backend = state.lock();
    match backend.items.iter().find(|i| i["id"] == id) {
        Some(item) => Json(json!({ "content": item["description"] })).into_response(),
        None => not_found(),
    }
}

// ---- automation tasks ----

fn ui_task(record: &Value) -> Value {
    let event = &record["event"];
    let trigger = if event["scheduleType"] == "one-time" {
        json!({ "type": "once", "datetime": event["time"] })
    } else {
        json!({
            "type": "recurring",
            "schedule": { "frequency": event["frequency"], "time": event["time"] }
        })
    };
    json!({
        "id": record["taskId"],
        "title": record["title"],
        "instruction": record["instruction"],
        "triggerConfig": trigger,
        "status": record["status"],
        "createdAt": record["createdAt"],
        "updatedAt": record["updatedAt"],
        "results": [],
        "userId": record["userId"],
        "category": record["category"]
    })
}

async fn list_tasks(State(state): State<MockState>, Path(user_id): Path<String>) -> Response {
    let mut backend = state.lock();
    backend.task_list_hits += 1;
    if backend.fail_task_list {
        return list_unavailable();
    }
    let tasks: Vec<Value> = backend
        .tasks
        .iter()
        .filter(|t| t["userId"] == user_id)
        .cloned()
        .collect();
    Json(json!({ "tasks": tasks })).into_response()
}

async fn create_task(State(state): State<MockState>, Json(body): Json<Value>) -> Json<Value> {
    let id = format!("task-{}", Uuid::new_v4());
    let mut record = body;
    record["taskId"] = json!(id);
    record["createdAt"] = json!(now());
    record["updatedAt"] = json!(now());
    record["results"] = json!([]);
    state.lock().tasks.push(record);
    Json(json!({ "taskId": id }))
}

async fn update_task(
    State(state): State<MockState>,
    Path(id): Path<String>,
    Json(patch): Json<Value>,
) -> Response {
    let mut backend = state.lock();
    let Some(record) = backend.tasks.iter_mut().find(|t| t["taskId"] == id) else {
        return not_found();
    };
    let status_only = patch.as_object().is_some_and(|p| p.len() == 1 && p.contains_key("status"));
    if let Some(fields) = patch.as_object() {
        for (key, value) in fields {
            record[key.as_str()] = value.clone();
        }
    }
    // Server-side bookkeeping the client must not mirror on status flips.
    record["updatedAt"] = json!("2030-01-01T00:00:00Z");

    if status_only {
        Json(json!({ "success": true })).into_response()
    } else {
        Json(json!({ "task": ui_task(record) })).into_response()
    }
}

async fn delete_task(State(state): State<MockState>, Path(id): Path<String>) -> StatusCode {
    state.lock().tasks.retain(|t| t["taskId"] != id);
    StatusCode::NO_CONTENT
}

async fn execute_task(State(state): State<MockState>, Json(body): Json<Value>) -> Response {
    let task_id = body["taskId"].as_str().unwrap_or_default().to_string();
    let execution_id = format!("exec-{}", Uuid::new_v4());
    let mut backend = state.lock();
    let Some(record) = backend.tasks.iter_mut().find(|t| t["taskId"] == task_id) else {
        return not_found();
    };
    let output = format!("Ran: {}", body["instruction"].as_str().unwrap_or_default());
    if let Some(results) = record["results"].as_array_mut() {
        results.push(json!({
            "resultId": execution_id,
            "executedAt": now(),
            "status": "success",
            "output": output,
            "duration": 420
        }));
    }
    Json(json!({
        "success": true,
        "message": "Task executed",
        "executionId": execution_id,
        "data": { "output": output, "duration": 420 }
    }))
    .into_response()
}

async fn legacy_execute(Path(id): Path<String>) -> Json<Value> {
    Json(json!({ "status": "queued", "taskId": id }))
}

// ---- admin ----

async fn logs(State(state): State<MockState>) -> Response {
    if state.lock().fail_admin {
        return (StatusCode::INTERNAL_SERVER_ERROR, "upstream down").into_response();
    }
    Json(json!({
        "logs": [
            {
                "time": "10:00:00", "date": "2025-07-08", "userName": "ops.bot", "role": "service",
                "level": "error", "statusCode": 502, "message": "Core banking gateway timeout",
                "service": "payments"
            },
            {
                "time": "10:01:00", "date": "2025-07-08", "userName": "tran.minh", "role": "admin",
                "level": "INFO", "statusCode": 200, "message": "Signed in", "service": "auth"
            }
        ]
    }))
    .into_response()
}

async fn billing(State(state): State<MockState>) -> Response {
    if state.lock().fail_admin {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "billing store unavailable" })),
        )
            .into_response();
    }
    Json(json!([
        { "date": "2025-07-06", "cost": 12.5 },
        { "date": "2025-07-07", "cost": 20.0 }
    ]))
    .into_response()
}

/// In-process stand-in for the console REST API. Every route requires
/// `Authorization: Bearer test-token`.
pub struct MockBackend {
    pub port: u16,
    state: MockState,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl MockBackend {
    pub async fn start() -> TestResult<Self> {
        let state = MockState::default();
        let app = Router::new()
            .route("/admin/knowledge-bases", get(list_items).post(create_item))
            .route(
                "/admin/knowledge-bases/{id}",
                put(update_item).delete(delete_item),
            )
            .route("/admin/knowledge-bases/{id}/content", get(item_content))
            .route("/analysis-task/create", post(create_task))
            .route("/analysis-task/execute", post(execute_task))
            .route("/analysis-task/{user_id}", get(list_tasks))
            .route(
                "/automation/tasks/{id}",
                patch(update_task).delete(delete_task),
            )
            .route("/automation/tasks/{id}/execute", post(legacy_execute))
            .route("/admin/log", get(logs))
            .route("/billing", get(billing))
            .layer(middleware::from_fn(require_token))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let port = listener.local_addr()?.port();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await;
        });

        Ok(Self {
            port,
            state,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    pub fn client(&self) -> ApiClient {
        self.client_with_token(TEST_TOKEN)
    }

    pub fn client_with_token(&self, token: &str) -> ApiClient {
        ApiClient::new(&self.base_url(), Arc::new(StaticToken::new(token)))
    }

    pub fn set_admin_failing(&self, failing: bool) {
        self.state.lock().fail_admin = failing;
    }

    /// Makes the task list endpoint answer 500 while the other routes work.
    pub fn set_task_list_failing(&self, failing: bool) {
        self.state.lock().fail_task_list = failing;
    }

    pub fn set_item_list_failing(&self, failing: bool) {
        self.state.lock().fail_item_list = failing;
    }

    pub fn task_list_hits(&self) -> usize {
        self.state.lock().task_list_hits
    }

    pub fn item_list_hits(&self) -> usize {
        self.state.lock().item_list_hits
    }

    pub fn uploads(&self) -> Vec<ReceivedUpload> {
        self.state.lock().uploads.clone()
    }

    /// Stores a raw backend task record as-is.
    pub fn seed_task(&self, record: Value) {
        self.state.lock().tasks.push(record);
    }

    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

/// Starts the mock, or `None` when the sandbox forbids binding sockets.
pub async fn start_or_skip(test: &str) -> TestResult<Option<MockBackend>> {
    match MockBackend::start().await {
        Ok(server) => Ok(Some(server)),
        Err(err) if err.to_string().contains("Operation not permitted") => {
            eprintln!("Skipping {}: socket bind not permitted", test);
            Ok(None)
        }
        Err(err) => Err(err),
    }
}
