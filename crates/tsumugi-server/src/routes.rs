//! HTTP routes - cron トリガーと管理者向けタスク操作
//!
//! - `POST /batch-job` — cron から（または手動で）バッチビルダーを 1 回走らせる。
//!   `Authorization: Bearer <secret>` か `X-Cron-Secret: <secret>` が必須。
//!   `dryRun=true` ならタスクを作らず集計プレビューだけ返す。
//! - `GET /tasks` — 緊急度計算済みのタスク一覧（status / type / search で絞り込み）。
//! - `POST /tasks/{id}/complete` — タスク完了とカスケード。
//! - `GET /tasks/standard-batches` — pending の週次バッチビュー一覧。
//! - `POST /tasks/standard-batches/{id}/complete` — 週次バッチの完了（同じカスケード）。

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use ulid::Ulid;

use tsumugi_core::app::{BatchBuilder, BatchRunOutcome, TaskLifecycle, TaskView, Views};
use tsumugi_core::domain::{
    CompletionData, OrderId, TaskRecordId, TaskStatus, TaskType, TsumugiError,
};
use tsumugi_core::ports::{RecordStore, TaskFilter};

use crate::error::ApiError;

pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub lifecycle: TaskLifecycle,
    pub batch: BatchBuilder,
    pub views: Views,
    pub cron_secret: String,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/batch-job", post(batch_job))
        .route("/tasks", get(list_tasks))
        .route("/tasks/{id}/complete", post(complete_task))
        .route("/tasks/standard-batches", get(standard_batches))
        .route("/tasks/standard-batches/{id}/complete", post(complete_batch_task))
        .with_state(state)
}

// ========================================
// cron trigger
// ========================================

#[derive(Debug, Deserialize)]
struct BatchJobQuery {
    #[serde(default, rename = "dryRun")]
    dry_run: bool,
}

fn check_cron_secret(headers: &HeaderMap, secret: &str) -> Result<(), ApiError> {
    let bearer = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    let header = headers.get("x-cron-secret").and_then(|v| v.to_str().ok());

    if bearer == Some(secret) || header == Some(secret) {
        Ok(())
    } else {
        Err(ApiError::Unauthorized)
    }
}

async fn batch_job(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BatchJobQuery>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    check_cron_secret(&headers, &state.cron_secret)?;

    let outcome = state.batch.run(query.dry_run).await?;
    let body = match outcome {
        BatchRunOutcome::Skipped => json!({
            "status": "skipped",
            "reason": "no_orders",
        }),
        BatchRunOutcome::DryRun(batch) => json!({
            "mode": "dry-run",
            "batch": batch,
        }),
        BatchRunOutcome::Created { task, batch } => json!({
            "status": "created",
            "task_id": task.task_id,
            "batch": batch,
        }),
        BatchRunOutcome::AlreadyExists { task, batch } => json!({
            "status": "already_exists",
            "task_id": task.task_id,
            "batch": batch,
        }),
    };
    Ok(Json(body))
}

// ========================================
// task management
// ========================================

#[derive(Debug, Deserialize)]
struct ListTasksQuery {
    status: Option<String>,
    #[serde(rename = "type")]
    task_type: Option<String>,
    search: Option<String>,
}

fn parse_filter(query: ListTasksQuery) -> Result<TaskFilter, TsumugiError> {
    let status = match query.status.as_deref() {
        None | Some("all") => None,
        Some("pending") => Some(TaskStatus::Pending),
        Some("completed") => Some(TaskStatus::Completed),
        Some("cancelled") => Some(TaskStatus::Cancelled),
        Some(other) => {
            return Err(TsumugiError::validation(format!("unknown status {other}")));
        }
    };
    let task_type = match query.task_type.as_deref() {
        None | Some("all") => None,
        Some(other) => Some(
            TaskType::parse(other)
                .ok_or_else(|| TsumugiError::validation(format!("unknown task type {other}")))?,
        ),
    };
    Ok(TaskFilter {
        status,
        task_type,
        search: query.search,
    })
}

async fn list_tasks(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListTasksQuery>,
) -> Result<Json<Vec<TaskView>>, ApiError> {
    let filter = parse_filter(query)?;
    let views = state.views.list_tasks(&filter).await?;
    Ok(Json(views))
}

#[derive(Debug, Deserialize)]
struct CompleteTaskBody {
    amount: Option<f64>,
    notes: Option<String>,
    confirmed: Option<bool>,
    #[serde(default)]
    order_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
struct CompleteTaskResponse {
    task_id: String,
    go_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    shipping_task_id: Option<String>,
}

fn parse_task_record_id(raw: &str) -> Result<TaskRecordId, TsumugiError> {
    let raw = raw.strip_prefix("tsk-").unwrap_or(raw);
    Ulid::from_string(raw)
        .map(TaskRecordId::from)
        .map_err(|_| TsumugiError::validation(format!("invalid task record id {raw}")))
}

async fn run_completion(
    state: &AppState,
    id: TaskRecordId,
    body: CompleteTaskBody,
) -> Result<Json<CompleteTaskResponse>, ApiError> {
    let data = CompletionData {
        amount: body.amount,
        invoice_url: None,
        confirmed: body.confirmed,
        notes: body.notes,
    };
    let order_ids: Vec<OrderId> = body.order_ids.into_iter().map(OrderId::new).collect();

    // TODO: 管理者認証ミドルウェアが入ったら actor をセッションから取る
    let outcome = state
        .lifecycle
        .complete_task(id, data, order_ids, "admin")
        .await?;

    // 表示 ID で応答する（UI は GO-xxxx を見せる）
    let go_display = match outcome.task.go_id {
        Some(go_record_id) => state
            .store
            .get_supplier_order(go_record_id)
            .await?
            .map(|go| go.go_id),
        None => None,
    };
    let shipping_display = match outcome.task.shipping_task_id {
        Some(task_record_id) => state
            .store
            .get_task(task_record_id)
            .await?
            .map(|t| t.task_id),
        None => None,
    };

    Ok(Json(CompleteTaskResponse {
        task_id: outcome.task.task_id,
        go_id: go_display,
        shipping_task_id: shipping_display,
    }))
}

async fn complete_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<CompleteTaskBody>,
) -> Result<Json<CompleteTaskResponse>, ApiError> {
    let id = parse_task_record_id(&id)?;
    run_completion(&state, id, body).await
}

async fn standard_batches(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    let batches = state.views.pending_standard_batches().await?;
    Ok(Json(json!(batches)))
}

async fn complete_batch_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<CompleteTaskBody>,
) -> Result<Json<CompleteTaskResponse>, ApiError> {
    let id = parse_task_record_id(&id)?;
    run_completion(&state, id, body).await
}
