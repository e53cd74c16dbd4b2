//! Task Lifecycle Manager - pending→completed/cancelled 遷移の所有者
//!
//! タスクの状態を書き換えてよいのはこのモジュールだけです。
//!
//! # completeTask の書き込み順序と部分失敗
//! completeTask は外部ストアへの論理的に依存した write を 3 つ順番に行います:
//! (1) タスクを completed にする（completed_at / completed_by / completion_data
//!     も同じ 1 write で）、(2) GuesstimateOrder を作る、(3) 発送タスクを作る。
//! これらは分散トランザクションに包まれていません。(2) や (3) が (1) の後で
//! 失敗すると、タスクは completed なのに go_id が無い状態で残ります。
//!
//! 回復方針: completeTask のリトライは、タスクが既に completed でカスケードが
//! 未完なら、欠けたステップだけを冪等に実行します（CascadeService のガードが
//! 二重作成を防ぐ）。カスケードまで揃った completed タスクへの再完了だけが
//! InvalidState です。`find_broken_cascades` + `repair_cascade` は同じ修復を
//! スキャン起点で行う運用向けの入口です。

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::{
    CompletionData, OrderId, TaskPatch, TaskRecord, TaskRecordId, TaskStatus, TsumugiError,
    template,
};
use crate::ports::{Clock, RecordStore, TaskFilter};

use super::cascade::{CascadeOutcome, CascadeService};

/// Result of completing (or repairing) a task.
#[derive(Debug, Clone)]
pub struct CompletionOutcome {
    pub task: TaskRecord,
    pub cascade: CascadeOutcome,
}

pub struct TaskLifecycle {
    store: Arc<dyn RecordStore>,
    clock: Arc<dyn Clock>,
    cascade: CascadeService,
}

impl TaskLifecycle {
    pub fn new(store: Arc<dyn RecordStore>, clock: Arc<dyn Clock>) -> Self {
        let cascade = CascadeService::new(store.clone(), clock.clone());
        Self {
            store,
            clock,
            cascade,
        }
    }

    /// Complete a pending task and run its cascade.
    ///
    /// `order_ids` が空でなければ、このタスクがカバーする注文集合を完了時に
    /// 確定させる（管理者の確認入力）。
    pub async fn complete_task(
        &self,
        id: TaskRecordId,
        data: CompletionData,
        order_ids: Vec<OrderId>,
        actor: &str,
    ) -> Result<CompletionOutcome, TsumugiError> {
        let task = self
            .store
            .get_task(id)
            .await?
            .ok_or_else(|| TsumugiError::not_found(format!("task {id}")))?;

        match task.status {
            TaskStatus::Pending => {}
            TaskStatus::Completed => {
                // クラッシュ後のリトライ: カスケードが未完なら欠けた分だけ実行。
                if cascade_is_incomplete(&task) {
                    warn!(task_id = %task.task_id, "retrying interrupted cascade");
                    return self.resume_cascade(task).await;
                }
                return Err(TsumugiError::invalid_state(format!(
                    "task {} is already completed",
                    task.task_id
                )));
            }
            TaskStatus::Cancelled => {
                return Err(TsumugiError::invalid_state(format!(
                    "task {} is cancelled",
                    task.task_id
                )));
            }
        }

        data.validate_for(task.completion_type)?;

        // (1) 完了メタデータ一式を 1 write で。ストアのレコード単位アトミック
        // 更新が、並行する二重完了をここで直列に拒否する。
        let mut patch = TaskPatch::complete(self.clock.now(), actor, data);
        if !order_ids.is_empty() {
            patch.order_ids = Some(order_ids);
        }
        let task = self.store.update_task(id, patch).await?;
        info!(task_id = %task.task_id, actor, "task completed");

        // (2)(3) カスケード。ここから先の失敗はタスクを completed のまま残すが、
        // リトライ・修復パスが冪等に続きを実行できる。
        self.resume_cascade(task).await
    }

    /// Cancel a pending task. Cancellation is terminal, not removal.
    pub async fn cancel_task(&self, id: TaskRecordId) -> Result<TaskRecord, TsumugiError> {
        let task = self
            .store
            .get_task(id)
            .await?
            .ok_or_else(|| TsumugiError::not_found(format!("task {id}")))?;

        if task.status != TaskStatus::Pending {
            return Err(TsumugiError::invalid_state(format!(
                "task {} is {}, only pending tasks can be cancelled",
                task.task_id,
                task.status.as_str()
            )));
        }

        let task = self.store.update_task(id, TaskPatch::cancel()).await?;
        info!(task_id = %task.task_id, "task cancelled");
        Ok(task)
    }

    /// Re-run only the missing cascade steps of a completed task.
    pub async fn repair_cascade(
        &self,
        id: TaskRecordId,
    ) -> Result<CompletionOutcome, TsumugiError> {
        let task = self
            .store
            .get_task(id)
            .await?
            .ok_or_else(|| TsumugiError::not_found(format!("task {id}")))?;

        if task.status != TaskStatus::Completed {
            return Err(TsumugiError::invalid_state(format!(
                "task {} is {}, only completed tasks can be repaired",
                task.task_id,
                task.status.as_str()
            )));
        }

        self.resume_cascade(task).await
    }

    /// Completed tasks whose template requires cascade records that are missing.
    pub async fn find_broken_cascades(&self) -> Result<Vec<TaskRecord>, TsumugiError> {
        let completed = self
            .store
            .list_tasks(&TaskFilter {
                status: Some(TaskStatus::Completed),
                ..TaskFilter::default()
            })
            .await?;
        Ok(completed
            .into_iter()
            .filter(cascade_is_incomplete)
            .collect())
    }

    async fn resume_cascade(&self, task: TaskRecord) -> Result<CompletionOutcome, TsumugiError> {
        let cascade = self.cascade.cascade(&task).await?;
        // カスケードがリンクを書き戻しているので取り直す
        let task = self
            .store
            .get_task(task.id)
            .await?
            .ok_or_else(|| TsumugiError::not_found(format!("task {}", task.id)))?;
        Ok(CompletionOutcome { task, cascade })
    }
}

fn cascade_is_incomplete(task: &TaskRecord) -> bool {
    let Some(tpl) = template(&task.template_id) else {
        return false;
    };
    (tpl.creates_supplier_order && task.go_id.is_none())
        || (tpl.creates_shipping && task.shipping_task_id.is_none())
}
