//! Cascade Service - タスク完了が生む下流レコードの作成
//!
//! タスク完了時に、雛形の指定に従って
//! 1. GuesstimateOrder（サプライヤー発注）をちょうど 1 つ作り、
//! 2. 依存する発送タスクを 1 つ作って親タスクにリンクする。
//!
//! # 冪等ガード（このモジュールの要）
//! ステータス書き込みとカスケードは別々の write で、間でクラッシュや
//! タイムアウトが起こり得ます。そのため各ステップの前に「もうできているか」を
//! タスク上のリンク（go_id / shipping_task_id）で確認し、できていれば作らずに
//! 既存 ID を返します。呼び出し側が completeTask をリトライしても、
//! GuesstimateOrder が 2 つできることはありません。
//!
//! 「中断されたカスケードの再開」は例外処理ではなく主要シナリオです。
//! app::lifecycle::repair_cascade がこの性質に直接依存します。

use std::sync::Arc;

use tracing::info;

use crate::aggregate::aggregate_contains;
use crate::catalog;
use crate::deadline::compute_deadline;
use crate::domain::{
    SupplierOrderDraft, SupplierOrderRecordId, TaskDraft, TaskPatch, TaskRecord, TaskRecordId,
    TsumugiError, template,
    template::SHIPPING_FOLLOW_UP,
};
use crate::ports::{Clock, RecordStore};

/// What a cascade produced (or found already in place).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadeOutcome {
    pub go_id: Option<SupplierOrderRecordId>,
    pub shipping_task_id: Option<TaskRecordId>,
}

pub struct CascadeService {
    store: Arc<dyn RecordStore>,
    clock: Arc<dyn Clock>,
}

impl CascadeService {
    pub fn new(store: Arc<dyn RecordStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Run the cascade for a completed task. Safe to re-run.
    ///
    /// `task` は completed 済みの最新レコードであること（completion_data から
    /// 発注金額を読む）。
    pub async fn cascade(&self, task: &TaskRecord) -> Result<CascadeOutcome, TsumugiError> {
        let tpl = template(&task.template_id).ok_or_else(|| {
            TsumugiError::validation(format!("unknown template {}", task.template_id))
        })?;

        let mut outcome = CascadeOutcome {
            go_id: task.go_id,
            shipping_task_id: task.shipping_task_id,
        };

        if tpl.creates_supplier_order {
            if let Some(existing) = task.go_id {
                // 冪等ガード: 既に作られている。作り直さず既存 ID を返す。
                info!(task_id = %task.task_id, go_id = %existing, "supplier order already exists, skipping");
            } else {
                let go = self.create_supplier_order(task).await?;
                self.store
                    .update_task(task.id, TaskPatch::set_go_id(go.id))
                    .await?;
                info!(task_id = %task.task_id, go_id = %go.go_id, "supplier order created");
                outcome.go_id = Some(go.id);
            }
        }

        if tpl.creates_shipping {
            if let Some(existing) = task.shipping_task_id {
                info!(task_id = %task.task_id, shipping_task_id = %existing, "shipping task already exists, skipping");
            } else {
                let shipping = self.create_shipping_task(task).await?;
                self.store
                    .update_task(task.id, TaskPatch::set_shipping_task_id(shipping.id))
                    .await?;
                info!(task_id = %task.task_id, shipping_task_id = %shipping.task_id, "shipping task created");
                outcome.shipping_task_id = Some(shipping.id);
            }
        }

        Ok(outcome)
    }

    async fn create_supplier_order(
        &self,
        task: &TaskRecord,
    ) -> Result<crate::domain::GuesstimateOrder, TsumugiError> {
        // 行アイテムは完了時点の注文データから取り直す。作成時のキャッシュは
        // 使わない（注文訂正が遅れて届いても反映されるように）。
        let orders = self.store.get_orders_by_ids(&task.order_ids).await?;
        let contains = aggregate_contains(&orders, catalog::resolve);

        let amount = task
            .completion_data
            .as_ref()
            .and_then(|d| d.amount)
            .unwrap_or(0.0);

        self.store
            .create_supplier_order(SupplierOrderDraft {
                event_id: task.event_id.clone(),
                order_ids: task.order_ids.clone(),
                order_amount: amount,
                contains,
                date_completed: Some(self.clock.today()),
            })
            .await
    }

    async fn create_shipping_task(&self, task: &TaskRecord) -> Result<TaskRecord, TsumugiError> {
        // 発送タスクの締切は、起点タスクの締切の少し後（固定オフセット）。
        let deadline = compute_deadline(task.deadline, SHIPPING_FOLLOW_UP.timeline_offset)?;

        self.store
            .create_task(TaskDraft {
                template_id: SHIPPING_FOLLOW_UP.id.to_string(),
                event_id: task.event_id.clone(),
                event_ids: task.event_ids.clone(),
                batch_id: None,
                task_type: SHIPPING_FOLLOW_UP.task_type,
                completion_type: SHIPPING_FOLLOW_UP.completion_type,
                timeline_offset: SHIPPING_FOLLOW_UP.timeline_offset,
                deadline,
                order_ids: task.order_ids.clone(),
                parent_task_id: Some(task.id),
            })
            .await
    }
}
