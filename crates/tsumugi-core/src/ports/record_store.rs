//! RecordStore port - 外部レコードストアへの薄いインターフェース
//!
//! Task / Order / Event / GuesstimateOrder の正本はネットワーク越しの
//! 外部ストアにあります。このエンジンは CRUD の小さな契約だけに依存し、
//! フィールド ID の解決などストア固有の事情はアダプタ実装の内側に隔離します。
//!
//! # 前提（トランザクションモデル）
//! - 各 write はレコード単位でアトミック。複数レコードに跨るトランザクションは
//!   仮定しない（だからカスケードは冪等ガードで守る）。
//! - `update_task` はステータス遷移の check-then-set をストア側で直列化する:
//!   terminal（completed/cancelled）からの遷移、および pending 以外からの
//!   completed 遷移は InvalidState で拒否しなければならない。
//!   2 人の管理者が同じタスクを二重に完了できないのはこの拒否による。

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::{
    EventId, GuesstimateOrder, Order, OrderId, SupplierOrderDraft, TaskDraft, TaskPatch,
    TaskRecord, TaskRecordId, TaskStatus, TaskType, TsumugiError,
};

/// Filter for listing tasks.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub task_type: Option<TaskType>,
    /// Substring match over task_id, template name and batch_id.
    pub search: Option<String>,
}

impl TaskFilter {
    pub fn pending_of_type(task_type: TaskType) -> Self {
        Self {
            status: Some(TaskStatus::Pending),
            task_type: Some(task_type),
            search: None,
        }
    }
}

/// The record-store contract consumed by every component of the engine.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Orders whose purchase date falls within `[start, end]` (inclusive).
    async fn get_orders_in_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Order>, TsumugiError>;

    async fn get_orders_for_event(&self, event_id: &EventId) -> Result<Vec<Order>, TsumugiError>;

    /// Fetch specific orders by id. カスケードが完了時点の注文データから
    /// 行アイテムを取り直すために使う（作成時のキャッシュを使わない）。
    async fn get_orders_by_ids(&self, ids: &[OrderId]) -> Result<Vec<Order>, TsumugiError>;

    async fn get_task(&self, id: TaskRecordId) -> Result<Option<TaskRecord>, TsumugiError>;

    async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<TaskRecord>, TsumugiError>;

    async fn create_task(&self, draft: TaskDraft) -> Result<TaskRecord, TsumugiError>;

    /// Apply a partial update atomically to one task record.
    ///
    /// 不正なステータス遷移は `InvalidState` で拒否する（上記前提を参照）。
    async fn update_task(
        &self,
        id: TaskRecordId,
        patch: TaskPatch,
    ) -> Result<TaskRecord, TsumugiError>;

    async fn find_tasks_by_batch_id(
        &self,
        batch_id: &str,
    ) -> Result<Vec<TaskRecord>, TsumugiError>;

    async fn create_supplier_order(
        &self,
        draft: SupplierOrderDraft,
    ) -> Result<GuesstimateOrder, TsumugiError>;

    async fn get_supplier_order(
        &self,
        id: crate::domain::SupplierOrderRecordId,
    ) -> Result<Option<GuesstimateOrder>, TsumugiError>;
}
