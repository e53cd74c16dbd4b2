//! TimeboxedStore - 外部呼び出しの時間上限
//!
//! どの操作も無期限にブロックしてはいけません。RecordStore をデコレートし、
//! 呼び出しごとに同じタイムアウトを適用します。時間切れは「結果不明」として
//! 失敗した操作名付きの Upstream エラーになります。
//!
//! 結果不明の write は実際には成功していたかもしれません。だからこそ
//! 修復パス（app::lifecycle::repair_cascade）は再実行しても安全な、
//! 冪等ガード前提の設計になっています。リトライ回数では守りません。

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::{
    EventId, GuesstimateOrder, Order, OrderId, SupplierOrderDraft, SupplierOrderRecordId,
    TaskDraft, TaskPatch, TaskRecord, TaskRecordId, TsumugiError,
};
use crate::ports::{RecordStore, TaskFilter};

/// RecordStore decorator: every call is bounded by `budget`.
pub struct TimeboxedStore<S> {
    inner: S,
    budget: Duration,
}

impl<S> TimeboxedStore<S> {
    pub fn new(inner: S, budget: Duration) -> Self {
        Self { inner, budget }
    }
}

async fn bounded<T>(
    op: &'static str,
    budget: Duration,
    fut: impl Future<Output = Result<T, TsumugiError>>,
) -> Result<T, TsumugiError> {
    match tokio::time::timeout(budget, fut).await {
        Ok(result) => result,
        Err(_) => Err(TsumugiError::upstream(op, "timed out (outcome unknown)")),
    }
}

#[async_trait]
impl<S: RecordStore> RecordStore for TimeboxedStore<S> {
    async fn get_orders_in_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Order>, TsumugiError> {
        bounded(
            "get_orders_in_date_range",
            self.budget,
            self.inner.get_orders_in_date_range(start, end),
        )
        .await
    }

    async fn get_orders_for_event(&self, event_id: &EventId) -> Result<Vec<Order>, TsumugiError> {
        bounded(
            "get_orders_for_event",
            self.budget,
            self.inner.get_orders_for_event(event_id),
        )
        .await
    }

    async fn get_orders_by_ids(&self, ids: &[OrderId]) -> Result<Vec<Order>, TsumugiError> {
        bounded(
            "get_orders_by_ids",
            self.budget,
            self.inner.get_orders_by_ids(ids),
        )
        .await
    }

    async fn get_task(&self, id: TaskRecordId) -> Result<Option<TaskRecord>, TsumugiError> {
        bounded("get_task", self.budget, self.inner.get_task(id)).await
    }

    async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<TaskRecord>, TsumugiError> {
        bounded("list_tasks", self.budget, self.inner.list_tasks(filter)).await
    }

    async fn create_task(&self, draft: TaskDraft) -> Result<TaskRecord, TsumugiError> {
        bounded("create_task", self.budget, self.inner.create_task(draft)).await
    }

    async fn update_task(
        &self,
        id: TaskRecordId,
        patch: TaskPatch,
    ) -> Result<TaskRecord, TsumugiError> {
        bounded(
            "update_task",
            self.budget,
            self.inner.update_task(id, patch),
        )
        .await
    }

    async fn find_tasks_by_batch_id(
        &self,
        batch_id: &str,
    ) -> Result<Vec<TaskRecord>, TsumugiError> {
        bounded(
            "find_tasks_by_batch_id",
            self.budget,
            self.inner.find_tasks_by_batch_id(batch_id),
        )
        .await
    }

    async fn create_supplier_order(
        &self,
        draft: SupplierOrderDraft,
    ) -> Result<GuesstimateOrder, TsumugiError> {
        bounded(
            "create_supplier_order",
            self.budget,
            self.inner.create_supplier_order(draft),
        )
        .await
    }

    async fn get_supplier_order(
        &self,
        id: SupplierOrderRecordId,
    ) -> Result<Option<GuesstimateOrder>, TsumugiError> {
        bounded(
            "get_supplier_order",
            self.budget,
            self.inner.get_supplier_order(id),
        )
        .await
    }
}
