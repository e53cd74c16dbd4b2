//! InMemoryRecordStore - 開発・テスト用のレコードストア実装
//!
//! 本番のアダプタはネットワーク越しの外部ストアを叩きますが、契約は同じです。
//! ここでは tokio::sync::Mutex で排他した 1 つの state を正本とし、
//! 外部ストアが保証する「レコード単位のアトミック write」を
//! ロック内 check-then-set で模倣します。
//!
//! # 障害注入
//! `fail_once(op)` で次の 1 回だけ指定操作を Upstream エラーにできます。
//! カスケード途中クラッシュ（タスクは completed、GO は未作成）の再現と、
//! 修復パスの検証に使います。

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::Mutex;

use crate::domain::{
    EventId, EventRecord, GuesstimateOrder, Order, OrderId, SupplierOrderDraft,
    SupplierOrderRecordId, TaskDraft, TaskPatch, TaskRecord, TaskRecordId, TaskStatus,
    TsumugiError, template,
};
use crate::ports::{Clock, IdGenerator, RecordStore, SystemClock, TaskFilter, UlidGenerator};

struct StoreState {
    orders: Vec<Order>,
    events: HashMap<EventId, EventRecord>,
    tasks: HashMap<TaskRecordId, TaskRecord>,
    supplier_orders: HashMap<SupplierOrderRecordId, GuesstimateOrder>,

    /// 表示 ID 用の連番（"TSK-0001" / "GO-0001"）。
    next_task_seq: u32,
    next_go_seq: u32,

    /// 次の 1 回だけ失敗させる操作名の集合。
    fail_once: HashSet<&'static str>,
}

impl StoreState {
    fn new() -> Self {
        Self {
            orders: Vec::new(),
            events: HashMap::new(),
            tasks: HashMap::new(),
            supplier_orders: HashMap::new(),
            next_task_seq: 1,
            next_go_seq: 1,
            fail_once: HashSet::new(),
        }
    }

    fn allocate_task_display_id(&mut self) -> String {
        let id = format!("TSK-{:04}", self.next_task_seq);
        self.next_task_seq += 1;
        id
    }

    fn allocate_go_display_id(&mut self) -> String {
        let id = format!("GO-{:04}", self.next_go_seq);
        self.next_go_seq += 1;
        id
    }

    fn check_injected_failure(&mut self, op: &'static str) -> Result<(), TsumugiError> {
        if self.fail_once.remove(op) {
            return Err(TsumugiError::upstream(op, "injected failure"));
        }
        Ok(())
    }
}

/// 開発・テスト用の in-memory ストア。
pub struct InMemoryRecordStore {
    state: Arc<Mutex<StoreState>>,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Arc::new(Mutex::new(StoreState::new())),
            ids: Arc::new(UlidGenerator::new(SystemClock)),
            clock,
        }
    }

    /// Seed a customer order (dev/test data).
    pub async fn seed_order(&self, order: Order) {
        let mut state = self.state.lock().await;
        state.orders.push(order);
    }

    /// Seed an event record (dev/test data).
    pub async fn seed_event(&self, event: EventRecord) {
        let mut state = self.state.lock().await;
        state.events.insert(event.id.clone(), event);
    }

    pub async fn get_event(&self, id: &EventId) -> Option<EventRecord> {
        let state = self.state.lock().await;
        state.events.get(id).cloned()
    }

    /// 次の 1 回だけ `op` を Upstream エラーにする（障害注入）。
    pub async fn fail_once(&self, op: &'static str) {
        let mut state = self.state.lock().await;
        state.fail_once.insert(op);
    }

    pub async fn supplier_order_count(&self) -> usize {
        let state = self.state.lock().await;
        state.supplier_orders.len()
    }

    pub async fn task_count(&self) -> usize {
        let state = self.state.lock().await;
        state.tasks.len()
    }
}

impl Default for InMemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

fn matches_filter(task: &TaskRecord, filter: &TaskFilter) -> bool {
    if let Some(status) = filter.status
        && task.status != status
    {
        return false;
    }
    if let Some(task_type) = filter.task_type
        && task.task_type != task_type
    {
        return false;
    }
    if let Some(search) = &filter.search {
        let needle = search.to_lowercase();
        let name = template(&task.template_id).map(|t| t.name).unwrap_or("");
        let hit = task.task_id.to_lowercase().contains(&needle)
            || name.to_lowercase().contains(&needle)
            || task
                .batch_id
                .as_deref()
                .is_some_and(|b| b.to_lowercase().contains(&needle));
        if !hit {
            return false;
        }
    }
    true
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn get_orders_in_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Order>, TsumugiError> {
        let mut state = self.state.lock().await;
        state.check_injected_failure("get_orders_in_date_range")?;
        Ok(state
            .orders
            .iter()
            .filter(|o| o.purchased_at >= start && o.purchased_at <= end)
            .cloned()
            .collect())
    }

    async fn get_orders_for_event(&self, event_id: &EventId) -> Result<Vec<Order>, TsumugiError> {
        let mut state = self.state.lock().await;
        state.check_injected_failure("get_orders_for_event")?;
        Ok(state
            .orders
            .iter()
            .filter(|o| o.event_id.as_ref() == Some(event_id))
            .cloned()
            .collect())
    }

    async fn get_orders_by_ids(&self, ids: &[OrderId]) -> Result<Vec<Order>, TsumugiError> {
        let mut state = self.state.lock().await;
        state.check_injected_failure("get_orders_by_ids")?;
        Ok(state
            .orders
            .iter()
            .filter(|o| ids.contains(&o.id))
            .cloned()
            .collect())
    }

    async fn get_task(&self, id: TaskRecordId) -> Result<Option<TaskRecord>, TsumugiError> {
        let mut state = self.state.lock().await;
        state.check_injected_failure("get_task")?;
        Ok(state.tasks.get(&id).cloned())
    }

    async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<TaskRecord>, TsumugiError> {
        let mut state = self.state.lock().await;
        state.check_injected_failure("list_tasks")?;
        let mut tasks: Vec<TaskRecord> = state
            .tasks
            .values()
            .filter(|t| matches_filter(t, filter))
            .cloned()
            .collect();
        // 表示 ID 順で安定化（HashMap の順序に依存しない）
        tasks.sort_by(|a, b| a.task_id.cmp(&b.task_id));
        Ok(tasks)
    }

    async fn create_task(&self, draft: TaskDraft) -> Result<TaskRecord, TsumugiError> {
        let mut state = self.state.lock().await;
        state.check_injected_failure("create_task")?;

        let now = self.clock.now();
        let task = TaskRecord {
            id: self.ids.generate_task_record_id(),
            task_id: state.allocate_task_display_id(),
            template_id: draft.template_id,
            event_id: draft.event_id,
            event_ids: draft.event_ids,
            batch_id: draft.batch_id,
            task_type: draft.task_type,
            completion_type: draft.completion_type,
            timeline_offset: draft.timeline_offset,
            deadline: draft.deadline,
            status: TaskStatus::Pending,
            completed_at: None,
            completed_by: None,
            completion_data: None,
            go_id: None,
            shipping_task_id: None,
            order_ids: draft.order_ids,
            parent_task_id: draft.parent_task_id,
            created_at: now,
            updated_at: now,
        };
        state.tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn update_task(
        &self,
        id: TaskRecordId,
        patch: TaskPatch,
    ) -> Result<TaskRecord, TsumugiError> {
        let mut state = self.state.lock().await;
        state.check_injected_failure("update_task")?;

        let now = self.clock.now();
        let Some(task) = state.tasks.get_mut(&id) else {
            return Err(TsumugiError::not_found(format!("task {id}")));
        };

        // レコード単位の check-then-set: 不正なステータス遷移はここで直列に拒否する。
        if let Some(next) = patch.status
            && !task.status.can_transition_to(next)
        {
            return Err(TsumugiError::invalid_state(format!(
                "task {} is {}, cannot transition to {}",
                task.task_id,
                task.status.as_str(),
                next.as_str()
            )));
        }

        if let Some(status) = patch.status {
            task.status = status;
        }
        if let Some(completed_at) = patch.completed_at {
            task.completed_at = Some(completed_at);
        }
        if let Some(completed_by) = patch.completed_by {
            task.completed_by = Some(completed_by);
        }
        if let Some(completion_data) = patch.completion_data {
            task.completion_data = Some(completion_data);
        }
        if let Some(go_id) = patch.go_id {
            task.go_id = Some(go_id);
        }
        if let Some(shipping_task_id) = patch.shipping_task_id {
            task.shipping_task_id = Some(shipping_task_id);
        }
        if let Some(order_ids) = patch.order_ids {
            task.order_ids = order_ids;
        }
        task.updated_at = now;

        Ok(task.clone())
    }

    async fn find_tasks_by_batch_id(
        &self,
        batch_id: &str,
    ) -> Result<Vec<TaskRecord>, TsumugiError> {
        let mut state = self.state.lock().await;
        state.check_injected_failure("find_tasks_by_batch_id")?;
        Ok(state
            .tasks
            .values()
            .filter(|t| t.batch_id.as_deref() == Some(batch_id))
            .cloned()
            .collect())
    }

    async fn create_supplier_order(
        &self,
        draft: SupplierOrderDraft,
    ) -> Result<GuesstimateOrder, TsumugiError> {
        let mut state = self.state.lock().await;
        state.check_injected_failure("create_supplier_order")?;

        let go = GuesstimateOrder {
            id: self.ids.generate_supplier_order_record_id(),
            go_id: state.allocate_go_display_id(),
            event_id: draft.event_id,
            order_ids: draft.order_ids,
            order_amount: draft.order_amount,
            contains: draft.contains,
            date_completed: draft.date_completed,
            created_at: self.clock.now(),
        };
        state.supplier_orders.insert(go.id, go.clone());
        Ok(go)
    }

    async fn get_supplier_order(
        &self,
        id: SupplierOrderRecordId,
    ) -> Result<Option<GuesstimateOrder>, TsumugiError> {
        let mut state = self.state.lock().await;
        state.check_injected_failure("get_supplier_order")?;
        Ok(state.supplier_orders.get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CompletionType, TaskType};

    fn draft() -> TaskDraft {
        TaskDraft {
            template_id: "paper-order".to_string(),
            event_id: Some(EventId::new("evt-1")),
            event_ids: vec![],
            batch_id: None,
            task_type: TaskType::PaperOrder,
            completion_type: CompletionType::Monetary,
            timeline_offset: -14,
            deadline: NaiveDate::from_ymd_opt(2026, 5, 1).unwrap(),
            order_ids: vec![],
            parent_task_id: None,
        }
    }

    #[tokio::test]
    async fn created_tasks_start_pending_with_sequential_display_ids() {
        let store = InMemoryRecordStore::new();

        let t1 = store.create_task(draft()).await.unwrap();
        let t2 = store.create_task(draft()).await.unwrap();

        assert_eq!(t1.status, TaskStatus::Pending);
        assert_eq!(t1.task_id, "TSK-0001");
        assert_eq!(t2.task_id, "TSK-0002");
        assert_ne!(t1.id, t2.id);
    }

    #[tokio::test]
    async fn terminal_status_writes_are_rejected() {
        let store = InMemoryRecordStore::new();
        let task = store.create_task(draft()).await.unwrap();

        store
            .update_task(task.id, TaskPatch::cancel())
            .await
            .unwrap();

        // cancelled からはどこへも遷移できない
        let err = store
            .update_task(
                task.id,
                TaskPatch {
                    status: Some(TaskStatus::Completed),
                    ..TaskPatch::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, TsumugiError::InvalidState(_)));

        // レコードは変わっていない
        let unchanged = store.get_task(task.id).await.unwrap().unwrap();
        assert_eq!(unchanged.status, TaskStatus::Cancelled);
    }

    #[tokio::test]
    async fn non_status_patches_do_not_require_a_transition() {
        let store = InMemoryRecordStore::new();
        let task = store.create_task(draft()).await.unwrap();

        let patched = store
            .update_task(
                task.id,
                TaskPatch {
                    order_ids: Some(vec![OrderId::new("O1")]),
                    ..TaskPatch::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(patched.order_ids, vec![OrderId::new("O1")]);
        assert_eq!(patched.status, TaskStatus::Pending);
    }

    #[tokio::test]
    async fn date_range_query_is_inclusive() {
        let store = InMemoryRecordStore::new();
        for (id, day) in [("O1", 2), ("O2", 8), ("O3", 9)] {
            store
                .seed_order(Order {
                    id: OrderId::new(id),
                    event_id: None,
                    event_name: None,
                    purchased_at: NaiveDate::from_ymd_opt(2026, 2, day).unwrap(),
                    total: 10.0,
                    items: vec![],
                })
                .await;
        }

        let orders = store
            .get_orders_in_date_range(
                NaiveDate::from_ymd_opt(2026, 2, 2).unwrap(),
                NaiveDate::from_ymd_opt(2026, 2, 8).unwrap(),
            )
            .await
            .unwrap();

        let ids: Vec<&str> = orders.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&"O1"));
        assert!(ids.contains(&"O2"));
    }

    #[tokio::test]
    async fn fail_once_fails_exactly_once() {
        let store = InMemoryRecordStore::new();
        store.fail_once("create_supplier_order").await;

        let d = SupplierOrderDraft {
            event_id: None,
            order_ids: vec![],
            order_amount: 0.0,
            contains: vec![],
            date_completed: None,
        };

        let err = store.create_supplier_order(d.clone()).await.unwrap_err();
        assert!(matches!(err, TsumugiError::Upstream { .. }));

        // 2 回目は成功する
        let go = store.create_supplier_order(d).await.unwrap();
        assert_eq!(go.go_id, "GO-0001");
    }
}
