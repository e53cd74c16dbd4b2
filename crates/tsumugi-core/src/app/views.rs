//! Read views - 集計ビューと緊急度付きタスク一覧
//!
//! ここのビューは永続化しません。読むたびにレコードストアから再計算します
//! （プロセス寿命のキャッシュ変数は持たない。必要になったら無効化規則を
//! 持つ明示的なキャッシュを注入する）。

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::aggregate::{OrderAggregate, aggregate};
use crate::catalog;
use crate::deadline::compute_urgency;
use crate::domain::{
    EventId, TaskRecord, TaskStatus, TaskType, TsumugiError, template,
};
use crate::ports::{Clock, RecordStore, TaskFilter};

use super::batch::{StandardClothingBatch, week_range_of_batch_id};

/// One task in a list response, with computed urgency fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskView {
    #[serde(flatten)]
    pub task: TaskRecord,
    pub name: String,
    pub days_until_due: i64,
    pub is_overdue: bool,
    pub urgency_score: i64,
}

/// Per-event pending clothing aggregate (recomputed on read).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClothingOrderEvent {
    pub event_id: EventId,
    #[serde(flatten)]
    pub aggregate: OrderAggregate,
    pub order_day: NaiveDate,
    pub days_until_order_day: i64,
    pub is_overdue: bool,
}

pub struct Views {
    store: Arc<dyn RecordStore>,
    clock: Arc<dyn Clock>,
}

impl Views {
    pub fn new(store: Arc<dyn RecordStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// List tasks with computed urgency, sorted most urgent first.
    pub async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<TaskView>, TsumugiError> {
        let now = self.clock.now();
        let tasks = self.store.list_tasks(filter).await?;

        let mut views: Vec<TaskView> = tasks
            .into_iter()
            .map(|task| {
                let urgency = compute_urgency(task.deadline, now, task.status, task.task_type);
                let name = template(&task.template_id)
                    .map(|t| t.name.to_string())
                    .unwrap_or_else(|| task.template_id.clone());
                TaskView {
                    name,
                    days_until_due: urgency.days_until_due,
                    is_overdue: urgency.is_overdue,
                    urgency_score: urgency.urgency_score,
                    task,
                }
            })
            .collect();

        views.sort_by_key(|v| v.urgency_score);
        Ok(views)
    }

    /// Pending weekly batches, each recomputed from its task's order set.
    pub async fn pending_standard_batches(
        &self,
    ) -> Result<Vec<StandardClothingBatch>, TsumugiError> {
        let tasks = self
            .store
            .list_tasks(&TaskFilter::pending_of_type(TaskType::StandardClothingOrder))
            .await?;

        let mut batches = Vec::with_capacity(tasks.len());
        for task in tasks {
            let Some(batch_id) = task.batch_id.clone() else {
                continue;
            };
            let Some(range) = week_range_of_batch_id(&batch_id) else {
                continue;
            };
            let orders = self.store.get_orders_by_ids(&task.order_ids).await?;
            let agg = aggregate(&orders, catalog::resolve_standard);

            let mut event_names: Vec<String> = orders
                .iter()
                .filter_map(|o| o.event_name.clone())
                .collect();
            event_names.sort();
            event_names.dedup();

            batches.push(StandardClothingBatch {
                batch_id,
                week_start: range.start,
                week_end: range.end,
                aggregate: agg,
                event_record_ids: task.event_ids.clone(),
                event_names,
            });
        }
        Ok(batches)
    }

    /// Per-event pending clothing aggregate.
    ///
    /// 集計対象は、イベントの pending な clothing_order タスクがカバーする注文。
    pub async fn clothing_order_event(
        &self,
        event_id: &EventId,
    ) -> Result<ClothingOrderEvent, TsumugiError> {
        let tasks = self
            .store
            .list_tasks(&TaskFilter::pending_of_type(TaskType::ClothingOrder))
            .await?;
        let task = tasks
            .into_iter()
            .find(|t| t.event_id.as_ref() == Some(event_id))
            .ok_or_else(|| {
                TsumugiError::not_found(format!(
                    "no pending clothing order task for event {event_id}"
                ))
            })?;

        let orders = self.store.get_orders_by_ids(&task.order_ids).await?;
        let agg = aggregate(&orders, catalog::resolve_personalized);
        let urgency = compute_urgency(task.deadline, self.clock.now(), task.status, task.task_type);

        Ok(ClothingOrderEvent {
            event_id: event_id.clone(),
            aggregate: agg,
            order_day: task.deadline,
            days_until_order_day: urgency.days_until_due,
            is_overdue: urgency.is_overdue,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::batch::{BatchBuilder, BatchRunOutcome};
    use crate::domain::{CompletionType, LineItem, Order, OrderId, TaskDraft};
    use crate::impls::InMemoryRecordStore;
    use crate::ports::FixedClock;
    use chrono::{TimeZone, Utc};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn clock_at(y: i32, m: u32, d: u32) -> Arc<dyn Clock> {
        Arc::new(FixedClock::new(Utc.with_ymd_and_hms(y, m, d, 6, 0, 0).unwrap()))
    }

    async fn seed_task(
        store: &InMemoryRecordStore,
        template_id: &str,
        task_type: TaskType,
        deadline: NaiveDate,
    ) -> TaskRecord {
        store
            .create_task(TaskDraft {
                template_id: template_id.to_string(),
                event_id: Some(EventId::new("evt-1")),
                event_ids: vec![],
                batch_id: None,
                task_type,
                completion_type: CompletionType::Monetary,
                timeline_offset: 0,
                deadline,
                order_ids: vec![],
                parent_task_id: None,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn tasks_are_sorted_most_urgent_first() {
        let store = Arc::new(InMemoryRecordStore::new());
        let clock = clock_at(2026, 5, 10);

        // 締切の遠い順に作る
        seed_task(&store, "paper-order", TaskType::PaperOrder, date(2026, 5, 20)).await;
        seed_task(&store, "clothing-order", TaskType::ClothingOrder, date(2026, 5, 8)).await;
        seed_task(&store, "cd-master", TaskType::CdMaster, date(2026, 5, 12)).await;

        let views = Views::new(store, clock);
        let list = views.list_tasks(&TaskFilter::default()).await.unwrap();

        let deadlines: Vec<NaiveDate> = list.iter().map(|v| v.task.deadline).collect();
        assert_eq!(
            deadlines,
            vec![date(2026, 5, 8), date(2026, 5, 12), date(2026, 5, 20)]
        );
        assert!(list[0].is_overdue);
        assert!(!list[1].is_overdue);
    }

    #[tokio::test]
    async fn same_deadline_sorts_by_type_priority() {
        let store = Arc::new(InMemoryRecordStore::new());
        let clock = clock_at(2026, 5, 10);

        seed_task(&store, "cd-production", TaskType::CdProduction, date(2026, 5, 12)).await;
        seed_task(&store, "shipping-follow-up", TaskType::Shipping, date(2026, 5, 12)).await;

        let views = Views::new(store, clock);
        let list = views.list_tasks(&TaskFilter::default()).await.unwrap();

        assert_eq!(list[0].task.task_type, TaskType::Shipping);
        assert_eq!(list[1].task.task_type, TaskType::CdProduction);
    }

    #[tokio::test]
    async fn pending_standard_batches_recompute_from_the_store() {
        let store = Arc::new(InMemoryRecordStore::new());
        store
            .seed_order(Order {
                id: OrderId::new("O1"),
                event_id: Some(EventId::new("evt-1")),
                event_name: Some("Sports day".to_string()),
                purchased_at: date(2026, 2, 3),
                total: 49.99,
                items: vec![LineItem {
                    variant: "tshirt-98".to_string(),
                    name: "T-shirt 98".to_string(),
                    quantity: 1,
                }],
            })
            .await;

        let clock = clock_at(2026, 2, 9);
        let builder = BatchBuilder::new(store.clone(), clock.clone());
        let BatchRunOutcome::Created { .. } = builder.run(false).await.unwrap() else {
            panic!("expected Created");
        };

        let views = Views::new(store, clock);
        let batches = views.pending_standard_batches().await.unwrap();

        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].batch_id, "STD-2026-W06");
        assert_eq!(batches[0].week_start, date(2026, 2, 2));
        assert_eq!(batches[0].week_end, date(2026, 2, 8));
        assert_eq!(batches[0].aggregate.total_orders, 1);
        assert_eq!(batches[0].event_names, vec!["Sports day".to_string()]);
    }

    #[tokio::test]
    async fn clothing_order_event_view_uses_the_pending_task() {
        let store = Arc::new(InMemoryRecordStore::new());
        store
            .seed_order(Order {
                id: OrderId::new("O1"),
                event_id: Some(EventId::new("evt-1")),
                event_name: Some("Sports day".to_string()),
                purchased_at: date(2026, 4, 20),
                total: 49.99,
                items: vec![LineItem {
                    variant: "class-tshirt-98".to_string(),
                    name: "Class T-shirt 98".to_string(),
                    quantity: 2,
                }],
            })
            .await;

        let task = store
            .create_task(TaskDraft {
                template_id: "clothing-order".to_string(),
                event_id: Some(EventId::new("evt-1")),
                event_ids: vec![],
                batch_id: None,
                task_type: TaskType::ClothingOrder,
                completion_type: CompletionType::Monetary,
                timeline_offset: -10,
                deadline: date(2026, 5, 5),
                order_ids: vec![OrderId::new("O1")],
                parent_task_id: None,
            })
            .await
            .unwrap();
        assert_eq!(task.status, TaskStatus::Pending);

        let views = Views::new(store, clock_at(2026, 5, 1));
        let view = views
            .clothing_order_event(&EventId::new("evt-1"))
            .await
            .unwrap();

        assert_eq!(view.aggregate.total_orders, 1);
        assert_eq!(view.aggregate.aggregated_items["class_tshirts"]["98/104"], 2);
        assert_eq!(view.order_day, date(2026, 5, 5));
        assert_eq!(view.days_until_order_day, 4);
        assert!(!view.is_overdue);
    }

    #[tokio::test]
    async fn clothing_order_event_without_pending_task_is_not_found() {
        let store = Arc::new(InMemoryRecordStore::new());
        let views = Views::new(store, clock_at(2026, 5, 1));
        let err = views
            .clothing_order_event(&EventId::new("evt-none"))
            .await
            .unwrap_err();
        assert!(matches!(err, TsumugiError::NotFound(_)));
    }
}
