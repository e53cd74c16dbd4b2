//! Event provisioning - イベント登録時のタスク一括作成
//!
//! 新しいイベントに対して、適用される雛形ごとに pending タスクを 1 つ作ります
//! （紙物発注・衣類発注・CD マスタ・CD プレス。週次バッチと発送は対象外）。
//!
//! # 排他の不変条件
//! 同じイベント・同じ type の pending タスクが既にあるなら作りません。
//! ある注文をカバーするタスクが存在する限り、同じ type・同じイベントの
//! 2 つ目の pending タスクが同じ注文をカバーすることはない、という
//! 二重フルフィルメント防止がここで始まります。

use std::sync::Arc;

use tracing::info;

use crate::catalog;
use crate::deadline::compute_deadline;
use crate::domain::{
    EventRecord, OrderId, TaskDraft, TaskRecord, TaskType, TsumugiError, provisioning_templates,
};
use crate::ports::{RecordStore, TaskFilter};

pub struct EventProvisioner {
    store: Arc<dyn RecordStore>,
}

impl EventProvisioner {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Create one pending task per applicable template for `event`.
    ///
    /// 既に同イベント・同 type の pending タスクがある雛形はスキップする。
    /// 戻り値は新しく作られたタスクのみ。
    pub async fn provision(&self, event: &EventRecord) -> Result<Vec<TaskRecord>, TsumugiError> {
        let orders = self.store.get_orders_for_event(&event.id).await?;

        let mut created = Vec::new();
        for tpl in provisioning_templates() {
            let existing = self
                .store
                .list_tasks(&TaskFilter::pending_of_type(tpl.task_type))
                .await?;
            if existing
                .iter()
                .any(|t| t.event_id.as_ref() == Some(&event.id))
            {
                continue;
            }

            // clothing_order はパーソナライズ品を含む注文をカバーする。
            // 紙物・CD の対象注文は完了時に管理者が確定する。
            let order_ids: Vec<OrderId> = if tpl.task_type == TaskType::ClothingOrder {
                orders
                    .iter()
                    .filter(|o| {
                        o.items
                            .iter()
                            .any(|i| catalog::resolve_personalized(&i.variant).is_some())
                    })
                    .map(|o| o.id.clone())
                    .collect()
            } else {
                Vec::new()
            };

            let deadline = compute_deadline(event.date, tpl.timeline_offset)?;
            let task = self
                .store
                .create_task(TaskDraft {
                    template_id: tpl.id.to_string(),
                    event_id: Some(event.id.clone()),
                    event_ids: vec![],
                    batch_id: None,
                    task_type: tpl.task_type,
                    completion_type: tpl.completion_type,
                    timeline_offset: tpl.timeline_offset,
                    deadline,
                    order_ids,
                    parent_task_id: None,
                })
                .await?;
            created.push(task);
        }

        info!(event_id = %event.id, created = created.len(), "event provisioned");
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EventId, LineItem, Order};
    use crate::impls::InMemoryRecordStore;
    use chrono::NaiveDate;

    fn event() -> EventRecord {
        EventRecord {
            id: EventId::new("evt-1"),
            name: "Sports day".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 5, 15).unwrap(),
        }
    }

    async fn provisioner(store: Arc<InMemoryRecordStore>) -> EventProvisioner {
        EventProvisioner::new(store)
    }

    #[tokio::test]
    async fn provisions_one_task_per_applicable_template() {
        let store = Arc::new(InMemoryRecordStore::new());
        let p = provisioner(store.clone()).await;

        let created = p.provision(&event()).await.unwrap();

        let types: Vec<TaskType> = created.iter().map(|t| t.task_type).collect();
        assert_eq!(created.len(), 4);
        assert!(types.contains(&TaskType::PaperOrder));
        assert!(types.contains(&TaskType::ClothingOrder));
        assert!(types.contains(&TaskType::CdMaster));
        assert!(types.contains(&TaskType::CdProduction));
        // どれもイベントに属し、締切は event_date + offset
        for task in &created {
            assert_eq!(task.event_id, Some(EventId::new("evt-1")));
            assert_eq!(
                task.deadline,
                compute_deadline(event().date, task.timeline_offset).unwrap()
            );
        }
    }

    #[tokio::test]
    async fn provisioning_twice_does_not_duplicate_pending_tasks() {
        let store = Arc::new(InMemoryRecordStore::new());
        let p = provisioner(store.clone()).await;

        let first = p.provision(&event()).await.unwrap();
        let second = p.provision(&event()).await.unwrap();

        assert_eq!(first.len(), 4);
        assert!(second.is_empty());
        assert_eq!(store.task_count().await, 4);
    }

    #[tokio::test]
    async fn clothing_task_covers_only_orders_with_personalized_items() {
        let store = Arc::new(InMemoryRecordStore::new());
        store
            .seed_order(Order {
                id: OrderId::new("O1"),
                event_id: Some(EventId::new("evt-1")),
                event_name: Some("Sports day".to_string()),
                purchased_at: NaiveDate::from_ymd_opt(2026, 4, 20).unwrap(),
                total: 49.99,
                items: vec![LineItem {
                    variant: "class-tshirt-98".to_string(),
                    name: "Class T-shirt 98".to_string(),
                    quantity: 1,
                }],
            })
            .await;
        store
            .seed_order(Order {
                id: OrderId::new("O2"),
                event_id: Some(EventId::new("evt-1")),
                event_name: Some("Sports day".to_string()),
                purchased_at: NaiveDate::from_ymd_opt(2026, 4, 21).unwrap(),
                total: 25.00,
                items: vec![LineItem {
                    // 標準品は週次バッチの領分
                    variant: "tshirt-98".to_string(),
                    name: "T-shirt 98".to_string(),
                    quantity: 1,
                }],
            })
            .await;

        let p = provisioner(store.clone()).await;
        let created = p.provision(&event()).await.unwrap();

        let clothing = created
            .iter()
            .find(|t| t.task_type == TaskType::ClothingOrder)
            .unwrap();
        assert_eq!(clothing.order_ids, vec![OrderId::new("O1")]);
    }
}
