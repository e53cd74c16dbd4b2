//! Task - 締切付きの作業単位
//!
//! Task は「あるイベントに紐づく、締切のある 1 つの物理フルフィルメント作業」
//! （衣類発注・紙物発注・CD マスタ・CD プレス・発送）を表します。
//!
//! # 設計
//! - レコードの正本は外部のレコードストア。この struct はその写し。
//! - 状態遷移は TaskStatus の state machine に従い、遷移自体は
//!   app::lifecycle（＋ストアのレコード単位アトミック更新）が行う。
//! - `deadline` は派生値（event_date + timeline_offset）で、独立に書き換えない。

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::errors::TsumugiError;
use super::ids::{EventId, OrderId, SupplierOrderRecordId, TaskRecordId};
use super::state::TaskStatus;

/// Task type: which fulfillment pipeline this task belongs to.
///
/// The declaration order doubles as the urgency tie-break priority
/// (shipping first, cd_production last).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Shipping,
    ClothingOrder,
    StandardClothingOrder,
    PaperOrder,
    CdMaster,
    CdProduction,
}

impl TaskType {
    /// Tie-break priority for urgency sorting (lower sorts first).
    pub fn priority(self) -> i64 {
        match self {
            TaskType::Shipping => 0,
            TaskType::ClothingOrder => 1,
            TaskType::StandardClothingOrder => 2,
            TaskType::PaperOrder => 3,
            TaskType::CdMaster => 4,
            TaskType::CdProduction => 5,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskType::Shipping => "shipping",
            TaskType::ClothingOrder => "clothing_order",
            TaskType::StandardClothingOrder => "standard_clothing_order",
            TaskType::PaperOrder => "paper_order",
            TaskType::CdMaster => "cd_master",
            TaskType::CdProduction => "cd_production",
        }
    }

    /// Parse the wire form ("paper_order" など)。未知の値は None。
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "shipping" => Some(TaskType::Shipping),
            "clothing_order" => Some(TaskType::ClothingOrder),
            "standard_clothing_order" => Some(TaskType::StandardClothingOrder),
            "paper_order" => Some(TaskType::PaperOrder),
            "cd_master" => Some(TaskType::CdMaster),
            "cd_production" => Some(TaskType::CdProduction),
            _ => None,
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 完了に何の入力が必要かを決める型。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionType {
    /// 金額（非負）が必須。
    Monetary,
    /// confirmed=true が必須。
    Checkbox,
    /// 入力不要（メモは任意）。
    SubmitOnly,
}

/// Completion payload, stored as a JSON blob on the task record.
///
/// Wire shape: `{amount?, invoice_url?, confirmed?, notes?}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletionData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmed: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl CompletionData {
    /// completion_type が要求する形になっているか検証する。
    pub fn validate_for(&self, completion_type: CompletionType) -> Result<(), TsumugiError> {
        match completion_type {
            CompletionType::Monetary => match self.amount {
                Some(amount) if amount >= 0.0 => Ok(()),
                Some(amount) => Err(TsumugiError::validation(format!(
                    "monetary completion requires a non-negative amount, got {amount}"
                ))),
                None => Err(TsumugiError::validation(
                    "monetary completion requires an amount",
                )),
            },
            CompletionType::Checkbox => {
                if self.confirmed == Some(true) {
                    Ok(())
                } else {
                    Err(TsumugiError::validation(
                        "checkbox completion requires confirmed=true",
                    ))
                }
            }
            // submit_only: 何も要求しない（notes は任意）
            CompletionType::SubmitOnly => Ok(()),
        }
    }
}

/// A task record as held by the external store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Store-assigned record identity.
    pub id: TaskRecordId,

    /// Human display form, store-assigned ("TSK-0001").
    pub task_id: String,

    /// Which hardcoded template generated this task.
    pub template_id: String,

    /// Owning event. None only for a standard cross-event batch task,
    /// which owns `event_ids` instead.
    pub event_id: Option<EventId>,

    /// Events touched by a cross-event batch task (display purposes).
    #[serde(default)]
    pub event_ids: Vec<EventId>,

    /// Batch identity ("STD-2026-W06"), present only on standard batch tasks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<String>,

    pub task_type: TaskType,
    pub completion_type: CompletionType,

    /// Signed day offset relative to the event date (negative = before event).
    pub timeline_offset: i32,

    /// Derived: event_date + timeline_offset. Not independently mutable.
    pub deadline: NaiveDate,

    pub status: TaskStatus,

    // pending -> completed の遷移時に、まとめて一度だけ設定される。
    pub completed_at: Option<DateTime<Utc>>,
    pub completed_by: Option<String>,
    pub completion_data: Option<CompletionData>,

    /// GuesstimateOrder created by this task's completion, if any.
    /// 発注系タスク（paper/clothing/standard_clothing）は完了後ちょうど 1 つ持つ。
    pub go_id: Option<SupplierOrderRecordId>,

    /// Dependent shipping task created by this task's completion, if any.
    pub shipping_task_id: Option<TaskRecordId>,

    /// Source customer orders this task covers.
    #[serde(default)]
    pub order_ids: Vec<OrderId>,

    /// Present only on shipping tasks: the task whose completion spawned this one.
    pub parent_task_id: Option<TaskRecordId>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TaskRecord {
    /// Does this task cover the given order?
    pub fn covers_order(&self, order_id: &OrderId) -> bool {
        self.order_ids.iter().any(|id| id == order_id)
    }
}

/// Fields for creating a task (`id` / `task_id` are store-assigned).
#[derive(Debug, Clone)]
pub struct TaskDraft {
    pub template_id: String,
    pub event_id: Option<EventId>,
    pub event_ids: Vec<EventId>,
    pub batch_id: Option<String>,
    pub task_type: TaskType,
    pub completion_type: CompletionType,
    pub timeline_offset: i32,
    pub deadline: NaiveDate,
    pub order_ids: Vec<OrderId>,
    pub parent_task_id: Option<TaskRecordId>,
}

/// Partial update for a task record.
///
/// `None` のフィールドは変更なし。ストアはレコード単位でアトミックに適用する。
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub status: Option<TaskStatus>,
    pub completed_at: Option<DateTime<Utc>>,
    pub completed_by: Option<String>,
    pub completion_data: Option<CompletionData>,
    pub go_id: Option<SupplierOrderRecordId>,
    pub shipping_task_id: Option<TaskRecordId>,
    pub order_ids: Option<Vec<OrderId>>,
}

impl TaskPatch {
    /// pending -> completed の遷移一式。完了メタデータは必ずこの 1 patch で書く。
    pub fn complete(
        now: DateTime<Utc>,
        actor: impl Into<String>,
        data: CompletionData,
    ) -> Self {
        Self {
            status: Some(TaskStatus::Completed),
            completed_at: Some(now),
            completed_by: Some(actor.into()),
            completion_data: Some(data),
            ..Self::default()
        }
    }

    pub fn cancel() -> Self {
        Self {
            status: Some(TaskStatus::Cancelled),
            ..Self::default()
        }
    }

    pub fn set_go_id(go_id: SupplierOrderRecordId) -> Self {
        Self {
            go_id: Some(go_id),
            ..Self::default()
        }
    }

    pub fn set_shipping_task_id(task_id: TaskRecordId) -> Self {
        Self {
            shipping_task_id: Some(task_id),
            ..Self::default()
        }
    }
}
