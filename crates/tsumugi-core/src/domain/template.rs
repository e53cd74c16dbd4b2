//! Task templates - ハードコードされたタスク雛形
//!
//! 各イベントに対してどんな作業タスクを作るか（名前・完了タイプ・
//! タイムラインオフセット・カスケードで何を生むか）は固定の雛形表で決まります。
//!
//! - イベント提供時（provisioning）: `provisioning_templates()` の各雛形から
//!   pending タスクを 1 つずつ作る。
//! - 週次バッチ: Batch Builder が `STANDARD_CLOTHING_BATCH` から作る。
//! - 発送タスク: Cascade Service が `SHIPPING_FOLLOW_UP` から作る。

use super::task::{CompletionType, TaskType};

/// 雛形の締切に対する発送フォローアップの固定オフセット（日）。
pub const SHIPPING_FOLLOW_UP_OFFSET_DAYS: i64 = 3;

/// A hardcoded task template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskTemplate {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub task_type: TaskType,
    pub completion_type: CompletionType,
    /// Signed day offset relative to the event date (negative = before event).
    pub timeline_offset: i32,
    /// 完了時に GuesstimateOrder を 1 つ作るか。
    pub creates_supplier_order: bool,
    /// 完了時に依存する発送タスクを作るか。
    pub creates_shipping: bool,
}

pub const PAPER_ORDER: TaskTemplate = TaskTemplate {
    id: "paper-order",
    name: "Paper goods order",
    description: "Place the paper goods order with the print supplier.",
    task_type: TaskType::PaperOrder,
    completion_type: CompletionType::Monetary,
    timeline_offset: -14,
    creates_supplier_order: true,
    creates_shipping: true,
};

pub const CLOTHING_ORDER: TaskTemplate = TaskTemplate {
    id: "clothing-order",
    name: "Clothing order",
    description: "Place the personalized clothing order for this event.",
    task_type: TaskType::ClothingOrder,
    completion_type: CompletionType::Monetary,
    timeline_offset: -10,
    creates_supplier_order: true,
    creates_shipping: true,
};

pub const STANDARD_CLOTHING_BATCH: TaskTemplate = TaskTemplate {
    id: "standard-clothing-batch",
    name: "Standard clothing weekly batch",
    description: "Place the weekly cross-event order for standard (non-personalized) clothing.",
    task_type: TaskType::StandardClothingOrder,
    completion_type: CompletionType::Monetary,
    // バッチの基準日は対象週の日曜（week_end）。締切はその数日後。
    timeline_offset: 3,
    creates_supplier_order: true,
    creates_shipping: true,
};

pub const CD_MASTER: TaskTemplate = TaskTemplate {
    id: "cd-master",
    name: "CD master hand-off",
    description: "Deliver the approved CD master to the pressing plant.",
    task_type: TaskType::CdMaster,
    completion_type: CompletionType::SubmitOnly,
    timeline_offset: -21,
    creates_supplier_order: false,
    creates_shipping: false,
};

pub const CD_PRODUCTION: TaskTemplate = TaskTemplate {
    id: "cd-production",
    name: "CD production",
    description: "Confirm the pressed CDs came back from the plant.",
    task_type: TaskType::CdProduction,
    completion_type: CompletionType::Checkbox,
    timeline_offset: -7,
    creates_supplier_order: false,
    creates_shipping: true,
};

pub const SHIPPING_FOLLOW_UP: TaskTemplate = TaskTemplate {
    id: "shipping-follow-up",
    name: "Shipping follow-up",
    description: "Ship the received goods to the school.",
    task_type: TaskType::Shipping,
    completion_type: CompletionType::Checkbox,
    timeline_offset: SHIPPING_FOLLOW_UP_OFFSET_DAYS as i32,
    creates_supplier_order: false,
    creates_shipping: false,
};

const ALL: &[TaskTemplate] = &[
    PAPER_ORDER,
    CLOTHING_ORDER,
    STANDARD_CLOTHING_BATCH,
    CD_MASTER,
    CD_PRODUCTION,
    SHIPPING_FOLLOW_UP,
];

/// Look up a template by id.
pub fn template(id: &str) -> Option<&'static TaskTemplate> {
    ALL.iter().find(|t| t.id == id)
}

/// Templates instantiated per event at provisioning time.
///
/// Standard batch tasks（週次・クロスイベント）と発送タスク（カスケード産）
/// は含まない。
pub fn provisioning_templates() -> impl Iterator<Item = &'static TaskTemplate> {
    ALL.iter().filter(|t| {
        !matches!(
            t.task_type,
            TaskType::StandardClothingOrder | TaskType::Shipping
        )
    })
}
