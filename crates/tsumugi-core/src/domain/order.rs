//! Orders and supplier orders.
//!
//! `Order` は EC 側の顧客注文の読み取り専用ビュー。
//! `GuesstimateOrder` はサプライヤーへの発注レコードで、タスク完了の
//! カスケードがちょうど 1 回だけ作ります。作成後は `date_completed` 以外
//! 不変です。

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{EventId, OrderId, SupplierOrderRecordId};

/// One line item on a customer order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Variant SKU ("tshirt-98", "hoodie-128", ...). カタログ解決のキー。
    pub variant: String,
    pub name: String,
    pub quantity: u32,
}

/// A customer order as read from the e-commerce source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,

    /// Owning event, if the order was placed through an event shop.
    pub event_id: Option<EventId>,

    /// Event display name (for cross-event batch views).
    pub event_name: Option<String>,

    pub purchased_at: NaiveDate,

    /// Order-level total. 集計はこれを合算する（送料・税の二重計上を避けるため、
    /// 行アイテムから再計算しない）。
    pub total: f64,

    pub items: Vec<LineItem>,
}

/// An event as held in the external store (provisioning input).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: EventId,
    pub name: String,
    pub date: NaiveDate,
}

/// One line of a supplier order ("what we ordered").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainsLine {
    pub sku: String,
    pub name: String,
    pub quantity: u32,
}

/// GuesstimateOrder - サプライヤー発注レコード。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuesstimateOrder {
    /// Store-assigned record identity.
    pub id: SupplierOrderRecordId,

    /// Human display form, store-assigned ("GO-0001").
    pub go_id: String,

    /// Owning event. None for cross-event weekly batches.
    pub event_id: Option<EventId>,

    /// The customer orders this supplier order fulfills.
    pub order_ids: Vec<OrderId>,

    pub order_amount: f64,

    pub contains: Vec<ContainsLine>,

    /// 作成後に書き換えてよい唯一のフィールド。
    pub date_completed: Option<NaiveDate>,

    pub created_at: DateTime<Utc>,
}

/// Fields for creating a supplier order (`id` / `go_id` are store-assigned).
#[derive(Debug, Clone)]
pub struct SupplierOrderDraft {
    pub event_id: Option<EventId>,
    pub order_ids: Vec<OrderId>,
    pub order_amount: f64,
    pub contains: Vec<ContainsLine>,
    pub date_completed: Option<NaiveDate>,
}
