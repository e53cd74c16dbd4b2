//! Domain model (IDs, tasks, templates, orders, errors).

pub mod errors;
pub mod ids;
pub mod order;
pub mod state;
pub mod task;
pub mod template;

pub use self::errors::TsumugiError;
pub use self::ids::{EventId, OrderId, SupplierOrderRecordId, TaskRecordId};
pub use self::order::{
    ContainsLine, EventRecord, GuesstimateOrder, LineItem, Order, SupplierOrderDraft,
};
pub use self::state::TaskStatus;
pub use self::task::{CompletionData, CompletionType, TaskDraft, TaskPatch, TaskRecord, TaskType};
pub use self::template::{
    SHIPPING_FOLLOW_UP_OFFSET_DAYS, TaskTemplate, provisioning_templates, template,
};
