//! IdGenerator port - レコード ID 生成の抽象化
//!
//! レコードストア実装が新規レコードに振る ULID を生成します。
//! テスト容易性のために trait として抽象化しています。

use crate::domain::ids::{SupplierOrderRecordId, TaskRecordId};
use crate::ports::Clock;
use ulid::Ulid;

/// IdGenerator はレコードストアが発番する ID を生成
///
/// # Thread Safety
/// - `Send + Sync` を要求（複数スレッドから使える）
pub trait IdGenerator: Send + Sync {
    fn generate_task_record_id(&self) -> TaskRecordId;

    fn generate_supplier_order_record_id(&self) -> SupplierOrderRecordId;
}

/// UlidGenerator は ULID ベースの ID 生成器
///
/// Clock を使って現在時刻ベースの ULID を生成します。
/// これにより、テスト時に FixedClock を使って timestamp 部分を固定できます。
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    fn next_ulid(&self) -> Ulid {
        let timestamp_ms = self.clock.now().timestamp_millis() as u64;
        Ulid::from_parts(timestamp_ms, rand::random())
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn generate_task_record_id(&self) -> TaskRecordId {
        TaskRecordId::from(self.next_ulid())
    }

    fn generate_supplier_order_record_id(&self) -> SupplierOrderRecordId {
        SupplierOrderRecordId::from(self.next_ulid())
    }
}
