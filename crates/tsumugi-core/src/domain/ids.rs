//! Domain identifiers (strongly-typed IDs).
//!
//! # レコード ID とソース ID の二層構成
//! エンジンが自分で発番するレコード（Task, GuesstimateOrder）は
//! ULID (Universally Unique Lexicographically Sortable Identifier) ベースの
//! `Id<T>` を使います。Phantom type パターンにより、TaskRecordId と
//! SupplierOrderRecordId はコンパイル時に混同できません。
//!
//! 一方、EC 側・イベント台帳側が発番する ID（Order, Event）は
//! 外部システムの不透明な文字列をそのまま newtype で包みます。
//! エンジンはこれらの形式に依存しません。
//!
//! なお人間向けの表示 ID（"TSK-0001" や "GO-0001"）はレコードストアが
//! 採番する連番で、ここで定義するレコード ID とは別物です。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use ulid::Ulid;

/// IdMarker は各 ID 型のマーカー trait
///
/// Display で使うプレフィックス（"tsk-", "go-"）を提供します。
pub trait IdMarker: Send + Sync + 'static {
    /// Display で使うプレフィックス（例: "tsk-"）
    fn prefix() -> &'static str;
}

/// ジェネリック ID 型
///
/// `T` は PhantomData で、実行時にはメモリを消費しませんが、
/// コンパイル時に型安全性を提供します。
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id<T: IdMarker> {
    ulid: Ulid,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    /// ULID から Id を作成
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self {
            ulid,
            _marker: PhantomData,
        }
    }

    /// 内部の ULID を取得
    pub fn as_ulid(&self) -> Ulid {
        self.ulid
    }
}

impl<T: IdMarker> From<Ulid> for Id<T> {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", T::prefix(), self.ulid)
    }
}

// ========================================
// マーカー型の定義
// ========================================

/// Task レコードのマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaskRec {}

impl IdMarker for TaskRec {
    fn prefix() -> &'static str {
        "tsk-"
    }
}

/// GuesstimateOrder レコードのマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SupplierOrderRec {}

impl IdMarker for SupplierOrderRec {
    fn prefix() -> &'static str {
        "go-"
    }
}

/// Identifier of a Task record (store-assigned).
pub type TaskRecordId = Id<TaskRec>;

/// Identifier of a GuesstimateOrder record (store-assigned).
pub type SupplierOrderRecordId = Id<SupplierOrderRec>;

// ========================================
// 外部システム由来の ID（不透明文字列）
// ========================================

/// Identifier of a customer order in the e-commerce source system.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl OrderId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier of an event record in the external store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub String);

impl EventId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
