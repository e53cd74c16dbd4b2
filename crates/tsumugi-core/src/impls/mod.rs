//! 実装（InMemoryRecordStore など開発用）

pub mod memory;

pub use self::memory::InMemoryRecordStore;
