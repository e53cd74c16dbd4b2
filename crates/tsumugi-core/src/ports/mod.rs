//! Ports - 抽象化レイヤー
//!
//! このモジュールは Hexagonal Architecture の「ポート」を定義します。
//! 各 trait は外部システム（レコードストア、時刻、ID 生成）への
//! インターフェースを提供し、実装の詳細を隠蔽します。
//!
//! # 設計原則
//! - レコードストアが source of truth（正本）
//! - このエンジンはプロセス内共有可変状態を持たない
//! - すべての外部呼び出しは呼び出し側が与えるタイムアウトで上限を切る
//!   （app::timeout を参照）

pub mod clock;
pub mod id_generator;
pub mod record_store;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::record_store::{RecordStore, TaskFilter};
