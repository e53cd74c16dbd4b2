//! App - アプリケーション層
//!
//! このモジュールは、ports を組み合わせてオーケストレーションの
//! ユースケースを実装します。
//!
//! # 主要コンポーネント
//! - **TaskLifecycle**: pending→completed/cancelled 遷移と修復パス
//! - **CascadeService**: 完了が生む下流レコード（GO・発送タスク）の冪等な作成
//! - **BatchBuilder**: 標準衣類の週次クロスイベントバッチ
//! - **EventProvisioner**: イベント登録時の雛形別タスク作成
//! - **Views**: 緊急度付きタスク一覧と再計算集計ビュー
//! - **TimeboxedStore**: 外部呼び出しの時間上限

pub mod batch;
pub mod cascade;
pub mod lifecycle;
pub mod provision;
pub mod timeout;
pub mod views;

pub use self::batch::{
    BatchBuilder, BatchRunOutcome, StandardClothingBatch, WeekRange, batch_id_for, week_range,
};
pub use self::cascade::{CascadeOutcome, CascadeService};
pub use self::lifecycle::{CompletionOutcome, TaskLifecycle};
pub use self::provision::EventProvisioner;
pub use self::timeout::TimeboxedStore;
pub use self::views::{ClothingOrderEvent, TaskView, Views};
