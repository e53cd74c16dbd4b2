//! tsumugi-core
//!
//! 学校行事まわりの物理フルフィルメント（衣類・紙物・CD・発送）を、
//! イベント日程に沿った締切付きタスクへ編成するオーケストレーションエンジン。
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, state, task, template, order, errors）
//! - **deadline**: 締切・緊急度の純関数
//! - **catalog / aggregate**: 品番カタログと注文集計の純関数
//! - **ports**: 抽象化レイヤー（RecordStore, Clock, IdGenerator）
//! - **app**: アプリケーションロジック（lifecycle, cascade, batch, provision, views, timeout）
//! - **impls**: 実装（InMemoryRecordStore など開発用）
//!
//! 正本はネットワーク越しの外部レコードストアにあり、このエンジンは
//! レコード単位アトミックな CRUD 契約の上で動きます。複数レコードに
//! 跨るトランザクションは仮定せず、部分失敗は冪等な修復パスで回復します。

pub mod aggregate;
pub mod app;
pub mod catalog;
pub mod deadline;
pub mod domain;
pub mod impls;
pub mod ports;
