//! tsumugi-server
//!
//! オーケストレーションエンジンの HTTP 入口。cron からの週次バッチ起動と
//! 管理者向けタスク操作を受け付けます。
//!
//! # 環境変数
//! - `TSUMUGI_BIND_ADDR`: listen アドレス（デフォルト 127.0.0.1:8080）
//! - `TSUMUGI_CRON_SECRET`: /batch-job の共有シークレット（必須）
//! - `TSUMUGI_STORE_TIMEOUT_MS`: レコードストア呼び出しの上限（デフォルト 10000）
//! - `RUST_LOG`: ログフィルタ（例: `tsumugi=debug`）

mod error;
mod routes;

use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::EnvFilter;

use tsumugi_core::app::{BatchBuilder, TaskLifecycle, TimeboxedStore, Views};
use tsumugi_core::impls::InMemoryRecordStore;
use tsumugi_core::ports::{Clock, RecordStore, SystemClock};

use crate::routes::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let bind_addr =
        std::env::var("TSUMUGI_BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
    let cron_secret = std::env::var("TSUMUGI_CRON_SECRET")
        .map_err(|_| "TSUMUGI_CRON_SECRET is not set")?;
    let store_timeout_ms: u64 = match std::env::var("TSUMUGI_STORE_TIMEOUT_MS") {
        Ok(raw) => raw
            .parse()
            .map_err(|_| format!("TSUMUGI_STORE_TIMEOUT_MS is not a number: {raw}"))?,
        Err(_) => 10_000,
    };

    // 本番ではここが外部レコードストアのアダプタに差し替わる
    let store: Arc<dyn RecordStore> = Arc::new(TimeboxedStore::new(
        InMemoryRecordStore::new(),
        Duration::from_millis(store_timeout_ms),
    ));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let state = Arc::new(AppState {
        store: store.clone(),
        lifecycle: TaskLifecycle::new(store.clone(), clock.clone()),
        batch: BatchBuilder::new(store.clone(), clock.clone()),
        views: Views::new(store, clock),
        cron_secret,
    });

    let app = routes::router(state);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(%bind_addr, store_timeout_ms, "tsumugi-server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
