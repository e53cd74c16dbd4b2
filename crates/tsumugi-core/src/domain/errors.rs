//! Errors - エラー型と分類
//!
//! # 分類
//! - Validation: 入力の形・値が不正（HTTP 400）
//! - NotFound: task/order/batch が見つからない（HTTP 404）
//! - InvalidState: 許可されない状態遷移（完了済みタスクの再完了など、HTTP 400）
//! - Upstream: レコードストア呼び出しの失敗。失敗した操作名を必ず含める（HTTP 500）
//!
//! 認証エラー（401/403）はこのエンジンの上の HTTP 層で扱うため、ここには現れません。
//!
//! Aggregator / Deadline Calculator は「空入力・ゼロ集計」をエラーにしません。
//! "今週は注文なし"（スキップ）と "ストア到達不能"（失敗）を呼び出し側が
//! 区別できることが、この分類の狙いです。

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TsumugiError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("record store call failed: op={op}: {message}")]
    Upstream { op: &'static str, message: String },
}

impl TsumugiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    /// レコードストア呼び出しの失敗。`op` は失敗した操作名。
    pub fn upstream(op: &'static str, message: impl Into<String>) -> Self {
        Self::Upstream {
            op,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_message_names_the_failing_operation() {
        let err = TsumugiError::upstream("create_supplier_order", "connection reset");
        let msg = err.to_string();
        assert!(msg.contains("create_supplier_order"));
        assert!(msg.contains("connection reset"));
    }
}
