//! HTTP error mapping.
//!
//! コアのエラー分類をそのまま HTTP ステータスへ写します。呼び出し側
//! （UI・cron）は kind で分岐できます（"already completed" とネットワーク
//! 障害をリトライ判断で区別するため）。
//!
//! - Validation -> 400
//! - InvalidState -> 400
//! - NotFound -> 404
//! - Upstream -> 500
//! - 認証失敗（cron secret / admin）-> 401

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use tsumugi_core::domain::TsumugiError;

#[derive(Debug)]
pub enum ApiError {
    Core(TsumugiError),
    Unauthorized,
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "missing or invalid secret".to_string(),
            ),
            ApiError::Core(err) => {
                let (status, kind) = match &err {
                    TsumugiError::Validation(_) => (StatusCode::BAD_REQUEST, "validation"),
                    TsumugiError::InvalidState(_) => (StatusCode::BAD_REQUEST, "invalid_state"),
                    TsumugiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
                    TsumugiError::Upstream { .. } => {
                        (StatusCode::INTERNAL_SERVER_ERROR, "upstream")
                    }
                };
                (status, kind, err.to_string())
            }
        };

        (status, Json(ErrorBody { error: kind, message })).into_response()
    }
}

impl From<TsumugiError> for ApiError {
    fn from(err: TsumugiError) -> Self {
        ApiError::Core(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kinds_map_to_status_codes() {
        let cases = [
            (
                ApiError::Core(TsumugiError::validation("bad")),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::Core(TsumugiError::invalid_state("done")),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::Core(TsumugiError::not_found("task")),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::Core(TsumugiError::upstream("get_task", "boom")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (ApiError::Unauthorized, StatusCode::UNAUTHORIZED),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
