//! エラー型定義
//!
//! 統一エラー型（thiserror使用）
//!
//! プローブ失敗はエラーではなく`Liveness::Unreachable`として扱うため、
//! ここに現れるのはディレクトリ・設定・HTTPクライアント構築などの失敗のみ。

use axum::http::StatusCode;
use thiserror::Error;

/// netmon error type
#[derive(Debug, Error)]
pub enum MonitorError {
    /// Device not found in the directory
    #[error("Device not found: {0}")]
    DeviceNotFound(i64),

    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// HTTP client error
    #[error("HTTP client error: {0}")]
    Http(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for MonitorError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<reqwest::Error> for MonitorError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.to_string())
    }
}

impl MonitorError {
    /// Returns a safe error message for external clients.
    ///
    /// Full error details (including SQL and addresses) are kept for server logs
    /// via the `Display` implementation.
    pub fn external_message(&self) -> &'static str {
        match self {
            Self::DeviceNotFound(_) => "Device not found",
            Self::Database(_) => "Database error",
            Self::Http(_) => "Backend service unavailable",
            Self::Config(_) => "Configuration error",
            Self::Internal(_) => "Internal server error",
        }
    }

    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::DeviceNotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Http(_) => StatusCode::BAD_GATEWAY,
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
