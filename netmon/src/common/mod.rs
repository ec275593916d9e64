//! 共通モジュール

/// エラー型
pub mod error;
