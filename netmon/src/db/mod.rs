//! データベースアクセス層
//!
//! SQLiteベースのデバイスディレクトリ

/// デバイス管理
pub mod devices;

/// 状態遷移ログ
pub mod status_logs;

/// データベースマイグレーション
pub mod migrations;

/// Repository traitパターン（テスタビリティ向上）
pub mod traits;

pub use traits::DeviceDirectory;
