//! Network device monitor
//!
//! デバイスの到達性を定期的に確認し、状態遷移を記録し、
//! 集計スナップショットをSSE/WebSocketで配信するサーバー

#![warn(missing_docs)]

/// 共通エラー型
pub mod common;

/// REST / push APIハンドラー
pub mod api;

/// 監視エンジン（チェッカー・レコーダー・集計・スケジューラー）
pub mod health;

/// データベースアクセス（デバイスディレクトリ）
pub mod db;

/// ロギング初期化ユーティリティ
pub mod logging;

/// 設定管理（環境変数ヘルパー）
pub mod config;

/// CLIインターフェース
pub mod cli;

/// スナップショット配信ハブ
pub mod events;

/// 型定義
pub mod types;

/// Shutdown controller
pub mod shutdown;

/// サーバー起動・シャットダウン
pub mod server;

/// アプリケーション状態
#[derive(Clone)]
pub struct AppState {
    /// データベース接続プール（デバイスディレクトリ）
    pub db_pool: sqlx::SqlitePool,
    /// スナップショット配信ハブ
    pub hub: events::SnapshotHub,
}
