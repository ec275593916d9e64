//! Repository traitパターン定義
//!
//! ポーリングエンジンが利用するデバイスディレクトリを抽象化する。
//! 本番実装は`SqlitePool`、テストではインメモリのモックを使う。

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::types::device::{Device, DeviceStatus, StatusTransitionLogEntry};

/// デバイスディレクトリ
///
/// すべての操作は一時的なI/Oエラーで失敗し得る。エンジンはこれを
/// デバイス単位の非致命的な失敗として扱う。
#[async_trait]
pub trait DeviceDirectory: Send + Sync {
    /// デバイス一覧を取得
    async fn list_devices(&self) -> Result<Vec<Device>, sqlx::Error>;
    /// IDでデバイスを取得
    async fn get_device(&self, id: i64) -> Result<Option<Device>, sqlx::Error>;
    /// ステータスと最終確認時刻を更新（行が無ければ`Ok(false)`）
    async fn update_device_status(
        &self,
        id: i64,
        status: DeviceStatus,
        last_contact: DateTime<Utc>,
    ) -> Result<bool, sqlx::Error>;
    /// 状態遷移ログを追記
    async fn append_transition_log(
        &self,
        entry: &StatusTransitionLogEntry,
    ) -> Result<i64, sqlx::Error>;
}

#[async_trait]
impl DeviceDirectory for sqlx::SqlitePool {
    async fn list_devices(&self) -> Result<Vec<Device>, sqlx::Error> {
        super::devices::list_devices(self).await
    }

    async fn get_device(&self, id: i64) -> Result<Option<Device>, sqlx::Error> {
        super::devices::get_device(self, id).await
    }

    async fn update_device_status(
        &self,
        id: i64,
        status: DeviceStatus,
        last_contact: DateTime<Utc>,
    ) -> Result<bool, sqlx::Error> {
        super::devices::update_device_status(self, id, status, last_contact).await
    }

    async fn append_transition_log(
        &self,
        entry: &StatusTransitionLogEntry,
    ) -> Result<i64, sqlx::Error> {
        super::status_logs::append_status_log(self, entry).await
    }
}
