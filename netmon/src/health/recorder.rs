//! 状態遷移レコーダー
//!
//! 前回ステータスと新しいステータスを比較し、変化があれば監査ログを1件残す。

use crate::db::DeviceDirectory;
use crate::types::device::{DeviceStatus, StatusTransitionLogEntry};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{error, info};

/// 状態遷移レコーダー
#[derive(Clone)]
pub struct TransitionRecorder {
    directory: Arc<dyn DeviceDirectory>,
}

impl TransitionRecorder {
    /// 新しいレコーダーを作成
    pub fn new(directory: Arc<dyn DeviceDirectory>) -> Self {
        Self { directory }
    }

    /// ステータス変化を記録する
    ///
    /// 変化が無ければ何もしない。監査ログの書き込み失敗はログに残すだけで
    /// 呼び出し元には伝播しない。監査ログを書き込めた場合のみ`true`を返す。
    pub async fn record(
        &self,
        device_id: i64,
        previous: Option<DeviceStatus>,
        new_status: DeviceStatus,
        now: DateTime<Utc>,
    ) -> bool {
        if previous == Some(new_status) {
            return false;
        }

        let entry = StatusTransitionLogEntry {
            id: 0,
            device_id,
            old_status: previous,
            new_status,
            logged_at: now,
        };

        match self.directory.append_transition_log(&entry).await {
            Ok(_) => {
                info!(
                    device_id = device_id,
                    old_status = previous.map(|s| s.as_str()).unwrap_or("unknown"),
                    new_status = new_status.as_str(),
                    "Device status changed"
                );
                true
            }
            Err(e) => {
                error!(
                    device_id = device_id,
                    new_status = new_status.as_str(),
                    error = %e,
                    "Failed to write status transition log"
                );
                false
            }
        }
    }
}
