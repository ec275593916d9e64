//! デバイス型定義
//!
//! 監視対象デバイス・状態遷移ログ・集約スナップショット

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// デバイスの稼働状態
///
/// プローブ後の状態は必ずこの2値のいずれか。未プローブのデバイスは
/// `Device::status` が `None` になる。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DeviceStatus {
    /// 到達可能
    Online,
    /// 到達不能
    Offline,
}

impl DeviceStatus {
    /// DeviceStatusを文字列に変換
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
        }
    }

    /// 到達可否からステータスを決定
    pub fn from_reachable(reachable: bool) -> Self {
        if reachable {
            Self::Online
        } else {
            Self::Offline
        }
    }
}

/// 不明なステータス文字列
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown device status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for DeviceStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "online" => Ok(Self::Online),
            "offline" => Ok(Self::Offline),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

impl std::fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 監視対象デバイス
///
/// 永続化はディレクトリ側が所有し、エンジンは1サイクル分のコピーのみ保持する。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Device {
    /// デバイスID
    pub id: i64,
    /// 表示名
    pub name: String,
    /// アドレス（`http`で始まればURL、それ以外はホスト/IP）
    pub address: String,
    /// 現在の状態（未プローブは`None`）
    pub status: Option<DeviceStatus>,
    /// 最終確認時刻
    pub last_online: Option<DateTime<Utc>>,
    /// アイコン等の任意メタデータ（エンジンは解釈しない）
    #[serde(default)]
    pub icon: Option<String>,
}

impl Device {
    /// 未プローブのデバイスを作成
    pub fn new(id: i64, name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            address: address.into(),
            status: None,
            last_online: None,
            icon: None,
        }
    }

    /// オンラインかどうか
    pub fn is_online(&self) -> bool {
        self.status == Some(DeviceStatus::Online)
    }
}

/// 状態遷移ログエントリ
///
/// 遷移検出時に一度だけ作成され、以後変更・削除されない（監査専用）。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusTransitionLogEntry {
    /// DBで自動採番（未保存は0）
    pub id: i64,
    /// 対象デバイスID
    pub device_id: i64,
    /// 旧ステータス（未プローブからの遷移は`None`）
    pub old_status: Option<DeviceStatus>,
    /// 新ステータス
    pub new_status: DeviceStatus,
    /// 検出時刻
    pub logged_at: DateTime<Utc>,
}

/// 集約スナップショット
///
/// 毎サイクル全件から再計算され、次のスナップショットで置き換えられる。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    /// 総デバイス数
    pub total: usize,
    /// オンライン数
    pub online: usize,
    /// オフライン数（未プローブを含む）
    pub offline: usize,
    /// 読み出し時点のデバイス一覧
    pub devices: Vec<Device>,
}
