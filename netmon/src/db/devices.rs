//! デバイスデータベース操作
//!
//! デバイスの作成・編集・削除は外部の管理APIが担当する。
//! ここではポーリングに必要な読み出しと、ステータス列のみの更新を提供する。

use crate::types::device::Device;
use crate::types::DeviceStatus;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

/// デバイス一覧を取得（ID順）
pub async fn list_devices(pool: &SqlitePool) -> Result<Vec<Device>, sqlx::Error> {
    let rows = sqlx::query_as::<_, DeviceRow>(
        r#"
        SELECT id, name, address, status, last_online, icon
        FROM devices
        ORDER BY id ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|r| r.into()).collect())
}

/// IDでデバイスを取得
pub async fn get_device(pool: &SqlitePool, id: i64) -> Result<Option<Device>, sqlx::Error> {
    let row = sqlx::query_as::<_, DeviceRow>(
        r#"
        SELECT id, name, address, status, last_online, icon
        FROM devices
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| r.into()))
}

/// デバイスのステータスと最終確認時刻を更新
///
/// 並行する管理操作の編集を上書きしないよう、`status`と`last_online`のみ更新する。
/// 行が既に削除されていた場合は`Ok(false)`を返す。
pub async fn update_device_status(
    pool: &SqlitePool,
    id: i64,
    status: DeviceStatus,
    last_online: DateTime<Utc>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE devices SET
            status = ?,
            last_online = ?
        WHERE id = ?
        "#,
    )
    .bind(status.as_str())
    .bind(last_online.to_rfc3339())
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

// --- Internal Row Types ---

#[derive(sqlx::FromRow)]
struct DeviceRow {
    id: i64,
    name: String,
    address: String,
    status: Option<String>,
    last_online: Option<String>,
    icon: Option<String>,
}

impl From<DeviceRow> for Device {
    fn from(row: DeviceRow) -> Self {
        Device {
            id: row.id,
            name: row.name,
            address: row.address,
            status: row.status.and_then(|s| s.parse().ok()),
            last_online: row
                .last_online
                .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
                .map(|dt| dt.with_timezone(&Utc)),
            icon: row.icon,
        }
    }
}
