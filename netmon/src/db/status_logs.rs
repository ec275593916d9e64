//! 状態遷移ログのデータベース操作
//!
//! 追記専用。エンジンは記録した行を更新・削除しない。

use crate::types::device::StatusTransitionLogEntry;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

/// 状態遷移ログを記録
pub async fn append_status_log(
    pool: &SqlitePool,
    entry: &StatusTransitionLogEntry,
) -> Result<i64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO device_status_logs (device_id, old_status, new_status, logged_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(entry.device_id)
    .bind(entry.old_status.map(|s| s.as_str()))
    .bind(entry.new_status.as_str())
    .bind(entry.logged_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// デバイスの状態遷移ログを新しい順に取得
pub async fn list_status_logs(
    pool: &SqlitePool,
    device_id: i64,
    limit: i64,
) -> Result<Vec<StatusTransitionLogEntry>, sqlx::Error> {
    let rows = sqlx::query_as::<_, StatusLogRow>(
        r#"
        SELECT id, device_id, old_status, new_status, logged_at
        FROM device_status_logs
        WHERE device_id = ?
        ORDER BY logged_at DESC, id DESC
        LIMIT ?
        "#,
    )
    .bind(device_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().filter_map(|r| r.try_into().ok()).collect())
}

#[derive(sqlx::FromRow)]
struct StatusLogRow {
    id: i64,
    device_id: i64,
    old_status: Option<String>,
    new_status: String,
    logged_at: String,
}

impl TryFrom<StatusLogRow> for StatusTransitionLogEntry {
    type Error = crate::types::device::UnknownStatus;

    fn try_from(row: StatusLogRow) -> Result<Self, Self::Error> {
        Ok(StatusTransitionLogEntry {
            id: row.id,
            device_id: row.device_id,
            old_status: row.old_status.and_then(|s| s.parse().ok()),
            new_status: row.new_status.parse()?,
            logged_at: DateTime::parse_from_rfc3339(&row.logged_at)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        })
    }
}
