//! デバイス参照API
//!
//! 読み取り専用。作成・編集・削除は外部の管理APIの責務。

use crate::common::error::MonitorError;
use crate::db;
use crate::health::aggregate;
use crate::types::device::{Device, Snapshot, StatusTransitionLogEntry};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use super::error::AppError;

/// 遷移ログのデフォルト取得件数
const DEFAULT_LOG_LIMIT: i64 = 50;

/// 遷移ログの最大取得件数
const MAX_LOG_LIMIT: i64 = 500;

/// GET /devices
pub async fn list_devices(State(state): State<AppState>) -> Result<Json<Vec<Device>>, AppError> {
    let devices = db::devices::list_devices(&state.db_pool).await?;
    Ok(Json(devices))
}

/// GET /devices/{id}
pub async fn get_device(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Device>, AppError> {
    let device = db::devices::get_device(&state.db_pool, id)
        .await?
        .ok_or(MonitorError::DeviceNotFound(id))?;
    Ok(Json(device))
}

/// 遷移ログ取得クエリ
#[derive(Debug, Default, Deserialize)]
pub struct LogQuery {
    /// 取得件数
    pub limit: Option<i64>,
}

/// GET /devices/{id}/logs
pub async fn list_device_logs(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<LogQuery>,
) -> Result<Json<Vec<StatusTransitionLogEntry>>, AppError> {
    if db::devices::get_device(&state.db_pool, id).await?.is_none() {
        return Err(MonitorError::DeviceNotFound(id).into());
    }

    let limit = query
        .limit
        .unwrap_or(DEFAULT_LOG_LIMIT)
        .clamp(1, MAX_LOG_LIMIT);
    let logs = db::status_logs::list_status_logs(&state.db_pool, id, limit).await?;
    Ok(Json(logs))
}

/// GET /live
///
/// リクエスト時点のディレクトリから集計したスナップショット（非ストリーミング）
pub async fn live_snapshot(State(state): State<AppState>) -> Result<Json<Snapshot>, AppError> {
    let devices = db::devices::list_devices(&state.db_pool).await?;
    Ok(Json(aggregate(devices)))
}
