//! データベース初期化とマイグレーション実行

use crate::common::error::MonitorError;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::SqlitePool;
use std::str::FromStr;

/// SQLiteデータベース接続プールを作成してマイグレーションを実行
///
/// # Arguments
/// * `database_url` - データベースURL（例: "sqlite:data/netmon.db"）
///
/// # Returns
/// * `Ok(SqlitePool)` - 初期化済みデータベースプール
/// * `Err(MonitorError)` - 初期化失敗
pub async fn initialize_database(database_url: &str) -> Result<SqlitePool, MonitorError> {
    ensure_parent_dir(database_url)?;

    let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    let pool = SqlitePool::connect_with(connect_options)
        .await
        .map_err(|e| MonitorError::Database(format!("Failed to connect to database: {}", e)))?;

    run_migrations(&pool).await?;

    Ok(pool)
}

/// マイグレーションを実行（sqlx::migrate!マクロを使用）
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), MonitorError> {
    tracing::info!("Running database migrations");

    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| MonitorError::Database(format!("Failed to run migrations: {}", e)))?;

    tracing::info!("Database migrations completed successfully");
    Ok(())
}

/// SQLiteファイルはディレクトリが存在しないと作成できないため、先に作成しておく
fn ensure_parent_dir(database_url: &str) -> Result<(), MonitorError> {
    let Some(path) = database_url.strip_prefix("sqlite:") else {
        return Ok(());
    };
    // `sqlite::memory:` のような特殊指定はスキップ
    if path.starts_with(':') {
        return Ok(());
    }

    let normalized = path.trim_start_matches("//");
    let path_without_params = normalized.split('?').next().unwrap_or(normalized);
    if let Some(parent) = std::path::Path::new(path_without_params).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                MonitorError::Config(format!(
                    "Failed to create database directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }
    Ok(())
}
