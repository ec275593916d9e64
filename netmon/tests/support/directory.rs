use netmon::db::migrations::initialize_database;
use netmon::events::SnapshotHub;
use netmon::AppState;
use sqlx::SqlitePool;

/// マイグレーション済みのインメモリSQLiteプール
pub async fn test_pool() -> SqlitePool {
    initialize_database("sqlite::memory:")
        .await
        .expect("Failed to initialize test database")
}

/// 管理API相当の直接INSERTでデバイスを登録する
pub async fn insert_device(
    pool: &SqlitePool,
    name: &str,
    address: &str,
    status: Option<&str>,
) -> i64 {
    sqlx::query("INSERT INTO devices (name, address, status) VALUES (?, ?, ?)")
        .bind(name)
        .bind(address)
        .bind(status)
        .execute(pool)
        .await
        .expect("Failed to insert device")
        .last_insert_rowid()
}

/// テスト用のAppState
#[allow(dead_code)]
pub fn app_state(pool: &SqlitePool, hub: &SnapshotHub) -> AppState {
    AppState {
        db_pool: pool.clone(),
        hub: hub.clone(),
    }
}

/// テスト用のCORSオリジン
#[allow(dead_code)]
pub const DASHBOARD_ORIGIN: &str = "http://localhost:3000";
