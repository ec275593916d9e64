//! axumサーバー起動・シャットダウンハンドリング
//!
//! データベース初期化、ポーリングスケジューラーの起動、HTTPサーバーの待ち受けを
//! まとめて行う。シャットダウン時はHTTPの受け付けを止め、実行中のサイクルの
//! 完了を待ってから戻る。

use crate::common::error::MonitorError;
use crate::config::{MonitorConfig, ServerConfig};
use crate::db::migrations::initialize_database;
use crate::events::SnapshotHub;
use crate::health::{LivenessChecker, PollScheduler};
use crate::shutdown::ShutdownController;
use crate::AppState;
use std::sync::Arc;
use tracing::{error, info, warn};

/// サーバーを起動し、シャットダウンシグナルを待機する
pub async fn run(config: ServerConfig, monitor: MonitorConfig) -> Result<(), MonitorError> {
    info!("netmon v{}", env!("CARGO_PKG_VERSION"));

    let db_pool = initialize_database(&config.database_url).await?;
    info!(database_url = %config.database_url, "Device directory ready");

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| MonitorError::Config(format!("Failed to bind to {}: {}", bind_addr, e)))?;

    let hub = SnapshotHub::new(monitor.observer_queue_capacity);
    let shutdown = ShutdownController::default();

    let checker = LivenessChecker::new(monitor.probe_timeout);
    let scheduler = PollScheduler::new(
        Arc::new(db_pool.clone()),
        checker,
        hub.clone(),
        monitor.poll_interval,
    )
    .with_concurrency(monitor.concurrency);
    let scheduler_handle = scheduler.start(shutdown.clone());

    let state = AppState {
        db_pool: db_pool.clone(),
        hub: hub.clone(),
    };
    let app = crate::api::create_app(state, &config.cors_origin);

    info!("netmon server listening on {}", bind_addr);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone(), hub.clone()))
        .await;

    // サーバーがエラーで止まった場合もスケジューラーを止める
    shutdown.request_shutdown();
    hub.close_all();
    if let Err(e) = scheduler_handle.await {
        error!("Poll scheduler task failed: {}", e);
    }
    db_pool.close().await;

    served.map_err(|e| MonitorError::Internal(format!("Server error: {}", e)))?;
    info!("Server shutdown complete");
    Ok(())
}

/// シャットダウンシグナルを待機
///
/// 受信後は共有コントローラーに伝え、配信中のSSE/WebSocketを閉じる。
async fn shutdown_signal(shutdown: ShutdownController, hub: SnapshotHub) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down...");
        }
        _ = shutdown.wait() => {
            info!("Shutdown requested, shutting down...");
        }
    }

    shutdown.request_shutdown();
    // ストリーミング接続が残っているとグレースフルシャットダウンが終わらない
    hub.close_all();
}
