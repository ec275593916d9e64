//! ロギング初期化ユーティリティ

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// デフォルトのログフィルタ
pub const DEFAULT_LOG_FILTER: &str = "info";

/// ログフィルタ文字列を解決する
///
/// `NETMON_LOG_LEVEL`（旧: `LOG_LEVEL`）、次に`RUST_LOG`、どちらも無ければ`info`。
pub fn resolve_filter() -> String {
    crate::config::get_env_with_fallback("NETMON_LOG_LEVEL", "LOG_LEVEL")
        .or_else(|| std::env::var("RUST_LOG").ok())
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string())
}

/// グローバルなtracingサブスクライバーを初期化する
///
/// 二重初期化（テストなど）はエラーにせず無視する。
pub fn init() {
    let filter = EnvFilter::try_new(resolve_filter())
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init();
}
