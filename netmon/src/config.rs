//! Configuration management via environment variables
//!
//! Provides helper functions for reading environment variables with fallback
//! to deprecated variable names with warning logs.

use std::time::Duration;

/// Get an environment variable with fallback to a deprecated name
///
/// If the new variable name is set, returns its value.
/// If only the old (deprecated) variable name is set, returns its value
/// and logs a deprecation warning.
///
/// # Example
/// ```
/// use netmon::config::get_env_with_fallback;
///
/// let url = get_env_with_fallback("NETMON_DATABASE_URL", "DATABASE_URL");
/// ```
pub fn get_env_with_fallback(new_name: &str, old_name: &str) -> Option<String> {
    if let Ok(val) = std::env::var(new_name) {
        return Some(val);
    }
    if let Ok(val) = std::env::var(old_name) {
        tracing::warn!(
            "Environment variable '{}' is deprecated, use '{}' instead",
            old_name,
            new_name
        );
        return Some(val);
    }
    None
}

/// Get an environment variable with fallback and default value
pub fn get_env_with_fallback_or(new_name: &str, old_name: &str, default: &str) -> String {
    get_env_with_fallback(new_name, old_name).unwrap_or_else(|| default.to_string())
}

/// Get an environment variable with fallback, parsing to a specific type
///
/// Returns `default` if neither variable is set or parsing fails.
pub fn get_env_with_fallback_parse<T: std::str::FromStr>(
    new_name: &str,
    old_name: &str,
    default: T,
) -> T {
    get_env_with_fallback(new_name, old_name)
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// デフォルトのポーリング間隔（秒）
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// デフォルトのプローブタイムアウト（秒）
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 2;

/// デフォルトの並列チェック数
pub const DEFAULT_POLL_CONCURRENCY: usize = 8;

/// デフォルトのオブザーバーキュー容量
pub const DEFAULT_OBSERVER_QUEUE_CAPACITY: usize = 8;

/// ポーリングエンジン設定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorConfig {
    /// ポーリング間隔
    pub poll_interval: Duration,
    /// 1回のプローブのタイムアウト（必ずポーリング間隔より短い）
    pub probe_timeout: Duration,
    /// 1サイクル内の最大並列チェック数
    pub concurrency: usize,
    /// オブザーバーごとのキュー容量
    pub observer_queue_capacity: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            probe_timeout: Duration::from_secs(DEFAULT_PROBE_TIMEOUT_SECS),
            concurrency: DEFAULT_POLL_CONCURRENCY,
            observer_queue_capacity: DEFAULT_OBSERVER_QUEUE_CAPACITY,
        }
    }
}

impl MonitorConfig {
    /// Load monitor configuration from environment variables.
    pub fn from_env() -> Self {
        let interval_secs = get_env_with_fallback_parse(
            "NETMON_POLL_INTERVAL_SECS",
            "POLL_INTERVAL_SECS",
            DEFAULT_POLL_INTERVAL_SECS,
        );
        let timeout_secs = get_env_with_fallback_parse(
            "NETMON_PROBE_TIMEOUT_SECS",
            "PROBE_TIMEOUT_SECS",
            DEFAULT_PROBE_TIMEOUT_SECS,
        );
        let concurrency = get_env_with_fallback_parse(
            "NETMON_POLL_CONCURRENCY",
            "POLL_CONCURRENCY",
            DEFAULT_POLL_CONCURRENCY,
        );
        let capacity = get_env_with_fallback_parse(
            "NETMON_OBSERVER_QUEUE",
            "OBSERVER_QUEUE",
            DEFAULT_OBSERVER_QUEUE_CAPACITY,
        );

        Self {
            poll_interval: Duration::from_secs(interval_secs),
            probe_timeout: Duration::from_secs(timeout_secs),
            concurrency,
            observer_queue_capacity: capacity,
        }
        .normalized()
    }

    /// 値を安全な範囲に補正する
    ///
    /// - 間隔は最低1秒
    /// - タイムアウトは間隔の半分以下（最低100ms）
    /// - 並列数・キュー容量は最低1
    pub fn normalized(mut self) -> Self {
        if self.poll_interval < Duration::from_secs(1) {
            self.poll_interval = Duration::from_secs(1);
        }
        let ceiling = self.poll_interval / 2;
        if self.probe_timeout > ceiling {
            tracing::warn!(
                probe_timeout_ms = self.probe_timeout.as_millis() as u64,
                ceiling_ms = ceiling.as_millis() as u64,
                "Probe timeout must stay well under the poll interval; clamping"
            );
            self.probe_timeout = ceiling;
        }
        if self.probe_timeout < Duration::from_millis(100) {
            self.probe_timeout = Duration::from_millis(100);
        }
        self.concurrency = self.concurrency.max(1);
        self.observer_queue_capacity = self.observer_queue_capacity.max(1);
        self
    }
}

/// HTTPサーバー設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// バインドアドレス
    pub host: String,
    /// 待ち受けポート
    pub port: u16,
    /// データベースURL
    pub database_url: String,
    /// ダッシュボードのオリジン（CORS許可対象）
    pub cors_origin: String,
}

impl ServerConfig {
    /// Load server configuration from environment variables.
    pub fn from_env() -> Self {
        let host = get_env_with_fallback_or("NETMON_HOST", "HOST", "0.0.0.0");
        let port = get_env_with_fallback_parse("NETMON_PORT", "PORT", 8082);
        Self::from_args(host, port)
    }

    /// CLI引数で上書きしたホスト・ポートから構築する
    pub fn from_args(host: String, port: u16) -> Self {
        let database_url = get_env_with_fallback("NETMON_DATABASE_URL", "DATABASE_URL")
            .unwrap_or_else(default_database_url);
        let cors_origin = get_env_with_fallback_or(
            "NETMON_CORS_ORIGIN",
            "CORS_ORIGIN",
            "http://localhost:3000",
        );
        Self {
            host,
            port,
            database_url,
            cors_origin,
        }
    }

    /// バインドアドレス文字列
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_database_url() -> String {
    match std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")) {
        Ok(home) => format!("sqlite:{}/.netmon/netmon.db", home),
        Err(_) => "sqlite:netmon.db".to_string(),
    }
}
