//! 到達性チェッカー
//!
//! デバイスのアドレスから到達可能かどうかを判定する。
//! `http`で始まるアドレスはHTTP GET、それ以外はICMPエコー（ping）で確認する。
//!
//! 到達不能は想定内の結果であり、エラーとして呼び出し元に伝播しない。

use async_trait::async_trait;
use reqwest::Client;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// プローブ結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Liveness {
    /// 到達可能
    Reachable,
    /// 到達不能（診断用の理由付き）
    Unreachable {
        /// 失敗理由
        reason: String,
    },
}

impl Liveness {
    /// 到達不能の結果を作成
    pub fn unreachable(reason: impl Into<String>) -> Self {
        Liveness::Unreachable {
            reason: reason.into(),
        }
    }

    /// 到達可能か
    pub fn is_reachable(&self) -> bool {
        matches!(self, Liveness::Reachable)
    }
}

/// アドレス種別
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressKind<'a> {
    /// URL（HTTP GETで確認）
    Url(&'a str),
    /// ホスト名またはIPアドレス（pingで確認）
    Host(&'a str),
}

impl<'a> AddressKind<'a> {
    /// アドレス文字列を分類する
    ///
    /// 空文字列や空白を含むアドレスはプローブできないため`Err`で理由を返す。
    pub fn classify(address: &'a str) -> Result<Self, String> {
        let trimmed = address.trim();
        if trimmed.is_empty() {
            return Err("address is empty".to_string());
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(format!("address contains whitespace: {:?}", trimmed));
        }
        if trimmed.starts_with("http") {
            Ok(AddressKind::Url(trimmed))
        } else if trimmed.starts_with('-') {
            Err(format!("address looks like a command flag: {}", trimmed))
        } else {
            Ok(AddressKind::Host(trimmed))
        }
    }
}

/// 単一アドレスに対するプローブ戦略
#[async_trait]
pub trait Probe: Send + Sync {
    /// ターゲットに1回だけプローブを送る
    async fn probe(&self, target: &str) -> Liveness;
}

/// HTTP GETによるプローブ
///
/// 2xxのレスポンスのみ到達可能とみなす。
#[derive(Clone)]
pub struct HttpProbe {
    client: Client,
    timeout: Duration,
}

impl HttpProbe {
    /// タイムアウト付きのHTTPプローブを作成
    pub fn new(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Failed to build probe HTTP client, using defaults");
                Client::new()
            });
        Self { client, timeout }
    }
}

#[async_trait]
impl Probe for HttpProbe {
    async fn probe(&self, target: &str) -> Liveness {
        let request = self.client.get(target).send();
        match tokio::time::timeout(self.timeout, request).await {
            Ok(Ok(response)) if response.status().is_success() => Liveness::Reachable,
            Ok(Ok(response)) => Liveness::unreachable(format!("HTTP {}", response.status())),
            Ok(Err(e)) => Liveness::unreachable(e.to_string()),
            Err(_) => Liveness::unreachable(format!(
                "timed out after {}ms",
                self.timeout.as_millis()
            )),
        }
    }
}

/// ICMPエコー（システムの`ping`コマンド）によるプローブ
#[derive(Debug, Clone)]
pub struct EchoProbe {
    program: String,
    timeout: Duration,
}

impl EchoProbe {
    /// システムの`ping`を使うプローブを作成
    pub fn new(timeout: Duration) -> Self {
        Self::with_program("ping", timeout)
    }

    /// 実行ファイルを指定してプローブを作成
    pub fn with_program(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    fn command(&self, target: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        if cfg!(windows) {
            let millis = self.timeout.as_millis().max(1).to_string();
            cmd.args(["-n", "1", "-w", millis.as_str(), target]);
        } else {
            // -Wの単位はLinuxとBSD系で異なるため、待ち時間はtimeoutで制限する
            cmd.args(["-c", "1", target]);
        }
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl Probe for EchoProbe {
    async fn probe(&self, target: &str) -> Liveness {
        let mut cmd = self.command(target);
        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => return Liveness::unreachable(format!("failed to spawn {}: {}", self.program, e)),
        };

        // タイムアウト時は`child`がdropされ、kill_on_dropでプロセスが終了する
        match tokio::time::timeout(self.timeout, child.wait()).await {
            Ok(Ok(status)) if status.success() => Liveness::Reachable,
            Ok(Ok(status)) => Liveness::unreachable(format!("echo probe exited with {}", status)),
            Ok(Err(e)) => Liveness::unreachable(e.to_string()),
            Err(_) => Liveness::unreachable(format!(
                "timed out after {}ms",
                self.timeout.as_millis()
            )),
        }
    }
}

/// 到達性チェッカー
///
/// アドレス種別ごとのプローブ戦略に振り分ける。
#[derive(Clone)]
pub struct LivenessChecker {
    url_probe: Arc<dyn Probe>,
    host_probe: Arc<dyn Probe>,
}

impl LivenessChecker {
    /// HTTPプローブとpingプローブを使う標準のチェッカーを作成
    pub fn new(timeout: Duration) -> Self {
        Self::with_probes(
            Arc::new(HttpProbe::new(timeout)),
            Arc::new(EchoProbe::new(timeout)),
        )
    }

    /// プローブ戦略を差し替えてチェッカーを作成
    pub fn with_probes(url_probe: Arc<dyn Probe>, host_probe: Arc<dyn Probe>) -> Self {
        Self {
            url_probe,
            host_probe,
        }
    }

    /// アドレスの到達性を判定する
    pub async fn check(&self, address: &str) -> Liveness {
        let liveness = match AddressKind::classify(address) {
            Ok(AddressKind::Url(url)) => self.url_probe.probe(url).await,
            Ok(AddressKind::Host(host)) => self.host_probe.probe(host).await,
            Err(reason) => Liveness::unreachable(reason),
        };

        if let Liveness::Unreachable { reason } = &liveness {
            debug!(address = %address, reason = %reason, "Device unreachable");
        }
        liveness
    }
}
