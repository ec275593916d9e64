//! probe サブコマンド
//!
//! サーバーと同じチェッカーで1つのアドレスを1回だけ確認する。

use crate::health::{Liveness, LivenessChecker};
use clap::Args;
use std::time::Duration;

/// 到達不能時の終了コード
pub const EXIT_UNREACHABLE: i32 = 2;

/// probe サブコマンドの引数
#[derive(Args, Debug, Clone)]
pub struct ProbeArgs {
    /// Device address (`http...` URL or host/IP)
    pub address: String,

    /// Probe timeout in seconds
    #[arg(long, default_value_t = crate::config::DEFAULT_PROBE_TIMEOUT_SECS)]
    pub timeout_secs: u64,
}

/// プローブを実行し、結果を表示して終了コードを返す
pub async fn execute(args: &ProbeArgs) -> i32 {
    let checker = LivenessChecker::new(Duration::from_secs(args.timeout_secs.max(1)));
    let liveness = checker.check(&args.address).await;
    println!("{}", describe(&args.address, &liveness));
    exit_code(&liveness)
}

fn describe(address: &str, liveness: &Liveness) -> String {
    match liveness {
        Liveness::Reachable => format!("{}: online", address),
        Liveness::Unreachable { reason } => format!("{}: offline ({})", address, reason),
    }
}

fn exit_code(liveness: &Liveness) -> i32 {
    if liveness.is_reachable() {
        0
    } else {
        EXIT_UNREACHABLE
    }
}
