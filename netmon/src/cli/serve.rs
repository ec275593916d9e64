//! serve サブコマンド
//!
//! 監視サーバーを起動します。

use clap::Args;

/// serve サブコマンドの引数
#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Listen port
    #[arg(short, long, default_value = "8082", env = "NETMON_PORT")]
    pub port: u16,

    /// Bind address
    #[arg(short = 'H', long, default_value = "0.0.0.0", env = "NETMON_HOST")]
    pub host: String,
}
