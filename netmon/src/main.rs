//! netmon server entry point

use clap::Parser;
use netmon::cli::{Cli, Commands};
use netmon::config::{MonitorConfig, ServerConfig};
use netmon::logging;
use tracing::error;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init();

    match cli.command {
        Some(Commands::Probe(args)) => {
            let code = netmon::cli::probe::execute(&args).await;
            std::process::exit(code);
        }
        Some(Commands::Serve(args)) => {
            let cfg = ServerConfig::from_args(args.host, args.port);
            serve(cfg).await;
        }
        None => {
            // No subcommand - default to serve
            serve(ServerConfig::from_env()).await;
        }
    }
}

async fn serve(config: ServerConfig) {
    if let Err(e) = netmon::server::run(config, MonitorConfig::from_env()).await {
        error!("netmon server failed: {}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
