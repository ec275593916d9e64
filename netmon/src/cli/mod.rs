//! CLI module for netmon
//!
//! Provides the command-line interface for the monitor server.

pub mod probe;
pub mod serve;

use clap::{Parser, Subcommand};

/// netmon - Network device reachability monitor
#[derive(Parser, Debug)]
#[command(name = "netmon")]
#[command(version, about, long_about = None)]
#[command(after_help = r#"ENVIRONMENT VARIABLES:
    NETMON_HOST                 Bind address (default: 0.0.0.0)
    NETMON_PORT                 Listen port (default: 8082)
    NETMON_LOG_LEVEL            Log filter (default: info)
    NETMON_DATABASE_URL         Database URL (default: sqlite:~/.netmon/netmon.db)
    NETMON_CORS_ORIGIN          Dashboard origin (default: http://localhost:3000)
    NETMON_POLL_INTERVAL_SECS   Poll interval in seconds (default: 5)
    NETMON_PROBE_TIMEOUT_SECS   Per-probe timeout in seconds (default: 2)
    NETMON_POLL_CONCURRENCY     Parallel checks per cycle (default: 8)
    NETMON_OBSERVER_QUEUE       Snapshots queued per observer (default: 8)
"#)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the monitor server
    Serve(serve::ServeArgs),
    /// Check a single address once and exit
    Probe(probe::ProbeArgs),
}
