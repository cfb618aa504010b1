use std::{net::SocketAddr, path::PathBuf, time::Duration};

use clap::Parser;

pub const SQLITE_CONNECTION_STRING: &str = "sqlite://ping_history.db?mode=rwc";

/// Configure the history database, the monitored sites and the probe limits
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Postgres Db Connection String
    #[arg(short, long, env, default_value = None)]
    pub pg: Option<String>,

    /// Sqlite Db Connection String, used when no Postgres string is given
    #[arg(short, long, env, default_value = SQLITE_CONNECTION_STRING)]
    pub sqlite: String,

    /// JSON file holding the list of monitored sites
    #[arg(long, env, default_value = "sites.json")]
    pub sites: PathBuf,

    /// Address the HTTP server binds to
    #[arg(short, long, env, default_value = "127.0.0.1:3000")]
    pub listen: SocketAddr,

    /// Upper bound on a single probe, in milliseconds
    #[arg(long, env, default_value_t = 5000)]
    pub probe_timeout_ms: u64,

    /// Successful probes at or above this latency count as slow
    #[arg(long, env, default_value_t = 1000)]
    pub slow_threshold_ms: u64,
}

impl Args {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn slow_threshold(&self) -> Duration {
        Duration::from_millis(self.slow_threshold_ms)
    }

    /// The Postgres string, if one was given and is not blank.
    pub fn postgres_url(&self) -> Option<&str> {
        self.pg.as_deref().map(str::trim).filter(|pg| !pg.is_empty())
    }
}
