use std::path::PathBuf;

use clap::Parser;
use gateway_core::GatewayConfig;

/// Gateway server flags, layered over the `GATEWAY_*`/`WORKSPACE_ROOT`
/// environment defaults from `GatewayConfig::from_env`.
#[derive(Parser, Debug, Default, Clone)]
#[command(name = "gateway-server", version, about = "Sandboxed execution gateway")]
pub struct ServerCli {
    /// Port to bind the HTTP server to.
    #[arg(long)]
    pub port: Option<u16>,

    /// Workspace root to confine filesystem and command access to.
    #[arg(long = "workspace-root", value_name = "DIR")]
    pub workspace_root: Option<PathBuf>,

    /// Additional comma-separated blocked glob patterns, layered on top of
    /// the defaults rather than replacing them.
    #[arg(long = "blocked-patterns", value_delimiter = ',')]
    pub extra_blocked_patterns: Vec<String>,

    /// Path to the tree index SQLite database.
    #[arg(long = "index-db-path", value_name = "FILE")]
    pub index_db_path: Option<PathBuf>,
}

impl ServerCli {
    /// Merges CLI flags over the environment-derived config, giving
    /// precedence to whatever was explicitly passed on the command line.
    pub fn apply_overrides(&self, mut config: GatewayConfig) -> GatewayConfig {
        if let Some(root) = &self.workspace_root {
            config.workspace_root = root.clone();
        }
        if !self.extra_blocked_patterns.is_empty() {
            config.blocked_patterns.extend(self.extra_blocked_patterns.iter().cloned());
        }
        if let Some(path) = &self.index_db_path {
            config.index_db_path = path.clone();
        }
        config
    }
}
