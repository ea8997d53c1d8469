use std::path::PathBuf;
use std::time::Duration;

/// Runtime configuration for the gateway, mirroring the env-var table in
/// spec.md §6. Loaded from the environment by the caller (the server binary
/// loads `.env` via `dotenvy` first, then layers CLI flags on top).
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub workspace_root: PathBuf,
    pub blocked_patterns: Vec<String>,
    pub default_timeout: Duration,
    pub max_timeout: Duration,
    pub max_file_size_bytes: u64,
    pub max_output_lines: usize,
    pub index_db_path: PathBuf,
    pub index_debounce_ms: u64,
    pub approval_ttl_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            workspace_root: PathBuf::from("/workspace"),
            blocked_patterns: default_blocked_patterns(),
            default_timeout: Duration::from_secs(30),
            max_timeout: Duration::from_secs(300),
            max_file_size_bytes: 10 * 1024 * 1024,
            max_output_lines: 10_000,
            index_db_path: PathBuf::from("/tmp/gateway/tree_index.db"),
            index_debounce_ms: 500,
            approval_ttl_secs: 300,
        }
    }
}

fn default_blocked_patterns() -> Vec<String> {
    vec![
        "*.env".to_string(),
        "*.key".to_string(),
        "*.pem".to_string(),
        "id_rsa".to_string(),
        ".git/config".to_string(),
        "**/secrets/**".to_string(),
    ]
}

impl GatewayConfig {
    /// Reads the `GATEWAY_*` environment variables, falling back to
    /// defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            workspace_root: std::env::var("WORKSPACE_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.workspace_root),
            blocked_patterns: std::env::var("BLOCKED_PATTERNS")
                .ok()
                .map(|raw| raw.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(defaults.blocked_patterns),
            default_timeout: std::env::var("DEFAULT_TIMEOUT")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.default_timeout),
            max_timeout: std::env::var("MAX_TIMEOUT")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.max_timeout),
            max_file_size_bytes: std::env::var("MAX_FILE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_file_size_bytes),
            max_output_lines: std::env::var("MAX_OUTPUT_LINES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_output_lines),
            index_db_path: std::env::var("INDEX_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.index_db_path),
            index_debounce_ms: std::env::var("INDEX_DEBOUNCE_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.index_debounce_ms),
            approval_ttl_secs: std::env::var("APPROVAL_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.approval_ttl_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_table() {
        let cfg = GatewayConfig::default();
        assert_eq!(cfg.workspace_root, PathBuf::from("/workspace"));
        assert_eq!(cfg.default_timeout, Duration::from_secs(30));
        assert_eq!(cfg.max_timeout, Duration::from_secs(300));
        assert_eq!(cfg.blocked_patterns.len(), 6);
        assert!(cfg.blocked_patterns.contains(&"id_rsa".to_string()));
    }
}
