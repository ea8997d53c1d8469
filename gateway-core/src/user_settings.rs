use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Mutex;

use serde::Deserialize;
use serde::Serialize;

/// Per-user gateway overrides, grounded on
/// `services/gateway_user_settings.py`'s `GatewayUserSettings` model.
/// Stored as an opaque JSON blob per `user_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayUserSettings {
    #[serde(default)]
    pub workspace_paths: Vec<String>,
    #[serde(default)]
    pub default_workspace: Option<String>,
    #[serde(default)]
    pub auto_approve_commands: Vec<String>,
    #[serde(default)]
    pub auto_approve_dirs: Vec<String>,
    #[serde(default)]
    pub blocked_paths: Vec<String>,
    #[serde(default)]
    pub network_enabled: bool,
    #[serde(default = "default_max_timeout")]
    pub max_timeout: u64,
}

fn default_max_timeout() -> u64 {
    300
}

impl Default for GatewayUserSettings {
    fn default() -> Self {
        Self {
            workspace_paths: Vec::new(),
            default_workspace: None,
            auto_approve_commands: Vec::new(),
            auto_approve_dirs: Vec::new(),
            blocked_paths: Vec::new(),
            network_enabled: false,
            max_timeout: default_max_timeout(),
        }
    }
}

/// Narrow seam for per-user settings storage; `InMemoryUserSettingsStore` is
/// the default, in-process implementation, standing in for the original's
/// encrypted per-user credential store (`utils/user_credentials.py`), which
/// has no counterpart crate anywhere in this pack.
pub trait UserSettingsStore: Send + Sync {
    fn get(&self, user_id: &str) -> GatewayUserSettings;
    fn set(&self, user_id: &str, settings: GatewayUserSettings);
}

#[derive(Default)]
pub struct InMemoryUserSettingsStore {
    settings: Mutex<HashMap<String, GatewayUserSettings>>,
}

impl InMemoryUserSettingsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserSettingsStore for InMemoryUserSettingsStore {
    fn get(&self, user_id: &str) -> GatewayUserSettings {
        self.settings
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(user_id)
            .cloned()
            .unwrap_or_default()
    }

    fn set(&self, user_id: &str, settings: GatewayUserSettings) {
        self.settings
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(user_id.to_string(), settings);
    }
}

/// Combines the gateway's global blocklist with a user's additional blocked
/// paths, matching `get_effective_blocked_patterns`'s "global + user,
/// deduplicated" behavior. The overlay only ever adds patterns; nothing here
/// can remove one of the global defaults.
pub fn effective_blocked_patterns(global: &[String], user: &GatewayUserSettings) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut combined = Vec::new();
    for pattern in global.iter().chain(user.blocked_paths.iter()) {
        if seen.insert(pattern.clone()) {
            combined.push(pattern.clone());
        }
    }
    combined
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_user_gets_default_settings() {
        let store = InMemoryUserSettingsStore::new();
        let settings = store.get("nobody");
        assert!(settings.blocked_paths.is_empty());
        assert_eq!(settings.max_timeout, 300);
    }

    #[test]
    fn set_then_get_round_trips() {
        let store = InMemoryUserSettingsStore::new();
        let mut settings = GatewayUserSettings::default();
        settings.blocked_paths.push("secrets/*".to_string());
        store.set("u1", settings);
        assert_eq!(store.get("u1").blocked_paths, vec!["secrets/*".to_string()]);
    }

    #[test]
    fn effective_patterns_merge_without_removing_globals() {
        let global = vec!["*.env".to_string(), "*.key".to_string()];
        let mut user = GatewayUserSettings::default();
        user.blocked_paths.push("*.key".to_string());
        user.blocked_paths.push("scratch/**".to_string());

        let combined = effective_blocked_patterns(&global, &user);
        assert_eq!(
            combined,
            vec!["*.env".to_string(), "*.key".to_string(), "scratch/**".to_string()]
        );
    }
}
