use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;
use std::time::Instant;

use moka::Expiry;
use moka::sync::Cache;

/// A minimal TTL-aware key/value + set store, mirroring the primitives the
/// original service used against Valkey (`setex`/`get`/`sadd`/`smembers`/
/// `srem`/`expire`). A production deployment can implement this trait
/// against Redis/Valkey; `InMemoryTtlStore` is the default, in-process
/// implementation that makes the gateway runnable standalone.
pub trait TtlStore: Send + Sync {
    fn setex(&self, key: &str, ttl: Duration, value: String);
    fn get(&self, key: &str) -> Option<String>;
    fn sadd(&self, key: &str, member: &str);
    fn smembers(&self, key: &str) -> Vec<String>;
    fn srem(&self, key: &str, member: &str);
    fn expire(&self, key: &str, ttl: Duration);
}

struct Entry {
    value: String,
    ttl: Duration,
}

struct EntryExpiry;

impl Expiry<String, Entry> for EntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &Entry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

pub struct InMemoryTtlStore {
    strings: Cache<String, Entry>,
    sets: Mutex<HashMap<String, (HashSet<String>, Option<Instant>)>>,
}

impl InMemoryTtlStore {
    pub fn new() -> Self {
        Self {
            strings: Cache::builder().expire_after(EntryExpiry).build(),
            sets: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryTtlStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TtlStore for InMemoryTtlStore {
    fn setex(&self, key: &str, ttl: Duration, value: String) {
        self.strings.insert(key.to_string(), Entry { value, ttl });
    }

    fn get(&self, key: &str) -> Option<String> {
        self.strings.get(key).map(|entry| entry.value.clone())
    }

    fn sadd(&self, key: &str, member: &str) {
        let mut sets = self.sets.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        sets.entry(key.to_string())
            .or_insert_with(|| (HashSet::new(), None))
            .0
            .insert(member.to_string());
    }

    fn smembers(&self, key: &str) -> Vec<String> {
        let mut sets = self.sets.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some((members, expires_at)) = sets.get(key) {
            if expires_at.is_some_and(|at| Instant::now() >= at) {
                sets.remove(key);
                return Vec::new();
            }
            return members.iter().cloned().collect();
        }
        Vec::new()
    }

    fn srem(&self, key: &str, member: &str) {
        let mut sets = self.sets.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some((members, _)) = sets.get_mut(key) {
            members.remove(member);
        }
    }

    fn expire(&self, key: &str, ttl: Duration) {
        let mut sets = self.sets.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(entry) = sets.get_mut(key) {
            entry.1 = Some(Instant::now() + ttl);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setex_then_get_round_trips() {
        let store = InMemoryTtlStore::new();
        store.setex("k", Duration::from_secs(60), "v".to_string());
        assert_eq!(store.get("k"), Some("v".to_string()));
    }

    #[test]
    fn sadd_smembers_srem() {
        let store = InMemoryTtlStore::new();
        store.sadd("users:1", "a");
        store.sadd("users:1", "b");
        let mut members = store.smembers("users:1");
        members.sort();
        assert_eq!(members, vec!["a".to_string(), "b".to_string()]);

        store.srem("users:1", "a");
        assert_eq!(store.smembers("users:1"), vec!["b".to_string()]);
    }

    #[test]
    fn missing_key_returns_none() {
        let store = InMemoryTtlStore::new();
        assert_eq!(store.get("missing"), None);
        assert!(store.smembers("missing").is_empty());
    }
}
