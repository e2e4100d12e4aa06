use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::{RegistryClient, RegistryError, Result};

/// In-process registry.
///
/// Backs dry runs, and doubles as the registry in tests: individual
/// operations can be made to fail.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    state: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    entries: BTreeMap<String, Vec<u8>>,
    writes: usize,
    fail_put_containing: Option<String>,
    fail_delete_tree: bool,
    fail_list_keys: bool,
    no_leader: bool,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every `put` whose key contains `fragment`
    pub fn fail_puts_containing(&self, fragment: impl Into<String>) {
        self.lock().fail_put_containing = Some(fragment.into());
    }

    pub fn fail_delete_tree(&self) {
        self.lock().fail_delete_tree = true;
    }

    pub fn fail_list_keys(&self) {
        self.lock().fail_list_keys = true;
    }

    pub fn without_leader(&self) {
        self.lock().no_leader = true;
    }

    pub fn insert(&self, key: impl Into<String>, value: impl Into<Vec<u8>>) {
        self.lock().entries.insert(key.into(), value.into());
    }

    /// Stored value at `key` as UTF-8 text
    pub fn get(&self, key: &str) -> Option<String> {
        self.lock()
            .entries
            .get(key)
            .map(|v| String::from_utf8_lossy(v).into_owned())
    }

    /// Every stored key, sorted
    pub fn keys(&self) -> Vec<String> {
        self.lock().entries.keys().cloned().collect()
    }

    /// Snapshot of every stored pair as text
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.lock()
            .entries
            .iter()
            .map(|(k, v)| (k.clone(), String::from_utf8_lossy(v).into_owned()))
            .collect()
    }

    /// Number of successful `put` calls so far
    pub fn writes(&self) -> usize {
        self.lock().writes
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        // A poisoned lock only means another test thread panicked mid-call;
        // the map itself is still usable.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl RegistryClient for MemoryRegistry {
    async fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        let mut state = self.lock();
        if let Some(fragment) = &state.fail_put_containing {
            if key.contains(fragment.as_str()) {
                return Err(RegistryError::Unavailable(format!("write of {key} refused")));
            }
        }
        state.entries.insert(key.to_string(), value.to_vec());
        state.writes += 1;
        Ok(())
    }

    async fn delete_tree(&self, prefix: &str) -> Result<()> {
        let mut state = self.lock();
        if state.fail_delete_tree {
            return Err(RegistryError::Unavailable(format!("delete of {prefix} refused")));
        }
        state.entries.retain(|key, _| !key.starts_with(prefix));
        Ok(())
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>> {
        let state = self.lock();
        if state.fail_list_keys {
            return Err(RegistryError::Unavailable(format!("listing of {prefix} refused")));
        }
        Ok(state
            .entries
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn leader_status(&self) -> Result<()> {
        if self.lock().no_leader {
            return Err(RegistryError::NoLeader);
        }
        Ok(())
    }
}
