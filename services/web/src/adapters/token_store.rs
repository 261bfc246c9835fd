//! services/web/src/adapters/token_store.rs
//!
//! An in-memory implementation of the `TokenStore` port.

use nodo_core::ports::TokenStore;
use std::collections::HashMap;
use std::sync::RwLock;

#[derive(Default)]
pub struct MemoryTokenStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryTokenStore {
    pub fn len(&self) -> usize {
        self.values.read().map(|values| values.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// A poisoned lock only means another writer panicked mid-update of a single
// string; the map itself is still usable.
impl TokenStore for MemoryTokenStore {
    fn get(&self, key: &str) -> Option<String> {
        let values = self.values.read().unwrap_or_else(|e| e.into_inner());
        values.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut values = self.values.write().unwrap_or_else(|e| e.into_inner());
        values.insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        let mut values = self.values.write().unwrap_or_else(|e| e.into_inner());
        values.remove(key);
    }
}
