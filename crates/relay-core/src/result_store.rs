//! Keyed result store for correlating asynchronous results with requests.

use std::collections::HashMap;

use parking_lot::Mutex;
use serde_json::Value;

/// Concurrency-safe map from request id to result payload.
///
/// All operations serialize on one lock that protects only this map; it has
/// no ordering relationship with the execution gate. Entries never expire:
/// callers remove them with [`ResultStore::reset`].
pub struct ResultStore<V = Value> {
    entries: Mutex<HashMap<String, V>>,
}

impl<V: Clone> ResultStore<V> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Insert or overwrite the value for `request_id`.
    pub fn set(&self, request_id: impl Into<String>, value: V) {
        let _ = self.entries.lock().insert(request_id.into(), value);
    }

    /// Snapshot of the value for `request_id`, if present.
    pub fn get(&self, request_id: &str) -> Option<V> {
        self.entries.lock().get(request_id).cloned()
    }

    /// Remove the entry for `request_id`. Returns whether one existed.
    pub fn reset(&self, request_id: &str) -> bool {
        self.entries.lock().remove(request_id).is_some()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl<V: Clone> Default for ResultStore<V> {
    fn default() -> Self {
        Self::new()
    }
}
