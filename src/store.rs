//! Registries for uploaded documents and learning sessions.
//!
//! [`LearningService`](crate::service::LearningService) never owns a map
//! directly; it talks to a [`Store`], so a persistent backend can replace
//! [`MemoryStore`] without touching orchestration code.

use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Keyed record storage.
///
/// `update` runs the closure while holding that record's lock, so two
/// updates to the same id serialize and updates to different ids do not
/// contend.
pub trait Store<V>: Send + Sync {
    fn get(&self, id: &Uuid) -> Option<V>;

    /// Insert or replace.
    fn put(&self, id: Uuid, value: V);

    /// Mutate a record in place; `None` when the id is unknown.
    fn update(&self, id: &Uuid, f: &mut dyn FnMut(&mut V)) -> Option<V>;

    fn contains(&self, id: &Uuid) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-process store: a map of individually locked records.
pub struct MemoryStore<V> {
    entries: RwLock<HashMap<Uuid, Arc<Mutex<V>>>>,
}

impl<V> MemoryStore<V> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    fn entry(&self, id: &Uuid) -> Option<Arc<Mutex<V>>> {
        self.entries.read().get(id).cloned()
    }
}

impl<V> Default for MemoryStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone + Send> Store<V> for MemoryStore<V> {
    fn get(&self, id: &Uuid) -> Option<V> {
        self.entry(id).map(|e| e.lock().clone())
    }

    fn put(&self, id: Uuid, value: V) {
        self.entries.write().insert(id, Arc::new(Mutex::new(value)));
    }

    fn update(&self, id: &Uuid, f: &mut dyn FnMut(&mut V)) -> Option<V> {
        // Map lock is released before the record lock is taken.
        let entry = self.entry(id)?;
        let mut guard = entry.lock();
        f(&mut guard);
        Some(guard.clone())
    }

    fn contains(&self, id: &Uuid) -> bool {
        self.entries.read().contains_key(id)
    }

    fn len(&self) -> usize {
        self.entries.read().len()
    }
}
