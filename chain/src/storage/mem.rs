//! In-memory state store.
//!
//! Useful for unit tests and throwaway nodes. Keeps the latest saved
//! snapshot behind a mutex so it satisfies the shared `&self` interface.

use std::sync::Mutex;

use super::{NodeState, StateStore, StorageError};

/// In-memory implementation of [`StateStore`].
#[derive(Default)]
pub struct InMemoryStateStore {
    state: Mutex<Option<NodeState>>,
}

impl InMemoryStateStore {
    /// Creates a new, empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-seeded with a snapshot, as if a previous run
    /// had saved it.
    pub fn seeded(state: NodeState) -> Self {
        Self {
            state: Mutex::new(Some(state)),
        }
    }

    /// Returns the last saved snapshot, if any.
    pub fn saved(&self) -> Option<NodeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl StateStore for InMemoryStateStore {
    fn load(&self) -> Result<Option<NodeState>, StorageError> {
        Ok(self.saved())
    }

    fn save(&self, state: &NodeState) -> Result<(), StorageError> {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = Some(state.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_is_empty_until_first_save() {
        let store = InMemoryStateStore::new();
        assert!(store.load().expect("load").is_none());

        let state = NodeState::default();
        store.save(&state).expect("save");
        assert_eq!(store.load().expect("load"), Some(state));
    }

    #[test]
    fn seeded_store_serves_its_snapshot() {
        let mut state = NodeState::default();
        state.peer_nodes.push("localhost:5001".into());

        let store = InMemoryStateStore::seeded(state.clone());
        assert_eq!(store.load().expect("load"), Some(state));
    }
}
