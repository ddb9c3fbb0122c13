use crate::pool::{RandomSource, ThreadRandom};
use crate::types::{ProxyError, Result};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct PoolState {
    members: Vec<String>,
    // members[index_of[s]] == s for every key
    index_of: HashMap<String, usize>,
}

/// Set of backend identifiers with O(1) add, remove and uniform random pick.
///
/// All access goes through one `RwLock`: `pick` and the read accessors share
/// it, `add` and `remove` hold it exclusively, so no reader ever sees a
/// half-finished swap. Every method returns owned data, so no guard escapes.
pub struct ServerPool {
    state: RwLock<PoolState>,
    random: Box<dyn RandomSource>,
}

impl ServerPool {
    pub fn new() -> Self {
        Self::with_random(ThreadRandom)
    }

    pub fn with_random<R: RandomSource + 'static>(random: R) -> Self {
        Self {
            state: RwLock::new(PoolState::default()),
            random: Box::new(random),
        }
    }

    /// Appends `server_id` and returns the new pool size. Rejects identifiers
    /// that are already present.
    pub fn add(&self, server_id: impl Into<String>) -> Result<usize> {
        let server_id = server_id.into();
        let mut state = self.write();

        if state.index_of.contains_key(&server_id) {
            return Err(ProxyError::DuplicateMember(server_id));
        }

        let index = state.members.len();
        state.members.push(server_id.clone());
        state.index_of.insert(server_id, index);
        Ok(state.members.len())
    }

    /// Removes `server_id` by moving the last member into its slot and
    /// returns the new pool size.
    pub fn remove(&self, server_id: &str) -> Result<usize> {
        let mut guard = self.write();
        let state = &mut *guard;

        let index = state
            .index_of
            .remove(server_id)
            .ok_or_else(|| ProxyError::MemberNotFound(server_id.to_string()))?;

        state.members.swap_remove(index);

        // Nothing moved when the removed member was already last.
        if let Some(moved) = state.members.get(index) {
            state.index_of.insert(moved.clone(), index);
        }

        Ok(state.members.len())
    }

    /// Returns a member chosen uniformly at random.
    pub fn pick(&self) -> Result<String> {
        let state = self.read();
        if state.members.is_empty() {
            return Err(ProxyError::PoolEmpty);
        }
        let len = state.members.len();
        let index = self.random.next_index(len);
        state.members.get(index).cloned().ok_or_else(|| {
            ProxyError::Internal(format!(
                "random source returned index {} for pool of size {}",
                index, len
            ))
        })
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.read().members.len()
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.read().members.is_empty()
    }

    #[cfg(test)]
    fn contains(&self, server_id: &str) -> bool {
        self.read().index_of.contains_key(server_id)
    }

    /// Snapshot of the current members in slot order.
    pub fn members(&self) -> Vec<String> {
        self.read().members.clone()
    }

    // Every critical section leaves the state consistent before anything can
    // unwind, so a poisoned lock still guards valid data.
    fn read(&self) -> RwLockReadGuard<'_, PoolState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, PoolState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    #[cfg(test)]
    fn index_snapshot(&self) -> HashMap<String, usize> {
        self.read().index_of.clone()
    }

    #[cfg(test)]
    fn assert_consistent(&self) {
        let state = self.read();
        assert_eq!(state.members.len(), state.index_of.len());
        for (server_id, &index) in &state.index_of {
            assert_eq!(&state.members[index], server_id);
        }
    }
}

impl std::fmt::Debug for ServerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerPool")
            .field("members", &self.read().members)
            .finish()
    }
}
