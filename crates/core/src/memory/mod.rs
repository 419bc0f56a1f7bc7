//! In-memory collaborators
//!
//! Process-local implementations of every port, used by the simulator and
//! the test suites. Mutable state lives in a [`Journaled`] cell so staged
//! settlement can checkpoint and restore it.

mod registry;
mod reserve;
mod token;
mod vault;

pub use registry::MemoryRegistry;
pub use reserve::MemoryReserve;
pub use token::MemoryToken;
pub use vault::MemoryVault;

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::ports::Checkpoint;

/// Value with a stack of saved copies
#[derive(Debug, Default)]
pub(crate) struct Journaled<T: Clone> {
    current: T,
    saved: Vec<(u64, T)>,
    next_id: u64,
}

impl<T: Clone> Journaled<T> {
    pub(crate) fn new(current: T) -> Self {
        Self {
            current,
            saved: Vec::new(),
            next_id: 0,
        }
    }

    pub(crate) fn get(&self) -> &T {
        &self.current
    }

    pub(crate) fn get_mut(&mut self) -> &mut T {
        &mut self.current
    }

    pub(crate) fn checkpoint(&mut self) -> Checkpoint {
        let id = self.next_id;
        self.next_id += 1;
        self.saved.push((id, self.current.clone()));
        Checkpoint(id)
    }

    /// Restore the copy saved at `checkpoint` and drop it with every later one
    pub(crate) fn revert_to(&mut self, checkpoint: Checkpoint) {
        if let Some(pos) = self.position(checkpoint) {
            let (_, saved) = self.saved.swap_remove(pos);
            self.saved.truncate(pos);
            self.current = saved;
        }
    }

    /// Forget the copy saved at `checkpoint` and every later one
    pub(crate) fn release(&mut self, checkpoint: Checkpoint) {
        if let Some(pos) = self.position(checkpoint) {
            self.saved.truncate(pos);
        }
    }

    fn position(&self, checkpoint: Checkpoint) -> Option<usize> {
        self.saved.iter().position(|(id, _)| *id == checkpoint.0)
    }
}

/// Lock a collaborator's state, recovering it if a holder panicked
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
