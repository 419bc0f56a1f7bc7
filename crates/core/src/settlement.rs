//! Staged settlement across collaborators
//!
//! A trade or withdrawal touches several collaborators in sequence. Before
//! the first mutating call the exchange checkpoints the token, vault and
//! reserve collaborators. If the operation returns early with an error the
//! guard is dropped uncommitted and every collaborator is reverted, newest
//! first, so no partial transfer, mint or burn survives.

use tracing::warn;

use crate::ports::{Checkpoint, Collaborators};

/// Rollback guard for one exchange operation
pub struct StagedSettlement<'a> {
    collaborators: &'a Collaborators,
    token: Checkpoint,
    vault: Checkpoint,
    reserve: Checkpoint,
    operation: &'static str,
    committed: bool,
}

impl<'a> StagedSettlement<'a> {
    /// Checkpoint every mutable collaborator
    pub fn begin(operation: &'static str, collaborators: &'a Collaborators) -> Self {
        let token = collaborators.token.checkpoint();
        let vault = collaborators.vault.checkpoint();
        let reserve = collaborators.reserve.checkpoint();

        Self {
            collaborators,
            token,
            vault,
            reserve,
            operation,
            committed: false,
        }
    }

    /// Keep every collaborator change made since `begin`
    pub fn commit(mut self) {
        self.collaborators.reserve.release(self.reserve);
        self.collaborators.vault.release(self.vault);
        self.collaborators.token.release(self.token);
        self.committed = true;
    }
}

impl Drop for StagedSettlement<'_> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }

        self.collaborators.reserve.revert_to(self.reserve);
        self.collaborators.vault.revert_to(self.vault);
        self.collaborators.token.revert_to(self.token);
        warn!(operation = self.operation, "settlement rolled back");
    }
}
