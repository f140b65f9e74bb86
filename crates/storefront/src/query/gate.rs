//! In-flight mutation tracking.
//!
//! A mutation of one kind for one user cannot start while another is still
//! running. The second submission is rejected, not queued.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use haneul_core::UserId;

use super::MutationKind;

type Slot = (MutationKind, Option<UserId>);

/// Tracks which mutations are pending.
#[derive(Clone, Default)]
pub struct MutationGate {
    pending: Arc<Mutex<HashSet<Slot>>>,
}

/// Held while a mutation runs; frees its slot on drop.
#[must_use = "the mutation slot is released as soon as the guard is dropped"]
pub struct MutationGuard {
    slot: Slot,
    pending: Arc<Mutex<HashSet<Slot>>>,
}

impl MutationGate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the slot for `kind` and `user`.
    ///
    /// # Errors
    ///
    /// Returns `kind` back if the same mutation is already pending.
    pub fn begin(&self, kind: MutationKind, user: Option<UserId>) -> Result<MutationGuard, MutationKind> {
        let slot = (kind, user);
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if !pending.insert(slot) {
            return Err(kind);
        }
        Ok(MutationGuard {
            slot,
            pending: Arc::clone(&self.pending),
        })
    }
}

impl Drop for MutationGuard {
    fn drop(&mut self) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.slot);
    }
}
