use tracing::{info, warn};

use crate::cache::CollectionCache;
use crate::models::EventId;
use crate::store::StoreError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DeletionState {
    #[default]
    Idle,
    AwaitingConfirmation(EventId),
    Committing(EventId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted(EventId),
    Failed(EventId),
    /// `confirm` arrived with nothing awaiting confirmation.
    Ignored,
    /// A listing is being fetched; the target stays awaiting confirmation.
    Deferred(EventId),
    /// The console was torn down before the store answered.
    Discarded(EventId),
}

/// Two-step delete: the user asks, then confirms, and only a successful
/// commit touches the cache.
#[derive(Debug, Default)]
pub struct DeletionWorkflow {
    state: DeletionState,
}

impl DeletionWorkflow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DeletionState {
        &self.state
    }

    /// The id awaiting confirmation or being committed.
    pub fn pending(&self) -> Option<&EventId> {
        match &self.state {
            DeletionState::Idle => None,
            DeletionState::AwaitingConfirmation(id) | DeletionState::Committing(id) => Some(id),
        }
    }

    pub fn awaiting_confirmation(&self) -> Option<&EventId> {
        match &self.state {
            DeletionState::AwaitingConfirmation(id) => Some(id),
            _ => None,
        }
    }

    pub fn is_committing(&self) -> bool {
        matches!(self.state, DeletionState::Committing(_))
    }

    /// Targets `id`, replacing any earlier unconfirmed target. Refused while a
    /// commit is in flight.
    pub fn request(&mut self, id: EventId) -> bool {
        if self.is_committing() {
            return false;
        }
        self.state = DeletionState::AwaitingConfirmation(id);
        true
    }

    pub fn cancel(&mut self) -> bool {
        if matches!(self.state, DeletionState::AwaitingConfirmation(_)) {
            self.state = DeletionState::Idle;
            return true;
        }
        false
    }

    /// Moves to committing and hands back the id the caller must delete.
    pub fn confirm(&mut self) -> Option<EventId> {
        match std::mem::take(&mut self.state) {
            DeletionState::AwaitingConfirmation(id) => {
                self.state = DeletionState::Committing(id.clone());
                Some(id)
            }
            other => {
                self.state = other;
                None
            }
        }
    }

    /// Applies the store's answer to the in-flight commit.
    pub fn complete(&mut self, result: Result<(), StoreError>, cache: &mut CollectionCache) -> DeleteOutcome {
        let DeletionState::Committing(id) = &self.state else {
            return DeleteOutcome::Ignored;
        };
        let id = id.clone();
        self.state = DeletionState::Idle;
        match result {
            Ok(()) | Err(StoreError::NotFound(_)) => {
                cache.remove(&id);
                info!(event_id = %id, "event deleted");
                DeleteOutcome::Deleted(id)
            }
            Err(err) => {
                warn!(event_id = %id, error = %err, "failed to delete event");
                DeleteOutcome::Failed(id)
            }
        }
    }
}
