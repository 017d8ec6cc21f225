use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::Serialize;
use tracing::{debug, info, warn};
use utoipa::ToSchema;

use crate::cache::{CollectionCache, LoadStatus};
use crate::clock::Clock;
use crate::deletion::{DeleteOutcome, DeletionWorkflow};
use crate::models::{ClubId, EventId};
use crate::notification::{Notification, NotificationChannel, NotificationKind};
use crate::pipeline::{self, FilterState, ListedEvent, PartitionedView};
use crate::store::EventStore;

#[derive(Debug, Clone, Copy)]
pub struct ConsoleOptions {
    pub timezone: Tz,
    pub notification_ttl: Duration,
}

impl Default for ConsoleOptions {
    fn default() -> Self {
        Self {
            timezone: chrono_tz::UTC,
            notification_ttl: Duration::from_millis(3000),
        }
    }
}

/// What the rendering layer draws.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ConsoleView {
    pub club_id: ClubId,
    pub status: LoadStatus,
    pub filters: FilterState,
    pub upcoming: Vec<ListedEvent>,
    pub past: Vec<ListedEvent>,
    pub pending_delete: Option<EventId>,
    pub committing: bool,
    pub notification: Option<Notification>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded(usize),
    Failed,
    /// A fetch or a delete commit was already in flight.
    Skipped,
    /// The console was torn down before the fetch finished.
    Discarded,
}

#[derive(Debug)]
struct ConsoleState {
    cache: CollectionCache,
    filters: FilterState,
    deletion: DeletionWorkflow,
    mounted: bool,
}

/// Event console for one club. Every trigger runs to completion under a
/// short-lived lock; the lock is never held while the store is awaited.
pub struct EventConsole<S> {
    club_id: ClubId,
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    options: ConsoleOptions,
    state: Mutex<ConsoleState>,
    notifications: NotificationChannel,
}

impl<S: EventStore> EventConsole<S> {
    pub fn new(club_id: ClubId, store: Arc<S>, clock: Arc<dyn Clock>, options: ConsoleOptions) -> Self {
        Self {
            club_id,
            store,
            clock,
            options,
            state: Mutex::new(ConsoleState {
                cache: CollectionCache::new(),
                filters: FilterState::default(),
                deletion: DeletionWorkflow::new(),
                mounted: true,
            }),
            notifications: NotificationChannel::new(options.notification_ttl),
        }
    }

    pub fn status(&self) -> LoadStatus {
        self.lock().cache.status()
    }

    fn lock(&self) -> MutexGuard<'_, ConsoleState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub async fn load(&self) -> LoadOutcome {
        {
            let mut state = self.lock();
            if !state.mounted {
                return LoadOutcome::Skipped;
            }
            // A listing fetched before the commit lands would resurrect the
            // deleted record.
            if state.deletion.is_committing() {
                debug!(club_id = %self.club_id, "delete commit in flight, skipping load");
                return LoadOutcome::Skipped;
            }
            if !state.cache.begin_load() {
                debug!(club_id = %self.club_id, "load already in flight");
                return LoadOutcome::Skipped;
            }
        }

        let result = self.store.list_events(&self.club_id).await;

        let outcome = {
            let mut state = self.lock();
            if !state.mounted {
                debug!(club_id = %self.club_id, "console torn down, dropping listing");
                return LoadOutcome::Discarded;
            }
            match result {
                Ok(records) => {
                    for record in &records {
                        if let Err(err) = record.starts_at(self.options.timezone) {
                            warn!(club_id = %self.club_id, error = %err, "malformed event in listing");
                        }
                        if record.title.trim().is_empty() {
                            warn!(club_id = %self.club_id, event_id = %record.id, "event has an empty title");
                        }
                    }
                    state.cache.finish_load(records);
                    info!(club_id = %self.club_id, events = state.cache.len(), "events loaded");
                    LoadOutcome::Loaded(state.cache.len())
                }
                Err(err) => {
                    warn!(club_id = %self.club_id, error = %err, "failed to load events");
                    state.cache.fail_load();
                    LoadOutcome::Failed
                }
            }
        };

        if outcome == LoadOutcome::Failed {
            self.notifications
                .notify("Failed to load events", NotificationKind::Error);
        }
        outcome
    }

    pub fn set_search_term(&self, term: impl Into<String>) {
        self.lock().filters.search_term = term.into();
    }

    pub fn set_date_filter(&self, date: Option<NaiveDate>) {
        self.lock().filters.date_filter = date;
    }

    pub fn contains(&self, id: &EventId) -> bool {
        self.lock().cache.contains(id)
    }

    /// Returns `false` while another delete is being committed.
    pub fn request_delete(&self, id: EventId) -> bool {
        self.lock().deletion.request(id)
    }

    pub fn cancel_delete(&self) {
        self.lock().deletion.cancel();
    }

    /// Commits the pending delete. Refused while a listing is being fetched,
    /// leaving the target awaiting confirmation.
    pub async fn confirm_delete(&self) -> DeleteOutcome {
        let target = {
            let mut state = self.lock();
            if !state.mounted {
                return DeleteOutcome::Ignored;
            }
            if state.cache.status() == LoadStatus::Loading {
                if let Some(id) = state.deletion.awaiting_confirmation() {
                    debug!(club_id = %self.club_id, event_id = %id, "load in flight, deferring delete");
                    return DeleteOutcome::Deferred(id.clone());
                }
            }
            match state.deletion.confirm() {
                Some(id) => id,
                None => return DeleteOutcome::Ignored,
            }
        };

        let result = self.store.delete_event(&self.club_id, &target).await;

        let outcome = {
            let mut state = self.lock();
            if !state.mounted {
                debug!(club_id = %self.club_id, event_id = %target, "console torn down, dropping delete result");
                return DeleteOutcome::Discarded(target);
            }
            let ConsoleState { cache, deletion, .. } = &mut *state;
            deletion.complete(result, cache)
        };

        match &outcome {
            DeleteOutcome::Deleted(_) => self
                .notifications
                .notify("Event deleted successfully", NotificationKind::Success),
            DeleteOutcome::Failed(_) => self
                .notifications
                .notify("Failed to delete event", NotificationKind::Error),
            DeleteOutcome::Ignored | DeleteOutcome::Deferred(_) | DeleteOutcome::Discarded(_) => {}
        }
        outcome
    }

    pub fn dismiss_notification(&self) {
        self.notifications.clear();
    }

    /// Drops the snapshot. Fetches or deletes still in flight complete as
    /// no-ops.
    pub fn teardown(&self) {
        {
            let mut state = self.lock();
            state.mounted = false;
            state.cache = CollectionCache::new();
            state.deletion = DeletionWorkflow::new();
        }
        self.notifications.clear();
        info!(club_id = %self.club_id, "console torn down");
    }

    /// Recomputes the derived lists from the current snapshot and filters.
    pub fn view(&self) -> ConsoleView {
        let now = self.clock.now();
        let state = self.lock();
        let PartitionedView { upcoming, past } =
            pipeline::evaluate(state.cache.all(), &state.filters, now, self.options.timezone);
        ConsoleView {
            club_id: self.club_id.clone(),
            status: state.cache.status(),
            filters: state.filters.clone(),
            upcoming,
            past,
            pending_delete: state.deletion.pending().cloned(),
            committing: state.deletion.is_committing(),
            notification: self.notifications.current(),
        }
    }
}
