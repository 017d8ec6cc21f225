use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::info;

use crate::clock::Clock;
use crate::controller::{ConsoleOptions, EventConsole};
use crate::models::ClubId;
use crate::store::EventStore;

type ConsoleMap<S> = HashMap<ClubId, Arc<EventConsole<S>>>;

/// Live consoles, one per mounted club.
pub struct ConsoleRegistry<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    options: ConsoleOptions,
    consoles: Mutex<ConsoleMap<S>>,
}

impl<S: EventStore> ConsoleRegistry<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, options: ConsoleOptions) -> Self {
        Self {
            store,
            clock,
            options,
            consoles: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ConsoleMap<S>> {
        self.consoles.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the club's console, creating it on first mount.
    pub fn mount(&self, club_id: &ClubId) -> Arc<EventConsole<S>> {
        self.lock()
            .entry(club_id.clone())
            .or_insert_with(|| {
                info!(%club_id, "mounting console");
                Arc::new(EventConsole::new(
                    club_id.clone(),
                    self.store.clone(),
                    self.clock.clone(),
                    self.options,
                ))
            })
            .clone()
    }

    pub fn get(&self, club_id: &ClubId) -> Option<Arc<EventConsole<S>>> {
        self.lock().get(club_id).cloned()
    }

    pub fn teardown(&self, club_id: &ClubId) -> bool {
        let removed = self.lock().remove(club_id);
        match removed {
            Some(console) => {
                console.teardown();
                true
            }
            None => false,
        }
    }
}
