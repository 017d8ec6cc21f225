use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Notification {
    pub message: String,
    pub kind: NotificationKind,
}

#[derive(Debug, Default)]
struct Slot {
    current: Option<Notification>,
    generation: u64,
    timer: Option<CancellationToken>,
}

/// Single-slot status message that clears itself after `ttl`.
///
/// `notify` must be called from inside a tokio runtime; the expiry runs as a
/// spawned task.
#[derive(Debug)]
pub struct NotificationChannel {
    slot: Arc<Mutex<Slot>>,
    ttl: Duration,
}

impl NotificationChannel {
    pub fn new(ttl: Duration) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Slot::default())),
            ttl,
        }
    }

    pub fn current(&self) -> Option<Notification> {
        lock(&self.slot).current.clone()
    }

    pub fn notify(&self, message: impl Into<String>, kind: NotificationKind) {
        let token = CancellationToken::new();
        let generation = {
            let mut slot = lock(&self.slot);
            if let Some(previous) = slot.timer.replace(token.clone()) {
                previous.cancel();
            }
            slot.generation += 1;
            slot.current = Some(Notification {
                message: message.into(),
                kind,
            });
            slot.generation
        };

        let slot = Arc::downgrade(&self.slot);
        let ttl = self.ttl;
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(ttl) => expire(&slot, generation),
            }
        });
    }

    pub fn clear(&self) {
        let mut slot = lock(&self.slot);
        if let Some(timer) = slot.timer.take() {
            timer.cancel();
        }
        slot.current = None;
    }
}

impl Drop for NotificationChannel {
    fn drop(&mut self) {
        self.clear();
    }
}

fn expire(slot: &Weak<Mutex<Slot>>, generation: u64) {
    let Some(slot) = slot.upgrade() else {
        return;
    };
    let mut slot = lock(&slot);
    if slot.generation == generation {
        debug!("notification expired");
        slot.current = None;
        slot.timer = None;
    }
}

fn lock(slot: &Mutex<Slot>) -> MutexGuard<'_, Slot> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}
