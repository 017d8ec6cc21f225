use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::models::{ClubId, EventId, EventRecord};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Event {0} not found")]
    NotFound(EventId),
    #[error("Event store URL cannot carry path segments")]
    InvalidBaseUrl,
}

/// Remote service of record for club events.
pub trait EventStore: Send + Sync + 'static {
    fn list_events(
        &self,
        club_id: &ClubId,
    ) -> impl Future<Output = Result<Vec<EventRecord>, StoreError>> + Send;

    fn delete_event(
        &self,
        club_id: &ClubId,
        event_id: &EventId,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

#[derive(Clone)]
pub struct HttpEventStore {
    client: reqwest::Client,
    base_url: Arc<Url>,
}

impl HttpEventStore {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: Arc::new(base_url),
        })
    }

    fn club_url(&self, club_id: &ClubId, tail: &[&str]) -> Result<Url, StoreError> {
        let mut url = (*self.base_url).clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::InvalidBaseUrl)?
            .pop_if_empty()
            .extend(["clubs", club_id.as_str()])
            .extend(tail);
        Ok(url)
    }
}

impl EventStore for HttpEventStore {
    async fn list_events(&self, club_id: &ClubId) -> Result<Vec<EventRecord>, StoreError> {
        let url = self.club_url(club_id, &["events"])?;
        debug!(%url, "listing events");
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.json().await?)
    }

    async fn delete_event(&self, club_id: &ClubId, event_id: &EventId) -> Result<(), StoreError> {
        let url = self.club_url(club_id, &["events", event_id.as_str()])?;
        debug!(%url, "deleting event");
        let response = self.client.delete(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(event_id.clone()));
        }
        response.error_for_status()?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// Store double that replays queued answers and counts calls.
    #[derive(Default)]
    pub struct ScriptedStore {
        listings: Mutex<VecDeque<Result<Vec<EventRecord>, StoreError>>>,
        deletions: Mutex<VecDeque<Result<(), StoreError>>>,
        list_calls: AtomicUsize,
        delete_calls: AtomicUsize,
    }

    impl ScriptedStore {
        pub fn with_listing(self, listing: Result<Vec<EventRecord>, StoreError>) -> Self {
            self.listings.lock().unwrap().push_back(listing);
            self
        }

        pub fn with_deletion(self, deletion: Result<(), StoreError>) -> Self {
            self.deletions.lock().unwrap().push_back(deletion);
            self
        }

        pub fn list_calls(&self) -> usize {
            self.list_calls.load(Ordering::SeqCst)
        }

        pub fn delete_calls(&self) -> usize {
            self.delete_calls.load(Ordering::SeqCst)
        }
    }

    impl EventStore for ScriptedStore {
        async fn list_events(&self, _club_id: &ClubId) -> Result<Vec<EventRecord>, StoreError> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            let next = self.listings.lock().unwrap().pop_front();
            next.unwrap_or_else(|| Ok(Vec::new()))
        }

        async fn delete_event(&self, _club_id: &ClubId, _event_id: &EventId) -> Result<(), StoreError> {
            self.delete_calls.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            let next = self.deletions.lock().unwrap().pop_front();
            next.unwrap_or(Ok(()))
        }
    }
}
