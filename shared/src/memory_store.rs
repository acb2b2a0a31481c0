//! In-process request store.
//!
//! Backs development shells and the integration tests. Every change is
//! published as the full ordered result set on a `watch` channel, which is
//! exactly what a feed subscription delivers.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::capabilities::{Direction, Query, StoreError};
use crate::model::{EmergencyRequest, NewEmergencyRequest, RequestId, UnixTimeMs};

pub struct MemoryRequestStore {
    collection: String,
    records: watch::Sender<Vec<EmergencyRequest>>,
    append_count: AtomicUsize,
    available: AtomicBool,
}

impl MemoryRequestStore {
    #[must_use]
    pub fn new(collection: impl Into<String>) -> Self {
        let (records, _) = watch::channel(Vec::new());
        Self {
            collection: collection.into(),
            records,
            append_count: AtomicUsize::new(0),
            available: AtomicBool::new(true),
        }
    }

    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    fn check(&self, collection: &str) -> Result<(), StoreError> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable("store is offline"));
        }
        if collection != self.collection {
            return Err(StoreError::UnknownCollection(collection.to_string()));
        }
        Ok(())
    }

    /// Stores a new record with a fresh id and the current server time.
    #[instrument(skip(self, record), fields(category = %record.category))]
    pub fn append(
        &self,
        collection: &str,
        record: NewEmergencyRequest,
    ) -> Result<RequestId, StoreError> {
        if let Err(e) = self.check(collection) {
            warn!(error = %e, "append rejected");
            return Err(e);
        }

        let id = RequestId::new(Uuid::new_v4().to_string());
        let stored = EmergencyRequest::from_new(id.clone(), UnixTimeMs::now(), record);

        self.records.send_modify(|records| {
            records.insert(0, stored);
            // Stable, so equal timestamps keep newest-inserted first.
            records.sort_by(|a, b| b.time.cmp(&a.time));
        });
        self.append_count.fetch_add(1, Ordering::SeqCst);

        info!(%id, "request stored");
        Ok(id)
    }

    /// Receiver whose current value is always the full set, newest first.
    pub fn subscribe(
        &self,
        collection: &str,
    ) -> Result<watch::Receiver<Vec<EmergencyRequest>>, StoreError> {
        self.check(collection)?;
        debug!(collection, "feed subscriber attached");
        Ok(self.records.subscribe())
    }

    /// Runs a query against the current contents.
    pub fn query(&self, query: &Query) -> Result<Vec<EmergencyRequest>, StoreError> {
        self.check(&query.collection)?;
        if query.order_by != crate::config::DEFAULT_ORDER_FIELD {
            return Err(StoreError::InvalidQuery {
                reason: format!("cannot order by '{}'", query.order_by),
            });
        }

        let mut records = self.snapshot();
        if query.direction == Direction::Ascending {
            records.reverse();
        }
        Ok(records)
    }

    #[must_use]
    pub fn snapshot(&self) -> Vec<EmergencyRequest> {
        self.records.borrow().clone()
    }

    #[must_use]
    pub fn append_count(&self) -> usize {
        self.append_count.load(Ordering::SeqCst)
    }

    pub fn set_available(&self, available: bool) {
        info!(available, "store availability changed");
        self.available.store(available, Ordering::SeqCst);
    }
}

impl Default for MemoryRequestStore {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_COLLECTION)
    }
}
