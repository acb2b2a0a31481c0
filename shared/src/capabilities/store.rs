//! Document-collection access for emergency requests.
//!
//! The shell owns the actual database client. The core asks it to append
//! records and to keep a query open; every change to the query's result set
//! comes back as a full, ordered snapshot rather than a delta.

use crux_core::capability::{Capability, CapabilityContext, Operation};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{EmergencyRequest, NewEmergencyRequest, RequestId, SubscriptionId};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Ascending,
    #[default]
    Descending,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Query {
    pub collection: String,
    pub order_by: String,
    pub direction: Direction,
}

impl Query {
    #[must_use]
    pub fn newest_first(collection: impl Into<String>, order_by: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            order_by: order_by.into(),
            direction: Direction::Descending,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", content = "data")]
pub enum StoreOperation {
    Append {
        collection: String,
        record: NewEmergencyRequest,
    },
    Subscribe {
        subscription: SubscriptionId,
        query: Query,
    },
    Unsubscribe {
        subscription: SubscriptionId,
    },
}

impl Operation for StoreOperation {
    type Output = StoreResult;
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data")]
pub enum StoreOutput {
    Appended { id: RequestId },
    Snapshot { records: Vec<EmergencyRequest> },
    /// Last message on a subscription stream.
    Closed,
}

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum StoreError {
    #[error("store unavailable: {message}")]
    Unavailable { message: String },

    #[error("permission denied by store rules")]
    PermissionDenied,

    #[error("unknown collection: {0}")]
    UnknownCollection(String),

    #[error("malformed document {id}: {reason}")]
    Malformed { id: String, reason: String },

    #[error("invalid query: {reason}")]
    InvalidQuery { reason: String },

    #[error("unexpected store response to {operation}")]
    UnexpectedResponse { operation: String },
}

impl StoreError {
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

pub type StoreResult = Result<StoreOutput, StoreError>;

/// Result of one append, as seen by the app.
pub type AppendResult = Result<RequestId, StoreError>;

/// One delivery on a feed subscription.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum FeedUpdate {
    Snapshot(Vec<EmergencyRequest>),
    Failed(StoreError),
    Closed,
}

impl From<StoreResult> for FeedUpdate {
    fn from(result: StoreResult) -> Self {
        match result {
            Ok(StoreOutput::Snapshot { records }) => Self::Snapshot(records),
            Ok(StoreOutput::Closed) => Self::Closed,
            Ok(StoreOutput::Appended { .. }) => Self::Failed(StoreError::UnexpectedResponse {
                operation: "subscribe".into(),
            }),
            Err(e) => Self::Failed(e),
        }
    }
}

pub struct RequestStore<Ev> {
    context: CapabilityContext<StoreOperation, Ev>,
}

impl<Ev> Capability<Ev> for RequestStore<Ev> {
    type Operation = StoreOperation;
    type MappedSelf<MappedEv> = RequestStore<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        RequestStore::new(self.context.map_event(f))
    }
}

impl<Ev> RequestStore<Ev>
where
    Ev: 'static + Send,
{
    pub fn new(context: CapabilityContext<StoreOperation, Ev>) -> Self {
        Self { context }
    }

    /// Appends one record and reports the id the store assigned.
    pub fn append<F>(&self, collection: impl Into<String>, record: NewEmergencyRequest, callback: F)
    where
        F: FnOnce(AppendResult) -> Ev + Send + 'static,
    {
        let ctx = self.context.clone();
        let operation = StoreOperation::Append {
            collection: collection.into(),
            record,
        };

        self.context.spawn(async move {
            let result = match ctx.request_from_shell(operation).await {
                Ok(StoreOutput::Appended { id }) => Ok(id),
                Ok(_) => Err(StoreError::UnexpectedResponse {
                    operation: "append".into(),
                }),
                Err(e) => Err(e),
            };
            ctx.update_app(callback(result));
        });
    }

    /// Opens a continuous query. `callback` runs once per delivery until the
    /// shell closes the stream or reports an error.
    pub fn subscribe<F>(&self, subscription: SubscriptionId, query: Query, callback: F)
    where
        F: Fn(FeedUpdate) -> Ev + Send + 'static,
    {
        let ctx = self.context.clone();
        let operation = StoreOperation::Subscribe {
            subscription,
            query,
        };

        self.context.spawn(async move {
            let mut stream = Box::pin(ctx.stream_from_shell(operation));

            while let Some(result) = stream.next().await {
                let update = FeedUpdate::from(result);
                let done = !matches!(update, FeedUpdate::Snapshot(_));
                ctx.update_app(callback(update));
                if done {
                    break;
                }
            }
        });
    }

    /// Asks the shell to release a subscription. No response is expected.
    pub fn unsubscribe(&self, subscription: SubscriptionId) {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            ctx.notify_shell(StoreOperation::Unsubscribe { subscription })
                .await;
        });
    }
}
