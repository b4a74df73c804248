// SPDX-License-Identifier: MIT

//! Document store layer.
//!
//! The rest of the crate talks to the store through a small contract:
//! `get`/`set`/`add`/`delete` on JSON documents, equality-filtered
//! queries, optimistic atomic transactions (`run_atomic`), and live
//! subscriptions that deliver a snapshot followed by incremental diffs.

pub mod memory;

pub use memory::{MemoryStore, Txn};

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Collection names as constants.
pub mod collections {
    pub const PLANS: &str = "plans";
    pub const USERS: &str = "users";
    pub const NOTIFICATIONS: &str = "notifications";

    /// Per-plan message log (sub-collection semantics: ownership cascades
    /// only if the owner sweeps it explicitly).
    pub fn plan_messages(plan_id: &str) -> String {
        format!("plans/{}/messages", plan_id)
    }
}

/// Store-level errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("transaction aborted after {0} conflicting attempts")]
    Contention(u32),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Errors surfaced by `run_atomic`: either the closure aborted with a
/// typed application error (all buffered writes discarded, no retry),
/// or the store itself failed.
#[derive(Debug)]
pub enum TxnError<E> {
    Abort(E),
    Store(StoreError),
}

impl<E> From<StoreError> for TxnError<E> {
    fn from(err: StoreError) -> Self {
        TxnError::Store(err)
    }
}

impl<E> From<serde_json::Error> for TxnError<E> {
    fn from(err: serde_json::Error) -> Self {
        TxnError::Store(StoreError::Serde(err))
    }
}

/// A document returned from reads, queries and subscriptions.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

impl Document {
    /// Deserialize the document payload into a typed value.
    pub fn to_obj<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        Ok(serde_json::from_value(self.data.clone())?)
    }
}

/// Sort direction for query ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Query description: one optional equality filter, one optional
/// order-by field, optional limit. This covers every read shape the
/// dashboard needs (feed, inbox, leaderboard, message log).
#[derive(Debug, Clone)]
pub struct Query {
    pub collection: String,
    pub filter: Option<(String, Value)>,
    pub order_by: Option<(String, Direction)>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn collection(name: impl Into<String>) -> Self {
        Self {
            collection: name.into(),
            filter: None,
            order_by: None,
            limit: None,
        }
    }

    pub fn filter(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter = Some((field.into(), value.into()));
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some((field.into(), direction));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether a document payload matches the equality filter.
    pub(crate) fn matches(&self, data: &Value) -> bool {
        match &self.filter {
            None => true,
            Some((field, expected)) => data.get(field) == Some(expected),
        }
    }
}

/// Events delivered on a live subscription.
///
/// The first delivery is always `Snapshot` with the full current result
/// set; every later event is an incremental diff against it. Diffs are
/// delivered in commit order.
#[derive(Debug, Clone)]
pub enum SubscriptionEvent {
    Snapshot(Vec<Document>),
    Added(Document),
    Modified(Document),
    Removed(Document),
}
