// SPDX-License-Identifier: MIT

//! In-process document store with optimistic-concurrency transactions
//! and live subscriptions.
//!
//! Documents are JSON values kept under a collection/id map. Every
//! committed write carries a per-document version; `run_atomic` records
//! the versions it read and the commit is rejected (and the closure
//! re-run against fresh data) if any of them changed in the meantime.
//! Subscribers receive a full snapshot first, then per-commit diffs in
//! commit order.

use crate::store::{
    Direction, Document, Query, StoreError, SubscriptionEvent, TxnError,
};
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::cmp::Ordering as CmpOrdering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::mpsc;

/// How many times a conflicting transaction is re-run before the
/// failure is surfaced to the caller.
const MAX_TXN_ATTEMPTS: u32 = 5;

type Collections = HashMap<String, HashMap<String, VersionedDoc>>;

#[derive(Debug, Clone)]
struct VersionedDoc {
    /// Monotonic per-document version, starting at 1. Version 0 means
    /// "document absent" in read records.
    version: u64,
    data: Value,
}

struct Watcher {
    query: Query,
    tx: mpsc::UnboundedSender<SubscriptionEvent>,
}

struct Inner {
    data: RwLock<Collections>,
    watchers: DashMap<u64, Watcher>,
    next_watcher_id: AtomicU64,
}

/// In-memory document store.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                data: RwLock::new(HashMap::new()),
                watchers: DashMap::new(),
                next_watcher_id: AtomicU64::new(1),
            }),
        }
    }

    fn read_data(&self) -> RwLockReadGuard<'_, Collections> {
        self.inner.data.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_data(&self) -> RwLockWriteGuard<'_, Collections> {
        self.inner
            .data
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    // ─── Plain (non-transactional) operations ───────────────────

    /// Get a single document, deserialized.
    pub fn get<T: DeserializeOwned>(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<T>, StoreError> {
        let data = self.read_data();
        match data.get(collection).and_then(|col| col.get(id)) {
            Some(doc) => Ok(Some(serde_json::from_value(doc.data.clone())?)),
            None => Ok(None),
        }
    }

    /// Create or replace a document. With `merge`, top-level fields of
    /// `value` are merged into the existing document instead.
    pub fn set<T: Serialize>(
        &self,
        collection: &str,
        id: &str,
        value: &T,
        merge: bool,
    ) -> Result<(), StoreError> {
        let data = serde_json::to_value(value)?;
        self.commit(
            &[],
            vec![Write::Put {
                collection: collection.to_string(),
                id: id.to_string(),
                data,
                merge,
            }],
        )?;
        Ok(())
    }

    /// Insert a document with a store-assigned id.
    pub fn add<T: Serialize>(&self, collection: &str, value: &T) -> Result<String, StoreError> {
        let id = uuid::Uuid::new_v4().to_string();
        let data = serde_json::to_value(value)?;
        self.commit(
            &[],
            vec![Write::Put {
                collection: collection.to_string(),
                id: id.clone(),
                data,
                merge: false,
            }],
        )?;
        Ok(id)
    }

    /// Delete a document. Deleting an absent document is a no-op.
    pub fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.commit(
            &[],
            vec![Write::Delete {
                collection: collection.to_string(),
                id: id.to_string(),
            }],
        )?;
        Ok(())
    }

    /// Run a query against current committed state.
    pub fn query(&self, query: &Query) -> Result<Vec<Document>, StoreError> {
        let data = self.read_data();
        Ok(eval_query(&data, query))
    }

    // ─── Atomic transactions ────────────────────────────────────

    /// Run a closure as one atomic read-modify-write unit.
    ///
    /// Reads inside the closure observe committed state and register the
    /// document for conflict detection. If a concurrent commit touched
    /// any document this transaction read, the buffered writes are
    /// discarded and the closure is re-run with fresh data, up to
    /// `MAX_TXN_ATTEMPTS` times. The closure may abort with
    /// `TxnError::Abort`, which discards all writes and is returned to
    /// the caller without retrying.
    pub fn run_atomic<T, E, F>(&self, mut body: F) -> Result<T, TxnError<E>>
    where
        F: FnMut(&mut Txn<'_>) -> Result<T, TxnError<E>>,
    {
        for _ in 0..MAX_TXN_ATTEMPTS {
            let mut txn = Txn {
                store: self,
                now: chrono::Utc::now(),
                reads: Vec::new(),
                writes: Vec::new(),
            };

            let value = body(&mut txn)?;

            if self.commit(&txn.reads, txn.writes)? {
                return Ok(value);
            }
            // Conflicting concurrent commit: retry with fresh data.
        }

        Err(TxnError::Store(StoreError::Contention(MAX_TXN_ATTEMPTS)))
    }

    /// Validate read versions and apply writes as one unit.
    ///
    /// Returns `false` if validation failed (caller should retry).
    fn commit(&self, reads: &[ReadRecord], writes: Vec<Write>) -> Result<bool, StoreError> {
        let mut data = self.write_data();

        for read in reads {
            let current = data
                .get(&read.collection)
                .and_then(|col| col.get(&read.id))
                .map(|doc| doc.version)
                .unwrap_or(0);
            if current != read.version {
                return Ok(false);
            }
        }

        let mut applied = Vec::with_capacity(writes.len());

        for write in writes {
            match write {
                Write::Put {
                    collection,
                    id,
                    data: new_data,
                    merge,
                } => {
                    let col = data.entry(collection.clone()).or_default();
                    let old = col.get(&id).cloned();
                    let merged = match (&old, merge) {
                        (Some(existing), true) => merge_objects(&existing.data, &new_data),
                        _ => new_data,
                    };
                    let version = old.as_ref().map(|d| d.version).unwrap_or(0) + 1;
                    col.insert(
                        id.clone(),
                        VersionedDoc {
                            version,
                            data: merged.clone(),
                        },
                    );
                    applied.push(AppliedWrite {
                        collection,
                        id,
                        old: old.map(|d| d.data),
                        new: Some(merged),
                    });
                }
                Write::Delete { collection, id } => {
                    let old = data
                        .get_mut(&collection)
                        .and_then(|col| col.remove(&id))
                        .map(|d| d.data);
                    if old.is_some() {
                        applied.push(AppliedWrite {
                            collection,
                            id,
                            old,
                            new: None,
                        });
                    }
                }
            }
        }

        // Fan out diffs while still holding the write lock, so watchers
        // observe commits in application order.
        self.notify_watchers(&applied);

        Ok(true)
    }

    fn notify_watchers(&self, applied: &[AppliedWrite]) {
        let mut dead = Vec::new();

        for entry in self.inner.watchers.iter() {
            let watcher = entry.value();
            for write in applied {
                if write.collection != watcher.query.collection {
                    continue;
                }

                let old_matched = write
                    .old
                    .as_ref()
                    .is_some_and(|old| watcher.query.matches(old));
                let new_matched = write
                    .new
                    .as_ref()
                    .is_some_and(|new| watcher.query.matches(new));

                let event = match (old_matched, new_matched) {
                    (false, true) => SubscriptionEvent::Added(Document {
                        id: write.id.clone(),
                        data: write.new.clone().unwrap_or(Value::Null),
                    }),
                    (true, true) => SubscriptionEvent::Modified(Document {
                        id: write.id.clone(),
                        data: write.new.clone().unwrap_or(Value::Null),
                    }),
                    (true, false) => SubscriptionEvent::Removed(Document {
                        id: write.id.clone(),
                        data: write.old.clone().unwrap_or(Value::Null),
                    }),
                    (false, false) => continue,
                };

                if watcher.tx.send(event).is_err() {
                    dead.push(*entry.key());
                    break;
                }
            }
        }

        for id in dead {
            self.inner.watchers.remove(&id);
        }
    }

    // ─── Subscriptions ──────────────────────────────────────────

    /// Subscribe to live query results.
    ///
    /// The first message on the returned channel is always a
    /// `Snapshot` of the current result set; subsequent messages are
    /// `Added`/`Modified`/`Removed` diffs for committed writes that
    /// match the query's filter. Ordering and limit apply to the
    /// snapshot only; diff consumers reconcile their own projection.
    pub fn subscribe(&self, query: Query) -> mpsc::UnboundedReceiver<SubscriptionEvent> {
        let (tx, rx) = mpsc::unbounded_channel();

        // Hold the data lock across snapshot + registration so no
        // commit can slip a diff in before the snapshot is sent.
        let data = self.write_data();
        let snapshot = eval_query(&data, &query);
        let _ = tx.send(SubscriptionEvent::Snapshot(snapshot));

        let id = self.inner.next_watcher_id.fetch_add(1, Ordering::Relaxed);
        self.inner.watchers.insert(id, Watcher { query, tx });
        drop(data);

        rx
    }
}

// ─── Transactional handle ───────────────────────────────────────

enum Write {
    Put {
        collection: String,
        id: String,
        data: Value,
        merge: bool,
    },
    Delete {
        collection: String,
        id: String,
    },
}

struct ReadRecord {
    collection: String,
    id: String,
    version: u64,
}

struct AppliedWrite {
    collection: String,
    id: String,
    old: Option<Value>,
    new: Option<Value>,
}

/// Handle passed to `run_atomic` closures.
///
/// Reads observe committed state (not this transaction's own buffered
/// writes); perform all reads before writes, as the engine does.
pub struct Txn<'a> {
    store: &'a MemoryStore,
    now: chrono::DateTime<chrono::Utc>,
    reads: Vec<ReadRecord>,
    writes: Vec<Write>,
}

impl Txn<'_> {
    /// The commit attempt's clock, as an RFC3339 string. Re-read on
    /// every optimistic retry.
    pub fn server_time(&self) -> String {
        crate::time_utils::format_utc_rfc3339(self.now)
    }

    /// Read a document and register it for conflict detection.
    pub fn get<T: DeserializeOwned>(
        &mut self,
        collection: &str,
        id: &str,
    ) -> Result<Option<T>, StoreError> {
        let data = self.store.read_data();
        let doc = data.get(collection).and_then(|col| col.get(id));
        self.reads.push(ReadRecord {
            collection: collection.to_string(),
            id: id.to_string(),
            version: doc.map(|d| d.version).unwrap_or(0),
        });
        match doc {
            Some(doc) => Ok(Some(serde_json::from_value(doc.data.clone())?)),
            None => Ok(None),
        }
    }

    /// Buffer a full-document write.
    pub fn set<T: Serialize>(
        &mut self,
        collection: &str,
        id: &str,
        value: &T,
    ) -> Result<(), StoreError> {
        self.writes.push(Write::Put {
            collection: collection.to_string(),
            id: id.to_string(),
            data: serde_json::to_value(value)?,
            merge: false,
        });
        Ok(())
    }

    /// Buffer an insert with a store-assigned id; returns the id.
    pub fn add<T: Serialize>(&mut self, collection: &str, value: &T) -> Result<String, StoreError> {
        let id = uuid::Uuid::new_v4().to_string();
        self.writes.push(Write::Put {
            collection: collection.to_string(),
            id: id.clone(),
            data: serde_json::to_value(value)?,
            merge: false,
        });
        Ok(id)
    }

    /// Buffer a delete.
    pub fn delete(&mut self, collection: &str, id: &str) {
        self.writes.push(Write::Delete {
            collection: collection.to_string(),
            id: id.to_string(),
        });
    }
}

// ─── Query evaluation ───────────────────────────────────────────

fn eval_query(data: &Collections, query: &Query) -> Vec<Document> {
    let mut results: Vec<Document> = data
        .get(&query.collection)
        .map(|col| {
            col.iter()
                .filter(|(_, doc)| query.matches(&doc.data))
                .map(|(id, doc)| Document {
                    id: id.clone(),
                    data: doc.data.clone(),
                })
                .collect()
        })
        .unwrap_or_default();

    if let Some((field, direction)) = &query.order_by {
        results.sort_by(|a, b| {
            let ord = compare_fields(a.data.get(field), b.data.get(field))
                .then_with(|| a.id.cmp(&b.id));
            match direction {
                Direction::Ascending => ord,
                Direction::Descending => ord.reverse(),
            }
        });
    }

    if let Some(limit) = query.limit {
        results.truncate(limit);
    }

    results
}

/// Compare two field values: numbers numerically, strings
/// lexicographically (RFC3339 timestamps sort correctly this way).
/// Missing fields sort last.
fn compare_fields(a: Option<&Value>, b: Option<&Value>) -> CmpOrdering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(CmpOrdering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(_), Some(_)) => CmpOrdering::Equal,
        (Some(_), None) => CmpOrdering::Less,
        (None, Some(_)) => CmpOrdering::Greater,
        (None, None) => CmpOrdering::Equal,
    }
}

fn merge_objects(existing: &Value, incoming: &Value) -> Value {
    match (existing, incoming) {
        (Value::Object(old), Value::Object(new)) => {
            let mut merged = old.clone();
            for (key, value) in new {
                merged.insert(key.clone(), value.clone());
            }
            Value::Object(merged)
        }
        _ => incoming.clone(),
    }
}
