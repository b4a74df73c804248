// SPDX-License-Identifier: MIT

//! Realtime view synchronizer.
//!
//! Store push-callbacks are modeled as messages on a per-subscription
//! channel, consumed one at a time; nothing mutates shared state from a
//! callback context. The first delivery on a subscription is a snapshot
//! baseline: only diffs received after it may trigger user-visible side
//! effects.

pub mod toast;

pub use toast::{Toast, ToastKind, ToastQueue};

use crate::models::Notification;
use crate::services::PushChannel;
use crate::store::{Document, SubscriptionEvent};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::sync::mpsc;

/// Reconciles one subscription's event stream into an in-memory
/// projection, distinguishing the initial snapshot from genuinely new
/// documents.
///
/// Each watched query gets its own `Synchronizer` — the feed and the
/// notification inbox carry independent "seen the first batch" flags.
#[derive(Debug, Default)]
pub struct Synchronizer {
    seen_initial: bool,
    docs: HashMap<String, Value>,
}

impl Synchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one event in delivery order.
    ///
    /// Returns the document only for an `Added` diff received after the
    /// snapshot baseline — the only case that may produce a
    /// user-visible alert. Snapshot contents, modifications and
    /// removals update the projection silently.
    pub fn apply(&mut self, event: SubscriptionEvent) -> Option<Document> {
        match event {
            SubscriptionEvent::Snapshot(docs) => {
                self.docs = docs.into_iter().map(|d| (d.id, d.data)).collect();
                self.seen_initial = true;
                None
            }
            SubscriptionEvent::Added(doc) => {
                let was_known = self
                    .docs
                    .insert(doc.id.clone(), doc.data.clone())
                    .is_some();
                if self.seen_initial && !was_known {
                    Some(doc)
                } else {
                    None
                }
            }
            SubscriptionEvent::Modified(doc) => {
                self.docs.insert(doc.id.clone(), doc.data);
                None
            }
            SubscriptionEvent::Removed(doc) => {
                self.docs.remove(&doc.id);
                None
            }
        }
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.docs.contains_key(id)
    }
}

/// Drive a notification-inbox subscription: each genuinely new
/// notification becomes a toast and a best-effort push, historical ones
/// never do.
pub async fn watch_inbox(
    mut rx: mpsc::UnboundedReceiver<SubscriptionEvent>,
    toasts: Arc<Mutex<ToastQueue>>,
    push: Arc<dyn PushChannel>,
) {
    let mut sync = Synchronizer::new();

    while let Some(event) = rx.recv().await {
        let Some(doc) = sync.apply(event) else {
            continue;
        };
        let notification: Notification = match serde_json::from_value(doc.data) {
            Ok(n) => n,
            Err(err) => {
                tracing::warn!(notification_id = %doc.id, error = %err, "Skipping malformed notification");
                continue;
            }
        };

        let title = notification
            .sender_name
            .clone()
            .unwrap_or_else(|| "SquadUp".to_string());
        push.notify(&title, &notification.message);

        let mut queue = toasts.lock().unwrap_or_else(|e| e.into_inner());
        queue.push(
            notification.kind.into(),
            notification.message,
            notification.sender_name,
            notification.context_label,
            Instant::now(),
        );
    }
}
