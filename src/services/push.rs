// SPDX-License-Identifier: MIT

//! Best-effort push notification channel.
//!
//! A fire-and-forget side channel: delivery requires explicitly granted
//! permission, and absence of permission degrades silently.

use std::sync::atomic::{AtomicBool, Ordering};

/// Platform notification channel contract.
pub trait PushChannel: Send + Sync {
    /// Ask for permission to deliver notifications. Returns whether it
    /// was granted.
    fn request_permission(&self) -> bool;

    /// Deliver a notification, silently dropped without permission.
    fn notify(&self, title: &str, body: &str);
}

/// Default channel that emits tracing events in place of OS
/// notifications.
pub struct LogPush {
    permitted: AtomicBool,
}

impl LogPush {
    pub fn new() -> Self {
        Self {
            permitted: AtomicBool::new(false),
        }
    }
}

impl Default for LogPush {
    fn default() -> Self {
        Self::new()
    }
}

impl PushChannel for LogPush {
    fn request_permission(&self) -> bool {
        self.permitted.store(true, Ordering::Relaxed);
        true
    }

    fn notify(&self, title: &str, body: &str) {
        if !self.permitted.load(Ordering::Relaxed) {
            return;
        }
        tracing::info!(title, body, "push notification");
    }
}
