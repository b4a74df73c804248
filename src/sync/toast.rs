// SPDX-License-Identifier: MIT

//! Client-local toast queue with time-decaying items.
//!
//! Bounded to four visible toasts; each carries a countdown that can be
//! paused (hover/focus) and resumed from the captured remaining time,
//! not restarted.

use crate::models::NotificationKind;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// At most this many toasts are visible; pushing another evicts the
/// oldest.
pub const MAX_VISIBLE: usize = 4;

/// Default countdown per toast.
pub const DEFAULT_DURATION: Duration = Duration::from_millis(4500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
    Join,
    Leave,
    Chat,
}

impl From<NotificationKind> for ToastKind {
    fn from(kind: NotificationKind) -> Self {
        match kind {
            NotificationKind::Join => ToastKind::Join,
            NotificationKind::Leave => ToastKind::Leave,
            NotificationKind::Chat => ToastKind::Chat,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub id: u64,
    pub kind: ToastKind,
    pub message: String,
    pub sender_name: Option<String>,
    pub subtitle: Option<String>,
    /// Countdown remaining as of `started_at` (or as captured at the
    /// pause point while paused).
    remaining: Duration,
    started_at: Instant,
    paused_at: Option<Instant>,
}

impl Toast {
    /// Time left on the countdown at `now`.
    pub fn remaining_at(&self, now: Instant) -> Duration {
        if self.paused_at.is_some() {
            self.remaining
        } else {
            self.remaining
                .saturating_sub(now.saturating_duration_since(self.started_at))
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    fn is_expired(&self, now: Instant) -> bool {
        self.paused_at.is_none() && self.remaining_at(now).is_zero()
    }
}

/// Bounded queue of ephemeral UI events.
#[derive(Debug, Default)]
pub struct ToastQueue {
    items: VecDeque<Toast>,
    next_id: u64,
}

impl ToastQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(
        &mut self,
        kind: ToastKind,
        message: String,
        sender_name: Option<String>,
        subtitle: Option<String>,
        now: Instant,
    ) -> u64 {
        self.push_with_duration(kind, message, sender_name, subtitle, DEFAULT_DURATION, now)
    }

    pub fn push_with_duration(
        &mut self,
        kind: ToastKind,
        message: String,
        sender_name: Option<String>,
        subtitle: Option<String>,
        duration: Duration,
        now: Instant,
    ) -> u64 {
        self.next_id += 1;
        let id = self.next_id;

        if self.items.len() == MAX_VISIBLE {
            self.items.pop_front();
        }
        self.items.push_back(Toast {
            id,
            kind,
            message,
            sender_name,
            subtitle,
            remaining: duration,
            started_at: now,
            paused_at: None,
        });
        id
    }

    /// Freeze a toast's countdown, capturing the remaining time.
    pub fn pause(&mut self, id: u64, now: Instant) {
        if let Some(toast) = self.items.iter_mut().find(|t| t.id == id) {
            if toast.paused_at.is_none() {
                toast.remaining = toast.remaining_at(now);
                toast.paused_at = Some(now);
            }
        }
    }

    /// Resume a paused countdown from its captured remainder.
    pub fn resume(&mut self, id: u64, now: Instant) {
        if let Some(toast) = self.items.iter_mut().find(|t| t.id == id) {
            if toast.paused_at.take().is_some() {
                toast.started_at = now;
            }
        }
    }

    /// Explicit dismissal; no side effects on underlying data.
    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.items.len();
        self.items.retain(|t| t.id != id);
        self.items.len() != before
    }

    /// Drop every toast whose countdown reached zero; returns their ids.
    pub fn expire(&mut self, now: Instant) -> Vec<u64> {
        let expired: Vec<u64> = self
            .items
            .iter()
            .filter(|t| t.is_expired(now))
            .map(|t| t.id)
            .collect();
        self.items.retain(|t| !t.is_expired(now));
        expired
    }

    pub fn visible(&self) -> impl Iterator<Item = &Toast> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push(queue: &mut ToastQueue, message: &str, now: Instant) -> u64 {
        queue.push(ToastKind::Join, message.to_string(), None, None, now)
    }

    #[test]
    fn fifth_toast_evicts_the_oldest() {
        let now = Instant::now();
        let mut queue = ToastQueue::new();

        let first = push(&mut queue, "one", now);
        for message in ["two", "three", "four", "five"] {
            push(&mut queue, message, now);
        }

        assert_eq!(queue.len(), MAX_VISIBLE);
        assert!(queue.visible().all(|t| t.id != first));
        assert_eq!(queue.visible().last().unwrap().message, "five");
    }

    #[test]
    fn countdown_expires_after_duration() {
        let now = Instant::now();
        let mut queue = ToastQueue::new();
        let id = push(&mut queue, "hello", now);

        assert!(queue.expire(now + Duration::from_millis(4000)).is_empty());

        let expired = queue.expire(now + Duration::from_millis(5000));
        assert_eq!(expired, vec![id]);
        assert!(queue.is_empty());
    }

    #[test]
    fn pause_captures_remaining_and_resume_continues_from_it() {
        let start = Instant::now();
        let mut queue = ToastQueue::new();
        let id = push(&mut queue, "hover me", start);

        // Pause 1s in: 3.5s remain.
        let pause_point = start + Duration::from_secs(1);
        queue.pause(id, pause_point);

        // While paused the countdown does not advance, however long.
        let much_later = start + Duration::from_secs(60);
        assert_eq!(
            queue.visible().next().unwrap().remaining_at(much_later),
            Duration::from_millis(3500)
        );
        assert!(queue.expire(much_later).is_empty());

        // Resume: countdown continues from 3.5s, not from the full 4.5s.
        queue.resume(id, much_later);
        assert!(queue
            .expire(much_later + Duration::from_millis(3400))
            .is_empty());
        assert_eq!(
            queue.expire(much_later + Duration::from_millis(3600)),
            vec![id]
        );
    }

    #[test]
    fn dismiss_removes_without_waiting_for_countdown() {
        let now = Instant::now();
        let mut queue = ToastQueue::new();
        let id = push(&mut queue, "bye", now);

        assert!(queue.dismiss(id));
        assert!(queue.is_empty());
        assert!(!queue.dismiss(id));
    }
}
