// SPDX-License-Identifier: MIT

//! Notification model.

use serde::{Deserialize, Serialize};

/// What kind of event a notification describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    Join,
    Leave,
    Chat,
}

/// Per-recipient notification record, owned by the receiver.
///
/// Created only by the fan-out path as a side effect of a membership
/// or chat event, inside the same transaction; mutated only to flip
/// `read`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub receiver_id: String,
    /// Pre-rendered text, stable even if the plan is later edited or
    /// deleted.
    pub message: String,
    pub kind: NotificationKind,
    pub read: bool,
    pub sender_name: Option<String>,
    pub sender_avatar: Option<String>,
    /// Human-readable plan summary, denormalized at write time.
    pub context_label: Option<String>,
    pub created_at: String,
}
