// SPDX-License-Identifier: MIT

//! Notification fan-out: recipient computation and message rendering.
//!
//! These are pure functions invoked *inside* membership and chat
//! transactions, so a notification is only ever written atomically with
//! the state change it describes.

use crate::models::{Notification, NotificationKind, Plan};
use crate::session::SessionContext;

/// Bounded prefix length for chat previews embedded in notifications.
const PREVIEW_MAX_CHARS: usize = 60;

/// Recipients of a join/leave event: the plan's creator only.
pub fn membership_recipients(plan: &Plan) -> Vec<String> {
    vec![plan.creator_id.clone()]
}

/// Recipients of a chat message: creator plus every current
/// participant, excluding the sender.
pub fn chat_recipients(plan: &Plan, sender_id: &str) -> Vec<String> {
    std::iter::once(&plan.creator_id)
        .chain(plan.participants.iter())
        .filter(|id| id.as_str() != sender_id)
        .cloned()
        .collect()
}

/// Shorten a chat body to a notification preview.
pub fn chat_preview(text: &str) -> String {
    let mut chars = text.chars();
    let prefix: String = chars.by_ref().take(PREVIEW_MAX_CHARS).collect();
    if chars.next().is_some() {
        format!("{}…", prefix)
    } else {
        prefix
    }
}

pub fn join_notification(plan: &Plan, joiner: &SessionContext, created_at: String) -> Notification {
    Notification {
        receiver_id: plan.creator_id.clone(),
        message: format!("{} joined your plan", joiner.display_name),
        kind: NotificationKind::Join,
        read: false,
        sender_name: Some(joiner.display_name.clone()),
        sender_avatar: joiner.avatar_url.clone(),
        context_label: Some(plan.details.context_label()),
        created_at,
    }
}

pub fn leave_notification(plan: &Plan, leaver: &SessionContext, created_at: String) -> Notification {
    Notification {
        receiver_id: plan.creator_id.clone(),
        message: format!("{} left your plan", leaver.display_name),
        kind: NotificationKind::Leave,
        read: false,
        sender_name: Some(leaver.display_name.clone()),
        sender_avatar: leaver.avatar_url.clone(),
        context_label: Some(plan.details.context_label()),
        created_at,
    }
}

/// One notification per eligible chat recipient.
pub fn chat_notifications(
    plan: &Plan,
    sender: &SessionContext,
    text: &str,
    created_at: String,
) -> Vec<Notification> {
    let preview = chat_preview(text);
    let context_label = plan.details.context_label();

    chat_recipients(plan, &sender.member_id)
        .into_iter()
        .map(|receiver_id| Notification {
            receiver_id,
            message: preview.clone(),
            kind: NotificationKind::Chat,
            read: false,
            sender_name: Some(sender.display_name.clone()),
            sender_avatar: sender.avatar_url.clone(),
            context_label: Some(context_label.clone()),
            created_at: created_at.clone(),
        })
        .collect()
}
