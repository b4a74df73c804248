// SPDX-License-Identifier: MIT

//! Chat message model.

use serde::{Deserialize, Serialize};

/// A message in a plan's chat log. Append-only, immutable once sent,
/// strictly ordered by `created_at` ascending.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub text: String,
    pub sender_id: String,
    pub sender_name: String,
    pub sender_avatar: Option<String>,
    pub created_at: String,
}
