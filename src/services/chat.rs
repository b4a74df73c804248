// SPDX-License-Identifier: MIT

//! Per-plan chat channel: an append-only ordered message log.
//!
//! A message and its notification fan-out commit as one transaction;
//! there is no edit or delete once sent.

use crate::error::{AppError, Result};
use crate::models::{ChatMessage, Plan};
use crate::services::fanout;
use crate::session::SessionContext;
use crate::store::{collections, Direction, MemoryStore, Query, TxnError};

#[derive(Clone)]
pub struct ChatService {
    store: MemoryStore,
}

impl ChatService {
    pub fn new(store: MemoryStore) -> Self {
        Self { store }
    }

    /// Append a message and fan out one notification per eligible
    /// recipient, all-or-nothing.
    pub fn send(&self, plan_id: &str, session: &SessionContext, text: &str) -> Result<ChatMessage> {
        if text.trim().is_empty() {
            return Err(AppError::BadRequest(
                "Message text cannot be empty".to_string(),
            ));
        }

        let message = self
            .store
            .run_atomic(|txn| {
                let plan: Plan = txn.get(collections::PLANS, plan_id)?.ok_or(TxnError::Abort(
                    AppError::NotFound("Plan no longer exists".to_string()),
                ))?;

                if plan.creator_id != session.member_id
                    && !plan.has_participant(&session.member_id)
                {
                    return Err(TxnError::Abort(AppError::NotParticipant));
                }

                let message = ChatMessage {
                    text: text.to_string(),
                    sender_id: session.member_id.clone(),
                    sender_name: session.display_name.clone(),
                    sender_avatar: session.avatar_url.clone(),
                    created_at: txn.server_time(),
                };

                txn.add(&collections::plan_messages(plan_id), &message)?;

                for notification in
                    fanout::chat_notifications(&plan, session, text, txn.server_time())
                {
                    txn.add(collections::NOTIFICATIONS, &notification)?;
                }

                Ok(message)
            })
            .map_err(AppError::from)?;

        tracing::debug!(plan_id, sender = %session.member_id, "Chat message sent");
        Ok(message)
    }

    /// The complete message log, ascending by creation time.
    pub fn messages(&self, plan_id: &str) -> Result<Vec<(String, ChatMessage)>> {
        let docs = self.store.query(
            &Query::collection(collections::plan_messages(plan_id))
                .order_by("created_at", Direction::Ascending),
        )?;

        docs.into_iter()
            .map(|doc| Ok((doc.id.clone(), doc.to_obj()?)))
            .collect()
    }
}
