// SPDX-License-Identifier: MIT

//! Member profiles, the leaderboard and the notification inbox.
//!
//! All writes here are single-owner documents, so they are plain
//! (non-transactional) store operations.

use crate::error::{AppError, Result};
use crate::models::{MemberProfile, Notification, Principal};
use crate::session::SessionContext;
use crate::store::{collections, Direction, MemoryStore, Query};
use serde::Serialize;

/// Bounded inbox read: older notifications simply are not fetched.
const INBOX_LIMIT: usize = 50;

const LEADERBOARD_LIMIT: usize = 10;

/// Member-editable profile fields.
#[derive(Debug, Clone, Default)]
pub struct ProfileEdit {
    pub display_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub payment_handle: Option<String>,
}

/// One leaderboard row.
#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardEntry {
    pub member_id: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub points: i64,
}

#[derive(Clone)]
pub struct MemberService {
    store: MemoryStore,
}

impl MemberService {
    pub fn new(store: MemoryStore) -> Self {
        Self { store }
    }

    /// Fetch the profile for a principal, creating it on first sign-in.
    pub fn ensure_profile(&self, principal: &Principal) -> Result<MemberProfile> {
        if let Some(existing) = self.store.get(collections::USERS, &principal.id)? {
            return Ok(existing);
        }

        let profile = MemberProfile::from_principal(principal);
        self.store
            .set(collections::USERS, &principal.id, &profile, false)?;
        tracing::info!(member = %principal.id, "Profile created on first sign-in");
        Ok(profile)
    }

    pub fn profile(&self, member_id: &str) -> Result<MemberProfile> {
        self.store
            .get(collections::USERS, member_id)?
            .ok_or_else(|| AppError::NotFound(format!("Member {} not found", member_id)))
    }

    /// Apply a member's own profile edits.
    pub fn update_profile(
        &self,
        session: &SessionContext,
        edit: ProfileEdit,
    ) -> Result<MemberProfile> {
        let mut profile = self.profile(&session.member_id)?;

        if let Some(display_name) = edit.display_name {
            let trimmed = display_name.trim();
            if trimmed.is_empty() {
                return Err(AppError::BadRequest(
                    "Display name cannot be empty".to_string(),
                ));
            }
            profile.display_name = trimmed.to_string();
        }
        if let Some(phone) = edit.phone {
            profile.phone = Some(phone);
        }
        if let Some(address) = edit.address {
            profile.address = Some(address);
        }
        if let Some(payment_handle) = edit.payment_handle {
            profile.payment_handle = Some(payment_handle);
        }

        self.store
            .set(collections::USERS, &session.member_id, &profile, false)?;
        Ok(profile)
    }

    /// Top members by points.
    pub fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>> {
        let docs = self.store.query(
            &Query::collection(collections::USERS)
                .order_by("points", Direction::Descending)
                .limit(LEADERBOARD_LIMIT),
        )?;

        let mut entries = Vec::with_capacity(docs.len());
        for doc in docs {
            let profile: MemberProfile = doc.to_obj()?;
            entries.push(LeaderboardEntry {
                member_id: doc.id,
                display_name: profile.display_name,
                avatar_url: profile.avatar_url,
                points: profile.points,
            });
        }
        Ok(entries)
    }

    /// The caller's most recent notifications, newest first.
    pub fn notifications(&self, session: &SessionContext) -> Result<Vec<(String, Notification)>> {
        let docs = self.store.query(
            &Query::collection(collections::NOTIFICATIONS)
                .filter("receiver_id", session.member_id.as_str())
                .order_by("created_at", Direction::Descending)
                .limit(INBOX_LIMIT),
        )?;

        docs.into_iter()
            .map(|doc| Ok((doc.id.clone(), doc.to_obj()?)))
            .collect()
    }

    /// Flip a notification's read flag. Idempotent, owner-only.
    pub fn mark_read(&self, session: &SessionContext, notification_id: &str) -> Result<()> {
        let notification: Notification = self
            .store
            .get(collections::NOTIFICATIONS, notification_id)?
            .ok_or_else(|| AppError::NotFound("Notification not found".to_string()))?;

        if notification.receiver_id != session.member_id {
            return Err(AppError::AccessDenied(
                "Not your notification".to_string(),
            ));
        }

        self.store.set(
            collections::NOTIFICATIONS,
            notification_id,
            &serde_json::json!({ "read": true }),
            true,
        )?;
        Ok(())
    }
}
