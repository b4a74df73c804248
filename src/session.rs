// SPDX-License-Identifier: MIT

//! Explicitly-scoped session context.
//!
//! Acquired at sign-in, reconstructed per request by the auth
//! middleware, and passed to every core operation instead of ambient
//! global state.

use crate::error::{AppError, Result};
use crate::models::MemberProfile;
use crate::store::{collections, MemoryStore};

/// The acting member for one operation.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub member_id: String,
    pub display_name: String,
    pub email: String,
    pub avatar_url: Option<String>,
}

impl SessionContext {
    /// Build a session from the stored profile of an authenticated
    /// member id. Fails `Unauthorized` if the profile no longer exists.
    pub fn load(store: &MemoryStore, member_id: &str) -> Result<Self> {
        let profile: MemberProfile = store
            .get(collections::USERS, member_id)?
            .ok_or(AppError::Unauthorized)?;

        Ok(Self {
            member_id: member_id.to_string(),
            display_name: profile.display_name,
            email: profile.email,
            avatar_url: profile.avatar_url,
        })
    }
}
