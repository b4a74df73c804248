// SPDX-License-Identifier: MIT

//! Member identity and profile models.

use serde::{Deserialize, Serialize};

/// Authenticated principal as yielded by the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    pub id: String,
    pub display_name: String,
    pub email: String,
    pub avatar_url: Option<String>,
}

/// Member profile stored under the `users` collection, keyed by the
/// principal id. Created lazily on first sign-in; never deleted by
/// this system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberProfile {
    pub display_name: String,
    pub email: String,
    pub avatar_url: Option<String>,
    /// Gamification counter. Non-negative by convention, but the
    /// reward protocol can transiently drive it negative, so signed.
    pub points: i64,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub payment_handle: Option<String>,
}

impl MemberProfile {
    /// Initial profile for a first sign-in.
    pub fn from_principal(principal: &Principal) -> Self {
        Self {
            display_name: principal.display_name.clone(),
            email: principal.email.clone(),
            avatar_url: principal.avatar_url.clone(),
            points: 0,
            phone: None,
            address: None,
            payment_handle: None,
        }
    }
}
