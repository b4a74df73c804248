// SPDX-License-Identifier: MIT

//! Sign-in and sign-out routes.
//!
//! The identity provider is external: it yields an authenticated
//! principal or fails. On top of that the core enforces the
//! closed-community email gate; a principal outside the allowed domain
//! gets no session cookie at all.

use axum::{extract::State, routing::post, Json, Router};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, SESSION_COOKIE};
use crate::services::identity;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/session", post(sign_in))
        .route("/auth/logout", post(logout))
}

#[derive(Deserialize)]
struct SignInRequest {
    /// Credential issued by the identity provider.
    token: String,
}

#[derive(Serialize)]
pub struct SignInResponse {
    pub member_id: String,
    pub display_name: String,
    pub email: String,
    pub points: i64,
    /// Session token, also set as a cookie.
    pub token: String,
}

/// Exchange an identity-provider credential for a session.
async fn sign_in(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(request): Json<SignInRequest>,
) -> Result<(CookieJar, Json<SignInResponse>)> {
    let principal = state.identity.verify(&request.token)?;
    identity::check_domain(&principal, &state.config.allowed_email_domain)?;

    // Lazily create the profile on first sign-in.
    let profile = state.members.ensure_profile(&principal)?;

    let jwt = create_jwt(&principal.id, &state.config.jwt_signing_key)
        .map_err(AppError::Internal)?;

    tracing::info!(member = %principal.id, "Session created");

    let cookie = Cookie::build((SESSION_COOKIE, jwt.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();

    Ok((
        jar.add(cookie),
        Json(SignInResponse {
            member_id: principal.id,
            display_name: profile.display_name,
            email: profile.email,
            points: profile.points,
            token: jwt,
        }),
    ))
}

#[derive(Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}

/// Invalidate the session by clearing the cookie.
async fn logout(jar: CookieJar) -> (CookieJar, Json<LogoutResponse>) {
    let cookie = Cookie::build((SESSION_COOKIE, "")).path("/").build();
    (jar.remove(cookie), Json(LogoutResponse { success: true }))
}
