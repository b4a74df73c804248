// SPDX-License-Identifier: MIT

//! API routes for authenticated members.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthMember;
use crate::models::{ChatMessage, MemberProfile, Notification, Plan, PlanCategory, PlanDetails, PlanStatus};
use crate::services::members::{LeaderboardEntry, ProfileEdit};
use crate::services::{payments, NewPlan};
use crate::session::SessionContext;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

/// API routes (require authentication via session JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/plans", get(get_feed).post(create_plan))
        .route("/api/plans/{id}", delete(delete_plan))
        .route("/api/plans/{id}/join", post(join_plan))
        .route("/api/plans/{id}/leave", post(leave_plan))
        .route("/api/plans/{id}/messages", get(get_messages).post(send_message))
        .route("/api/plans/{id}/payment-link", get(get_payment_link))
        .route("/api/notifications", get(get_notifications))
        .route("/api/notifications/{id}/read", post(mark_notification_read))
        .route("/api/leaderboard", get(get_leaderboard))
        .route("/api/me", get(get_me).put(update_me))
        .route("/api/push/permission", put(request_push_permission))
}

/// The acting member's session context, rebuilt from the stored
/// profile so renamed members fan out their current name.
fn session(state: &AppState, auth: &AuthMember) -> Result<SessionContext> {
    SessionContext::load(&state.store, &auth.member_id)
}

// ─── Plans ───────────────────────────────────────────────────

/// Plan as returned to clients, with derived fields attached.
#[derive(Serialize)]
pub struct PlanView {
    pub id: String,
    #[serde(flatten)]
    pub plan: Plan,
    pub status: PlanStatus,
    pub expires_at: Option<String>,
}

impl PlanView {
    fn new(id: String, plan: Plan) -> Self {
        let status = plan.status();
        let expires_at = plan
            .expires_at()
            .map(crate::time_utils::format_utc_rfc3339);
        Self {
            id,
            plan,
            status,
            expires_at,
        }
    }
}

#[derive(Deserialize)]
struct FeedQuery {
    /// Narrow the feed to one category.
    category: Option<PlanCategory>,
}

/// The live feed: visibility-filtered at read time; also kicks off the
/// caller's own best-effort expiry sweep.
async fn get_feed(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthMember>,
    Query(params): Query<FeedQuery>,
) -> Result<Json<Vec<PlanView>>> {
    let session = session(&state, &auth)?;
    let now = chrono::Utc::now();

    state.plans.sweep_expired(&session, now);

    let plans = state.plans.feed(now, params.category)?;
    Ok(Json(
        plans
            .into_iter()
            .map(|(id, plan)| PlanView::new(id, plan))
            .collect(),
    ))
}

#[derive(Deserialize, Validate)]
struct CreatePlanRequest {
    #[serde(flatten)]
    details: PlanDetails,
    scheduled_time: Option<String>,
    #[validate(range(min = 2, message = "capacity must be at least 2"))]
    capacity: u32,
}

async fn create_plan(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthMember>,
    Json(request): Json<CreatePlanRequest>,
) -> Result<Json<PlanView>> {
    request
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let session = session(&state, &auth)?;
    let (id, plan) = state.plans.create(
        &session,
        NewPlan {
            details: request.details,
            scheduled_time: request.scheduled_time,
            capacity: request.capacity,
        },
    )?;

    Ok(Json(PlanView::new(id, plan)))
}

async fn delete_plan(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthMember>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let session = session(&state, &auth)?;
    state.plans.delete(&id, &session)?;
    Ok(Json(serde_json::json!({ "success": true })))
}

async fn join_plan(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthMember>,
    Path(id): Path<String>,
) -> Result<Json<PlanView>> {
    let session = session(&state, &auth)?;
    let plan = state.plans.join(&id, &session)?;
    Ok(Json(PlanView::new(id, plan)))
}

async fn leave_plan(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthMember>,
    Path(id): Path<String>,
) -> Result<Json<PlanView>> {
    let session = session(&state, &auth)?;
    let plan = state.plans.leave(&id, &session)?;
    Ok(Json(PlanView::new(id, plan)))
}

// ─── Chat ────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct MessageView {
    pub id: String,
    #[serde(flatten)]
    pub message: ChatMessage,
}

async fn get_messages(
    State(state): State<Arc<AppState>>,
    Extension(_auth): Extension<AuthMember>,
    Path(id): Path<String>,
) -> Result<Json<Vec<MessageView>>> {
    let messages = state.chat.messages(&id)?;
    Ok(Json(
        messages
            .into_iter()
            .map(|(id, message)| MessageView { id, message })
            .collect(),
    ))
}

#[derive(Deserialize, Validate)]
struct SendMessageRequest {
    #[validate(length(min = 1, max = 2000))]
    text: String,
}

async fn send_message(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthMember>,
    Path(id): Path<String>,
    Json(request): Json<SendMessageRequest>,
) -> Result<Json<ChatMessage>> {
    request
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let session = session(&state, &auth)?;
    let message = state.chat.send(&id, &session, &request.text)?;
    Ok(Json(message))
}

// ─── Payment handoff ─────────────────────────────────────────

#[derive(Deserialize)]
struct PaymentLinkQuery {
    amount: f64,
    #[serde(default)]
    note: Option<String>,
}

#[derive(Serialize)]
pub struct PaymentLinkResponse {
    pub url: String,
}

/// Construct a payment deep link towards the plan creator. The system
/// only hands off the URI; no completion is ever observed.
async fn get_payment_link(
    State(state): State<Arc<AppState>>,
    Extension(_auth): Extension<AuthMember>,
    Path(id): Path<String>,
    Query(params): Query<PaymentLinkQuery>,
) -> Result<Json<PaymentLinkResponse>> {
    let plan = state.plans.get(&id)?;
    let handle = plan.creator_payment_handle.as_deref().ok_or_else(|| {
        AppError::NotFound("Creator has no payment handle".to_string())
    })?;

    let note = params
        .note
        .unwrap_or_else(|| plan.details.context_label());
    let url = payments::payment_link(handle, &plan.creator_name, params.amount, &note);

    Ok(Json(PaymentLinkResponse { url }))
}

// ─── Notifications ───────────────────────────────────────────

#[derive(Serialize)]
pub struct NotificationView {
    pub id: String,
    #[serde(flatten)]
    pub notification: Notification,
}

async fn get_notifications(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthMember>,
) -> Result<Json<Vec<NotificationView>>> {
    let session = session(&state, &auth)?;
    let notifications = state.members.notifications(&session)?;
    Ok(Json(
        notifications
            .into_iter()
            .map(|(id, notification)| NotificationView { id, notification })
            .collect(),
    ))
}

async fn mark_notification_read(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthMember>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let session = session(&state, &auth)?;
    state.members.mark_read(&session, &id)?;
    Ok(Json(serde_json::json!({ "success": true })))
}

// ─── Leaderboard ─────────────────────────────────────────────

async fn get_leaderboard(
    State(state): State<Arc<AppState>>,
    Extension(_auth): Extension<AuthMember>,
) -> Result<Json<Vec<LeaderboardEntry>>> {
    Ok(Json(state.members.leaderboard()?))
}

// ─── Profile ─────────────────────────────────────────────────

#[derive(Serialize)]
pub struct ProfileResponse {
    pub member_id: String,
    #[serde(flatten)]
    pub profile: MemberProfile,
}

async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthMember>,
) -> Result<Json<ProfileResponse>> {
    let profile = state.members.profile(&auth.member_id)?;
    Ok(Json(ProfileResponse {
        member_id: auth.member_id,
        profile,
    }))
}

#[derive(Deserialize)]
struct UpdateProfileRequest {
    display_name: Option<String>,
    phone: Option<String>,
    address: Option<String>,
    payment_handle: Option<String>,
}

async fn update_me(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthMember>,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>> {
    let session = session(&state, &auth)?;
    let profile = state.members.update_profile(
        &session,
        ProfileEdit {
            display_name: request.display_name,
            phone: request.phone,
            address: request.address,
            payment_handle: request.payment_handle,
        },
    )?;

    Ok(Json(ProfileResponse {
        member_id: auth.member_id,
        profile,
    }))
}

// ─── Push permission ─────────────────────────────────────────

#[derive(Serialize)]
pub struct PushPermissionResponse {
    pub granted: bool,
}

/// Explicitly request push delivery; without it the channel degrades
/// silently.
async fn request_push_permission(
    State(state): State<Arc<AppState>>,
    Extension(_auth): Extension<AuthMember>,
) -> Json<PushPermissionResponse> {
    let granted = state.push.request_permission();
    Json(PushPermissionResponse { granted })
}
