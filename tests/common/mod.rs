// SPDX-License-Identifier: MIT

use squadup::config::Config;
use squadup::models::Principal;
use squadup::routes::create_router;
use squadup::services::{
    ChatService, LogPush, MemberService, PlanService, TokenIdentityProvider,
};
use squadup::session::SessionContext;
use squadup::store::MemoryStore;
use squadup::AppState;
use std::sync::Arc;

/// Create a test app with an empty in-memory store.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    let store = MemoryStore::new();

    let state = Arc::new(AppState {
        plans: PlanService::new(store.clone()),
        chat: ChatService::new(store.clone()),
        members: MemberService::new(store.clone()),
        identity: Arc::new(TokenIdentityProvider::new(&config.identity_provider_secret)),
        push: Arc::new(LogPush::new()),
        store,
        config,
    });

    (create_router(state.clone()), state)
}

/// Create a fresh store with its services, bypassing the HTTP layer.
#[allow(dead_code)]
pub fn test_services() -> (MemoryStore, PlanService, ChatService, MemberService) {
    let store = MemoryStore::new();
    (
        store.clone(),
        PlanService::new(store.clone()),
        ChatService::new(store.clone()),
        MemberService::new(store),
    )
}

/// Seed a member profile and return a session for them.
#[allow(dead_code)]
pub fn seed_member(store: &MemoryStore, id: &str, name: &str) -> SessionContext {
    let members = MemberService::new(store.clone());
    members
        .ensure_profile(&Principal {
            id: id.to_string(),
            display_name: name.to_string(),
            email: format!("{}@campus.edu", id),
            avatar_url: None,
        })
        .expect("Failed to seed member profile");

    SessionContext::load(store, id).expect("Failed to load seeded session")
}

/// Current points balance for a member.
#[allow(dead_code)]
pub fn points_of(store: &MemoryStore, id: &str) -> i64 {
    let profile: squadup::models::MemberProfile = store
        .get(squadup::store::collections::USERS, id)
        .expect("store read failed")
        .expect("profile missing");
    profile.points
}
