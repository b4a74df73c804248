// SPDX-License-Identifier: MIT

//! SquadUp: coordinate small group plans on a closed campus.
//!
//! This crate provides the backend API for creating and joining plans
//! with bounded capacity, the symmetric point economy around
//! membership changes, per-plan chat and the notification fan-out.

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod session;
pub mod store;
pub mod sync;
pub mod time_utils;

use config::Config;
use services::{ChatService, IdentityProvider, MemberService, PlanService, PushChannel};
use std::sync::Arc;
use store::MemoryStore;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: MemoryStore,
    pub plans: PlanService,
    pub chat: ChatService,
    pub members: MemberService,
    pub identity: Arc<dyn IdentityProvider>,
    pub push: Arc<dyn PushChannel>,
}
