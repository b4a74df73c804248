// SPDX-License-Identifier: MIT

//! SquadUp API Server
//!
//! Coordinates small group plans: create, join and leave plans with
//! bounded capacity, chat within a plan, and watch points move.

use squadup::{
    config::Config,
    services::{ChatService, LogPush, MemberService, PlanService, TokenIdentityProvider},
    store::MemoryStore,
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting SquadUp API");

    // Initialize the document store
    let store = MemoryStore::new();

    let identity = Arc::new(TokenIdentityProvider::new(&config.identity_provider_secret));
    tracing::info!("Identity provider initialized");

    let push = Arc::new(LogPush::new());

    // Build shared state
    let state = Arc::new(AppState {
        plans: PlanService::new(store.clone()),
        chat: ChatService::new(store.clone()),
        members: MemberService::new(store.clone()),
        identity,
        push,
        store,
        config: config.clone(),
    });

    // Build router
    let app = squadup::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("squadup=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
