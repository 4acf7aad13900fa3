/// Server setup and initialization
///
/// Wires together the row store, services, activity ledger, and HTTP
/// routes. Provides the main application factory function for creating the
/// Axum app.

use std::sync::Arc;

use anyhow::Result;
use axum::{routing::get, Router};
use tokio::net::TcpListener;

use crate::{
    activity::ActivityLedger,
    ai::SopGenerator,
    api::{self, AppState},
    comment::CommentService,
    config::Config,
    org::{OrgService, UserService},
    store::{EntityStore, InMemoryRowStore, RestRowStore, RowStore},
    workflow::WorkflowService,
};

/// Create the main Axum application with all routes
///
/// Picks the backing row store from configuration, builds the service
/// layer on top of it, and merges every route group into one router.
pub async fn create_app(config: Config) -> Result<Router> {
    // Pick the row store: hosted when configured, in-memory otherwise
    let rows: Arc<dyn RowStore> = if config.supabase.is_configured() {
        tracing::info!("Using hosted row store at {}", config.supabase.url);
        Arc::new(RestRowStore::new(
            &config.supabase.url,
            config.supabase.api_key(),
        ))
    } else {
        tracing::warn!("SUPABASE_URL not set; falling back to the in-memory store");
        Arc::new(InMemoryRowStore::new())
    };

    let store = EntityStore::new(rows);
    let ledger = ActivityLedger::new(store.clone());

    tracing::info!("Initializing service layer");
    let state = AppState {
        workflows: WorkflowService::new(store.clone(), ledger.clone()),
        comments: CommentService::new(store.clone(), ledger.clone()),
        orgs: OrgService::new(store.clone()),
        users: UserService::new(store),
        activity: ledger,
        generator: SopGenerator::new(&config.ai.api_key, &config.ai.model),
    };

    tracing::info!("Creating HTTP router with all endpoints");
    let app = Router::new()
        // Health check endpoint
        .route("/healthz", get(health_check))
        // Resource routes
        .merge(api::workflows::create_workflow_routes())
        .merge(api::steps::create_step_routes())
        .merge(api::comments::create_comment_routes())
        .merge(api::organizations::create_organization_routes())
        .merge(api::users::create_user_routes())
        .merge(api::activities::create_activity_routes())
        .merge(api::ai::create_ai_routes())
        .with_state(state);

    tracing::info!("Application initialized successfully");

    Ok(app)
}

/// Start the HTTP server with the given configuration
pub async fn start_server(config: Config) -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(true)
        .with_level(true)
        .init();

    tracing::info!("Starting sopflow server...");

    // Create the application
    let app = create_app(config.clone()).await?;

    // Bind to the configured address
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&bind_addr).await?;

    tracing::info!("Server listening on http://{}", bind_addr);

    // Start the server
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

/// Health check endpoint handler
async fn health_check() -> &'static str {
    "ok"
}
