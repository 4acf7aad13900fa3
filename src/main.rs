/// Sopflow: workflow and SOP management backend
///
/// Main entry point. Loads environment configuration and starts the HTTP
/// server with the workflow management API.

use sopflow::{config::Config, server::start_server};

/// Application entry point
///
/// The server provides:
/// - Workflow/step/comment management API at /api/v1/*
/// - Organization and user management at /api/v1/organizations, /api/v1/users
/// - AI text-to-workflow conversion at /api/v1/ai/*
/// - Health check at /healthz
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Pick up a local .env before reading configuration
    dotenvy::dotenv().ok();

    let config = Config::default();

    start_server(config).await?;

    Ok(())
}
