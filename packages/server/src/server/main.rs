// Main entry point for API server

use anyhow::{Context, Result};
use harvester::LearningScheduler;
use server_core::{
    server::{build_app, build_harvester},
    Config,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,harvester=debug,server_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Knowledge Harvester API");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(
        knowledge_file = %config.harvester.knowledge_file.display(),
        interval_secs = config.harvester.learning_interval.as_secs(),
        "Configuration loaded"
    );

    // Build harvester (loads the knowledge base)
    let harvester = build_harvester(&config);

    // Start background learning loop
    let scheduler = LearningScheduler::new(harvester.clone());
    tokio::spawn(async move {
        scheduler.run().await;
        tracing::error!("Learning scheduler exited");
    });

    // Build application
    let app = build_app(harvester);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Learning status: http://localhost:{}/api/learning/status", config.port);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
