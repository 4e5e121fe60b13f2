use gamification::{
    api,
    catalog::Catalog,
    config::EngineConfig,
    engine::GamificationEngine,
    leaderboard::{spawn_refresh_task, LeaderboardScope},
    shared::AppState,
    storage::InMemoryStorage,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gamification=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run().await {
        error!(error = %e, "Gamification server stopped");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting gamification server");

    let config = EngineConfig::from_env();
    let catalog = match &config.catalog_path {
        Some(path) => Catalog::from_path(path)?,
        None => Catalog::builtin()?,
    };
    let refresh_interval = config.leaderboard_refresh_interval;

    // In-memory storage; any `Storage` implementation plugs in here
    let storage = Arc::new(InMemoryStorage::new());
    let engine = Arc::new(
        GamificationEngine::builder(storage)
            .with_catalog(catalog)
            .with_config(config)
            .build()?,
    );

    let refresh_task = spawn_refresh_task(
        engine.leaderboard_service(),
        refresh_interval,
        LeaderboardScope::all(),
    );

    let app = api::router(AppState::new(engine.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
    info!("Server running on http://localhost:3000");

    let served = axum::serve(listener, app).await;

    refresh_task.abort();
    engine.shutdown().await;

    served?;
    Ok(())
}
