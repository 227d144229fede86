//! SchemaScope API server
//!
//! Serves schema exploration, diagnostics, layer storage, layer diffs and
//! migration SQL export over HTTP.

use schemascope_api::config::Settings;
use schemascope_api::layer::LayerStore;
use schemascope_api::routes::create_router;
use schemascope_api::state::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber for structured logging
    init_tracing();

    info!("🚀 Starting SchemaScope API...");

    // Load configuration
    let settings = Settings::load()?;
    info!("📋 Configuration loaded successfully");

    match &settings.import.schema_export_path {
        Some(path) => info!("📄 Schema export: {}", path.display()),
        None => warn!("⚠️  SCHEMA_EXPORT_PATH not set, /api/schema and /api/analyze will return 404"),
    }

    // Open the layer store
    let layers = LayerStore::open(&settings.storage.layers_dir).await?;
    info!("✅ Layer store ready at {}", settings.storage.layers_dir.display());

    let state = Arc::new(AppState::new(settings.clone(), layers));

    // Build the router
    let app = create_router(state, &settings);

    // Create socket address
    let addr = SocketAddr::from((settings.server.host, settings.server.port));

    info!("🌐 Server listening on http://{}", addr);
    info!("");
    info!("📚 API Endpoints:");
    info!("   ─── Schema ───");
    info!("   GET  /api/schema                  - Schema from the configured export");
    info!("   POST /api/schema                  - Validate and normalize a schema");
    info!("   GET  /api/schema/relationships    - Relationship overview");
    info!("");
    info!("   ─── Diagnostics ───");
    info!("   GET  /api/analyze                 - Diagnose the configured export");
    info!("   POST /api/diagnostics             - Diagnose a posted schema");
    info!("   GET  /api/layers/{{id}}/diagnostics - Diagnose a stored layer");
    info!("");
    info!("   ─── Layers ───");
    info!("   POST   /api/layers                - Save a layer");
    info!("   GET    /api/layers                - List layers");
    info!("   GET    /api/layers/summary        - List layer summaries");
    info!("   GET    /api/layers/{{id}}           - Get a layer");
    info!("   DELETE /api/layers/{{id}}           - Delete a layer");
    info!("   POST   /api/diff                  - Compare two layers");
    info!("   POST   /api/export-sql            - Migration SQL for a diff");
    info!("   POST   /api/import-json           - Import an export as a layer");
    info!("");

    // Create TCP listener and serve
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Server shutdown complete");
    Ok(())
}

/// Initialize tracing with structured logging
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,schemascope_api=debug,tower_http=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .compact(),
        )
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("📴 Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            info!("📴 Received terminate signal, initiating graceful shutdown...");
        },
    }
}
