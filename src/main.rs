use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal::ctrl_c;
#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scavenger_hunt::{
    auth::AuthConfig,
    config::ServerConfig,
    routes,
    state::{session::spawn_session_sweeper, AppState},
    store::{seed::seed_locations, HuntStore, MemoryStore},
    upload::UploadStore,
};

/// How often expired sessions are swept
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist, only log if it's a different issue
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scavenger_hunt=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting scavenger hunt server...");

    let server_config = ServerConfig::from_env();
    let auth_config = AuthConfig::from_env();

    let store: Arc<dyn HuntStore> = match &server_config.data_file {
        Some(path) => match MemoryStore::open(path.clone()).await {
            Ok(store) => Arc::new(store),
            Err(e) => {
                tracing::error!("Failed to open data file {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => Arc::new(MemoryStore::new()),
    };

    let uploads = UploadStore::new(
        server_config.upload_dir.clone(),
        server_config.max_upload_bytes,
    );
    if let Err(e) = uploads.ensure_dir().await {
        tracing::error!(
            "Failed to create upload directory {}: {}",
            uploads.dir().display(),
            e
        );
        return ExitCode::FAILURE;
    }

    let state = Arc::new(AppState::new(store, auth_config, uploads));

    if let Err(e) = state.ensure_admin().await {
        tracing::error!("Failed to create admin user: {}", e);
        return ExitCode::FAILURE;
    }
    match seed_locations(state.store.as_ref()).await {
        Ok(0) => tracing::debug!("Locations already present, skipping seed"),
        Ok(count) => tracing::info!("Seeded {} default locations", count),
        Err(e) => {
            tracing::error!("Failed to seed locations: {}", e);
            return ExitCode::FAILURE;
        }
    }

    spawn_session_sweeper(state.sessions.clone(), SESSION_SWEEP_INTERVAL);

    let app = routes::router(state)
        .fallback_service(ServeDir::new(&server_config.static_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], server_config.port));
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };
    tracing::info!("Listening on http://{}", addr);

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }
    tracing::info!("Server stopped");
    ExitCode::SUCCESS
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
        tracing::info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                tracing::info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
