mod app;
mod config;
mod error;
mod handlers;
mod state;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use listenfd::ListenFd;
use signup_auth::{AuthConfig, AuthState, MemoryTabStorage};
use signup_core::auth::SessionRepository;
use tokio::{net::TcpListener, signal};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

use crate::{app::create_app, config::Config, state::AppState};

/// Signup - Create an account with Google or Apple
#[derive(Parser, Debug)]
#[command(name = "signup")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Host address to bind the server to
    #[arg(long, short = 'H', default_value = "0.0.0.0", env = "HOST")]
    host: String,

    /// Port to listen on
    #[arg(long, short, default_value = "3000", env = "PORT")]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "signup=debug,signup_auth=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    // A broken auth config keeps the server up with sign-in disabled.
    let auth_config = match AuthConfig::from_env() {
        Ok(auth_config) => auth_config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid auth configuration");
            AuthConfig::for_base_url(Url::parse(&format!("http://localhost:{}", cli.port))?)
        }
    };

    let sessions = init_sessions(&config).await?;
    let tabs = Arc::new(MemoryTabStorage::new(config.tab_storage_capacity));
    let auth = AuthState::new(auth_config, sessions, tabs).await;

    tracing::info!(
        strategy = %auth.config.strategy,
        ready = auth.is_ready(),
        apple_mock = auth.config.apple_mock_enabled,
        "Auth state initialized"
    );

    #[cfg(feature = "mock")]
    spawn_mock_idp(&config);

    let app = create_app(AppState::new(auth));

    // Auto-reload support via listenfd
    let mut listenfd = ListenFd::from_env();
    let listener = match listenfd.take_tcp_listener(0)? {
        // If we are given a tcp listener on listen fd 0, use that one
        Some(listener) => {
            listener.set_nonblocking(true)?;
            TcpListener::from_std(listener)?
        }
        // Otherwise fall back to CLI-specified host:port
        None => {
            let addr = format!("{}:{}", cli.host, cli.port);
            TcpListener::bind(&addr).await?
        }
    };

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

#[cfg(not(feature = "sqlite"))]
async fn init_sessions(_config: &Config) -> Result<Arc<dyn SessionRepository>> {
    tracing::info!("Using in-memory session storage");
    Ok(Arc::new(signup_auth::InMemorySessionStore::new()))
}

#[cfg(feature = "sqlite")]
async fn init_sessions(config: &Config) -> Result<Arc<dyn SessionRepository>> {
    use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

    let options = SqliteConnectOptions::new()
        .filename(&config.sqlite_path)
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new().connect_with(options).await?;

    let store = signup_auth::SqliteSessionStore::new(pool);
    store.migrate().await?;

    tracing::info!(path = %config.sqlite_path, "Using SQLite session storage");
    Ok(Arc::new(store))
}

/// Run the development IdP next to the app.
#[cfg(feature = "mock")]
fn spawn_mock_idp(config: &Config) {
    let server = signup_auth::mock_idp::MockIdpServer::new(config.mock_idp_port);
    tokio::spawn(async move {
        if let Err(e) = server.run().await {
            tracing::error!(error = %e, "Mock IdP server stopped");
        }
    });
}

/// Wait for shutdown signals (Ctrl+C or SIGTERM).
///
/// A handler that cannot be installed never fires; the other one still can.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down...");
        }
    }
}
