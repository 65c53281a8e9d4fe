//! Brokerdesk HTTP Server Binary
//!
//! Main entry point for the brokerage REST API. It initializes the
//! repository and the auth provider, sets up the HTTP router, and starts
//! serving requests.
//!
//! # Usage
//!
//! ```bash
//! # In-memory repository and auth (default)
//! cargo run --bin brokerdesk-server
//!
//! # Hosted backend for data and auth
//! BACKEND_URL=https://project.example.co BACKEND_ANON_KEY=... \
//!   cargo run --bin brokerdesk-server
//! ```
//!
//! # Environment Variables
//!
//! - `HOST`: Server host (default: 0.0.0.0)
//! - `PORT`: Server port (default: 8080)
//! - `BACKEND_URL`: Hosted backend base URL; enables the remote auth provider
//! - `REPOSITORY_TYPE`: `local` or `rest`
//! - `RUST_LOG`: Log filter (default: info)

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use brokerdesk::auth::{AuthProvider, LocalAuthProvider};
use brokerdesk::db;
use brokerdesk::http::{create_router, AppState};

#[cfg(feature = "rest-repo")]
fn auth_provider() -> anyhow::Result<Arc<dyn AuthProvider>> {
    use brokerdesk::auth::RemoteAuthProvider;

    if env::var("BACKEND_URL").is_err() {
        info!("BACKEND_URL not set, using in-memory auth");
        return Ok(Arc::new(LocalAuthProvider::new()));
    }
    let config = db::RestConfig::from_env().map_err(anyhow::Error::msg)?;
    let provider = RemoteAuthProvider::new(config)?;
    Ok(Arc::new(provider))
}

#[cfg(not(feature = "rest-repo"))]
fn auth_provider() -> anyhow::Result<Arc<dyn AuthProvider>> {
    Ok(Arc::new(LocalAuthProvider::new()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("Starting brokerdesk HTTP server");

    // Initialize global repository once and reuse it across the app
    db::init_repository()?;
    let repository = Arc::clone(db::get_repository()?);
    info!("Repository initialized successfully");

    let state = AppState::new(repository, auth_provider()?);
    let app = create_router(state);

    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(8080);
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

    info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
