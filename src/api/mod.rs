//! HTTP API and dashboard
//!
//! ## Endpoints
//!
//! - `GET /api/status` - Current status, open downtime and last sample
//! - `GET /api/stats` - Uptime statistics over the last 24 hours
//! - `GET /api/downtimes?limit=N` - Closed downtime intervals, newest first
//! - `GET /api/config` - Runtime configuration
//! - `POST /api/config` - Update runtime configuration
//! - `GET /api/info` - Dashboard details (first target, LAN address, port)
//! - `GET /api/health` - Liveness plus storage health
//!
//! With `web-dashboard`, the static directory is served at `/`.

#[cfg(feature = "api")]
pub mod error;
#[cfg(feature = "api")]
pub mod routes;
#[cfg(feature = "api")]
pub mod state;
#[cfg(feature = "api")]
pub mod types;

#[cfg(feature = "api")]
pub use error::{ApiError, ApiResult};
#[cfg(feature = "api")]
pub use state::ApiState;
#[cfg(feature = "api")]
pub use types::{DowntimesResponse, HealthResponse, InfoResponse, StatusResponse};

#[cfg(feature = "api")]
use axum::{Router, routing::get};
use std::net::SocketAddr;
use std::path::PathBuf;
#[cfg(feature = "api")]
use tracing::info;

pub const DEFAULT_PORT: u16 = 9000;

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Bind address (e.g., "0.0.0.0:9000")
    pub bind_addr: SocketAddr,

    /// Enable CORS for the dashboard
    pub enable_cors: bool,

    /// Directory served at `/` (web-dashboard feature)
    pub static_dir: PathBuf,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            enable_cors: true,
            static_dir: PathBuf::from("static"),
        }
    }
}

/// Build the router without binding a socket
#[cfg(feature = "api")]
pub fn router(config: &ApiConfig, state: ApiState) -> Router {
    use tower_http::cors::{Any, CorsLayer};
    use tower_http::trace::TraceLayer;

    let mut app = Router::new()
        .route("/api/status", get(routes::status::get_status))
        .route("/api/stats", get(routes::stats::get_stats))
        .route("/api/downtimes", get(routes::downtimes::get_downtimes))
        .route(
            "/api/config",
            get(routes::config::get_config).post(routes::config::update_config),
        )
        .route("/api/info", get(routes::info::get_info))
        .route("/api/health", get(routes::health::health_check))
        .with_state(state);

    #[cfg(feature = "web-dashboard")]
    {
        use tower_http::services::ServeDir;

        if config.static_dir.is_dir() {
            info!("serving dashboard from {}", config.static_dir.display());
            app = app.fallback_service(ServeDir::new(&config.static_dir));
        } else {
            info!(
                "dashboard directory not found at {}",
                config.static_dir.display()
            );
        }
    }

    app = app.layer(TraceLayer::new_for_http());

    if config.enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }

    app
}

/// Spawn the API server
///
/// Binds, then serves in a background task. Returns the bound address.
#[cfg(feature = "api")]
pub async fn spawn_api_server(config: ApiConfig, state: ApiState) -> anyhow::Result<SocketAddr> {
    use anyhow::Context;

    info!("starting API server on {}", config.bind_addr);

    let app = router(&config, state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    let addr = listener.local_addr()?;

    info!("API server listening on {}", addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("API server error: {}", e);
        }
    });

    Ok(addr)
}
