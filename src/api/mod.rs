//! JSON-over-HTTP binding of the management protocol
//!
//! The server plays the role of the protocol engine: it decodes a request,
//! attaches the requester identity taken from the `x-community` header and
//! hands it to the [`crate::handlers`]. Protocol outcomes (including
//! rejected writes) are always `200 OK` with the status in the body; only
//! undecodable requests and infrastructure failures produce HTTP errors.
//!
//! ## Endpoints
//!
//! - `POST /api/v1/get` - read exact identifiers
//! - `POST /api/v1/getnext` - read successors
//! - `POST /api/v1/set` - atomic batch write
//! - `GET /api/v1/health` - Health check
//! - `GET /api/v1/objects` - catalogue with current values

pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod types;

pub use error::{ApiError, ApiResult};
pub use middleware::{COMMUNITY_HEADER, Requester};
pub use state::ApiState;
pub use types::{
    HealthResponse, ObjectInfo, ObjectsResponse, OperationRequest, OperationResponse, WireType,
    WireVarBind,
};

use std::net::SocketAddr;

use axum::{
    Router,
    routing::{get, post},
};
use tokio::sync::watch;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::ApiSettings;

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Bind address (e.g., "0.0.0.0:8161")
    pub bind_addr: SocketAddr,
}

impl From<&ApiSettings> for ApiConfig {
    fn from(settings: &ApiSettings) -> Self {
        Self {
            bind_addr: settings.bind_addr,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::from(&ApiSettings::default())
    }
}

/// Router with every route, without a listener
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/v1/get", post(routes::operations::get))
        .route("/api/v1/getnext", post(routes::operations::get_next))
        .route("/api/v1/set", post(routes::operations::set))
        .route("/api/v1/health", get(routes::health::health_check))
        .route("/api/v1/objects", get(routes::objects::list_objects))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Spawn the API server
///
/// Binds, starts serving in a background task and returns the local address.
/// The server stops accepting requests once `shutdown` turns `true`.
pub async fn spawn_api_server(
    config: ApiConfig,
    state: ApiState,
    mut shutdown: watch::Receiver<bool>,
) -> anyhow::Result<SocketAddr> {
    info!("starting API server on {}", config.bind_addr);

    let app = router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    let addr = listener.local_addr()?;

    info!("API server listening on {}", addr);

    tokio::spawn(async move {
        let stop = async move {
            let _ = shutdown.wait_for(|stop| *stop).await;
            info!("API server shutting down");
        };

        if let Err(e) = axum::serve(listener, app).with_graceful_shutdown(stop).await {
            error!("API server error: {}", e);
        }
    });

    Ok(addr)
}
