//! `VitrineServer` — Axum HTTP + WebSocket server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch};
use axum::{Json, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use vitrine_core::ConnectionId;
use vitrine_store::Store;

use crate::config::ServerConfig;
use crate::health::{self, HealthResponse};
use crate::metrics;
use crate::routes;
use crate::shutdown::ShutdownCoordinator;
use crate::ws::engine::FanoutEngine;
use crate::ws::rooms::RoomBroadcaster;
use crate::ws::session::run_ws_session;

/// Shared state accessible from Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Session and product store.
    pub store: Store,
    /// The fan-out engine.
    pub engine: Arc<FanoutEngine>,
    /// Transport-layer room broadcaster.
    pub rooms: Arc<RoomBroadcaster>,
    /// Shutdown coordinator.
    pub shutdown: Arc<ShutdownCoordinator>,
    /// When the server started.
    pub start_time: Instant,
    /// Prometheus handle for the `/metrics` endpoint.
    pub metrics: PrometheusHandle,
    /// Server configuration.
    pub config: ServerConfig,
}

/// The vitrine live-shopping server.
pub struct VitrineServer {
    config: ServerConfig,
    state: AppState,
}

impl VitrineServer {
    /// Create a new server over the given store.
    #[must_use]
    pub fn new(config: ServerConfig, store: Store, metrics: PrometheusHandle) -> Self {
        let state = AppState {
            engine: Arc::new(FanoutEngine::new(store.clone())),
            store,
            rooms: Arc::new(RoomBroadcaster::new()),
            shutdown: Arc::new(ShutdownCoordinator::new()),
            start_time: Instant::now(),
            metrics,
            config: config.clone(),
        };
        Self { config, state }
    }

    /// Build the Axum router with all routes.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .route("/metrics", get(metrics_handler))
            .route("/ws", get(ws_handler))
            .route(
                "/api/products",
                get(routes::products::list).post(routes::products::create),
            )
            .route(
                "/api/products/{id}",
                get(routes::products::get_one)
                    .put(routes::products::update)
                    .delete(routes::products::delete),
            )
            .route(
                "/api/sessions",
                get(routes::sessions::list).post(routes::sessions::create),
            )
            .route("/api/sessions/live", get(routes::sessions::live))
            .route(
                "/api/sessions/{id}",
                get(routes::sessions::get_one).delete(routes::sessions::delete),
            )
            .route(
                "/api/sessions/{id}/status",
                patch(routes::sessions::update_status),
            )
            .route(
                "/api/sessions/{id}/analytics",
                patch(routes::sessions::update_analytics),
            )
            .with_state(self.state.clone())
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
    }

    /// Bind and serve. Returns the bound address and the serve task; the
    /// task drains on the shutdown coordinator's token.
    pub async fn listen(&self) -> std::io::Result<(SocketAddr, JoinHandle<()>)> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        let local_addr = listener.local_addr()?;

        let router = self.router();
        let token = self.state.shutdown.token();
        let handle = tokio::spawn(async move {
            let serve = axum::serve(listener, router)
                .with_graceful_shutdown(async move { token.cancelled().await });
            if let Err(e) = serve.await {
                error!(error = %e, "server exited with error");
            }
        });

        info!(addr = %local_addr, "vitrine server listening");
        Ok((local_addr, handle))
    }

    /// Get the shared state.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Get the shutdown coordinator.
    pub fn shutdown(&self) -> &Arc<ShutdownCoordinator> {
        &self.state.shutdown
    }

    /// Get the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

/// `GET /health`
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let connections = state.rooms.connection_count().await;
    let active_rooms = state.engine.active_rooms();
    Json(health::health_check(state.start_time, connections, active_rooms))
}

/// `GET /metrics`
async fn metrics_handler(State(state): State<AppState>) -> String {
    metrics::render(&state.metrics)
}

/// `GET /ws` — upgrade to the realtime channel.
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    if state.rooms.connection_count().await >= state.config.max_connections {
        warn!(
            max = state.config.max_connections,
            "rejecting connection: limit reached"
        );
        return (StatusCode::SERVICE_UNAVAILABLE, "connection limit reached").into_response();
    }
    let ws = ws.max_message_size(state.config.max_message_size);
    ws.on_upgrade(move |socket| {
        run_ws_session(
            socket,
            ConnectionId::new(),
            state.engine.clone(),
            state.rooms.clone(),
            state.config.clone(),
        )
    })
}
