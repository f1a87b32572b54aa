//! Application startup and lifecycle management.
//!
//! Wires the relay route, the ambient endpoints (health, readiness, metrics)
//! and the middleware stack into one HTTP server.

use crate::config::RelayConfig;
use crate::handlers::{
    health::{health_check, readiness_check},
    metrics::metrics,
    relay::{preflight, reject_method, relay},
};
use crate::lore::LoreStore;
use crate::middleware::{cors_headers_middleware, metrics_middleware};
use crate::services::metrics::init_metrics;
use crate::services::providers::gemini::{GeminiConfig, GeminiTextProvider};
use crate::services::TextProvider;
use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::request_id_middleware;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub lore: Arc<LoreStore>,
    pub text_provider: Arc<dyn TextProvider>,
}

impl AppState {
    pub fn new(lore: LoreStore, text_provider: Arc<dyn TextProvider>) -> Self {
        Self {
            lore: Arc::new(lore),
            text_provider,
        }
    }

    /// Build the production state: Gemini provider plus the configured lore source.
    pub fn from_config(config: &RelayConfig) -> Result<Self, AppError> {
        let text_provider: Arc<dyn TextProvider> = Arc::new(
            GeminiTextProvider::new(GeminiConfig::from(&config.gemini)).map_err(|e| {
                tracing::error!("Failed to initialize Gemini provider: {}", e);
                AppError::config(e)
            })?,
        );
        tracing::info!(
            model = %config.gemini.model,
            "Initialized Gemini text provider"
        );

        let lore_client = reqwest::Client::builder().build().map_err(|e| {
            AppError::InternalError(anyhow::anyhow!("Failed to create lore HTTP client: {}", e))
        })?;
        let lore = LoreStore::new(config.lore.source.clone(), lore_client);
        tracing::info!(source = lore.source().kind(), "Configured lore source");

        Ok(Self::new(lore, text_provider))
    }
}

/// Build the HTTP router for the given state.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/",
            post(relay).options(preflight).fallback(reject_method),
        )
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/metrics", get(metrics))
        .with_state(state)
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(cors_headers_middleware))
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: RelayConfig) -> Result<Self, AppError> {
        let state = AppState::from_config(&config)?;
        Self::with_state(&config, state).await
    }

    /// Build the application around a pre-assembled state.
    pub async fn with_state(config: &RelayConfig, state: AppState) -> Result<Self, AppError> {
        init_metrics();

        // Port 0 = random port for testing
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Relay service listening on port {}", port);

        Ok(Self {
            port,
            listener,
            router: build_router(state),
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Run the application until a shutdown signal arrives.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
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
                tracing::error!("Failed to install SIGTERM handler: {}", e);
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

    tracing::info!("Shutdown signal received");
}
