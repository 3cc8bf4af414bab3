//! HTTP server setup and request handlers.
//!
//! # Responsibilities
//! - Create the Axum router with page, submission, and static routes
//! - Wire up middleware (tracing, request timeout)
//! - Map bridge results onto redirects and error pages
//! - Serve with graceful shutdown

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tower_http::{services::ServeDir, timeout::TimeoutLayer, trace::TraceLayer};

use crate::bridge::{Bridge, BridgeError};
use crate::config::RelayConfig;
use crate::lifecycle::Shutdown;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    bridge: Arc<Bridge>,
    template_dir: Arc<PathBuf>,
}

impl AppState {
    /// Render a template file as an HTML response.
    async fn page(&self, name: &str, status: StatusCode) -> Response {
        let path = self.template_dir.join(name);
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => (status, Html(contents)).into_response(),
            Err(e) => {
                tracing::error!(template = name, error = %e, "Failed to read template");
                (StatusCode::INTERNAL_SERVER_ERROR, "template unavailable").into_response()
            }
        }
    }
}

/// HTTP server for the relay front end.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: &RelayConfig) -> Self {
        let state = AppState {
            bridge: Arc::new(Bridge::new(config.bridge.clone())),
            template_dir: Arc::new(PathBuf::from(&config.http.template_dir)),
        };

        let static_files = ServeDir::new(&config.http.static_dir)
            .not_found_service(get(not_found).with_state(state.clone()));

        let router = Router::new()
            .route("/", get(home_page))
            .route("/message", get(message_page).post(submit_message))
            .fallback_service(static_files)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.http.request_timeout_secs,
            )))
            .layer(TraceLayer::new_for_http());

        Self { router }
    }

    /// Run the server on the given listener until shutdown.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let mut shutdown_rx = shutdown.subscribe();
        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn home_page(State(state): State<AppState>) -> Response {
    state.page("index.html", StatusCode::OK).await
}

async fn message_page(State(state): State<AppState>) -> Response {
    state.page("message.html", StatusCode::OK).await
}

async fn not_found(State(state): State<AppState>) -> Response {
    state.page("error.html", StatusCode::NOT_FOUND).await
}

/// Relay a form submission and redirect home on success.
async fn submit_message(State(state): State<AppState>, body: Bytes) -> Response {
    match state.bridge.submit(&body).await {
        Ok(()) => Redirect::to("/").into_response(),
        Err(e @ BridgeError::MalformedSubmission(_)) => {
            tracing::warn!(error = %e, "Rejected form submission");
            state.page("error.html", StatusCode::BAD_REQUEST).await
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to relay submission");
            state.page("error.html", StatusCode::BAD_GATEWAY).await
        }
    }
}
