//! Elaboration relay server.
//!
//! Accepts `POST {text}`, attaches the server-held key, forwards the text to
//! the completion API and answers `{elaboration}`. Every response carries
//! permissive CORS headers and `OPTIONS` preflights get an empty `204`.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::set_header::SetResponseHeaderLayer;

use super::upstream::CompletionClient;
use super::RelayError;
use crate::config::RelayConfig;

/// Path the relay listens on
pub const ELABORATE_PATH: &str = "/elaborate";

const INTERNAL_ERROR: &str = "Internal server error";

/// Server state shared across requests.
pub struct RelayState {
    pub upstream: CompletionClient,
}

#[derive(Debug, Deserialize)]
pub struct ElaborateRequest {
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ElaborateResponse {
    pub elaboration: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Relay handle for managing the server lifecycle.
pub struct RelayServer {
    /// Port the server is listening on.
    pub port: u16,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl RelayServer {
    /// Full URL of the elaborate endpoint.
    pub fn endpoint_url(&self) -> String {
        format!("http://127.0.0.1:{}{}", self.port, ELABORATE_PATH)
    }

    /// Stop the server and wait for in-flight requests to finish.
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Err(e) = self.task.await {
            log::error!("Relay server task failed: {}", e);
        }
    }
}

fn error_response(message: String) -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorResponse { error: message })).into_response()
}

/// Answer CORS preflight requests.
async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// Forward one elaboration request upstream.
async fn elaborate(
    State(state): State<Arc<RelayState>>,
    body: Result<Json<ElaborateRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(b) => b,
        Err(e) => {
            log::error!("Relay: bad request body: {}", e);
            return error_response(INTERNAL_ERROR.to_string());
        }
    };

    match state.upstream.elaborate(&request.text).await {
        Ok(elaboration) => (StatusCode::OK, Json(ElaborateResponse { elaboration })).into_response(),
        Err(RelayError::Upstream { status, body }) => {
            log::error!("Relay: completion API error {}: {}", status, body);
            error_response(body)
        }
        Err(e) => {
            log::error!("Relay: {}", e);
            error_response(INTERNAL_ERROR.to_string())
        }
    }
}

/// Build the relay router with CORS headers on every response.
pub fn router(state: Arc<RelayState>) -> Router {
    Router::new()
        .route(ELABORATE_PATH, post(elaborate).options(preflight))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("POST, OPTIONS"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type"),
        ))
        .with_state(state)
}

/// Start the relay server.
///
/// Returns a RelayServer handle that can be used to get the port and stop the server.
pub async fn start_server(config: &RelayConfig) -> Result<RelayServer, RelayError> {
    let upstream = CompletionClient::new(
        config.upstream_url.clone(),
        config.api_key.clone(),
        config.model.clone(),
    )?;
    let app = router(Arc::new(RelayState { upstream }));

    let listener = TcpListener::bind(config.bind).await?;
    let port = listener.local_addr()?.port();

    log::info!("Elaboration relay started on http://{}:{}", config.bind.ip(), port);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                log::info!("Elaboration relay shutting down");
            })
            .await
            .ok();
    });

    Ok(RelayServer {
        port,
        shutdown_tx: Some(shutdown_tx),
        task,
    })
}
