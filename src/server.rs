//! HTTP API.
//!
//! `POST /api/query`, `GET /api/health` and `GET /api/datasets`, all JSON.
//! The query pipeline uses blocking I/O, so each question runs on tokio's
//! blocking pool.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Value, json};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

use crate::service::{QueryError, QueryService};

const NO_QUESTION: &str = "No question provided";
const APOLOGY: &str = "Sorry, I encountered an error processing your question. Please try again.";

/// Builds the application router around a shared `QueryService`.
pub fn router(service: Arc<QueryService>) -> Router {
    Router::new()
        .route("/api/query", post(handle_query))
        .route("/api/health", get(health_check))
        .route("/api/datasets", get(list_datasets))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

/// Serves the API on `0.0.0.0:{port}` until SIGINT or SIGTERM.
///
/// # Errors
///
/// Fails if the port cannot be bound or the server stops with an I/O error.
pub async fn serve(service: Arc<QueryService>, port: u16) -> Result<()> {
    let address = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port);
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;

    info!(address = %listener.local_addr()?, "Project Samarth API listening");

    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    // SIGINT, i.e. Ctrl+C
    let sigint = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    // SIGTERM, i.e. a plain `kill`
    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    tokio::select! {
        () = sigint => (),
        () = sigterm => (),
    }
    #[cfg(not(unix))]
    sigint.await;
}

async fn handle_query(State(service): State<Arc<QueryService>>, body: Bytes) -> Response {
    let Some(question) = question_from_body(&body) else {
        return bad_request();
    };

    let outcome = tokio::task::spawn_blocking(move || service.ask(&question)).await;

    match outcome {
        Ok(Ok(response)) => Json(response).into_response(),
        Ok(Err(QueryError::EmptyQuestion)) => bad_request(),
        Err(e) => {
            error!(error = %e, "error processing query");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string(), "answer": APOLOGY })),
            )
                .into_response()
        }
    }
}

/// Extracts a non-empty `question` string from a JSON body.
fn question_from_body(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    let question = value.get("question")?.as_str()?;
    (!question.trim().is_empty()).then(|| question.to_string())
}

fn bad_request() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": NO_QUESTION })),
    )
        .into_response()
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "message": "Project Samarth API is running",
    }))
}

async fn list_datasets(State(service): State<Arc<QueryService>>) -> Json<Value> {
    Json(json!({ "datasets": service.datasets() }))
}
