//! HTTP surface
//!
//! `POST /run` with a JSON body:
//!
//! ```text
//! { "repo": "...", "build_dir": "...", "request": {...} | {"_path": "..."},
//!   "config": "Debug", "parallel": 8, "ctest_timeout_sec": 60 }
//! ```
//!
//! Responds 200 with the run result, 400 on malformed input and 500 when
//! the run itself fails.

use crate::settings::{resolve_request, RunSettings};
use qa_orchestrator::RepoLocks;
use serde_json::{json, Value};
use std::convert::Infallible;
use std::net::SocketAddr;
use warp::http::StatusCode;
use warp::hyper::body::Bytes;
use warp::{Filter, Reply};

/// State shared across requests
#[derive(Debug, Clone, Default)]
pub struct ServerState {
    locks: RepoLocks,
}

impl ServerState {
    /// Fresh state with an empty lock table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// All routes
pub fn routes(state: ServerState) -> impl Filter<Extract = (warp::reply::Response,), Error = warp::Rejection> + Clone {
    warp::post()
        .and(warp::path("run"))
        .and(warp::path::end())
        .and(warp::body::bytes())
        .and(with_state(state))
        .and_then(run_handler)
}

/// Serve until the process is stopped
pub async fn serve(addr: SocketAddr, state: ServerState) {
    tracing::info!(%addr, "listening");
    warp::serve(routes(state)).run(addr).await;
}

fn with_state(state: ServerState) -> impl Filter<Extract = (ServerState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

async fn run_handler(body: Bytes, state: ServerState) -> Result<warp::reply::Response, Infallible> {
    let value: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(e) => return Ok(error_reply(StatusCode::BAD_REQUEST, &format!("invalid JSON body: {e}"))),
    };
    let settings: RunSettings = match serde_json::from_value(value.clone()) {
        Ok(settings) => settings,
        Err(e) => return Ok(error_reply(StatusCode::BAD_REQUEST, &format!("invalid run body: {e}"))),
    };
    let request = match resolve_request(value.get("request").unwrap_or(&Value::Null)) {
        Ok(request) => request,
        Err(e) => return Ok(error_reply(StatusCode::BAD_REQUEST, &e.to_string())),
    };

    let outcome = match settings.orchestrator(state.locks.clone()) {
        Ok(orchestrator) => orchestrator.run(&request).await,
        Err(e) => Err(e),
    };

    Ok(match outcome {
        Ok(result) => warp::reply::json(&result).into_response(),
        Err(e) if e.is_configuration_error() => error_reply(StatusCode::BAD_REQUEST, &e.to_string()),
        Err(e) => error_reply(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    })
}

fn error_reply(status: StatusCode, message: &str) -> warp::reply::Response {
    tracing::warn!(status = status.as_u16(), error = message, "run request rejected");
    warp::reply::with_status(warp::reply::json(&json!({ "error": message })), status).into_response()
}
