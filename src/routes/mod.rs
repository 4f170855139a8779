//! Router assembly: HTTP endpoints, WebSocket user feed, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;
pub mod ws;

/// Build the application router with:
/// - REST-ish API under `/api/v1/...`
/// - live user snapshots at `/ws/users/:uid`
/// - CORS (allow any origin/method/headers)
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // WebSocket
        .route("/ws/users/:uid", get(ws::ws_user_feed))
        // HTTP API
        .route("/api/v1/health", get(http::http_health))
        .route("/api/v1/question/daily", get(http::http_get_daily))
        .route("/api/v1/questions/:id", get(http::http_get_question))
        .route("/api/v1/questions/:id/bookmark", post(http::http_post_bookmark))
        .route("/api/v1/bookmarks", get(http::http_get_bookmarks))
        .route("/api/v1/submissions", post(http::http_post_submission))
        .route("/api/v1/users/:uid", put(http::http_put_user).get(http::http_get_user))
        .route("/api/v1/users/:uid/home", get(http::http_get_home))
        .route("/api/v1/users/:uid/profile", get(http::http_get_profile))
        .route("/api/v1/users/:uid/codeforces", post(http::http_post_codeforces))
        // State + CORS + HTTP tracing
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}
