//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Every handler answers 200 with a `Resource` body; failures travel as
//! `{"status":"error"}` rather than HTTP status codes.

use std::sync::Arc;
use axum::{extract::{Path, State}, Json, response::IntoResponse};
use chrono::Utc;
use tracing::{info, instrument};

use crate::domain::Resource;
use crate::protocol::*;
use crate::state::AppState;
use crate::logic::*;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip(state))]
pub async fn http_get_daily(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let res = daily_question(&state, Utc::now()).await;
  if let Resource::Success { data } = &res {
    info!(target: "question", id = %data.id, "HTTP daily question served");
  }
  Json(res)
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_question(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> impl IntoResponse {
  Json(question_by_id(&state, &id))
}

#[instrument(level = "info", skip(state))]
pub async fn http_post_bookmark(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> impl IntoResponse {
  Json(toggle_bookmark(&state, &id))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_bookmarks(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(saved_questions(&state))
}

#[instrument(level = "info", skip(state, body), fields(%body.question_id, code_len = body.code.len()))]
pub async fn http_post_submission(
  State(state): State<Arc<AppState>>,
  Json(body): Json<SubmissionIn>,
) -> impl IntoResponse {
  let res = submit_solution(&state, &body, Utc::now()).await;
  if let Resource::Success { data } = &res {
    info!(target: "question", id = %body.question_id, accepted = data.accepted, "HTTP submission evaluated");
  }
  Json(res)
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_put_user(
  State(state): State<Arc<AppState>>,
  Path(uid): Path<String>,
  Json(body): Json<RegisterIn>,
) -> impl IntoResponse {
  Json(register_user(&state, &uid, &body.email).await)
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_user(State(state): State<Arc<AppState>>, Path(uid): Path<String>) -> impl IntoResponse {
  Json(state.users.get_user(&uid).await)
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_home(State(state): State<Arc<AppState>>, Path(uid): Path<String>) -> impl IntoResponse {
  Json(home(&state, &uid, Utc::now()).await)
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_profile(State(state): State<Arc<AppState>>, Path(uid): Path<String>) -> impl IntoResponse {
  Json(profile(&state, &uid).await)
}

#[instrument(level = "info", skip(state, body), fields(handle = %body.handle))]
pub async fn http_post_codeforces(
  State(state): State<Arc<AppState>>,
  Path(uid): Path<String>,
  Json(body): Json<LinkHandleIn>,
) -> impl IntoResponse {
  Json(link_codeforces(&state, &uid, &body.handle).await)
}
