//! Core behaviors shared by the HTTP and WebSocket handlers.
//!
//! Each function is one client-facing operation; failures are caught here
//! and turned into `Resource::Error` so nothing propagates to the transport:
//!   - daily question, question by id, bookmarks
//!   - solution submission (cache progress + streak update)
//!   - home summary (name, streak, weekly strip)
//!   - profile and Codeforces handle linking

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, instrument, warn};

use crate::domain::{Question, Resource, User};
use crate::protocol::{BookmarkOut, HomeOut, ProfileOut, SubmissionIn, SubmissionOut};
use crate::ratings::RatingsError;
use crate::state::AppState;
use crate::streak::weekly_progress;
use crate::util::{display_name, is_meaningful_submission, trunc_for_log};

#[instrument(level = "info", skip(state))]
pub async fn daily_question(state: &AppState, now: DateTime<Utc>) -> Resource<Question> {
  state.questions.get_daily_question(now).await
}

#[instrument(level = "info", skip(state))]
pub fn question_by_id(state: &AppState, id: &str) -> Resource<Question> {
  match state.questions.get_question(id) {
    Ok(Some(q)) => Resource::success(q),
    Ok(None) => Resource::error(format!("Unknown question: {id}")),
    Err(e) => {
      error!(target: "question", %id, error = %e, "Cache read failed");
      Resource::error(e.to_string())
    }
  }
}

#[instrument(level = "info", skip(state))]
pub fn toggle_bookmark(state: &AppState, id: &str) -> Resource<BookmarkOut> {
  match state.questions.toggle_bookmark(id) {
    Ok(Some(is_bookmarked)) => {
      info!(target: "question", %id, is_bookmarked, "Bookmark toggled");
      Resource::success(BookmarkOut { question_id: id.to_string(), is_bookmarked })
    }
    Ok(None) => Resource::error(format!("Unknown question: {id}")),
    Err(e) => {
      error!(target: "question", %id, error = %e, "Bookmark toggle failed");
      Resource::error(e.to_string())
    }
  }
}

#[instrument(level = "info", skip(state))]
pub fn saved_questions(state: &AppState) -> Resource<Vec<Question>> {
  match state.questions.saved_questions() {
    Ok(list) => Resource::success(list),
    Err(e) => {
      error!(target: "question", error = %e, "Listing bookmarks failed");
      Resource::error(e.to_string())
    }
  }
}

/// Submit a solution for a cached question.
///
/// Blank code or untouched starter code is not accepted and writes nothing.
/// Otherwise the cached question is marked solved with the code and, for a
/// known user, the streak is updated. The canonical solution is revealed
/// once accepted, even if the streak write failed.
#[instrument(level = "info", skip(state, body, now), fields(question_id = %body.question_id, uid = ?body.uid, code_len = body.code.len()))]
pub async fn submit_solution(state: &AppState, body: &SubmissionIn, now: DateTime<Utc>) -> Resource<SubmissionOut> {
  let question = match state.questions.get_question(&body.question_id) {
    Ok(Some(q)) => q,
    Ok(None) => return Resource::error(format!("Unknown question: {}", body.question_id)),
    Err(e) => {
      error!(target: "question", id = %body.question_id, error = %e, "Cache read failed");
      return Resource::error(e.to_string());
    }
  };

  if !is_meaningful_submission(&body.code, &question.starter_code) {
    debug!(target: "question", id = %question.id, "Submission ignored: blank or starter code");
    return Resource::success(SubmissionOut { accepted: false, solution_code: None, user: None });
  }
  debug!(target: "question", id = %question.id, code = %trunc_for_log(&body.code, 120), "Submission accepted");

  if let Err(e) = state.questions.mark_solved(&question.id, &body.code) {
    error!(target: "question", id = %question.id, error = %e, "Marking question solved failed");
  }

  let user = match body.uid.as_deref() {
    Some(uid) => state.users.record_solve(uid, &question.id, now).await,
    None => None,
  };

  Resource::success(SubmissionOut { accepted: true, solution_code: Some(question.solution_code), user })
}

#[instrument(level = "info", skip(state, email))]
pub async fn register_user(state: &AppState, uid: &str, email: &str) -> Resource<User> {
  if uid.trim().is_empty() || email.trim().is_empty() {
    return Resource::error("Please fill in all fields");
  }
  match state.users.register(uid, email.trim()).await {
    Ok(user) => Resource::success(user),
    Err(e) => {
      error!(target: "streak", %uid, error = %e, "Registering user failed");
      Resource::error(e.to_string())
    }
  }
}

#[instrument(level = "info", skip(state, now))]
pub async fn home(state: &AppState, uid: &str, now: DateTime<Utc>) -> Resource<HomeOut> {
  let daily_question = state.questions.get_daily_question(now).await.into_data();
  let (name, streak, weekly) = match state.users.fetch_user(uid).await {
    Ok(Some(user)) => (
      display_name(&user.email),
      user.current_streak,
      weekly_progress(&user, now, state.offset),
    ),
    Ok(None) => ("Coder".to_string(), 0, [false; 7]),
    Err(e) => {
      warn!(target: "streak", %uid, error = %e, "User unavailable; showing defaults");
      ("Coder".to_string(), 0, [false; 7])
    }
  };
  Resource::success(HomeOut { name, streak, daily_question, weekly_progress: weekly })
}

/// Profile with Codeforces stats when a handle is linked. A failed stats
/// lookup is silent: the profile is returned without them.
#[instrument(level = "info", skip(state))]
pub async fn profile(state: &AppState, uid: &str) -> Resource<ProfileOut> {
  let user = match state.users.get_user(uid).await {
    Resource::Success { data } => data,
    Resource::Error { message } => return Resource::error(message),
    Resource::Loading => return Resource::Loading,
  };

  let codeforces = match user.codeforces_handle.as_deref().filter(|h| !h.trim().is_empty()) {
    Some(handle) => match state.ratings.user_info(handle).await {
      Ok(profile) => Some(profile),
      Err(e) => {
        warn!(target: "codestreak", %uid, %handle, error = %e, "Silent ratings fetch failed");
        None
      }
    },
    None => None,
  };
  Resource::success(ProfileOut { user, codeforces })
}

/// Verify a Codeforces handle and save it on the user.
#[instrument(level = "info", skip(state))]
pub async fn link_codeforces(state: &AppState, uid: &str, handle: &str) -> Resource<ProfileOut> {
  let handle = handle.trim();
  if handle.is_empty() {
    return Resource::error("Handle must not be empty");
  }
  let user = match state.users.get_user(uid).await {
    Resource::Success { data } => data,
    Resource::Error { message } => return Resource::error(message),
    Resource::Loading => return Resource::Loading,
  };

  let rating = match state.ratings.user_info(handle).await {
    Ok(r) => r,
    Err(RatingsError::HandleNotFound) => return Resource::error("Handle not found"),
    Err(e @ (RatingsError::Network(_) | RatingsError::Api(_))) => {
      warn!(target: "codestreak", %uid, %handle, error = %e, "Handle verification failed");
      return Resource::error(format!("Network Error: {e}"));
    }
  };

  if let Err(e) = state.users.set_codeforces_handle(uid, Some(&rating.handle)).await {
    error!(target: "codestreak", %uid, error = %e, "Saving handle failed");
    return Resource::error(format!("Network Error: {e}"));
  }
  info!(target: "codestreak", %uid, handle = %rating.handle, rating = ?rating.rating, "Codeforces handle linked");

  let user = User { codeforces_handle: Some(rating.handle.clone()), ..user };
  Resource::success(ProfileOut { user, codeforces: Some(rating) })
}
