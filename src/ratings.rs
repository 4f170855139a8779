//! Minimal Codeforces client: only `user.info` is used, to verify a handle
//! and read its rating, rank and avatar.
//!
//! Calls are instrumented with the handle and latency; failures are returned
//! as `RatingsError` and turned into user-visible strings by the caller.

use std::time::{Duration, Instant};

use reqwest::header::USER_AGENT;
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::domain::RatingProfile;

pub const DEFAULT_BASE_URL: &str = "https://codeforces.com/api";

#[derive(Debug, Error)]
pub enum RatingsError {
  #[error("{0}")]
  Network(#[from] reqwest::Error),
  #[error("Handle not found")]
  HandleNotFound,
  /// FAILED answer that is not about the handle, e.g. "Call limit exceeded".
  #[error("{0}")]
  Api(String),
}

#[derive(Clone)]
pub struct RatingsClient {
  pub client: reqwest::Client,
  pub base_url: String,
}

#[derive(Deserialize)]
struct UserInfoResponse {
  status: String,
  #[serde(default)]
  result: Option<Vec<UserInfo>>,
  #[serde(default)]
  comment: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserInfo {
  handle: String,
  rating: Option<i32>,
  rank: Option<String>,
  max_rating: Option<i32>,
  #[serde(default)]
  title_photo: String,
}

impl RatingsClient {
  pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, RatingsError> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    Ok(Self { client, base_url: base_url.into().trim_end_matches('/').to_string() })
  }

  /// Look up one handle. A FAILED answer naming the handle or an empty result
  /// means it does not exist; any other FAILED answer is an `Api` error.
  #[instrument(level = "info", skip(self), fields(%handle))]
  pub async fn user_info(&self, handle: &str) -> Result<RatingProfile, RatingsError> {
    let url = format!("{}/user.info", self.base_url);
    let started = Instant::now();
    let res = self
      .client
      .get(&url)
      .query(&[("handles", handle)])
      .header(USER_AGENT, "codestreak-backend/0.1")
      .send()
      .await?;

    // Codeforces answers unknown handles with HTTP 400 and status FAILED.
    let body: UserInfoResponse = res.json().await?;
    info!(target: "codestreak", status = %body.status, elapsed_ms = started.elapsed().as_millis() as u64, "Ratings lookup");
    if body.status != "OK" {
      let comment = body.comment.unwrap_or_default();
      warn!(target: "codestreak", status = %body.status, %comment, "Ratings lookup failed");
      return Err(if comment.contains("not found") {
        RatingsError::HandleNotFound
      } else {
        RatingsError::Api(if comment.is_empty() { body.status } else { comment })
      });
    }
    let user = body
      .result
      .and_then(|users| users.into_iter().next())
      .ok_or(RatingsError::HandleNotFound)?;

    Ok(RatingProfile {
      handle: user.handle,
      rating: user.rating,
      rank: user.rank,
      max_rating: user.max_rating,
      avatar: user.title_photo,
    })
  }
}
