//! Domain models: questions, users, rating profiles and the tri-state result
//! handed to clients.

use serde::{Deserialize, Serialize};

/// A daily coding question as cached locally and served to clients.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
  pub id: String,
  pub title: String,
  pub description: String,
  pub difficulty: String, // Easy, Medium, Hard
  pub topic: String,
  pub time_estimate: String,
  pub starter_code: String,
  pub solution_code: String,
  #[serde(default)]
  pub is_solved: bool,
  #[serde(default)]
  pub is_bookmarked: bool,
  #[serde(default)]
  pub user_code: Option<String>,
  /// Unix millis of the day this record was served.
  #[serde(default)]
  pub date: i64,
}

/// User document as stored in the `users` collection.
///
/// Missing fields deserialize to their defaults so partial documents written
/// by older clients still load.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct User {
  pub uid: String,
  pub email: String,
  pub current_streak: u32,
  /// Unix millis of the last accepted solve; 0 means never.
  pub last_solved_date: i64,
  pub solved_question_ids: Vec<String>,
  pub total_solved: u32,
  pub score: u32,
  pub codeforces_handle: Option<String>,
  pub bookmarked_question_ids: Vec<String>,
}

/// Competitive-programming stats read from the ratings API.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingProfile {
  pub handle: String,
  pub rating: Option<i32>,
  pub rank: Option<String>,
  pub max_rating: Option<i32>,
  pub avatar: String,
}

/// Outcome of an operation as seen by a client.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Resource<T> {
  Success { data: T },
  Error { message: String },
  Loading,
}

impl<T> Resource<T> {
  pub fn success(data: T) -> Self { Resource::Success { data } }

  pub fn error(message: impl Into<String>) -> Self { Resource::Error { message: message.into() } }

  pub fn into_data(self) -> Option<T> {
    match self {
      Resource::Success { data } => Some(data),
      _ => None,
    }
  }
}
