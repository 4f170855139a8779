//! Public protocol structs for the HTTP and WebSocket endpoints (serde ready).
//! Every response body is a `Resource<T>` wrapping one of the `*Out` types.

use serde::{Deserialize, Serialize};

use crate::domain::{Question, RatingProfile, User};

//
// Requests
//

#[derive(Debug, Deserialize)]
pub struct SubmissionIn {
    /// Signed-in user, if any; anonymous submissions only update the local cache.
    #[serde(default)]
    pub uid: Option<String>,
    pub question_id: String,
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterIn {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct LinkHandleIn {
    pub handle: String,
}

//
// Responses
//

#[derive(Debug, Serialize, PartialEq)]
pub struct SubmissionOut {
    /// False when the code was blank or still the starter code.
    pub accepted: bool,
    /// Canonical solution, revealed once the submission is accepted.
    pub solution_code: Option<String>,
    /// User after the streak update; `None` for anonymous or failed updates.
    pub user: Option<User>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct BookmarkOut {
    pub question_id: String,
    pub is_bookmarked: bool,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct HomeOut {
    pub name: String,
    pub streak: u32,
    pub daily_question: Option<Question>,
    /// Monday-first.
    pub weekly_progress: [bool; 7],
}

#[derive(Debug, Serialize, PartialEq)]
pub struct ProfileOut {
    pub user: User,
    pub codeforces: Option<RatingProfile>,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}
