//! Remote document store: the `questions` pool and the `users` collection.
//!
//! Two flavours share the `DocumentStore` trait:
//!   - `HttpDocumentStore` speaks a small JSON REST dialect to a hosted
//!     document database.
//!   - `MemoryDocumentStore` keeps collections in process; it is used when no
//!     remote is configured and by tests.
//!
//! Writes to users are merges: fields present in the patch overwrite, fields
//! absent keep their stored value.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::domain::Question;

pub type Fields = Map<String, Value>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("store HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("malformed document: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Free-form document as returned by the store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(default)]
    pub fields: Fields,
}

impl Document {
    fn text(&self, key: &str) -> Option<String> {
        self.fields.get(key).and_then(Value::as_str).map(str::to_string)
    }

    /// Map a pool document onto a question, falling back to placeholders for
    /// every missing or non-string field. Progress fields start cleared.
    pub fn to_question(&self, served_at_millis: i64) -> Question {
        Question {
            id: self.id.clone(),
            title: self.text("title").unwrap_or_else(|| "Unknown Challenge".into()),
            description: self.text("description").unwrap_or_else(|| "No description provided.".into()),
            difficulty: self.text("difficulty").unwrap_or_else(|| "Medium".into()),
            topic: self.text("topic").unwrap_or_else(|| "General".into()),
            time_estimate: self.text("timeEstimate").unwrap_or_else(|| "15 mins".into()),
            starter_code: self.text("starterCode").unwrap_or_else(|| "// Write your solution here...".into()),
            solution_code: self.text("solutionCode").unwrap_or_else(|| "// Solution not available yet".into()),
            is_solved: false,
            is_bookmarked: false,
            user_code: None,
            date: served_at_millis,
        }
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Every document of the `questions` collection.
    async fn list_questions(&self) -> Result<Vec<Document>, StoreError>;

    /// A single user document, `None` when it does not exist.
    async fn get_user(&self, uid: &str) -> Result<Option<Fields>, StoreError>;

    /// Create the user document or merge `fields` into it.
    async fn merge_user(&self, uid: &str, fields: Fields) -> Result<(), StoreError>;
}

#[derive(Deserialize)]
struct DocumentList {
    #[serde(default)]
    documents: Vec<Document>,
}

/// JSON REST client for a hosted document database.
///
/// Routes:
///   GET   {base}/questions       -> {"documents": [{"id", "fields"}]}
///   GET   {base}/users/{uid}     -> {"id", "fields"} | 404
///   PATCH {base}/users/{uid}     <- fields object, merged server side
#[derive(Clone)]
pub struct HttpDocumentStore {
    pub client: reqwest::Client,
    pub base_url: String,
}

impl HttpDocumentStore {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url: base_url.into().trim_end_matches('/').to_string() })
    }

    async fn check(res: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        if res.status().is_success() {
            return Ok(res);
        }
        let status = res.status();
        let body = res.text().await.unwrap_or_default();
        Err(StoreError::Status { status, body })
    }
}

#[async_trait]
impl DocumentStore for HttpDocumentStore {
    #[instrument(level = "debug", skip(self), fields(base_url = %self.base_url))]
    async fn list_questions(&self) -> Result<Vec<Document>, StoreError> {
        let url = format!("{}/questions", self.base_url);
        let res = self.client.get(&url).header(USER_AGENT, "codestreak-backend/0.1").send().await?;
        let list: DocumentList = Self::check(res).await?.json().await?;
        debug!(target: "question", count = list.documents.len(), "Fetched question pool");
        Ok(list.documents)
    }

    #[instrument(level = "debug", skip(self), fields(%uid))]
    async fn get_user(&self, uid: &str) -> Result<Option<Fields>, StoreError> {
        let url = format!("{}/users/{}", self.base_url, uid);
        let res = self.client.get(&url).header(USER_AGENT, "codestreak-backend/0.1").send().await?;
        if res.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let doc: Document = Self::check(res).await?.json().await?;
        Ok(Some(doc.fields))
    }

    #[instrument(level = "debug", skip(self, fields), fields(%uid, field_count = fields.len()))]
    async fn merge_user(&self, uid: &str, fields: Fields) -> Result<(), StoreError> {
        let url = format!("{}/users/{}", self.base_url, uid);
        let res = self
            .client
            .patch(&url)
            .header(USER_AGENT, "codestreak-backend/0.1")
            .header(CONTENT_TYPE, "application/json")
            .json(&fields)
            .send()
            .await?;
        Self::check(res).await?;
        Ok(())
    }
}

/// In-process collections. Questions are kept ordered by id.
#[derive(Clone, Default)]
pub struct MemoryDocumentStore {
    questions: Arc<RwLock<BTreeMap<String, Fields>>>,
    users: Arc<RwLock<BTreeMap<String, Fields>>>,
}

impl MemoryDocumentStore {
    pub fn with_questions(docs: impl IntoIterator<Item = Document>) -> Self {
        let questions = docs.into_iter().map(|d| (d.id, d.fields)).collect();
        Self { questions: Arc::new(RwLock::new(questions)), users: Arc::default() }
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn list_questions(&self) -> Result<Vec<Document>, StoreError> {
        let questions = self.questions.read().await;
        Ok(questions
            .iter()
            .map(|(id, fields)| Document { id: id.clone(), fields: fields.clone() })
            .collect())
    }

    async fn get_user(&self, uid: &str) -> Result<Option<Fields>, StoreError> {
        Ok(self.users.read().await.get(uid).cloned())
    }

    async fn merge_user(&self, uid: &str, fields: Fields) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        let doc = users.entry(uid.to_string()).or_default();
        for (k, v) in fields {
            doc.insert(k, v);
        }
        Ok(())
    }
}
