use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use tracing::{error, info, instrument, warn};

use crate::cache::{CacheError, QuestionCache};
use crate::daily::{calendar_day, daily_index, day_count};
use crate::domain::{Question, Resource};
use crate::seeds::default_question;
use crate::store::{Document, DocumentStore};

#[derive(Clone)]
pub struct QuestionRepository {
    cache: QuestionCache,
    store: Arc<dyn DocumentStore>,
    offset: FixedOffset,
}

impl QuestionRepository {
    pub fn new(cache: QuestionCache, store: Arc<dyn DocumentStore>, offset: FixedOffset) -> Self {
        Self { cache, store, offset }
    }

    /// Today's question.
    ///
    /// Order of preference:
    ///   1) remote pool, `day_count mod N`, with local progress carried over
    ///   2) most recently cached question
    ///   3) the built-in default question, seeded into the cache
    #[instrument(level = "info", skip(self))]
    pub async fn get_daily_question(&self, now: DateTime<Utc>) -> Resource<Question> {
        match self.store.list_questions().await {
            Ok(mut pool) if !pool.is_empty() => {
                pool.sort_by(|a, b| a.id.cmp(&b.id));
                match self.pick_and_cache(&pool, now) {
                    Ok(q) => {
                        info!(target: "question", id = %q.id, pool_size = pool.len(), source = "remote_pool", "Daily question served");
                        return Resource::success(q);
                    }
                    Err(e) => {
                        error!(target: "question", error = %e, "Caching daily question failed; serving from cache");
                    }
                }
            }
            Ok(_) => warn!(target: "question", "Remote pool is empty; serving from cache"),
            Err(e) => warn!(target: "question", error = %e, "Remote pool unreachable; serving from cache"),
        }
        self.fetch_local(now)
    }

    fn pick_and_cache(&self, pool: &[Document], now: DateTime<Utc>) -> Result<Question, CacheError> {
        let today = day_count(calendar_day(now, self.offset));
        // pool is non-empty, so an index always exists
        let doc = daily_index(today, pool.len())
            .and_then(|i| pool.get(i))
            .unwrap_or(&pool[0]);

        self.cache.upsert_preserving_progress(doc.to_question(now.timestamp_millis()))
    }

    fn fetch_local(&self, now: DateTime<Utc>) -> Resource<Question> {
        match self.cache.get_latest_question() {
            Ok(Some(q)) => {
                info!(target: "question", id = %q.id, source = "cache", "Daily question served");
                return Resource::success(q);
            }
            Ok(None) => {}
            Err(e) => {
                error!(target: "question", error = %e, "Reading cache failed");
                return Resource::error("No questions available.");
            }
        }

        let seed = Question { date: now.timestamp_millis(), ..default_question() };
        if let Err(e) = self.cache.upsert_questions(&[seed]) {
            error!(target: "question", error = %e, "Seeding default question failed");
            return Resource::error("No questions available.");
        }
        match self.cache.get_latest_question() {
            Ok(Some(q)) => {
                warn!(target: "question", id = %q.id, source = "default_seed", "Cache was empty; seeded default question");
                Resource::success(q)
            }
            Ok(None) => Resource::error("No questions available."),
            Err(e) => {
                error!(target: "question", error = %e, "Reading seeded question failed");
                Resource::error("No questions available.")
            }
        }
    }

    /// Cached question by id.
    pub fn get_question(&self, id: &str) -> Result<Option<Question>, CacheError> {
        self.cache.get_question(id)
    }

    /// Record the user's accepted code on the cached question. Unknown ids are ignored.
    #[instrument(level = "debug", skip(self, user_code), fields(code_len = user_code.len()))]
    pub fn mark_solved(&self, id: &str, user_code: &str) -> Result<bool, CacheError> {
        match self.cache.get_question(id)? {
            Some(q) => self.cache.update_question(&Question {
                is_solved: true,
                user_code: Some(user_code.to_string()),
                ..q
            }),
            None => Ok(false),
        }
    }

    /// Flip the bookmark flag; returns the new flag, `None` for unknown ids.
    #[instrument(level = "debug", skip(self))]
    pub fn toggle_bookmark(&self, id: &str) -> Result<Option<bool>, CacheError> {
        let Some(q) = self.cache.get_question(id)? else {
            return Ok(None);
        };
        let is_bookmarked = !q.is_bookmarked;
        self.cache.update_question(&Question { is_bookmarked, ..q })?;
        Ok(Some(is_bookmarked))
    }

    pub fn saved_questions(&self) -> Result<Vec<Question>, CacheError> {
        self.cache.get_bookmarked_questions()
    }
}
