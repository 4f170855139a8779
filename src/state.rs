//! Application state: repositories, the ratings client and the calendar offset.
//!
//! Store selection:
//!   - `store_base_url` set  -> HTTP document store
//!   - otherwise             -> in-memory store seeded with the configured pool
//!                              (or the built-in starter pool)
//!
//! The cache falls back to an in-memory SQLite database when the configured
//! file cannot be opened, so the service still starts.

use std::sync::Arc;
use std::time::Duration;

use chrono::FixedOffset;
use thiserror::Error;
use tracing::{error, info, instrument};

use crate::cache::{CacheError, QuestionCache};
use crate::config::AppConfig;
use crate::ratings::{RatingsClient, RatingsError};
use crate::repository::{QuestionRepository, UserRepository};
use crate::seeds::starter_pool;
use crate::store::{DocumentStore, HttpDocumentStore, MemoryDocumentStore, StoreError};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("document store: {0}")]
    Store(#[from] StoreError),
    #[error("ratings client: {0}")]
    Ratings(#[from] RatingsError),
    #[error("question cache: {0}")]
    Cache(#[from] CacheError),
}

#[derive(Clone)]
pub struct AppState {
    pub questions: QuestionRepository,
    pub users: UserRepository,
    pub ratings: RatingsClient,
    pub offset: FixedOffset,
}

impl AppState {
    /// Build state from configuration: open the cache, pick the store, build clients.
    #[instrument(level = "info", skip_all)]
    pub fn new(cfg: &AppConfig) -> Result<Self, StartupError> {
        let timeout = Duration::from_secs(cfg.http_timeout_secs.max(1));
        let offset = cfg.offset();

        let cache = match &cfg.cache_path {
            Some(path) => match QuestionCache::open(path) {
                Ok(cache) => {
                    info!(target: "codestreak", path = %path.display(), "Question cache opened");
                    cache
                }
                Err(e) => {
                    error!(target: "codestreak", path = %path.display(), error = %e, "Opening cache failed; using in-memory cache");
                    QuestionCache::in_memory()?
                }
            },
            None => {
                info!(target: "codestreak", "No cache_path configured; using in-memory cache");
                QuestionCache::in_memory()?
            }
        };

        let store: Arc<dyn DocumentStore> = match &cfg.store_base_url {
            Some(url) => {
                info!(target: "codestreak", base_url = %url, "Remote document store enabled");
                Arc::new(HttpDocumentStore::new(url.clone(), timeout)?)
            }
            None => {
                let pool = if cfg.questions.is_empty() {
                    starter_pool()
                } else {
                    cfg.questions.iter().map(|q| q.to_document()).collect()
                };
                info!(target: "codestreak", pool_size = pool.len(), "No store_base_url; using in-memory document store");
                Arc::new(MemoryDocumentStore::with_questions(pool))
            }
        };

        let ratings = RatingsClient::new(cfg.ratings_base_url.clone(), timeout)?;
        info!(target: "codestreak", base_url = %ratings.base_url, utc_offset_secs = offset.local_minus_utc(), "Ratings client ready");

        Ok(Self::from_parts(cache, store, ratings, offset, cfg.points_per_solve))
    }

    pub fn from_parts(
        cache: QuestionCache,
        store: Arc<dyn DocumentStore>,
        ratings: RatingsClient,
        offset: FixedOffset,
        points_per_solve: u32,
    ) -> Self {
        Self {
            questions: QuestionRepository::new(cache, store.clone(), offset),
            users: UserRepository::new(store, offset, points_per_solve),
            ratings,
            offset,
        }
    }
}
