// Local question cache backed by SQLite.
// Mirrors every question the service has served so the daily question can be
// answered offline, and holds the per-question progress (solved, bookmark, code).

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::{Connection, OptionalExtension, Row, Statement};
use thiserror::Error;

use crate::daily::merge_local_progress;
use crate::domain::Question;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("cache connection poisoned")]
    Poisoned,
}

const SELECT_COLUMNS: &str = "SELECT id, title, description, difficulty, topic, time_estimate,
        starter_code, solution_code, is_solved, is_bookmarked, user_code, date
 FROM questions";

const UPSERT: &str = "INSERT OR REPLACE INTO questions
        (id, title, description, difficulty, topic, time_estimate,
         starter_code, solution_code, is_solved, is_bookmarked, user_code, date)
 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)";

/// Question cache service
#[derive(Clone)]
pub struct QuestionCache {
    conn: Arc<Mutex<Connection>>,
}

impl QuestionCache {
    /// Open (or create) the cache file at `path`.
    pub fn open(path: &Path) -> Result<Self, CacheError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
        ",
        )?;
        Self::with_connection(conn)
    }

    /// Throwaway cache, used by tests and when no cache path is configured.
    pub fn in_memory() -> Result<Self, CacheError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, CacheError> {
        let cache = Self { conn: Arc::new(Mutex::new(conn)) };
        cache.initialize()?;
        Ok(cache)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, CacheError> {
        self.conn.lock().map_err(|_| CacheError::Poisoned)
    }

    fn initialize(&self) -> Result<(), CacheError> {
        let conn = self.lock()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS questions (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                difficulty TEXT NOT NULL,
                topic TEXT NOT NULL,
                time_estimate TEXT NOT NULL,
                starter_code TEXT NOT NULL,
                solution_code TEXT NOT NULL,
                is_solved INTEGER NOT NULL DEFAULT 0,
                is_bookmarked INTEGER NOT NULL DEFAULT 0,
                user_code TEXT,
                date INTEGER NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_questions_date ON questions(date)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_questions_bookmarked ON questions(is_bookmarked)",
            [],
        )?;

        Ok(())
    }

    /// Insert or replace a batch of questions.
    pub fn upsert_questions(&self, questions: &[Question]) -> Result<(), CacheError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(UPSERT)?;
            for q in questions {
                Self::bind_upsert(&mut stmt, q)?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Store a freshly fetched question, keeping the progress already cached
    /// for the same id. Read and write happen in one transaction, so a
    /// concurrent bookmark or solve is never overwritten.
    pub fn upsert_preserving_progress(&self, fresh: Question) -> Result<Question, CacheError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let existing = tx
            .query_row(&format!("{SELECT_COLUMNS} WHERE id = ?"), rusqlite::params![fresh.id], |row| {
                Self::row_to_question(row)
            })
            .optional()?;
        let merged = merge_local_progress(fresh, existing.as_ref());
        {
            let mut stmt = tx.prepare(UPSERT)?;
            Self::bind_upsert(&mut stmt, &merged)?;
        }
        tx.commit()?;
        Ok(merged)
    }

    fn bind_upsert(stmt: &mut Statement, q: &Question) -> rusqlite::Result<usize> {
        stmt.execute(rusqlite::params![
            q.id,
            q.title,
            q.description,
            q.difficulty,
            q.topic,
            q.time_estimate,
            q.starter_code,
            q.solution_code,
            q.is_solved,
            q.is_bookmarked,
            q.user_code,
            q.date,
        ])
    }

    /// Overwrite the mutable progress columns of an existing question.
    pub fn update_question(&self, question: &Question) -> Result<bool, CacheError> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE questions SET is_solved = ?, is_bookmarked = ?, user_code = ? WHERE id = ?",
            rusqlite::params![question.is_solved, question.is_bookmarked, question.user_code, question.id],
        )?;
        Ok(changed > 0)
    }

    pub fn get_question(&self, id: &str) -> Result<Option<Question>, CacheError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} WHERE id = ?"))?;
        let question = stmt
            .query_row(rusqlite::params![id], |row| Self::row_to_question(row))
            .optional()?;
        Ok(question)
    }

    pub fn get_bookmarked_questions(&self) -> Result<Vec<Question>, CacheError> {
        self.query_many(&format!("{SELECT_COLUMNS} WHERE is_bookmarked = 1 ORDER BY date DESC"))
    }

    /// Most recently served question.
    pub fn get_latest_question(&self) -> Result<Option<Question>, CacheError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} ORDER BY date DESC LIMIT 1"))?;
        let question = stmt.query_row([], |row| Self::row_to_question(row)).optional()?;
        Ok(question)
    }

    fn query_many(&self, sql: &str) -> Result<Vec<Question>, CacheError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map([], |row| Self::row_to_question(row))?;

        let mut questions = Vec::new();
        for row in rows {
            questions.push(row?);
        }
        Ok(questions)
    }

    fn row_to_question(row: &Row) -> rusqlite::Result<Question> {
        Ok(Question {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            difficulty: row.get(3)?,
            topic: row.get(4)?,
            time_estimate: row.get(5)?,
            starter_code: row.get(6)?,
            solution_code: row.get(7)?,
            is_solved: row.get(8)?,
            is_bookmarked: row.get(9)?,
            user_code: row.get(10)?,
            date: row.get(11)?,
        })
    }
}
