//! Service configuration: optional TOML file plus environment overrides.
//!
//! File: `CODESTREAK_CONFIG_PATH` (TOML, every key optional)
//!
//! ```toml
//! cache_path = "data/codestreak.db"
//! store_base_url = "https://docs.example.com/v1"
//! ratings_base_url = "https://codeforces.com/api"
//! http_timeout_secs = 10
//! points_per_solve = 10
//! utc_offset_minutes = 0
//!
//! [[questions]]            # pool for the in-memory store
//! id = "q1"
//! title = "Two Sum"
//! ```
//!
//! Env overrides: `STORE_BASE_URL`, `RATINGS_BASE_URL`, `CACHE_DB_PATH`.

use std::path::PathBuf;

use chrono::{FixedOffset, Offset, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::ratings::DEFAULT_BASE_URL;
use crate::store::{Document, Fields};
use crate::streak::POINTS_PER_SOLVE;

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct AppConfig {
  /// SQLite file for the local cache; in-memory when unset.
  pub cache_path: Option<PathBuf>,
  /// Remote document store; the in-memory store is used when unset.
  pub store_base_url: Option<String>,
  pub ratings_base_url: String,
  pub http_timeout_secs: u64,
  pub points_per_solve: u32,
  pub utc_offset_minutes: i32,
  pub questions: Vec<QuestionCfg>,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      cache_path: None,
      store_base_url: None,
      ratings_base_url: DEFAULT_BASE_URL.into(),
      http_timeout_secs: 10,
      points_per_solve: POINTS_PER_SOLVE,
      utc_offset_minutes: 0,
      questions: Vec::new(),
    }
  }
}

/// Question entry accepted in TOML configuration. Missing fields get the
/// same placeholders as remote documents.
#[derive(Clone, Debug, Deserialize)]
pub struct QuestionCfg {
  pub id: String,
  #[serde(default)]
  pub title: Option<String>,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default)]
  pub difficulty: Option<String>,
  #[serde(default)]
  pub topic: Option<String>,
  #[serde(default)]
  pub time_estimate: Option<String>,
  #[serde(default)]
  pub starter_code: Option<String>,
  #[serde(default)]
  pub solution_code: Option<String>,
}

impl QuestionCfg {
  pub fn to_document(&self) -> Document {
    let mut fields = Fields::new();
    let pairs = [
      ("title", &self.title),
      ("description", &self.description),
      ("difficulty", &self.difficulty),
      ("topic", &self.topic),
      ("timeEstimate", &self.time_estimate),
      ("starterCode", &self.starter_code),
      ("solutionCode", &self.solution_code),
    ];
    for (key, value) in pairs {
      if let Some(v) = value {
        fields.insert(key.into(), Value::String(v.clone()));
      }
    }
    Document { id: self.id.clone(), fields }
  }
}

impl AppConfig {
  /// Calendar-day offset; out-of-range values fall back to UTC.
  pub fn offset(&self) -> FixedOffset {
    match self.utc_offset_minutes.checked_mul(60).and_then(FixedOffset::east_opt) {
      Some(offset) => offset,
      None => {
        warn!(target: "codestreak", minutes = self.utc_offset_minutes, "Invalid utc_offset_minutes; using UTC");
        Utc.fix()
      }
    }
  }

  fn apply_env(mut self, get: impl Fn(&str) -> Option<String>) -> Self {
    if let Some(url) = get("STORE_BASE_URL").filter(|s| !s.is_empty()) {
      self.store_base_url = Some(url);
    }
    if let Some(url) = get("RATINGS_BASE_URL").filter(|s| !s.is_empty()) {
      self.ratings_base_url = url;
    }
    if let Some(path) = get("CACHE_DB_PATH").filter(|s| !s.is_empty()) {
      self.cache_path = Some(PathBuf::from(path));
    }
    self
  }
}

/// Parse a TOML document into `AppConfig`.
pub fn parse_config(s: &str) -> Result<AppConfig, toml::de::Error> {
  toml::from_str::<AppConfig>(s)
}

/// Load from `CODESTREAK_CONFIG_PATH` (if set) and apply env overrides.
/// A missing or broken file is logged and defaults are used.
pub fn load_app_config_from_env() -> AppConfig {
  let base = match std::env::var("CODESTREAK_CONFIG_PATH") {
    Ok(path) => match std::fs::read_to_string(&path) {
      Ok(s) => match parse_config(&s) {
        Ok(cfg) => {
          info!(target: "codestreak", %path, "Loaded config (TOML)");
          cfg
        }
        Err(e) => {
          error!(target: "codestreak", %path, error = %e, "Failed to parse TOML config; using defaults");
          AppConfig::default()
        }
      },
      Err(e) => {
        error!(target: "codestreak", %path, error = %e, "Failed to read TOML config file; using defaults");
        AppConfig::default()
      }
    },
    Err(_) => AppConfig::default(),
  };
  base.apply_env(|key| std::env::var(key).ok())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_file_gives_defaults() {
    let cfg = parse_config("").expect("parse");
    assert_eq!(cfg.ratings_base_url, DEFAULT_BASE_URL);
    assert_eq!(cfg.points_per_solve, POINTS_PER_SOLVE);
    assert!(cfg.store_base_url.is_none());
    assert_eq!(cfg.offset().local_minus_utc(), 0);
  }

  #[test]
  fn questions_and_offset_parse() {
    let cfg = parse_config(
      r#"
        utc_offset_minutes = 330
        points_per_solve = 25

        [[questions]]
        id = "q1"
        title = "Two Sum"
        time_estimate = "5 mins"
      "#,
    )
    .expect("parse");
    assert_eq!(cfg.points_per_solve, 25);
    assert_eq!(cfg.offset().local_minus_utc(), 330 * 60);

    let doc = cfg.questions[0].to_document();
    let q = doc.to_question(0);
    assert_eq!(q.title, "Two Sum");
    assert_eq!(q.time_estimate, "5 mins");
    assert_eq!(q.topic, "General");
  }

  #[test]
  fn out_of_range_offset_falls_back_to_utc() {
    let cfg = AppConfig { utc_offset_minutes: 60 * 48, ..AppConfig::default() };
    assert_eq!(cfg.offset().local_minus_utc(), 0);
  }

  #[test]
  fn env_overrides_file_values() {
    let cfg = AppConfig { store_base_url: Some("http://file".into()), ..AppConfig::default() }.apply_env(|key| match key {
      "STORE_BASE_URL" => Some("http://env".into()),
      "CACHE_DB_PATH" => Some("/tmp/cs.db".into()),
      _ => None,
    });
    assert_eq!(cfg.store_base_url.as_deref(), Some("http://env"));
    assert_eq!(cfg.cache_path, Some(PathBuf::from("/tmp/cs.db")));
    assert_eq!(cfg.ratings_base_url, DEFAULT_BASE_URL);
  }
}
