//! CodeStreak · Daily Coding Question Backend
//!
//! - Axum HTTP + WebSocket API
//! - One question per calendar day, offline-first through a SQLite cache
//! - Streak tracking and Codeforces handle linking
//!
//! Important env variables:
//!   PORT                   : u16 (default 3000)
//!   CODESTREAK_CONFIG_PATH : path to TOML config (offset, points, question pool)
//!   STORE_BASE_URL         : remote document store; in-memory store when unset
//!   RATINGS_BASE_URL       : default "https://codeforces.com/api"
//!   CACHE_DB_PATH          : SQLite question cache; in-memory when unset
//!   LOG_LEVEL              : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT             : "pretty" (default) or "json"
//!   LOG_SPANS              : "close" or "full" to log span timings

mod telemetry;
mod util;
mod domain;
mod config;
mod seeds;
mod state;
mod protocol;
mod logic;
mod routes;
mod daily;
mod streak;
mod cache;
mod store;
mod ratings;
mod repository;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, instrument, warn};

use crate::config::load_app_config_from_env;
use crate::routes::build_router;
use crate::state::AppState;

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  let cfg = load_app_config_from_env();
  let state = Arc::new(AppState::new(&cfg)?);

  let app = build_router(state.clone());

  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "codestreak", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(async {
      if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(target: "codestreak", error = %e, "Installing ctrl-c handler failed");
      }
      info!(target: "codestreak", "Shutdown signal received");
    })
    .await?;
  Ok(())
}
