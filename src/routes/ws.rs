//! WebSocket user feed. After the upgrade the server pushes `loading`, then a
//! `Resource<User>` snapshot on every change of the user document, until the
//! client closes.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    Path, State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tokio::sync::watch;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use crate::domain::{Resource, User};
use crate::state::AppState;

#[instrument(level = "info", skip(ws, state))]
pub async fn ws_user_feed(
  ws: WebSocketUpgrade,
  State(state): State<Arc<AppState>>,
  Path(uid): Path<String>,
) -> impl IntoResponse {
  info!(target: "codestreak", %uid, "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state, uid))
}

fn snapshot(user: Option<&User>) -> Resource<User> {
  match user {
    Some(u) => Resource::success(u.clone()),
    None => Resource::error("User not found"),
  }
}

async fn send(socket: &mut WebSocket, res: &Resource<User>) -> bool {
  let out = serde_json::to_string(res).unwrap_or_else(|e| {
    serde_json::json!({ "status": "error", "message": format!("Serialization error: {}", e) }).to_string()
  });
  match socket.send(Message::Text(out)).await {
    Ok(()) => true,
    Err(e) => {
      error!(target: "codestreak", error = %e, "WS send error");
      false
    }
  }
}

#[instrument(level = "info", skip(socket, state), fields(session = %Uuid::new_v4()))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>, uid: String) {
  info!(target: "codestreak", %uid, "WebSocket connected");
  if !send(&mut socket, &Resource::Loading).await {
    return;
  }

  let rx = state.users.subscribe(&uid).await;
  stream_snapshots(&mut socket, rx, &uid).await;
  state.users.unsubscribe(&uid).await;
  info!(target: "codestreak", %uid, "WebSocket disconnected");
}

/// Push the current snapshot, then one per change, until either side goes away.
/// Takes the receiver by value so it is dropped before the caller unsubscribes.
async fn stream_snapshots(socket: &mut WebSocket, mut rx: watch::Receiver<Option<User>>, uid: &str) {
  let first = snapshot(rx.borrow_and_update().as_ref());
  if !send(socket, &first).await {
    return;
  }

  loop {
    tokio::select! {
      changed = rx.changed() => {
        if changed.is_err() {
          break;
        }
        let res = snapshot(rx.borrow_and_update().as_ref());
        debug!(target: "streak", %uid, "WS pushing user snapshot");
        if !send(socket, &res).await {
          break;
        }
      }
      msg = socket.recv() => match msg {
        Some(Ok(Message::Ping(payload))) => { let _ = socket.send(Message::Pong(payload)).await; }
        Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
        Some(Ok(_)) => {}
      },
    }
  }
}
