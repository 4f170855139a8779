use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use serde_json::Value;
use tokio::sync::{watch, RwLock};
use tracing::{debug, error, info, instrument, warn};

use crate::domain::{Resource, User};
use crate::store::{DocumentStore, Fields, StoreError};
use crate::streak::apply_solve;

#[derive(Clone)]
pub struct UserRepository {
    store: Arc<dyn DocumentStore>,
    offset: FixedOffset,
    points_per_solve: u32,
    // Live subscriptions, one channel per user id.
    watchers: Arc<RwLock<HashMap<String, watch::Sender<Option<User>>>>>,
}

fn to_fields(user: &User) -> Result<Fields, StoreError> {
    match serde_json::to_value(user)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Unavailable(format!("user serialized to non-object: {other}"))),
    }
}

impl UserRepository {
    pub fn new(store: Arc<dyn DocumentStore>, offset: FixedOffset, points_per_solve: u32) -> Self {
        Self { store, offset, points_per_solve, watchers: Arc::default() }
    }

    /// Raw read; `Ok(None)` when the document does not exist.
    pub async fn fetch_user(&self, uid: &str) -> Result<Option<User>, StoreError> {
        let Some(fields) = self.store.get_user(uid).await? else {
            return Ok(None);
        };
        let mut user: User = serde_json::from_value(Value::Object(fields))?;
        if user.uid.is_empty() {
            user.uid = uid.to_string();
        }
        Ok(Some(user))
    }

    #[instrument(level = "info", skip(self))]
    pub async fn get_user(&self, uid: &str) -> Resource<User> {
        match self.fetch_user(uid).await {
            Ok(Some(user)) => Resource::success(user),
            Ok(None) => Resource::error("User not found"),
            Err(e) => Resource::error(e.to_string()),
        }
    }

    /// Merge-write the whole user document and notify subscribers.
    #[instrument(level = "info", skip(self, user), fields(uid = %user.uid))]
    pub async fn create_or_update(&self, user: &User) -> Result<(), StoreError> {
        self.merge_fields(&user.uid, to_fields(user)?).await
    }

    async fn merge_fields(&self, uid: &str, fields: Fields) -> Result<(), StoreError> {
        self.store.merge_user(uid, fields).await?;
        self.publish(uid).await;
        Ok(())
    }

    /// First sign-in creates the document; later sign-ins only refresh the e-mail
    /// so stored progress is never clobbered by defaults.
    #[instrument(level = "info", skip(self, email))]
    pub async fn register(&self, uid: &str, email: &str) -> Result<User, StoreError> {
        match self.fetch_user(uid).await? {
            Some(existing) => {
                let mut fields = Fields::new();
                fields.insert("email".into(), Value::String(email.to_string()));
                self.merge_fields(uid, fields).await?;
                Ok(User { email: email.to_string(), ..existing })
            }
            None => {
                let user = User { uid: uid.to_string(), email: email.to_string(), ..User::default() };
                self.create_or_update(&user).await?;
                info!(target: "streak", %uid, "Created user document");
                Ok(user)
            }
        }
    }

    /// Save (or clear) the linked Codeforces handle.
    #[instrument(level = "info", skip(self))]
    pub async fn set_codeforces_handle(&self, uid: &str, handle: Option<&str>) -> Result<(), StoreError> {
        let mut fields = Fields::new();
        let value = handle.map(|h| Value::String(h.to_string())).unwrap_or(Value::Null);
        fields.insert("codeforcesHandle".into(), value);
        self.merge_fields(uid, fields).await
    }

    /// Apply one accepted solve. Returns the stored user on success.
    ///
    /// A missing user is a no-op; a failed read or write is logged and
    /// swallowed, there is no retry or rollback.
    #[instrument(level = "info", skip(self, now))]
    pub async fn record_solve(&self, uid: &str, question_id: &str, now: DateTime<Utc>) -> Option<User> {
        let current = match self.fetch_user(uid).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                warn!(target: "streak", %uid, "Solve for unknown user ignored");
                return None;
            }
            Err(e) => {
                error!(target: "streak", %uid, error = %e, "Reading user for streak update failed");
                return None;
            }
        };

        let updated = apply_solve(&current, question_id, now, self.offset, self.points_per_solve);
        if updated == current {
            info!(target: "streak", %uid, %question_id, "Question already solved today; nothing to record");
            return Some(current);
        }
        if let Err(e) = self.create_or_update(&updated).await {
            error!(target: "streak", %uid, error = %e, "Persisting streak update failed");
            return None;
        }
        info!(
            target: "streak",
            %uid,
            %question_id,
            streak = updated.current_streak,
            total_solved = updated.total_solved,
            score = updated.score,
            "Solve recorded"
        );
        Some(updated)
    }

    /// Live view of a user document. The receiver starts with the current
    /// value and observes every later write made through this repository.
    pub async fn subscribe(&self, uid: &str) -> watch::Receiver<Option<User>> {
        if let Some(tx) = self.watchers.read().await.get(uid) {
            return tx.subscribe();
        }
        let rx = {
            let mut watchers = self.watchers.write().await;
            // Channels whose receivers are all gone are dropped on the way in.
            watchers.retain(|_, tx| tx.receiver_count() > 0);
            watchers.entry(uid.to_string()).or_insert_with(|| watch::channel(None).0).subscribe()
        };
        self.publish(uid).await;
        rx
    }

    /// Forget the channel for `uid` once nobody listens to it any more.
    pub async fn unsubscribe(&self, uid: &str) {
        let mut watchers = self.watchers.write().await;
        if watchers.get(uid).is_some_and(|tx| tx.receiver_count() == 0) {
            watchers.remove(uid);
            debug!(target: "streak", %uid, remaining = watchers.len(), "Live subscription released");
        }
    }

    async fn publish(&self, uid: &str) {
        let Some(tx) = self.watchers.read().await.get(uid).cloned() else {
            return;
        };
        if tx.receiver_count() == 0 {
            self.unsubscribe(uid).await;
            return;
        }
        match self.fetch_user(uid).await {
            Ok(user) => {
                tx.send_replace(user);
            }
            Err(e) => warn!(target: "streak", %uid, error = %e, "Refreshing subscribers failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::OfflineStore;
    use crate::store::MemoryDocumentStore;
    use crate::streak::POINTS_PER_SOLVE;
    use chrono::TimeZone;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn repo() -> UserRepository {
        UserRepository::new(Arc::new(MemoryDocumentStore::default()), utc(), POINTS_PER_SOLVE)
    }

    fn at(d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, h, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn register_creates_then_preserves_progress() {
        let repo = repo();
        let user = repo.register("u1", "ada@example.com").await.unwrap();
        assert_eq!(user.current_streak, 0);

        repo.record_solve("u1", "q1", at(1, 9)).await.expect("solve");
        let again = repo.register("u1", "ada@new.example.com").await.unwrap();
        assert_eq!(again.email, "ada@new.example.com");
        assert_eq!(again.current_streak, 1);
        assert_eq!(again.solved_question_ids, vec!["q1".to_string()]);
    }

    #[tokio::test]
    async fn solves_across_days_build_streak() {
        let repo = repo();
        repo.register("u1", "ada@example.com").await.unwrap();

        repo.record_solve("u1", "q1", at(1, 9)).await.unwrap();
        repo.record_solve("u1", "q2", at(1, 21)).await.unwrap();
        let user = repo.record_solve("u1", "q3", at(2, 9)).await.unwrap();
        assert_eq!(user.current_streak, 2);
        assert_eq!(user.total_solved, 3);
        assert_eq!(user.score, 3 * POINTS_PER_SOLVE);

        let stored = repo.get_user("u1").await.into_data().unwrap();
        assert_eq!(stored, user);
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let repo = repo();
        assert_eq!(repo.get_user("ghost").await, Resource::error("User not found"));
        assert!(repo.record_solve("ghost", "q1", at(1, 9)).await.is_none());
    }

    #[tokio::test]
    async fn store_failure_is_swallowed() {
        let repo = UserRepository::new(Arc::new(OfflineStore), utc(), POINTS_PER_SOLVE);
        assert!(repo.record_solve("u1", "q1", at(1, 9)).await.is_none());
        assert!(matches!(repo.get_user("u1").await, Resource::Error { .. }));
    }

    #[tokio::test]
    async fn subscribers_see_writes() {
        let repo = repo();
        repo.register("u1", "ada@example.com").await.unwrap();

        let mut rx = repo.subscribe("u1").await;
        assert_eq!(rx.borrow_and_update().as_ref().map(|u| u.current_streak), Some(0));

        repo.record_solve("u1", "q1", at(1, 9)).await.unwrap();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().as_ref().map(|u| u.current_streak), Some(1));
    }

    #[tokio::test]
    async fn same_day_resubmit_keeps_score() {
        let repo = repo();
        repo.register("u1", "ada@example.com").await.unwrap();
        let first = repo.record_solve("u1", "q1", at(1, 9)).await.unwrap();
        for _ in 0..50 {
            repo.record_solve("u1", "q1", at(1, 9)).await.unwrap();
        }
        let stored = repo.get_user("u1").await.into_data().unwrap();
        assert_eq!(stored, first);
        assert_eq!(stored.score, POINTS_PER_SOLVE);
        assert_eq!(stored.total_solved, 1);
    }

    #[tokio::test]
    async fn dropped_subscriptions_are_released() {
        let repo = repo();
        repo.register("u1", "ada@example.com").await.unwrap();

        let rx = repo.subscribe("u1").await;
        drop(rx);
        repo.unsubscribe("u1").await;
        assert!(repo.watchers.read().await.is_empty());

        for i in 0..1000 {
            drop(repo.subscribe(&format!("user-{i}")).await);
        }
        assert!(repo.watchers.read().await.len() <= 1);
    }

    #[tokio::test]
    async fn live_subscription_survives_unsubscribe_of_others() {
        let repo = repo();
        repo.register("u1", "ada@example.com").await.unwrap();
        let mut kept = repo.subscribe("u1").await;
        drop(repo.subscribe("u2").await);
        repo.unsubscribe("u1").await;
        repo.unsubscribe("u2").await;

        let watchers = repo.watchers.read().await;
        assert_eq!(watchers.len(), 1);
        assert!(watchers.contains_key("u1"));
        drop(watchers);

        repo.record_solve("u1", "q1", at(1, 9)).await.unwrap();
        kept.changed().await.unwrap();
        assert_eq!(kept.borrow().as_ref().map(|u| u.total_solved), Some(1));
    }

    #[tokio::test]
    async fn handle_can_be_linked_and_cleared() {
        let repo = repo();
        repo.register("u1", "ada@example.com").await.unwrap();
        repo.set_codeforces_handle("u1", Some("tourist")).await.unwrap();
        let user = repo.get_user("u1").await.into_data().unwrap();
        assert_eq!(user.codeforces_handle.as_deref(), Some("tourist"));

        repo.set_codeforces_handle("u1", None).await.unwrap();
        let user = repo.get_user("u1").await.into_data().unwrap();
        assert!(user.codeforces_handle.is_none());
    }
}
