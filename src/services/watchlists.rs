use futures::future::join_all;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::{
    api::WatchStateApi,
    error::{AppError, AppResult},
    models::{MediaKind, User, WatchState, WatchlistEntry},
    services::{
        auth_gate::{AuthGate, AuthStatus},
        Section,
    },
};

/// The profile page's five watch-state buckets for one kind
///
/// Buckets load concurrently and independently; one failing bucket does not
/// hide the others.
pub struct Watchlists {
    kind: MediaKind,
    api: Arc<dyn WatchStateApi>,
    gate: Arc<AuthGate>,
    buckets: Mutex<HashMap<WatchState, Section<Vec<WatchlistEntry>>>>,
}

impl Watchlists {
    pub fn new(kind: MediaKind, api: Arc<dyn WatchStateApi>, gate: Arc<AuthGate>) -> Self {
        Self {
            kind,
            api,
            gate,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Reloads every bucket
    pub async fn refresh(&self) -> AppResult<()> {
        let user = self.signed_in_user().await?;
        let user_id = user.id;

        let fetches = WatchState::ALL.into_iter().map(|state| {
            let api = self.api.clone();
            let kind = self.kind;
            async move { (state, api.watchlist(kind, state, user_id).await) }
        });
        let results = join_all(fetches).await;

        let mut buckets = self.buckets.lock().unwrap_or_else(PoisonError::into_inner);
        for (state, result) in results {
            buckets.insert(state, Section::from_result(result, state.slug()));
        }

        tracing::info!(kind = %self.kind, user_id, "Watchlists refreshed");
        Ok(())
    }

    pub fn bucket(&self, state: WatchState) -> Option<Section<Vec<WatchlistEntry>>> {
        self.buckets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&state)
            .cloned()
    }

    /// Removes an item from a bucket, then reloads that bucket
    pub async fn remove(&self, state: WatchState, item_id: i64) -> AppResult<()> {
        let user = self.signed_in_user().await?;

        self.api
            .remove_from_watchlist(self.kind, state, user.id, item_id)
            .await?;
        tracing::info!(kind = %self.kind, state = %state, item_id, "Removed from watchlist");

        let reloaded = self.api.watchlist(self.kind, state, user.id).await;
        self.buckets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(state, Section::from_result(reloaded, state.slug()));
        Ok(())
    }

    async fn signed_in_user(&self) -> AppResult<User> {
        match self.gate.resolve().await {
            AuthStatus::Authenticated(user) => Ok(user),
            _ => Err(AppError::Unauthorized(
                "Sign in to see your watchlists".to_string(),
            )),
        }
    }
}
