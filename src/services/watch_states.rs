/// Per-item watch states for the signed-in user
///
/// Assignments are optimistic: the local map changes before the upsert is
/// sent, and a failed upsert restores the previous value.
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::{
    api::WatchStateApi,
    error::AppResult,
    models::{MediaKind, WatchState, WatchStateEntry},
    navigation::{NavigationMode, Navigator},
    services::auth_gate::{AuthGate, AuthStatus},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOutcome {
    Saved,
    /// Nobody is signed in; the user was sent to the login page
    RedirectedToLogin,
}

pub struct WatchStateTracker {
    kind: MediaKind,
    api: Arc<dyn WatchStateApi>,
    gate: Arc<AuthGate>,
    navigator: Arc<dyn Navigator>,
    login_path: String,
    states: Mutex<HashMap<i64, WatchState>>,
}

impl WatchStateTracker {
    pub fn new(
        kind: MediaKind,
        api: Arc<dyn WatchStateApi>,
        gate: Arc<AuthGate>,
        navigator: Arc<dyn Navigator>,
        login_path: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            api,
            gate,
            navigator,
            login_path: login_path.into(),
            states: Mutex::new(HashMap::new()),
        }
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn state_of(&self, item_id: i64) -> Option<WatchState> {
        self.lock_states().get(&item_id).copied()
    }

    pub fn states(&self) -> HashMap<i64, WatchState> {
        self.lock_states().clone()
    }

    /// Loads the user's saved states; anonymous users have none
    pub async fn load(&self) -> AppResult<usize> {
        let user = match self.gate.resolve().await {
            AuthStatus::Authenticated(user) => user,
            _ => {
                self.lock_states().clear();
                return Ok(0);
            }
        };

        let rows = self.api.get_states(self.kind, user.id).await?;
        let mut states = self.lock_states();
        states.clear();
        states.extend(rows.into_iter().map(|row| (row.item_id, row.state)));

        tracing::debug!(
            kind = %self.kind,
            user_id = user.id,
            count = states.len(),
            "Watch states loaded"
        );
        Ok(states.len())
    }

    /// Puts an item in a watch-state bucket
    ///
    /// Anonymous users are redirected to the login page and nothing is sent.
    /// On failure the previous state is restored and the error returned.
    pub async fn assign(
        &self,
        item_id: i64,
        title: &str,
        image: Option<&str>,
        state: WatchState,
    ) -> AppResult<AssignOutcome> {
        let user = match self.gate.resolve().await {
            AuthStatus::Authenticated(user) => user,
            _ => {
                tracing::debug!(kind = %self.kind, item_id, "Watch state needs a session");
                self.navigator.navigate(&self.login_path, NavigationMode::Push);
                return Ok(AssignOutcome::RedirectedToLogin);
            }
        };

        let previous = self.lock_states().insert(item_id, state);

        let entry = WatchStateEntry {
            user_id: user.id,
            item_id,
            kind: self.kind,
            state,
            title: title.to_string(),
            image: image.map(str::to_string),
        };

        match self.api.set_state(&entry).await {
            Ok(()) => Ok(AssignOutcome::Saved),
            Err(e) => {
                self.roll_back(item_id, state, previous);
                tracing::warn!(
                    kind = %self.kind,
                    item_id,
                    state = %state,
                    error = %e,
                    "Watch state update failed, rolled back"
                );
                Err(e)
            }
        }
    }

    /// Parses a user-facing label or slug, then assigns it
    pub async fn assign_label(
        &self,
        item_id: i64,
        title: &str,
        image: Option<&str>,
        label: &str,
    ) -> AppResult<AssignOutcome> {
        let state: WatchState = label.parse()?;
        self.assign(item_id, title, image, state).await
    }

    /// Restores `previous` unless a later assignment already replaced ours
    fn roll_back(&self, item_id: i64, ours: WatchState, previous: Option<WatchState>) {
        let mut states = self.lock_states();
        if states.get(&item_id) != Some(&ours) {
            return;
        }
        match previous {
            Some(previous) => {
                states.insert(item_id, previous);
            }
            None => {
                states.remove(&item_id);
            }
        }
    }

    fn lock_states(&self) -> MutexGuard<'_, HashMap<i64, WatchState>> {
        self.states.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
