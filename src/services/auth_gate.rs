/// Shared identity resolution
///
/// One gate exists per session and every consumer reads the same status.
/// Resolution consults the session store before the network, and concurrent
/// callers share a single identity request. Sign-in and sign-out settle the
/// status directly; an identity response issued before them is discarded.
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use tokio::sync::{watch, Mutex};

use crate::{
    api::AccountApi,
    error::{AppError, AppResult},
    models::{LoginRequest, RegisterRequest, User},
    navigation::{NavigationMode, Navigator},
    session::{SessionStore, StoredSession},
};

#[derive(Debug, Clone, PartialEq)]
pub enum AuthStatus {
    Loading,
    Authenticated(User),
    Anonymous,
}

impl AuthStatus {
    pub fn is_loading(&self) -> bool {
        matches!(self, AuthStatus::Loading)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthStatus::Authenticated(_))
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            AuthStatus::Authenticated(user) => Some(user),
            _ => None,
        }
    }
}

/// Where a page sends the user once identity is known
///
/// With `redirect_if_found == false` anonymous users are sent away (pages that
/// need a session); with `true` signed-in users are (login and signup pages).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectPolicy {
    pub redirect_to: String,
    pub redirect_if_found: bool,
}

impl RedirectPolicy {
    pub fn require_login(login_path: impl Into<String>) -> Self {
        Self {
            redirect_to: login_path.into(),
            redirect_if_found: false,
        }
    }

    pub fn redirect_if_authenticated(target: impl Into<String>) -> Self {
        Self {
            redirect_to: target.into(),
            redirect_if_found: true,
        }
    }

    /// Navigation target for `status`, if any
    pub fn target_for(&self, status: &AuthStatus) -> Option<&str> {
        match status {
            AuthStatus::Loading => None,
            AuthStatus::Authenticated(_) if self.redirect_if_found => Some(&self.redirect_to),
            AuthStatus::Anonymous if !self.redirect_if_found => Some(&self.redirect_to),
            _ => None,
        }
    }
}

pub struct AuthGate {
    api: Arc<dyn AccountApi>,
    store: Arc<dyn SessionStore>,
    status: watch::Sender<AuthStatus>,
    resolving: Mutex<()>,
    /// Bumped by every sign-in or sign-out; guards store writes and publishes
    generation: StdMutex<u64>,
}

impl AuthGate {
    pub fn new(api: Arc<dyn AccountApi>, store: Arc<dyn SessionStore>) -> Self {
        let (status, _) = watch::channel(AuthStatus::Loading);
        Self {
            api,
            store,
            status,
            resolving: Mutex::new(()),
            generation: StdMutex::new(0),
        }
    }

    pub fn status(&self) -> AuthStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthStatus> {
        self.status.subscribe()
    }

    /// Resolves identity once; later calls return the settled status
    ///
    /// Never fails: any error while resolving settles on `Anonymous`.
    pub async fn resolve(&self) -> AuthStatus {
        let _guard = self.resolving.lock().await;

        let current = self.status();
        if !current.is_loading() {
            return current;
        }

        let status = match self.stored_session() {
            Some(session) => {
                if let Some(token) = session.session_token.clone() {
                    self.api.set_session_token(Some(token), session.expires_at);
                }
                tracing::debug!(user_id = session.user.id, "Identity restored from session store");
                AuthStatus::Authenticated(session.user)
            }
            None => return self.fetch_identity().await,
        };

        self.publish(status.clone());
        status
    }

    /// Re-checks identity against the server, e.g. when the window regains focus
    pub async fn revalidate(&self) -> AuthStatus {
        let _guard = self.resolving.lock().await;

        self.fetch_identity().await
    }

    /// Resolves identity, then applies `policy`
    ///
    /// Returns true when a navigation was issued.
    pub async fn enforce(&self, policy: &RedirectPolicy, navigator: &dyn Navigator) -> bool {
        self.resolve().await;
        self.apply_policy(policy, navigator)
    }

    /// Applies `policy` to the current status without resolving
    pub fn apply_policy(&self, policy: &RedirectPolicy, navigator: &dyn Navigator) -> bool {
        let status = self.status();
        match policy.target_for(&status) {
            Some(target) => {
                tracing::debug!(target = %target, "Auth policy redirect");
                navigator.navigate(target, NavigationMode::Replace);
                true
            }
            None => false,
        }
    }

    pub async fn login(&self, request: &LoginRequest) -> AppResult<User> {
        let response = self.api.login(request).await?;

        if let Some(token) = response.session_token.clone() {
            self.api.set_session_token(Some(token), response.expires_at);
        }

        let user = match response.user {
            Some(user) => user,
            None => self.api.current_user().await?.ok_or_else(|| {
                AppError::Unauthorized("Login succeeded but no session was established".to_string())
            })?,
        };

        let session =
            StoredSession::new(user.clone()).with_token(response.session_token, response.expires_at);
        self.settle(AuthStatus::Authenticated(user.clone()), Some(session));

        Ok(user)
    }

    /// Registers and signs in when the server hands back a session
    pub async fn register(&self, request: &RegisterRequest) -> AppResult<AuthStatus> {
        let response = self.api.register(request).await?;

        if let Some(token) = response.session_token.clone() {
            self.api.set_session_token(Some(token), response.expires_at);
        }

        let user = match response.user {
            Some(user) => Some(user),
            None => self.api.current_user().await?,
        };

        let status = match user {
            Some(user) => {
                let session = StoredSession::new(user.clone())
                    .with_token(response.session_token, response.expires_at);
                self.settle(AuthStatus::Authenticated(user.clone()), Some(session));
                AuthStatus::Authenticated(user)
            }
            None => {
                self.settle(AuthStatus::Anonymous, None);
                AuthStatus::Anonymous
            }
        };

        Ok(status)
    }

    /// Signs out; local state is cleared even when the server call fails
    pub async fn logout(&self) -> AppResult<()> {
        let result = self.api.logout().await;
        self.forget();
        result
    }

    pub async fn delete_account(&self) -> AppResult<()> {
        self.api.delete_account().await?;
        self.forget();
        Ok(())
    }

    fn stored_session(&self) -> Option<StoredSession> {
        match self.store.get() {
            Ok(Some(session)) if session.is_expired(chrono::Utc::now()) => {
                tracing::debug!("Stored session expired");
                if let Err(e) = self.store.clear() {
                    tracing::warn!(error = %e, "Failed to clear expired session");
                }
                None
            }
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read session store");
                None
            }
        }
    }

    /// Asks the server and publishes the answer, unless a sign-in or sign-out
    /// settled the status while the request was in flight
    async fn fetch_identity(&self) -> AuthStatus {
        let issued = *self.lock_generation();
        let result = self.api.current_user().await;

        let generation = self.lock_generation();
        if *generation != issued {
            tracing::debug!("Discarding superseded identity response");
            return self.status();
        }

        let status = match result {
            Ok(Some(user)) => {
                let session = match self.stored_session() {
                    Some(existing) if existing.user.id == user.id => StoredSession {
                        user: user.clone(),
                        ..existing
                    },
                    _ => StoredSession::new(user.clone()),
                };
                self.remember(session);
                AuthStatus::Authenticated(user)
            }
            Ok(None) => {
                self.forget_session();
                AuthStatus::Anonymous
            }
            Err(e) => {
                tracing::warn!(error = %e, "Identity check failed, treating as anonymous");
                AuthStatus::Anonymous
            }
        };
        self.publish(status.clone());
        drop(generation);
        status
    }

    fn remember(&self, session: StoredSession) {
        if let Err(e) = self.store.set(&session) {
            tracing::warn!(error = %e, "Failed to persist session");
        }
    }

    fn forget_session(&self) {
        if let Err(e) = self.store.clear() {
            tracing::warn!(error = %e, "Failed to clear session store");
        }
    }

    fn forget(&self) {
        self.api.set_session_token(None, None);
        self.settle(AuthStatus::Anonymous, None);
    }

    /// Publishes a status decided by sign-in or sign-out; identity requests
    /// already in flight are discarded when they return
    fn settle(&self, status: AuthStatus, session: Option<StoredSession>) {
        let mut generation = self.lock_generation();
        *generation += 1;
        match session {
            Some(session) => self.remember(session),
            None => self.forget_session(),
        }
        self.publish(status);
    }

    fn lock_generation(&self) -> std::sync::MutexGuard<'_, u64> {
        self.generation.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, status: AuthStatus) {
        let previous = self.status.send_replace(status.clone());
        if previous != status {
            match &status {
                AuthStatus::Authenticated(user) => {
                    tracing::info!(user_id = user.id, username = %user.username, "Authenticated")
                }
                AuthStatus::Anonymous => tracing::info!("Anonymous session"),
                AuthStatus::Loading => {}
            }
        }
    }
}
