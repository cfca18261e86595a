/// REST API abstraction
///
/// The external API is split by concern into three traits so that services
/// depend only on what they use. `HttpApi` implements all of them against the
/// real server; tests substitute mocks.
use chrono::{DateTime, Utc};

use crate::{
    error::AppResult,
    models::{
        AuthResponse, CatalogItem, ContactMessage, ItemState, LoginRequest, MediaKind,
        MovieDetails, Page, PersonDetails, RegisterRequest, TvShowDetails, User, Video,
        WatchState, WatchStateEntry, WatchlistEntry,
    },
    query::ListQuery,
};

pub mod endpoints;
pub mod http;
pub mod request_id;

pub use endpoints::{ListEndpoint, Namespace};
pub use http::HttpApi;

/// Read-only catalog endpoints
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogApi: Send + Sync {
    /// Fetch one page of a list endpoint
    ///
    /// Results are decoded as the endpoint's record kind; records that fail to
    /// decode are skipped.
    async fn fetch_page(
        &self,
        endpoint: ListEndpoint,
        query: &ListQuery,
    ) -> AppResult<Page<CatalogItem>>;

    async fn movie_details(&self, id: i64) -> AppResult<MovieDetails>;

    async fn show_details(&self, id: i64) -> AppResult<TvShowDetails>;

    async fn person_details(&self, id: i64) -> AppResult<PersonDetails>;

    async fn recommendations(&self, kind: MediaKind, id: i64) -> AppResult<Page<CatalogItem>>;

    async fn videos(&self, kind: MediaKind, id: i64) -> AppResult<Vec<Video>>;
}

/// Identity, account and contact endpoints
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait AccountApi: Send + Sync {
    /// Current identity; `None` when the server reports no session
    async fn current_user(&self) -> AppResult<Option<User>>;

    async fn login(&self, request: &LoginRequest) -> AppResult<AuthResponse>;

    async fn register(&self, request: &RegisterRequest) -> AppResult<AuthResponse>;

    async fn logout(&self) -> AppResult<()>;

    async fn delete_account(&self) -> AppResult<()>;

    async fn send_contact(&self, message: &ContactMessage) -> AppResult<()>;

    /// Attach (or drop) the `session_token` cookie on subsequent requests
    fn set_session_token(&self, token: Option<String>, expires_at: Option<DateTime<Utc>>);
}

/// Per-user watch-state endpoints
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait WatchStateApi: Send + Sync {
    async fn get_states(&self, kind: MediaKind, user_id: i64) -> AppResult<Vec<ItemState>>;

    /// Upsert one entry
    async fn set_state(&self, entry: &WatchStateEntry) -> AppResult<()>;

    async fn watchlist(
        &self,
        kind: MediaKind,
        state: WatchState,
        user_id: i64,
    ) -> AppResult<Vec<WatchlistEntry>>;

    async fn remove_from_watchlist(
        &self,
        kind: MediaKind,
        state: WatchState,
        user_id: i64,
        item_id: i64,
    ) -> AppResult<()>;
}
