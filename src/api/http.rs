/// reqwest-backed implementation of the API traits
///
/// One client is shared by every service. It carries the cookie jar, so the
/// session cookie set by `/api/login` rides along on later calls.
use chrono::{DateTime, Utc};
use reqwest::{cookie::Jar, Client as HttpClient, Method, RequestBuilder};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::Instrument;
use url::Url;

use crate::{
    api::{
        request_id::{make_span_with_request_id, tag_request},
        AccountApi, CatalogApi, ListEndpoint, WatchStateApi,
    },
    config::Config,
    error::{AppError, AppResult},
    models::{
        AuthResponse, CatalogItem, CatalogKind, ContactMessage, ItemState, LoginRequest,
        MediaKind, MovieDetails, Page, PersonDetails, RegisterRequest, TvShowDetails, User, Video,
        VideoList, WatchState, WatchStateEntry, WatchlistEntry,
    },
    query::ListQuery,
    session::{expired_session_cookie, session_cookie},
};

/// List bodies come either as a page envelope or, from some search
/// endpoints, as a bare array
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ListBody {
    List(Vec<Value>),
    Page(Page<Value>),
}

impl ListBody {
    fn into_page(self, kind: CatalogKind) -> Page<CatalogItem> {
        let raw = match self {
            ListBody::List(results) => Page::single(results),
            ListBody::Page(page) => page,
        };

        let results = raw
            .results
            .into_iter()
            .filter_map(|value| match CatalogItem::from_value(kind, value) {
                Ok(item) => Some(item),
                Err(e) => {
                    tracing::debug!(kind = %kind, error = %e, "Skipping malformed record");
                    None
                }
            })
            .collect();

        Page {
            page: raw.page,
            results,
            total_pages: raw.total_pages,
            total_results: raw.total_results,
        }
    }
}

#[derive(Clone)]
pub struct HttpApi {
    http_client: HttpClient,
    base_url: Url,
    cookies: Arc<Jar>,
}

impl HttpApi {
    pub fn new(config: &Config) -> AppResult<Self> {
        let base_url = Url::parse(&config.api_base_url).map_err(|e| {
            AppError::InvalidInput(format!("Invalid API base URL {}: {}", config.api_base_url, e))
        })?;

        let cookies = Arc::new(Jar::default());
        let http_client = HttpClient::builder()
            .timeout(config.request_timeout())
            .cookie_provider(cookies.clone())
            .build()?;

        Ok(Self {
            http_client,
            base_url,
            cookies,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> AppResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| AppError::Internal(format!("Invalid request path {}: {}", path, e)))
    }

    fn request(&self, method: Method, path: &str) -> AppResult<RequestBuilder> {
        Ok(self.http_client.request(method, self.url(path)?))
    }

    /// Sends a request and returns the body of a successful response
    async fn execute(
        &self,
        builder: RequestBuilder,
        method: &Method,
        path: &str,
    ) -> AppResult<String> {
        let (builder, request_id) = tag_request(builder);
        let span = make_span_with_request_id(method.as_str(), path, &request_id);

        async move {
            let response = builder.send().await.map_err(|e| transport_error(path, e))?;
            let status = response.status();
            let body = response.text().await.map_err(|e| transport_error(path, e))?;

            if !status.is_success() {
                tracing::debug!(status = status.as_u16(), "API request failed");
                return Err(AppError::from_status(status, &body));
            }

            Ok(body)
        }
        .instrument(span)
        .await
    }

    async fn get_text(&self, path: &str, params: &[(String, String)]) -> AppResult<String> {
        let builder = self.request(Method::GET, path)?.query(params);
        self.execute(builder, &Method::GET, path).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> AppResult<T> {
        let body = self.get_text(path, &[]).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        payload: &B,
    ) -> AppResult<String> {
        let builder = self.request(method.clone(), path)?.json(payload);
        self.execute(builder, &method, path).await
    }

    async fn fetch_list(
        &self,
        path: &str,
        kind: CatalogKind,
        params: &[(String, String)],
    ) -> AppResult<Page<CatalogItem>> {
        let body = self.get_text(path, params).await?;
        let list: ListBody = serde_json::from_str(&body)?;
        Ok(list.into_page(kind))
    }

    /// Auth bodies may be empty; treat that as a response with no fields
    fn parse_auth_response(body: &str) -> AppResult<AuthResponse> {
        if body.trim().is_empty() {
            return Ok(AuthResponse::default());
        }
        Ok(serde_json::from_str(body)?)
    }
}

fn transport_error(path: &str, error: reqwest::Error) -> AppError {
    if error.is_timeout() {
        AppError::Timeout(path.to_string())
    } else {
        AppError::HttpClient(error)
    }
}

/// `GET /api/user` answers with the user, or with an empty/`null`/`{}` body
/// when nobody is signed in
fn parse_current_user(body: &str) -> AppResult<Option<User>> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let value: Value = serde_json::from_str(trimmed)?;
    match value {
        Value::Null => Ok(None),
        Value::Object(ref map) if map.is_empty() => Ok(None),
        Value::Object(ref map) if map.contains_key("user") => {
            Ok(serde_json::from_value(map["user"].clone())?)
        }
        other => Ok(Some(serde_json::from_value(other)?)),
    }
}

#[async_trait::async_trait]
impl CatalogApi for HttpApi {
    async fn fetch_page(
        &self,
        endpoint: ListEndpoint,
        query: &ListQuery,
    ) -> AppResult<Page<CatalogItem>> {
        let page = self
            .fetch_list(endpoint.path(), endpoint.kind(), &query.to_params())
            .await?;

        tracing::info!(
            endpoint = %endpoint,
            page = query.page,
            results = page.results.len(),
            total_pages = page.total_pages,
            "List page fetched"
        );

        Ok(page)
    }

    async fn movie_details(&self, id: i64) -> AppResult<MovieDetails> {
        self.get_json(&format!("{}/{}", MediaKind::Movie.catalog_root(), id))
            .await
    }

    async fn show_details(&self, id: i64) -> AppResult<TvShowDetails> {
        self.get_json(&format!("{}/{}", MediaKind::Show.catalog_root(), id))
            .await
    }

    async fn person_details(&self, id: i64) -> AppResult<PersonDetails> {
        self.get_json(&format!("/api/people/{}", id)).await
    }

    async fn recommendations(&self, kind: MediaKind, id: i64) -> AppResult<Page<CatalogItem>> {
        let path = format!("{}/recommendations/{}", kind.catalog_root(), id);
        self.fetch_list(&path, kind.into(), &[]).await
    }

    async fn videos(&self, kind: MediaKind, id: i64) -> AppResult<Vec<Video>> {
        let path = format!("{}/video/{}", kind.catalog_root(), id);
        let list: VideoList = self.get_json(&path).await?;
        Ok(list.results)
    }
}

#[async_trait::async_trait]
impl AccountApi for HttpApi {
    async fn current_user(&self) -> AppResult<Option<User>> {
        match self.get_text("/api/user", &[]).await {
            Ok(body) => parse_current_user(&body),
            Err(e) if e.is_auth_failure() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn login(&self, request: &LoginRequest) -> AppResult<AuthResponse> {
        let body = self.send_json(Method::POST, "/api/login", request).await?;
        let response = Self::parse_auth_response(&body)?;
        tracing::info!(username = %request.username, "Logged in");
        Ok(response)
    }

    async fn register(&self, request: &RegisterRequest) -> AppResult<AuthResponse> {
        let body = self.send_json(Method::POST, "/api/register", request).await?;
        let response = Self::parse_auth_response(&body)?;
        tracing::info!(username = %request.username, "Registered");
        Ok(response)
    }

    async fn logout(&self) -> AppResult<()> {
        self.get_text("/api/logout", &[]).await?;
        Ok(())
    }

    async fn delete_account(&self) -> AppResult<()> {
        let builder = self.request(Method::DELETE, "/api/delete-account")?;
        self.execute(builder, &Method::DELETE, "/api/delete-account")
            .await?;
        Ok(())
    }

    async fn send_contact(&self, message: &ContactMessage) -> AppResult<()> {
        self.send_json(Method::POST, "/api/contact", message).await?;
        Ok(())
    }

    fn set_session_token(&self, token: Option<String>, expires_at: Option<DateTime<Utc>>) {
        let cookie = match token {
            Some(token) => {
                let secure = self.base_url.scheme() == "https";
                session_cookie(&token, expires_at, secure)
            }
            None => expired_session_cookie(),
        };
        self.cookies.add_cookie_str(&cookie, &self.base_url);
    }
}

#[async_trait::async_trait]
impl WatchStateApi for HttpApi {
    async fn get_states(&self, kind: MediaKind, user_id: i64) -> AppResult<Vec<ItemState>> {
        self.get_json(&kind.states_path(user_id)).await
    }

    async fn set_state(&self, entry: &WatchStateEntry) -> AppResult<()> {
        self.send_json(Method::POST, entry.kind.set_state_path(), &entry.to_payload())
            .await?;

        tracing::info!(
            kind = %entry.kind,
            item_id = entry.item_id,
            state = %entry.state,
            "Watch state saved"
        );

        Ok(())
    }

    async fn watchlist(
        &self,
        kind: MediaKind,
        state: WatchState,
        user_id: i64,
    ) -> AppResult<Vec<WatchlistEntry>> {
        self.get_json(&kind.watchlist_path(state, user_id)).await
    }

    async fn remove_from_watchlist(
        &self,
        kind: MediaKind,
        state: WatchState,
        user_id: i64,
        item_id: i64,
    ) -> AppResult<()> {
        let path = kind.watchlist_item_path(state, user_id, item_id);
        let builder = self.request(Method::DELETE, &path)?;
        self.execute(builder, &Method::DELETE, &path).await?;
        Ok(())
    }
}
