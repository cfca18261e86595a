/// Paginated, filterable list views
///
/// The URL query string is the source of truth: every page or filter change
/// rewrites it (replace, not push) and re-runs parse-and-fetch. Loads are
/// tagged with a generation number so that only the newest one updates the
/// view.
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::{
    api::{CatalogApi, ListEndpoint},
    cache::{CacheKey, Caches},
    models::CatalogItem,
    navigation::{NavigationMode, Navigator},
    query::{Filters, ListQuery},
};

/// What a list page renders
#[derive(Debug, Clone, PartialEq)]
pub struct ListView {
    pub items: Vec<CatalogItem>,
    pub page: u32,
    /// From the last successful fetch
    pub total_pages: Option<u32>,
    pub loading: bool,
    pub error: Option<String>,
    pub query: ListQuery,
}

impl Default for ListView {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            page: 1,
            total_pages: None,
            loading: false,
            error: None,
            query: ListQuery::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The response was written to the view (items or error)
    Applied,
    /// A newer load started first; the response was dropped
    Stale,
}

pub struct ListController {
    endpoint: ListEndpoint,
    api: Arc<dyn CatalogApi>,
    caches: Arc<Caches>,
    navigator: Arc<dyn Navigator>,
    generation: AtomicU64,
    view: Mutex<ListView>,
}

impl ListController {
    pub fn new(
        endpoint: ListEndpoint,
        api: Arc<dyn CatalogApi>,
        caches: Arc<Caches>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            endpoint,
            api,
            caches,
            navigator,
            generation: AtomicU64::new(0),
            view: Mutex::new(ListView::default()),
        }
    }

    pub fn endpoint(&self) -> ListEndpoint {
        self.endpoint
    }

    /// Snapshot of the current view
    pub fn view(&self) -> ListView {
        self.lock_view().clone()
    }

    pub fn current_page(&self) -> u32 {
        self.lock_view().page
    }

    pub fn total_pages(&self) -> Option<u32> {
        self.lock_view().total_pages
    }

    pub fn is_loading(&self) -> bool {
        self.lock_view().loading
    }

    pub fn has_next(&self) -> bool {
        let view = self.lock_view();
        match view.total_pages {
            Some(total) => view.page < total,
            None => false,
        }
    }

    pub fn has_previous(&self) -> bool {
        self.lock_view().page > 1
    }

    /// Mount and URL change entry point
    pub async fn on_location_change(&self, query_string: &str) -> LoadOutcome {
        self.load(ListQuery::parse(query_string)).await
    }

    /// Fetches `query` through the cache and applies the result if still current
    pub async fn load(&self, query: ListQuery) -> LoadOutcome {
        let token = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        {
            let mut view = self.lock_view();
            view.loading = true;
            view.page = query.page;
            view.query = query.clone();
        }

        let key = CacheKey::list(self.endpoint, &query);
        let api = self.api.clone();
        let endpoint = self.endpoint;
        let fetch_query = query.clone();
        let result = self
            .caches
            .for_list(endpoint.namespace())
            .get_or_fetch(&key, move || async move {
                api.fetch_page(endpoint, &fetch_query).await
            })
            .await;

        if self.generation.load(Ordering::SeqCst) != token {
            tracing::debug!(
                endpoint = %self.endpoint,
                page = query.page,
                "Discarding stale list response"
            );
            return LoadOutcome::Stale;
        }

        let mut view = self.lock_view();
        view.loading = false;
        match result {
            Ok(page) => {
                view.items = page.results;
                view.total_pages = Some(page.total_pages.max(1));
                view.error = None;
            }
            Err(e) => {
                tracing::warn!(
                    endpoint = %self.endpoint,
                    page = query.page,
                    error = %e,
                    "List fetch failed"
                );
                view.items.clear();
                view.error = Some(e.to_string());
            }
        }

        LoadOutcome::Applied
    }

    /// Jumps to `page`, clamped to `[1, total_pages]`
    pub async fn set_page(&self, page: i64) -> LoadOutcome {
        let (query, total) = {
            let view = self.lock_view();
            (view.query.clone(), view.total_pages)
        };

        let upper = i64::from(total.unwrap_or(u32::MAX));
        let page = page.clamp(1, upper.max(1));
        let page = u32::try_from(page).unwrap_or(1);

        self.navigate_and_load(query.with_page(page)).await
    }

    /// `None` when already on the last known page
    pub async fn next_page(&self) -> Option<LoadOutcome> {
        if !self.has_next() {
            return None;
        }
        let page = i64::from(self.current_page()) + 1;
        Some(self.set_page(page).await)
    }

    /// `None` when already on page 1
    pub async fn previous_page(&self) -> Option<LoadOutcome> {
        if !self.has_previous() {
            return None;
        }
        let page = i64::from(self.current_page()) - 1;
        Some(self.set_page(page).await)
    }

    /// Applies a new filter set; always lands on page 1
    pub async fn apply_filters(&self, filters: Filters) -> LoadOutcome {
        let query = self.lock_view().query.with_filters(filters);
        self.navigate_and_load(query).await
    }

    /// Sets the search text; always lands on page 1
    pub async fn search(&self, text: &str) -> LoadOutcome {
        let query = self.lock_view().query.with_search(text);
        self.navigate_and_load(query).await
    }

    async fn navigate_and_load(&self, query: ListQuery) -> LoadOutcome {
        let target = format!("?{}", query.to_query_string());
        self.navigator.navigate(&target, NavigationMode::Replace);
        self.load(query).await
    }

    fn lock_view(&self) -> std::sync::MutexGuard<'_, ListView> {
        self.view.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::{MockCatalogApi, Namespace},
        error::{AppError, AppResult},
        models::{Movie, MovieDetails, Page, PersonDetails, TvShowDetails, Video},
        navigation::{History, MockNavigator},
    };
    use mockall::predicate::eq;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn movie(id: i64, title: &str) -> CatalogItem {
        CatalogItem::Movie(Movie {
            id,
            title: title.to_string(),
            overview: None,
            poster_path: None,
            backdrop_path: None,
            release_date: None,
            vote_average: 7.0,
            vote_count: 10,
            popularity: 1.0,
        })
    }

    fn page_of(items: Vec<CatalogItem>, page: u32, total_pages: u32) -> Page<CatalogItem> {
        Page {
            page,
            results: items,
            total_pages,
            total_results: None,
        }
    }

    fn controller(api: impl CatalogApi + 'static) -> (ListController, Arc<Caches>, Arc<History>) {
        let caches = Arc::new(Caches::default());
        let history = Arc::new(History::new("/movies/popular"));
        let controller = ListController::new(
            ListEndpoint::PopularMovies,
            Arc::new(api),
            caches.clone(),
            history.clone(),
        );
        (controller, caches, history)
    }

    #[tokio::test]
    async fn test_popular_page_one_is_cached_and_rendered() {
        let mut api = MockCatalogApi::new();
        api.expect_fetch_page()
            .withf(|endpoint, query| {
                *endpoint == ListEndpoint::PopularMovies
                    && query.page == 1
                    && query.filters.is_empty()
            })
            .times(1)
            .returning(|_, _| Ok(page_of(vec![movie(1, "A")], 1, 5)));
        let (controller, caches, _) = controller(api);

        assert_eq!(controller.on_location_change("").await, LoadOutcome::Applied);

        let view = controller.view();
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.items[0].display_name(), "A");
        assert_eq!(view.total_pages, Some(5));
        assert!(!view.loading);
        assert!(view.error.is_none());

        let key = CacheKey::list(ListEndpoint::PopularMovies, &ListQuery::default());
        assert_eq!(key.to_string(), "list:movies/popular:page=1:filters={}:query=");
        assert!(caches.for_list(Namespace::Movies).contains(&key));
        assert!(caches.for_list(Namespace::Shows).is_empty());
    }

    #[tokio::test]
    async fn test_same_page_and_filters_fetch_once() {
        let mut api = MockCatalogApi::new();
        api.expect_fetch_page()
            .times(1)
            .returning(|_, _| Ok(page_of(vec![movie(1, "A")], 1, 5)));
        let (controller, _, _) = controller(api);

        let location = "page=1&filters=%7B%22sort_by%22%3A%22popularity.desc%22%7D";
        controller.on_location_change(location).await;
        controller.on_location_change(location).await;

        assert_eq!(controller.view().items.len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_location_normalizes() {
        let mut api = MockCatalogApi::new();
        api.expect_fetch_page()
            .withf(|_, query| query.page == 1 && query.filters.is_empty())
            .times(1)
            .returning(|_, _| Ok(page_of(vec![], 1, 1)));
        let (controller, _, _) = controller(api);

        controller
            .on_location_change("page=-5&filters=%7B%22genre%22%3A")
            .await;
        assert_eq!(controller.current_page(), 1);
        // Same key as above: served from cache
        controller.on_location_change("page=abc").await;
        controller.on_location_change("page=0&filters=[1,2]").await;
    }

    #[tokio::test]
    async fn test_failed_fetch_shows_error_and_retries() {
        let mut api = MockCatalogApi::new();
        let mut seq = mockall::Sequence::new();
        api.expect_fetch_page()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(AppError::Timeout("/api/movies/popular".to_string())));
        api.expect_fetch_page()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(page_of(vec![movie(1, "A")], 1, 5)));
        let (controller, _, _) = controller(api);

        controller.on_location_change("page=1").await;
        let view = controller.view();
        assert!(!view.loading);
        assert!(view.error.unwrap().contains("timed out"));
        assert!(view.items.is_empty());

        controller.on_location_change("page=1").await;
        let view = controller.view();
        assert!(view.error.is_none());
        assert_eq!(view.items.len(), 1);
    }

    #[tokio::test]
    async fn test_page_changes_replace_url_and_clamp() {
        let mut api = MockCatalogApi::new();
        api.expect_fetch_page()
            .returning(|_, query| {
                Ok(page_of(
                    vec![movie(i64::from(query.page), "X")],
                    query.page,
                    3,
                ))
            });
        let (controller, _, history) = controller(api);

        controller.on_location_change("page=1").await;
        assert!(controller.has_next());
        assert!(!controller.has_previous());

        controller.set_page(10).await;
        assert_eq!(controller.current_page(), 3);
        assert!(!controller.has_next());
        assert_eq!(controller.next_page().await, None);

        controller.set_page(-4).await;
        assert_eq!(controller.current_page(), 1);
        assert_eq!(controller.previous_page().await, None);

        assert_eq!(controller.next_page().await, Some(LoadOutcome::Applied));
        assert_eq!(controller.current_page(), 2);

        assert_eq!(history.len(), 1);
        assert_eq!(history.current().as_deref(), Some("?page=2&filters=%7B%7D"));
        assert!(history
            .navigations()
            .iter()
            .all(|(_, mode)| *mode == NavigationMode::Replace));
    }

    #[tokio::test]
    async fn test_apply_filters_resets_to_first_page() {
        let mut api = MockCatalogApi::new();
        api.expect_fetch_page()
            .returning(|_, query| Ok(page_of(vec![], query.page, 4)));

        let mut navigator = MockNavigator::new();
        navigator
            .expect_navigate()
            .with(
                eq("?page=1&filters=%7B%22genre%22%3A%2228%22%7D"),
                eq(NavigationMode::Replace),
            )
            .times(1)
            .return_const(());

        let controller = ListController::new(
            ListEndpoint::PopularMovies,
            Arc::new(api),
            Arc::new(Caches::default()),
            Arc::new(navigator),
        );

        controller.on_location_change("page=3").await;
        assert_eq!(controller.current_page(), 3);

        controller
            .apply_filters(Filters::new().with("genre", "28"))
            .await;
        assert_eq!(controller.current_page(), 1);
        assert_eq!(controller.view().query.filters.get("genre"), Some(&serde_json::json!("28")));
    }

    /// Serves pages after a per-page delay so responses can arrive out of order
    struct SlowCatalog {
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl CatalogApi for SlowCatalog {
        async fn fetch_page(
            &self,
            _endpoint: ListEndpoint,
            query: &ListQuery,
        ) -> AppResult<Page<CatalogItem>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let delay = if query.page == 1 { 80 } else { 10 };
            tokio::time::sleep(Duration::from_millis(delay)).await;
            Ok(page_of(
                vec![movie(i64::from(query.page), &format!("page {}", query.page))],
                query.page,
                5,
            ))
        }

        async fn movie_details(&self, id: i64) -> AppResult<MovieDetails> {
            Err(AppError::NotFound(format!("movie {}", id)))
        }

        async fn show_details(&self, id: i64) -> AppResult<TvShowDetails> {
            Err(AppError::NotFound(format!("show {}", id)))
        }

        async fn person_details(&self, id: i64) -> AppResult<PersonDetails> {
            Err(AppError::NotFound(format!("person {}", id)))
        }

        async fn recommendations(
            &self,
            _kind: crate::models::MediaKind,
            _id: i64,
        ) -> AppResult<Page<CatalogItem>> {
            Ok(Page::single(vec![]))
        }

        async fn videos(&self, _kind: crate::models::MediaKind, _id: i64) -> AppResult<Vec<Video>> {
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn test_late_response_for_old_page_is_discarded() {
        let (controller, _, _) = controller(SlowCatalog {
            calls: AtomicUsize::new(0),
        });

        let first = controller.on_location_change("page=1");
        let second = async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            controller.on_location_change("page=2").await
        };
        let (first, second) = tokio::join!(first, second);

        assert_eq!(first, LoadOutcome::Stale);
        assert_eq!(second, LoadOutcome::Applied);

        let view = controller.view();
        assert_eq!(view.page, 2);
        assert_eq!(view.items[0].display_name(), "page 2");
        assert!(!view.loading);
    }
}
