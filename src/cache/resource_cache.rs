use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use tokio::sync::OnceCell;

use crate::{
    api::endpoints::{ListEndpoint, Namespace},
    error::{AppError, AppResult},
    models::{CatalogItem, CatalogKind, MovieDetails, Page, PersonDetails, TvShowDetails, Video},
    query::ListQuery,
};

#[derive(Debug, Clone, PartialEq)]
pub enum CacheKey {
    List {
        endpoint: ListEndpoint,
        query: ListQuery,
    },
    Details(CatalogKind, i64),
    Recommendations(CatalogKind, i64),
    Videos(CatalogKind, i64),
}

impl CacheKey {
    pub fn list(endpoint: ListEndpoint, query: &ListQuery) -> Self {
        CacheKey::List {
            endpoint,
            query: query.clone(),
        }
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::List { endpoint, query } => write!(
                f,
                "list:{}:page={}:filters={}:query={}",
                endpoint,
                query.page,
                query.filters.canonical_json(),
                query.query.as_deref().unwrap_or_default()
            ),
            CacheKey::Details(kind, id) => write!(f, "details:{}:{}", kind, id),
            CacheKey::Recommendations(kind, id) => write!(f, "recs:{}:{}", kind, id),
            CacheKey::Videos(kind, id) => write!(f, "videos:{}:{}", kind, id),
        }
    }
}

struct Stored<V> {
    value: V,
    stored_at: Instant,
}

type Slot<V> = Arc<OnceCell<Stored<V>>>;

/// Session-lived, in-memory response cache for one resource namespace
///
/// Each key owns a slot that is filled at most once. Concurrent misses on the
/// same key wait on the same fetch instead of issuing their own request. A
/// failed fetch leaves the slot empty, so the next caller retries.
pub struct ResourceCache<V> {
    name: &'static str,
    ttl: Option<Duration>,
    slots: Mutex<HashMap<String, Slot<V>>>,
}

impl<V: Clone> std::fmt::Debug for ResourceCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceCache")
            .field("name", &self.name)
            .field("ttl", &self.ttl)
            .field("len", &self.len())
            .finish()
    }
}

impl<V: Clone> ResourceCache<V> {
    /// Creates an empty cache; `ttl` of `None` keeps entries for the whole session
    pub fn new(name: &'static str, ttl: Option<Duration>) -> Self {
        Self {
            name,
            ttl,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached value for `key`, or runs `fetch` and stores its result
    ///
    /// `fetch` is not invoked on a hit. Errors from `fetch` are returned to the
    /// caller and never stored.
    pub async fn get_or_fetch<F, Fut>(&self, key: &CacheKey, fetch: F) -> AppResult<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<V>>,
    {
        let cache_key = key.to_string();
        let slot = self.slot(&cache_key);

        if let Some(stored) = slot.get() {
            tracing::debug!(cache = self.name, cache_key = %cache_key, "Cache hit");
            return Ok(stored.value.clone());
        }

        let name = self.name;
        let logged_key = &cache_key;
        let stored = slot
            .get_or_try_init(move || async move {
                tracing::debug!(cache = name, cache_key = %logged_key, "Cache miss, fetching");
                let value = fetch().await?;
                Ok::<_, AppError>(Stored {
                    value,
                    stored_at: Instant::now(),
                })
            })
            .await?;

        Ok(stored.value.clone())
    }

    /// Fresh cached value for `key`, if any
    pub fn get(&self, key: &CacheKey) -> Option<V> {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots
            .get(&key.to_string())
            .and_then(|slot| slot.get())
            .filter(|stored| !self.is_expired(stored))
            .map(|stored| stored.value.clone())
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.get(key).is_some()
    }

    /// Number of filled entries
    pub fn len(&self) -> usize {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.values().filter(|slot| slot.initialized()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn invalidate(&self, key: &CacheKey) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        if slots.remove(&key.to_string()).is_some() {
            tracing::debug!(cache = self.name, cache_key = %key, "Cache entry invalidated");
        }
    }

    pub fn clear(&self) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.clear();
    }

    /// Slot for `key`, replacing it when the stored value has expired
    fn slot(&self, key: &str) -> Slot<V> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let slot = slots.entry(key.to_string()).or_default().clone();

        let expired = slot
            .get()
            .map(|stored| self.is_expired(stored))
            .unwrap_or(false);
        if !expired {
            return slot;
        }

        tracing::debug!(cache = self.name, cache_key = %key, "Cache entry expired");
        let fresh: Slot<V> = Arc::default();
        slots.insert(key.to_string(), fresh.clone());
        fresh
    }

    fn is_expired(&self, stored: &Stored<V>) -> bool {
        self.ttl
            .map(|ttl| stored.stored_at.elapsed() >= ttl)
            .unwrap_or(false)
    }
}

/// Every cache of a session, one per resource namespace
#[derive(Debug)]
pub struct Caches {
    pub movies: ResourceCache<Page<CatalogItem>>,
    pub shows: ResourceCache<Page<CatalogItem>>,
    pub people: ResourceCache<Page<CatalogItem>>,
    pub search: ResourceCache<Page<CatalogItem>>,
    pub movie_details: ResourceCache<MovieDetails>,
    pub show_details: ResourceCache<TvShowDetails>,
    pub person_details: ResourceCache<PersonDetails>,
    pub videos: ResourceCache<Vec<Video>>,
}

impl Default for Caches {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Caches {
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            movies: ResourceCache::new("movies", ttl),
            shows: ResourceCache::new("shows", ttl),
            people: ResourceCache::new("people", ttl),
            search: ResourceCache::new("search", ttl),
            movie_details: ResourceCache::new("movie_details", ttl),
            show_details: ResourceCache::new("show_details", ttl),
            person_details: ResourceCache::new("person_details", ttl),
            videos: ResourceCache::new("videos", ttl),
        }
    }

    /// Page cache for a list namespace
    pub fn for_list(&self, namespace: Namespace) -> &ResourceCache<Page<CatalogItem>> {
        match namespace {
            Namespace::Movies => &self.movies,
            Namespace::Shows => &self.shows,
            Namespace::People => &self.people,
            Namespace::Search => &self.search,
        }
    }

    pub fn clear(&self) {
        self.movies.clear();
        self.shows.clear();
        self.people.clear();
        self.search.clear();
        self.movie_details.clear();
        self.show_details.clear();
        self.person_details.clear();
        self.videos.clear();
    }
}
