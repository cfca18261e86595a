use std::sync::Arc;

use crate::{
    api::{HttpApi, ListEndpoint},
    cache::Caches,
    config::Config,
    error::AppResult,
    images::ImageUrls,
    models::MediaKind,
    navigation::Navigator,
    services::{AuthGate, CatalogService, ListController, WatchStateTracker, Watchlists},
    session::{FileSessionStore, MemorySessionStore, SessionStore},
};

/// Everything one client session shares: the HTTP client, the caches and
/// the auth gate
#[derive(Clone)]
pub struct AppContext {
    pub config: Config,
    pub api: Arc<HttpApi>,
    pub caches: Arc<Caches>,
    pub gate: Arc<AuthGate>,
    pub images: ImageUrls,
}

impl AppContext {
    pub fn new(config: Config) -> AppResult<Self> {
        let api = Arc::new(HttpApi::new(&config)?);

        let store: Arc<dyn SessionStore> = match &config.session_file {
            Some(path) => Arc::new(FileSessionStore::new(path)),
            None => Arc::new(MemorySessionStore::default()),
        };

        let caches = Arc::new(Caches::new(config.cache_ttl()));
        let gate = Arc::new(AuthGate::new(api.clone(), store));
        let images = ImageUrls::new(&config.image_base_url);

        tracing::debug!(
            api_base_url = %config.api_base_url,
            cache_ttl_secs = ?config.cache_ttl_secs,
            "Client context ready"
        );

        Ok(Self {
            config,
            api,
            caches,
            gate,
            images,
        })
    }

    pub fn catalog(&self) -> CatalogService {
        CatalogService::new(self.api.clone(), self.caches.clone())
    }

    pub fn list_controller(
        &self,
        endpoint: ListEndpoint,
        navigator: Arc<dyn Navigator>,
    ) -> ListController {
        ListController::new(endpoint, self.api.clone(), self.caches.clone(), navigator)
    }

    pub fn watch_states(&self, kind: MediaKind, navigator: Arc<dyn Navigator>) -> WatchStateTracker {
        WatchStateTracker::new(
            kind,
            self.api.clone(),
            self.gate.clone(),
            navigator,
            self.config.login_path.clone(),
        )
    }

    pub fn watchlists(&self, kind: MediaKind) -> Watchlists {
        Watchlists::new(kind, self.api.clone(), self.gate.clone())
    }
}
