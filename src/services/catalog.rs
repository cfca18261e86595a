/// Detail pages and home rails
///
/// Every region of a page is fetched concurrently and cached on its own, so
/// a failing recommendations call still renders details and videos.
use std::sync::Arc;

use crate::{
    api::{CatalogApi, ListEndpoint},
    cache::{CacheKey, Caches},
    models::{
        CatalogItem, CatalogKind, MediaKind, MovieDetails, PersonDetails, TvShowDetails, Video,
    },
    query::ListQuery,
    services::Section,
};

#[derive(Debug, Clone, PartialEq)]
pub struct MoviePage {
    pub details: Section<MovieDetails>,
    pub recommendations: Section<Vec<CatalogItem>>,
    pub videos: Section<Vec<Video>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShowPage {
    pub details: Section<TvShowDetails>,
    pub recommendations: Section<Vec<CatalogItem>>,
    pub videos: Section<Vec<Video>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HomeRails {
    pub in_theatres: Section<Vec<CatalogItem>>,
    pub top_rated_movies: Section<Vec<CatalogItem>>,
    pub top_rated_shows: Section<Vec<CatalogItem>>,
}

#[derive(Clone)]
pub struct CatalogService {
    api: Arc<dyn CatalogApi>,
    caches: Arc<Caches>,
}

impl CatalogService {
    pub fn new(api: Arc<dyn CatalogApi>, caches: Arc<Caches>) -> Self {
        Self { api, caches }
    }

    pub async fn movie_page(&self, id: i64) -> MoviePage {
        let key = CacheKey::Details(CatalogKind::Movie, id);
        let details = self
            .caches
            .movie_details
            .get_or_fetch(&key, || self.api.movie_details(id));
        let (details, recommendations, videos) = tokio::join!(
            details,
            self.recommendations(MediaKind::Movie, id),
            self.videos(MediaKind::Movie, id),
        );

        MoviePage {
            details: Section::from_result(details, "movie details"),
            recommendations: Section::from_result(recommendations, "movie recommendations"),
            videos: Section::from_result(videos, "movie videos"),
        }
    }

    pub async fn show_page(&self, id: i64) -> ShowPage {
        let key = CacheKey::Details(CatalogKind::Show, id);
        let details = self
            .caches
            .show_details
            .get_or_fetch(&key, || self.api.show_details(id));
        let (details, recommendations, videos) = tokio::join!(
            details,
            self.recommendations(MediaKind::Show, id),
            self.videos(MediaKind::Show, id),
        );

        ShowPage {
            details: Section::from_result(details, "show details"),
            recommendations: Section::from_result(recommendations, "show recommendations"),
            videos: Section::from_result(videos, "show videos"),
        }
    }

    pub async fn person(&self, id: i64) -> Section<PersonDetails> {
        let result = self
            .caches
            .person_details
            .get_or_fetch(&CacheKey::Details(CatalogKind::Person, id), || {
                self.api.person_details(id)
            })
            .await;
        Section::from_result(result, "person details")
    }

    pub async fn home(&self) -> HomeRails {
        let (in_theatres, top_rated_movies, top_rated_shows) = tokio::join!(
            self.rail(ListEndpoint::InTheatres),
            self.rail(ListEndpoint::HomeTopRatedMovies),
            self.rail(ListEndpoint::HomeTopRatedShows),
        );

        HomeRails {
            in_theatres,
            top_rated_movies,
            top_rated_shows,
        }
    }

    async fn rail(&self, endpoint: ListEndpoint) -> Section<Vec<CatalogItem>> {
        let query = ListQuery::default();
        let result = self
            .caches
            .for_list(endpoint.namespace())
            .get_or_fetch(&CacheKey::list(endpoint, &query), || {
                self.api.fetch_page(endpoint, &query)
            })
            .await;
        Section::from_result(result.map(|page| page.results), endpoint.name())
    }

    async fn recommendations(
        &self,
        kind: MediaKind,
        id: i64,
    ) -> crate::error::AppResult<Vec<CatalogItem>> {
        let cache = match kind {
            MediaKind::Movie => &self.caches.movies,
            MediaKind::Show => &self.caches.shows,
        };
        let page = cache
            .get_or_fetch(&CacheKey::Recommendations(kind.into(), id), || {
                self.api.recommendations(kind, id)
            })
            .await?;
        Ok(page.results)
    }

    async fn videos(&self, kind: MediaKind, id: i64) -> crate::error::AppResult<Vec<Video>> {
        self.caches
            .videos
            .get_or_fetch(&CacheKey::Videos(kind.into(), id), || {
                self.api.videos(kind, id)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::MockCatalogApi,
        error::AppError,
        models::{Movie, Page},
    };

    fn movie_details(id: i64) -> MovieDetails {
        serde_json::from_value(serde_json::json!({ "id": id, "title": "The Matrix" })).unwrap()
    }

    fn trailer() -> Video {
        serde_json::from_value(serde_json::json!({
            "key": "m8e-FF8MsqU", "name": "Trailer", "site": "YouTube", "type": "Trailer"
        }))
        .unwrap()
    }

    fn movie(id: i64) -> CatalogItem {
        CatalogItem::Movie(Movie {
            id,
            title: format!("Movie {}", id),
            overview: None,
            poster_path: None,
            backdrop_path: None,
            release_date: None,
            vote_average: 6.0,
            vote_count: 1,
            popularity: 1.0,
        })
    }

    #[tokio::test]
    async fn test_failed_recommendations_leave_other_sections() {
        let mut api = MockCatalogApi::new();
        api.expect_movie_details()
            .times(1)
            .returning(|id| Ok(movie_details(id)));
        api.expect_recommendations()
            .times(1)
            .returning(|_, _| Err(AppError::NotFound("recommendations".to_string())));
        api.expect_videos()
            .times(1)
            .returning(|_, _| Ok(vec![trailer()]));

        let service = CatalogService::new(Arc::new(api), Arc::new(Caches::default()));
        let page = service.movie_page(603).await;

        assert_eq!(page.details.ready().unwrap().title, "The Matrix");
        assert!(!page.recommendations.is_ready());
        assert_eq!(page.videos.ready().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_details_are_cached_but_failures_retried() {
        let mut api = MockCatalogApi::new();
        api.expect_movie_details()
            .times(1)
            .returning(|id| Ok(movie_details(id)));
        let mut seq = mockall::Sequence::new();
        api.expect_recommendations()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(AppError::Timeout("recs".to_string())));
        api.expect_recommendations()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(Page::single(vec![movie(604)])));
        api.expect_videos().times(1).returning(|_, _| Ok(vec![]));

        let caches = Arc::new(Caches::default());
        let service = CatalogService::new(Arc::new(api), caches.clone());

        service.movie_page(603).await;
        let second = service.movie_page(603).await;

        assert_eq!(second.recommendations.ready().unwrap()[0].id(), 604);
        assert!(caches
            .movie_details
            .contains(&CacheKey::Details(CatalogKind::Movie, 603)));
    }

    #[tokio::test]
    async fn test_home_rails_are_isolated() {
        let mut api = MockCatalogApi::new();
        api.expect_fetch_page()
            .times(3)
            .returning(|endpoint, _| match endpoint {
                ListEndpoint::HomeTopRatedShows => Err(AppError::ExternalApi {
                    status: 502,
                    message: "Unable to fetch data from TMDb".to_string(),
                }),
                _ => Ok(Page::single(vec![movie(1)])),
            });

        let service = CatalogService::new(Arc::new(api), Arc::new(Caches::default()));
        let rails = service.home().await;

        assert!(rails.in_theatres.is_ready());
        assert!(rails.top_rated_movies.is_ready());
        assert!(rails
            .top_rated_shows
            .error()
            .unwrap()
            .contains("Unable to fetch data"));
    }

    #[tokio::test]
    async fn test_person_not_found_is_a_failed_section() {
        let mut api = MockCatalogApi::new();
        api.expect_person_details()
            .returning(|id| Err(AppError::NotFound(format!("person {}", id))));

        let service = CatalogService::new(Arc::new(api), Arc::new(Caches::default()));
        assert_eq!(
            service.person(1).await,
            Section::Failed("Not found: person 1".to_string())
        );
    }
}
