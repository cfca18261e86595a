use std::{fmt::Display, str::FromStr};

use crate::{error::AppError, models::CatalogKind};

/// Cache namespace of a list endpoint
///
/// Each namespace gets its own cache so keys can never collide across
/// resource types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Movies,
    Shows,
    People,
    Search,
}

/// Paginated list endpoints of the catalog API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListEndpoint {
    PopularMovies,
    TrendingMovies,
    TopRatedMovies,
    UpcomingMovies,
    NowPlayingMovies,
    PopularShows,
    TrendingShows,
    TopRatedShows,
    AiringTodayShows,
    PopularPeople,
    SearchPeople,
    SearchMovies,
    SearchShows,
    InTheatres,
    HomeTopRatedMovies,
    HomeTopRatedShows,
}

impl ListEndpoint {
    pub const ALL: [ListEndpoint; 16] = [
        ListEndpoint::PopularMovies,
        ListEndpoint::TrendingMovies,
        ListEndpoint::TopRatedMovies,
        ListEndpoint::UpcomingMovies,
        ListEndpoint::NowPlayingMovies,
        ListEndpoint::PopularShows,
        ListEndpoint::TrendingShows,
        ListEndpoint::TopRatedShows,
        ListEndpoint::AiringTodayShows,
        ListEndpoint::PopularPeople,
        ListEndpoint::SearchPeople,
        ListEndpoint::SearchMovies,
        ListEndpoint::SearchShows,
        ListEndpoint::InTheatres,
        ListEndpoint::HomeTopRatedMovies,
        ListEndpoint::HomeTopRatedShows,
    ];

    /// Request path relative to the API origin
    pub fn path(&self) -> &'static str {
        match self {
            ListEndpoint::PopularMovies => "/api/movies/popular",
            ListEndpoint::TrendingMovies => "/api/movies/trending",
            ListEndpoint::TopRatedMovies => "/api/movies/top-rated",
            ListEndpoint::UpcomingMovies => "/api/movies/upcoming",
            ListEndpoint::NowPlayingMovies => "/api/movies/now_playing",
            ListEndpoint::PopularShows => "/api/tv-shows/popular",
            ListEndpoint::TrendingShows => "/api/tv-shows/trending",
            ListEndpoint::TopRatedShows => "/api/tv-shows/top-rated",
            ListEndpoint::AiringTodayShows => "/api/tv-shows/airing-today",
            ListEndpoint::PopularPeople => "/api/people/popular",
            ListEndpoint::SearchPeople => "/api/search/popular",
            ListEndpoint::SearchMovies => "/api/search/movies",
            ListEndpoint::SearchShows => "/api/search/tv-shows",
            ListEndpoint::InTheatres => "/api/home/in-theatres",
            ListEndpoint::HomeTopRatedMovies => "/api/home/movie-top-rated",
            ListEndpoint::HomeTopRatedShows => "/api/home/show-top-rated",
        }
    }

    /// Short name used in cache keys, logs and on the command line
    pub fn name(&self) -> &'static str {
        self.path().trim_start_matches("/api/")
    }

    /// Record type in the `results` array
    pub fn kind(&self) -> CatalogKind {
        match self {
            ListEndpoint::PopularMovies
            | ListEndpoint::TrendingMovies
            | ListEndpoint::TopRatedMovies
            | ListEndpoint::UpcomingMovies
            | ListEndpoint::NowPlayingMovies
            | ListEndpoint::SearchMovies
            | ListEndpoint::InTheatres
            | ListEndpoint::HomeTopRatedMovies => CatalogKind::Movie,
            ListEndpoint::PopularShows
            | ListEndpoint::TrendingShows
            | ListEndpoint::TopRatedShows
            | ListEndpoint::AiringTodayShows
            | ListEndpoint::SearchShows
            | ListEndpoint::HomeTopRatedShows => CatalogKind::Show,
            ListEndpoint::PopularPeople | ListEndpoint::SearchPeople => CatalogKind::Person,
        }
    }

    pub fn namespace(&self) -> Namespace {
        if self.is_search() {
            return Namespace::Search;
        }
        match self.kind() {
            CatalogKind::Movie => Namespace::Movies,
            CatalogKind::Show => Namespace::Shows,
            CatalogKind::Person => Namespace::People,
        }
    }

    /// Search endpoints take a `query` parameter
    pub fn is_search(&self) -> bool {
        matches!(
            self,
            ListEndpoint::SearchPeople | ListEndpoint::SearchMovies | ListEndpoint::SearchShows
        )
    }
}

impl Display for ListEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ListEndpoint {
    type Err = AppError;

    /// Accepts the short name with or without the `/api/` prefix
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().trim_start_matches('/').trim_start_matches("api/");
        ListEndpoint::ALL
            .into_iter()
            .find(|endpoint| endpoint.name() == wanted)
            .ok_or_else(|| AppError::InvalidInput(format!("Unknown list endpoint: {}", s)))
    }
}
