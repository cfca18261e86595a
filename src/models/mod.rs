use serde::{Deserialize, Serialize};
use std::fmt::Display;

pub mod user;
pub mod watch_state;

pub use user::{AuthResponse, ContactMessage, LoginRequest, RegisterRequest, User};
pub use watch_state::{ItemState, MediaKind, WatchState, WatchStateEntry, WatchlistEntry};

/// Which kind of catalog record an endpoint returns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogKind {
    Movie,
    Show,
    Person,
}

impl Display for CatalogKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogKind::Movie => write!(f, "movie"),
            CatalogKind::Show => write!(f, "show"),
            CatalogKind::Person => write!(f, "person"),
        }
    }
}

impl From<MediaKind> for CatalogKind {
    fn from(kind: MediaKind) -> Self {
        match kind {
            MediaKind::Movie => CatalogKind::Movie,
            MediaKind::Show => CatalogKind::Show,
        }
    }
}

fn first_page() -> u32 {
    1
}

/// One page of a list endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Page<T> {
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default, bound(deserialize = "T: Deserialize<'de>"))]
    pub results: Vec<T>,
    #[serde(default = "first_page")]
    pub total_pages: u32,
    #[serde(default)]
    pub total_results: Option<u64>,
}

impl<T> Page<T> {
    /// Wraps a bare result list (some search endpoints return only the array)
    pub fn single(results: Vec<T>) -> Self {
        Self {
            page: 1,
            results,
            total_pages: 1,
            total_results: None,
        }
    }
}

// ============================================================================
// Catalog Items
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Movie {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: u64,
    #[serde(default)]
    pub popularity: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TvShow {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: u64,
    #[serde(default)]
    pub popularity: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Person {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub profile_path: Option<String>,
    #[serde(default)]
    pub known_for_department: Option<String>,
    #[serde(default)]
    pub popularity: f64,
}

/// A movie, TV show or person record from the catalog
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum CatalogItem {
    Movie(Movie),
    Show(TvShow),
    Person(Person),
}

impl CatalogItem {
    /// Decodes a raw record as the given kind
    pub fn from_value(kind: CatalogKind, value: serde_json::Value) -> serde_json::Result<Self> {
        Ok(match kind {
            CatalogKind::Movie => CatalogItem::Movie(serde_json::from_value(value)?),
            CatalogKind::Show => CatalogItem::Show(serde_json::from_value(value)?),
            CatalogKind::Person => CatalogItem::Person(serde_json::from_value(value)?),
        })
    }

    pub fn id(&self) -> i64 {
        match self {
            CatalogItem::Movie(m) => m.id,
            CatalogItem::Show(s) => s.id,
            CatalogItem::Person(p) => p.id,
        }
    }

    pub fn kind(&self) -> CatalogKind {
        match self {
            CatalogItem::Movie(_) => CatalogKind::Movie,
            CatalogItem::Show(_) => CatalogKind::Show,
            CatalogItem::Person(_) => CatalogKind::Person,
        }
    }

    /// Title for movies, name for shows and people
    pub fn display_name(&self) -> &str {
        match self {
            CatalogItem::Movie(m) => &m.title,
            CatalogItem::Show(s) => &s.name,
            CatalogItem::Person(p) => &p.name,
        }
    }

    /// Poster for movies and shows, profile picture for people
    pub fn image_path(&self) -> Option<&str> {
        match self {
            CatalogItem::Movie(m) => m.poster_path.as_deref(),
            CatalogItem::Show(s) => s.poster_path.as_deref(),
            CatalogItem::Person(p) => p.profile_path.as_deref(),
        }
    }

    pub fn vote_average(&self) -> Option<f64> {
        match self {
            CatalogItem::Movie(m) => Some(m.vote_average),
            CatalogItem::Show(s) => Some(s.vote_average),
            CatalogItem::Person(_) => None,
        }
    }
}

/// Scales a 0-10 vote average to a 0-5 star rating
pub fn star_rating(vote_average: f64) -> f64 {
    (vote_average / 2.0).clamp(0.0, 5.0)
}

// ============================================================================
// Detail Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieDetails {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub tagline: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub homepage: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TvShowDetails {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tagline: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub last_air_date: Option<String>,
    #[serde(default)]
    pub number_of_seasons: Option<u32>,
    #[serde(default)]
    pub number_of_episodes: Option<u32>,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersonDetails {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub biography: Option<String>,
    #[serde(default)]
    pub birthday: Option<String>,
    #[serde(default)]
    pub deathday: Option<String>,
    #[serde(default)]
    pub place_of_birth: Option<String>,
    #[serde(default)]
    pub profile_path: Option<String>,
    #[serde(default)]
    pub known_for_department: Option<String>,
    #[serde(default)]
    pub popularity: f64,
}

/// Trailer or clip attached to a movie or show
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Video {
    #[serde(default)]
    pub id: Option<String>,
    pub key: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub site: String,
    #[serde(rename = "type", default)]
    pub video_type: String,
    #[serde(default)]
    pub official: bool,
}

impl Video {
    /// Watch URL for videos hosted on YouTube
    pub fn youtube_url(&self) -> Option<String> {
        if self.site.eq_ignore_ascii_case("youtube") {
            Some(format!("https://www.youtube.com/watch?v={}", self.key))
        } else {
            None
        }
    }
}

/// Envelope returned by the video endpoints
#[derive(Debug, Deserialize)]
pub struct VideoList {
    #[serde(default)]
    pub results: Vec<Video>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_page_defaults_when_fields_missing() {
        let page: Page<Movie> = serde_json::from_value(json!({
            "results": [{ "id": 1, "title": "A" }]
        }))
        .unwrap();
        assert_eq!(page.page, 1);
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.results[0].title, "A");
        assert_eq!(page.results[0].poster_path, None);
    }

    #[test]
    fn test_catalog_item_decodes_by_kind() {
        let raw = json!({ "id": 1399, "name": "Game of Thrones", "poster_path": "/u3b.jpg", "vote_average": 8.4 });

        let show = CatalogItem::from_value(CatalogKind::Show, raw.clone()).unwrap();
        assert_eq!(show.kind(), CatalogKind::Show);
        assert_eq!(show.display_name(), "Game of Thrones");
        assert_eq!(show.image_path(), Some("/u3b.jpg"));
        assert_eq!(show.vote_average(), Some(8.4));

        let person = CatalogItem::from_value(CatalogKind::Person, raw).unwrap();
        assert_eq!(person.kind(), CatalogKind::Person);
        assert_eq!(person.image_path(), None);
        assert_eq!(person.vote_average(), None);
    }

    #[test]
    fn test_catalog_item_rejects_missing_id() {
        let result = CatalogItem::from_value(CatalogKind::Movie, json!({ "title": "No id" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_null_poster_is_none() {
        let movie: Movie =
            serde_json::from_value(json!({ "id": 5, "title": "X", "poster_path": null })).unwrap();
        assert_eq!(movie.poster_path, None);
    }

    #[test]
    fn test_star_rating_scales_and_caps() {
        assert_eq!(star_rating(8.0), 4.0);
        assert_eq!(star_rating(10.0), 5.0);
        assert_eq!(star_rating(12.5), 5.0);
        assert_eq!(star_rating(0.0), 0.0);
    }

    #[test]
    fn test_video_youtube_url() {
        let video: Video = serde_json::from_value(json!({
            "key": "dQw4w9WgXcQ", "name": "Trailer", "site": "YouTube", "type": "Trailer"
        }))
        .unwrap();
        assert_eq!(video.video_type, "Trailer");
        assert_eq!(
            video.youtube_url(),
            Some("https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_string())
        );

        let vimeo = Video {
            site: "Vimeo".to_string(),
            ..video
        };
        assert_eq!(vimeo.youtube_url(), None);
    }
}
