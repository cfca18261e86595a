use serde::{Deserialize, Serialize};
use serde_json::json;
use std::{fmt::Display, str::FromStr};

use crate::error::AppError;

/// Watch-state bucket a user can put a title in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WatchState {
    Completed,
    Watching,
    #[serde(rename = "Plan to Watch")]
    PlanToWatch,
    #[serde(rename = "On Hold")]
    OnHold,
    Dropped,
}

impl WatchState {
    pub const ALL: [WatchState; 5] = [
        WatchState::Completed,
        WatchState::Watching,
        WatchState::PlanToWatch,
        WatchState::OnHold,
        WatchState::Dropped,
    ];

    /// Label used in request and response bodies
    pub fn label(&self) -> &'static str {
        match self {
            WatchState::Completed => "Completed",
            WatchState::Watching => "Watching",
            WatchState::PlanToWatch => "Plan to Watch",
            WatchState::OnHold => "On Hold",
            WatchState::Dropped => "Dropped",
        }
    }

    /// Path segment used by the watchlist endpoints
    pub fn slug(&self) -> &'static str {
        match self {
            WatchState::Completed => "completed",
            WatchState::Watching => "watching",
            WatchState::PlanToWatch => "plan-to-watch",
            WatchState::OnHold => "on-hold",
            WatchState::Dropped => "dropped",
        }
    }
}

impl Display for WatchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for WatchState {
    type Err = AppError;

    /// Accepts either the label or the slug, ignoring case
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        WatchState::ALL
            .into_iter()
            .find(|state| {
                state.label().eq_ignore_ascii_case(wanted) || state.slug().eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| AppError::InvalidInput(format!("Unknown watch state: {}", s)))
    }
}

/// Kinds of titles that can carry a watch state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Movie,
    Show,
}

impl MediaKind {
    /// Field naming the item in state payloads
    pub fn id_field(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movie_id",
            MediaKind::Show => "tv_show_id",
        }
    }

    pub fn set_state_path(&self) -> &'static str {
        match self {
            MediaKind::Movie => "/api/set_movie_state",
            MediaKind::Show => "/api/set_tv_show_state",
        }
    }

    pub fn states_path(&self, user_id: i64) -> String {
        match self {
            MediaKind::Movie => format!("/api/get_movie_states/{}", user_id),
            MediaKind::Show => format!("/api/get_tv_show_states/{}", user_id),
        }
    }

    pub fn watchlist_path(&self, state: WatchState, user_id: i64) -> String {
        format!("{}/{}/{}", self.watchlist_root(), state.slug(), user_id)
    }

    pub fn watchlist_item_path(&self, state: WatchState, user_id: i64, item_id: i64) -> String {
        format!(
            "{}/{}/{}/{}",
            self.watchlist_root(),
            state.slug(),
            user_id,
            item_id
        )
    }

    fn watchlist_root(&self) -> &'static str {
        match self {
            MediaKind::Movie => "/api/watchlist",
            MediaKind::Show => "/api/tv-watchlist",
        }
    }

    /// Root of the catalog endpoints for this kind
    pub fn catalog_root(&self) -> &'static str {
        match self {
            MediaKind::Movie => "/api/movies",
            MediaKind::Show => "/api/tv-shows",
        }
    }
}

impl Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Movie => write!(f, "movie"),
            MediaKind::Show => write!(f, "show"),
        }
    }
}

/// A user's watch state for one title
#[derive(Debug, Clone, PartialEq)]
pub struct WatchStateEntry {
    pub user_id: i64,
    pub item_id: i64,
    pub kind: MediaKind,
    pub state: WatchState,
    pub title: String,
    pub image: Option<String>,
}

impl WatchStateEntry {
    /// Upsert body for the kind's set-state endpoint
    pub fn to_payload(&self) -> serde_json::Value {
        let mut payload = json!({
            "user_id": self.user_id,
            "state": self.state,
            "title": self.title,
            "image": self.image,
        });
        payload[self.kind.id_field()] = json!(self.item_id);
        payload
    }
}

/// Row returned by the get-states endpoints
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ItemState {
    #[serde(alias = "movie_id", alias = "tv_show_id")]
    pub item_id: i64,
    pub state: WatchState,
}

/// Row returned by the watchlist endpoints
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchlistEntry {
    #[serde(alias = "movie_id", alias = "tv_show_id")]
    pub item_id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, alias = "image")]
    pub image_path: Option<String>,
    #[serde(default)]
    pub state: Option<WatchState>,
}
