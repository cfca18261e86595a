use crate::error::AppResult;

pub mod auth_gate;
pub mod catalog;
pub mod contact;
pub mod list_controller;
pub mod watch_states;
pub mod watchlists;

pub use auth_gate::{AuthGate, AuthStatus, RedirectPolicy};
pub use catalog::{CatalogService, HomeRails, MoviePage, ShowPage};
pub use contact::send_contact;
pub use list_controller::{ListController, ListView, LoadOutcome};
pub use watch_states::{AssignOutcome, WatchStateTracker};
pub use watchlists::Watchlists;

/// Independently loaded region of a view
///
/// A failed section carries the error message and never takes its siblings
/// down with it.
#[derive(Debug, Clone, PartialEq)]
pub enum Section<T> {
    Ready(T),
    Failed(String),
}

impl<T> Section<T> {
    /// Converts a fetch result, logging failures under `label`
    pub fn from_result(result: AppResult<T>, label: &str) -> Self {
        match result {
            Ok(value) => Section::Ready(value),
            Err(e) => {
                tracing::warn!(section = label, error = %e, "Section failed to load");
                Section::Failed(e.to_string())
            }
        }
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Section::Ready(value) => Some(value),
            Section::Failed(_) => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Section::Ready(_))
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Section::Ready(_) => None,
            Section::Failed(message) => Some(message),
        }
    }
}
