pub mod api;
pub mod cache;
pub mod config;
pub mod context;
pub mod error;
pub mod images;
pub mod models;
pub mod navigation;
pub mod query;
pub mod services;
pub mod session;

pub use context::AppContext;
pub use error::{AppError, AppResult};
