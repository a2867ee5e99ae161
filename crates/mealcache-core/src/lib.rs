//! Core library for mealcache.
//!
//! Everything that does not touch the terminal lives here:
//!
//! - `api`: NEIS Open API client with cache-aware school search and meal fetch
//! - `cache`: key-value storage, favorites, selected school, and TTL caches
//! - `config`: API base URL, API key, and data directory
//! - `models`: schools, meal records, favorites, and dish parsing
//! - `view`: plain view models the frontends draw from
//! - `utils`: date and string formatting helpers

pub mod api;
pub mod cache;
pub mod config;
pub mod models;
pub mod utils;
pub mod view;

pub use api::{ApiClient, ApiError};
pub use cache::{KeyValueStore, MealStore};
pub use config::Config;
