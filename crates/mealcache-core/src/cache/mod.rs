//! Local storage and caching.
//!
//! This module provides a small key-value storage layer and the `MealStore`
//! that sits on top of it. The store keeps:
//!
//! - the selected school (persists until changed)
//! - up to three favorite schools
//! - a meal cache (6 hour TTL) and a school search cache (12 hour TTL)
//!
//! Entries are checked for age when read and are never swept proactively.

pub mod manager;
pub mod store;

pub use manager::{
    meal_cache_key, CachedData, MealStore, MEAL_CACHE_TTL_HOURS, SCHOOL_SEARCH_CACHE_TTL_HOURS,
};
pub use store::{FileStore, KeyValueStore, MemoryStore};
