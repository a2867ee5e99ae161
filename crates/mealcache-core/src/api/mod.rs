//! NEIS Open API client module.
//!
//! This module provides the `ApiClient` for the two endpoints the app uses:
//! `schoolInfo` (school search) and `mealServiceDietInfo` (meals for a date
//! range). Responses are normalised from the NEIS JSON envelope and cached in
//! the `MealStore`.
//!
//! The API authenticates with a plain `KEY` query parameter.

pub mod client;
pub mod envelope;
pub mod error;

pub use client::{build_url, ApiClient};
pub use envelope::{parse_rows, Envelope, ResultInfo};
pub use error::ApiError;
