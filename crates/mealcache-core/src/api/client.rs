//! API client for the NEIS Open API.
//!
//! `ApiClient` wraps both endpoints with the local caches: results are served
//! from the `MealStore` while fresh and written back after every fetch.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::cache::{meal_cache_key, MealStore};
use crate::config::Config;
use crate::models::{MealRecord, MealRow, School, SchoolRow};
use crate::utils::format_ymd;

use super::envelope::{parse_rows, Envelope};
use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout. The request is aborted once it elapses.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(8);

const SCHOOL_ENDPOINT: &str = "schoolInfo";
const MEAL_ENDPOINT: &str = "mealServiceDietInfo";

/// Page size for school search (first page only).
const SCHOOL_PAGE_SIZE: u32 = 50;

/// Page size for meals; a school week with three meals a day fits easily.
const MEAL_PAGE_SIZE: u32 = 200;

/// Build `<base>/<endpoint>?...`, skipping parameters with empty values.
pub fn build_url(base: &str, endpoint: &str, params: &[(&str, String)]) -> Result<Url, ApiError> {
    let raw = format!("{}/{}", base.trim_end_matches('/'), endpoint);
    Url::parse_with_params(
        &raw,
        params
            .iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(name, value)| (*name, value.as_str())),
    )
    .map_err(|e| ApiError::InvalidBaseUrl(format!("{}: {}", base, e)))
}

/// API client for NEIS.
/// Clone is cheap - reqwest::Client and the store are both reference counted.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    config: Config,
    store: Arc<MealStore>,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(config: Config, store: Arc<MealStore>) -> Result<Self, ApiError> {
        Self::with_timeout(config, store, REQUEST_TIMEOUT)
    }

    pub fn with_timeout(
        config: Config,
        store: Arc<MealStore>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("mealcache/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ApiError::Network)?;

        Ok(Self {
            client,
            config,
            store,
        })
    }

    pub fn store(&self) -> &Arc<MealStore> {
        &self.store
    }

    fn api_key(&self) -> Result<&str, ApiError> {
        self.config.api_key().ok_or(ApiError::ApiKeyMissing)
    }

    async fn fetch_json(&self, endpoint: &str, url: Url) -> Result<Value, ApiError> {
        // The URL carries the API key, so only the endpoint is logged
        debug!(endpoint, "Sending request");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(ApiError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(endpoint, status = status.as_u16(), "Request failed");
            return Err(ApiError::from_status(status, &body));
        }

        response.json().await.map_err(ApiError::from_reqwest)
    }

    /// Decode rows one by one; rows that don't fit the shape are skipped.
    fn decode_rows<T: DeserializeOwned>(endpoint: &str, rows: Vec<Value>) -> Vec<T> {
        rows.into_iter()
            .filter_map(|row| match serde_json::from_value(row) {
                Ok(decoded) => Some(decoded),
                Err(e) => {
                    debug!(endpoint, error = %e, "Skipping malformed row");
                    None
                }
            })
            .collect()
    }

    /// Log the upstream RESULT code and report whether the payload is an error.
    fn check_result(endpoint: &str, envelope: &Envelope) -> bool {
        match envelope.result {
            Some(ref result) if result.code.starts_with("ERROR") => {
                warn!(endpoint, code = %result.code, message = %result.message, "Upstream reported an error");
                true
            }
            Some(ref result) => {
                debug!(endpoint, code = %result.code, message = %result.message, "Upstream result");
                false
            }
            None => false,
        }
    }

    // ===== School Search =====

    /// Search schools by (partial) name.
    ///
    /// A blank query returns an empty list without touching the network.
    /// Fresh cached results are returned even when no API key is configured.
    pub async fn search_schools(&self, query: &str) -> Result<Vec<School>, ApiError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        if let Some(cached) = self.store.school_search_cache_get(query, Utc::now()) {
            debug!(query, count = cached.len(), "School search served from cache");
            return Ok(cached);
        }

        let key = self.api_key()?;
        let url = build_url(
            &self.config.api_base,
            SCHOOL_ENDPOINT,
            &[
                ("KEY", key.to_string()),
                ("Type", "json".to_string()),
                ("pIndex", "1".to_string()),
                ("pSize", SCHOOL_PAGE_SIZE.to_string()),
                ("SCHUL_NM", query.to_string()),
            ],
        )?;

        let payload = self.fetch_json(SCHOOL_ENDPOINT, url).await?;
        let envelope = parse_rows(&payload, SCHOOL_ENDPOINT);
        let upstream_error = Self::check_result(SCHOOL_ENDPOINT, &envelope);

        let rows: Vec<SchoolRow> = Self::decode_rows(SCHOOL_ENDPOINT, envelope.into_rows());
        let mut seen = HashSet::new();
        let schools: Vec<School> = rows
            .iter()
            .filter_map(SchoolRow::to_school)
            .filter(|s| seen.insert((s.office_code.clone(), s.school_code.clone())))
            .collect();

        info!(query, count = schools.len(), "School search complete");

        if !upstream_error {
            if let Err(e) = self.store.school_search_cache_set(query, &schools, Utc::now()) {
                warn!(error = %e, "Failed to cache school search");
            }
        }

        Ok(schools)
    }

    // ===== Meals =====

    /// Fetch all meal records for `school` between `from` and `to` (inclusive).
    pub async fn meals_for_range(
        &self,
        school: Option<&School>,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<MealRecord>, ApiError> {
        let key = self.api_key()?;
        let school = school
            .filter(|s| s.has_codes())
            .ok_or(ApiError::SchoolMissing)?;

        let from_ymd = format_ymd(from);
        let to_ymd = format_ymd(to);
        let cache_key = meal_cache_key(school, &from_ymd, &to_ymd);

        if let Some(cached) = self.store.meal_cache_get(&cache_key, Utc::now()) {
            debug!(cache_key = %cache_key, count = cached.len(), "Meals served from cache");
            return Ok(cached);
        }

        let url = build_url(
            &self.config.api_base,
            MEAL_ENDPOINT,
            &[
                ("KEY", key.to_string()),
                ("Type", "json".to_string()),
                ("pIndex", "1".to_string()),
                ("pSize", MEAL_PAGE_SIZE.to_string()),
                ("ATPT_OFCDC_SC_CODE", school.office_code.clone()),
                ("SD_SCHUL_CODE", school.school_code.clone()),
                ("MLSV_FROM_YMD", from_ymd),
                ("MLSV_TO_YMD", to_ymd),
            ],
        )?;

        let payload = self.fetch_json(MEAL_ENDPOINT, url).await?;
        let envelope = parse_rows(&payload, MEAL_ENDPOINT);
        let upstream_error = Self::check_result(MEAL_ENDPOINT, &envelope);

        let rows: Vec<MealRow> = Self::decode_rows(MEAL_ENDPOINT, envelope.into_rows());
        let meals: Vec<MealRecord> = rows.iter().map(MealRow::to_meal).collect();

        info!(school = %school.school_name, count = meals.len(), "Meals fetched");

        if !upstream_error {
            if let Err(e) = self.store.meal_cache_set(&cache_key, &meals, Utc::now()) {
                warn!(error = %e, "Failed to cache meals");
            }
        }

        Ok(meals)
    }
}

// ============================================================================
// Tests
// ============================================================================
