//! Application state management for mealcache.
//!
//! This module contains the core `App` struct that holds all view state
//! (selected school, favorites, search overlay, meal views, toast) and
//! coordinates background fetches. Background tasks never touch `App`;
//! they report back through an MPSC channel drained on the UI loop.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::{Datelike, Local, NaiveDate, Utc};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use mealcache_core::api::{ApiClient, ApiError};
use mealcache_core::cache::{meal_cache_key, CachedData, FileStore, MealStore, MemoryStore};
use mealcache_core::config::Config;
use mealcache_core::models::{FavoriteChange, MealRecord, School, MAX_FAVORITES};
use mealcache_core::utils::{day_label, format_pretty, format_ymd, start_of_week_mon, week_dates};
use mealcache_core::view::{ErrorPanel, MealsView};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel.
const CHANNEL_BUFFER_SIZE: usize = 32;

/// Quiet period after the last keystroke before a school search is sent.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(260);

/// How long a toast stays on screen.
pub const TOAST_DURATION: Duration = Duration::from_millis(1800);

/// Maximum length for the school search input.
const MAX_QUERY_LENGTH: usize = 40;

// ============================================================================
// UI State Types
// ============================================================================

/// Meal views
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Today,
    Week,
}

impl View {
    pub fn title(&self) -> &'static str {
        match self {
            View::Today => "Today",
            View::Week => "This week",
        }
    }

    /// Get the other view (there are only two)
    pub fn toggle(&self) -> Self {
        match self {
            View::Today => View::Week,
            View::Week => View::Today,
        }
    }
}

/// Current UI focus area
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Content,
    Favorites,
}

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    Searching,
    ShowingHelp,
    ConfirmingQuit,
    Quitting,
}

/// State of the school search results area
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchState {
    /// Nothing searched yet (or the input is empty)
    Hint,
    Loading,
    Results,
    Failed(ErrorPanel),
}

/// Trailing-edge debounce driven by the UI tick.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending_since: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending_since: None,
        }
    }

    /// Record an input event; restarts the quiet period.
    pub fn touch(&mut self, now: Instant) {
        self.pending_since = Some(now);
    }

    pub fn cancel(&mut self) {
        self.pending_since = None;
    }

    /// True once per burst, when the quiet period has elapsed.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.pending_since {
            Some(since) if now.duration_since(since) >= self.delay => {
                self.pending_since = None;
                true
            }
            _ => false,
        }
    }
}

/// A transient status message.
#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    shown_at: Instant,
}

impl Toast {
    pub fn new(message: impl Into<String>, now: Instant) -> Self {
        Self {
            message: message.into(),
            shown_at: now,
        }
    }

    pub fn is_visible(&self, now: Instant) -> bool {
        now.duration_since(self.shown_at) < TOAST_DURATION
    }
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Results sent from background fetch tasks back to the main application.
enum TaskResult {
    /// School search finished for `query`
    Schools {
        query: String,
        result: Result<Vec<School>, ApiError>,
    },
    /// Meal fetch finished for `school` over `from..=to`
    Meals {
        school: School,
        from: NaiveDate,
        to: NaiveDate,
        result: Result<Vec<MealRecord>, ApiError>,
    },
}

// ============================================================================
// Main Application Struct
// ============================================================================

/// Main application state container
pub struct App {
    // Core services
    pub config: Config,
    pub store: Arc<MealStore>,
    pub api: ApiClient,

    // UI State
    pub state: AppState,
    pub view: View,
    pub focus: Focus,
    pub today: NaiveDate,

    // Schools
    pub selected_school: Option<School>,
    pub favorites: Vec<School>,
    pub favorite_selection: usize,
    pub manage_mode: bool,

    // Search overlay
    pub search_input: String,
    pub search_results: Vec<School>,
    pub search_selection: usize,
    pub search_state: SearchState,
    /// Query of the most recently issued search; older responses are dropped
    pub last_school_query: String,
    search_debounce: Debouncer,

    // Meals
    pub meals_view: MealsView,
    /// Fetch time of the shown meals, read back from the meal cache
    pub meals_cached: Option<CachedData<()>>,

    pub toast: Option<Toast>,

    // Background task channel
    task_rx: mpsc::Receiver<TaskResult>,
    task_tx: mpsc::Sender<TaskResult>,
}

impl App {
    /// Create a new application instance from the on-disk config and store
    pub fn new() -> Result<Self> {
        let config = match Config::load() {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Failed to load config, using defaults");
                let mut config = Config::default();
                config.apply_env();
                config
            }
        };
        debug!(has_key = config.has_api_key(), base = %config.api_base, "Config loaded");

        let cache_dir = config.cache_dir().unwrap_or_else(|_| PathBuf::from("./cache"));
        debug!(?cache_dir, "Cache directory configured");

        let store = match FileStore::new(cache_dir) {
            Ok(store) => MealStore::shared(store),
            Err(e) => {
                warn!(error = %e, "Storage unavailable, keeping state in memory");
                MealStore::shared(MemoryStore::new())
            }
        };

        Self::with_services(config, store)
    }

    pub fn with_services(config: Config, store: Arc<MealStore>) -> Result<Self> {
        let api = ApiClient::new(config.clone(), Arc::clone(&store))?;
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        Ok(Self {
            config,
            store,
            api,

            state: AppState::Normal,
            view: View::Today,
            focus: Focus::Content,
            today: Local::now().date_naive(),

            selected_school: None,
            favorites: Vec::new(),
            favorite_selection: 0,
            manage_mode: false,

            search_input: String::new(),
            search_results: Vec::new(),
            search_selection: 0,
            search_state: SearchState::Hint,
            last_school_query: String::new(),
            search_debounce: Debouncer::new(SEARCH_DEBOUNCE),

            meals_view: MealsView::NoSchool,
            meals_cached: None,
            toast: None,

            task_rx: rx,
            task_tx: tx,
        })
    }

    /// Restore favorites and the selected school, then load meals if possible.
    pub fn bootstrap(&mut self) {
        self.favorites = self.store.favorites();
        self.selected_school = self.store.selected_school();
        info!(
            favorites = self.favorites.len(),
            selected = ?self.selected_school.as_ref().map(|s| &s.school_name),
            "State restored"
        );

        if self.selected_school.is_some() {
            self.load_meals();
        } else if !self.config.has_api_key() {
            self.meals_view = MealsView::NeedsApiKey;
        }
    }

    // =========================================================================
    // Toasts and ticking
    // =========================================================================

    pub fn show_toast(&mut self, message: impl Into<String>) {
        self.toast = Some(Toast::new(message, Instant::now()));
    }

    /// The toast message, if one is still on screen.
    pub fn visible_toast(&self) -> Option<&str> {
        self.toast
            .as_ref()
            .filter(|t| t.is_visible(Instant::now()))
            .map(|t| t.message.as_str())
    }

    /// Periodic housekeeping: expire toasts, fire debounced searches, roll the date.
    pub fn tick(&mut self, now: Instant) {
        if self.toast.as_ref().is_some_and(|t| !t.is_visible(now)) {
            self.toast = None;
        }

        if self.search_debounce.fire(now) {
            let query = self.search_input.clone();
            self.do_school_search(&query);
        }

        self.set_today(Local::now().date_naive());
    }

    /// Roll the date; entering a new school week reloads meals.
    pub fn set_today(&mut self, today: NaiveDate) {
        if today == self.today {
            return;
        }
        let new_week = start_of_week_mon(today) != start_of_week_mon(self.today);
        info!(%today, new_week, "Date changed");
        self.today = today;
        if new_week && self.selected_school.is_some() {
            self.load_meals();
        }
    }

    // =========================================================================
    // Meals
    // =========================================================================

    pub fn week(&self) -> Vec<NaiveDate> {
        week_dates(self.today)
    }

    /// Load this week's meals for the selected school in the background.
    pub fn load_meals(&mut self) {
        if !self.config.has_api_key() {
            self.meals_view = MealsView::NeedsApiKey;
            return;
        }

        let Some(school) = self.selected_school.clone() else {
            self.meals_view = MealsView::NoSchool;
            return;
        };

        let week = self.week();
        let (Some(&from), Some(&to)) = (week.first(), week.last()) else {
            return;
        };

        self.meals_view = MealsView::Loading;
        self.meals_cached = None;
        info!(school = %school.school_name, %from, %to, "Loading meals");

        let api = self.api.clone();
        let tx = self.task_tx.clone();
        tokio::spawn(async move {
            let result = api.meals_for_range(Some(&school), from, to).await;
            Self::send_result(&tx, TaskResult::Meals { school, from, to, result }).await;
        });
    }

    /// Retry action for the meal area.
    pub fn retry_meals(&mut self) {
        if matches!(self.meals_view, MealsView::NeedsApiKey) {
            self.show_toast("Set NEIS_API_KEY and restart mealcache.");
            return;
        }
        self.load_meals();
    }

    /// Make `school` the selection, persist it, and load its meals.
    pub fn pick_school(&mut self, school: School, close: bool) {
        if let Err(e) = self.store.set_selected_school(&school) {
            warn!(error = %e, "Failed to save selected school");
        }
        self.show_toast(format!("{} selected", school.school_name));
        self.selected_school = Some(school);
        if close {
            self.close_search();
        }
        self.load_meals();
    }

    pub fn set_view(&mut self, view: View) {
        self.view = view;
    }

    pub fn today_meta(&self) -> String {
        format!("{} ({})", format_pretty(self.today), day_label(self.today))
    }

    pub fn week_meta(&self) -> String {
        let week = self.week();
        match (week.first(), week.last()) {
            (Some(&from), Some(&to)) => format!("{} ~ {}", format_pretty(from), format_pretty(to)),
            _ => String::new(),
        }
    }

    /// "updated 2h ago" for the loaded meals, when their fetch time is known.
    pub fn meals_age(&self) -> Option<String> {
        if !matches!(self.meals_view, MealsView::Loaded { .. }) {
            return None;
        }
        self.meals_cached
            .as_ref()
            .map(|stamp| format!("updated {}", stamp.age_display()))
    }

    pub fn build_info(&self) -> String {
        format!("mealcache v{} · {}", env!("CARGO_PKG_VERSION"), self.today.year())
    }

    // =========================================================================
    // Favorites
    // =========================================================================

    pub fn is_favorite(&self, school: &School) -> bool {
        self.favorites.iter().any(|f| f.same_school(school))
    }

    pub fn is_selected(&self, school: &School) -> bool {
        self.selected_school
            .as_ref()
            .is_some_and(|s| s.same_school(school))
    }

    pub fn toggle_favorite(&mut self, school: &School) {
        let (list, change) = match self.store.toggle_favorite(school) {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(error = %e, "Failed to save favorites");
                self.show_toast("Couldn't save favorites.");
                return;
            }
        };
        self.favorites = list;
        self.clamp_favorite_selection();

        let message = match change {
            FavoriteChange::Added => "Added to favorites.".to_string(),
            FavoriteChange::Removed => "Removed from favorites.".to_string(),
            FavoriteChange::LimitReached => {
                format!("You can keep up to {} favorites.", MAX_FAVORITES)
            }
        };
        self.show_toast(message);
    }

    pub fn remove_favorite(&mut self, school: &School) {
        match self.store.remove_favorite(school) {
            Ok(list) => {
                self.favorites = list;
                self.clamp_favorite_selection();
                self.show_toast("Removed from favorites.");
            }
            Err(e) => {
                error!(error = %e, "Failed to save favorites");
                self.show_toast("Couldn't save favorites.");
            }
        }
    }

    /// Enter on a favorite chip: remove it in manage mode, otherwise select it.
    pub fn activate_favorite(&mut self) {
        let Some(school) = self.favorites.get(self.favorite_selection).cloned() else {
            return;
        };
        if self.manage_mode {
            self.remove_favorite(&school);
        } else {
            self.pick_school(school, false);
        }
    }

    pub fn toggle_manage_mode(&mut self) {
        self.manage_mode = !self.manage_mode;
        if self.manage_mode {
            self.focus = Focus::Favorites;
            self.show_toast("Press Enter on a favorite to remove it.");
        } else {
            self.show_toast("Done managing favorites.");
        }
    }

    pub fn move_favorite_selection(&mut self, forward: bool) {
        if self.favorites.is_empty() {
            return;
        }
        let len = self.favorites.len();
        self.favorite_selection = if forward {
            (self.favorite_selection + 1) % len
        } else {
            (self.favorite_selection + len - 1) % len
        };
    }

    fn clamp_favorite_selection(&mut self) {
        self.favorite_selection = self
            .favorite_selection
            .min(self.favorites.len().saturating_sub(1));
    }

    // =========================================================================
    // School Search
    // =========================================================================

    pub fn open_search(&mut self) {
        self.state = AppState::Searching;
    }

    pub fn close_search(&mut self) {
        self.state = AppState::Normal;
    }

    pub fn push_search_char(&mut self, c: char) {
        if can_add_query_char(self.search_input.chars().count(), c) {
            self.search_input.push(c);
            self.search_debounce.touch(Instant::now());
        }
    }

    pub fn pop_search_char(&mut self) {
        if self.search_input.pop().is_some() {
            self.search_debounce.touch(Instant::now());
        }
    }

    pub fn clear_search(&mut self) {
        self.search_input.clear();
        self.search_debounce.cancel();
        self.do_school_search("");
    }

    /// Issue a search for `query`. The newest query wins; see `process_task_result`.
    pub fn do_school_search(&mut self, query: &str) {
        let query = query.trim().to_string();
        self.last_school_query = query.clone();

        if query.is_empty() {
            self.search_results.clear();
            self.search_selection = 0;
            self.search_state = SearchState::Hint;
            return;
        }

        self.search_results.clear();
        self.search_selection = 0;
        self.search_state = SearchState::Loading;
        debug!(query = %query, "Searching schools");

        let api = self.api.clone();
        let tx = self.task_tx.clone();
        tokio::spawn(async move {
            let result = api.search_schools(&query).await;
            Self::send_result(&tx, TaskResult::Schools { query, result }).await;
        });
    }

    pub fn retry_search(&mut self) {
        let query = self.last_school_query.clone();
        self.do_school_search(&query);
    }

    /// The highlighted school, only while results are on screen.
    pub fn selected_search_result(&self) -> Option<&School> {
        if self.search_state != SearchState::Results {
            return None;
        }
        self.search_results.get(self.search_selection)
    }

    pub fn move_search_selection(&mut self, down: bool) {
        if self.search_results.is_empty() {
            return;
        }
        self.search_selection = if down {
            (self.search_selection + 1).min(self.search_results.len() - 1)
        } else {
            self.search_selection.saturating_sub(1)
        };
    }

    pub fn pick_search_result(&mut self) {
        if let Some(school) = self.selected_search_result().cloned() {
            self.pick_school(school, true);
        }
    }

    pub fn toggle_search_result_favorite(&mut self) {
        if let Some(school) = self.selected_search_result().cloned() {
            self.toggle_favorite(&school);
        }
    }

    // =========================================================================
    // Background Tasks
    // =========================================================================

    /// Helper to send task results, logging any channel errors
    async fn send_result(tx: &mpsc::Sender<TaskResult>, result: TaskResult) {
        if let Err(e) = tx.send(result).await {
            error!(error = %e, "Failed to send task result - channel closed");
        }
    }

    /// Drain completed background tasks and apply their results
    pub fn check_background_tasks(&mut self) {
        while let Ok(result) = self.task_rx.try_recv() {
            self.process_task_result(result);
        }
    }

    fn process_task_result(&mut self, result: TaskResult) {
        match result {
            TaskResult::Schools { query, result } => {
                if query != self.last_school_query {
                    debug!(query = %query, latest = %self.last_school_query, "Discarding stale search result");
                    return;
                }
                match result {
                    Ok(schools) => {
                        self.search_results = schools;
                        self.search_selection = 0;
                        self.search_state = SearchState::Results;
                    }
                    Err(e) => {
                        warn!(error = %e, query = %query, "School search failed");
                        self.search_results.clear();
                        self.search_selection = 0;
                        self.search_state = SearchState::Failed(ErrorPanel::search(&e));
                    }
                }
            }
            TaskResult::Meals { school, from, to, result } => {
                if !self.is_selected(&school) {
                    debug!(school = %school.school_name, "Discarding meals for a school no longer selected");
                    return;
                }
                let week = self.week();
                if week.first() != Some(&from) || week.last() != Some(&to) {
                    debug!(%from, %to, "Discarding meals for a previous week");
                    return;
                }
                self.meals_view = match result {
                    Ok(meals) => {
                        let key = meal_cache_key(&school, &format_ymd(from), &format_ymd(to));
                        self.meals_cached = self
                            .store
                            .meal_cache_entry(&key, Utc::now())
                            .map(|entry| CachedData::at((), entry.cached_at));
                        MealsView::Loaded { meals }
                    }
                    Err(e) if e.is_configuration() => {
                        info!(error = %e, "Meals unavailable until configured");
                        MealsView::Failed(ErrorPanel::meals(&e))
                    }
                    Err(e) => {
                        warn!(error = %e, school = %school.school_name, "Meal load failed");
                        MealsView::Failed(ErrorPanel::meals(&e))
                    }
                };
            }
        }
    }
}

// ============================================================================
// Input validation helpers (exported for use in input.rs)
// ============================================================================

/// Check if a search query character should be accepted
pub fn can_add_query_char(current_len: usize, c: char) -> bool {
    current_len < MAX_QUERY_LENGTH && !c.is_control()
}

// ============================================================================
// Tests
// ============================================================================
