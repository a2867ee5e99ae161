//! View models for the meal screens.
//!
//! Plain data built from meal records and errors. Frontends only decide how
//! to draw them.

use chrono::NaiveDate;

use crate::api::ApiError;
use crate::models::{find_meal_for_day, parse_dish_text, DishItem, MealRecord};
use crate::utils::format_ymd;

/// Dish names shown per day in the week view before "more".
pub const WEEK_PREVIEW_ITEMS: usize = 5;

/// Label used when NEIS leaves the meal type blank.
const DEFAULT_MEAL_TYPE: &str = "급식";

/// What the "today" card shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MealCard {
    /// No meal is served on this day.
    NotProvided,
    /// A meal record exists but carries no dishes.
    Empty,
    Meal {
        date: NaiveDate,
        meal_type: String,
        calories: Option<String>,
        items: Vec<DishItem>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekMeal {
    pub meal_type: String,
    pub preview: Vec<String>,
    /// More dishes exist than `preview` holds
    pub more: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekDay {
    pub date: NaiveDate,
    pub meal: Option<WeekMeal>,
}

impl WeekDay {
    pub fn is_served(&self) -> bool {
        self.meal.is_some()
    }
}

fn meal_type_label(record: &MealRecord) -> String {
    if record.meal_type.trim().is_empty() {
        DEFAULT_MEAL_TYPE.to_string()
    } else {
        record.meal_type.clone()
    }
}

pub fn build_today(meals: &[MealRecord], today: NaiveDate) -> MealCard {
    let Some(record) = find_meal_for_day(meals, &format_ymd(today)) else {
        return MealCard::NotProvided;
    };

    let items = parse_dish_text(&record.dish);
    if items.is_empty() {
        return MealCard::Empty;
    }

    let calories = Some(record.calories.trim())
        .filter(|c| !c.is_empty())
        .map(str::to_string);

    MealCard::Meal {
        date: today,
        meal_type: meal_type_label(record),
        calories,
        items,
    }
}

pub fn build_week(meals: &[MealRecord], dates: &[NaiveDate]) -> Vec<WeekDay> {
    dates
        .iter()
        .map(|&date| {
            let meal = find_meal_for_day(meals, &format_ymd(date)).map(|record| {
                let items = parse_dish_text(&record.dish);
                WeekMeal {
                    meal_type: meal_type_label(record),
                    more: items.len() > WEEK_PREVIEW_ITEMS,
                    preview: items
                        .into_iter()
                        .take(WEEK_PREVIEW_ITEMS)
                        .map(|item| item.name)
                        .collect(),
                }
            });
            WeekDay { date, meal }
        })
        .collect()
}

/// An error shown in place of content, with a manual retry action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorPanel {
    pub title: String,
    pub desc: String,
    pub retry_label: String,
}

const API_KEY_HINT: &str =
    "The NEIS Open API key is empty. Set NEIS_API_KEY or api_key in config.json.";

impl ErrorPanel {
    pub fn api_key_missing() -> Self {
        Self {
            title: "An API key is required".to_string(),
            desc: "Get a NEIS Open API key and set NEIS_API_KEY (or run mealcache --set-key <key>)."
                .to_string(),
            retry_label: "Got it".to_string(),
        }
    }

    pub fn meals(err: &ApiError) -> Self {
        let desc = match err {
            ApiError::ApiKeyMissing => API_KEY_HINT.to_string(),
            ApiError::SchoolMissing => "Select a school first.".to_string(),
            ApiError::Timeout => "The meal service did not answer in time.".to_string(),
            _ => "Couldn't load meals due to a network or server problem.".to_string(),
        };
        Self {
            title: "Couldn't load meals".to_string(),
            desc,
            retry_label: "Retry".to_string(),
        }
    }

    pub fn search(err: &ApiError) -> Self {
        let desc = match err {
            ApiError::ApiKeyMissing => API_KEY_HINT.to_string(),
            _ => "Something went wrong while searching. Try again shortly.".to_string(),
        };
        Self {
            title: "School search failed".to_string(),
            desc,
            retry_label: "Search again".to_string(),
        }
    }
}

/// State of the meal area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MealsView {
    NeedsApiKey,
    NoSchool,
    Loading,
    Loaded { meals: Vec<MealRecord> },
    Failed(ErrorPanel),
}
