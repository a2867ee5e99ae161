//! Data models for NEIS school and meal entities.
//!
//! - `School`, `SchoolRow`: school directory entries and their upstream shape
//! - `MealRecord`, `MealRow`: daily meal records and their upstream shape
//! - `DishItem`: one dish line split into name and allergy codes
//! - Favorites helpers: capped, de-duplicated pinned schools

pub mod dish;
pub mod meal;
pub mod school;

pub use dish::{parse_dish_line, parse_dish_text, DishItem};
pub use meal::{find_meal_for_day, MealRecord, MealRow};
pub use school::{
    remove_favorite, toggle_favorite, FavoriteChange, School, SchoolRow, MAX_FAVORITES,
};
