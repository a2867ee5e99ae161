//! Daily meal records.

use serde::{Deserialize, Serialize};

/// Substring NEIS uses for the lunch meal type.
const LUNCH_MARKER: &str = "중식";

/// One served meal (breakfast, lunch, or dinner) on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealRecord {
    /// Service date as `YYYYMMDD`
    pub ymd: String,
    pub meal_type: String,
    /// Raw dish text: `<br/>`-separated lines with allergy annotations
    pub dish: String,
    pub calories: String,
    pub nutrition: String,
    pub origin: String,
}

impl MealRecord {
    pub fn is_lunch(&self) -> bool {
        self.meal_type.contains(LUNCH_MARKER)
    }
}

/// A row of the `mealServiceDietInfo` endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MealRow {
    #[serde(rename = "MLSV_YMD", default)]
    pub ymd: Option<String>,
    #[serde(rename = "MMEAL_SC_NM", default)]
    pub meal_type: Option<String>,
    #[serde(rename = "DDISH_NM", default)]
    pub dish: Option<String>,
    #[serde(rename = "CAL_INFO", default)]
    pub calories: Option<String>,
    #[serde(rename = "NTR_INFO", default)]
    pub nutrition: Option<String>,
    #[serde(rename = "ORPLC_INFO", default)]
    pub origin: Option<String>,
}

impl MealRow {
    pub fn to_meal(&self) -> MealRecord {
        MealRecord {
            ymd: self.ymd.clone().unwrap_or_default(),
            meal_type: self.meal_type.clone().unwrap_or_default(),
            dish: self.dish.clone().unwrap_or_default(),
            calories: self.calories.clone().unwrap_or_default(),
            nutrition: self.nutrition.clone().unwrap_or_default(),
            origin: self.origin.clone().unwrap_or_default(),
        }
    }
}

/// Pick the meal to show for a day: lunch if served, otherwise the first record.
pub fn find_meal_for_day<'a>(meals: &'a [MealRecord], ymd: &str) -> Option<&'a MealRecord> {
    let mut by_day = meals.iter().filter(|m| m.ymd == ymd).peekable();
    let first = *by_day.peek()?;
    Some(by_day.find(|m| m.is_lunch()).unwrap_or(first))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meal(ymd: &str, meal_type: &str) -> MealRecord {
        MealRecord {
            ymd: ymd.to_string(),
            meal_type: meal_type.to_string(),
            dish: String::new(),
            calories: String::new(),
            nutrition: String::new(),
            origin: String::new(),
        }
    }

    #[test]
    fn test_prefers_lunch() {
        let meals = vec![
            meal("20261016", "조식"),
            meal("20261016", "중식"),
            meal("20261016", "석식"),
        ];
        assert_eq!(find_meal_for_day(&meals, "20261016").unwrap().meal_type, "중식");
    }

    #[test]
    fn test_falls_back_to_first_of_day() {
        let meals = vec![meal("20261015", "중식"), meal("20261016", "석식"), meal("20261016", "조식")];
        assert_eq!(find_meal_for_day(&meals, "20261016").unwrap().meal_type, "석식");
    }

    #[test]
    fn test_no_meal_for_day() {
        let meals = vec![meal("20261015", "중식")];
        assert!(find_meal_for_day(&meals, "20261016").is_none());
        assert!(find_meal_for_day(&[], "20261016").is_none());
    }

    #[test]
    fn test_meal_row_nulls_become_empty() {
        let row: MealRow = serde_json::from_value(serde_json::json!({
            "MLSV_YMD": "20261016",
            "MMEAL_SC_NM": "중식",
            "DDISH_NM": "김치(9.13.)",
            "CAL_INFO": null
        }))
        .unwrap();
        let record = row.to_meal();
        assert_eq!(record.ymd, "20261016");
        assert_eq!(record.calories, "");
        assert_eq!(record.origin, "");
        assert!(record.is_lunch());
    }
}
