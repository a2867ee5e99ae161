//! Parsing of NEIS dish text.
//!
//! `DDISH_NM` is a `<br/>`-separated list of dishes, each optionally followed
//! by allergy codes in parentheses, e.g. `김치(9.13.)`.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DishItem {
    pub name: String,
    pub allergy_nums: Vec<String>,
}

/// Parenthesised groups made only of digits, dots and whitespace.
static ALLERGY_GROUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([\d.\s]+)\)").expect("allergy regex is valid"));

static BR_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<br\s*/?>").expect("br regex is valid"));

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace regex is valid"));

/// Split one dish line into its name and allergy codes.
///
/// Returns `None` for a blank line.
pub fn parse_dish_line(line: &str) -> Option<DishItem> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }

    let allergy_nums = ALLERGY_GROUP
        .captures_iter(trimmed)
        .filter_map(|caps| caps.get(1))
        .flat_map(|group| group.as_str().split('.'))
        .map(str::trim)
        .filter(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()))
        .map(str::to_string)
        .collect();

    let without_codes = ALLERGY_GROUP.replace_all(trimmed, "");
    let name = WHITESPACE_RUN
        .replace_all(&without_codes, " ")
        .trim()
        .to_string();

    Some(DishItem { name, allergy_nums })
}

/// Parse the full `DDISH_NM` text into dish items, skipping blank lines.
pub fn parse_dish_text(raw: &str) -> Vec<DishItem> {
    raw.split("<br/>")
        .map(|part| BR_TAG.replace_all(part, "").trim().to_string())
        .filter(|part| !part.is_empty())
        .filter_map(|part| parse_dish_line(&part))
        .collect()
}
