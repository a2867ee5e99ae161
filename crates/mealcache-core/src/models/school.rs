//! School directory entries and the favorites list.

use serde::{Deserialize, Serialize};

/// Maximum number of pinned schools.
pub const MAX_FAVORITES: usize = 3;

/// A school as used throughout the app.
///
/// Identity is the (education office code, school code) pair; names and
/// addresses are display-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct School {
    pub office_code: String,
    pub office_name: String,
    pub school_code: String,
    pub school_name: String,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub road_address: Option<String>,
}

impl School {
    pub fn same_school(&self, other: &School) -> bool {
        self.office_code == other.office_code && self.school_code == other.school_code
    }

    /// Both codes are present, so the school can be used for a meal query.
    pub fn has_codes(&self) -> bool {
        !self.office_code.trim().is_empty() && !self.school_code.trim().is_empty()
    }

    /// Secondary line shown under the school name: office, kind, address.
    pub fn meta_line(&self) -> String {
        let kind = self
            .kind
            .as_deref()
            .filter(|k| !k.is_empty())
            .unwrap_or("School");
        let mut meta = format!("{} · {}", self.office_name, kind);
        if let Some(addr) = self.road_address.as_deref().filter(|a| !a.is_empty()) {
            meta.push_str(" · ");
            meta.push_str(addr);
        }
        meta
    }
}

/// A row of the `schoolInfo` endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchoolRow {
    #[serde(rename = "ATPT_OFCDC_SC_CODE", default)]
    pub office_code: Option<String>,
    #[serde(rename = "ATPT_OFCDC_SC_NM", default)]
    pub office_name: Option<String>,
    #[serde(rename = "SD_SCHUL_CODE", default)]
    pub school_code: Option<String>,
    #[serde(rename = "SCHUL_NM", default)]
    pub school_name: Option<String>,
    #[serde(rename = "SCHUL_KND_SC_NM", default)]
    pub kind: Option<String>,
    #[serde(rename = "ORG_RDNMA", default)]
    pub road_address: Option<String>,
}

impl SchoolRow {
    /// Convert to a `School`, or `None` if either identity code is missing.
    pub fn to_school(&self) -> Option<School> {
        let office_code = self.office_code.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        let school_code = self.school_code.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        Some(School {
            office_code: office_code.to_string(),
            office_name: self.office_name.clone().unwrap_or_default(),
            school_code: school_code.to_string(),
            school_name: self.school_name.clone().unwrap_or_default(),
            kind: self.kind.clone(),
            road_address: self.road_address.clone(),
        })
    }
}

/// What a favorites toggle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoriteChange {
    Added,
    Removed,
    /// List already holds `MAX_FAVORITES`; nothing changed.
    LimitReached,
}

/// Toggle `school` in `list`: remove if present, otherwise prepend if there is room.
pub fn toggle_favorite(mut list: Vec<School>, school: &School) -> (Vec<School>, FavoriteChange) {
    if let Some(idx) = list.iter().position(|s| s.same_school(school)) {
        list.remove(idx);
        return (list, FavoriteChange::Removed);
    }

    if list.len() >= MAX_FAVORITES {
        return (list, FavoriteChange::LimitReached);
    }

    list.insert(0, school.clone());
    (list, FavoriteChange::Added)
}

pub fn remove_favorite(list: Vec<School>, school: &School) -> Vec<School> {
    list.into_iter().filter(|s| !s.same_school(school)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn school(office: &str, code: &str) -> School {
        School {
            office_code: office.to_string(),
            office_name: format!("{} office", office),
            school_code: code.to_string(),
            school_name: format!("School {}", code),
            kind: None,
            road_address: None,
        }
    }

    #[test]
    fn test_identity_ignores_names() {
        let a = school("B10", "7010057");
        let mut b = a.clone();
        b.school_name = "Renamed".to_string();
        assert!(a.same_school(&b));
        assert!(!a.same_school(&school("J10", "7010057")));
    }

    #[test]
    fn test_toggle_adds_to_front() {
        let (list, change) = toggle_favorite(vec![school("B10", "1")], &school("B10", "2"));
        assert_eq!(change, FavoriteChange::Added);
        assert_eq!(list[0].school_code, "2");
        assert_eq!(list[1].school_code, "1");
    }

    #[test]
    fn test_toggle_removes_existing() {
        let list = vec![school("B10", "1"), school("B10", "2")];
        let (list, change) = toggle_favorite(list, &school("B10", "1"));
        assert_eq!(change, FavoriteChange::Removed);
        assert_eq!(list, vec![school("B10", "2")]);
    }

    #[test]
    fn test_toggle_respects_limit() {
        let full = vec![school("B10", "1"), school("B10", "2"), school("B10", "3")];
        let (list, change) = toggle_favorite(full.clone(), &school("B10", "4"));
        assert_eq!(change, FavoriteChange::LimitReached);
        assert_eq!(list, full);

        // Removing still works on a full list
        let (list, change) = toggle_favorite(full, &school("B10", "2"));
        assert_eq!(change, FavoriteChange::Removed);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_remove_favorite() {
        let list = vec![school("B10", "1"), school("J10", "1")];
        let list = remove_favorite(list, &school("B10", "1"));
        assert_eq!(list, vec![school("J10", "1")]);
    }

    #[test]
    fn test_school_row_requires_codes() {
        let row: SchoolRow = serde_json::from_value(serde_json::json!({
            "ATPT_OFCDC_SC_CODE": "B10",
            "ATPT_OFCDC_SC_NM": "서울특별시교육청",
            "SD_SCHUL_CODE": "7010057",
            "SCHUL_NM": "서울고등학교",
            "SCHUL_KND_SC_NM": "고등학교",
            "ORG_RDNMA": null
        }))
        .unwrap();
        let school = row.to_school().unwrap();
        assert_eq!(school.office_code, "B10");
        assert_eq!(school.school_name, "서울고등학교");
        assert_eq!(school.road_address, None);

        let missing = SchoolRow {
            office_code: Some("B10".to_string()),
            school_code: Some("  ".to_string()),
            ..SchoolRow::default()
        };
        assert!(missing.to_school().is_none());
    }

    #[test]
    fn test_meta_line() {
        let mut s = school("B10", "1");
        assert_eq!(s.meta_line(), "B10 office · School");
        s.kind = Some("고등학교".to_string());
        s.road_address = Some("서울특별시 서초구".to_string());
        assert_eq!(s.meta_line(), "B10 office · 고등학교 · 서울특별시 서초구");
    }
}
