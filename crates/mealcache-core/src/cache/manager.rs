use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use super::store::KeyValueStore;
use crate::models::{self, FavoriteChange, MealRecord, School};

/// Meal lists are cached for 6 hours.
pub const MEAL_CACHE_TTL_HOURS: i64 = 6;

/// School search results are cached for 12 hours.
pub const SCHOOL_SEARCH_CACHE_TTL_HOURS: i64 = 12;

const KEY_SELECTED_SCHOOL: &str = "meal.selectedSchool.v1";
const KEY_FAVORITES: &str = "meal.favorites.v1";
const KEY_CACHE: &str = "meal.cache.v1";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn at(data: T, cached_at: DateTime<Utc>) -> Self {
        Self { data, cached_at }
    }

    pub fn age_minutes(&self) -> i64 {
        (Utc::now() - self.cached_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            // Also covers clock skew
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            format!("{}h ago", minutes / 60)
        } else {
            format!("{}d ago", minutes / 1440)
        }
    }

    /// An entry exactly `ttl` old is still fresh.
    pub fn is_expired_at(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.cached_at > ttl
    }
}

/// Both TTL caches, stored together under one key.
#[derive(Debug, Default, Serialize, Deserialize)]
struct CacheBlob {
    #[serde(default)]
    meals: HashMap<String, CachedData<Vec<MealRecord>>>,
    #[serde(default)]
    schools: HashMap<String, CachedData<Vec<School>>>,
}

/// Composite meal cache key: `office:school:from-to`.
pub fn meal_cache_key(school: &School, from_ymd: &str, to_ymd: &str) -> String {
    format!(
        "{}:{}:{}-{}",
        school.office_code, school.school_code, from_ymd, to_ymd
    )
}

/// Persistent app state on top of a `KeyValueStore`.
pub struct MealStore {
    store: Box<dyn KeyValueStore>,
    /// Serialises read-modify-write of the cache blob within this process
    cache_lock: Mutex<()>,
}

impl MealStore {
    pub fn new(store: impl KeyValueStore + 'static) -> Self {
        Self {
            store: Box::new(store),
            cache_lock: Mutex::new(()),
        }
    }

    pub fn shared(store: impl KeyValueStore + 'static) -> Arc<Self> {
        Arc::new(Self::new(store))
    }

    /// Read and decode a key; corrupt or unreadable values count as absent.
    fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.store.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(key, error = %e, "Failed to read stored value");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "Ignoring corrupt stored value");
                None
            }
        }
    }

    fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let contents = serde_json::to_string(value)?;
        self.store.set(key, &contents)
    }

    // ===== Selected School =====

    pub fn selected_school(&self) -> Option<School> {
        self.load(KEY_SELECTED_SCHOOL)
    }

    pub fn set_selected_school(&self, school: &School) -> Result<()> {
        self.save(KEY_SELECTED_SCHOOL, school)
    }

    // ===== Favorites =====

    pub fn favorites(&self) -> Vec<School> {
        self.load(KEY_FAVORITES).unwrap_or_default()
    }

    pub fn set_favorites(&self, list: &[School]) -> Result<()> {
        self.save(KEY_FAVORITES, list)
    }

    /// Toggle a favorite and persist the result (unless the limit was hit).
    pub fn toggle_favorite(&self, school: &School) -> Result<(Vec<School>, FavoriteChange)> {
        let (list, change) = models::toggle_favorite(self.favorites(), school);
        if change != FavoriteChange::LimitReached {
            self.set_favorites(&list)?;
        }
        debug!(school = %school.school_name, ?change, "Favorite toggled");
        Ok((list, change))
    }

    pub fn remove_favorite(&self, school: &School) -> Result<Vec<School>> {
        let list = models::remove_favorite(self.favorites(), school);
        self.set_favorites(&list)?;
        Ok(list)
    }

    // ===== TTL Caches =====

    fn load_cache(&self) -> CacheBlob {
        self.load(KEY_CACHE).unwrap_or_default()
    }

    fn update_cache(&self, update: impl FnOnce(&mut CacheBlob)) -> Result<()> {
        let _guard = self
            .cache_lock
            .lock()
            .map_err(|_| anyhow::anyhow!("Cache lock poisoned"))?;
        let mut blob = self.load_cache();
        update(&mut blob);
        self.save(KEY_CACHE, &blob)
    }

    pub fn meal_cache_get(&self, key: &str, now: DateTime<Utc>) -> Option<Vec<MealRecord>> {
        self.meal_cache_entry(key, now).map(|entry| entry.data)
    }

    /// Fresh meal entry with its timestamp, for "updated 2h ago" displays.
    pub fn meal_cache_entry(
        &self,
        key: &str,
        now: DateTime<Utc>,
    ) -> Option<CachedData<Vec<MealRecord>>> {
        let entry = self.load_cache().meals.remove(key)?;
        if entry.is_expired_at(now, Duration::hours(MEAL_CACHE_TTL_HOURS)) {
            debug!(key, "Meal cache entry expired");
            return None;
        }
        Some(entry)
    }

    pub fn meal_cache_set(&self, key: &str, meals: &[MealRecord], now: DateTime<Utc>) -> Result<()> {
        let entry = CachedData::at(meals.to_vec(), now);
        self.update_cache(|blob| {
            blob.meals.insert(key.to_string(), entry);
        })
    }

    pub fn school_search_cache_get(&self, query: &str, now: DateTime<Utc>) -> Option<Vec<School>> {
        let entry = self.load_cache().schools.remove(query)?;
        if entry.is_expired_at(now, Duration::hours(SCHOOL_SEARCH_CACHE_TTL_HOURS)) {
            debug!(query, "School search cache entry expired");
            return None;
        }
        Some(entry.data)
    }

    pub fn school_search_cache_set(
        &self,
        query: &str,
        schools: &[School],
        now: DateTime<Utc>,
    ) -> Result<()> {
        let entry = CachedData::at(schools.to_vec(), now);
        self.update_cache(|blob| {
            blob.schools.insert(query.to_string(), entry);
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::store::MemoryStore;
    use chrono::TimeZone;

    fn school(code: &str) -> School {
        School {
            office_code: "B10".to_string(),
            office_name: "서울특별시교육청".to_string(),
            school_code: code.to_string(),
            school_name: format!("School {}", code),
            kind: Some("고등학교".to_string()),
            road_address: None,
        }
    }

    fn meal(ymd: &str) -> MealRecord {
        MealRecord {
            ymd: ymd.to_string(),
            meal_type: "중식".to_string(),
            dish: "김치(9.13.)".to_string(),
            calories: "650.2 Kcal".to_string(),
            nutrition: String::new(),
            origin: String::new(),
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 12, 8, 0, 0).unwrap()
    }

    #[test]
    fn test_meal_cache_ttl_boundary() {
        let store = MealStore::new(MemoryStore::new());
        let meals = vec![meal("20261012")];
        store.meal_cache_set("B10:1:20261012-20261016", &meals, t0()).unwrap();

        let hit = t0() + Duration::hours(5) + Duration::minutes(59);
        assert_eq!(store.meal_cache_get("B10:1:20261012-20261016", hit), Some(meals.clone()));

        let exactly = t0() + Duration::hours(6);
        assert!(store.meal_cache_get("B10:1:20261012-20261016", exactly).is_some());

        let miss = t0() + Duration::hours(6) + Duration::minutes(1);
        assert_eq!(store.meal_cache_get("B10:1:20261012-20261016", miss), None);
    }

    #[test]
    fn test_school_search_cache_ttl_boundary() {
        let store = MealStore::new(MemoryStore::new());
        let schools = vec![school("1")];
        store.school_search_cache_set("서울", &schools, t0()).unwrap();

        let hit = t0() + Duration::hours(11) + Duration::minutes(59);
        assert_eq!(store.school_search_cache_get("서울", hit), Some(schools));

        let miss = t0() + Duration::hours(12) + Duration::minutes(1);
        assert_eq!(store.school_search_cache_get("서울", miss), None);
    }

    #[test]
    fn test_caches_are_independent() {
        let store = MealStore::new(MemoryStore::new());
        store.school_search_cache_set("서울", &[school("1")], t0()).unwrap();
        store.meal_cache_set("k", &[meal("20261012")], t0()).unwrap();

        assert!(store.school_search_cache_get("서울", t0()).is_some());
        assert!(store.meal_cache_get("k", t0()).is_some());
        assert!(store.meal_cache_get("서울", t0()).is_none());
        assert!(store.school_search_cache_get("부산", t0()).is_none());
    }

    #[test]
    fn test_corrupt_cache_is_a_miss() {
        let kv = MemoryStore::new();
        kv.set(KEY_CACHE, "{not json").unwrap();
        kv.set(KEY_FAVORITES, r#"{"not":"a list"}"#).unwrap();
        let store = MealStore::new(kv);

        assert!(store.meal_cache_get("k", t0()).is_none());
        assert!(store.favorites().is_empty());

        // Writing over a corrupt blob starts fresh
        store.meal_cache_set("k", &[meal("20261012")], t0()).unwrap();
        assert!(store.meal_cache_get("k", t0()).is_some());
    }

    #[test]
    fn test_selected_school_persists() {
        let store = MealStore::new(MemoryStore::new());
        assert!(store.selected_school().is_none());
        store.set_selected_school(&school("7010057")).unwrap();
        assert_eq!(store.selected_school().unwrap().school_code, "7010057");
        store.set_selected_school(&school("7010058")).unwrap();
        assert_eq!(store.selected_school().unwrap().school_code, "7010058");
    }

    #[test]
    fn test_selected_school_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = MealStore::new(crate::cache::FileStore::new(dir.path().to_path_buf()).unwrap());
            store.set_selected_school(&school("7010057")).unwrap();
            store.toggle_favorite(&school("7010057")).unwrap();
        }
        let store = MealStore::new(crate::cache::FileStore::new(dir.path().to_path_buf()).unwrap());
        assert_eq!(store.selected_school().unwrap().school_code, "7010057");
        assert_eq!(store.favorites().len(), 1);
    }

    #[test]
    fn test_toggle_favorite_persists_and_caps() {
        let store = MealStore::new(MemoryStore::new());
        for code in ["1", "2", "3"] {
            let (_, change) = store.toggle_favorite(&school(code)).unwrap();
            assert_eq!(change, FavoriteChange::Added);
        }
        let codes: Vec<String> = store.favorites().into_iter().map(|s| s.school_code).collect();
        assert_eq!(codes, vec!["3", "2", "1"]);

        let (list, change) = store.toggle_favorite(&school("4")).unwrap();
        assert_eq!(change, FavoriteChange::LimitReached);
        assert_eq!(list.len(), 3);
        assert_eq!(store.favorites().len(), 3);

        let (_, change) = store.toggle_favorite(&school("2")).unwrap();
        assert_eq!(change, FavoriteChange::Removed);
        assert_eq!(store.favorites().len(), 2);

        let list = store.remove_favorite(&school("3")).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(store.favorites()[0].school_code, "1");
    }

    #[test]
    fn test_meal_cache_key() {
        assert_eq!(
            meal_cache_key(&school("7010057"), "20261012", "20261016"),
            "B10:7010057:20261012-20261016"
        );
    }

    #[test]
    fn test_meal_cache_entry_keeps_timestamp() {
        let store = MealStore::new(MemoryStore::new());
        store.meal_cache_set("k", &[meal("20261012")], t0()).unwrap();

        let entry = store.meal_cache_entry("k", t0() + Duration::hours(2)).unwrap();
        assert_eq!(entry.cached_at, t0());
        assert_eq!(entry.data.len(), 1);
        assert!(store.meal_cache_entry("k", t0() + Duration::hours(7)).is_none());
    }

    #[test]
    fn test_age_display() {
        let fresh = CachedData::at(vec![1], Utc::now());
        assert_eq!(fresh.age_display(), "just now");

        let old = CachedData::at(vec![1], Utc::now() - Duration::minutes(125));
        assert_eq!(old.age_display(), "2h ago");
    }
}
