//! Place search and the home screen's newest places.

use crate::error::{SongPinError, SongPinResult};
use crate::store::places::{self, PlaceOrder, PlacePinCount};
use crate::store::SongPinStore;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;
pub const DEFAULT_NEWEST_PLACES: i64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SortBy {
    #[default]
    Accuracy,
    Count,
    Newest,
}

impl SortBy {
    fn order(&self) -> PlaceOrder {
        match self {
            SortBy::Accuracy => PlaceOrder::Name,
            SortBy::Count => PlaceOrder::PinCount,
            SortBy::Newest => PlaceOrder::Newest,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PlaceUnit {
    pub place_id: i64,
    pub place_name: String,
    pub pin_count: i64,
}

impl From<PlacePinCount> for PlaceUnit {
    fn from(row: PlacePinCount) -> Self {
        PlaceUnit {
            place_id: row.place_id,
            place_name: row.place_name,
            pin_count: row.pin_count,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlaceSearchPage {
    pub page: i64,
    pub size: i64,
    pub total_elements: i64,
    pub total_pages: i64,
    pub places: Vec<PlaceUnit>,
}

#[derive(Clone)]
pub struct PlaceSearch {
    store: SongPinStore,
}

impl PlaceSearch {
    pub fn new(store: SongPinStore) -> Self {
        Self { store }
    }

    /// Searches place names ignoring spaces. `page` is 0-based.
    pub fn search_places(
        &self,
        keyword: &str,
        sort_by: SortBy,
        page: i64,
        size: i64,
    ) -> SongPinResult<PlaceSearchPage> {
        if page < 0 || size < 1 || size > MAX_PAGE_SIZE {
            return Err(SongPinError::InvalidInput(format!(
                "Invalid page {} of size {}",
                page, size
            )));
        }
        let keyword: String = keyword.chars().filter(|c| !c.is_whitespace()).collect();
        if keyword.is_empty() {
            return Err(SongPinError::InvalidInput("Search keyword must not be empty".to_string()));
        }

        let offset = page.checked_mul(size).ok_or_else(|| {
            SongPinError::InvalidInput(format!("Page {} is out of range", page))
        })?;

        self.store.read(|conn| {
            let total_elements = places::count_places_matching(conn, &keyword)?;
            let rows = places::search_places(conn, &keyword, sort_by.order(), size, offset)?;
            Ok(PlaceSearchPage {
                page,
                size,
                total_elements,
                total_pages: (total_elements + size - 1) / size,
                places: rows.into_iter().map(PlaceUnit::from).collect(),
            })
        })
    }

    /// Places with at least one pin, most recently listened first.
    pub fn top_newest_places(&self, limit: i64) -> SongPinResult<Vec<PlaceUnit>> {
        if limit < 1 || limit > MAX_PAGE_SIZE {
            return Err(SongPinError::InvalidInput(format!("Invalid limit {}", limit)));
        }
        self.store.read(|conn| {
            Ok(places::find_newest_places(conn, limit)?
                .into_iter()
                .map(PlaceUnit::from)
                .collect())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{PlaceRequest, SongRequest};
    use crate::pin::{EngineSettings, PinAddRequest, PinEngine};
    use crate::store::{members, Visibility};
    use chrono::NaiveDate;

    struct Fixture {
        search: PlaceSearch,
        engine: PinEngine,
        member: i64,
    }

    fn fixture() -> Fixture {
        let store = SongPinStore::open_in_memory().unwrap();
        let member = store
            .write(|tx| members::insert_member(tx, "alice", "Alice"))
            .unwrap();
        store
            .write(|tx| {
                places::insert_place(tx, 100, "Seoul Forest", None, 37.5, 127.0)?;
                Ok::<_, anyhow::Error>(())
            })
            .unwrap();
        Fixture {
            search: PlaceSearch::new(store.clone()),
            engine: PinEngine::new(store, EngineSettings::default()),
            member,
        }
    }

    fn pin_at(f: &Fixture, address_id: i64, name: &str, date: (i32, u32, u32)) {
        let request = PinAddRequest {
            song: SongRequest {
                provider_track_code: "trk".to_string(),
                title: "Song".to_string(),
                artist: "Artist".to_string(),
                img_path: None,
            },
            place: PlaceRequest {
                provider_address_id: address_id,
                place_name: name.to_string(),
                address: None,
                latitude: 37.5,
                longitude: 127.0,
            },
            genre_name: "POP".to_string(),
            listened_date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            memo: None,
            visibility: Visibility::Public,
        };
        f.engine.create_pin(f.member, &request).unwrap();
    }

    fn search(
        f: &Fixture,
        keyword: &str,
        sort: SortBy,
        page: i64,
        size: i64,
    ) -> PlaceSearchPage {
        f.search.search_places(keyword, sort, page, size).unwrap()
    }

    fn names(page: &PlaceSearchPage) -> Vec<&str> {
        page.places.iter().map(|p| p.place_name.as_str()).collect()
    }

    fn seeded() -> Fixture {
        let f = fixture();
        pin_at(&f, 1, "Seoul Station", (2024, 1, 1));
        pin_at(&f, 1, "Seoul Station", (2024, 1, 2));
        pin_at(&f, 2, "Seoul Tower", (2024, 6, 1));
        pin_at(&f, 3, "Busan Beach", (2024, 7, 1));
        f
    }

    #[test]
    fn sorts_by_pin_count() {
        let f = seeded();
        // LIKE is case-insensitive for ASCII.
        let page = search(&f, "seoul", SortBy::Count, 0, 10);
        assert_eq!(
            names(&page),
            vec!["Seoul Station", "Seoul Tower", "Seoul Forest"]
        );
        let counts: Vec<i64> = page.places.iter().map(|p| p.pin_count).collect();
        assert_eq!(counts, vec![2, 1, 0]);
    }

    #[test]
    fn sorts_by_newest_listen() {
        let f = seeded();
        let page = search(&f, "Seoul", SortBy::Newest, 0, 10);
        assert_eq!(
            names(&page),
            vec!["Seoul Tower", "Seoul Station", "Seoul Forest"]
        );
    }

    #[test]
    fn sorts_by_name_and_ignores_spaces() {
        let f = seeded();
        let page = search(&f, "seoul s", SortBy::Accuracy, 0, 10);
        assert_eq!(names(&page), vec!["Seoul Station"]);
        let page = search(&f, "Seoul", SortBy::Accuracy, 0, 10);
        assert_eq!(
            names(&page),
            vec!["Seoul Forest", "Seoul Station", "Seoul Tower"]
        );
    }

    #[test]
    fn pages_results() {
        let f = seeded();
        let first = search(&f, "Seoul", SortBy::Accuracy, 0, 2);
        assert_eq!(first.total_elements, 3);
        assert_eq!(first.total_pages, 2);
        assert_eq!(names(&first), vec!["Seoul Forest", "Seoul Station"]);
        let second = search(&f, "Seoul", SortBy::Accuracy, 1, 2);
        assert_eq!(names(&second), vec!["Seoul Tower"]);
        let beyond = search(&f, "Seoul", SortBy::Accuracy, 5, 2);
        assert!(beyond.places.is_empty());
    }

    #[test]
    fn rejects_bad_paging() {
        let f = fixture();
        for (page, size) in [(-1, 10), (0, 0), (0, MAX_PAGE_SIZE + 1), (i64::MAX, 20)] {
            assert!(matches!(
                f.search.search_places("x", SortBy::Count, page, size),
                Err(SongPinError::InvalidInput(_))
            ));
        }
        assert!(matches!(
            f.search.search_places("  ", SortBy::Count, 0, 10),
            Err(SongPinError::InvalidInput(_))
        ));
    }

    #[test]
    fn newest_places_skip_unpinned() {
        let f = seeded();
        let newest = f.search.top_newest_places(DEFAULT_NEWEST_PLACES).unwrap();
        let names: Vec<&str> = newest.iter().map(|p| p.place_name.as_str()).collect();
        assert_eq!(names, vec!["Busan Beach", "Seoul Tower", "Seoul Station"]);
        assert_eq!(newest[2].pin_count, 2);
    }

    #[test]
    fn sort_by_parses_uppercase() {
        let sort: SortBy = serde_json::from_str("\"NEWEST\"").unwrap();
        assert_eq!(sort, SortBy::Newest);
        assert_eq!(SortBy::default(), SortBy::Accuracy);
    }
}
