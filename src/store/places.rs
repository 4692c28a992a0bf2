use super::models::{Place, PlaceId};
use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};

const PLACE_COLUMNS: &str = "id, provider_address_id, place_name, address, latitude, longitude";

/// Ordering of a place name search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceOrder {
    /// Most pinned first, then by name.
    PinCount,
    /// Most recent `listened_date` among the place's pins first. Places
    /// without pins come last.
    Newest,
    /// Alphabetical.
    Name,
}

impl PlaceOrder {
    fn order_by_sql(&self) -> &'static str {
        match self {
            PlaceOrder::PinCount => "pin_count DESC, p.place_name ASC, p.id ASC",
            PlaceOrder::Newest => {
                "MAX(pin.listened_date) IS NULL, MAX(pin.listened_date) DESC, \
                 p.place_name ASC, p.id ASC"
            }
            PlaceOrder::Name => "p.place_name ASC, p.id ASC",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacePinCount {
    pub place_id: PlaceId,
    pub place_name: String,
    pub pin_count: i64,
}

fn place_from_row(row: &Row) -> rusqlite::Result<Place> {
    Ok(Place {
        id: row.get(0)?,
        provider_address_id: row.get(1)?,
        place_name: row.get(2)?,
        address: row.get(3)?,
        latitude: row.get(4)?,
        longitude: row.get(5)?,
    })
}

fn place_pin_count_from_row(row: &Row) -> rusqlite::Result<PlacePinCount> {
    Ok(PlacePinCount {
        place_id: row.get(0)?,
        place_name: row.get(1)?,
        pin_count: row.get(2)?,
    })
}

/// Turns a keyword into a LIKE pattern that matches it anywhere, with the
/// LIKE wildcards in the keyword matched literally.
fn contains_pattern(keyword: &str) -> String {
    let mut pattern = String::with_capacity(keyword.len() + 2);
    pattern.push('%');
    for c in keyword.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

pub fn find_place_by_id(conn: &Connection, place_id: PlaceId) -> Result<Option<Place>> {
    let place = conn
        .query_row(
            &format!("SELECT {} FROM place WHERE id = ?1", PLACE_COLUMNS),
            params![place_id],
            place_from_row,
        )
        .optional()?;
    Ok(place)
}

pub fn find_place_by_provider_address_id(
    conn: &Connection,
    provider_address_id: i64,
) -> Result<Option<Place>> {
    let place = conn
        .query_row(
            &format!(
                "SELECT {} FROM place WHERE provider_address_id = ?1",
                PLACE_COLUMNS
            ),
            params![provider_address_id],
            place_from_row,
        )
        .optional()?;
    Ok(place)
}

pub fn insert_place(
    conn: &Connection,
    provider_address_id: i64,
    place_name: &str,
    address: Option<&str>,
    latitude: f64,
    longitude: f64,
) -> Result<Place> {
    conn.execute(
        "INSERT INTO place (provider_address_id, place_name, address, latitude, longitude) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![provider_address_id, place_name, address, latitude, longitude],
    )
    .with_context(|| format!("Failed to insert place {}", provider_address_id))?;
    Ok(Place {
        id: conn.last_insert_rowid(),
        provider_address_id,
        place_name: place_name.to_string(),
        address: address.map(str::to_string),
        latitude,
        longitude,
    })
}

/// Places whose name, with spaces removed, contains `keyword_no_spaces`.
pub fn search_places(
    conn: &Connection,
    keyword_no_spaces: &str,
    order: PlaceOrder,
    limit: i64,
    offset: i64,
) -> Result<Vec<PlacePinCount>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT p.id, p.place_name, COUNT(pin.id) AS pin_count \
         FROM place p LEFT JOIN pin ON pin.place_id = p.id \
         WHERE REPLACE(p.place_name, ' ', '') LIKE ?1 ESCAPE '\\' \
         GROUP BY p.id \
         ORDER BY {} \
         LIMIT ?2 OFFSET ?3",
        order.order_by_sql()
    ))?;
    let rows = stmt
        .query_map(
            params![contains_pattern(keyword_no_spaces), limit, offset],
            place_pin_count_from_row,
        )?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

pub fn count_places_matching(conn: &Connection, keyword_no_spaces: &str) -> Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM place p \
         WHERE REPLACE(p.place_name, ' ', '') LIKE ?1 ESCAPE '\\'",
        params![contains_pattern(keyword_no_spaces)],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Places that have at least one pin, most recently listened first.
pub fn find_newest_places(conn: &Connection, limit: i64) -> Result<Vec<PlacePinCount>> {
    let mut stmt = conn.prepare(
        "SELECT p.id, p.place_name, COUNT(pin.id) AS pin_count \
         FROM place p JOIN pin ON pin.place_id = p.id \
         GROUP BY p.id \
         ORDER BY MAX(pin.listened_date) DESC, p.place_name ASC, p.id ASC \
         LIMIT ?1",
    )?;
    let rows = stmt
        .query_map(params![limit], place_pin_count_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SongPinStore;

    #[test]
    fn escapes_like_wildcards() {
        assert_eq!(contains_pattern("a%b_c"), "%a\\%b\\_c%");
    }

    #[test]
    fn matches_names_ignoring_spaces() {
        let store = SongPinStore::open_in_memory().unwrap();
        store
            .write(|tx| {
                insert_place(tx, 1, "Han River Park", None, 37.5, 127.0)?;
                insert_place(tx, 2, "Seoul Forest", Some("Seongdong"), 37.54, 127.04)?;
                insert_place(tx, 3, "100% Cafe", None, 37.0, 127.0)?;
                Ok::<_, anyhow::Error>(())
            })
            .unwrap();

        let rows = store
            .read(|conn| search_places(conn, "RiverPark", PlaceOrder::Name, 10, 0))
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].place_name, "Han River Park");
        assert_eq!(rows[0].pin_count, 0);

        assert_eq!(
            store.read(|conn| count_places_matching(conn, "%")).unwrap(),
            1
        );
        assert_eq!(
            store.read(|conn| count_places_matching(conn, "")).unwrap(),
            3
        );
    }

    #[test]
    fn provider_address_id_is_unique() {
        let store = SongPinStore::open_in_memory().unwrap();
        let place = store
            .write(|tx| insert_place(tx, 7, "Somewhere", None, 1.0, 2.0))
            .unwrap();
        assert!(store
            .write(|tx| insert_place(tx, 7, "Elsewhere", None, 3.0, 4.0))
            .is_err());
        let found = store
            .read(|conn| find_place_by_provider_address_id(conn, 7))
            .unwrap()
            .unwrap();
        assert_eq!(found.id, place.id);
        assert_eq!(found.place_name, "Somewhere");
    }
}
