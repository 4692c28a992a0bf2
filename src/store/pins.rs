//! Pin queries.
//!
//! The listing queries return [`PinDetails`], a pin joined with its song,
//! place, genre and owner, ordered by `listened_date DESC, id DESC` unless
//! stated otherwise.

use super::conversion_error;
use super::models::*;
use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row, ToSql};

const DATE_FORMAT: &str = "%Y-%m-%d";

const PIN_COLUMNS: &str =
    "id, member_id, song_id, place_id, genre_id, listened_date, memo, visibility, created_time";

const PIN_DETAILS_SELECT: &str = "SELECT pin.id, pin.listened_date, pin.memo, pin.visibility, \
     member.id, member.handle, member.nickname, \
     song.id, song.title, song.artist, song.img_path, \
     place.id, place.place_name, place.latitude, place.longitude, \
     genre.name \
     FROM pin \
     JOIN member ON member.id = pin.member_id \
     JOIN song ON song.id = pin.song_id \
     JOIN place ON place.id = pin.place_id \
     JOIN genre ON genre.id = pin.genre_id";

const NEWEST_FIRST: &str = "ORDER BY pin.listened_date DESC, pin.id DESC";

pub struct NewPin<'a> {
    pub member_id: MemberId,
    pub song_id: SongId,
    pub place_id: PlaceId,
    pub genre_id: GenreId,
    pub listened_date: NaiveDate,
    pub memo: Option<&'a str>,
    pub visibility: Visibility,
}

/// A pin together with everything needed to display it.
#[derive(Debug, Clone)]
pub struct PinDetails {
    pub pin_id: PinId,
    pub listened_date: NaiveDate,
    pub memo: Option<String>,
    pub visibility: Visibility,
    pub creator_id: MemberId,
    pub creator_handle: String,
    pub creator_nickname: String,
    pub song_id: SongId,
    pub song_title: String,
    pub song_artist: String,
    pub song_img_path: Option<String>,
    pub place_id: PlaceId,
    pub place_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub genre_name: GenreName,
}

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn parse_date(column: usize, value: String) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(&value, DATE_FORMAT)
        .map_err(|err| conversion_error(column, format!("Bad date {}: {}", value, err)))
}

fn parse_visibility(column: usize, value: String) -> rusqlite::Result<Visibility> {
    Visibility::parse(&value)
        .ok_or_else(|| conversion_error(column, format!("Unknown visibility {}", value)))
}

fn parse_genre_name(column: usize, value: String) -> rusqlite::Result<GenreName> {
    GenreName::parse(&value)
        .ok_or_else(|| conversion_error(column, format!("Unknown genre {}", value)))
}

fn pin_from_row(row: &Row) -> rusqlite::Result<Pin> {
    Ok(Pin {
        id: row.get(0)?,
        member_id: row.get(1)?,
        song_id: row.get(2)?,
        place_id: row.get(3)?,
        genre_id: row.get(4)?,
        listened_date: parse_date(5, row.get(5)?)?,
        memo: row.get(6)?,
        visibility: parse_visibility(7, row.get(7)?)?,
        created_time: row.get(8)?,
    })
}

fn pin_details_from_row(row: &Row) -> rusqlite::Result<PinDetails> {
    Ok(PinDetails {
        pin_id: row.get(0)?,
        listened_date: parse_date(1, row.get(1)?)?,
        memo: row.get(2)?,
        visibility: parse_visibility(3, row.get(3)?)?,
        creator_id: row.get(4)?,
        creator_handle: row.get(5)?,
        creator_nickname: row.get(6)?,
        song_id: row.get(7)?,
        song_title: row.get(8)?,
        song_artist: row.get(9)?,
        song_img_path: row.get(10)?,
        place_id: row.get(11)?,
        place_name: row.get(12)?,
        latitude: row.get(13)?,
        longitude: row.get(14)?,
        genre_name: parse_genre_name(15, row.get(15)?)?,
    })
}

fn query_pin_details(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> Result<Vec<PinDetails>> {
    let mut stmt = conn.prepare(sql)?;
    let pins = stmt
        .query_map(params, pin_details_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(pins)
}

pub fn insert_pin(conn: &Connection, pin: &NewPin, created_time: i64) -> Result<Pin> {
    conn.execute(
        "INSERT INTO pin (member_id, song_id, place_id, genre_id, listened_date, memo, \
         visibility, created_time) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            pin.member_id,
            pin.song_id,
            pin.place_id,
            pin.genre_id,
            format_date(pin.listened_date),
            pin.memo,
            pin.visibility.as_str(),
            created_time
        ],
    )
    .context("Failed to insert pin")?;
    Ok(Pin {
        id: conn.last_insert_rowid(),
        member_id: pin.member_id,
        song_id: pin.song_id,
        place_id: pin.place_id,
        genre_id: pin.genre_id,
        listened_date: pin.listened_date,
        memo: pin.memo.map(str::to_string),
        visibility: pin.visibility,
        created_time,
    })
}

pub fn find_pin_by_id(conn: &Connection, pin_id: PinId) -> Result<Option<Pin>> {
    let pin = conn
        .query_row(
            &format!("SELECT {} FROM pin WHERE id = ?1", PIN_COLUMNS),
            params![pin_id],
            pin_from_row,
        )
        .optional()?;
    Ok(pin)
}

pub fn find_pin_details_by_id(conn: &Connection, pin_id: PinId) -> Result<Option<PinDetails>> {
    let pin = conn
        .query_row(
            &format!("{} WHERE pin.id = ?1", PIN_DETAILS_SELECT),
            params![pin_id],
            pin_details_from_row,
        )
        .optional()?;
    Ok(pin)
}

/// Writes the editable columns of `pin`: listened date, memo, visibility and genre.
pub fn update_pin(conn: &Connection, pin: &Pin) -> Result<()> {
    let updated = conn.execute(
        "UPDATE pin SET listened_date = ?1, memo = ?2, visibility = ?3, genre_id = ?4 \
         WHERE id = ?5",
        params![
            format_date(pin.listened_date),
            pin.memo,
            pin.visibility.as_str(),
            pin.genre_id,
            pin.id
        ],
    )?;
    if updated == 0 {
        bail!("Pin {} does not exist", pin.id);
    }
    Ok(())
}

/// Fails while any playlist still links the pin.
pub fn delete_pin(conn: &Connection, pin_id: PinId) -> Result<()> {
    let deleted = conn
        .execute("DELETE FROM pin WHERE id = ?1", params![pin_id])
        .with_context(|| format!("Failed to delete pin {}", pin_id))?;
    if deleted == 0 {
        bail!("Pin {} does not exist", pin_id);
    }
    Ok(())
}

pub fn find_pin_ids_by_member(conn: &Connection, member_id: MemberId) -> Result<Vec<PinId>> {
    let mut stmt = conn.prepare("SELECT id FROM pin WHERE member_id = ?1 ORDER BY id ASC")?;
    let ids = stmt
        .query_map(params![member_id], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<PinId>>>()?;
    Ok(ids)
}

/// The genre of every pin of the song, one entry per pin.
pub fn find_genre_names_by_song(conn: &Connection, song_id: SongId) -> Result<Vec<GenreName>> {
    let mut stmt = conn.prepare(
        "SELECT genre.name FROM pin JOIN genre ON genre.id = pin.genre_id \
         WHERE pin.song_id = ?1",
    )?;
    let names = stmt
        .query_map(params![song_id], |row| parse_genre_name(0, row.get(0)?))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(names)
}

/// Every pin of `member_id` on the song, whatever its visibility.
pub fn find_by_song_and_member(
    conn: &Connection,
    song_id: SongId,
    member_id: MemberId,
) -> Result<Vec<PinDetails>> {
    query_pin_details(
        conn,
        &format!(
            "{} WHERE pin.song_id = ?1 AND pin.member_id = ?2 {}",
            PIN_DETAILS_SELECT, NEWEST_FIRST
        ),
        params![song_id, member_id],
    )
}

pub fn find_by_song_member_and_visibility(
    conn: &Connection,
    song_id: SongId,
    member_id: MemberId,
    visibility: Visibility,
) -> Result<Vec<PinDetails>> {
    query_pin_details(
        conn,
        &format!(
            "{} WHERE pin.song_id = ?1 AND pin.member_id = ?2 AND pin.visibility = ?3 {}",
            PIN_DETAILS_SELECT, NEWEST_FIRST
        ),
        params![song_id, member_id, visibility.as_str()],
    )
}

/// Pins of any member on the song with the given visibility.
pub fn find_by_song_and_visibility(
    conn: &Connection,
    song_id: SongId,
    visibility: Visibility,
) -> Result<Vec<PinDetails>> {
    query_pin_details(
        conn,
        &format!(
            "{} WHERE pin.song_id = ?1 AND pin.visibility = ?2 {}",
            PIN_DETAILS_SELECT, NEWEST_FIRST
        ),
        params![song_id, visibility.as_str()],
    )
}

/// Pins linked into the playlist, in playlist order.
pub fn find_by_playlist(conn: &Connection, playlist_id: PlaylistId) -> Result<Vec<PinDetails>> {
    query_pin_details(
        conn,
        &format!(
            "{} JOIN playlist_pin ON playlist_pin.pin_id = pin.id \
             WHERE playlist_pin.playlist_id = ?1 \
             ORDER BY playlist_pin.pin_index ASC, playlist_pin.id ASC",
            PIN_DETAILS_SELECT
        ),
        params![playlist_id],
    )
}
