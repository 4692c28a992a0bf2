//! Resolution of the catalog entities a pin points at.
//!
//! Songs and places are keyed by the external provider's reference and are
//! created the first time a pin mentions them. Genres form a fixed taxonomy
//! and are never created here.

use crate::error::{SongPinError, SongPinResult};
use crate::store::{genres, places, songs, Genre, GenreName, Place, Song, SongId};
use rusqlite::Connection;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, Deserialize)]
pub struct SongRequest {
    pub provider_track_code: String,
    pub title: String,
    pub artist: String,
    #[serde(default)]
    pub img_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaceRequest {
    pub provider_address_id: i64,
    pub place_name: String,
    #[serde(default)]
    pub address: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

impl SongRequest {
    pub fn validate(&self) -> SongPinResult<()> {
        if self.provider_track_code.trim().is_empty() {
            return Err(SongPinError::InvalidInput(
                "Song provider_track_code must not be empty".to_string(),
            ));
        }
        if self.title.trim().is_empty() || self.artist.trim().is_empty() {
            return Err(SongPinError::InvalidInput(
                "Song title and artist must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl PlaceRequest {
    pub fn validate(&self) -> SongPinResult<()> {
        if self.place_name.trim().is_empty() {
            return Err(SongPinError::InvalidInput("Place name must not be empty".to_string()));
        }
        if !(-90.0..=90.0).contains(&self.latitude) || !(-180.0..=180.0).contains(&self.longitude)
        {
            return Err(SongPinError::InvalidInput(format!(
                "Coordinates out of range: {}, {}",
                self.latitude, self.longitude
            )));
        }
        Ok(())
    }
}

/// Returns the song with the request's provider code, creating it if needed.
/// An existing song is returned as stored, the other request fields are ignored.
pub fn get_or_create_song(conn: &Connection, request: &SongRequest) -> SongPinResult<Song> {
    request.validate()?;
    let existing = songs::find_song_by_provider_track_code(conn, &request.provider_track_code)?;
    if let Some(song) = existing {
        return Ok(song);
    }
    debug!("Creating song {}", request.provider_track_code);
    let song = songs::insert_song(
        conn,
        &request.provider_track_code,
        &request.title,
        &request.artist,
        request.img_path.as_deref(),
    )?;
    Ok(song)
}

pub fn get_or_create_place(conn: &Connection, request: &PlaceRequest) -> SongPinResult<Place> {
    request.validate()?;
    let existing = places::find_place_by_provider_address_id(conn, request.provider_address_id)?;
    if let Some(place) = existing {
        return Ok(place);
    }
    debug!("Creating place {}", request.provider_address_id);
    let place = places::insert_place(
        conn,
        request.provider_address_id,
        &request.place_name,
        request.address.as_deref(),
        request.latitude,
        request.longitude,
    )?;
    Ok(place)
}

/// Resolves a genre by its taxonomy name, e.g. `"JAZZ"`.
pub fn get_genre_by_name(conn: &Connection, name: &str) -> SongPinResult<Genre> {
    let genre_name = GenreName::parse(name)
        .ok_or_else(|| SongPinError::NotFound(format!("Genre {} not found", name)))?;
    genres::find_genre_by_name(conn, genre_name)?
        .ok_or_else(|| SongPinError::NotFound(format!("Genre {} not found", name)))
}

pub fn get_song_by_id(conn: &Connection, song_id: SongId) -> SongPinResult<Song> {
    songs::find_song_by_id(conn, song_id)?
        .ok_or_else(|| SongPinError::NotFound(format!("Song {} not found", song_id)))
}

/// The most frequent genre. On a tie, the genre declared first in
/// [`GenreName`] wins. `None` for an empty slice.
pub fn calculate_avg_genre_name(genre_names: &[GenreName]) -> Option<GenreName> {
    let mut counts: HashMap<GenreName, usize> = HashMap::new();
    for genre in genre_names {
        *counts.entry(*genre).or_default() += 1;
    }
    counts
        .into_iter()
        .max_by(|(genre_a, count_a), (genre_b, count_b)| {
            count_a.cmp(count_b).then_with(|| genre_b.cmp(genre_a))
        })
        .map(|(genre, _)| genre)
}
