use super::conversion_error;
use super::models::{GenreName, Song, SongId};
use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};

const SONG_COLUMNS: &str = "id, provider_track_code, title, artist, img_path, avg_genre_name";

fn song_from_row(row: &Row) -> rusqlite::Result<Song> {
    let avg_genre_name = match row.get::<_, Option<String>>(5)? {
        Some(name) => Some(
            GenreName::parse(&name)
                .ok_or_else(|| conversion_error(5, format!("Unknown genre {}", name)))?,
        ),
        None => None,
    };
    Ok(Song {
        id: row.get(0)?,
        provider_track_code: row.get(1)?,
        title: row.get(2)?,
        artist: row.get(3)?,
        img_path: row.get(4)?,
        avg_genre_name,
    })
}

pub fn find_song_by_id(conn: &Connection, song_id: SongId) -> Result<Option<Song>> {
    let song = conn
        .query_row(
            &format!("SELECT {} FROM song WHERE id = ?1", SONG_COLUMNS),
            params![song_id],
            song_from_row,
        )
        .optional()?;
    Ok(song)
}

pub fn find_song_by_provider_track_code(conn: &Connection, code: &str) -> Result<Option<Song>> {
    let song = conn
        .query_row(
            &format!(
                "SELECT {} FROM song WHERE provider_track_code = ?1",
                SONG_COLUMNS
            ),
            params![code],
            song_from_row,
        )
        .optional()?;
    Ok(song)
}

pub fn insert_song(
    conn: &Connection,
    provider_track_code: &str,
    title: &str,
    artist: &str,
    img_path: Option<&str>,
) -> Result<Song> {
    conn.execute(
        "INSERT INTO song (provider_track_code, title, artist, img_path) VALUES (?1, ?2, ?3, ?4)",
        params![provider_track_code, title, artist, img_path],
    )
    .with_context(|| format!("Failed to insert song {}", provider_track_code))?;
    Ok(Song {
        id: conn.last_insert_rowid(),
        provider_track_code: provider_track_code.to_string(),
        title: title.to_string(),
        artist: artist.to_string(),
        img_path: img_path.map(str::to_string),
        avg_genre_name: None,
    })
}

/// Writes the mutable columns of `song` back to its row.
pub fn save_song(conn: &Connection, song: &Song) -> Result<()> {
    let updated = conn.execute(
        "UPDATE song SET title = ?1, artist = ?2, img_path = ?3, avg_genre_name = ?4 WHERE id = ?5",
        params![
            song.title,
            song.artist,
            song.img_path,
            song.avg_genre_name.map(|g| g.as_str()),
            song.id
        ],
    )?;
    if updated == 0 {
        anyhow::bail!("Song {} does not exist", song.id);
    }
    Ok(())
}

pub fn count_pins_of_song(conn: &Connection, song_id: SongId) -> Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM pin WHERE song_id = ?1",
        params![song_id],
        |row| row.get(0),
    )?;
    Ok(count)
}
