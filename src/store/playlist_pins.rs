use super::models::{PinId, PlaylistId, PlaylistPin};
use anyhow::{Context, Result};
use rusqlite::{params, Connection, Row};

fn playlist_pin_from_row(row: &Row) -> rusqlite::Result<PlaylistPin> {
    Ok(PlaylistPin {
        id: row.get(0)?,
        playlist_id: row.get(1)?,
        pin_id: row.get(2)?,
        pin_index: row.get(3)?,
    })
}

/// Every link that references the pin, across all playlists.
pub fn find_by_pin(conn: &Connection, pin_id: PinId) -> Result<Vec<PlaylistPin>> {
    let mut stmt = conn.prepare(
        "SELECT id, playlist_id, pin_id, pin_index FROM playlist_pin \
         WHERE pin_id = ?1 ORDER BY playlist_id ASC, pin_index ASC",
    )?;
    let links = stmt
        .query_map(params![pin_id], playlist_pin_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(links)
}

/// The links of a playlist, in `pin_index` order.
pub fn find_by_playlist(conn: &Connection, playlist_id: PlaylistId) -> Result<Vec<PlaylistPin>> {
    let mut stmt = conn.prepare(
        "SELECT id, playlist_id, pin_id, pin_index FROM playlist_pin \
         WHERE playlist_id = ?1 ORDER BY pin_index ASC, id ASC",
    )?;
    let links = stmt
        .query_map(params![playlist_id], playlist_pin_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(links)
}

pub fn count_by_playlist(conn: &Connection, playlist_id: PlaylistId) -> Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM playlist_pin WHERE playlist_id = ?1",
        params![playlist_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

pub fn insert_playlist_pin(
    conn: &Connection,
    playlist_id: PlaylistId,
    pin_id: PinId,
    pin_index: i64,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO playlist_pin (playlist_id, pin_id, pin_index) VALUES (?1, ?2, ?3)",
        params![playlist_id, pin_id, pin_index],
    )
    .with_context(|| format!("Failed to link pin {} to playlist {}", pin_id, playlist_id))?;
    Ok(conn.last_insert_rowid())
}

pub fn update_pin_index(conn: &Connection, playlist_pin_id: i64, pin_index: i64) -> Result<()> {
    conn.execute(
        "UPDATE playlist_pin SET pin_index = ?1 WHERE id = ?2",
        params![pin_index, playlist_pin_id],
    )?;
    Ok(())
}

/// Deletes the given links. Returns how many rows were removed.
pub fn delete_by_ids(conn: &Connection, playlist_pin_ids: &[i64]) -> Result<usize> {
    let mut stmt = conn.prepare("DELETE FROM playlist_pin WHERE id = ?1")?;
    let mut deleted = 0;
    for id in playlist_pin_ids {
        deleted += stmt.execute(params![id])?;
    }
    Ok(deleted)
}

pub fn delete_by_playlist(conn: &Connection, playlist_id: PlaylistId) -> Result<usize> {
    let deleted = conn.execute(
        "DELETE FROM playlist_pin WHERE playlist_id = ?1",
        params![playlist_id],
    )?;
    Ok(deleted)
}
