use super::conversion_error;
use super::models::{MemberId, Playlist, PlaylistId, Visibility};
use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};

const PLAYLIST_COLUMNS: &str = "id, member_id, playlist_name, visibility, created, updated";

fn playlist_from_row(row: &Row) -> rusqlite::Result<Playlist> {
    let visibility: String = row.get(3)?;
    Ok(Playlist {
        id: row.get(0)?,
        member_id: row.get(1)?,
        playlist_name: row.get(2)?,
        visibility: Visibility::parse(&visibility)
            .ok_or_else(|| conversion_error(3, format!("Unknown visibility {}", visibility)))?,
        created: row.get(4)?,
        updated: row.get(5)?,
    })
}

pub fn insert_playlist(
    conn: &Connection,
    member_id: MemberId,
    playlist_name: &str,
    visibility: Visibility,
    now: i64,
) -> Result<Playlist> {
    conn.execute(
        "INSERT INTO playlist (member_id, playlist_name, visibility, created, updated) \
         VALUES (?1, ?2, ?3, ?4, ?4)",
        params![member_id, playlist_name, visibility.as_str(), now],
    )
    .with_context(|| format!("Failed to insert playlist for member {}", member_id))?;
    Ok(Playlist {
        id: conn.last_insert_rowid(),
        member_id,
        playlist_name: playlist_name.to_string(),
        visibility,
        created: now,
        updated: now,
    })
}

pub fn find_playlist_by_id(conn: &Connection, playlist_id: PlaylistId) -> Result<Option<Playlist>> {
    let playlist = conn
        .query_row(
            &format!("SELECT {} FROM playlist WHERE id = ?1", PLAYLIST_COLUMNS),
            params![playlist_id],
            playlist_from_row,
        )
        .optional()?;
    Ok(playlist)
}

/// Most recently updated first.
pub fn find_playlists_by_member(conn: &Connection, member_id: MemberId) -> Result<Vec<Playlist>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM playlist WHERE member_id = ?1 ORDER BY updated DESC, id DESC",
        PLAYLIST_COLUMNS
    ))?;
    let playlists = stmt
        .query_map(params![member_id], playlist_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(playlists)
}

/// Sets name and visibility. `updated` is left to [`touch_playlist`].
pub fn update_playlist(
    conn: &Connection,
    playlist_id: PlaylistId,
    playlist_name: &str,
    visibility: Visibility,
) -> Result<()> {
    let updated = conn
        .execute(
            "UPDATE playlist SET playlist_name = ?1, visibility = ?2 WHERE id = ?3",
            params![playlist_name, visibility.as_str(), playlist_id],
        )
        .with_context(|| format!("Failed to update playlist {}", playlist_id))?;
    if updated == 0 {
        bail!("Playlist {} does not exist", playlist_id);
    }
    Ok(())
}

pub fn touch_playlist(conn: &Connection, playlist_id: PlaylistId, now: i64) -> Result<()> {
    let updated = conn.execute(
        "UPDATE playlist SET updated = ?1 WHERE id = ?2",
        params![now, playlist_id],
    )?;
    if updated == 0 {
        bail!("Playlist {} does not exist", playlist_id);
    }
    Ok(())
}

pub fn delete_playlist(conn: &Connection, playlist_id: PlaylistId) -> Result<()> {
    conn.execute("DELETE FROM playlist WHERE id = ?1", params![playlist_id])
        .with_context(|| format!("Failed to delete playlist {}", playlist_id))?;
    Ok(())
}
