use super::conversion_error;
use super::models::{Genre, GenreId, GenreName};
use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};

/// Makes sure every genre of the taxonomy has a row. Safe to call on every open.
pub fn seed_genres(conn: &Connection) -> Result<()> {
    let mut stmt = conn.prepare("INSERT OR IGNORE INTO genre (name) VALUES (?1)")?;
    for genre in GenreName::ALL {
        stmt.execute(params![genre.as_str()])?;
    }
    Ok(())
}

pub fn find_genre_by_name(conn: &Connection, name: GenreName) -> Result<Option<Genre>> {
    let genre = conn
        .query_row(
            "SELECT id FROM genre WHERE name = ?1",
            params![name.as_str()],
            |row| row.get::<_, GenreId>(0),
        )
        .optional()?
        .map(|id| Genre { id, name });
    Ok(genre)
}

pub fn find_genre_by_id(conn: &Connection, genre_id: GenreId) -> Result<Option<Genre>> {
    let genre = conn
        .query_row(
            "SELECT id, name FROM genre WHERE id = ?1",
            params![genre_id],
            |row| {
                let name: String = row.get(1)?;
                Ok(Genre {
                    id: row.get(0)?,
                    name: GenreName::parse(&name)
                        .ok_or_else(|| conversion_error(1, format!("Unknown genre {}", name)))?,
                })
            },
        )
        .optional()?;
    Ok(genre)
}
