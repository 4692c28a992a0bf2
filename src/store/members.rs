use super::models::{Member, MemberId};
use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};

/// A stored password credential. `hasher` names the algorithm that produced
/// `hash`, so that the algorithm can change without invalidating old rows.
#[derive(Debug, Clone)]
pub struct PasswordCredentials {
    pub member_id: MemberId,
    pub salt: String,
    pub hash: String,
    pub hasher: String,
    pub created: i64,
    pub last_used: Option<i64>,
}

fn member_from_row(row: &Row) -> rusqlite::Result<Member> {
    Ok(Member {
        id: row.get(0)?,
        handle: row.get(1)?,
        nickname: row.get(2)?,
    })
}

pub fn insert_member(conn: &Connection, handle: &str, nickname: &str) -> Result<MemberId> {
    conn.execute(
        "INSERT INTO member (handle, nickname) VALUES (?1, ?2)",
        params![handle, nickname],
    )
    .with_context(|| format!("Failed to insert member {}", handle))?;
    Ok(conn.last_insert_rowid())
}

pub fn find_member_by_id(conn: &Connection, member_id: MemberId) -> Result<Option<Member>> {
    let member = conn
        .query_row(
            "SELECT id, handle, nickname FROM member WHERE id = ?1",
            params![member_id],
            member_from_row,
        )
        .optional()?;
    Ok(member)
}

pub fn find_member_by_handle(conn: &Connection, handle: &str) -> Result<Option<Member>> {
    let member = conn
        .query_row(
            "SELECT id, handle, nickname FROM member WHERE handle = ?1",
            params![handle],
            member_from_row,
        )
        .optional()?;
    Ok(member)
}

pub fn get_all_handles(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT handle FROM member ORDER BY handle ASC")?;
    let handles = stmt
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(handles)
}

pub fn delete_member(conn: &Connection, member_id: MemberId) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM member WHERE id = ?1", params![member_id])?;
    Ok(deleted > 0)
}

pub fn get_password_credentials(
    conn: &Connection,
    member_id: MemberId,
) -> Result<Option<PasswordCredentials>> {
    let credentials = conn
        .query_row(
            "SELECT member_id, salt, hash, hasher, created, last_used \
             FROM member_password_credentials WHERE member_id = ?1",
            params![member_id],
            |row| {
                Ok(PasswordCredentials {
                    member_id: row.get(0)?,
                    salt: row.get(1)?,
                    hash: row.get(2)?,
                    hasher: row.get(3)?,
                    created: row.get(4)?,
                    last_used: row.get(5)?,
                })
            },
        )
        .optional()?;
    Ok(credentials)
}

/// Inserts the credentials, replacing any previous password of the member.
pub fn upsert_password_credentials(
    conn: &Connection,
    member_id: MemberId,
    salt: &str,
    hash: &str,
    hasher: &str,
) -> Result<()> {
    conn.execute(
        "INSERT INTO member_password_credentials (member_id, salt, hash, hasher) \
         VALUES (?1, ?2, ?3, ?4) \
         ON CONFLICT(member_id) DO UPDATE SET \
         salt = excluded.salt, hash = excluded.hash, hasher = excluded.hasher, \
         created = excluded.created, last_used = NULL",
        params![member_id, salt, hash, hasher],
    )
    .with_context(|| format!("Failed to store password for member {}", member_id))?;
    Ok(())
}

pub fn touch_password_credentials(conn: &Connection, member_id: MemberId, now: i64) -> Result<()> {
    conn.execute(
        "UPDATE member_password_credentials SET last_used = ?1 WHERE member_id = ?2",
        params![now, member_id],
    )?;
    Ok(())
}
