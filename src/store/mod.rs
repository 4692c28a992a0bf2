//! SQLite persistence for members, catalog entries, pins and playlists.
//!
//! The submodules hold one explicit query function per access pattern. They
//! all take a plain `&Connection`, so the same function can run standalone
//! or inside a transaction opened with [`SongPinStore::write`].

pub mod genres;
pub mod members;
pub mod models;
pub mod pins;
pub mod places;
pub mod playlist_pins;
pub mod playlists;
mod schema;
pub mod songs;

pub use models::*;
pub use schema::VERSIONED_SCHEMAS;

use crate::sqlite_persistence::{read_db_version, BASE_DB_VERSION};
use anyhow::{anyhow, bail, Context, Result};
use rusqlite::{types::Type, Connection, Transaction};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

#[derive(Clone)]
pub struct SongPinStore {
    conn: Arc<Mutex<Connection>>,
}

impl SongPinStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let path = db_path.as_ref();
        let is_new_db = !path.exists();

        let mut conn = Connection::open(path)
            .with_context(|| format!("Failed to open songpin database at {:?}", path))?;

        if is_new_db {
            info!("Creating new songpin database at {:?}", path);
            Self::latest_schema()?.create(&conn)?;
        } else {
            let db_version = read_db_version(&conn)?;
            let schema = VERSIONED_SCHEMAS
                .iter()
                .find(|s| s.version == db_version)
                .with_context(|| format!("Unknown songpin database version {}", db_version))?;
            schema.validate(&conn).with_context(|| {
                format!(
                    "Songpin database schema validation failed for version {}",
                    db_version
                )
            })?;
            Self::migrate_if_needed(&mut conn, db_version)?;
        }

        Self::from_connection(conn)
    }

    /// Fresh database that lives only as long as the store.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::latest_schema()?.create(&conn)?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        // Foreign key enforcement is a per-connection setting.
        conn.execute("PRAGMA foreign_keys = ON;", [])?;
        genres::seed_genres(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn latest_schema() -> Result<&'static crate::sqlite_persistence::VersionedSchema> {
        VERSIONED_SCHEMAS
            .last()
            .context("No songpin schema defined")
    }

    fn migrate_if_needed(conn: &mut Connection, from_version: usize) -> Result<()> {
        let latest = Self::latest_schema()?.version;
        if from_version > latest {
            bail!("Songpin database version {} is too new", from_version);
        }
        if from_version == latest {
            return Ok(());
        }

        let tx = conn.transaction()?;
        let mut current = from_version;
        for schema in VERSIONED_SCHEMAS
            .iter()
            .filter(|s| s.version > from_version)
        {
            info!(
                "Migrating songpin database from version {} to {}",
                current, schema.version
            );
            if let Some(migration_fn) = schema.migration {
                migration_fn(&tx).with_context(|| {
                    format!("Failed to run migration to version {}", schema.version)
                })?;
            }
            current = schema.version;
        }
        tx.execute(
            &format!("PRAGMA user_version = {}", BASE_DB_VERSION + current),
            [],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("Songpin store connection mutex is poisoned"))
    }

    /// Runs `f` against the connection without opening a transaction.
    pub fn read<T, E>(&self, f: impl FnOnce(&Connection) -> Result<T, E>) -> Result<T, E>
    where
        E: From<anyhow::Error>,
    {
        let conn = self.lock()?;
        f(&conn)
    }

    /// Runs `f` inside a transaction. The transaction is committed only if
    /// `f` returns `Ok`; on `Err` every write made by `f` is rolled back.
    pub fn write<T, E>(&self, f: impl FnOnce(&Transaction) -> Result<T, E>) -> Result<T, E>
    where
        E: From<anyhow::Error>,
    {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .context("Failed to begin songpin transaction")?;
        let value = f(&tx)?;
        tx.commit().context("Failed to commit songpin transaction")?;
        Ok(value)
    }
}

pub(crate) fn conversion_error(column: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, message.into())
}

pub(crate) fn now_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}
