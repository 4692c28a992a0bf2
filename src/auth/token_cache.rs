use crate::store::{MemberId, SongPinStore};
use anyhow::{Context, Result};
use rusqlite::{params, OptionalExtension};

/// Keeps track of issued tokens so that they can be revoked before they
/// expire. An `Err` from any method means the cache could not be consulted.
pub trait TokenCache: Send + Sync {
    fn store_token(&self, token_id: &str, member_id: MemberId, issued: i64, expires: i64)
        -> Result<()>;

    /// True when the token was issued, is not revoked and has not expired at `now`.
    fn is_token_live(&self, token_id: &str, now: i64) -> Result<bool>;

    fn revoke_token(&self, token_id: &str) -> Result<()>;

    /// Forgets tokens that expired before `now`. Returns how many were removed.
    fn purge_expired(&self, now: i64) -> Result<usize>;
}

/// Token cache kept in the `auth_token_cache` table of the songpin database.
pub struct SqliteTokenCache {
    store: SongPinStore,
}

impl SqliteTokenCache {
    pub fn new(store: SongPinStore) -> Self {
        Self { store }
    }
}

impl TokenCache for SqliteTokenCache {
    fn store_token(
        &self,
        token_id: &str,
        member_id: MemberId,
        issued: i64,
        expires: i64,
    ) -> Result<()> {
        self.store.write(|tx| {
            tx.execute(
                "INSERT INTO auth_token_cache (token_id, member_id, issued, expires) \
                 VALUES (?1, ?2, ?3, ?4)",
                params![token_id, member_id, issued, expires],
            )
            .context("Failed to cache issued token")?;
            Ok(())
        })
    }

    fn is_token_live(&self, token_id: &str, now: i64) -> Result<bool> {
        self.store.read(|conn| {
            let revoked: Option<bool> = conn
                .query_row(
                    "SELECT revoked FROM auth_token_cache WHERE token_id = ?1 AND expires > ?2",
                    params![token_id, now],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(revoked == Some(false))
        })
    }

    fn revoke_token(&self, token_id: &str) -> Result<()> {
        self.store.write(|tx| {
            tx.execute(
                "UPDATE auth_token_cache SET revoked = 1 WHERE token_id = ?1",
                params![token_id],
            )?;
            Ok(())
        })
    }

    fn purge_expired(&self, now: i64) -> Result<usize> {
        self.store.write(|tx| {
            let removed = tx.execute(
                "DELETE FROM auth_token_cache WHERE expires <= ?1",
                params![now],
            )?;
            Ok(removed)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::members;

    fn cache() -> (SqliteTokenCache, MemberId) {
        let store = SongPinStore::open_in_memory().unwrap();
        let member = store
            .write(|tx| members::insert_member(tx, "alice", "Alice"))
            .unwrap();
        (SqliteTokenCache::new(store), member)
    }

    #[test]
    fn issued_token_is_live_until_revoked() {
        let (cache, member) = cache();
        assert!(!cache.is_token_live("jti-1", 100).unwrap());

        cache.store_token("jti-1", member, 100, 200).unwrap();
        assert!(cache.is_token_live("jti-1", 150).unwrap());

        cache.revoke_token("jti-1").unwrap();
        assert!(!cache.is_token_live("jti-1", 150).unwrap());
    }

    #[test]
    fn expired_token_is_not_live_and_gets_purged() {
        let (cache, member) = cache();
        cache.store_token("old", member, 0, 10).unwrap();
        cache.store_token("new", member, 0, 1000).unwrap();
        assert!(!cache.is_token_live("old", 10).unwrap());

        assert_eq!(cache.purge_expired(500).unwrap(), 1);
        assert!(cache.is_token_live("new", 500).unwrap());
    }

    #[test]
    fn token_ids_are_unique() {
        let (cache, member) = cache();
        cache.store_token("same", member, 0, 10).unwrap();
        assert!(cache.store_token("same", member, 0, 10).is_err());
    }
}
