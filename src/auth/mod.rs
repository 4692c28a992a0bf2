//! Token based authentication.
//!
//! A successful login yields an HS256 JWT whose `jti` is recorded in a
//! [`TokenCache`]. A presented token is accepted only when its signature and
//! expiry check out *and* the cache still knows it as live, so logging out
//! (revoking the `jti`) takes effect immediately.

mod jwt;
mod password;
mod token_cache;

pub use jwt::{Claims, JwtCodec};
pub use password::PasswordHasherKind;
pub use token_cache::{SqliteTokenCache, TokenCache};

use crate::store::MemberId;
use std::sync::Arc;
use tracing::debug;

pub const DEFAULT_TOKEN_TTL_SEC: u64 = 60 * 60 * 24;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid access token: {0}")]
    InvalidToken(String),

    #[error("Token cache unavailable: {0:#}")]
    CacheUnavailable(anyhow::Error),

    #[error(transparent)]
    Internal(anyhow::Error),
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

#[derive(Clone)]
pub struct Authenticator {
    codec: JwtCodec,
    cache: Arc<dyn TokenCache>,
    token_ttl_sec: u64,
}

impl Authenticator {
    pub fn new(secret: &[u8], cache: Arc<dyn TokenCache>, token_ttl_sec: u64) -> Self {
        Self {
            codec: JwtCodec::new(secret),
            cache,
            token_ttl_sec,
        }
    }

    pub fn issue_token(&self, member_id: MemberId) -> Result<IssuedToken, AuthError> {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: member_id.to_string(),
            jti: uuid::Uuid::new_v4().to_string(),
            iat: now,
            exp: now + self.token_ttl_sec as i64,
        };
        let token = self.codec.encode(&claims).map_err(AuthError::Internal)?;
        self.cache
            .store_token(&claims.jti, member_id, claims.iat, claims.exp)
            .map_err(AuthError::CacheUnavailable)?;
        debug!("Issued token {} for member {}", claims.jti, member_id);
        Ok(IssuedToken { token, claims })
    }

    /// Validates a presented token and returns its claims.
    pub fn authenticate(&self, token: &str) -> Result<Claims, AuthError> {
        let claims = self
            .codec
            .decode(token)
            .map_err(|err| AuthError::InvalidToken(err.to_string()))?;
        if claims.member_id().is_none() {
            return Err(AuthError::InvalidToken(format!("Bad subject {}", claims.sub)));
        }
        let now = chrono::Utc::now().timestamp();
        let live = self
            .cache
            .is_token_live(&claims.jti, now)
            .map_err(AuthError::CacheUnavailable)?;
        if !live {
            return Err(AuthError::InvalidToken(format!("Token {} was revoked", claims.jti)));
        }
        Ok(claims)
    }

    pub fn revoke(&self, claims: &Claims) -> Result<(), AuthError> {
        self.cache
            .revoke_token(&claims.jti)
            .map_err(AuthError::CacheUnavailable)
    }

    pub fn purge_expired(&self) -> Result<usize, AuthError> {
        self.cache
            .purge_expired(chrono::Utc::now().timestamp())
            .map_err(AuthError::CacheUnavailable)
    }
}
