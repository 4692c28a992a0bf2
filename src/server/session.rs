use super::state::ServerState;
use crate::auth::{AuthError, Claims};
use crate::error::SongPinError;
use crate::store::MemberId;

use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{debug, warn};

/// The authenticated member behind a request.
#[derive(Debug, Clone)]
pub struct Session {
    pub member_id: MemberId,
    pub claims: Claims,
}

const BEARER_PREFIX: &str = "Bearer ";

#[derive(Debug)]
pub enum SessionExtractionError {
    MissingToken,
    InvalidToken,
    CacheUnavailable(String),
}

impl IntoResponse for SessionExtractionError {
    fn into_response(self) -> Response {
        match self {
            SessionExtractionError::MissingToken => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "UNAUTHENTICATED", "message": "Missing access token" })),
            )
                .into_response(),
            SessionExtractionError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "UNAUTHENTICATED", "message": "Invalid access token" })),
            )
                .into_response(),
            SessionExtractionError::CacheUnavailable(msg) => {
                SongPinError::ExternalDependencyFailure(msg).into_response()
            }
        }
    }
}

fn extract_bearer_token(parts: &Parts) -> Option<Result<String, SessionExtractionError>> {
    let value = parts.headers.get(header::AUTHORIZATION)?;
    let token = value
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix(BEARER_PREFIX))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .ok_or(SessionExtractionError::InvalidToken);
    Some(token)
}

/// `Ok(None)` when the request carries no token at all.
fn extract_session_from_request_parts(
    parts: &Parts,
    ctx: &ServerState,
) -> Result<Option<Session>, SessionExtractionError> {
    let token = match extract_bearer_token(parts) {
        None => {
            debug!("No token in headers.");
            return Ok(None);
        }
        Some(token) => token?,
    };

    match ctx.authenticator.authenticate(&token) {
        Ok(claims) => match claims.member_id() {
            Some(member_id) => {
                debug!("Authenticated member_id={}", member_id);
                Ok(Some(Session { member_id, claims }))
            }
            None => Err(SessionExtractionError::InvalidToken),
        },
        Err(AuthError::InvalidToken(reason)) => {
            debug!("Rejected token: {}", reason);
            Err(SessionExtractionError::InvalidToken)
        }
        Err(AuthError::CacheUnavailable(err)) => {
            warn!("Token cache unavailable: {:#}", err);
            Err(SessionExtractionError::CacheUnavailable("Token cache unavailable".to_string()))
        }
        Err(AuthError::Internal(err)) => {
            warn!("Token check failed: {:#}", err);
            Err(SessionExtractionError::InvalidToken)
        }
    }
}

impl FromRequestParts<ServerState> for Session {
    type Rejection = SessionExtractionError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        extract_session_from_request_parts(parts, ctx)?.ok_or(SessionExtractionError::MissingToken)
    }
}

/// Anonymous requests are allowed, but a token that is present has to be valid.
impl OptionalFromRequestParts<ServerState> for Session {
    type Rejection = SessionExtractionError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &ServerState,
    ) -> Result<Option<Self>, Self::Rejection> {
        extract_session_from_request_parts(parts, ctx)
    }
}
