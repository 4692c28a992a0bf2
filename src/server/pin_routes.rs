//! Pin and song routes

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::metrics::record_pin_mutation;
use super::session::Session;
use super::state::ServerState;
use crate::error::SongPinResult;
use crate::pin::{PinAddRequest, PinEngine, PinSummary, PinUpdateRequest, SongDetails};
use crate::store::{PinId, SongId};

#[derive(Serialize, Deserialize, Debug)]
pub struct SongIdResponse {
    pub song_id: SongId,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct SongPinsQuery {
    only_my_pins: bool,
}

async fn post_pin(
    session: Session,
    State(engine): State<PinEngine>,
    Json(body): Json<PinAddRequest>,
) -> SongPinResult<impl IntoResponse> {
    let song_id = engine.create_pin(session.member_id, &body)?;
    record_pin_mutation("create");
    Ok((StatusCode::CREATED, Json(SongIdResponse { song_id })))
}

async fn get_pin(
    session: Session,
    State(engine): State<PinEngine>,
    Path(pin_id): Path<PinId>,
) -> SongPinResult<Json<PinSummary>> {
    Ok(Json(engine.get_pin_for_viewer(pin_id, Some(session.member_id))?))
}

async fn put_pin(
    session: Session,
    State(engine): State<PinEngine>,
    Path(pin_id): Path<PinId>,
    Json(body): Json<PinUpdateRequest>,
) -> SongPinResult<Json<SongIdResponse>> {
    debug!("Updating pin {} for member {}", pin_id, session.member_id);
    let song_id = engine.update_pin(pin_id, session.member_id, &body)?;
    record_pin_mutation("update");
    Ok(Json(SongIdResponse { song_id }))
}

async fn delete_pin(
    session: Session,
    State(engine): State<PinEngine>,
    Path(pin_id): Path<PinId>,
) -> SongPinResult<StatusCode> {
    engine.delete_pin(pin_id, session.member_id)?;
    record_pin_mutation("delete");
    Ok(StatusCode::NO_CONTENT)
}

async fn get_song(
    _session: Option<Session>,
    State(engine): State<PinEngine>,
    Path(song_id): Path<SongId>,
) -> SongPinResult<Json<SongDetails>> {
    Ok(Json(engine.get_song_details(song_id)?))
}

async fn get_song_pins(
    session: Option<Session>,
    State(engine): State<PinEngine>,
    Path(song_id): Path<SongId>,
    Query(query): Query<SongPinsQuery>,
) -> SongPinResult<Json<Vec<PinSummary>>> {
    let viewer = session.map(|s| s.member_id);
    Ok(Json(engine.get_pins_for_song(song_id, viewer, query.only_my_pins)?))
}

pub fn make_pin_routes(state: ServerState) -> Router {
    Router::new()
        .route("/pins", axum::routing::post(post_pin))
        .route("/pins/{id}", get(get_pin).put(put_pin).delete(delete_pin))
        .route("/songs/{id}", get(get_song))
        .route("/songs/{id}/pins", get(get_song_pins))
        .with_state(state)
}
