//! Playlist routes

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::session::Session;
use super::state::ServerState;
use crate::error::SongPinResult;
use crate::playlist::{
    PlaylistCreateRequest, PlaylistDetails, PlaylistService, PlaylistSummary,
    PlaylistUpdateRequest,
};
use crate::store::{PinId, PlaylistId};

#[derive(Serialize, Deserialize, Debug)]
pub struct PlaylistIdResponse {
    pub playlist_id: PlaylistId,
}

#[derive(Deserialize, Debug)]
struct AddPinsBody {
    pub pin_ids: Vec<PinId>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct PinCountResponse {
    pub pin_count: i64,
}

async fn post_playlist(
    session: Session,
    State(playlists): State<PlaylistService>,
    Json(body): Json<PlaylistCreateRequest>,
) -> SongPinResult<impl IntoResponse> {
    let playlist_id = playlists.create_playlist(session.member_id, &body)?;
    Ok((StatusCode::CREATED, Json(PlaylistIdResponse { playlist_id })))
}

async fn get_playlist(
    session: Option<Session>,
    State(playlists): State<PlaylistService>,
    Path(playlist_id): Path<PlaylistId>,
) -> SongPinResult<Json<PlaylistDetails>> {
    let viewer = session.map(|s| s.member_id);
    Ok(Json(playlists.get_playlist(playlist_id, viewer)?))
}

async fn put_playlist(
    session: Session,
    State(playlists): State<PlaylistService>,
    Path(playlist_id): Path<PlaylistId>,
    Json(body): Json<PlaylistUpdateRequest>,
) -> SongPinResult<StatusCode> {
    playlists.update_playlist(playlist_id, session.member_id, &body)?;
    Ok(StatusCode::OK)
}

async fn delete_playlist(
    session: Session,
    State(playlists): State<PlaylistService>,
    Path(playlist_id): Path<PlaylistId>,
) -> SongPinResult<StatusCode> {
    playlists.delete_playlist(playlist_id, session.member_id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn add_playlist_pins(
    session: Session,
    State(playlists): State<PlaylistService>,
    Path(playlist_id): Path<PlaylistId>,
    Json(body): Json<AddPinsBody>,
) -> SongPinResult<Json<PinCountResponse>> {
    let pin_count = playlists.add_pins(playlist_id, session.member_id, &body.pin_ids)?;
    Ok(Json(PinCountResponse { pin_count }))
}

async fn get_my_playlists(
    session: Session,
    State(playlists): State<PlaylistService>,
) -> SongPinResult<Json<Vec<PlaylistSummary>>> {
    Ok(Json(playlists.get_member_playlists(session.member_id)?))
}

pub fn make_playlist_routes(state: ServerState) -> Router {
    Router::new()
        .route("/playlists", post(post_playlist))
        .route(
            "/playlists/{id}",
            get(get_playlist).put(put_playlist).delete(delete_playlist),
        )
        .route("/playlists/{id}/pins", post(add_playlist_pins))
        .route("/me/playlists", get(get_my_playlists))
        .with_state(state)
}
