//! Place search routes

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use super::session::Session;
use super::state::ServerState;
use crate::error::SongPinResult;
use crate::place::{
    PlaceSearch, PlaceSearchPage, PlaceUnit, SortBy, DEFAULT_NEWEST_PLACES, DEFAULT_PAGE_SIZE,
};

fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

fn default_newest_limit() -> i64 {
    DEFAULT_NEWEST_PLACES
}

#[derive(Deserialize, Debug)]
struct PlaceSearchQuery {
    keyword: String,
    #[serde(default)]
    sort_by: SortBy,
    #[serde(default)]
    page: i64,
    #[serde(default = "default_page_size")]
    size: i64,
}

#[derive(Deserialize, Debug)]
struct NewestPlacesQuery {
    #[serde(default = "default_newest_limit")]
    limit: i64,
}

async fn search_places(
    _session: Option<Session>,
    State(place_search): State<PlaceSearch>,
    Query(query): Query<PlaceSearchQuery>,
) -> SongPinResult<Json<PlaceSearchPage>> {
    Ok(Json(place_search.search_places(&query.keyword, query.sort_by, query.page, query.size)?))
}

async fn newest_places(
    _session: Option<Session>,
    State(place_search): State<PlaceSearch>,
    Query(query): Query<NewestPlacesQuery>,
) -> SongPinResult<Json<Vec<PlaceUnit>>> {
    Ok(Json(place_search.top_newest_places(query.limit)?))
}

pub fn make_place_routes(state: ServerState) -> Router {
    Router::new()
        .route("/search", get(search_places))
        .route("/newest", get(newest_places))
        .with_state(state)
}
