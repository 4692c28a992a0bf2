use axum::extract::FromRef;

use crate::auth::Authenticator;
use crate::member::MemberManager;
use crate::pin::PinEngine;
use crate::place::PlaceSearch;
use crate::playlist::PlaylistService;
use crate::store::SongPinStore;
use std::time::Instant;

use super::ServerConfig;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub hash: String,
    pub pin_engine: PinEngine,
    pub playlist_service: PlaylistService,
    pub place_search: PlaceSearch,
    pub member_manager: MemberManager,
    pub authenticator: Authenticator,
}

impl ServerState {
    pub fn new(
        config: ServerConfig,
        store: SongPinStore,
        pin_engine: PinEngine,
        authenticator: Authenticator,
    ) -> ServerState {
        ServerState {
            config,
            start_time: Instant::now(),
            hash: env!("GIT_HASH").to_owned(),
            pin_engine,
            playlist_service: PlaylistService::new(store.clone()),
            place_search: PlaceSearch::new(store.clone()),
            member_manager: MemberManager::new(store),
            authenticator,
        }
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}

impl FromRef<ServerState> for PinEngine {
    fn from_ref(input: &ServerState) -> Self {
        input.pin_engine.clone()
    }
}

impl FromRef<ServerState> for PlaylistService {
    fn from_ref(input: &ServerState) -> Self {
        input.playlist_service.clone()
    }
}

impl FromRef<ServerState> for PlaceSearch {
    fn from_ref(input: &ServerState) -> Self {
        input.place_search.clone()
    }
}

impl FromRef<ServerState> for MemberManager {
    fn from_ref(input: &ServerState) -> Self {
        input.member_manager.clone()
    }
}

impl FromRef<ServerState> for Authenticator {
    fn from_ref(input: &ServerState) -> Self {
        input.authenticator.clone()
    }
}
