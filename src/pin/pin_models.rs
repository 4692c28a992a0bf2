use crate::catalog::{PlaceRequest, SongRequest};
use crate::store::pins::PinDetails;
use crate::store::{GenreName, MemberId, PinId, PlaceId, SongId, Visibility};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct PinAddRequest {
    pub song: SongRequest,
    pub place: PlaceRequest,
    pub genre_name: String,
    pub listened_date: NaiveDate,
    #[serde(default)]
    pub memo: Option<String>,
    pub visibility: Visibility,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PinUpdateRequest {
    pub listened_date: NaiveDate,
    #[serde(default)]
    pub memo: Option<String>,
    pub visibility: Visibility,
    pub genre_name: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PinSongInfo {
    pub song_id: SongId,
    pub title: String,
    pub artist: String,
    pub img_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PinPlaceInfo {
    pub place_id: PlaceId,
    pub place_name: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// A pin as shown to a particular viewer.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PinSummary {
    pub pin_id: PinId,
    pub song: PinSongInfo,
    pub place: PinPlaceInfo,
    pub listened_date: NaiveDate,
    pub memo: Option<String>,
    pub visibility: Visibility,
    pub genre_name: GenreName,
    pub creator_id: MemberId,
    pub creator_handle: String,
    pub creator_nickname: String,
    pub is_mine: bool,
}

impl PinSummary {
    pub fn from_details(details: PinDetails, viewer: Option<MemberId>) -> Self {
        PinSummary {
            pin_id: details.pin_id,
            is_mine: viewer == Some(details.creator_id),
            song: PinSongInfo {
                song_id: details.song_id,
                title: details.song_title,
                artist: details.song_artist,
                img_path: details.song_img_path,
            },
            place: PinPlaceInfo {
                place_id: details.place_id,
                place_name: details.place_name,
                latitude: details.latitude,
                longitude: details.longitude,
            },
            listened_date: details.listened_date,
            memo: details.memo,
            visibility: details.visibility,
            genre_name: details.genre_name,
            creator_id: details.creator_id,
            creator_handle: details.creator_handle,
            creator_nickname: details.creator_nickname,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SongDetails {
    pub song_id: SongId,
    pub provider_track_code: String,
    pub title: String,
    pub artist: String,
    pub img_path: Option<String>,
    pub avg_genre_name: Option<GenreName>,
    pub pin_count: i64,
}
