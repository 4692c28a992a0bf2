use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub type MemberId = i64;
pub type SongId = i64;
pub type PlaceId = i64;
pub type GenreId = i64;
pub type PinId = i64;
pub type PlaylistId = i64;

/// Who can see a pin or a playlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Visibility {
    Public,
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "PUBLIC",
            Visibility::Private => "PRIVATE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PUBLIC" => Some(Visibility::Public),
            "PRIVATE" => Some(Visibility::Private),
            _ => None,
        }
    }
}

/// The genre taxonomy. Declaration order is the canonical order, and is used
/// to break ties when computing a song's average genre.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GenreName {
    Pop,
    Ballad,
    Hiphop,
    Rnb,
    Rock,
    Indie,
    Jazz,
    Electronic,
    Classic,
    Extra,
}

impl GenreName {
    pub const ALL: [GenreName; 10] = [
        GenreName::Pop,
        GenreName::Ballad,
        GenreName::Hiphop,
        GenreName::Rnb,
        GenreName::Rock,
        GenreName::Indie,
        GenreName::Jazz,
        GenreName::Electronic,
        GenreName::Classic,
        GenreName::Extra,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GenreName::Pop => "POP",
            GenreName::Ballad => "BALLAD",
            GenreName::Hiphop => "HIPHOP",
            GenreName::Rnb => "RNB",
            GenreName::Rock => "ROCK",
            GenreName::Indie => "INDIE",
            GenreName::Jazz => "JAZZ",
            GenreName::Electronic => "ELECTRONIC",
            GenreName::Classic => "CLASSIC",
            GenreName::Extra => "EXTRA",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        GenreName::ALL.into_iter().find(|g| g.as_str() == s)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Member {
    pub id: MemberId,
    pub handle: String,
    pub nickname: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Genre {
    pub id: GenreId,
    pub name: GenreName,
}

#[derive(Debug, Clone, Serialize)]
pub struct Song {
    pub id: SongId,
    pub provider_track_code: String,
    pub title: String,
    pub artist: String,
    pub img_path: Option<String>,
    pub avg_genre_name: Option<GenreName>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Place {
    pub id: PlaceId,
    pub provider_address_id: i64,
    pub place_name: String,
    pub address: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Pin {
    pub id: PinId,
    pub member_id: MemberId,
    pub song_id: SongId,
    pub place_id: PlaceId,
    pub genre_id: GenreId,
    pub listened_date: NaiveDate,
    pub memo: Option<String>,
    pub visibility: Visibility,
    pub created_time: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Playlist {
    pub id: PlaylistId,
    pub member_id: MemberId,
    pub playlist_name: String,
    pub visibility: Visibility,
    pub created: i64,
    pub updated: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlaylistPin {
    pub id: i64,
    pub playlist_id: PlaylistId,
    pub pin_id: PinId,
    pub pin_index: i64,
}
