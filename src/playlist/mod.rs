//! Playlists: ordered, per-member collections of pins.
//!
//! A playlist's links always carry a dense `pin_index` sequence starting at
//! 0, and every change to the links bumps the playlist's `updated` time.

use crate::error::{SongPinError, SongPinResult};
use crate::pin::PinSummary;
use crate::store::{
    members, now_timestamp, pins, playlist_pins, playlists, MemberId, PinId, Playlist,
    PlaylistId, SongPinStore, Visibility,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const MAX_PLAYLIST_NAME_CHARS: usize = 40;
pub const MAX_PINS_PER_PLAYLIST: i64 = 100;

#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistCreateRequest {
    pub playlist_name: String,
    pub visibility: Visibility,
}

/// Every field is optional; `playlist_pin_ids` is the complete new order of
/// the playlist's links, links left out are removed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlaylistUpdateRequest {
    #[serde(default)]
    pub playlist_name: Option<String>,
    #[serde(default)]
    pub visibility: Option<Visibility>,
    #[serde(default)]
    pub playlist_pin_ids: Option<Vec<i64>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlaylistSummary {
    pub playlist_id: PlaylistId,
    pub playlist_name: String,
    pub visibility: Visibility,
    pub pin_count: i64,
    pub updated: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlaylistEntry {
    pub playlist_pin_id: i64,
    pub pin_index: i64,
    pub pin: PinSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlaylistDetails {
    pub playlist_id: PlaylistId,
    pub playlist_name: String,
    pub visibility: Visibility,
    pub creator_id: MemberId,
    pub creator_nickname: String,
    pub is_mine: bool,
    pub updated: i64,
    pub pins: Vec<PlaylistEntry>,
}

fn validate_name(name: &str) -> SongPinResult<()> {
    let chars = name.trim().chars().count();
    if chars == 0 || chars > MAX_PLAYLIST_NAME_CHARS {
        return Err(SongPinError::InvalidInput(format!(
            "Playlist name must be 1 to {} characters",
            MAX_PLAYLIST_NAME_CHARS
        )));
    }
    Ok(())
}

fn find_owned_playlist(
    conn: &Connection,
    playlist_id: PlaylistId,
    acting: MemberId,
) -> SongPinResult<Playlist> {
    let playlist = playlists::find_playlist_by_id(conn, playlist_id)?
        .ok_or_else(|| SongPinError::NotFound(format!("Playlist {} not found", playlist_id)))?;
    if playlist.member_id != acting {
        return Err(SongPinError::Unauthorized(format!(
            "Member {} does not own playlist {}",
            acting, playlist_id
        )));
    }
    Ok(playlist)
}

/// Re-numbers the links of the playlist that are not in `removed`, keeping
/// their relative order, and bumps the playlist's `updated` time. The removed
/// links themselves are left for the caller to delete.
pub(crate) fn reindex_without(
    conn: &Connection,
    playlist_id: PlaylistId,
    removed: &[i64],
    now: i64,
) -> SongPinResult<()> {
    let remaining = playlist_pins::find_by_playlist(conn, playlist_id)?
        .into_iter()
        .filter(|link| !removed.contains(&link.id));
    for (index, link) in remaining.enumerate() {
        if link.pin_index != index as i64 {
            playlist_pins::update_pin_index(conn, link.id, index as i64)?;
        }
    }
    playlists::touch_playlist(conn, playlist_id, now)?;
    Ok(())
}

#[derive(Clone)]
pub struct PlaylistService {
    store: SongPinStore,
}

impl PlaylistService {
    pub fn new(store: SongPinStore) -> Self {
        Self { store }
    }

    pub fn create_playlist(
        &self,
        owner: MemberId,
        request: &PlaylistCreateRequest,
    ) -> SongPinResult<PlaylistId> {
        validate_name(&request.playlist_name)?;
        self.store.write(|tx| {
            if members::find_member_by_id(tx, owner)?.is_none() {
                return Err(SongPinError::NotFound(format!("Member {} not found", owner)));
            }
            let playlist = playlists::insert_playlist(
                tx,
                owner,
                request.playlist_name.trim(),
                request.visibility,
                now_timestamp(),
            )?;
            debug!("Member {} created playlist {}", owner, playlist.id);
            Ok(playlist.id)
        })
    }

    /// Appends the pins to the end of the playlist. A pin can be added when
    /// it is public or owned by the acting member. Returns the new pin count.
    pub fn add_pins(
        &self,
        playlist_id: PlaylistId,
        acting: MemberId,
        pin_ids: &[PinId],
    ) -> SongPinResult<i64> {
        if pin_ids.is_empty() {
            return Err(SongPinError::InvalidInput("No pins to add".to_string()));
        }
        self.store.write(|tx| {
            find_owned_playlist(tx, playlist_id, acting)?;

            let current = playlist_pins::count_by_playlist(tx, playlist_id)?;
            let new_count = current + pin_ids.len() as i64;
            if new_count > MAX_PINS_PER_PLAYLIST {
                return Err(SongPinError::InvalidInput(format!(
                    "A playlist holds at most {} pins",
                    MAX_PINS_PER_PLAYLIST
                )));
            }

            for (offset, pin_id) in pin_ids.iter().enumerate() {
                let pin = pins::find_pin_by_id(tx, *pin_id)?
                    .filter(|p| p.visibility == Visibility::Public || p.member_id == acting)
                    .ok_or_else(|| SongPinError::NotFound(format!("Pin {} not found", pin_id)))?;
                let pin_index = current + offset as i64;
                playlist_pins::insert_playlist_pin(tx, playlist_id, pin.id, pin_index)?;
            }
            playlists::touch_playlist(tx, playlist_id, now_timestamp())?;
            Ok(new_count)
        })
    }

    /// A private playlist is reported as not found to anyone but its owner.
    /// Pins the viewer may not see are left out.
    pub fn get_playlist(
        &self,
        playlist_id: PlaylistId,
        viewer: Option<MemberId>,
    ) -> SongPinResult<PlaylistDetails> {
        self.store.read(|conn| {
            let not_found =
                || SongPinError::NotFound(format!("Playlist {} not found", playlist_id));
            let playlist =
                playlists::find_playlist_by_id(conn, playlist_id)?.ok_or_else(not_found)?;
            let is_mine = viewer == Some(playlist.member_id);
            if playlist.visibility == Visibility::Private && !is_mine {
                return Err(not_found());
            }
            let creator = members::find_member_by_id(conn, playlist.member_id)?
                .ok_or_else(|| anyhow::anyhow!("Playlist {} has no owner", playlist_id))?;

            let links = playlist_pins::find_by_playlist(conn, playlist_id)?;
            let details = pins::find_by_playlist(conn, playlist_id)?;
            let pins = links
                .into_iter()
                .zip(details)
                .filter(|(_, pin)| {
                    pin.visibility == Visibility::Public || viewer == Some(pin.creator_id)
                })
                .map(|(link, pin)| PlaylistEntry {
                    playlist_pin_id: link.id,
                    pin_index: link.pin_index,
                    pin: PinSummary::from_details(pin, viewer),
                })
                .collect();

            Ok(PlaylistDetails {
                playlist_id: playlist.id,
                playlist_name: playlist.playlist_name,
                visibility: playlist.visibility,
                creator_id: creator.id,
                creator_nickname: creator.nickname,
                is_mine,
                updated: playlist.updated,
                pins,
            })
        })
    }

    pub fn get_member_playlists(&self, member: MemberId) -> SongPinResult<Vec<PlaylistSummary>> {
        self.store.read(|conn| {
            playlists::find_playlists_by_member(conn, member)?
                .into_iter()
                .map(|playlist| {
                    Ok(PlaylistSummary {
                        pin_count: playlist_pins::count_by_playlist(conn, playlist.id)?,
                        playlist_id: playlist.id,
                        playlist_name: playlist.playlist_name,
                        visibility: playlist.visibility,
                        updated: playlist.updated,
                    })
                })
                .collect()
        })
    }

    pub fn update_playlist(
        &self,
        playlist_id: PlaylistId,
        acting: MemberId,
        request: &PlaylistUpdateRequest,
    ) -> SongPinResult<()> {
        if let Some(name) = &request.playlist_name {
            validate_name(name)?;
        }
        self.store.write(|tx| {
            let playlist = find_owned_playlist(tx, playlist_id, acting)?;
            let now = now_timestamp();

            let name = request
                .playlist_name
                .as_deref()
                .map(str::trim)
                .unwrap_or(&playlist.playlist_name);
            let visibility = request.visibility.unwrap_or(playlist.visibility);
            playlists::update_playlist(tx, playlist_id, name, visibility)?;

            if let Some(order) = &request.playlist_pin_ids {
                let links = playlist_pins::find_by_playlist(tx, playlist_id)?;
                let mut unique = order.clone();
                unique.sort_unstable();
                unique.dedup();
                if unique.len() != order.len() {
                    return Err(SongPinError::InvalidInput(
                        "Playlist order lists a link twice".to_string(),
                    ));
                }
                if let Some(unknown) = order.iter().find(|id| !links.iter().any(|l| l.id == **id)) {
                    return Err(SongPinError::InvalidInput(format!(
                        "Link {} is not part of playlist {}",
                        unknown, playlist_id
                    )));
                }
                let removed: Vec<i64> = links
                    .iter()
                    .map(|l| l.id)
                    .filter(|id| !order.contains(id))
                    .collect();
                playlist_pins::delete_by_ids(tx, &removed)?;
                for (index, link_id) in order.iter().enumerate() {
                    playlist_pins::update_pin_index(tx, *link_id, index as i64)?;
                }
            }
            playlists::touch_playlist(tx, playlist_id, now)?;
            Ok(())
        })
    }

    pub fn delete_playlist(&self, playlist_id: PlaylistId, acting: MemberId) -> SongPinResult<()> {
        self.store.write(|tx| {
            find_owned_playlist(tx, playlist_id, acting)?;
            let unlinked = playlist_pins::delete_by_playlist(tx, playlist_id)?;
            playlists::delete_playlist(tx, playlist_id)?;
            debug!("Deleted playlist {} with {} links", playlist_id, unlinked);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{PlaceRequest, SongRequest};
    use crate::pin::{EngineSettings, PinAddRequest, PinEngine};
    use chrono::NaiveDate;

    struct Fixture {
        engine: PinEngine,
        service: PlaylistService,
        alice: MemberId,
        bob: MemberId,
    }

    fn fixture() -> Fixture {
        let store = SongPinStore::open_in_memory().unwrap();
        let (alice, bob) = store
            .write(|tx| {
                Ok::<_, anyhow::Error>((
                    members::insert_member(tx, "alice", "Alice")?,
                    members::insert_member(tx, "bob", "Bob")?,
                ))
            })
            .unwrap();
        Fixture {
            engine: PinEngine::new(store.clone(), EngineSettings::default()),
            service: PlaylistService::new(store),
            alice,
            bob,
        }
    }

    fn pin(f: &Fixture, owner: MemberId, visibility: Visibility) -> PinId {
        let request = PinAddRequest {
            song: SongRequest {
                provider_track_code: "trk".to_string(),
                title: "Song".to_string(),
                artist: "Artist".to_string(),
                img_path: None,
            },
            place: PlaceRequest {
                provider_address_id: 1,
                place_name: "Park".to_string(),
                address: None,
                latitude: 37.5,
                longitude: 127.0,
            },
            genre_name: "POP".to_string(),
            listened_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            memo: None,
            visibility,
        };
        let song_id = f.engine.create_pin(owner, &request).unwrap();
        f.engine
            .get_pins_for_song(song_id, Some(owner), true)
            .unwrap()
            .iter()
            .map(|p| p.pin_id)
            .max()
            .unwrap()
    }

    fn create(f: &Fixture, owner: MemberId, name: &str, visibility: Visibility) -> PlaylistId {
        f.service
            .create_playlist(
                owner,
                &PlaylistCreateRequest {
                    playlist_name: name.to_string(),
                    visibility,
                },
            )
            .unwrap()
    }

    #[test]
    fn validates_name_length() {
        let f = fixture();
        let too_long = PlaylistCreateRequest {
            playlist_name: "x".repeat(MAX_PLAYLIST_NAME_CHARS + 1),
            visibility: Visibility::Public,
        };
        assert!(matches!(
            f.service.create_playlist(f.alice, &too_long),
            Err(SongPinError::InvalidInput(_))
        ));
        let blank = PlaylistCreateRequest {
            playlist_name: "   ".to_string(),
            visibility: Visibility::Public,
        };
        assert!(matches!(
            f.service.create_playlist(f.alice, &blank),
            Err(SongPinError::InvalidInput(_))
        ));
    }

    #[test]
    fn only_owner_adds_pins() {
        let f = fixture();
        let playlist = create(&f, f.alice, "Mine", Visibility::Public);
        let p = pin(&f, f.alice, Visibility::Public);

        assert!(matches!(
            f.service.add_pins(playlist, f.bob, &[p]),
            Err(SongPinError::Unauthorized(_))
        ));
        assert_eq!(f.service.add_pins(playlist, f.alice, &[p, p]).unwrap(), 2);
        assert!(matches!(
            f.service.add_pins(playlist, f.alice, &[9999]),
            Err(SongPinError::NotFound(_))
        ));
    }

    #[test]
    fn cannot_add_someone_elses_private_pin() {
        let f = fixture();
        let playlist = create(&f, f.alice, "Mine", Visibility::Public);
        let bobs_private = pin(&f, f.bob, Visibility::Private);
        assert!(matches!(
            f.service.add_pins(playlist, f.alice, &[bobs_private]),
            Err(SongPinError::NotFound(_))
        ));
    }

    #[test]
    fn enforces_pin_limit() {
        let f = fixture();
        let playlist = create(&f, f.alice, "Big", Visibility::Public);
        let p = pin(&f, f.alice, Visibility::Public);
        let many = vec![p; MAX_PINS_PER_PLAYLIST as usize];
        assert_eq!(
            f.service.add_pins(playlist, f.alice, &many).unwrap(),
            MAX_PINS_PER_PLAYLIST
        );
        assert!(matches!(
            f.service.add_pins(playlist, f.alice, &[p]),
            Err(SongPinError::InvalidInput(_))
        ));
    }

    #[test]
    fn private_playlist_is_hidden_from_others() {
        let f = fixture();
        let playlist = create(&f, f.alice, "Secret", Visibility::Private);

        assert!(f.service.get_playlist(playlist, Some(f.alice)).is_ok());
        assert!(matches!(
            f.service.get_playlist(playlist, Some(f.bob)),
            Err(SongPinError::NotFound(_))
        ));
        assert!(matches!(
            f.service.get_playlist(playlist, None),
            Err(SongPinError::NotFound(_))
        ));
    }

    #[test]
    fn reorders_and_removes_links() {
        let f = fixture();
        let playlist = create(&f, f.alice, "Mix", Visibility::Public);
        let a = pin(&f, f.alice, Visibility::Public);
        let b = pin(&f, f.alice, Visibility::Public);
        let c = pin(&f, f.alice, Visibility::Public);
        f.service.add_pins(playlist, f.alice, &[a, b, c]).unwrap();

        let links: Vec<i64> = f
            .service
            .get_playlist(playlist, Some(f.alice))
            .unwrap()
            .pins
            .iter()
            .map(|e| e.playlist_pin_id)
            .collect();

        f.service
            .update_playlist(
                playlist,
                f.alice,
                &PlaylistUpdateRequest {
                    playlist_name: Some("Renamed".to_string()),
                    visibility: None,
                    playlist_pin_ids: Some(vec![links[2], links[0]]),
                },
            )
            .unwrap();

        let details = f.service.get_playlist(playlist, Some(f.alice)).unwrap();
        assert_eq!(details.playlist_name, "Renamed");
        let order: Vec<(PinId, i64)> = details
            .pins
            .iter()
            .map(|e| (e.pin.pin_id, e.pin_index))
            .collect();
        assert_eq!(order, vec![(c, 0), (a, 1)]);
    }

    #[test]
    fn deletes_playlist_and_its_links() {
        let f = fixture();
        let playlist = create(&f, f.alice, "Gone", Visibility::Public);
        let p = pin(&f, f.alice, Visibility::Public);
        f.service.add_pins(playlist, f.alice, &[p]).unwrap();

        assert!(matches!(
            f.service.delete_playlist(playlist, f.bob),
            Err(SongPinError::Unauthorized(_))
        ));
        f.service.delete_playlist(playlist, f.alice).unwrap();
        assert!(f.service.get_member_playlists(f.alice).unwrap().is_empty());
        // The pin itself is untouched and can now be deleted freely.
        f.engine.delete_pin(p, f.alice).unwrap();
    }
}
