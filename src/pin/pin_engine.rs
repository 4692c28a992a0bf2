use super::pin_models::*;
use crate::catalog;
use crate::error::{SongPinError, SongPinResult};
use crate::playlist;
use crate::store::pins::{self, NewPin};
use crate::store::{
    members, now_timestamp, playlist_pins, songs, MemberId, Pin, PinId, SongId, SongPinStore,
    Visibility,
};
use rusqlite::Connection;
use std::collections::BTreeMap;
use tracing::{debug, info};

pub const MAX_MEMO_CHARS: usize = 200;

#[derive(Debug, Clone, Copy, Default)]
pub struct EngineSettings {
    /// When set, updating or deleting a pin recomputes its song's average
    /// genre, the same way creating one always does.
    pub recompute_genre_on_all_mutations: bool,
}

/// Creates, changes, removes and lists pins.
///
/// Every operation runs in a single store transaction, so a mutation and the
/// recomputation of the song's average genre are committed together or not
/// at all. The acting member is always passed explicitly.
#[derive(Clone)]
pub struct PinEngine {
    store: SongPinStore,
    settings: EngineSettings,
}

fn validate_memo(memo: Option<&str>) -> SongPinResult<()> {
    if let Some(memo) = memo {
        if memo.chars().count() > MAX_MEMO_CHARS {
            return Err(SongPinError::InvalidInput(format!(
                "Memo must be at most {} characters",
                MAX_MEMO_CHARS
            )));
        }
    }
    Ok(())
}

fn find_pin(conn: &Connection, pin_id: PinId) -> SongPinResult<Pin> {
    pins::find_pin_by_id(conn, pin_id)?
        .ok_or_else(|| SongPinError::NotFound(format!("Pin {} not found", pin_id)))
}

/// Loads the pin and checks that `acting` owns it.
fn find_pin_owned_by(conn: &Connection, pin_id: PinId, acting: MemberId) -> SongPinResult<Pin> {
    let pin = find_pin(conn, pin_id)?;
    if pin.member_id != acting {
        return Err(SongPinError::Unauthorized(format!(
            "Member {} is not the creator of pin {}",
            acting, pin_id
        )));
    }
    Ok(pin)
}

/// Sets the song's average genre from all of its current pins. With no pins
/// left the previous label is kept. The song row is written back either way.
fn recompute_avg_genre(conn: &Connection, song_id: SongId) -> SongPinResult<()> {
    let mut song = catalog::get_song_by_id(conn, song_id)?;
    let genre_names = pins::find_genre_names_by_song(conn, song_id)?;
    if let Some(avg) = catalog::calculate_avg_genre_name(&genre_names) {
        song.avg_genre_name = Some(avg);
    }
    songs::save_song(conn, &song)?;
    Ok(())
}

impl PinEngine {
    pub fn new(store: SongPinStore, settings: EngineSettings) -> Self {
        Self { store, settings }
    }

    /// Returns the id of the pinned song.
    pub fn create_pin(&self, owner: MemberId, request: &PinAddRequest) -> SongPinResult<SongId> {
        validate_memo(request.memo.as_deref())?;
        self.store.write(|tx| {
            if members::find_member_by_id(tx, owner)?.is_none() {
                return Err(SongPinError::NotFound(format!("Member {} not found", owner)));
            }
            // Resolved first so that an unknown genre fails before any write.
            let genre = catalog::get_genre_by_name(tx, &request.genre_name)?;
            let song = catalog::get_or_create_song(tx, &request.song)?;
            let place = catalog::get_or_create_place(tx, &request.place)?;

            let pin = pins::insert_pin(
                tx,
                &NewPin {
                    member_id: owner,
                    song_id: song.id,
                    place_id: place.id,
                    genre_id: genre.id,
                    listened_date: request.listened_date,
                    memo: request.memo.as_deref(),
                    visibility: request.visibility,
                },
                now_timestamp(),
            )?;
            recompute_avg_genre(tx, song.id)?;
            debug!(
                "Member {} created pin {} on song {}",
                owner, pin.id, song.id
            );
            Ok(song.id)
        })
    }

    /// Returns the id of the pinned song.
    pub fn update_pin(
        &self,
        pin_id: PinId,
        acting: MemberId,
        request: &PinUpdateRequest,
    ) -> SongPinResult<SongId> {
        validate_memo(request.memo.as_deref())?;
        self.store.write(|tx| {
            let mut pin = find_pin_owned_by(tx, pin_id, acting)?;
            let genre = catalog::get_genre_by_name(tx, &request.genre_name)?;

            pin.listened_date = request.listened_date;
            pin.memo = request.memo.clone();
            pin.visibility = request.visibility;
            pin.genre_id = genre.id;
            pins::update_pin(tx, &pin)?;

            if self.settings.recompute_genre_on_all_mutations {
                recompute_avg_genre(tx, pin.song_id)?;
            }
            debug!("Member {} updated pin {}", acting, pin_id);
            Ok(pin.song_id)
        })
    }

    /// Removes the pin from every playlist that links it, then deletes it.
    pub fn delete_pin(&self, pin_id: PinId, acting: MemberId) -> SongPinResult<()> {
        self.store.write(|tx| {
            let pin = find_pin_owned_by(tx, pin_id, acting)?;

            let links = playlist_pins::find_by_pin(tx, pin_id)?;
            let mut by_playlist: BTreeMap<_, Vec<i64>> = BTreeMap::new();
            for link in &links {
                by_playlist
                    .entry(link.playlist_id)
                    .or_default()
                    .push(link.id);
            }
            let now = now_timestamp();
            for (playlist_id, removed) in &by_playlist {
                playlist::reindex_without(tx, *playlist_id, removed, now)?;
            }
            let link_ids: Vec<i64> = links.iter().map(|link| link.id).collect();
            playlist_pins::delete_by_ids(tx, &link_ids)?;
            pins::delete_pin(tx, pin_id)?;

            if self.settings.recompute_genre_on_all_mutations {
                recompute_avg_genre(tx, pin.song_id)?;
            }
            info!(
                "Member {} deleted pin {} ({} playlist links removed)",
                acting,
                pin_id,
                link_ids.len()
            );
            Ok(())
        })
    }

    pub fn get_pin_by_id(&self, pin_id: PinId) -> SongPinResult<Pin> {
        self.store.read(|conn| find_pin(conn, pin_id))
    }

    /// A private pin is reported as not found to anyone but its creator.
    pub fn get_pin_for_viewer(
        &self,
        pin_id: PinId,
        viewer: Option<MemberId>,
    ) -> SongPinResult<PinSummary> {
        self.store.read(|conn| {
            let details = pins::find_pin_details_by_id(conn, pin_id)?
                .filter(|p| p.visibility == Visibility::Public || viewer == Some(p.creator_id))
                .ok_or_else(|| SongPinError::NotFound(format!("Pin {} not found", pin_id)))?;
            Ok(PinSummary::from_details(details, viewer))
        })
    }

    /// Pins of the song visible to `viewer`.
    ///
    /// With `only_mine` and a viewer, only the viewer's own pins, whatever
    /// their visibility. Otherwise the viewer's private pins followed by
    /// everybody's public pins; an anonymous viewer gets the public pins
    /// only, even when asking for `only_mine`.
    pub fn get_pins_for_song(
        &self,
        song_id: SongId,
        viewer: Option<MemberId>,
        only_mine: bool,
    ) -> SongPinResult<Vec<PinSummary>> {
        self.store.read(|conn| {
            catalog::get_song_by_id(conn, song_id)?;

            let details = match viewer {
                Some(member_id) if only_mine => {
                    pins::find_by_song_and_member(conn, song_id, member_id)?
                }
                _ => {
                    let mut details = match viewer {
                        Some(member_id) => pins::find_by_song_member_and_visibility(
                            conn,
                            song_id,
                            member_id,
                            Visibility::Private,
                        )?,
                        None => Vec::new(),
                    };
                    details.extend(pins::find_by_song_and_visibility(
                        conn,
                        song_id,
                        Visibility::Public,
                    )?);
                    details
                }
            };

            Ok(details
                .into_iter()
                .map(|d| PinSummary::from_details(d, viewer))
                .collect())
        })
    }

    pub fn get_song_details(&self, song_id: SongId) -> SongPinResult<SongDetails> {
        self.store.read(|conn| {
            let song = catalog::get_song_by_id(conn, song_id)?;
            let pin_count = songs::count_pins_of_song(conn, song_id)?;
            Ok(SongDetails {
                song_id: song.id,
                provider_track_code: song.provider_track_code,
                title: song.title,
                artist: song.artist,
                img_path: song.img_path,
                avg_genre_name: song.avg_genre_name,
                pin_count,
            })
        })
    }
}
