//! The member directory: accounts and their password credentials.

use crate::auth::PasswordHasherKind;
use crate::error::{SongPinError, SongPinResult};
use crate::playlist;
use crate::store::{
    members, now_timestamp, pins, playlist_pins, Member, MemberId, PlaylistId, SongPinStore,
};
use std::collections::BTreeMap;
use tracing::{debug, info};

pub const MIN_PASSWORD_CHARS: usize = 8;
pub const MAX_HANDLE_CHARS: usize = 30;
pub const MAX_NICKNAME_CHARS: usize = 20;

fn validate_handle(handle: &str) -> SongPinResult<()> {
    let valid_chars = handle
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
    if handle.is_empty() || handle.chars().count() > MAX_HANDLE_CHARS || !valid_chars {
        return Err(SongPinError::InvalidInput(format!(
            "Handle must be 1 to {} letters, digits, '_' or '.'",
            MAX_HANDLE_CHARS
        )));
    }
    Ok(())
}

fn validate_nickname(nickname: &str) -> SongPinResult<()> {
    let chars = nickname.trim().chars().count();
    if chars == 0 || chars > MAX_NICKNAME_CHARS {
        return Err(SongPinError::InvalidInput(format!(
            "Nickname must be 1 to {} characters",
            MAX_NICKNAME_CHARS
        )));
    }
    Ok(())
}

fn validate_password(password: &str) -> SongPinResult<()> {
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(SongPinError::InvalidInput(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_CHARS
        )));
    }
    Ok(())
}

#[derive(Clone)]
pub struct MemberManager {
    store: SongPinStore,
    hasher: PasswordHasherKind,
}

impl MemberManager {
    pub fn new(store: SongPinStore) -> Self {
        Self {
            store,
            hasher: PasswordHasherKind::Argon2,
        }
    }

    /// Creates a member together with its password.
    pub fn signup(&self, handle: &str, nickname: &str, password: &str) -> SongPinResult<MemberId> {
        validate_handle(handle)?;
        validate_nickname(nickname)?;
        validate_password(password)?;

        let salt = self.hasher.generate_b64_salt();
        let hash = self.hasher.hash(password, &salt)?;
        let hasher = self.hasher.to_string();

        self.store.write(|tx| {
            if members::find_member_by_handle(tx, handle)?.is_some() {
                return Err(SongPinError::InvalidInput(format!(
                    "Handle {} is already taken",
                    handle
                )));
            }
            let member_id = members::insert_member(tx, handle, nickname.trim())?;
            members::upsert_password_credentials(tx, member_id, &salt, &hash, &hasher)?;
            info!("Created member {} ({})", handle, member_id);
            Ok(member_id)
        })
    }

    pub fn set_password(&self, member_id: MemberId, password: &str) -> SongPinResult<()> {
        validate_password(password)?;
        let salt = self.hasher.generate_b64_salt();
        let hash = self.hasher.hash(password, &salt)?;
        let hasher = self.hasher.to_string();
        self.store.write(|tx| {
            if members::find_member_by_id(tx, member_id)?.is_none() {
                return Err(SongPinError::NotFound(format!("Member {} not found", member_id)));
            }
            members::upsert_password_credentials(tx, member_id, &salt, &hash, &hasher)?;
            Ok(())
        })
    }

    /// Returns the member when the handle exists and the password matches.
    pub fn verify_login(&self, handle: &str, password: &str) -> SongPinResult<Option<Member>> {
        let found = self.store.read(|conn| {
            let Some(member) = members::find_member_by_handle(conn, handle)? else {
                return Ok::<_, SongPinError>(None);
            };
            let credentials = members::get_password_credentials(conn, member.id)?;
            Ok(credentials.map(|c| (member, c)))
        })?;
        let Some((member, credentials)) = found else {
            debug!("No credentials for handle {}", handle);
            return Ok(None);
        };

        let hasher: PasswordHasherKind = credentials.hasher.parse()?;
        if !hasher.verify(password, &credentials.hash)? {
            debug!("Wrong password for handle {}", handle);
            return Ok(None);
        }
        self.store
            .write(|tx| members::touch_password_credentials(tx, member.id, now_timestamp()))?;
        Ok(Some(member))
    }

    pub fn get_member(&self, member_id: MemberId) -> SongPinResult<Member> {
        self.store.read(|conn| {
            members::find_member_by_id(conn, member_id)?
                .ok_or_else(|| SongPinError::NotFound(format!("Member {} not found", member_id)))
        })
    }

    pub fn find_member_by_handle(&self, handle: &str) -> SongPinResult<Option<Member>> {
        Ok(self
            .store
            .read(|conn| members::find_member_by_handle(conn, handle))?)
    }

    pub fn get_all_handles(&self) -> SongPinResult<Vec<String>> {
        Ok(self.store.read(|conn| members::get_all_handles(conn))?)
    }

    /// Deletes the member. Their pins and playlists go with them, and their
    /// pins are taken out of other members' playlists.
    pub fn delete_member(&self, member_id: MemberId) -> SongPinResult<()> {
        self.store.write(|tx| {
            // Links to the member's pins may sit in other members' playlists
            // and have to be removed before the pins cascade away.
            let mut by_playlist: BTreeMap<PlaylistId, Vec<i64>> = BTreeMap::new();
            for pin_id in pins::find_pin_ids_by_member(tx, member_id)? {
                for link in playlist_pins::find_by_pin(tx, pin_id)? {
                    by_playlist
                        .entry(link.playlist_id)
                        .or_default()
                        .push(link.id);
                }
            }
            let now = now_timestamp();
            for (playlist_id, removed) in &by_playlist {
                playlist::reindex_without(tx, *playlist_id, removed, now)?;
                playlist_pins::delete_by_ids(tx, removed)?;
            }
            if !members::delete_member(tx, member_id)? {
                return Err(SongPinError::NotFound(format!("Member {} not found", member_id)));
            }
            info!("Deleted member {}", member_id);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> MemberManager {
        MemberManager::new(SongPinStore::open_in_memory().unwrap())
    }

    fn logs_in(manager: &MemberManager, handle: &str, password: &str) -> bool {
        manager.verify_login(handle, password).unwrap().is_some()
    }

    #[test]
    fn signup_then_login() {
        let manager = manager();
        let id = manager.signup("alice", "Alice", "correct horse").unwrap();

        let member = manager
            .verify_login("alice", "correct horse")
            .unwrap()
            .unwrap();
        assert_eq!(member.id, id);
        assert_eq!(member.nickname, "Alice");

        assert!(!logs_in(&manager, "alice", "wrong password"));
        assert!(!logs_in(&manager, "nobody", "correct horse"));
    }

    #[test]
    fn duplicate_handle_is_invalid_input() {
        let manager = manager();
        manager.signup("alice", "Alice", "password1").unwrap();
        assert!(matches!(
            manager.signup("alice", "Alice 2", "password2"),
            Err(SongPinError::InvalidInput(_))
        ));
    }

    #[test]
    fn validates_signup_fields() {
        let manager = manager();
        for (handle, nickname, password) in [
            ("", "Nick", "password1"),
            ("has space", "Nick", "password1"),
            ("bob", "", "password1"),
            ("bob", "Nick", "short"),
        ] {
            assert!(
                matches!(
                    manager.signup(handle, nickname, password),
                    Err(SongPinError::InvalidInput(_))
                ),
                "{:?} should be rejected",
                (handle, nickname, password)
            );
        }
    }

    #[test]
    fn set_password_replaces_old_one() {
        let manager = manager();
        let id = manager.signup("alice", "Alice", "first password").unwrap();
        manager.set_password(id, "second password").unwrap();
        assert!(!logs_in(&manager, "alice", "first password"));
        assert!(logs_in(&manager, "alice", "second password"));
        assert!(matches!(
            manager.set_password(999, "whatever123"),
            Err(SongPinError::NotFound(_))
        ));
    }

    #[test]
    fn delete_member_removes_everything() {
        let manager = manager();
        let id = manager.signup("alice", "Alice", "password1").unwrap();
        manager.delete_member(id).unwrap();
        assert!(matches!(manager.get_member(id), Err(SongPinError::NotFound(_))));
        assert!(manager.get_all_handles().unwrap().is_empty());
        assert!(matches!(manager.delete_member(id), Err(SongPinError::NotFound(_))));
    }

    #[test]
    fn delete_member_takes_their_pins_out_of_other_playlists() {
        use crate::catalog::{PlaceRequest, SongRequest};
        use crate::pin::{EngineSettings, PinAddRequest, PinEngine};
        use crate::playlist::{PlaylistCreateRequest, PlaylistService};
        use crate::store::Visibility;
        use chrono::NaiveDate;

        let store = SongPinStore::open_in_memory().unwrap();
        let manager = MemberManager::new(store.clone());
        let engine = PinEngine::new(store.clone(), EngineSettings::default());
        let playlists = PlaylistService::new(store);
        let alice = manager.signup("alice", "Alice", "password1").unwrap();
        let bob = manager.signup("bob", "Bob", "password2").unwrap();

        let pin_of = |owner: MemberId, track: &str| {
            let request = PinAddRequest {
                song: SongRequest {
                    provider_track_code: track.to_string(),
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
                genre_name: "ROCK".to_string(),
                listened_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
                memo: None,
                visibility: Visibility::Public,
            };
            let song_id = engine.create_pin(owner, &request).unwrap();
            let pins = engine.get_pins_for_song(song_id, Some(owner), true);
            pins.unwrap()[0].pin_id
        };
        let alice_pin = pin_of(alice, "a");
        let bob_pin = pin_of(bob, "b");

        let playlist = playlists
            .create_playlist(
                bob,
                &PlaylistCreateRequest {
                    playlist_name: "Mixed".to_string(),
                    visibility: Visibility::Public,
                },
            )
            .unwrap();
        playlists
            .add_pins(playlist, bob, &[alice_pin, bob_pin])
            .unwrap();

        manager.delete_member(alice).unwrap();

        let details = playlists.get_playlist(playlist, Some(bob)).unwrap();
        assert_eq!(details.pins.len(), 1);
        assert_eq!(details.pins[0].pin.pin_id, bob_pin);
        assert_eq!(details.pins[0].pin_index, 0);
    }
}
