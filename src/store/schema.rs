//! SQLite schema definitions for the songpin database.
//!
//! Every relation is a plain foreign key. The only one that is deliberately
//! *not* cascading is `playlist_pin.pin_id`: a pin that is still linked into a
//! playlist cannot be deleted, the unlinking has to be done explicitly.

use crate::sqlite_column;
use crate::sqlite_persistence::{
    Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema, DEFAULT_TIMESTAMP,
};

// =============================================================================
// Version 0 - Members, catalog, pins, playlists and issued tokens
// =============================================================================

pub const MEMBER_TABLE_V_0: Table = Table {
    name: "member",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("handle", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("nickname", &SqlType::Text, non_null = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_member_handle", "handle")],
};

pub const MEMBER_PASSWORD_CREDENTIALS_TABLE_V_0: Table = Table {
    name: "member_password_credentials",
    columns: &[
        sqlite_column!(
            "member_id",
            &SqlType::Integer,
            is_primary_key = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "member",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!("salt", &SqlType::Text, non_null = true),
        sqlite_column!("hash", &SqlType::Text, non_null = true),
        sqlite_column!("hasher", &SqlType::Text, non_null = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!("last_used", &SqlType::Integer),
    ],
    indices: &[],
};

pub const GENRE_TABLE_V_0: Table = Table {
    name: "genre",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true, is_unique = true),
    ],
    indices: &[],
};

pub const SONG_TABLE_V_0: Table = Table {
    name: "song",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "provider_track_code",
            &SqlType::Text,
            non_null = true,
            is_unique = true
        ),
        sqlite_column!("title", &SqlType::Text, non_null = true),
        sqlite_column!("artist", &SqlType::Text, non_null = true),
        sqlite_column!("img_path", &SqlType::Text),
        sqlite_column!("avg_genre_name", &SqlType::Text),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_song_provider_track_code", "provider_track_code")],
};

pub const PLACE_TABLE_V_0: Table = Table {
    name: "place",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "provider_address_id",
            &SqlType::Integer,
            non_null = true,
            is_unique = true
        ),
        sqlite_column!("place_name", &SqlType::Text, non_null = true),
        sqlite_column!("address", &SqlType::Text),
        sqlite_column!("latitude", &SqlType::Real, non_null = true),
        sqlite_column!("longitude", &SqlType::Real, non_null = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_place_provider_address_id", "provider_address_id")],
};

pub const PIN_TABLE_V_0: Table = Table {
    name: "pin",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "member_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "member",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!(
            "song_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "song",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Restrict,
            })
        ),
        sqlite_column!(
            "place_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "place",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Restrict,
            })
        ),
        sqlite_column!(
            "genre_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "genre",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Restrict,
            })
        ),
        sqlite_column!("listened_date", &SqlType::Text, non_null = true),
        sqlite_column!("memo", &SqlType::Text),
        sqlite_column!("visibility", &SqlType::Text, non_null = true),
        sqlite_column!("created_time", &SqlType::Integer, non_null = true),
    ],
    indices: &[
        ("idx_pin_song", "song_id"),
        ("idx_pin_place", "place_id"),
        ("idx_pin_member", "member_id"),
    ],
};

pub const PLAYLIST_TABLE_V_0: Table = Table {
    name: "playlist",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "member_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "member",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!("playlist_name", &SqlType::Text, non_null = true),
        sqlite_column!("visibility", &SqlType::Text, non_null = true),
        sqlite_column!("created", &SqlType::Integer, non_null = true),
        sqlite_column!("updated", &SqlType::Integer, non_null = true),
    ],
    indices: &[("idx_playlist_member", "member_id")],
};

pub const PLAYLIST_PIN_TABLE_V_0: Table = Table {
    name: "playlist_pin",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "playlist_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "playlist",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!(
            "pin_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "pin",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::NoAction,
            })
        ),
        sqlite_column!("pin_index", &SqlType::Integer, non_null = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[
        ("idx_playlist_pin_playlist", "playlist_id"),
        ("idx_playlist_pin_pin", "pin_id"),
    ],
};

/// Issued access tokens, so that they can be revoked before they expire.
pub const AUTH_TOKEN_CACHE_TABLE_V_0: Table = Table {
    name: "auth_token_cache",
    columns: &[
        sqlite_column!("token_id", &SqlType::Text, is_primary_key = true),
        sqlite_column!(
            "member_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "member",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!("issued", &SqlType::Integer, non_null = true),
        sqlite_column!("expires", &SqlType::Integer, non_null = true),
        sqlite_column!(
            "revoked",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
    ],
    indices: &[("idx_auth_token_cache_member", "member_id")],
};

pub const VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[
        MEMBER_TABLE_V_0,
        MEMBER_PASSWORD_CREDENTIALS_TABLE_V_0,
        GENRE_TABLE_V_0,
        SONG_TABLE_V_0,
        PLACE_TABLE_V_0,
        PIN_TABLE_V_0,
        PLAYLIST_TABLE_V_0,
        PLAYLIST_PIN_TABLE_V_0,
        AUTH_TOKEN_CACHE_TABLE_V_0,
    ],
    migration: None,
}];
