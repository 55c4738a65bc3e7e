use crate::sqlite_column;
use crate::sqlite_persistence::{Column, SqlType, Table};

/// One row per listening event, appended by the ingestion pipeline.
/// Calendar fields (year, month, day of week, ...) are derived on read
/// from `played_at` rather than stored.
pub const PLAYS_TABLE: Table = Table {
    name: "plays",
    columns: &[
        sqlite_column!("played_at", &SqlType::Text, non_null = true),
        sqlite_column!("ms_played", &SqlType::Integer, non_null = true),
        sqlite_column!("track_name", &SqlType::Text, non_null = true),
        sqlite_column!("artist_name", &SqlType::Text, non_null = true),
        sqlite_column!("spotify_track_uri", &SqlType::Text),
    ],
    indices: &[
        ("idx_plays_played_at", "played_at"),
        ("idx_plays_artist_name", "artist_name"),
    ],
};

/// Artist enrichment dimension. `genres` is a comma-separated subgenre
/// list as delivered by the enrichment script; it is fanned out into a
/// proper list at load time.
pub const ARTISTS_TABLE: Table = Table {
    name: "artists",
    columns: &[
        sqlite_column!("artist_name", &SqlType::Text, is_primary_key = true),
        sqlite_column!("genres", &SqlType::Text),
        sqlite_column!("spotify_artist_id", &SqlType::Text),
        sqlite_column!("image_url", &SqlType::Text),
    ],
    indices: &[],
};

/// Track enrichment dimension, keyed by Spotify URI.
pub const TRACKS_TABLE: Table = Table {
    name: "tracks",
    columns: &[
        sqlite_column!("spotify_track_uri", &SqlType::Text, is_primary_key = true),
        sqlite_column!("release_year", &SqlType::Integer),
        sqlite_column!("release_decade", &SqlType::Integer),
        sqlite_column!("album_image_url", &SqlType::Text),
    ],
    indices: &[],
};

/// Static subgenre -> broad genre lookup.
pub const GENRE_MAPPINGS_TABLE: Table = Table {
    name: "genre_mappings",
    columns: &[
        sqlite_column!("subgenre", &SqlType::Text, is_primary_key = true),
        sqlite_column!("broad_genre", &SqlType::Text, non_null = true),
    ],
    indices: &[],
};
