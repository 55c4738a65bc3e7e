//! Test fixture creation for the listening-history database
//!
//! Builds a small but deterministic history: three artists across three
//! months of 2024, with genre mappings that exercise broad-genre
//! folding and the Holiday exclusion.

use anyhow::Result;
use listening_stats_server::library_store::{
    ARTISTS_TABLE, GENRE_MAPPINGS_TABLE, PLAYS_TABLE, TRACKS_TABLE,
};
use rusqlite::{params, Connection};
use std::path::PathBuf;
use tempfile::TempDir;

/// Creates a temporary stats database and returns it with its tempdir.
///
/// The fixture history:
/// - 2024-01-05 10:00  The Ramblers  "Dusty Road"   60 min
/// - 2024-01-20 22:00  Synth Queen   "Neon Nights"  30 min
/// - 2024-02-10 10:00  The Ramblers  "Dusty Road"   30 min
/// - 2024-03-03 08:00  Santa Croon   "Sleigh Run"   60 min
/// - 2024-03-15 10:00  The Ramblers  "Back Porch"   60 min
pub fn create_test_db() -> Result<(TempDir, PathBuf)> {
    let dir = TempDir::new()?;
    let db_path = dir.path().join("stats.db");

    let conn = Connection::open(&db_path)?;
    PLAYS_TABLE.create(&conn)?;
    ARTISTS_TABLE.create(&conn)?;
    TRACKS_TABLE.create(&conn)?;
    GENRE_MAPPINGS_TABLE.create(&conn)?;

    let plays: [(&str, u64, &str, &str, Option<&str>); 5] = [
        ("2024-01-05T10:00:00Z", 3_600_000, "Dusty Road", "The Ramblers", Some("spotify:track:r1")),
        ("2024-01-20T22:00:00Z", 1_800_000, "Neon Nights", "Synth Queen", Some("spotify:track:s1")),
        ("2024-02-10T10:00:00Z", 1_800_000, "Dusty Road", "The Ramblers", Some("spotify:track:r1")),
        ("2024-03-03T08:00:00Z", 3_600_000, "Sleigh Run", "Santa Croon", Some("spotify:track:x1")),
        ("2024-03-15T10:00:00Z", 3_600_000, "Back Porch", "The Ramblers", Some("spotify:track:r2")),
    ];
    for (played_at, ms, track, artist, uri) in plays {
        conn.execute(
            "INSERT INTO plays (played_at, ms_played, track_name, artist_name, spotify_track_uri)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![played_at, ms, track, artist, uri],
        )?;
    }

    let artists: [(&str, Option<&str>, Option<&str>, Option<&str>); 3] = [
        ("The Ramblers", Some("indie rock, folk rock"), Some("ramblers-id"), Some("https://img/ramblers")),
        ("Synth Queen", Some("synthpop"), Some("synthqueen-id"), None),
        ("Santa Croon", Some("christmas"), None, None),
    ];
    for (name, genres, spotify_id, image_url) in artists {
        conn.execute(
            "INSERT INTO artists (artist_name, genres, spotify_artist_id, image_url)
             VALUES (?1, ?2, ?3, ?4)",
            params![name, genres, spotify_id, image_url],
        )?;
    }

    let tracks: [(&str, i32, i32, Option<&str>); 4] = [
        ("spotify:track:r1", 2019, 2010, Some("https://img/r1")),
        ("spotify:track:s1", 2023, 2020, None),
        ("spotify:track:x1", 1965, 1960, None),
        ("spotify:track:r2", 2021, 2020, None),
    ];
    for (uri, year, decade, image) in tracks {
        conn.execute(
            "INSERT INTO tracks (spotify_track_uri, release_year, release_decade, album_image_url)
             VALUES (?1, ?2, ?3, ?4)",
            params![uri, year, decade, image],
        )?;
    }

    let mappings = [
        ("indie rock", "Rock"),
        ("folk rock", "Rock"),
        ("synthpop", "Pop"),
        ("christmas", "Holiday"),
    ];
    for (subgenre, broad) in mappings {
        conn.execute(
            "INSERT INTO genre_mappings (subgenre, broad_genre) VALUES (?1, ?2)",
            params![subgenre, broad],
        )?;
    }

    Ok((dir, db_path))
}
