use super::models::{ArtistInfo, Dataset, Play, TrackInfo};
use super::schema::{ARTISTS_TABLE, GENRE_MAPPINGS_TABLE, PLAYS_TABLE, TRACKS_TABLE};
use super::LibraryStore;
use anyhow::{bail, Context, Result};
use chrono::NaiveDateTime;
use rusqlite::Connection;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::info;

/// The ingestion pipeline writes timestamps either as Spotify's export
/// format (`2024-01-15T10:30:00Z`) or as plain SQL datetime text.
const PLAYED_AT_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.fZ",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
];

fn parse_played_at(raw: &str) -> Result<NaiveDateTime> {
    for format in PLAYED_AT_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(parsed);
        }
    }
    bail!("Unparseable played_at timestamp: {:?}", raw)
}

fn split_genre_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .map(str::to_string)
        .collect()
}

/// Read-only store over the SQLite snapshot produced by the ingestion
/// and enrichment scripts. The expected schema is validated on open.
#[derive(Clone)]
pub struct SqliteLibraryStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteLibraryStore {
    pub fn new<T: AsRef<Path>>(db_path: T) -> Result<Self> {
        let conn = Connection::open_with_flags(
            &db_path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY
                | rusqlite::OpenFlags::SQLITE_OPEN_URI
                | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("Failed to open library db at {:?}", db_path.as_ref()))?;

        for table in [
            &PLAYS_TABLE,
            &ARTISTS_TABLE,
            &TRACKS_TABLE,
            &GENRE_MAPPINGS_TABLE,
        ] {
            table
                .validate(&conn)
                .with_context(|| format!("Schema validation failed for table {}", table.name))?;
        }

        Ok(SqliteLibraryStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn load_plays(&self, conn: &Connection) -> Result<Vec<Play>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT played_at, ms_played, track_name, artist_name, spotify_track_uri FROM {} ORDER BY played_at",
            PLAYS_TABLE.name
        ))?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<usize, String>(0)?,
                row.get::<usize, i64>(1)?,
                row.get::<usize, String>(2)?,
                row.get::<usize, String>(3)?,
                row.get::<usize, Option<String>>(4)?,
            ))
        })?;

        let mut plays = Vec::new();
        for row in rows {
            let (played_at, ms_played, track_name, artist_name, spotify_track_uri) = row?;
            if ms_played < 0 {
                bail!(
                    "Play of {:?} at {} has negative ms_played ({})",
                    track_name,
                    played_at,
                    ms_played
                );
            }
            plays.push(Play {
                played_at: parse_played_at(&played_at)?,
                ms_played: ms_played as u64,
                track_name,
                artist_name,
                spotify_track_uri,
            });
        }
        Ok(plays)
    }

    fn load_artists(&self, conn: &Connection) -> Result<HashMap<String, ArtistInfo>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT artist_name, genres, spotify_artist_id, image_url FROM {}",
            ARTISTS_TABLE.name
        ))?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<usize, String>(0)?,
                row.get::<usize, Option<String>>(1)?,
                row.get::<usize, Option<String>>(2)?,
                row.get::<usize, Option<String>>(3)?,
            ))
        })?;

        let mut artists = HashMap::new();
        for row in rows {
            let (artist_name, genres, spotify_artist_id, image_url) = row?;
            artists.insert(
                artist_name,
                ArtistInfo {
                    subgenres: genres.as_deref().map(split_genre_list).unwrap_or_default(),
                    spotify_artist_id,
                    image_url,
                },
            );
        }
        Ok(artists)
    }

    fn load_tracks(&self, conn: &Connection) -> Result<HashMap<String, TrackInfo>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT spotify_track_uri, release_year, release_decade, album_image_url FROM {}",
            TRACKS_TABLE.name
        ))?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<usize, String>(0)?,
                row.get::<usize, Option<i32>>(1)?,
                row.get::<usize, Option<i32>>(2)?,
                row.get::<usize, Option<String>>(3)?,
            ))
        })?;

        let mut tracks = HashMap::new();
        for row in rows {
            let (spotify_track_uri, release_year, release_decade, album_image_url) = row?;
            tracks.insert(
                spotify_track_uri,
                TrackInfo {
                    release_year,
                    release_decade,
                    album_image_url,
                },
            );
        }
        Ok(tracks)
    }

    fn load_genre_mappings(&self, conn: &Connection) -> Result<HashMap<String, String>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT subgenre, broad_genre FROM {}",
            GENRE_MAPPINGS_TABLE.name
        ))?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<usize, String>(0)?, row.get::<usize, String>(1)?))
        })?;

        let mut mappings = HashMap::new();
        for row in rows {
            let (subgenre, broad_genre) = row?;
            mappings.insert(subgenre.trim().to_string(), broad_genre);
        }
        Ok(mappings)
    }
}

impl LibraryStore for SqliteLibraryStore {
    fn load_dataset(&self) -> Result<Dataset> {
        let conn = self.conn.lock().unwrap();

        let plays = self.load_plays(&conn).context("Failed to load plays")?;
        let artists = self.load_artists(&conn).context("Failed to load artists")?;
        let tracks = self.load_tracks(&conn).context("Failed to load tracks")?;
        let genre_mappings = self
            .load_genre_mappings(&conn)
            .context("Failed to load genre mappings")?;

        info!(
            "Loaded dataset: {} plays, {} artists, {} tracks, {} genre mappings",
            plays.len(),
            artists.len(),
            tracks.len(),
            genre_mappings.len()
        );

        Ok(Dataset {
            plays,
            artists,
            tracks,
            genre_mappings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::params;

    fn create_snapshot(conn: &Connection) {
        for table in [
            &PLAYS_TABLE,
            &ARTISTS_TABLE,
            &TRACKS_TABLE,
            &GENRE_MAPPINGS_TABLE,
        ] {
            table.create(conn).unwrap();
        }
    }

    fn store_from(conn: Connection) -> SqliteLibraryStore {
        SqliteLibraryStore {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    #[test]
    fn parses_spotify_export_timestamps() {
        assert!(parse_played_at("2024-01-15T10:30:00Z").is_ok());
        assert!(parse_played_at("2024-01-15 10:30:00").is_ok());
        assert!(parse_played_at("2024-01-15 10:30:00.123").is_ok());
        assert!(parse_played_at("not a timestamp").is_err());
    }

    #[test]
    fn genre_lists_are_trimmed_and_fanned_out() {
        assert_eq!(
            split_genre_list("soft rock, folk rock ,britpop"),
            vec!["soft rock", "folk rock", "britpop"]
        );
        assert!(split_genre_list(" , ").is_empty());
    }

    #[test]
    fn loads_dataset_from_snapshot() {
        let conn = Connection::open_in_memory().unwrap();
        create_snapshot(&conn);

        conn.execute(
            "INSERT INTO plays (played_at, ms_played, track_name, artist_name, spotify_track_uri)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                "2024-01-15T10:30:00Z",
                180000,
                "Song One",
                "Artist One",
                "spotify:track:abc"
            ],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO artists (artist_name, genres, spotify_artist_id, image_url)
             VALUES (?1, ?2, ?3, ?4)",
            params!["Artist One", "soft rock, britpop", "artist-id", None::<String>],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO tracks (spotify_track_uri, release_year, release_decade, album_image_url)
             VALUES (?1, ?2, ?3, ?4)",
            params!["spotify:track:abc", 1997, 1990, None::<String>],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO genre_mappings (subgenre, broad_genre) VALUES (?1, ?2)",
            params!["soft rock", "Rock"],
        )
        .unwrap();

        let dataset = store_from(conn).load_dataset().unwrap();
        assert_eq!(dataset.plays.len(), 1);
        assert_eq!(dataset.plays[0].ms_played, 180000);
        assert_eq!(
            dataset.artist("Artist One").unwrap().subgenres,
            vec!["soft rock", "britpop"]
        );
        assert_eq!(
            dataset.track("spotify:track:abc").unwrap().release_year,
            Some(1997)
        );
        assert_eq!(dataset.genre_mappings["soft rock"], "Rock");
    }

    #[test]
    fn rejects_negative_ms_played() {
        let conn = Connection::open_in_memory().unwrap();
        create_snapshot(&conn);
        conn.execute(
            "INSERT INTO plays (played_at, ms_played, track_name, artist_name, spotify_track_uri)
             VALUES ('2024-01-15T10:30:00Z', -5, 't', 'a', NULL)",
            [],
        )
        .unwrap();

        let result = store_from(conn).load_dataset();
        assert!(result.is_err());
        assert!(format!("{:?}", result.unwrap_err()).contains("negative ms_played"));
    }

    #[test]
    fn open_fails_on_schema_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("library.db");

        let conn = Connection::open(&db_path).unwrap();
        // A plays table with a missing column
        conn.execute(
            "CREATE TABLE plays (played_at TEXT NOT NULL, ms_played INTEGER NOT NULL)",
            [],
        )
        .unwrap();
        drop(conn);

        assert!(SqliteLibraryStore::new(&db_path).is_err());
    }
}
