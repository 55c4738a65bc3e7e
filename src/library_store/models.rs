use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use std::collections::HashMap;

/// A single listening event. Immutable once ingested.
#[derive(Debug, Clone, PartialEq)]
pub struct Play {
    pub played_at: NaiveDateTime,
    pub ms_played: u64,
    pub track_name: String,
    pub artist_name: String,
    pub spotify_track_uri: Option<String>,
}

impl Play {
    pub fn date(&self) -> NaiveDate {
        self.played_at.date()
    }

    /// Day of week, 0 = Sunday (the convention the ingestion pipeline and
    /// the dashboard UI agreed on).
    pub fn dow(&self) -> u32 {
        self.played_at.weekday().num_days_from_sunday()
    }

    pub fn dow_name(&self) -> &'static str {
        Self::dow_name_of(self.dow())
    }

    pub fn dow_name_of(dow: u32) -> &'static str {
        match dow {
            0 => "Sunday",
            1 => "Monday",
            2 => "Tuesday",
            3 => "Wednesday",
            4 => "Thursday",
            5 => "Friday",
            _ => "Saturday",
        }
    }

    pub fn hour(&self) -> u32 {
        self.played_at.hour()
    }
}

/// Artist dimension row. `subgenres` is already fanned out and trimmed.
#[derive(Debug, Clone, Default)]
pub struct ArtistInfo {
    pub subgenres: Vec<String>,
    pub spotify_artist_id: Option<String>,
    pub image_url: Option<String>,
}

/// Track dimension row, keyed by Spotify URI in [`Dataset::tracks`].
#[derive(Debug, Clone, Default)]
pub struct TrackInfo {
    pub release_year: Option<i32>,
    pub release_decade: Option<i32>,
    pub album_image_url: Option<String>,
}

/// An immutable point-in-time snapshot of the listening history and its
/// dimension tables. All analytics computations read from this and
/// nothing else, which keeps them pure and testable without a database.
#[derive(Debug, Default)]
pub struct Dataset {
    pub plays: Vec<Play>,
    pub artists: HashMap<String, ArtistInfo>,
    pub tracks: HashMap<String, TrackInfo>,
    /// subgenre -> broad genre
    pub genre_mappings: HashMap<String, String>,
}

impl Dataset {
    pub fn artist(&self, artist_name: &str) -> Option<&ArtistInfo> {
        self.artists.get(artist_name)
    }

    pub fn track(&self, spotify_track_uri: &str) -> Option<&TrackInfo> {
        self.tracks.get(spotify_track_uri)
    }
}
