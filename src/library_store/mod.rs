mod models;
mod schema;
mod sqlite_library_store;

pub use models::{ArtistInfo, Dataset, Play, TrackInfo};
pub use schema::{ARTISTS_TABLE, GENRE_MAPPINGS_TABLE, PLAYS_TABLE, TRACKS_TABLE};
pub use sqlite_library_store::SqliteLibraryStore;

use anyhow::Result;

/// Read-only access to the listening-history snapshot.
///
/// The snapshot is owned and refreshed by an external batch pipeline;
/// this server never writes to it.
pub trait LibraryStore: Send + Sync {
    /// Loads the full dataset into memory.
    /// Returns Err if the store is unreachable or contains malformed rows.
    fn load_dataset(&self) -> Result<Dataset>;
}
