//! Listening Stats Server Library
//!
//! This library exposes the internal modules for testing and potential reuse.

pub mod analytics;
pub mod config;
pub mod library_store;
pub mod server;
pub mod sqlite_persistence;

// Re-export commonly used types for convenience
pub use library_store::{Dataset, LibraryStore, SqliteLibraryStore};
pub use server::{run_server, RequestsLoggingLevel};
