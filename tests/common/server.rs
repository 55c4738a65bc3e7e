//! Test server lifecycle management
//!
//! This module manages spawning and shutting down test HTTP servers.
//! Each test gets an isolated server with its own database.

use super::fixtures::create_test_db;
use listening_stats_server::library_store::{LibraryStore, SqliteLibraryStore};
use listening_stats_server::server::{make_app, ServerConfig};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Test server instance with an isolated database
///
/// When dropped, temp resources are cleaned up and the serve task is
/// aborted.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    pub port: u16,

    // Private fields - keep resources alive until drop
    _temp_db_dir: TempDir,
    serve_handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    /// Spawns a new test server on a random port
    ///
    /// # Panics
    ///
    /// Panics if database creation or port binding fails; both indicate
    /// a test infrastructure problem.
    pub async fn spawn() -> Self {
        let (temp_db_dir, db_path) = create_test_db().expect("Failed to create test database");

        let store =
            SqliteLibraryStore::new(&db_path).expect("Failed to open test database");
        let dataset = Arc::new(store.load_dataset().expect("Failed to load test dataset"));

        let app = make_app(ServerConfig::default(), dataset).expect("Failed to build app");

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test port");
        let port = listener.local_addr().unwrap().port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let serve_handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        TestServer {
            base_url,
            port,
            _temp_db_dir: temp_db_dir,
            serve_handle,
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.serve_handle.abort();
    }
}
