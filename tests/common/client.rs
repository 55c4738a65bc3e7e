//! HTTP client for end-to-end tests
//!
//! When API routes or request formats change, update only this file.

use super::constants::*;
use reqwest::Response;
use std::time::Duration;

pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

impl TestClient {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    /// GET an arbitrary path (with query string) under the server root.
    pub async fn get(&self, path_and_query: &str) -> Response {
        self.client
            .get(format!("{}{}", self.base_url, path_and_query))
            .send()
            .await
            .expect("Request failed")
    }

    /// GET a stats endpoint and unwrap the `{"data": [...]}` envelope.
    ///
    /// # Panics
    ///
    /// Panics if the response is not 200 or the envelope is missing.
    pub async fn get_data(&self, stats_path_and_query: &str) -> serde_json::Value {
        let response = self.get(&format!("/v1/stats{}", stats_path_and_query)).await;
        assert_eq!(
            response.status(),
            reqwest::StatusCode::OK,
            "GET /v1/stats{} failed",
            stats_path_and_query
        );
        let body: serde_json::Value = response.json().await.expect("Invalid JSON body");
        body.get("data").cloned().expect("Missing data envelope")
    }
}
