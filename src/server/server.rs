use anyhow::Result;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tower_http::services::ServeDir;
use tracing::info;

use axum::{
    extract::State,
    middleware,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;

use super::{log_requests, make_stats_routes, state::*, ServerConfig};
use crate::library_store::Dataset;

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub hash: String,
    pub plays: usize,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
        plays: state.stats.dataset.plays.len(),
    };
    Json(stats)
}

impl ServerState {
    fn new(config: ServerConfig, dataset: Arc<Dataset>) -> ServerState {
        let excluded_genres: HashSet<String> = config.excluded_genres.iter().cloned().collect();
        ServerState {
            config,
            start_time: Instant::now(),
            stats: StatsContext {
                dataset,
                excluded_genres: Arc::new(excluded_genres),
            },
            hash: env!("GIT_HASH").to_owned(),
        }
    }
}

pub fn make_app(config: ServerConfig, dataset: Arc<Dataset>) -> Result<Router> {
    let state = ServerState::new(config.clone(), dataset);

    let stats_routes = make_stats_routes(state.clone());

    let home_router: Router = match config.frontend_dir_path {
        Some(frontend_path) => {
            let static_files_service =
                ServeDir::new(frontend_path).append_index_html_on_directories(true);
            Router::new().fallback_service(static_files_service)
        }
        None => Router::new()
            .route("/", get(home))
            .with_state(state.clone()),
    };

    let app = home_router
        .nest("/v1/stats", stats_routes)
        .layer(middleware::from_fn_with_state(state.clone(), log_requests));

    Ok(app)
}

pub async fn run_server(config: ServerConfig, dataset: Arc<Dataset>) -> Result<()> {
    let port = config.port;
    let app = make_app(config, dataset)?;

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;

    info!("Ready to serve at port {}!", port);
    Ok(axum::serve(listener, app).await?)
}
