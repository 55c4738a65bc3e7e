//! Listening-stats routes. Handlers validate query parameters, call
//! into the analytics layer, and wrap rows in the `{"data": [...]}`
//! envelope the dashboard consumes.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use super::state::{ServerState, StatsContext};
use crate::analytics::buckets::{auto_granularity, Granularity, GranularitySelector};
use crate::analytics::profile::ReleaseGroupBy;
use crate::analytics::{
    discovery, evolution, genres, leaderboard, profile, validate_limit, DateRange, Metric,
    MonthRange, StatsError,
};

#[derive(Serialize)]
struct DataEnvelope<T> {
    data: Vec<T>,
}

fn data<T: Serialize>(rows: Vec<T>) -> Response {
    Json(DataEnvelope { data: rows }).into_response()
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    details: Option<String>,
}

fn stats_error(err: StatsError) -> Response {
    match err {
        StatsError::InvalidParameter(details) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "invalid parameter".to_string(),
                details: Some(details),
            }),
        )
            .into_response(),
        StatsError::DataAccess(details) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "data access error".to_string(),
                details: Some(details),
            }),
        )
            .into_response(),
        StatsError::Computation(details) => {
            error!("stats computation failed: {}", details);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "computation error".to_string(),
                    details: None,
                }),
            )
                .into_response()
        }
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct DateBoundsParams {
    start: Option<String>,
    end: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct TrendsParams {
    granularity: Option<String>,
    start: Option<String>,
    end: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct MonthBoundsParams {
    start: Option<String>,
    end: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct LeaderboardParams {
    start: Option<String>,
    end: Option<String>,
    limit: Option<usize>,
    metric: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct ReleaseYearsParams {
    #[serde(rename = "groupBy")]
    group_by: Option<String>,
    start: Option<String>,
    end: Option<String>,
}

const DEFAULT_LEADERBOARD_LIMIT: usize = 10;

async fn get_summary(
    State(ctx): State<StatsContext>,
    Query(params): Query<DateBoundsParams>,
) -> Response {
    let range = match DateRange::parse(params.start.as_deref(), params.end.as_deref()) {
        Ok(range) => range,
        Err(err) => return stats_error(err),
    };
    Json(profile::summary(&ctx.dataset, &range)).into_response()
}

async fn get_trends(
    State(ctx): State<StatsContext>,
    Query(params): Query<TrendsParams>,
) -> Response {
    let range = match DateRange::parse(params.start.as_deref(), params.end.as_deref()) {
        Ok(range) => range,
        Err(err) => return stats_error(err),
    };
    let selector = match params
        .granularity
        .as_deref()
        .unwrap_or("month")
        .parse::<GranularitySelector>()
    {
        Ok(selector) => selector,
        Err(err) => return stats_error(err),
    };
    let granularity = match selector {
        GranularitySelector::Fixed(granularity) => granularity,
        GranularitySelector::Auto => {
            // Resolve from the explicit bounds, falling back to the
            // observed extent of the history.
            let observed_start = ctx.dataset.plays.iter().map(|p| p.date()).min();
            let observed_end = ctx.dataset.plays.iter().map(|p| p.date()).max();
            match (
                range.start.or(observed_start),
                range.end.or(observed_end),
            ) {
                (Some(start), Some(end)) => auto_granularity(start, end),
                _ => Granularity::Month,
            }
        }
    };
    data(profile::trends(&ctx.dataset, &range, granularity))
}

async fn get_dow(
    State(ctx): State<StatsContext>,
    Query(params): Query<MonthBoundsParams>,
) -> Response {
    let range = match MonthRange::parse(params.start.as_deref(), params.end.as_deref()) {
        Ok(range) => range,
        Err(err) => return stats_error(err),
    };
    data(profile::day_of_week_profile(&ctx.dataset, &range))
}

async fn get_hour(
    State(ctx): State<StatsContext>,
    Query(params): Query<MonthBoundsParams>,
) -> Response {
    let range = match MonthRange::parse(params.start.as_deref(), params.end.as_deref()) {
        Ok(range) => range,
        Err(err) => return stats_error(err),
    };
    data(profile::hour_of_day_profile(&ctx.dataset, &range))
}

fn parse_leaderboard_params(
    params: &LeaderboardParams,
) -> Result<(MonthRange, Metric, usize), StatsError> {
    let range = MonthRange::parse(params.start.as_deref(), params.end.as_deref())?;
    let metric = match params.metric.as_deref() {
        Some(raw) => raw.parse::<Metric>()?,
        None => Metric::default(),
    };
    let limit = params.limit.unwrap_or(DEFAULT_LEADERBOARD_LIMIT);
    validate_limit(limit)?;
    Ok((range, metric, limit))
}

async fn get_top_artists(
    State(ctx): State<StatsContext>,
    Query(params): Query<LeaderboardParams>,
) -> Response {
    let (range, metric, limit) = match parse_leaderboard_params(&params) {
        Ok(parsed) => parsed,
        Err(err) => return stats_error(err),
    };
    data(leaderboard::top_artists(&ctx.dataset, &range, metric, limit))
}

async fn get_top_tracks(
    State(ctx): State<StatsContext>,
    Query(params): Query<LeaderboardParams>,
) -> Response {
    let (range, metric, limit) = match parse_leaderboard_params(&params) {
        Ok(parsed) => parsed,
        Err(err) => return stats_error(err),
    };
    data(leaderboard::top_tracks(&ctx.dataset, &range, metric, limit))
}

async fn get_artist_evolution(
    State(ctx): State<StatsContext>,
    Query(params): Query<MonthBoundsParams>,
) -> Response {
    let range = match MonthRange::parse(params.start.as_deref(), params.end.as_deref()) {
        Ok(range) => range,
        Err(err) => return stats_error(err),
    };
    let rows = evolution::artist_evolution(&ctx.dataset)
        .into_iter()
        .filter(|row| range.contains_label(&row.year_month))
        .collect();
    data(rows)
}

async fn get_genre_evolution(
    State(ctx): State<StatsContext>,
    Query(params): Query<MonthBoundsParams>,
) -> Response {
    let range = match MonthRange::parse(params.start.as_deref(), params.end.as_deref()) {
        Ok(range) => range,
        Err(err) => return stats_error(err),
    };
    let rows = evolution::genre_evolution(&ctx.dataset, &ctx.excluded_genres)
        .into_iter()
        .filter(|row| range.contains_label(&row.year_month))
        .collect();
    data(rows)
}

async fn get_artist_momentum(State(ctx): State<StatsContext>) -> Response {
    data(evolution::artist_momentum(&ctx.dataset))
}

async fn get_genres(
    State(ctx): State<StatsContext>,
    Query(params): Query<MonthBoundsParams>,
) -> Response {
    let range = match MonthRange::parse(params.start.as_deref(), params.end.as_deref()) {
        Ok(range) => range,
        Err(err) => return stats_error(err),
    };
    data(genres::subgenre_breakdown(
        &ctx.dataset,
        &range,
        &ctx.excluded_genres,
    ))
}

async fn get_genres_broad(
    State(ctx): State<StatsContext>,
    Query(params): Query<MonthBoundsParams>,
) -> Response {
    let range = match MonthRange::parse(params.start.as_deref(), params.end.as_deref()) {
        Ok(range) => range,
        Err(err) => return stats_error(err),
    };
    data(genres::broad_genre_totals(
        &ctx.dataset,
        &range,
        &ctx.excluded_genres,
    ))
}

async fn get_discovery_rate(State(ctx): State<StatsContext>) -> Response {
    data(discovery::discovery_rate(&ctx.dataset))
}

async fn get_release_years(
    State(ctx): State<StatsContext>,
    Query(params): Query<ReleaseYearsParams>,
) -> Response {
    let range = match MonthRange::parse(params.start.as_deref(), params.end.as_deref()) {
        Ok(range) => range,
        Err(err) => return stats_error(err),
    };
    let group_by = match params.group_by.as_deref() {
        Some(raw) => match raw.parse::<ReleaseGroupBy>() {
            Ok(group_by) => group_by,
            Err(err) => return stats_error(err),
        },
        None => ReleaseGroupBy::Year,
    };
    data(profile::release_years(&ctx.dataset, &range, group_by))
}

async fn get_decade_evolution(State(ctx): State<StatsContext>) -> Response {
    data(profile::decade_evolution(&ctx.dataset))
}

pub fn make_stats_routes(state: ServerState) -> Router {
    Router::new()
        .route("/summary", get(get_summary))
        .route("/trends", get(get_trends))
        .route("/dow", get(get_dow))
        .route("/hour", get(get_hour))
        .route("/top-artists", get(get_top_artists))
        .route("/top-tracks", get(get_top_tracks))
        .route("/artist-evolution", get(get_artist_evolution))
        .route("/genre-evolution", get(get_genre_evolution))
        .route("/artist-momentum", get(get_artist_momentum))
        .route("/genres", get(get_genres))
        .route("/genres-broad", get(get_genres_broad))
        .route("/discovery-rate", get(get_discovery_rate))
        .route("/release-years", get(get_release_years))
        .route("/decade-evolution", get(get_decade_evolution))
        .with_state(state)
}
