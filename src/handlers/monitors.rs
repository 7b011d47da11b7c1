use axum::extract::{Path, State};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::database::models::monitor::{MonitorSample, MonitorStats};
use crate::database::Database;
use crate::error::ApiError;
use crate::middleware::extract::{ApiJson, ApiQuery};
use crate::middleware::response::{ApiResponse, ApiResult, Page};
use crate::state::AppState;
use crate::store::monitors::MonitorStore;
use crate::store::{page_or_default, page_size_or};

/// Raw samples are charted client-side, so the default page is larger than
/// for the other resources.
const SAMPLE_PAGE_SIZE: i64 = 100;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleListQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchLatestRequest {
    pub server_ids: Vec<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsQuery {
    pub server_id: Option<i64>,
}

/// GET /api/monitors/:serverId - sample history, newest first.
pub async fn list(
    State(state): State<AppState>,
    Path(server_id): Path<i64>,
    ApiQuery(query): ApiQuery<SampleListQuery>,
) -> ApiResult<Page<MonitorSample>> {
    let pool = Database::pool(&state.config.database).await?;
    let store = MonitorStore::new(pool);

    let page = page_or_default(query.page);
    let page_size = page_size_or(query.page_size, SAMPLE_PAGE_SIZE);

    let (list, total) = store
        .list_by_server(server_id, query.start_time, query.end_time, page, page_size)
        .await?;
    Ok(ApiResponse::success(Page::new(list, total, page, page_size)))
}

/// GET /api/monitors/:serverId/latest
pub async fn latest(
    State(state): State<AppState>,
    Path(server_id): Path<i64>,
) -> ApiResult<MonitorSample> {
    let pool = Database::pool(&state.config.database).await?;
    let sample = MonitorStore::new(pool)
        .latest_by_server(server_id)
        .await?
        .ok_or_else(|| ApiError::not_found("No monitoring data available"))?;
    Ok(ApiResponse::success(sample))
}

/// POST /api/monitors/batch-latest - latest sample for each listed server.
pub async fn batch_latest(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<BatchLatestRequest>,
) -> ApiResult<Vec<MonitorSample>> {
    let pool = Database::pool(&state.config.database).await?;
    let samples = MonitorStore::new(pool)
        .latest_by_servers(&body.server_ids)
        .await?;
    Ok(ApiResponse::success(samples))
}

/// GET /api/monitors/stats - trailing-hour aggregates.
pub async fn stats(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<StatsQuery>,
) -> ApiResult<MonitorStats> {
    let pool = Database::pool(&state.config.database).await?;
    let stats = MonitorStore::new(pool).stats(query.server_id).await?;
    Ok(ApiResponse::success(stats))
}
