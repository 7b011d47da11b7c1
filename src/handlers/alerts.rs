use axum::extract::{Path, State};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::database::models::alert::{
    AlertEvent, AlertRule, AlertRuleUpdate, AlertStats, NewAlertRule,
};
use crate::database::Database;
use crate::error::ApiError;
use crate::handlers::Created;
use crate::middleware::extract::{ApiJson, ApiQuery};
use crate::middleware::response::{ApiResponse, ApiResult, Page};
use crate::state::AppState;
use crate::store::alerts::{AlertHistoryFilter, AlertStore};
use crate::store::{page_or_default, page_size_or};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleListQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryListQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub level: Option<String>,
    pub status: Option<String>,
    pub server_id: Option<i64>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub enabled: bool,
}

#[derive(Debug, Deserialize)]
pub struct BatchIds {
    pub ids: Vec<i64>,
}

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    pub limit: Option<i64>,
}

/// GET /api/alerts/rules
pub async fn list_rules(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<RuleListQuery>,
) -> ApiResult<Page<AlertRule>> {
    let pool = Database::pool(&state.config.database).await?;
    let page = page_or_default(query.page);
    let page_size = page_size_or(query.page_size, 10);

    let (list, total) = AlertStore::new(pool).list_rules(page, page_size).await?;
    Ok(ApiResponse::success(Page::new(list, total, page, page_size)))
}

/// GET /api/alerts/rules/:id
pub async fn get_rule(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<AlertRule> {
    let pool = Database::pool(&state.config.database).await?;
    let rule = AlertStore::new(pool)
        .find_rule(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Alert rule not found"))?;
    Ok(ApiResponse::success(rule))
}

/// POST /api/alerts/rules
pub async fn create_rule(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<NewAlertRule>,
) -> ApiResult<Created> {
    if body.name.trim().is_empty() {
        return Err(ApiError::bad_request("Rule name is required"));
    }
    if body.metric.trim().is_empty() {
        return Err(ApiError::bad_request("Metric is required"));
    }

    let pool = Database::pool(&state.config.database).await?;
    let id = AlertStore::new(pool).create_rule(&body).await?;
    Ok(ApiResponse::with_message(Created { id }, "Alert rule created"))
}

/// PUT /api/alerts/rules/:id - partial update; unknown ids yield `data: null`.
pub async fn update_rule(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ApiJson(body): ApiJson<AlertRuleUpdate>,
) -> ApiResult<Option<AlertRule>> {
    let pool = Database::pool(&state.config.database).await?;
    let store = AlertStore::new(pool);

    store.update_rule(id, &body).await?;
    let rule = store.find_rule(id).await?;
    Ok(ApiResponse::with_message(rule, "Alert rule updated"))
}

/// DELETE /api/alerts/rules/:id - idempotent.
pub async fn delete_rule(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<()> {
    let pool = Database::pool(&state.config.database).await?;
    AlertStore::new(pool).delete_rule(id).await?;
    Ok(ApiResponse::with_message((), "Alert rule deleted"))
}

/// PATCH /api/alerts/rules/:id/toggle
pub async fn toggle_rule(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ApiJson(body): ApiJson<ToggleRequest>,
) -> ApiResult<Option<AlertRule>> {
    let pool = Database::pool(&state.config.database).await?;
    let store = AlertStore::new(pool);

    store
        .update_rule(
            id,
            &AlertRuleUpdate {
                enabled: Some(body.enabled),
                ..Default::default()
            },
        )
        .await?;
    let rule = store.find_rule(id).await?;
    Ok(ApiResponse::with_message(rule, "Rule status updated"))
}

/// GET /api/alerts/history
pub async fn list_history(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<HistoryListQuery>,
) -> ApiResult<Page<AlertEvent>> {
    let pool = Database::pool(&state.config.database).await?;
    let page = page_or_default(query.page);
    let page_size = page_size_or(query.page_size, 10);
    let filter = AlertHistoryFilter {
        level: query.level,
        status: query.status,
        server_id: query.server_id,
        start_time: query.start_time,
        end_time: query.end_time,
    };

    let (list, total) = AlertStore::new(pool).list_history(&filter, page, page_size).await?;
    Ok(ApiResponse::success(Page::new(list, total, page, page_size)))
}

/// PATCH /api/alerts/history/:id/resolve
pub async fn resolve(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<()> {
    let pool = Database::pool(&state.config.database).await?;
    AlertStore::new(pool).resolve(id).await?;
    Ok(ApiResponse::with_message((), "Alert resolved"))
}

/// POST /api/alerts/history/batch-resolve - sequential, best-effort; no
/// transaction spans the batch, so earlier ids stay resolved if a later
/// one fails.
pub async fn batch_resolve(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<BatchIds>,
) -> ApiResult<()> {
    let pool = Database::pool(&state.config.database).await?;
    let store = AlertStore::new(pool);

    for id in body.ids {
        store.resolve(id).await?;
    }
    Ok(ApiResponse::with_message((), "Alerts resolved"))
}

/// GET /api/alerts/stats - 24-hour summary.
pub async fn stats(State(state): State<AppState>) -> ApiResult<AlertStats> {
    let pool = Database::pool(&state.config.database).await?;
    let stats = AlertStore::new(pool).stats().await?;
    Ok(ApiResponse::success(stats))
}

/// GET /api/alerts/recent - latest triggered alerts.
pub async fn recent(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<RecentQuery>,
) -> ApiResult<Vec<AlertEvent>> {
    let pool = Database::pool(&state.config.database).await?;
    let limit = query.limit.filter(|l| *l >= 1).unwrap_or(10);
    let list = AlertStore::new(pool).recent(limit).await?;
    Ok(ApiResponse::success(list))
}
