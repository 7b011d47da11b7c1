use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::database::models::alert::{AlertEvent, AlertStats, AlertTrend};
use crate::database::models::asset::AssetStats;
use crate::database::models::monitor::{NetworkTrend, ResourceTrend, ServerUsage};
use crate::database::models::server::ServerStats;
use crate::database::models::ticket::TicketStats;
use crate::database::Database;
use crate::middleware::extract::ApiQuery;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::state::AppState;
use crate::store::alerts::AlertStore;
use crate::store::assets::AssetStore;
use crate::store::monitors::MonitorStore;
use crate::store::servers::ServerStore;
use crate::store::tickets::TicketStore;

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub range: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct TopUsageQuery {
    pub metric: Option<String>,
    pub limit: Option<i64>,
}

/// Cross-resource counters for the landing view. Purely derived; the
/// aggregator owns no state of its own.
#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub servers: ServerStats,
    pub alerts: AlertStats,
    pub tickets: TicketStats,
    pub assets: AssetStats,
}

#[derive(Debug, Serialize)]
pub struct StatusDistribution {
    pub online: i64,
    pub offline: i64,
    pub maintenance: i64,
}

/// GET /api/dashboard/stats
pub async fn stats(State(state): State<AppState>) -> ApiResult<DashboardStats> {
    let pool = Database::pool(&state.config.database).await?;

    let servers = ServerStore::new(pool.clone());
    let alerts = AlertStore::new(pool.clone());
    let tickets = TicketStore::new(pool.clone());
    let assets = AssetStore::new(pool);

    let (servers, alerts, tickets, assets) =
        tokio::try_join!(servers.stats(), alerts.stats(), tickets.stats(), assets.stats())?;

    Ok(ApiResponse::success(DashboardStats {
        servers,
        alerts,
        tickets,
        assets,
    }))
}

/// GET /api/dashboard/server-status
pub async fn server_status(State(state): State<AppState>) -> ApiResult<StatusDistribution> {
    let pool = Database::pool(&state.config.database).await?;
    let stats = ServerStore::new(pool).stats().await?;
    Ok(ApiResponse::success(StatusDistribution {
        online: stats.online,
        offline: stats.offline,
        maintenance: stats.maintenance,
    }))
}

/// GET /api/dashboard/resource-trend
pub async fn resource_trend(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<RangeQuery>,
) -> ApiResult<ResourceTrend> {
    let pool = Database::pool(&state.config.database).await?;
    let range = query.range.as_deref().unwrap_or("24h");
    let trend = MonitorStore::new(pool).resource_trend(range).await?;
    Ok(ApiResponse::success(trend))
}

/// GET /api/dashboard/network-trend
pub async fn network_trend(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<RangeQuery>,
) -> ApiResult<NetworkTrend> {
    let pool = Database::pool(&state.config.database).await?;
    let range = query.range.as_deref().unwrap_or("24h");
    let trend = MonitorStore::new(pool).network_trend(range).await?;
    Ok(ApiResponse::success(trend))
}

/// GET /api/dashboard/recent-alerts
pub async fn recent_alerts(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<LimitQuery>,
) -> ApiResult<Vec<AlertEvent>> {
    let pool = Database::pool(&state.config.database).await?;
    let limit = query.limit.filter(|l| *l >= 1).unwrap_or(5);
    let list = AlertStore::new(pool).recent(limit).await?;
    Ok(ApiResponse::success(list))
}

/// GET /api/dashboard/top-resource-usage
pub async fn top_resource_usage(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<TopUsageQuery>,
) -> ApiResult<Vec<ServerUsage>> {
    let pool = Database::pool(&state.config.database).await?;
    let metric = query.metric.as_deref().unwrap_or("cpu");
    let limit = query.limit.filter(|l| *l >= 1).unwrap_or(5);
    let list = MonitorStore::new(pool).top_usage(metric, limit).await?;
    Ok(ApiResponse::success(list))
}

/// GET /api/dashboard/alert-trend
pub async fn alert_trend(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<RangeQuery>,
) -> ApiResult<AlertTrend> {
    let pool = Database::pool(&state.config.database).await?;
    let range = query.range.as_deref().unwrap_or("24h");
    let trend = AlertStore::new(pool).trend(range).await?;
    Ok(ApiResponse::success(trend))
}
