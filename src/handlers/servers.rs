use axum::extract::{Path, State};
use serde::Deserialize;

use crate::database::models::server::{
    NewServer, NewServerGroup, Server, ServerGroup, ServerStats, ServerUpdate,
};
use crate::database::Database;
use crate::error::ApiError;
use crate::handlers::Created;
use crate::middleware::extract::{ApiJson, ApiQuery};
use crate::middleware::response::{ApiResponse, ApiResult, Page};
use crate::state::AppState;
use crate::store::servers::{ServerFilter, ServerStore};
use crate::store::{page_or_default, page_size_or};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerListQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub keyword: Option<String>,
    pub status: Option<String>,
    pub group_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct BatchIds {
    pub ids: Vec<i64>,
}

/// GET /api/servers - paginated, filtered server inventory.
pub async fn list(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ServerListQuery>,
) -> ApiResult<Page<Server>> {
    let pool = Database::pool(&state.config.database).await?;
    let store = ServerStore::new(pool);

    let page = page_or_default(query.page);
    let page_size = page_size_or(query.page_size, 10);
    let filter = ServerFilter {
        keyword: query.keyword,
        status: query.status,
        group_id: query.group_id,
    };

    let (rows, total) = store.list(&filter, page, page_size).await?;
    let list = rows.into_iter().map(|row| row.into_dto()).collect();
    Ok(ApiResponse::success(Page::new(list, total, page, page_size)))
}

/// GET /api/servers/stats
pub async fn stats(State(state): State<AppState>) -> ApiResult<ServerStats> {
    let pool = Database::pool(&state.config.database).await?;
    let stats = ServerStore::new(pool).stats().await?;
    Ok(ApiResponse::success(stats))
}

/// GET /api/servers/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Server> {
    let pool = Database::pool(&state.config.database).await?;
    let row = ServerStore::new(pool)
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Server not found"))?;
    Ok(ApiResponse::success(row.into_dto()))
}

/// POST /api/servers
pub async fn create(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<NewServer>,
) -> ApiResult<Created> {
    if body.hostname.trim().is_empty() {
        return Err(ApiError::bad_request("Hostname is required"));
    }
    if body.ip_address.trim().is_empty() {
        return Err(ApiError::bad_request("IP address is required"));
    }

    let pool = Database::pool(&state.config.database).await?;
    let id = ServerStore::new(pool).create(&body).await?;
    Ok(ApiResponse::with_message(Created { id }, "Server created"))
}

/// PUT /api/servers/:id - partial update; unknown ids yield `data: null`.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ApiJson(body): ApiJson<ServerUpdate>,
) -> ApiResult<Option<Server>> {
    let pool = Database::pool(&state.config.database).await?;
    let store = ServerStore::new(pool);

    store.update(id, &body).await?;
    let server = store.find_by_id(id).await?.map(|row| row.into_dto());
    Ok(ApiResponse::with_message(server, "Server updated"))
}

/// DELETE /api/servers/:id - idempotent.
pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<()> {
    let pool = Database::pool(&state.config.database).await?;
    ServerStore::new(pool).delete(id).await?;
    Ok(ApiResponse::with_message((), "Server deleted"))
}

/// POST /api/servers/batch-delete - sequential, best-effort: a failure
/// partway leaves earlier deletions in place.
pub async fn batch_delete(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<BatchIds>,
) -> ApiResult<()> {
    let pool = Database::pool(&state.config.database).await?;
    let store = ServerStore::new(pool);

    for id in body.ids {
        store.delete(id).await?;
    }
    Ok(ApiResponse::with_message((), "Servers deleted"))
}

/// GET /api/servers/groups
pub async fn groups(State(state): State<AppState>) -> ApiResult<Vec<ServerGroup>> {
    let pool = Database::pool(&state.config.database).await?;
    let groups = ServerStore::new(pool).groups().await?;
    Ok(ApiResponse::success(groups))
}

/// POST /api/servers/groups
pub async fn create_group(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<NewServerGroup>,
) -> ApiResult<Created> {
    if body.name.trim().is_empty() {
        return Err(ApiError::bad_request("Group name is required"));
    }

    let pool = Database::pool(&state.config.database).await?;
    let id = ServerStore::new(pool).create_group(&body).await?;
    Ok(ApiResponse::with_message(Created { id }, "Group created"))
}

/// DELETE /api/servers/groups/:id - idempotent.
pub async fn delete_group(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<()> {
    let pool = Database::pool(&state.config.database).await?;
    ServerStore::new(pool).delete_group(id).await?;
    Ok(ApiResponse::with_message((), "Group deleted"))
}
