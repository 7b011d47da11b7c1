use axum::extract::{Path, State};
use serde::Deserialize;

use crate::database::models::asset::{Asset, AssetStats, AssetUpdate, NewAsset};
use crate::database::Database;
use crate::error::ApiError;
use crate::handlers::Created;
use crate::middleware::extract::{ApiJson, ApiQuery};
use crate::middleware::response::{ApiResponse, ApiResult, Page};
use crate::state::AppState;
use crate::store::assets::{AssetFilter, AssetStore};
use crate::store::{page_or_default, page_size_or};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetListQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    #[serde(rename = "type")]
    pub asset_type: Option<String>,
    pub status: Option<String>,
    pub keyword: Option<String>,
}

/// GET /api/assets
pub async fn list(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<AssetListQuery>,
) -> ApiResult<Page<Asset>> {
    let pool = Database::pool(&state.config.database).await?;
    let page = page_or_default(query.page);
    let page_size = page_size_or(query.page_size, 10);
    let filter = AssetFilter {
        asset_type: query.asset_type,
        status: query.status,
        keyword: query.keyword,
    };

    let (list, total) = AssetStore::new(pool).list(&filter, page, page_size).await?;
    Ok(ApiResponse::success(Page::new(list, total, page, page_size)))
}

/// GET /api/assets/stats
pub async fn stats(State(state): State<AppState>) -> ApiResult<AssetStats> {
    let pool = Database::pool(&state.config.database).await?;
    let stats = AssetStore::new(pool).stats().await?;
    Ok(ApiResponse::success(stats))
}

/// GET /api/assets/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Asset> {
    let pool = Database::pool(&state.config.database).await?;
    let asset = AssetStore::new(pool)
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Asset not found"))?;
    Ok(ApiResponse::success(asset))
}

/// POST /api/assets
pub async fn create(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<NewAsset>,
) -> ApiResult<Created> {
    if body.name.trim().is_empty() {
        return Err(ApiError::bad_request("Asset name is required"));
    }

    let pool = Database::pool(&state.config.database).await?;
    let id = AssetStore::new(pool).create(&body).await?;
    Ok(ApiResponse::with_message(Created { id }, "Asset created"))
}

/// PUT /api/assets/:id - partial update; unknown ids yield `data: null`.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ApiJson(body): ApiJson<AssetUpdate>,
) -> ApiResult<Option<Asset>> {
    let pool = Database::pool(&state.config.database).await?;
    let store = AssetStore::new(pool);

    store.update(id, &body).await?;
    let asset = store.find_by_id(id).await?;
    Ok(ApiResponse::with_message(asset, "Asset updated"))
}

/// DELETE /api/assets/:id - idempotent.
pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<()> {
    let pool = Database::pool(&state.config.database).await?;
    AssetStore::new(pool).delete(id).await?;
    Ok(ApiResponse::with_message((), "Asset deleted"))
}
