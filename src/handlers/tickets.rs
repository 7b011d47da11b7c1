use axum::extract::{Path, State};
use axum::Extension;
use serde::Deserialize;

use crate::database::models::ticket::{NewTicket, Ticket, TicketComment, TicketStats, TicketUpdate};
use crate::database::Database;
use crate::error::ApiError;
use crate::handlers::Created;
use crate::middleware::auth::AuthUser;
use crate::middleware::extract::{ApiJson, ApiQuery};
use crate::middleware::response::{ApiResponse, ApiResult, Page};
use crate::state::AppState;
use crate::store::tickets::{TicketFilter, TicketStore};
use crate::store::{page_or_default, page_size_or};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketListQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub status: Option<String>,
    pub priority: Option<String>,
    #[serde(rename = "type")]
    pub ticket_type: Option<String>,
    pub keyword: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRequest {
    pub assignee_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    pub resolution: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub content: String,
}

/// GET /api/tickets
pub async fn list(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<TicketListQuery>,
) -> ApiResult<Page<Ticket>> {
    let pool = Database::pool(&state.config.database).await?;
    let page = page_or_default(query.page);
    let page_size = page_size_or(query.page_size, 10);
    let filter = TicketFilter {
        status: query.status,
        priority: query.priority,
        ticket_type: query.ticket_type,
        keyword: query.keyword,
    };

    let (list, total) = TicketStore::new(pool).list(&filter, page, page_size).await?;
    Ok(ApiResponse::success(Page::new(list, total, page, page_size)))
}

/// GET /api/tickets/stats
pub async fn stats(State(state): State<AppState>) -> ApiResult<TicketStats> {
    let pool = Database::pool(&state.config.database).await?;
    let stats = TicketStore::new(pool).stats().await?;
    Ok(ApiResponse::success(stats))
}

/// GET /api/tickets/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Ticket> {
    let pool = Database::pool(&state.config.database).await?;
    let ticket = TicketStore::new(pool)
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Ticket not found"))?;
    Ok(ApiResponse::success(ticket))
}

/// POST /api/tickets - the requester is the authenticated user.
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(body): ApiJson<NewTicket>,
) -> ApiResult<Created> {
    if body.title.trim().is_empty() {
        return Err(ApiError::bad_request("Title is required"));
    }

    let pool = Database::pool(&state.config.database).await?;
    let id = TicketStore::new(pool).create(&body, auth.user_id).await?;
    Ok(ApiResponse::with_message(Created { id }, "Ticket created"))
}

/// PUT /api/tickets/:id - partial update; unknown ids yield `data: null`.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ApiJson(body): ApiJson<TicketUpdate>,
) -> ApiResult<Option<Ticket>> {
    let pool = Database::pool(&state.config.database).await?;
    let store = TicketStore::new(pool);

    store.update(id, &body).await?;
    let ticket = store.find_by_id(id).await?;
    Ok(ApiResponse::with_message(ticket, "Ticket updated"))
}

/// DELETE /api/tickets/:id - idempotent.
pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<()> {
    let pool = Database::pool(&state.config.database).await?;
    TicketStore::new(pool).delete(id).await?;
    Ok(ApiResponse::with_message((), "Ticket deleted"))
}

/// PATCH /api/tickets/:id/assign
pub async fn assign(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ApiJson(body): ApiJson<AssignRequest>,
) -> ApiResult<Option<Ticket>> {
    let pool = Database::pool(&state.config.database).await?;
    let store = TicketStore::new(pool);

    store.assign(id, body.assignee_id).await?;
    let ticket = store.find_by_id(id).await?;
    Ok(ApiResponse::with_message(ticket, "Ticket assigned"))
}

/// PATCH /api/tickets/:id/start
pub async fn start(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Option<Ticket>> {
    let pool = Database::pool(&state.config.database).await?;
    let store = TicketStore::new(pool);

    store.start(id).await?;
    let ticket = store.find_by_id(id).await?;
    Ok(ApiResponse::with_message(ticket, "Ticket started"))
}

/// PATCH /api/tickets/:id/resolve - the body is optional.
pub async fn resolve(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    body: Option<ApiJson<ResolveRequest>>,
) -> ApiResult<Option<Ticket>> {
    let pool = Database::pool(&state.config.database).await?;
    let store = TicketStore::new(pool);

    let resolution = body.and_then(|ApiJson(b)| b.resolution);
    store.resolve(id, resolution.as_deref()).await?;
    let ticket = store.find_by_id(id).await?;
    Ok(ApiResponse::with_message(ticket, "Ticket resolved"))
}

/// PATCH /api/tickets/:id/close
pub async fn close(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Option<Ticket>> {
    let pool = Database::pool(&state.config.database).await?;
    let store = TicketStore::new(pool);

    store.close(id).await?;
    let ticket = store.find_by_id(id).await?;
    Ok(ApiResponse::with_message(ticket, "Ticket closed"))
}

/// GET /api/tickets/:id/comments
pub async fn comments(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Vec<TicketComment>> {
    let pool = Database::pool(&state.config.database).await?;
    let list = TicketStore::new(pool).comments(id).await?;
    Ok(ApiResponse::success(list))
}

/// POST /api/tickets/:id/comments
pub async fn add_comment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
    ApiJson(body): ApiJson<CommentRequest>,
) -> ApiResult<Option<TicketComment>> {
    if body.content.trim().is_empty() {
        return Err(ApiError::bad_request("Comment content is required"));
    }

    let pool = Database::pool(&state.config.database).await?;
    let store = TicketStore::new(pool);

    if store.find_by_id(id).await?.is_none() {
        return Err(ApiError::not_found("Ticket not found"));
    }

    let comment_id = store.add_comment(id, auth.user_id, &body.content).await?;
    let comment = store.find_comment(comment_id).await?;
    Ok(ApiResponse::with_message(comment, "Comment added"))
}
