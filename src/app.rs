use axum::http::{header, HeaderValue, Method};
use axum::middleware::from_fn_with_state;
use axum::routing::{delete, get, patch, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::CorsConfig;
use crate::handlers;
use crate::middleware::{auth as session, rate_limit};
use crate::state::AppState;
use crate::telemetry::ws;

/// Assemble the full router: public auth endpoints, the protected API
/// behind the session gate, the push channel, and the global layers.
pub fn app(state: AppState) -> Router {
    let protected = Router::new()
        .merge(auth_protected_routes())
        .merge(server_routes())
        .merge(monitor_routes())
        .merge(alert_routes())
        .merge(dashboard_routes())
        .merge(ticket_routes())
        .merge(asset_routes())
        .layer(from_fn_with_state(state.clone(), session::require_auth));

    let api = Router::new()
        .merge(auth_public_routes())
        .merge(protected)
        .layer(from_fn_with_state(state.clone(), rate_limit::limit))
        // Registered after the limiter layer: the push channel is long-lived
        // and open to clients with or without a session.
        .route(
            "/ws",
            get(ws::ws_handler).layer(from_fn_with_state(state.clone(), session::optional_auth)),
        );

    Router::new()
        .route("/health", get(handlers::health::health))
        .nest("/api", api)
        .fallback(not_found)
        .layer(cors_layer(&state.config.cors))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn not_found() -> crate::error::ApiError {
    crate::error::ApiError::not_found("Resource not found")
}

fn cors_layer(cors: &CorsConfig) -> CorsLayer {
    let origin = match cors.origin.as_str() {
        "*" => return CorsLayer::permissive(),
        origin => match origin.parse::<HeaderValue>() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!("invalid CORS_ORIGIN {:?}, falling back to permissive", cors.origin);
                return CorsLayer::permissive();
            }
        },
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(cors.credentials)
}

fn auth_public_routes() -> Router<AppState> {
    use handlers::auth;

    Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/register", post(auth::register))
        .route("/auth/reset-password", post(auth::reset_password))
}

fn auth_protected_routes() -> Router<AppState> {
    use handlers::auth;

    Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/auth/profile", put(auth::update_profile))
        .route("/auth/password", put(auth::change_password))
}

fn server_routes() -> Router<AppState> {
    use handlers::servers;

    Router::new()
        .route("/servers", get(servers::list).post(servers::create))
        .route("/servers/stats", get(servers::stats))
        .route("/servers/groups", get(servers::groups).post(servers::create_group))
        .route("/servers/groups/:id", delete(servers::delete_group))
        .route("/servers/batch-delete", post(servers::batch_delete))
        .route(
            "/servers/:id",
            get(servers::get).put(servers::update).delete(servers::delete),
        )
}

fn monitor_routes() -> Router<AppState> {
    use handlers::monitors;

    Router::new()
        .route("/monitors/stats", get(monitors::stats))
        .route("/monitors/batch-latest", post(monitors::batch_latest))
        .route("/monitors/:server_id", get(monitors::list))
        .route("/monitors/:server_id/latest", get(monitors::latest))
}

fn alert_routes() -> Router<AppState> {
    use handlers::alerts;

    Router::new()
        .route("/alerts/rules", get(alerts::list_rules).post(alerts::create_rule))
        .route(
            "/alerts/rules/:id",
            get(alerts::get_rule).put(alerts::update_rule).delete(alerts::delete_rule),
        )
        .route("/alerts/rules/:id/toggle", patch(alerts::toggle_rule))
        .route("/alerts/history", get(alerts::list_history))
        .route("/alerts/history/:id/resolve", patch(alerts::resolve))
        .route("/alerts/history/batch-resolve", post(alerts::batch_resolve))
        .route("/alerts/stats", get(alerts::stats))
        .route("/alerts/recent", get(alerts::recent))
}

fn dashboard_routes() -> Router<AppState> {
    use handlers::dashboard;

    Router::new()
        .route("/dashboard/stats", get(dashboard::stats))
        .route("/dashboard/server-status", get(dashboard::server_status))
        .route("/dashboard/resource-trend", get(dashboard::resource_trend))
        .route("/dashboard/network-trend", get(dashboard::network_trend))
        .route("/dashboard/recent-alerts", get(dashboard::recent_alerts))
        .route("/dashboard/top-resource-usage", get(dashboard::top_resource_usage))
        .route("/dashboard/alert-trend", get(dashboard::alert_trend))
}

fn ticket_routes() -> Router<AppState> {
    use handlers::tickets;

    Router::new()
        .route("/tickets", get(tickets::list).post(tickets::create))
        .route("/tickets/stats", get(tickets::stats))
        .route(
            "/tickets/:id",
            get(tickets::get).put(tickets::update).delete(tickets::delete),
        )
        .route("/tickets/:id/assign", patch(tickets::assign))
        .route("/tickets/:id/start", patch(tickets::start))
        .route("/tickets/:id/resolve", patch(tickets::resolve))
        .route("/tickets/:id/close", patch(tickets::close))
        .route(
            "/tickets/:id/comments",
            get(tickets::comments).post(tickets::add_comment),
        )
}

fn asset_routes() -> Router<AppState> {
    use handlers::assets;

    Router::new()
        .route("/assets", get(assets::list).post(assets::create))
        .route("/assets/stats", get(assets::stats))
        .route(
            "/assets/:id",
            get(assets::get).put(assets::update).delete(assets::delete),
        )
}
