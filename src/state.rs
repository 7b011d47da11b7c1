use std::sync::Arc;
use std::time::Duration;

use crate::auth::tokens::TokenService;
use crate::config::Config;
use crate::middleware::rate_limit::RateLimiter;
use crate::telemetry::hub::TelemetryHub;

/// Shared application state handed to every handler and middleware. Built
/// once in `main` from the startup configuration; the only mutable pieces
/// are internally synchronized (revocation cache, rate-limit windows,
/// broadcast channel).
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub tokens: Arc<TokenService>,
    pub hub: TelemetryHub,
    pub limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(config: Arc<Config>) -> Self {
        let tokens = Arc::new(TokenService::from_config(&config.jwt));
        let limiter = Arc::new(RateLimiter::new(
            Duration::from_millis(config.rate_limit.window_ms),
            config.rate_limit.max_requests,
        ));

        Self {
            config,
            tokens,
            hub: TelemetryHub::default(),
            limiter,
        }
    }
}
