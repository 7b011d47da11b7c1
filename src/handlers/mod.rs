pub mod alerts;
pub mod assets;
pub mod auth;
pub mod dashboard;
pub mod health;
pub mod monitors;
pub mod servers;
pub mod tickets;

use serde::Serialize;

/// Body returned by every create endpoint.
#[derive(Debug, Serialize)]
pub struct Created {
    pub id: i64,
}
