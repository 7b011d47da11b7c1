use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Ticket {
    pub id: i64,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub ticket_type: String,
    pub priority: String,
    pub status: String,
    pub requester_id: i64,
    pub assignee_id: Option<i64>,
    pub resolution: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub requester_name: Option<String>,
    pub assignee_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TicketComment {
    pub id: i64,
    pub ticket_id: i64,
    pub user_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TicketStats {
    pub total: i64,
    pub open: i64,
    pub urgent: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTicket {
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub ticket_type: String,
    pub priority: String,
    pub assignee_id: Option<i64>,
}

/// Partial update: absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TicketUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub ticket_type: Option<String>,
    pub priority: Option<String>,
    pub assignee_id: Option<i64>,
}

impl TicketUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.ticket_type.is_none()
            && self.priority.is_none()
            && self.assignee_id.is_none()
    }
}
