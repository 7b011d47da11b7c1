use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Server row joined with its optional group.
#[derive(Debug, Clone, FromRow)]
pub struct ServerRow {
    pub id: i64,
    pub hostname: String,
    pub ip_address: String,
    pub group_id: Option<i64>,
    pub status: String,
    pub os: Option<String>,
    pub cpu_cores: Option<i32>,
    pub memory_gb: Option<i32>,
    pub disk_gb: Option<i32>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub group_name: Option<String>,
    pub group_description: Option<String>,
}

impl ServerRow {
    pub fn into_dto(self) -> Server {
        let group = match (self.group_id, self.group_name) {
            (Some(id), Some(name)) => Some(GroupRef {
                id,
                name,
                description: self.group_description,
            }),
            _ => None,
        };

        Server {
            id: self.id,
            hostname: self.hostname,
            ip_address: self.ip_address,
            group_id: self.group_id,
            status: self.status,
            os: self.os,
            cpu_cores: self.cpu_cores,
            memory_gb: self.memory_gb,
            disk_gb: self.disk_gb,
            location: self.location,
            description: self.description,
            created_at: self.created_at,
            updated_at: self.updated_at,
            group,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Server {
    pub id: i64,
    pub hostname: String,
    pub ip_address: String,
    pub group_id: Option<i64>,
    pub status: String,
    pub os: Option<String>,
    pub cpu_cores: Option<i32>,
    pub memory_gb: Option<i32>,
    pub disk_gb: Option<i32>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<GroupRef>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupRef {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ServerGroup {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "serverCount")]
    pub server_count: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ServerStats {
    pub total: i64,
    pub online: i64,
    pub offline: i64,
    pub maintenance: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewServer {
    pub hostname: String,
    pub ip_address: String,
    pub group_id: Option<i64>,
    pub status: Option<String>,
    pub os: Option<String>,
    pub cpu_cores: Option<i32>,
    pub memory_gb: Option<i32>,
    pub disk_gb: Option<i32>,
    pub location: Option<String>,
    pub description: Option<String>,
}

/// Partial update: absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerUpdate {
    pub hostname: Option<String>,
    pub ip_address: Option<String>,
    pub group_id: Option<i64>,
    pub status: Option<String>,
    pub os: Option<String>,
    pub cpu_cores: Option<i32>,
    pub memory_gb: Option<i32>,
    pub disk_gb: Option<i32>,
    pub location: Option<String>,
    pub description: Option<String>,
}

impl ServerUpdate {
    pub fn is_empty(&self) -> bool {
        self.hostname.is_none()
            && self.ip_address.is_none()
            && self.group_id.is_none()
            && self.status.is_none()
            && self.os.is_none()
            && self.cpu_cores.is_none()
            && self.memory_gb.is_none()
            && self.disk_gb.is_none()
            && self.location.is_none()
            && self.description.is_none()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewServerGroup {
    pub name: String,
    pub description: Option<String>,
}
