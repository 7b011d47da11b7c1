use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Asset {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub asset_type: String,
    pub status: String,
    pub value: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub server_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Inventory counters by asset type.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AssetStats {
    pub racks: i64,
    pub ips: i64,
    pub bandwidth: i64,
    pub hardware: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewAsset {
    pub name: String,
    #[serde(rename = "type")]
    pub asset_type: String,
    pub status: Option<String>,
    pub value: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub server_id: Option<i64>,
}

/// Partial update: absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssetUpdate {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub asset_type: Option<String>,
    pub status: Option<String>,
    pub value: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub server_id: Option<i64>,
}

impl AssetUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.asset_type.is_none()
            && self.status.is_none()
            && self.value.is_none()
            && self.description.is_none()
            && self.location.is_none()
            && self.server_id.is_none()
    }
}
