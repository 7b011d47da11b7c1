use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Account status values stored in `users.status`.
pub mod status {
    pub const ACTIVE: &str = "active";
    pub const INACTIVE: &str = "inactive";
    pub const LOCKED: &str = "locked";
}

/// Role id assigned to self-registered accounts.
pub const DEFAULT_ROLE_ID: i64 = 2;

/// Full user row joined with its role. Never serialized directly: the
/// password hash must not cross the API boundary, so responses go through
/// [`UserRecord::into_profile`].
#[derive(Debug, Clone, FromRow)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role_id: i64,
    pub status: String,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub role_name: Option<String>,
    pub role_description: Option<String>,
}

impl UserRecord {
    pub fn is_active(&self) -> bool {
        self.status == status::ACTIVE
    }

    pub fn role_name(&self) -> &str {
        self.role_name.as_deref().unwrap_or("user")
    }

    /// Strip the password hash and shape the role join for the wire.
    pub fn into_profile(self, permissions: Option<Vec<Permission>>) -> UserProfile {
        let role = self.role_name.map(|name| RoleRef {
            id: self.role_id,
            name,
            description: self.role_description,
        });

        UserProfile {
            id: self.id,
            username: self.username,
            email: self.email,
            role_id: self.role_id,
            status: self.status,
            last_login: self.last_login,
            created_at: self.created_at,
            updated_at: self.updated_at,
            role,
            permissions,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RoleRef {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Permission {
    pub id: i64,
    pub name: String,
    pub resource: String,
    pub action: String,
    pub description: Option<String>,
}

/// User record as exposed by the API.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role_id: i64,
    pub status: String,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<RoleRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<Permission>>,
}

/// Fields accepted when creating a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role_id: i64,
    pub status: String,
}

/// Partial update: absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub role_id: Option<i64>,
    pub status: Option<String>,
    #[serde(skip)]
    pub password_hash: Option<String>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.role_id.is_none()
            && self.status.is_none()
            && self.password_hash.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> UserRecord {
        UserRecord {
            id: 1,
            username: "alice".into(),
            email: "alice@example.com".into(),
            password_hash: "$2b$12$abcdefghijklmnopqrstuv".into(),
            role_id: 1,
            status: status::ACTIVE.into(),
            last_login: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            role_name: Some("admin".into()),
            role_description: None,
        }
    }

    #[test]
    fn profile_never_contains_password_hash() {
        let profile = record().into_profile(None);
        let json = serde_json::to_value(&profile).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["username"], "alice");
        assert_eq!(json["role"]["name"], "admin");
    }

    #[test]
    fn non_active_statuses_are_flagged() {
        let mut user = record();
        assert!(user.is_active());
        user.status = status::LOCKED.into();
        assert!(!user.is_active());
        user.status = status::INACTIVE.into();
        assert!(!user.is_active());
    }
}
