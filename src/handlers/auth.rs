use axum::extract::State;
use axum::http::HeaderMap;
use axum::Extension;
use serde::{Deserialize, Serialize};

use crate::auth::password;
use crate::auth::tokens::TokenPair;
use crate::database::models::user::{NewUser, UserProfile, UserUpdate, DEFAULT_ROLE_ID};
use crate::database::models::user::status as user_status;
use crate::database::Database;
use crate::error::ApiError;
use crate::handlers::Created;
use crate::middleware::auth::{bearer_token, AuthUser};
use crate::middleware::extract::ApiJson;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::state::AppState;
use crate::store::users::UserStore;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: UserProfile,
    pub tokens: TokenPair,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub tokens: TokenPair,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
}

/// POST /api/auth/login - credential check and token issuance.
///
/// Unknown usernames and wrong passwords share one message so the endpoint
/// does not confirm which accounts exist.
pub async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let pool = Database::pool(&state.config.database).await?;
    let users = UserStore::new(pool);

    let user = users
        .find_by_username(&body.username)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid username or password"))?;

    if !user.is_active() {
        return Err(ApiError::unauthorized("Account is disabled or locked"));
    }

    if !password::verify(&body.password, &user.password_hash)? {
        return Err(ApiError::unauthorized("Invalid username or password"));
    }

    // Best-effort: a failed timestamp update must not block the login
    if let Err(e) = users.touch_last_login(user.id).await {
        tracing::warn!(user_id = user.id, "failed to update last login: {}", e);
    }

    let tokens = state.tokens.issue(user.id, &user.username, user.role_name())?;
    tracing::info!(user_id = user.id, username = %user.username, "user logged in");

    Ok(ApiResponse::with_message(
        LoginResponse {
            user: user.into_profile(None),
            tokens,
        },
        "Login successful",
    ))
}

/// POST /api/auth/logout - revoke the presented token.
///
/// Succeeds from the caller's perspective even without a token.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<()> {
    if let Some(token) = bearer_token(&headers) {
        state.tokens.revoke(&token).await;
    }
    Ok(ApiResponse::with_message((), "Logout successful"))
}

/// POST /api/auth/refresh - exchange a refresh token for a new pair.
///
/// The old refresh token stays valid until its natural expiry; rotation is
/// not performed.
pub async fn refresh(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RefreshRequest>,
) -> ApiResult<RefreshResponse> {
    let token = body
        .refresh_token
        .ok_or_else(|| ApiError::unauthorized("Refresh token not provided"))?;

    let claims = state
        .tokens
        .verify_refresh(&token)
        .map_err(|_| ApiError::unauthorized("Invalid refresh token"))?;

    let pool = Database::pool(&state.config.database).await?;
    let users = UserStore::new(pool);
    let user = users
        .find_by_id(claims.user_id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("User not found"))?;

    let tokens = state.tokens.issue(user.id, &user.username, user.role_name())?;
    Ok(ApiResponse::with_message(RefreshResponse { tokens }, "Token refreshed"))
}

/// POST /api/auth/register - create an account with the default role.
pub async fn register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> ApiResult<Created> {
    validate_username(&body.username)?;
    validate_email(&body.email)?;
    validate_password(&body.password)?;

    let pool = Database::pool(&state.config.database).await?;
    let users = UserStore::new(pool);

    if users.find_by_username(&body.username).await?.is_some() {
        return Err(ApiError::bad_request("Username already exists"));
    }

    let password_hash = password::hash(&body.password)?;
    let id = users
        .create(&NewUser {
            username: body.username,
            email: body.email,
            password_hash,
            role_id: DEFAULT_ROLE_ID,
            status: user_status::ACTIVE.to_string(),
        })
        .await?;

    Ok(ApiResponse::with_message(Created { id }, "Registration successful"))
}

/// GET /api/auth/me - current identity with role and permissions.
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<UserProfile> {
    let pool = Database::pool(&state.config.database).await?;
    let users = UserStore::new(pool);

    let user = users
        .find_by_id(auth.user_id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("User not found"))?;
    let permissions = users.permissions(auth.user_id).await?;

    Ok(ApiResponse::success(user.into_profile(Some(permissions))))
}

/// PUT /api/auth/profile - update own profile fields.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(body): ApiJson<UpdateProfileRequest>,
) -> ApiResult<UserProfile> {
    if let Some(email) = &body.email {
        validate_email(email)?;
    }

    let pool = Database::pool(&state.config.database).await?;
    let users = UserStore::new(pool);

    users
        .update(
            auth.user_id,
            &UserUpdate {
                email: body.email,
                ..Default::default()
            },
        )
        .await?;

    let user = users
        .find_by_id(auth.user_id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("User not found"))?;

    Ok(ApiResponse::with_message(user.into_profile(None), "Profile updated"))
}

/// PUT /api/auth/password - verify the current password, then replace it.
pub async fn change_password(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(body): ApiJson<ChangePasswordRequest>,
) -> ApiResult<()> {
    validate_password(&body.new_password)?;

    let pool = Database::pool(&state.config.database).await?;
    let users = UserStore::new(pool);

    let user = users
        .find_by_id(auth.user_id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("User not found"))?;

    if !password::verify(&body.old_password, &user.password_hash)? {
        return Err(ApiError::bad_request("Current password is incorrect"));
    }

    let password_hash = password::hash(&body.new_password)?;
    users
        .update(
            auth.user_id,
            &UserUpdate {
                password_hash: Some(password_hash),
                ..Default::default()
            },
        )
        .await?;

    Ok(ApiResponse::with_message((), "Password changed"))
}

/// POST /api/auth/reset-password - acknowledge a reset request.
///
/// Mail delivery is an external concern; the endpoint intentionally does
/// not reveal whether the address is registered.
pub async fn reset_password(ApiJson(body): ApiJson<ResetPasswordRequest>) -> ApiResult<()> {
    validate_email(&body.email)?;
    tracing::info!(email = %body.email, "password reset requested");
    Ok(ApiResponse::with_message((), "Password reset link sent"))
}

fn validate_username(username: &str) -> Result<(), ApiError> {
    if username.len() < 3 || username.len() > 20 {
        return Err(ApiError::bad_request("Username must be 3-20 characters"));
    }
    if !username.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-') {
        return Err(ApiError::bad_request(
            "Username can only contain letters, numbers, underscore, and hyphen",
        ));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.len() < 6 || password.len() > 20 {
        return Err(ApiError::bad_request("Password must be 6-20 characters"));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), ApiError> {
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || !parts[1].contains('.') {
        return Err(ApiError::bad_request("Invalid email address"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_rules() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("al").is_err());
        assert!(validate_username("a".repeat(21).as_str()).is_err());
        assert!(validate_username("bad name").is_err());
        assert!(validate_username("ok_name-1").is_ok());
    }

    #[test]
    fn password_rules() {
        assert!(validate_password("secret1").is_ok());
        assert!(validate_password("short").is_err());
        assert!(validate_password(&"x".repeat(21)).is_err());
    }

    #[test]
    fn email_rules() {
        assert!(validate_email("alice@example.com").is_ok());
        assert!(validate_email("alice").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("alice@nodot").is_err());
    }
}
