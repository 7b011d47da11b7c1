use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::revocation::RevocationList;
use crate::config::JwtConfig;

/// Claims embedded in a signed access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessClaims {
    pub user_id: i64,
    pub username: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

/// Refresh tokens carry only the user id; the user record is re-read on
/// refresh so role or status changes take effect.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshClaims {
    pub user_id: i64,
    pub iat: i64,
    pub exp: i64,
}

/// Token pair returned by login and refresh. `expires_in` is the access
/// token lifetime in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,

    #[error("invalid token")]
    Invalid,

    #[error("token has been revoked")]
    Revoked,

    #[error("token signing failed: {0}")]
    Signing(jsonwebtoken::errors::Error),
}

/// Issues and verifies signed bearer tokens. Signing is stateless; the only
/// owned state is the revocation list consulted on every verification.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_ttl: Duration,
    refresh_ttl: Duration,
    revoked: RevocationList,
}

impl TokenService {
    pub fn new(secret: &str, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        let mut validation = Validation::default();
        // Expiry is exact; the default 60s leeway would keep freshly expired
        // tokens alive past their advertised lifetime.
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            access_ttl,
            refresh_ttl,
            revoked: RevocationList::default(),
        }
    }

    pub fn from_config(jwt: &JwtConfig) -> Self {
        Self::new(
            &jwt.secret,
            Duration::minutes(jwt.access_expiry_minutes),
            Duration::days(jwt.refresh_expiry_days),
        )
    }

    /// Sign a new access/refresh pair for the given identity.
    pub fn issue(&self, user_id: i64, username: &str, role: &str) -> Result<TokenPair, TokenError> {
        let now = Utc::now();

        let access = AccessClaims {
            user_id,
            username: username.to_string(),
            role: role.to_string(),
            iat: now.timestamp(),
            exp: (now + self.access_ttl).timestamp(),
        };
        let access_token =
            encode(&Header::default(), &access, &self.encoding_key).map_err(TokenError::Signing)?;

        let refresh = RefreshClaims {
            user_id,
            iat: now.timestamp(),
            exp: (now + self.refresh_ttl).timestamp(),
        };
        let refresh_token =
            encode(&Header::default(), &refresh, &self.encoding_key).map_err(TokenError::Signing)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            expires_in: self.access_ttl.num_seconds(),
        })
    }

    /// Validate signature and expiry, then consult the revocation list.
    /// A token revoked via logout fails here even before natural expiry.
    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, TokenError> {
        let claims = self.decode_access(token)?;
        if self.revoked.contains(token) {
            return Err(TokenError::Revoked);
        }
        Ok(claims)
    }

    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, TokenError> {
        decode::<RefreshClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(map_decode_error)
    }

    /// Tombstone an access token for the remainder of its natural lifetime.
    /// Tokens that fail to decode (or are already expired) are ignored, so
    /// logout never fails from the caller's perspective.
    pub async fn revoke(&self, token: &str) {
        let Ok(claims) = self.decode_access(token) else {
            return;
        };

        let remaining = claims.exp - Utc::now().timestamp();
        let ttl = std::time::Duration::from_secs(remaining.max(0) as u64);
        self.revoked.revoke(token, ttl).await;
    }

    fn decode_access(&self, token: &str) -> Result<AccessClaims, TokenError> {
        decode::<AccessClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(map_decode_error)
    }
}

fn map_decode_error(err: jsonwebtoken::errors::Error) -> TokenError {
    match err.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Invalid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new("test-secret", Duration::minutes(30), Duration::days(7))
    }

    #[test]
    fn issue_then_verify_round_trips_identity() {
        let tokens = service();
        let pair = tokens.issue(7, "alice", "admin").unwrap();

        let claims = tokens.verify_access(&pair.access_token).unwrap();
        assert_eq!(claims.user_id, 7);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.role, "admin");
        assert_eq!(pair.expires_in, 30 * 60);
    }

    #[test]
    fn refresh_token_decodes_to_issuing_user() {
        let tokens = service();
        let pair = tokens.issue(42, "bob", "user").unwrap();

        let claims = tokens.verify_refresh(&pair.refresh_token).unwrap();
        assert_eq!(claims.user_id, 42);
    }

    #[test]
    fn garbage_and_tampered_tokens_are_rejected() {
        let tokens = service();
        assert!(matches!(tokens.verify_access("not-a-jwt"), Err(TokenError::Invalid)));

        let pair = tokens.issue(1, "alice", "user").unwrap();
        let other = TokenService::new("other-secret", Duration::minutes(30), Duration::days(7));
        assert!(other.verify_access(&pair.access_token).is_err());
    }

    #[tokio::test]
    async fn expired_token_fails_verification() {
        let tokens = TokenService::new("test-secret", Duration::seconds(0), Duration::days(7));
        let pair = tokens.issue(1, "alice", "user").unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(1100)).await;
        assert!(matches!(
            tokens.verify_access(&pair.access_token),
            Err(TokenError::Expired)
        ));
    }

    #[tokio::test]
    async fn revoked_token_fails_before_natural_expiry() {
        let tokens = service();
        let pair = tokens.issue(7, "alice", "admin").unwrap();
        assert!(tokens.verify_access(&pair.access_token).is_ok());

        tokens.revoke(&pair.access_token).await;
        assert!(matches!(
            tokens.verify_access(&pair.access_token),
            Err(TokenError::Revoked)
        ));
    }

    #[tokio::test]
    async fn revoking_garbage_is_a_no_op() {
        let tokens = service();
        tokens.revoke("not-a-jwt").await;
        // Nothing to assert beyond not panicking; logout must always succeed.
    }
}
