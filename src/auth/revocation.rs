use std::time::{Duration, Instant};

use moka::future::Cache;
use moka::Expiry;

/// Per-entry expiry: each tombstone carries its own time-to-live, equal to
/// the revoked token's remaining validity at the time of logout.
struct TombstoneExpiry;

impl Expiry<String, Duration> for TombstoneExpiry {
    fn expire_after_create(&self, _key: &String, ttl: &Duration, _created_at: Instant) -> Option<Duration> {
        Some(*ttl)
    }
}

/// In-process revocation list for access tokens, keyed by the raw token
/// string. Entries never outlive the token's natural expiry: once the TTL
/// elapses the signature check alone is sufficient again.
///
/// Single-process and volatile; revocations are lost on restart, at which
/// point only unexpired tokens signed with the current secret are accepted
/// anyway.
#[derive(Clone)]
pub struct RevocationList {
    tombstones: Cache<String, Duration>,
}

impl RevocationList {
    pub fn new(max_entries: u64) -> Self {
        let tombstones = Cache::builder()
            .max_capacity(max_entries)
            .expire_after(TombstoneExpiry)
            .build();

        Self { tombstones }
    }

    /// Insert a tombstone for `token` that lives for `ttl`.
    pub async fn revoke(&self, token: &str, ttl: Duration) {
        if ttl.is_zero() {
            // Already past natural expiry; verification rejects it regardless.
            return;
        }
        self.tombstones.insert(token.to_string(), ttl).await;
        tracing::debug!("revoked token (ttl {:?})", ttl);
    }

    pub fn contains(&self, token: &str) -> bool {
        self.tombstones.contains_key(token)
    }

    pub fn len(&self) -> u64 {
        self.tombstones.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for RevocationList {
    fn default() -> Self {
        Self::new(100_000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn revoke_then_lookup_round_trip() {
        let list = RevocationList::default();
        assert!(!list.contains("some.jwt.token"));

        list.revoke("some.jwt.token", Duration::from_secs(60)).await;
        assert!(list.contains("some.jwt.token"));
        assert!(!list.contains("another.jwt.token"));
    }

    #[tokio::test]
    async fn tombstone_expires_with_token_lifetime() {
        let list = RevocationList::default();
        list.revoke("short.lived.token", Duration::from_millis(50)).await;
        assert!(list.contains("short.lived.token"));

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(!list.contains("short.lived.token"));
    }

    #[tokio::test]
    async fn zero_ttl_is_not_stored() {
        let list = RevocationList::default();
        list.revoke("expired.token", Duration::ZERO).await;
        assert!(!list.contains("expired.token"));
    }
}
