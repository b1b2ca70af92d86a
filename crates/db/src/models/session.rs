use shopforge_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A refresh-token session. Refreshing revokes the row and inserts its
/// successor with `rotated_from` pointing back.
#[derive(Debug, Clone, FromRow)]
pub struct UserSession {
    pub id: DbId,
    pub user_id: DbId,
    pub refresh_token_hash: String,
    pub rotated_from: Option<DbId>,
    pub expires_at: Timestamp,
    pub revoked_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl UserSession {
    pub fn is_usable(&self, now: Timestamp) -> bool {
        self.revoked_at.is_none() && self.expires_at > now
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;

    fn session(expires_in: Duration, revoked: bool) -> UserSession {
        let now = Utc::now();
        UserSession {
            id: 1,
            user_id: 2,
            refresh_token_hash: "h".into(),
            rotated_from: None,
            expires_at: now + expires_in,
            revoked_at: revoked.then_some(now),
            created_at: now,
        }
    }

    #[test]
    fn only_open_unexpired_sessions_are_usable() {
        let now = Utc::now();
        assert!(session(Duration::days(1), false).is_usable(now));
        assert!(!session(Duration::days(1), true).is_usable(now));
        assert!(!session(Duration::seconds(-1), false).is_usable(now));
    }
}
