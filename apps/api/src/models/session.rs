use chrono::{DateTime, Utc};
use uuid::Uuid;

/// An authenticated caseworker session, identified by an opaque bearer token.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub token: Uuid,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
