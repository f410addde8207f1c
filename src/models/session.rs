use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The server-side value a session key maps to.
///
/// Created at login, read on every cookie-bearing request, removed on logout
/// or once `expires_at` has passed. The user id is only guaranteed to have
/// been valid at creation time; the resolver re-fetches the user record on
/// every cache miss.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    /// The ID of the user this session belongs to.
    pub user_id: i64,
    /// The timestamp when the session was created.
    pub created_at: DateTime<Utc>,
    /// The timestamp when the session expires.
    pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}
