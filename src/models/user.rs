use chrono::{DateTime, Utc};
use serde::Serialize;

/// A full user row as stored in the database.
#[derive(Debug, Clone)]
pub struct UserRecord {
    /// The unique identifier for the user.
    pub id: i64,
    /// The user's username.
    pub username: String,
    /// The user's email address.
    pub email: Option<String>,
    /// The user's hashed password.
    pub password: String,
    /// The IDs of the roles granted to the user.
    pub role_ids: Vec<i64>,
    /// The timestamp when the user was created.
    pub created_at: DateTime<Utc>,
    /// Whether the user is active.
    pub is_active: bool,
}

/// The resolved, authenticated user for one request.
///
/// Materialized from the user store at most once per request and cached on
/// the request scope; never shared across requests. The password hash is
/// deliberately not carried here.
#[derive(Debug, Clone, Serialize)]
pub struct Principal {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    pub role_ids: Vec<i64>,
    pub created_at: DateTime<Utc>,
}

impl From<UserRecord> for Principal {
    fn from(user: UserRecord) -> Self {
        Principal {
            id: user.id,
            username: user.username,
            email: user.email,
            role_ids: user.role_ids,
            created_at: user.created_at,
        }
    }
}
