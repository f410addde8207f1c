use async_trait::async_trait;
use deadpool_postgres::Pool;
use tokio_postgres::Row;

use crate::{
    error::{AppError, Result},
    models::user::UserRecord,
};

/// The persistent user store consumed by the auth pipeline.
///
/// A trait so the resolver and handlers can be exercised against in-memory
/// doubles; the production implementation is [`PgUserStore`].
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fetches an active user by id. `None` if the id no longer exists.
    async fn get_user_by_id(&self, id: i64) -> Result<Option<UserRecord>>;

    /// Fetches an active user by username.
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>>;

    /// Inserts a new user and returns the stored row.
    async fn create_user(
        &self,
        username: String,
        email: Option<String>,
        password_hash: String,
    ) -> Result<UserRecord>;
}

/// A helper function to map a `tokio_postgres::Row` to a `UserRecord`.
fn row_to_user(row: &Row) -> Result<UserRecord> {
    let get = |column: &str| AppError::MissingData(column.to_string());
    Ok(UserRecord {
        id: row.try_get("id").map_err(|_| get("id"))?,
        username: row.try_get("username").map_err(|_| get("username"))?,
        email: row.try_get("email").map_err(|_| get("email"))?,
        password: row.try_get("password").map_err(|_| get("password"))?,
        role_ids: row.try_get("role_ids").map_err(|_| get("role_ids"))?,
        created_at: row.try_get("created_at").map_err(|_| get("created_at"))?,
        is_active: row.try_get("is_active").map_err(|_| get("is_active"))?,
    })
}

/// The PostgreSQL-backed user store.
pub struct PgUserStore {
    pool: Pool,
}

impl PgUserStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn get_user_by_id(&self, id: i64) -> Result<Option<UserRecord>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                r#"
                SELECT id, username, email, password, role_ids, created_at, is_active
                FROM users
                WHERE id = $1 AND is_active = true
                "#,
                &[&id],
            )
            .await?;
        row.map(|r| row_to_user(&r)).transpose()
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                r#"
                SELECT id, username, email, password, role_ids, created_at, is_active
                FROM users
                WHERE username = $1 AND is_active = true
                "#,
                &[&username],
            )
            .await?;
        row.map(|r| row_to_user(&r)).transpose()
    }

    async fn create_user(
        &self,
        username: String,
        email: Option<String>,
        password_hash: String,
    ) -> Result<UserRecord> {
        let client = self.pool.get().await?;
        let row = client
            .query_one(
                r#"
                INSERT INTO users (username, email, password)
                VALUES ($1, $2, $3)
                RETURNING id, username, email, password, role_ids, created_at, is_active
                "#,
                &[&username, &email, &password_hash],
            )
            .await?;
        row_to_user(&row)
    }
}
