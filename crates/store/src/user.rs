//! User store: connection lifecycle per provider.

use {anyhow::Result, async_trait::async_trait, sqlx::SqlitePool, vetrina_oauth::Provider};

use crate::{
    schema::now_secs,
    types::{Connection, User},
};

/// Persistence contract for users.
///
/// Connection transitions are single atomic writes: both the `connected`
/// flag and the credential fields change together or not at all.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get(&self, user_id: &str) -> Result<Option<User>>;

    /// Create a user row if it doesn't exist.
    async fn create(&self, user_id: &str) -> Result<()>;

    /// Record a successful connection: encrypted token blob, account id,
    /// and the `connected` flag in one write. Overwrites any previous
    /// credential (reconnect).
    async fn set_connected(
        &self,
        user_id: &str,
        provider: Provider,
        token_blob: &str,
        account_id: &str,
        username: &str,
    ) -> Result<()>;

    /// Clear the connection. Idempotent: clearing an already-disconnected
    /// provider is a successful no-op.
    async fn clear_connection(&self, user_id: &str, provider: Provider) -> Result<()>;
}

/// Internal row type for sqlx mapping.
#[derive(sqlx::FromRow)]
struct UserRow {
    id: String,
    instagram_connected: i64,
    instagram_token: Option<String>,
    instagram_account_id: Option<String>,
    instagram_username: Option<String>,
    shopify_connected: i64,
    shopify_token: Option<String>,
    shopify_account_id: Option<String>,
    shopify_username: Option<String>,
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        Self {
            id: r.id,
            instagram: Connection {
                connected: r.instagram_connected != 0,
                access_token: r.instagram_token,
                account_id: r.instagram_account_id,
                username: r.instagram_username,
            },
            shopify: Connection {
                connected: r.shopify_connected != 0,
                access_token: r.shopify_token,
                account_id: r.shopify_account_id,
                username: r.shopify_username,
            },
        }
    }
}

/// SQLite-backed user store.
pub struct SqliteUserStore {
    pool: SqlitePool,
}

impl SqliteUserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn column_prefix(provider: Provider) -> &'static str {
    match provider {
        Provider::Instagram => "instagram",
        Provider::Shopify => "shopify",
    }
}

#[async_trait]
impl UserStore for SqliteUserStore {
    async fn get(&self, user_id: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, instagram_connected, instagram_token, instagram_account_id,
                    instagram_username, shopify_connected, shopify_token,
                    shopify_account_id, shopify_username
             FROM users WHERE id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn create(&self, user_id: &str) -> Result<()> {
        let now = now_secs();
        sqlx::query(
            "INSERT INTO users (id, created_at, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(id) DO NOTHING",
        )
        .bind(user_id)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn set_connected(
        &self,
        user_id: &str,
        provider: Provider,
        token_blob: &str,
        account_id: &str,
        username: &str,
    ) -> Result<()> {
        let p = column_prefix(provider);
        let result = sqlx::query(&format!(
            "UPDATE users SET
                {p}_connected = 1,
                {p}_token = ?,
                {p}_account_id = ?,
                {p}_username = ?,
                updated_at = ?
             WHERE id = ?"
        ))
        .bind(token_blob)
        .bind(account_id)
        .bind(username)
        .bind(now_secs())
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            anyhow::bail!("unknown user: {user_id}");
        }
        Ok(())
    }

    async fn clear_connection(&self, user_id: &str, provider: Provider) -> Result<()> {
        let p = column_prefix(provider);
        sqlx::query(&format!(
            "UPDATE users SET
                {p}_connected = 0,
                {p}_token = NULL,
                {p}_account_id = NULL,
                {p}_username = NULL,
                updated_at = ?
             WHERE id = ?"
        ))
        .bind(now_secs())
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
