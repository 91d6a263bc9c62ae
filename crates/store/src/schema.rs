//! Table setup for the sqlite stores.

use {anyhow::Result, sqlx::SqlitePool};

/// Create the `users` and `campaigns` tables if they don't exist.
///
/// Called once at startup, and by tests against in-memory pools.
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS users (
            id                   TEXT    PRIMARY KEY,
            instagram_connected  INTEGER NOT NULL DEFAULT 0,
            instagram_token      TEXT,
            instagram_account_id TEXT,
            instagram_username   TEXT,
            shopify_connected    INTEGER NOT NULL DEFAULT 0,
            shopify_token        TEXT,
            shopify_account_id   TEXT,
            shopify_username     TEXT,
            created_at           INTEGER NOT NULL,
            updated_at           INTEGER NOT NULL
        )"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS campaigns (
            id                     TEXT    PRIMARY KEY,
            user_id                TEXT    NOT NULL,
            headline               TEXT    NOT NULL DEFAULT '',
            body                   TEXT    NOT NULL DEFAULT '',
            cta                    TEXT    NOT NULL DEFAULT '',
            hashtags               TEXT    NOT NULL DEFAULT '[]',
            image_url              TEXT,
            platform               TEXT    NOT NULL,
            status                 TEXT    NOT NULL DEFAULT 'draft',
            published_to_instagram INTEGER NOT NULL DEFAULT 0,
            instagram_post_id      TEXT,
            created_at             INTEGER NOT NULL,
            updated_at             INTEGER NOT NULL
        )"#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub(crate) fn now_secs() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}
