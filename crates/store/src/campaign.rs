//! Campaign store: content plus publish state.

use {
    anyhow::Result,
    async_trait::async_trait,
    sqlx::SqlitePool,
    std::str::FromStr,
    vetrina_publish::Platform,
};

use crate::{
    schema::now_secs,
    types::{Campaign, CampaignStatus},
};

/// Persistence contract for campaigns.
#[async_trait]
pub trait CampaignStore: Send + Sync {
    async fn get(&self, campaign_id: &str) -> Result<Option<Campaign>>;

    async fn upsert(&self, campaign: &Campaign) -> Result<()>;

    /// Record a successful publish: post id, `published_to_instagram`, and
    /// status move in one compare-and-set write guarded by
    /// `published_to_instagram = 0`.
    ///
    /// Returns `false` when no row transitioned — either the campaign is
    /// gone or another writer already published it. The caller must treat
    /// that as a conflict, never overwrite.
    async fn mark_published(&self, campaign_id: &str, post_id: &str) -> Result<bool>;
}

/// Internal row type for sqlx mapping.
#[derive(sqlx::FromRow)]
struct CampaignRow {
    id: String,
    user_id: String,
    headline: String,
    body: String,
    cta: String,
    hashtags: String,
    image_url: Option<String>,
    platform: String,
    status: String,
    published_to_instagram: i64,
    instagram_post_id: Option<String>,
}

impl TryFrom<CampaignRow> for Campaign {
    type Error = anyhow::Error;

    fn try_from(r: CampaignRow) -> Result<Self> {
        Ok(Self {
            id: r.id,
            user_id: r.user_id,
            headline: r.headline,
            body: r.body,
            cta: r.cta,
            hashtags: serde_json::from_str(&r.hashtags)?,
            image_url: r.image_url,
            platform: Platform::from_str(&r.platform).map_err(anyhow::Error::msg)?,
            status: CampaignStatus::from_str(&r.status).map_err(anyhow::Error::msg)?,
            published_to_instagram: r.published_to_instagram != 0,
            instagram_post_id: r.instagram_post_id,
        })
    }
}

/// SQLite-backed campaign store.
pub struct SqliteCampaignStore {
    pool: SqlitePool,
}

impl SqliteCampaignStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CampaignStore for SqliteCampaignStore {
    async fn get(&self, campaign_id: &str) -> Result<Option<Campaign>> {
        let row = sqlx::query_as::<_, CampaignRow>(
            "SELECT id, user_id, headline, body, cta, hashtags, image_url, platform,
                    status, published_to_instagram, instagram_post_id
             FROM campaigns WHERE id = ?",
        )
        .bind(campaign_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(TryInto::try_into).transpose()
    }

    async fn upsert(&self, campaign: &Campaign) -> Result<()> {
        let hashtags = serde_json::to_string(&campaign.hashtags)?;
        let now = now_secs();
        sqlx::query(
            r#"INSERT INTO campaigns
                 (id, user_id, headline, body, cta, hashtags, image_url, platform,
                  status, published_to_instagram, instagram_post_id, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
               ON CONFLICT(id) DO UPDATE SET
                 headline = excluded.headline,
                 body = excluded.body,
                 cta = excluded.cta,
                 hashtags = excluded.hashtags,
                 image_url = excluded.image_url,
                 platform = excluded.platform,
                 status = excluded.status,
                 published_to_instagram = excluded.published_to_instagram,
                 instagram_post_id = excluded.instagram_post_id,
                 updated_at = excluded.updated_at"#,
        )
        .bind(&campaign.id)
        .bind(&campaign.user_id)
        .bind(&campaign.headline)
        .bind(&campaign.body)
        .bind(&campaign.cta)
        .bind(&hashtags)
        .bind(&campaign.image_url)
        .bind(campaign.platform.as_str())
        .bind(campaign.status.as_str())
        .bind(i64::from(campaign.published_to_instagram))
        .bind(&campaign.instagram_post_id)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn mark_published(&self, campaign_id: &str, post_id: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE campaigns SET
                published_to_instagram = 1,
                instagram_post_id = ?,
                status = 'published',
                updated_at = ?
             WHERE id = ? AND published_to_instagram = 0",
        )
        .bind(post_id)
        .bind(now_secs())
        .bind(campaign_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}
