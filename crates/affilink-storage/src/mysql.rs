use affilink_core::repository::{
    CatalogRepository, ClickRepository, LinkRepository, ReadRepository, Result,
};
use affilink_core::{
    Campaign, CampaignId, Click, ClientHash, Link, LinkId, LinkKey, LinkSummary, Marketplace,
    NewClick, Offer, ProductId, ShortCode, StorageError,
};
use async_trait::async_trait;
use jiff::Timestamp;
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};
use std::str::FromStr;
use tracing::debug;

/// Table definitions, in dependency order.
pub const SCHEMA: [&str; 4] = [
    include_str!("../ddl/mysql/campaigns.sql"),
    include_str!("../ddl/mysql/offers.sql"),
    include_str!("../ddl/mysql/links.sql"),
    include_str!("../ddl/mysql/clicks.sql"),
];

/// MySQL implementation of the store contracts.
///
/// Identifiers are stored as hyphenated UUID strings and timestamps as
/// unix milliseconds. Deleting a link removes its clicks through the
/// `fk_clicks_link` cascade.
#[derive(Debug, Clone)]
pub struct MySqlRepository {
    pool: MySqlPool,
}

impl MySqlRepository {
    /// Creates a repository from an existing MySQL connection pool.
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Creates a repository by opening a new MySQL connection pool.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = MySqlPool::connect(database_url)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self::new(pool))
    }

    /// Creates any missing tables. Safe to run on every start.
    pub async fn ensure_schema(&self) -> Result<()> {
        for ddl in SCHEMA {
            sqlx::query(ddl)
                .execute(&self.pool)
                .await
                .map_err(map_sqlx_error)?;
        }
        debug!("MySQL schema is up to date");
        Ok(())
    }

    /// Adds or replaces an offer in the catalog.
    pub async fn put_offer(&self, offer: &Offer) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO offers (product_id, marketplace, store_name, external_url)
            VALUES (?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE store_name = VALUES(store_name),
                                    external_url = VALUES(external_url)
            "#,
        )
        .bind(offer.product_id.to_string())
        .bind(offer.marketplace.as_str())
        .bind(&offer.store_name)
        .bind(&offer.external_url)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }

    /// Adds or replaces a campaign in the catalog.
    pub async fn put_campaign(&self, campaign: &Campaign) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO campaigns
                (id, name, slug, utm_campaign, utm_source, utm_medium, is_active)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE name = VALUES(name),
                                    utm_campaign = VALUES(utm_campaign),
                                    utm_source = VALUES(utm_source),
                                    utm_medium = VALUES(utm_medium),
                                    is_active = VALUES(is_active)
            "#,
        )
        .bind(campaign.id.to_string())
        .bind(&campaign.name)
        .bind(&campaign.slug)
        .bind(&campaign.utm_campaign)
        .bind(campaign.utm_source.as_deref())
        .bind(campaign.utm_medium.as_deref())
        .bind(campaign.is_active)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }

    /// Returns a reference to the underlying pool.
    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(sqlx::error::DatabaseError::is_unique_violation)
}

fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StorageError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StorageError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::RowNotFound => StorageError::InvalidData(message),
        _ => StorageError::Query(message),
    }
}

fn parse_column<T>(row: &MySqlRow, column: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw: String = row.try_get(column).map_err(map_sqlx_error)?;
    raw.parse::<T>().map_err(|e| {
        StorageError::InvalidData(format!("invalid {column} '{raw}': {e}"))
    })
}

fn timestamp_column(row: &MySqlRow, column: &str) -> Result<Timestamp> {
    let millis: i64 = row.try_get(column).map_err(map_sqlx_error)?;
    Timestamp::from_millisecond(millis).map_err(|e| {
        StorageError::InvalidData(format!("invalid {column} timestamp '{millis}': {e}"))
    })
}

fn link_from_row(row: &MySqlRow) -> Result<Link> {
    let short_code: String = row.try_get("short_code").map_err(map_sqlx_error)?;
    Ok(Link {
        id: parse_column::<LinkId>(row, "id")?,
        product_id: parse_column::<ProductId>(row, "product_id")?,
        campaign_id: parse_column::<CampaignId>(row, "campaign_id")?,
        marketplace: parse_column::<Marketplace>(row, "marketplace")?,
        short_code: ShortCode::new_unchecked(short_code),
        target_url: row.try_get("target_url").map_err(map_sqlx_error)?,
        created_at: timestamp_column(row, "created_at")?,
        updated_at: timestamp_column(row, "updated_at")?,
    })
}

const CAMPAIGN_COLUMNS: &str =
    "id, name, slug, utm_campaign, utm_source, utm_medium, is_active";

fn campaign_from_row(row: &MySqlRow) -> Result<Campaign> {
    Ok(Campaign {
        id: parse_column(row, "id")?,
        name: row.try_get("name").map_err(map_sqlx_error)?,
        slug: row.try_get("slug").map_err(map_sqlx_error)?,
        utm_campaign: row.try_get("utm_campaign").map_err(map_sqlx_error)?,
        utm_source: row.try_get("utm_source").map_err(map_sqlx_error)?,
        utm_medium: row.try_get("utm_medium").map_err(map_sqlx_error)?,
        is_active: row.try_get("is_active").map_err(map_sqlx_error)?,
    })
}

const LINK_COLUMNS: &str = "id, product_id, campaign_id, marketplace, short_code, target_url, \
                            created_at, updated_at";

#[async_trait]
impl ReadRepository for MySqlRepository {
    async fn get_by_short_code(&self, code: &ShortCode) -> Result<Option<Link>> {
        let sql = format!("SELECT {LINK_COLUMNS} FROM links WHERE short_code = ? LIMIT 1");
        let row = sqlx::query(&sql)
            .bind(code.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.as_ref().map(link_from_row).transpose()
    }

    async fn get_link(&self, id: LinkId) -> Result<Option<Link>> {
        let sql = format!("SELECT {LINK_COLUMNS} FROM links WHERE id = ? LIMIT 1");
        let row = sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.as_ref().map(link_from_row).transpose()
    }
}

#[async_trait]
impl LinkRepository for MySqlRepository {
    async fn find_by_key(&self, key: &LinkKey) -> Result<Option<Link>> {
        let sql = format!(
            "SELECT {LINK_COLUMNS} FROM links \
             WHERE product_id = ? AND campaign_id = ? AND marketplace = ? LIMIT 1"
        );
        let row = sqlx::query(&sql)
            .bind(key.product_id.to_string())
            .bind(key.campaign_id.to_string())
            .bind(key.marketplace.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.as_ref().map(link_from_row).transpose()
    }

    async fn insert_link(&self, link: &Link) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO links
                (id, product_id, campaign_id, marketplace, short_code, target_url,
                 created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(link.id.to_string())
        .bind(link.product_id.to_string())
        .bind(link.campaign_id.to_string())
        .bind(link.marketplace.as_str())
        .bind(link.short_code.as_str())
        .bind(&link.target_url)
        .bind(link.created_at.as_millisecond())
        .bind(link.updated_at.as_millisecond())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(err) if is_unique_violation(&err) => Err(StorageError::Conflict(format!(
                "link '{}' collides with an existing code or key",
                link.short_code
            ))),
            Err(err) => Err(map_sqlx_error(err)),
        }
    }

    async fn delete_link(&self, id: LinkId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM links WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_links(&self, campaign_id: Option<CampaignId>) -> Result<Vec<LinkSummary>> {
        let campaign_id = campaign_id.map(|id| id.to_string());

        let rows = sqlx::query(
            r#"
            SELECT l.id, l.product_id, l.campaign_id, l.marketplace, l.short_code,
                   l.target_url, l.created_at, l.updated_at,
                   COUNT(c.id) AS click_count
            FROM links l
            LEFT JOIN clicks c ON c.link_id = l.id
            WHERE (? IS NULL OR l.campaign_id = ?)
            GROUP BY l.id
            ORDER BY l.created_at DESC
            "#,
        )
        .bind(campaign_id.as_deref())
        .bind(campaign_id.as_deref())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.iter()
            .map(|row| {
                let click_count: i64 = row.try_get("click_count").map_err(map_sqlx_error)?;
                Ok(LinkSummary {
                    link: link_from_row(row)?,
                    click_count: click_count.max(0) as u64,
                })
            })
            .collect()
    }
}

#[async_trait]
impl ClickRepository for MySqlRepository {
    async fn insert_click(&self, click: NewClick) -> Result<Click> {
        let result = sqlx::query(
            r#"
            INSERT INTO clicks (link_id, clicked_at, referrer, user_agent, client_hash)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(click.link_id.to_string())
        .bind(click.timestamp.as_millisecond())
        .bind(click.referrer.as_deref())
        .bind(click.user_agent.as_deref())
        .bind(click.client_hash.as_ref().map(ClientHash::as_str))
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(Click::from_new(result.last_insert_id(), click))
    }

    async fn count_clicks(&self, link_id: LinkId) -> Result<u64> {
        let count: i64 = sqlx::query("SELECT COUNT(*) AS n FROM clicks WHERE link_id = ?")
            .bind(link_id.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?
            .try_get("n")
            .map_err(map_sqlx_error)?;

        Ok(count.max(0) as u64)
    }

    async fn click_times_since(&self, since: Timestamp) -> Result<Vec<Timestamp>> {
        let rows = sqlx::query("SELECT clicked_at FROM clicks WHERE clicked_at >= ?")
            .bind(since.as_millisecond())
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        rows.iter()
            .map(|row| timestamp_column(row, "clicked_at"))
            .collect()
    }
}

#[async_trait]
impl CatalogRepository for MySqlRepository {
    async fn find_offer(
        &self,
        product_id: ProductId,
        marketplace: Marketplace,
    ) -> Result<Option<Offer>> {
        let row = sqlx::query(
            r#"
            SELECT product_id, marketplace, store_name, external_url
            FROM offers
            WHERE product_id = ? AND marketplace = ?
            LIMIT 1
            "#,
        )
        .bind(product_id.to_string())
        .bind(marketplace.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(Offer {
            product_id: parse_column(&row, "product_id")?,
            marketplace: parse_column(&row, "marketplace")?,
            store_name: row.try_get("store_name").map_err(map_sqlx_error)?,
            external_url: row.try_get("external_url").map_err(map_sqlx_error)?,
        }))
    }

    async fn get_campaign(&self, id: CampaignId) -> Result<Option<Campaign>> {
        let sql = format!("SELECT {CAMPAIGN_COLUMNS} FROM campaigns WHERE id = ? LIMIT 1");
        let row = sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.as_ref().map(campaign_from_row).transpose()
    }

    async fn list_active_campaigns(&self) -> Result<Vec<Campaign>> {
        let sql = format!(
            "SELECT {CAMPAIGN_COLUMNS} FROM campaigns WHERE is_active = TRUE ORDER BY name"
        );
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        rows.iter().map(campaign_from_row).collect()
    }
}
