use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, Transaction};

use crate::{config::Config, error::Result, models::*};

#[cfg(test)]
pub mod memory;

/// Read side of the seeded agency/contact tables.
///
/// Window reads return the rows and the total row count observed in the same
/// snapshot.
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    async fn ping(&self) -> Result<()>;

    async fn agencies_window(&self, window: PageWindow) -> Result<(Vec<Agency>, i64)>;

    async fn contacts_window(&self, window: PageWindow) -> Result<(Vec<ContactWithAgency>, i64)>;

    async fn count(&self, kind: EntityKind) -> Result<i64>;
}

/// Per-user, per-day contact view counters.
#[async_trait]
pub trait UsageStore: Send + Sync {
    /// Reads the record without creating it.
    async fn find_usage(&self, user_id: &str, day: NaiveDate) -> Result<Option<UsageRecord>>;

    /// Returns the record for `(user_id, day)`, inserting it with count 0 if absent.
    async fn get_or_create_usage(&self, user_id: &str, day: NaiveDate) -> Result<UsageRecord>;

    /// Adds `by` to the counter in one atomic step, only while the stored count is
    /// below `limit`. Returns the new count, or `None` when the condition failed.
    async fn increment_usage_below(
        &self,
        user_id: &str,
        day: NaiveDate,
        by: i32,
        limit: i32,
    ) -> Result<Option<i32>>;
}

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .connect(&config.database_url)
            .await?;

        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    // Window and count must come from one snapshot.
    async fn begin_snapshot(&self) -> Result<Transaction<'static, Postgres>> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;
        Ok(tx)
    }
}

// ==================== DIRECTORY QUERIES ====================
#[async_trait]
impl DirectoryStore for Database {
    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn agencies_window(&self, window: PageWindow) -> Result<(Vec<Agency>, i64)> {
        let mut tx = self.begin_snapshot().await?;

        let agencies = sqlx::query_as::<_, Agency>(
            "SELECT * FROM agencies
             ORDER BY name ASC, id ASC
             LIMIT $1 OFFSET $2",
        )
        .bind(window.limit)
        .bind(window.offset)
        .fetch_all(&mut *tx)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM agencies")
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok((agencies, total))
    }

    async fn contacts_window(&self, window: PageWindow) -> Result<(Vec<ContactWithAgency>, i64)> {
        let mut tx = self.begin_snapshot().await?;

        let rows = sqlx::query_as::<_, ContactRow>(
            r#"
            SELECT c.*, a.name AS agency_name
            FROM contacts c
            LEFT JOIN agencies a ON a.id = c.agency_id
            ORDER BY c.last_name ASC NULLS LAST, c.id ASC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(window.limit)
        .bind(window.offset)
        .fetch_all(&mut *tx)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM contacts")
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok((rows.into_iter().map(ContactWithAgency::from).collect(), total))
    }

    async fn count(&self, kind: EntityKind) -> Result<i64> {
        let sql = match kind {
            EntityKind::Agencies => "SELECT COUNT(*) FROM agencies",
            EntityKind::Contacts => "SELECT COUNT(*) FROM contacts",
        };
        let total: i64 = sqlx::query_scalar(sql).fetch_one(&self.pool).await?;
        Ok(total)
    }
}

// ==================== USAGE QUERIES ====================
#[async_trait]
impl UsageStore for Database {
    async fn find_usage(&self, user_id: &str, day: NaiveDate) -> Result<Option<UsageRecord>> {
        let usage = sqlx::query_as::<_, UsageRecord>(
            "SELECT * FROM user_usage WHERE user_id = $1 AND day = $2",
        )
        .bind(user_id)
        .bind(day)
        .fetch_optional(&self.pool)
        .await?;
        Ok(usage)
    }

    async fn get_or_create_usage(&self, user_id: &str, day: NaiveDate) -> Result<UsageRecord> {
        sqlx::query(
            "INSERT INTO user_usage (user_id, day, count) VALUES ($1, $2, 0)
             ON CONFLICT (user_id, day) DO NOTHING",
        )
        .bind(user_id)
        .bind(day)
        .execute(&self.pool)
        .await?;

        let usage = sqlx::query_as::<_, UsageRecord>(
            "SELECT * FROM user_usage WHERE user_id = $1 AND day = $2",
        )
        .bind(user_id)
        .bind(day)
        .fetch_one(&self.pool)
        .await?;
        Ok(usage)
    }

    async fn increment_usage_below(
        &self,
        user_id: &str,
        day: NaiveDate,
        by: i32,
        limit: i32,
    ) -> Result<Option<i32>> {
        let count: Option<i32> = sqlx::query_scalar(
            r#"
            UPDATE user_usage
            SET count = count + $3,
                updated_at = NOW()
            WHERE user_id = $1 AND day = $2 AND count < $4
            RETURNING count
            "#,
        )
        .bind(user_id)
        .bind(day)
        .bind(by)
        .bind(limit)
        .fetch_optional(&self.pool)
        .await?;
        Ok(count)
    }
}
