use sqlx::{Executor, Row};

use crate::connection::DbPool;
use crate::repositories::RepositoryError;

/// Deterministic catalog fixtures for a fresh installation.
pub struct SeedDataset;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SeedResult {
    pub standards: u32,
    pub advisors: u32,
    pub bank_accounts: u32,
    pub certification_steps: u32,
}

impl SeedDataset {
    pub const SQL: &'static str = include_str!("../../../config/fixtures/seed_data.sql");

    /// Load the fixtures and report how many catalog rows exist afterwards.
    /// Idempotent: reloading replaces rows instead of duplicating them.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;
        tx.execute(sqlx::query(Self::SQL)).await?;
        tx.commit().await?;

        Ok(SeedResult {
            standards: count(pool, "iso_standards").await?,
            advisors: count(pool, "advisors").await?,
            bank_accounts: count(pool, "bank_accounts").await?,
            certification_steps: count(pool, "certification_steps").await?,
        })
    }
}

async fn count(pool: &DbPool, table: &str) -> Result<u32, RepositoryError> {
    // Table names come from the fixed list above, never from input.
    let row = sqlx::query(&format!("SELECT COUNT(*) AS count FROM {table}"))
        .fetch_one(pool)
        .await?;
    Ok(row.get::<i64, _>("count") as u32)
}

#[cfg(test)]
mod tests {
    use crate::{connect_with_settings, migrations};

    use super::SeedDataset;

    #[tokio::test]
    async fn seed_is_idempotent() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("run migrations");

        let first = SeedDataset::load(&pool).await.expect("first load");
        let second = SeedDataset::load(&pool).await.expect("second load");

        assert_eq!(first, second);
        assert_eq!(first.standards, 5);
        assert_eq!(first.certification_steps, 6);
    }
}
