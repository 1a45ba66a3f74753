use std::str::FromStr;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use cotiza_core::domain::catalog::{
    AccountCurrency, Advisor, AdvisorId, BankAccount, BankAccountId, CertificationStep,
    IsoStandard, StandardId,
};

use super::{CatalogRepository, RepositoryError};
use crate::DbPool;

pub struct SqlCatalogRepository {
    pool: DbPool,
}

impl SqlCatalogRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogRepository for SqlCatalogRepository {
    async fn list_standards(&self) -> Result<Vec<IsoStandard>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM iso_standards ORDER BY code")
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(map_standard_row).collect()
    }

    async fn find_standard(
        &self,
        id: &StandardId,
    ) -> Result<Option<IsoStandard>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM iso_standards WHERE id = ?1")
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;
        row.map(map_standard_row).transpose()
    }

    async fn list_advisors(&self) -> Result<Vec<Advisor>, RepositoryError> {
        let rows =
            sqlx::query("SELECT * FROM advisors ORDER BY name").fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(map_advisor_row).collect())
    }

    async fn find_advisor(&self, id: &AdvisorId) -> Result<Option<Advisor>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM advisors WHERE id = ?1")
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(map_advisor_row))
    }

    async fn list_bank_accounts(&self) -> Result<Vec<BankAccount>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM bank_accounts ORDER BY bank_name, currency")
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(map_bank_account_row).collect()
    }

    async fn list_certification_steps(&self) -> Result<Vec<CertificationStep>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM certification_steps ORDER BY step_order")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|row| CertificationStep {
                id: row.get("id"),
                step_order: row.get::<i64, _>("step_order") as u32,
                title: row.get("title"),
            })
            .collect())
    }
}

fn decode_decimal(row: &SqliteRow, column: &str) -> Result<Decimal, RepositoryError> {
    let raw: String = row.get(column);
    Decimal::from_str(&raw)
        .map_err(|error| RepositoryError::Decode(format!("column {column}: {error}")))
}

fn map_standard_row(row: SqliteRow) -> Result<IsoStandard, RepositoryError> {
    Ok(IsoStandard {
        id: StandardId(row.get("id")),
        code: row.get("code"),
        name: row.get("name"),
        description: row.get("description"),
        certification_price: decode_decimal(&row, "certification_price")?,
        follow_up_price: decode_decimal(&row, "follow_up_price")?,
        recertification_price: decode_decimal(&row, "recertification_price")?,
    })
}

fn map_advisor_row(row: SqliteRow) -> Advisor {
    Advisor {
        id: AdvisorId(row.get("id")),
        name: row.get("name"),
        email: row.get("email"),
        phone: row.get("phone"),
    }
}

fn map_bank_account_row(row: SqliteRow) -> Result<BankAccount, RepositoryError> {
    let currency_raw: String = row.get("currency");
    Ok(BankAccount {
        id: BankAccountId(row.get("id")),
        bank_name: row.get("bank_name"),
        account_holder: row.get("account_holder"),
        account_number: row.get("account_number"),
        cci: row.get("cci"),
        currency: currency_raw.parse::<AccountCurrency>().map_err(RepositoryError::Decode)?,
        logo: row.get("logo"),
    })
}

#[cfg(test)]
mod tests {
    use cotiza_core::domain::catalog::{AccountCurrency, StandardId};

    use crate::fixtures::SeedDataset;
    use crate::repositories::CatalogRepository;
    use crate::{connect_with_settings, migrations};

    use super::SqlCatalogRepository;

    async fn seeded_repository() -> SqlCatalogRepository {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("run migrations");
        SeedDataset::load(&pool).await.expect("load fixtures");
        SqlCatalogRepository::new(pool)
    }

    #[tokio::test]
    async fn seeded_standards_decode_with_prices() {
        let repository = seeded_repository().await;

        let standards = repository.list_standards().await.expect("list standards");
        assert_eq!(standards.len(), 5);

        let iso_9001 = repository
            .find_standard(&StandardId("iso-9001".to_string()))
            .await
            .expect("find")
            .expect("iso-9001 exists");
        assert_eq!(iso_9001.certification_price.to_string(), "4500.00");
    }

    #[tokio::test]
    async fn certification_steps_come_back_in_printing_order() {
        let repository = seeded_repository().await;

        let steps = repository.list_certification_steps().await.expect("list steps");
        let orders: Vec<u32> = steps.iter().map(|step| step.step_order).collect();
        let mut sorted = orders.clone();
        sorted.sort_unstable();
        assert_eq!(orders, sorted);
        assert!(!steps.is_empty());
    }

    #[tokio::test]
    async fn bank_accounts_carry_their_currency() {
        let repository = seeded_repository().await;

        let accounts = repository.list_bank_accounts().await.expect("list accounts");
        assert!(accounts.iter().any(|account| account.currency == AccountCurrency::Soles));
        assert!(accounts.iter().any(|account| account.currency == AccountCurrency::Dolares));
    }
}
