use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use cotiza_core::codegen::QuotationCode;
use cotiza_core::domain::catalog::{AdvisorId, StandardId};
use cotiza_core::domain::quotation::{
    ClientData, LineItemSelection, Quotation, QuotationId, QuotationStatus,
};
use cotiza_core::pricing::{PricingPolicy, QuotationTotals};

use super::{QuotationRepository, RepositoryError};
use crate::DbPool;

pub struct SqlQuotationRepository {
    pool: DbPool,
}

impl SqlQuotationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn load_selections(
        &self,
        quotation_id: &str,
    ) -> Result<Vec<LineItemSelection>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT standard_id, certification, certification_price,
                    follow_up, follow_up_price, recertification, recertification_price
             FROM quotation_isos WHERE quotation_id = ?1",
        )
        .bind(quotation_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(map_selection_row).collect()
    }

    async fn hydrate(&self, row: SqliteRow) -> Result<Quotation, RepositoryError> {
        let id: String = row.get("id");
        let selections = self.load_selections(&id).await?;
        map_quotation_row(&row, selections)
    }
}

#[async_trait]
impl QuotationRepository for SqlQuotationRepository {
    async fn list_codes_with_prefix(&self, prefix: &str) -> Result<Vec<String>, RepositoryError> {
        let pattern = format!("{prefix}%");
        let rows = sqlx::query("SELECT code FROM quotations WHERE code LIKE ?1")
            .bind(pattern)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(|row| row.get::<String, _>("code")).collect())
    }

    async fn insert(&self, quotation: &Quotation) -> Result<(), RepositoryError> {
        let policy = serde_json::to_string(&quotation.policy)
            .map_err(|error| RepositoryError::Decode(format!("policy encode: {error}")))?;

        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            "INSERT INTO quotations
                 (id, code, date,
                  client_ruc, client_razon_social, client_representative,
                  client_phone, client_email, advisor_id,
                  policy, subtotal, igv, implementation, discount, total, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
        )
        .bind(&quotation.id.0)
        .bind(quotation.code.as_str())
        .bind(quotation.date.to_rfc3339())
        .bind(&quotation.client.ruc)
        .bind(&quotation.client.razon_social)
        .bind(&quotation.client.representative)
        .bind(&quotation.client.phone)
        .bind(&quotation.client.email)
        .bind(&quotation.client.advisor_id.0)
        .bind(policy)
        .bind(quotation.totals.subtotal.to_string())
        .bind(quotation.totals.igv.to_string())
        .bind(quotation.totals.implementation.to_string())
        .bind(quotation.totals.discount.to_string())
        .bind(quotation.totals.total.to_string())
        .bind(quotation.status.as_str())
        .execute(&mut *tx)
        .await;

        if let Err(error) = inserted {
            if is_unique_violation(&error) {
                return Err(RepositoryError::DuplicateCode(quotation.code.as_str().to_string()));
            }
            return Err(error.into());
        }

        for selection in &quotation.selections {
            sqlx::query(
                "INSERT INTO quotation_isos
                     (quotation_id, standard_id,
                      certification, certification_price,
                      follow_up, follow_up_price,
                      recertification, recertification_price)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )
            .bind(&quotation.id.0)
            .bind(&selection.standard_id.0)
            .bind(selection.certification_enabled)
            .bind(selection.certification_price.to_string())
            .bind(selection.follow_up_enabled)
            .bind(selection.follow_up_price.to_string())
            .bind(selection.recertification_enabled)
            .bind(selection.recertification_price.to_string())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn find_by_code(
        &self,
        code: &QuotationCode,
    ) -> Result<Option<Quotation>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM quotations WHERE code = ?1")
            .bind(code.as_str())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(self.hydrate(row).await?)),
            None => Ok(None),
        }
    }

    async fn list_recent(&self) -> Result<Vec<Quotation>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM quotations ORDER BY date DESC, code DESC")
            .fetch_all(&self.pool)
            .await?;

        let mut quotations = Vec::with_capacity(rows.len());
        for row in rows {
            quotations.push(self.hydrate(row).await?);
        }
        Ok(quotations)
    }

    async fn update_status(
        &self,
        code: &QuotationCode,
        status: QuotationStatus,
    ) -> Result<Quotation, RepositoryError> {
        let mut quotation = self
            .find_by_code(code)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(code.as_str().to_string()))?;

        quotation.transition_to(status)?;

        sqlx::query("UPDATE quotations SET status = ?1 WHERE code = ?2")
            .bind(quotation.status.as_str())
            .bind(code.as_str())
            .execute(&self.pool)
            .await?;

        Ok(quotation)
    }

    async fn delete(&self, code: &QuotationCode) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM quotations WHERE code = ?1")
            .bind(code.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(code.as_str().to_string()));
        }
        Ok(())
    }
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(
        error,
        sqlx::Error::Database(db) if matches!(db.kind(), sqlx::error::ErrorKind::UniqueViolation)
    )
}

fn decode_decimal(row: &SqliteRow, column: &str) -> Result<Decimal, RepositoryError> {
    let raw: String = row.get(column);
    Decimal::from_str(&raw)
        .map_err(|error| RepositoryError::Decode(format!("column {column}: {error}")))
}

fn map_selection_row(row: SqliteRow) -> Result<LineItemSelection, RepositoryError> {
    Ok(LineItemSelection {
        standard_id: StandardId(row.get("standard_id")),
        certification_enabled: row.get::<bool, _>("certification"),
        certification_price: decode_decimal(&row, "certification_price")?,
        follow_up_enabled: row.get::<bool, _>("follow_up"),
        follow_up_price: decode_decimal(&row, "follow_up_price")?,
        recertification_enabled: row.get::<bool, _>("recertification"),
        recertification_price: decode_decimal(&row, "recertification_price")?,
    })
}

fn map_quotation_row(
    row: &SqliteRow,
    selections: Vec<LineItemSelection>,
) -> Result<Quotation, RepositoryError> {
    let date_raw: String = row.get("date");
    let date = DateTime::parse_from_rfc3339(&date_raw)
        .map_err(|error| RepositoryError::Decode(format!("column date: {error}")))?
        .with_timezone(&Utc);

    let policy_raw: String = row.get("policy");
    let policy: PricingPolicy = serde_json::from_str(&policy_raw)
        .map_err(|error| RepositoryError::Decode(format!("column policy: {error}")))?;

    let status_raw: String = row.get("status");
    let status = status_raw.parse::<QuotationStatus>().map_err(RepositoryError::Decode)?;

    let totals = QuotationTotals {
        subtotal: decode_decimal(row, "subtotal")?,
        igv: decode_decimal(row, "igv")?,
        implementation: decode_decimal(row, "implementation")?,
        discount: decode_decimal(row, "discount")?,
        total: decode_decimal(row, "total")?,
    };

    Ok(Quotation {
        id: QuotationId(row.get("id")),
        code: QuotationCode(row.get("code")),
        date,
        client: ClientData {
            ruc: row.get("client_ruc"),
            razon_social: row.get("client_razon_social"),
            representative: row.get("client_representative"),
            phone: row.get("client_phone"),
            email: row.get("client_email"),
            advisor_id: AdvisorId(row.get("advisor_id")),
        },
        selections,
        policy,
        totals,
        status,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    use cotiza_core::codegen::QuotationCode;
    use cotiza_core::domain::catalog::{AdvisorId, StandardId};
    use cotiza_core::domain::quotation::{ClientData, LineItemSelection, QuotationStatus};
    use cotiza_core::pricing::PricingPolicy;

    use crate::repositories::{NewQuotation, QuotationRepository, RepositoryError};
    use crate::{connect_with_settings, migrations};

    use super::SqlQuotationRepository;

    async fn repository() -> SqlQuotationRepository {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("run migrations");
        SqlQuotationRepository::new(pool)
    }

    fn client() -> ClientData {
        ClientData {
            ruc: "20123456789".to_string(),
            razon_social: "Constructora Andina S.A.C.".to_string(),
            representative: "María Torres".to_string(),
            phone: "987654321".to_string(),
            email: "mtorres@andina.pe".to_string(),
            advisor_id: AdvisorId("adv-001".to_string()),
        }
    }

    fn selection() -> LineItemSelection {
        LineItemSelection {
            standard_id: StandardId("iso-9001".to_string()),
            certification_enabled: true,
            certification_price: Decimal::new(450000, 2),
            follow_up_enabled: true,
            follow_up_price: Decimal::new(120000, 2),
            recertification_enabled: false,
            recertification_price: Decimal::new(380000, 2),
        }
    }

    fn draft(day: u32) -> NewQuotation {
        NewQuotation {
            date: Utc.with_ymd_and_hms(2026, 8, day, 10, 0, 0).single().expect("valid date"),
            client: client(),
            selections: vec![selection()],
            policy: PricingPolicy::default(),
        }
    }

    #[tokio::test]
    async fn create_allocates_sequential_codes() {
        let repository = repository().await;

        let first = repository.create(draft(1)).await.expect("first create");
        let second = repository.create(draft(2)).await.expect("second create");

        assert_eq!(first.code.as_str(), "COT-2026-08-00001");
        assert_eq!(second.code.as_str(), "COT-2026-08-00002");
    }

    #[tokio::test]
    async fn created_quotation_round_trips() {
        let repository = repository().await;

        let created = repository.create(draft(1)).await.expect("create");
        let loaded = repository
            .find_by_code(&created.code)
            .await
            .expect("find")
            .expect("quotation exists");

        assert_eq!(loaded, created);
        assert_eq!(loaded.totals.subtotal, Decimal::new(570000, 2));
    }

    #[tokio::test]
    async fn deleting_leaves_a_gap_and_allocation_continues_past_it() {
        let repository = repository().await;

        repository.create(draft(1)).await.expect("first");
        let second = repository.create(draft(2)).await.expect("second");
        let third = repository.create(draft(3)).await.expect("third");
        assert_eq!(third.code.as_str(), "COT-2026-08-00003");

        repository.delete(&second.code).await.expect("delete second");

        let fourth = repository.create(draft(4)).await.expect("fourth");
        assert_eq!(fourth.code.as_str(), "COT-2026-08-00004");
    }

    #[tokio::test]
    async fn duplicate_code_insert_is_rejected() {
        let repository = repository().await;

        let created = repository.create(draft(1)).await.expect("create");
        let error = repository.insert(&created).await.expect_err("duplicate insert should fail");

        assert!(matches!(error, RepositoryError::DuplicateCode(code) if code == created.code.as_str()));
    }

    #[tokio::test]
    async fn update_status_enforces_the_lifecycle() {
        let repository = repository().await;
        let created = repository.create(draft(1)).await.expect("create");

        let error = repository
            .update_status(&created.code, QuotationStatus::Approved)
            .await
            .expect_err("draft -> approved should fail");
        assert!(matches!(error, RepositoryError::Domain(_)));

        let sent = repository
            .update_status(&created.code, QuotationStatus::Sent)
            .await
            .expect("draft -> sent");
        assert_eq!(sent.status, QuotationStatus::Sent);

        let reloaded = repository
            .find_by_code(&created.code)
            .await
            .expect("find")
            .expect("quotation exists");
        assert_eq!(reloaded.status, QuotationStatus::Sent);
    }

    #[tokio::test]
    async fn list_recent_orders_newest_first() {
        let repository = repository().await;

        repository.create(draft(1)).await.expect("first");
        repository.create(draft(15)).await.expect("second");

        let listed = repository.list_recent().await.expect("list");
        assert_eq!(listed.len(), 2);
        assert!(listed[0].date > listed[1].date);
    }

    #[tokio::test]
    async fn missing_code_reports_not_found() {
        let repository = repository().await;
        let missing = QuotationCode("COT-2026-08-09999".to_string());

        assert!(repository.find_by_code(&missing).await.expect("find").is_none());
        let error = repository.delete(&missing).await.expect_err("delete should fail");
        assert!(matches!(error, RepositoryError::NotFound(_)));
    }
}
