//! In-memory repository double for exercising allocation and lifecycle logic
//! without a database.

use std::sync::Mutex;

use async_trait::async_trait;

use cotiza_core::codegen::QuotationCode;
use cotiza_core::domain::quotation::{Quotation, QuotationStatus};

use super::{QuotationRepository, RepositoryError};

#[derive(Default)]
pub struct InMemoryQuotationRepository {
    quotations: Mutex<Vec<Quotation>>,
}

impl InMemoryQuotationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<Quotation>>, RepositoryError> {
        self.quotations
            .lock()
            .map_err(|_| RepositoryError::Decode("in-memory store poisoned".to_string()))
    }
}

#[async_trait]
impl QuotationRepository for InMemoryQuotationRepository {
    async fn list_codes_with_prefix(&self, prefix: &str) -> Result<Vec<String>, RepositoryError> {
        Ok(self
            .lock()?
            .iter()
            .map(|quotation| quotation.code.as_str().to_string())
            .filter(|code| code.starts_with(prefix))
            .collect())
    }

    async fn insert(&self, quotation: &Quotation) -> Result<(), RepositoryError> {
        let mut quotations = self.lock()?;
        if quotations.iter().any(|existing| existing.code == quotation.code) {
            return Err(RepositoryError::DuplicateCode(quotation.code.as_str().to_string()));
        }
        quotations.push(quotation.clone());
        Ok(())
    }

    async fn find_by_code(
        &self,
        code: &QuotationCode,
    ) -> Result<Option<Quotation>, RepositoryError> {
        Ok(self.lock()?.iter().find(|quotation| &quotation.code == code).cloned())
    }

    async fn list_recent(&self) -> Result<Vec<Quotation>, RepositoryError> {
        let mut quotations = self.lock()?.clone();
        quotations.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(quotations)
    }

    async fn update_status(
        &self,
        code: &QuotationCode,
        status: QuotationStatus,
    ) -> Result<Quotation, RepositoryError> {
        let mut quotations = self.lock()?;
        let quotation = quotations
            .iter_mut()
            .find(|quotation| &quotation.code == code)
            .ok_or_else(|| RepositoryError::NotFound(code.as_str().to_string()))?;

        quotation.transition_to(status)?;
        Ok(quotation.clone())
    }

    async fn delete(&self, code: &QuotationCode) -> Result<(), RepositoryError> {
        let mut quotations = self.lock()?;
        let before = quotations.len();
        quotations.retain(|quotation| &quotation.code != code);
        if quotations.len() == before {
            return Err(RepositoryError::NotFound(code.as_str().to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    use cotiza_core::domain::catalog::{AdvisorId, StandardId};
    use cotiza_core::domain::quotation::{ClientData, LineItemSelection};
    use cotiza_core::pricing::PricingPolicy;

    use crate::repositories::{NewQuotation, QuotationRepository};

    use super::InMemoryQuotationRepository;

    fn draft(year: i32, month: u32) -> NewQuotation {
        NewQuotation {
            date: Utc.with_ymd_and_hms(year, month, 5, 9, 0, 0).single().expect("valid date"),
            client: ClientData {
                ruc: "20123456789".to_string(),
                razon_social: "Minera Quellaveco S.A.".to_string(),
                representative: "Lucía Paredes".to_string(),
                phone: "991234567".to_string(),
                email: "lparedes@quellaveco.pe".to_string(),
                advisor_id: AdvisorId("adv-002".to_string()),
            },
            selections: vec![LineItemSelection {
                standard_id: StandardId("iso-45001".to_string()),
                certification_enabled: true,
                certification_price: Decimal::new(550000, 2),
                follow_up_enabled: false,
                follow_up_price: Decimal::new(140000, 2),
                recertification_enabled: false,
                recertification_price: Decimal::new(430000, 2),
            }],
            policy: PricingPolicy::default(),
        }
    }

    #[tokio::test]
    async fn allocation_resets_when_the_scope_changes() {
        let repository = InMemoryQuotationRepository::new();

        let december = repository.create(draft(2025, 12)).await.expect("december create");
        assert_eq!(december.code.as_str(), "COT-2025-12-00001");

        let january = repository.create(draft(2026, 1)).await.expect("january create");
        assert_eq!(january.code.as_str(), "COT-2026-01-00001");

        let second_january = repository.create(draft(2026, 1)).await.expect("second january");
        assert_eq!(second_january.code.as_str(), "COT-2026-01-00002");
    }

    #[tokio::test]
    async fn create_prunes_empty_selections_before_persisting() {
        let repository = InMemoryQuotationRepository::new();
        let mut input = draft(2026, 8);
        let mut empty = input.selections[0].clone();
        empty.certification_enabled = false;
        input.selections.push(empty);

        let created = repository.create(input).await.expect("create");
        assert_eq!(created.selections.len(), 1);
    }
}
