use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use cotiza_core::codegen::{next_code, CodeScope, QuotationCode};
use cotiza_core::domain::catalog::{Advisor, AdvisorId, BankAccount, CertificationStep, IsoStandard, StandardId};
use cotiza_core::domain::quotation::{
    ClientData, LineItemSelection, Quotation, QuotationId, QuotationStatus,
};
use cotiza_core::errors::DomainError;
use cotiza_core::pricing::PricingPolicy;

pub mod catalog;
pub mod memory;
pub mod quotation;

pub use catalog::SqlCatalogRepository;
pub use memory::InMemoryQuotationRepository;
pub use quotation::SqlQuotationRepository;

/// How often an allocation is retried after losing the code race before the
/// attempt is reported as exhausted.
const CODE_ALLOCATION_ATTEMPTS: u32 = 3;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("quotation code `{0}` already exists")]
    DuplicateCode(String),
    #[error("quotation not found: `{0}`")]
    NotFound(String),
    #[error("code allocation lost the race {attempts} times in a row")]
    CodeAllocationExhausted { attempts: u32 },
}

/// Advisor input for a quotation that does not have a code yet.
#[derive(Clone, Debug)]
pub struct NewQuotation {
    pub date: DateTime<Utc>,
    pub client: ClientData,
    pub selections: Vec<LineItemSelection>,
    pub policy: PricingPolicy,
}

#[async_trait]
pub trait QuotationRepository: Send + Sync {
    /// Codes of every persisted quotation whose code starts with `prefix`.
    async fn list_codes_with_prefix(&self, prefix: &str) -> Result<Vec<String>, RepositoryError>;

    /// Persist a fully assembled quotation. Fails with [`RepositoryError::DuplicateCode`]
    /// when another quotation already holds the same code.
    async fn insert(&self, quotation: &Quotation) -> Result<(), RepositoryError>;

    async fn find_by_code(&self, code: &QuotationCode)
        -> Result<Option<Quotation>, RepositoryError>;

    /// All quotations, newest first.
    async fn list_recent(&self) -> Result<Vec<Quotation>, RepositoryError>;

    async fn update_status(
        &self,
        code: &QuotationCode,
        status: QuotationStatus,
    ) -> Result<Quotation, RepositoryError>;

    async fn delete(&self, code: &QuotationCode) -> Result<(), RepositoryError>;

    /// Allocate the next code in the draft's year-month scope and persist.
    ///
    /// The allocation itself is the pure [`next_code`] over the codes read
    /// from storage; the UNIQUE guard on the code column turns a lost race
    /// into a retry with a fresh snapshot instead of a duplicate code.
    async fn create(&self, draft: NewQuotation) -> Result<Quotation, RepositoryError> {
        let scope = CodeScope::from_date(draft.date.date_naive());

        for _ in 0..CODE_ALLOCATION_ATTEMPTS {
            let existing = self.list_codes_with_prefix(&scope.prefix()).await?;
            let code = next_code(scope, existing);
            let quotation = Quotation::assemble(
                QuotationId::generate(),
                code,
                draft.date,
                draft.client.clone(),
                draft.selections.clone(),
                draft.policy.clone(),
            );

            match self.insert(&quotation).await {
                Ok(()) => return Ok(quotation),
                Err(RepositoryError::DuplicateCode(_)) => continue,
                Err(error) => return Err(error),
            }
        }

        Err(RepositoryError::CodeAllocationExhausted { attempts: CODE_ALLOCATION_ATTEMPTS })
    }
}

#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn list_standards(&self) -> Result<Vec<IsoStandard>, RepositoryError>;
    async fn find_standard(&self, id: &StandardId) -> Result<Option<IsoStandard>, RepositoryError>;
    async fn list_advisors(&self) -> Result<Vec<Advisor>, RepositoryError>;
    async fn find_advisor(&self, id: &AdvisorId) -> Result<Option<Advisor>, RepositoryError>;
    async fn list_bank_accounts(&self) -> Result<Vec<BankAccount>, RepositoryError>;
    /// Certification-flow steps in printing order.
    async fn list_certification_steps(&self) -> Result<Vec<CertificationStep>, RepositoryError>;
}
