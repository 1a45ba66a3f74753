pub mod codegen;
pub mod config;
pub mod domain;
pub mod errors;
pub mod money;
pub mod pricing;
pub mod words;

pub use codegen::{next_code, CodeScope, QuotationCode};
pub use domain::catalog::{
    AccountCurrency, Advisor, AdvisorId, BankAccount, BankAccountId, CertificationStep,
    IsoStandard, StandardId,
};
pub use domain::quotation::{
    ClientData, LineItemSelection, Quotation, QuotationId, QuotationStatus,
};
pub use errors::DomainError;
pub use money::{format_currency, parse_money};
pub use pricing::{
    compute_totals, igv_rate, ImplementationService, PricingPolicy, QuotationTotals,
};
pub use words::amount_to_words;
