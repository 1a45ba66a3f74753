use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::codegen::QuotationCode;
use crate::domain::catalog::{AdvisorId, StandardId};
use crate::errors::DomainError;
use crate::pricing::{compute_totals, PricingPolicy, QuotationTotals};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuotationId(pub String);

impl QuotationId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotationStatus {
    Draft,
    Sent,
    Approved,
    Rejected,
}

impl QuotationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Sent => "sent",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl std::str::FromStr for QuotationStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(Self::Draft),
            "sent" => Ok(Self::Sent),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(format!("unsupported quotation status `{other}`")),
        }
    }
}

/// Client snapshot captured on the quotation. Frozen at creation time so the
/// document stays faithful even if the client record changes later.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientData {
    pub ruc: String,
    pub razon_social: String,
    pub representative: String,
    pub phone: String,
    pub email: String,
    pub advisor_id: AdvisorId,
}

/// One priced row of the quotation: an ISO standard with three independently
/// toggled service components. Prices are advisor-editable overrides of the
/// catalog defaults and stay stored even while their flag is off.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemSelection {
    pub standard_id: StandardId,
    pub certification_enabled: bool,
    pub certification_price: Decimal,
    pub follow_up_enabled: bool,
    pub follow_up_price: Decimal,
    pub recertification_enabled: bool,
    pub recertification_price: Decimal,
}

impl LineItemSelection {
    /// A selection with every service toggled off is considered absent and
    /// must not be persisted.
    pub fn is_empty(&self) -> bool {
        !self.certification_enabled && !self.follow_up_enabled && !self.recertification_enabled
    }

    /// Sum of the enabled components. Disabled components contribute zero
    /// regardless of their stored price.
    pub fn enabled_total(&self) -> Decimal {
        let mut total = Decimal::ZERO;
        if self.certification_enabled {
            total += self.certification_price;
        }
        if self.follow_up_enabled {
            total += self.follow_up_price;
        }
        if self.recertification_enabled {
            total += self.recertification_price;
        }
        total
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quotation {
    pub id: QuotationId,
    pub code: QuotationCode,
    pub date: DateTime<Utc>,
    pub client: ClientData,
    pub selections: Vec<LineItemSelection>,
    pub policy: PricingPolicy,
    pub totals: QuotationTotals,
    pub status: QuotationStatus,
}

impl Quotation {
    /// Assemble a quotation from advisor input: empty selections are pruned
    /// and totals are derived from what remains under the given policy.
    pub fn assemble(
        id: QuotationId,
        code: QuotationCode,
        date: DateTime<Utc>,
        client: ClientData,
        selections: Vec<LineItemSelection>,
        policy: PricingPolicy,
    ) -> Self {
        let selections: Vec<LineItemSelection> =
            selections.into_iter().filter(|selection| !selection.is_empty()).collect();
        let totals = compute_totals(&selections, &policy);

        Self { id, code, date, client, selections, policy, totals, status: QuotationStatus::Draft }
    }

    pub fn can_transition_to(&self, next: QuotationStatus) -> bool {
        matches!(
            (self.status, next),
            (QuotationStatus::Draft, QuotationStatus::Sent)
                | (QuotationStatus::Sent, QuotationStatus::Approved)
                | (QuotationStatus::Sent, QuotationStatus::Rejected)
        )
    }

    pub fn transition_to(&mut self, next: QuotationStatus) -> Result<(), DomainError> {
        if self.can_transition_to(next) {
            self.status = next;
            return Ok(());
        }

        Err(DomainError::InvalidStatusTransition { from: self.status, to: next })
    }
}
