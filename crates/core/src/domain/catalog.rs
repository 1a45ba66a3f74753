//! Read-only catalog entities: ISO standards with default pricing, advisors,
//! bank accounts, and the certification-flow steps printed on the document.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::quotation::LineItemSelection;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StandardId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AdvisorId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BankAccountId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IsoStandard {
    pub id: StandardId,
    pub code: String,
    pub name: String,
    pub description: String,
    pub certification_price: Decimal,
    pub follow_up_price: Decimal,
    pub recertification_price: Decimal,
}

impl IsoStandard {
    /// A selection row seeded with this standard's default prices and every
    /// service toggled off. Advisors flip flags and override prices from here.
    pub fn default_selection(&self) -> LineItemSelection {
        LineItemSelection {
            standard_id: self.id.clone(),
            certification_enabled: false,
            certification_price: self.certification_price,
            follow_up_enabled: false,
            follow_up_price: self.follow_up_price,
            recertification_enabled: false,
            recertification_price: self.recertification_price,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advisor {
    pub id: AdvisorId,
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountCurrency {
    Soles,
    Dolares,
}

impl AccountCurrency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Soles => "soles",
            Self::Dolares => "dolares",
        }
    }
}

impl std::str::FromStr for AccountCurrency {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "soles" => Ok(Self::Soles),
            "dolares" => Ok(Self::Dolares),
            other => Err(format!("unsupported account currency `{other}`")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankAccount {
    pub id: BankAccountId,
    pub bank_name: String,
    pub account_holder: String,
    pub account_number: String,
    pub cci: String,
    pub currency: AccountCurrency,
    pub logo: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificationStep {
    pub id: String,
    pub step_order: u32,
    pub title: String,
}
