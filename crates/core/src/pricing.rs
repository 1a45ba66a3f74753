//! Quotation pricing: line-item aggregation plus the two discount/tax
//! policies the business has used over time, behind one tagged type.
//!
//! Everything here is pure computation over caller-supplied values. Nothing
//! errors; validation of raw form input happens before it reaches the engine
//! (see [`crate::money::parse_money`] for the lenient-coercion boundary).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::quotation::LineItemSelection;

/// Peruvian IGV. The single place the 18% rate is stated.
pub fn igv_rate() -> Decimal {
    Decimal::new(18, 2)
}

/// Optional implementation-service add-on of the fixed-discount policy.
/// Billed as `unit_price * quantity` and never taxed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImplementationService {
    pub unit_price: Decimal,
    pub quantity: u32,
}

impl ImplementationService {
    pub fn total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// The two pricing policies observed across quotation revisions.
///
/// `PercentDiscount` is the legacy shape: IGV always applies and the discount
/// is a percentage of the taxed total. `FixedDiscount` is the current shape:
/// IGV is toggleable, an implementation service may be added untaxed, and the
/// discount is a flat currency amount. The percent and the amount are
/// deliberately distinct fields; they never share a name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PricingPolicy {
    PercentDiscount {
        discount_percent: Decimal,
    },
    FixedDiscount {
        /// IGV applies unless explicitly switched off.
        #[serde(default = "default_include_igv")]
        include_igv: bool,
        #[serde(default)]
        discount_amount: Decimal,
        #[serde(default)]
        implementation: Option<ImplementationService>,
    },
}

fn default_include_igv() -> bool {
    true
}

impl Default for PricingPolicy {
    /// New quotations use the fixed-discount policy with IGV included.
    fn default() -> Self {
        Self::FixedDiscount {
            include_igv: true,
            discount_amount: Decimal::ZERO,
            implementation: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotationTotals {
    pub subtotal: Decimal,
    pub igv: Decimal,
    pub implementation: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
}

impl QuotationTotals {
    /// Certification total before the implementation add-on and discount.
    pub fn total_with_igv(&self) -> Decimal {
        self.subtotal + self.igv
    }
}

/// Sum of every enabled priced component across all line items.
pub fn subtotal(line_items: &[LineItemSelection]) -> Decimal {
    line_items.iter().map(LineItemSelection::enabled_total).sum()
}

/// Aggregate the selected services under the given policy.
///
/// The final total is computed literally: an over-sized discount yields a
/// negative total. Display-layer clamping is the document view's concern.
pub fn compute_totals(line_items: &[LineItemSelection], policy: &PricingPolicy) -> QuotationTotals {
    let subtotal = subtotal(line_items);

    let (igv, implementation, discount) = match policy {
        PricingPolicy::PercentDiscount { discount_percent } => {
            let igv = subtotal * igv_rate();
            let discount = (subtotal + igv) * *discount_percent / Decimal::from(100);
            (igv, Decimal::ZERO, discount)
        }
        PricingPolicy::FixedDiscount { include_igv, discount_amount, implementation } => {
            let igv = if *include_igv { subtotal * igv_rate() } else { Decimal::ZERO };
            let implementation =
                implementation.as_ref().map(ImplementationService::total).unwrap_or(Decimal::ZERO);
            (igv, implementation, *discount_amount)
        }
    };

    let total = subtotal + igv + implementation - discount;

    QuotationTotals { subtotal, igv, implementation, discount, total }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use crate::domain::catalog::StandardId;
    use crate::domain::quotation::LineItemSelection;

    use super::{compute_totals, igv_rate, ImplementationService, PricingPolicy};

    fn item(
        certification: (bool, i64),
        follow_up: (bool, i64),
        recertification: (bool, i64),
    ) -> LineItemSelection {
        LineItemSelection {
            standard_id: StandardId("iso-9001".to_string()),
            certification_enabled: certification.0,
            certification_price: Decimal::from(certification.1),
            follow_up_enabled: follow_up.0,
            follow_up_price: Decimal::from(follow_up.1),
            recertification_enabled: recertification.0,
            recertification_price: Decimal::from(recertification.1),
        }
    }

    fn percent(discount_percent: i64) -> PricingPolicy {
        PricingPolicy::PercentDiscount { discount_percent: Decimal::from(discount_percent) }
    }

    fn fixed(include_igv: bool, discount_amount: i64) -> PricingPolicy {
        PricingPolicy::FixedDiscount {
            include_igv,
            discount_amount: Decimal::from(discount_amount),
            implementation: None,
        }
    }

    #[test]
    fn igv_rate_is_eighteen_percent() {
        assert_eq!(igv_rate(), Decimal::new(18, 2));
    }

    #[test]
    fn disabled_components_contribute_zero_regardless_of_stored_price() {
        let items = vec![item((false, 5000), (true, 1200), (false, 9999))];
        let totals = compute_totals(&items, &percent(0));
        assert_eq!(totals.subtotal, Decimal::from(1200));
    }

    #[test]
    fn subtotal_spans_all_line_items_and_components() {
        let items = vec![
            item((true, 4500), (true, 1200), (false, 3800)),
            item((false, 4500), (false, 1200), (true, 3800)),
        ];
        let totals = compute_totals(&items, &percent(0));
        assert_eq!(totals.subtotal, Decimal::from(9500));
    }

    #[test]
    fn percent_policy_always_applies_igv() {
        let items = vec![item((true, 1000), (false, 0), (false, 0))];
        let totals = compute_totals(&items, &percent(0));
        assert_eq!(totals.igv, Decimal::from(180));
        assert_eq!(totals.total_with_igv(), Decimal::from(1180));
        assert_eq!(totals.total, Decimal::from(1180));
    }

    #[test]
    fn percent_discount_applies_to_taxed_total() {
        let items = vec![item((true, 1000), (false, 0), (false, 0))];
        let totals = compute_totals(&items, &percent(10));
        assert_eq!(totals.discount, Decimal::from(118));
        assert_eq!(totals.total, Decimal::from(1062));
    }

    #[test]
    fn percent_is_not_clamped_by_the_engine() {
        let items = vec![item((true, 1000), (false, 0), (false, 0))];
        let totals = compute_totals(&items, &percent(150));
        assert_eq!(totals.discount, Decimal::from(1770));
        assert_eq!(totals.total, Decimal::from(-590));
    }

    #[test]
    fn fixed_policy_can_switch_igv_off() {
        let items = vec![item((true, 1000), (false, 0), (false, 0))];

        let with_igv = compute_totals(&items, &fixed(true, 0));
        assert_eq!(with_igv.igv, Decimal::from(180));
        assert_eq!(with_igv.total, Decimal::from(1180));

        let without_igv = compute_totals(&items, &fixed(false, 0));
        assert_eq!(without_igv.igv, Decimal::ZERO);
        assert_eq!(without_igv.total, Decimal::from(1000));
    }

    #[test]
    fn fixed_discount_subtracts_a_currency_amount() {
        let items = vec![item((true, 1000), (false, 0), (false, 0))];
        let totals = compute_totals(&items, &fixed(true, 200));
        assert_eq!(totals.discount, Decimal::from(200));
        assert_eq!(totals.total, Decimal::from(980));
    }

    #[test]
    fn implementation_addon_is_added_untaxed() {
        let items = vec![item((true, 1000), (false, 0), (false, 0))];
        let policy = PricingPolicy::FixedDiscount {
            include_igv: true,
            discount_amount: Decimal::ZERO,
            implementation: Some(ImplementationService {
                unit_price: Decimal::from(250),
                quantity: 4,
            }),
        };

        let totals = compute_totals(&items, &policy);
        assert_eq!(totals.implementation, Decimal::from(1000));
        assert_eq!(totals.igv, Decimal::from(180));
        assert_eq!(totals.total, Decimal::from(2180));
    }

    #[test]
    fn totals_are_idempotent_for_fixed_inputs() {
        let items = vec![
            item((true, 4500), (true, 1200), (true, 3800)),
            item((true, 5200), (false, 1300), (true, 4100)),
        ];
        let policy = percent(7);

        assert_eq!(compute_totals(&items, &policy), compute_totals(&items, &policy));
    }

    #[test]
    fn policy_serializes_with_a_kind_tag() {
        let json = serde_json::to_value(PricingPolicy::default()).expect("serialize policy");
        assert_eq!(json["kind"], "fixed_discount");
        assert_eq!(json["include_igv"], true);
    }

    #[test]
    fn empty_selection_list_prices_to_zero() {
        let totals = compute_totals(&[], &PricingPolicy::default());
        assert_eq!(totals.subtotal, Decimal::ZERO);
        assert_eq!(totals.total, Decimal::ZERO);
    }
}
