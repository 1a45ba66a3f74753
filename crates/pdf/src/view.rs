//! The fully-populated render model handed to the template. Every amount is
//! preformatted here so the template stays free of numeric logic, and the
//! branding is injected explicitly rather than read from ambient state.

use std::path::PathBuf;

use rust_decimal::Decimal;
use serde::Serialize;

use cotiza_core::config::BrandingConfig;
use cotiza_core::domain::catalog::{Advisor, BankAccount, CertificationStep, IsoStandard};
use cotiza_core::domain::quotation::{LineItemSelection, Quotation};
use cotiza_core::money::format_currency;
use cotiza_core::pricing::PricingPolicy;
use cotiza_core::words::amount_to_words;

#[derive(Clone, Debug, Serialize)]
pub struct DocumentView {
    pub code: String,
    pub formatted_date: String,
    pub company_name: String,
    pub validity_note: String,
    pub primary_color: String,
    pub secondary_color: String,
    pub accent_color: String,
    pub client: ClientView,
    pub advisor_name: String,
    pub rows: Vec<LineRowView>,
    pub totals: TotalsView,
    pub certification_steps: Vec<StepView>,
    pub bank_accounts: Vec<BankAccountView>,
    pub logo_paths: Vec<String>,
    pub watermark_path: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ClientView {
    pub ruc: String,
    pub razon_social: String,
    pub representative: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct LineRowView {
    pub standard_code: String,
    pub standard_description: String,
    pub certification: String,
    pub follow_up: String,
    pub recertification: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct TotalsView {
    pub subtotal: String,
    pub include_igv: bool,
    pub total_with_igv: String,
    pub implementation: Option<String>,
    pub discount: Option<String>,
    pub discount_label: String,
    pub final_total: String,
    pub amount_in_words: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct StepView {
    pub step_order: u32,
    pub title: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct BankAccountView {
    pub bank_name: String,
    pub account_holder: String,
    pub account_number: String,
    pub cci: String,
    pub currency: String,
    pub logo: Option<String>,
}

impl DocumentView {
    /// Local files the document embeds. The renderer refuses to capture
    /// until every one of them exists on disk.
    pub fn asset_paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> =
            self.logo_paths.iter().map(PathBuf::from).collect();
        if let Some(watermark) = &self.watermark_path {
            paths.push(PathBuf::from(watermark));
        }
        paths.extend(
            self.bank_accounts
                .iter()
                .filter_map(|account| account.logo.as_deref())
                .filter(|logo| !logo.starts_with("http://") && !logo.starts_with("https://"))
                .map(PathBuf::from),
        );
        paths
    }
}

fn component_cell(enabled: bool, price: Decimal) -> String {
    if enabled {
        format_currency(price)
    } else {
        "-".to_string()
    }
}

fn find_standard<'a>(
    standards: &'a [IsoStandard],
    selection: &LineItemSelection,
) -> Option<&'a IsoStandard> {
    standards.iter().find(|standard| standard.id == selection.standard_id)
}

/// Assemble the render model for a quotation.
///
/// Selections whose standard is no longer in the catalog are skipped, the
/// way the source preview drops them. The amount-in-words line clamps at
/// zero; the numeric totals are shown as computed.
pub fn build_document_view(
    quotation: &Quotation,
    standards: &[IsoStandard],
    advisor: Option<&Advisor>,
    bank_accounts: &[BankAccount],
    certification_steps: &[CertificationStep],
    branding: &BrandingConfig,
) -> DocumentView {
    let rows = quotation
        .selections
        .iter()
        .filter_map(|selection| {
            let standard = find_standard(standards, selection)?;
            Some(LineRowView {
                standard_code: standard.code.clone(),
                standard_description: standard.description.clone(),
                certification: component_cell(
                    selection.certification_enabled,
                    selection.certification_price,
                ),
                follow_up: component_cell(selection.follow_up_enabled, selection.follow_up_price),
                recertification: component_cell(
                    selection.recertification_enabled,
                    selection.recertification_price,
                ),
            })
        })
        .collect();

    let totals = &quotation.totals;
    let (include_igv, discount_label) = match &quotation.policy {
        PricingPolicy::PercentDiscount { discount_percent } => {
            (true, format!("DESCUENTO ({discount_percent}%)"))
        }
        PricingPolicy::FixedDiscount { include_igv, .. } => {
            (*include_igv, "DESCUENTO".to_string())
        }
    };

    let totals_view = TotalsView {
        subtotal: format_currency(totals.subtotal),
        include_igv,
        total_with_igv: format_currency(totals.total_with_igv()),
        implementation: (!totals.implementation.is_zero())
            .then(|| format_currency(totals.implementation)),
        discount: (!totals.discount.is_zero()).then(|| format_currency(totals.discount)),
        discount_label,
        final_total: format_currency(totals.total),
        amount_in_words: amount_to_words(totals.total.max(Decimal::ZERO)),
    };

    DocumentView {
        code: quotation.code.as_str().to_string(),
        formatted_date: quotation.date.format("%d/%m/%Y").to_string(),
        company_name: branding.company_name.clone(),
        validity_note: branding.validity_note.clone(),
        primary_color: branding.primary_color.clone(),
        secondary_color: branding.secondary_color.clone(),
        accent_color: branding.accent_color.clone(),
        client: ClientView {
            ruc: quotation.client.ruc.clone(),
            razon_social: quotation.client.razon_social.clone(),
            representative: quotation.client.representative.clone(),
        },
        advisor_name: advisor.map(|advisor| advisor.name.clone()).unwrap_or_else(|| {
            "No asignado".to_string()
        }),
        rows,
        totals: totals_view,
        certification_steps: certification_steps
            .iter()
            .map(|step| StepView { step_order: step.step_order, title: step.title.clone() })
            .collect(),
        bank_accounts: bank_accounts
            .iter()
            .map(|account| BankAccountView {
                bank_name: account.bank_name.clone(),
                account_holder: account.account_holder.clone(),
                account_number: account.account_number.clone(),
                cci: account.cci.clone(),
                currency: account.currency.as_str().to_string(),
                logo: account.logo.clone(),
            })
            .collect(),
        logo_paths: branding
            .logo_paths
            .iter()
            .map(|path| path.to_string_lossy().to_string())
            .collect(),
        watermark_path: branding
            .watermark_path
            .as_ref()
            .map(|path| path.to_string_lossy().to_string()),
    }
}
