//! The full quotation flow in one command: read an advisor request file,
//! allocate a code, compute totals, render the document, merge the active
//! attachment and persist the record. Allocation completes before rendering
//! because the code is printed on the document; rendering completes before
//! merging; merging completes before the bytes land on disk.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{info, warn};

use crate::commands::{init_logging, CommandResult};
use cotiza_core::config::{AppConfig, LoadOptions};
use cotiza_core::domain::catalog::{AdvisorId, IsoStandard, StandardId};
use cotiza_core::domain::quotation::{ClientData, LineItemSelection};
use cotiza_core::money::format_currency;
use cotiza_core::pricing::PricingPolicy;
use cotiza_db::repositories::{CatalogRepository, NewQuotation, QuotationRepository};
use cotiza_db::{attachment, connect, migrations, SqlCatalogRepository, SqlQuotationRepository};
use cotiza_pdf::render::RenderError;
use cotiza_pdf::{build_document_view, download_file_name, merge_pdfs, QuotationRenderer};

#[derive(Debug, Deserialize)]
pub struct QuotationRequest {
    pub date: Option<NaiveDate>,
    pub client: ClientRequest,
    #[serde(default)]
    pub selections: Vec<SelectionRequest>,
    pub policy: Option<PricingPolicy>,
}

#[derive(Debug, Deserialize)]
pub struct ClientRequest {
    pub ruc: String,
    pub razon_social: String,
    pub representative: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    pub advisor_id: String,
}

/// One requested row: flags plus optional price overrides. Prices left out
/// fall back to the standard's catalog defaults.
#[derive(Debug, Deserialize)]
pub struct SelectionRequest {
    pub standard_id: String,
    #[serde(default)]
    pub certification: bool,
    pub certification_price: Option<Decimal>,
    #[serde(default)]
    pub follow_up: bool,
    pub follow_up_price: Option<Decimal>,
    #[serde(default)]
    pub recertification: bool,
    pub recertification_price: Option<Decimal>,
}

pub fn parse_request(raw: &str) -> Result<QuotationRequest, toml::de::Error> {
    toml::from_str(raw)
}

fn build_selection(standard: &IsoStandard, request: &SelectionRequest) -> LineItemSelection {
    let mut selection = standard.default_selection();
    selection.certification_enabled = request.certification;
    selection.follow_up_enabled = request.follow_up;
    selection.recertification_enabled = request.recertification;
    if let Some(price) = request.certification_price {
        selection.certification_price = price;
    }
    if let Some(price) = request.follow_up_price {
        selection.follow_up_price = price;
    }
    if let Some(price) = request.recertification_price {
        selection.recertification_price = price;
    }
    selection
}

fn request_date(date: Option<NaiveDate>) -> DateTime<Utc> {
    match date.and_then(|date| date.and_hms_opt(0, 0, 0)) {
        Some(naive) => naive.and_utc(),
        None => Utc::now(),
    }
}

pub fn run(input: &Path, output_dir: Option<PathBuf>, no_pdf: bool) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "generate",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };
    init_logging(&config);

    let raw = match std::fs::read_to_string(input) {
        Ok(raw) => raw,
        Err(error) => {
            return CommandResult::failure(
                "generate",
                "request_file",
                format!("could not read `{}`: {error}", input.display()),
                2,
            );
        }
    };
    let request = match parse_request(&raw) {
        Ok(request) => request,
        Err(error) => {
            return CommandResult::failure(
                "generate",
                "request_parse",
                format!("could not parse `{}`: {error}", input.display()),
                2,
            );
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "generate",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let output_dir = output_dir.unwrap_or_else(|| config.pdf.output_dir.clone());
    let result = runtime.block_on(generate(&config, request, &output_dir, no_pdf));

    match result {
        Ok(message) => CommandResult::success("generate", message),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("generate", error_class, message, exit_code)
        }
    }
}

type StepFailure = (&'static str, String, u8);

async fn generate(
    config: &AppConfig,
    request: QuotationRequest,
    output_dir: &Path,
    no_pdf: bool,
) -> Result<String, StepFailure> {
    let pool = connect(&config.database)
        .await
        .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;
    migrations::run_pending(&pool).await.map_err(|error| ("migration", error.to_string(), 5))?;

    let catalog = SqlCatalogRepository::new(pool.clone());
    let standards =
        catalog.list_standards().await.map_err(|error| ("catalog", error.to_string(), 4))?;

    let mut selections = Vec::with_capacity(request.selections.len());
    for selection_request in &request.selections {
        let standard = standards
            .iter()
            .find(|standard| standard.id == StandardId(selection_request.standard_id.clone()))
            .ok_or_else(|| {
                (
                    "unknown_standard",
                    format!("standard `{}` is not in the catalog", selection_request.standard_id),
                    6u8,
                )
            })?;
        selections.push(build_selection(standard, selection_request));
    }

    let advisor_id = AdvisorId(request.client.advisor_id.clone());
    let advisor = catalog
        .find_advisor(&advisor_id)
        .await
        .map_err(|error| ("catalog", error.to_string(), 4))?;
    if advisor.is_none() {
        warn!(advisor_id = %request.client.advisor_id, "advisor not found; document will show unassigned");
    }

    let draft = NewQuotation {
        date: request_date(request.date),
        client: ClientData {
            ruc: request.client.ruc,
            razon_social: request.client.razon_social,
            representative: request.client.representative,
            phone: request.client.phone,
            email: request.client.email,
            advisor_id,
        },
        selections,
        policy: request.policy.unwrap_or_default(),
    };

    let repository = SqlQuotationRepository::new(pool.clone());
    let quotation =
        repository.create(draft).await.map_err(|error| ("persist", error.to_string(), 4u8))?;
    info!(code = %quotation.code, total = %quotation.totals.total, "quotation created");

    if no_pdf {
        pool.close().await;
        return Ok(format!(
            "created {} with total {}",
            quotation.code,
            format_currency(quotation.totals.total)
        ));
    }

    let bank_accounts =
        catalog.list_bank_accounts().await.map_err(|error| ("catalog", error.to_string(), 4))?;
    let certification_steps = catalog
        .list_certification_steps()
        .await
        .map_err(|error| ("catalog", error.to_string(), 4))?;

    let view = build_document_view(
        &quotation,
        &standards,
        advisor.as_ref(),
        &bank_accounts,
        &certification_steps,
        &config.branding,
    );

    let renderer = QuotationRenderer::new(&config.pdf)
        .map_err(|error| ("render_failure", error.to_string(), 7u8))?;
    let mut pdf_bytes = renderer.render_pdf(&view).await.map_err(|error| match error {
        RenderError::Timeout(_) => ("render_timeout", error.to_string(), 7u8),
        other => ("render_failure", other.to_string(), 7u8),
    })?;

    if let Some(active) = attachment::find_active(&pool)
        .await
        .map_err(|error| ("attachment_query", error.to_string(), 4))?
    {
        let attachment_bytes = active
            .fetch_bytes()
            .await
            .map_err(|error| ("attachment_fetch", error.to_string(), 8u8))?;
        pdf_bytes = merge_pdfs(&pdf_bytes, &attachment_bytes)
            .map_err(|error| ("merge_failure", error.to_string(), 8u8))?;
        info!(attachment = %active.file_name, "attachment merged after report");
    }

    pool.close().await;

    let output_path = output_dir.join(download_file_name(quotation.code.as_str()));
    tokio::fs::write(&output_path, &pdf_bytes)
        .await
        .map_err(|error| ("output_write", error.to_string(), 7u8))?;

    Ok(format!(
        "created {} with total {}; document at {}",
        quotation.code,
        format_currency(quotation.totals.total),
        output_path.display()
    ))
}
