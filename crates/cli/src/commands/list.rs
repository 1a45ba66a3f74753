use serde::Serialize;

use crate::commands::CommandResult;
use cotiza_core::config::{AppConfig, LoadOptions};
use cotiza_db::{connect, migrations, QuotationRepository, SqlQuotationRepository};

#[derive(Debug, Serialize)]
struct QuotationSummary {
    code: String,
    date: String,
    razon_social: String,
    total: String,
    status: &'static str,
}

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "list",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "list",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let result = runtime.block_on(async {
        let pool = connect(&config.database)
            .await
            .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;
        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let repository = SqlQuotationRepository::new(pool.clone());
        let quotations = repository
            .list_recent()
            .await
            .map_err(|error| ("query", error.to_string(), 4u8))?;
        pool.close().await;

        let summaries: Vec<QuotationSummary> = quotations
            .iter()
            .map(|quotation| QuotationSummary {
                code: quotation.code.as_str().to_string(),
                date: quotation.date.format("%d/%m/%Y").to_string(),
                razon_social: quotation.client.razon_social.clone(),
                total: cotiza_core::money::format_currency(quotation.totals.total),
                status: quotation.status.as_str(),
            })
            .collect();

        serde_json::to_string_pretty(&summaries)
            .map_err(|error| ("serialization", error.to_string(), 6u8))
    });

    match result {
        Ok(output) => CommandResult { exit_code: 0, output },
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("list", error_class, message, exit_code)
        }
    }
}
