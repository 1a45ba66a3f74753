use crate::commands::CommandResult;
use cotiza_core::codegen::QuotationCode;
use cotiza_core::config::{AppConfig, LoadOptions};
use cotiza_core::domain::quotation::QuotationStatus;
use cotiza_db::{connect, migrations, QuotationRepository, RepositoryError, SqlQuotationRepository};

pub fn run(code: &str, status: &str) -> CommandResult {
    let target = match status.parse::<QuotationStatus>() {
        Ok(target) => target,
        Err(error) => {
            return CommandResult::failure("status", "invalid_status", error, 2);
        }
    };

    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "status",
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
                "status",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let code = QuotationCode(code.to_string());
    let result = runtime.block_on(async {
        let pool = connect(&config.database)
            .await
            .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;
        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let repository = SqlQuotationRepository::new(pool.clone());
        let updated = repository.update_status(&code, target).await.map_err(|error| match error {
            RepositoryError::NotFound(_) => ("not_found", error.to_string(), 6u8),
            RepositoryError::Domain(_) => ("invalid_transition", error.to_string(), 6u8),
            other => ("query", other.to_string(), 4u8),
        })?;
        pool.close().await;
        Ok::<_, (&'static str, String, u8)>(updated)
    });

    match result {
        Ok(updated) => CommandResult::success(
            "status",
            format!("{} is now {}", updated.code, updated.status.as_str()),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("status", error_class, message, exit_code)
        }
    }
}
