use cotiza_core::config::{AppConfig, LoadOptions, LogFormat};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ConfigReport {
    database_url: String,
    database_max_connections: u32,
    database_timeout_secs: u64,
    pdf_converter: String,
    pdf_render_timeout_secs: u64,
    pdf_template_source: String,
    pdf_output_dir: String,
    branding_company_name: String,
    branding_primary_color: String,
    branding_secondary_color: String,
    branding_accent_color: String,
    logging_level: String,
    logging_format: &'static str,
}

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return format!("{{\"status\":\"error\",\"message\":\"{}\"}}", escape(&error.to_string()));
        }
    };

    let report = ConfigReport {
        database_url: config.database.url.clone(),
        database_max_connections: config.database.max_connections,
        database_timeout_secs: config.database.timeout_secs,
        pdf_converter: cotiza_pdf::render::converter_path(&config.pdf)
            .unwrap_or_else(|| "not found".to_string()),
        pdf_render_timeout_secs: config.pdf.render_timeout_secs,
        pdf_template_source: config
            .pdf
            .template_dir
            .as_ref()
            .map(|dir| dir.display().to_string())
            .unwrap_or_else(|| "embedded".to_string()),
        pdf_output_dir: config.pdf.output_dir.display().to_string(),
        branding_company_name: config.branding.company_name.clone(),
        branding_primary_color: config.branding.primary_color.clone(),
        branding_secondary_color: config.branding.secondary_color.clone(),
        branding_accent_color: config.branding.accent_color.clone(),
        logging_level: config.logging.level.clone(),
        logging_format: match config.logging.format {
            LogFormat::Compact => "compact",
            LogFormat::Pretty => "pretty",
            LogFormat::Json => "json",
        },
    };

    serde_json::to_string_pretty(&report)
        .unwrap_or_else(|error| format!("{{\"status\":\"error\",\"message\":\"{}\"}}", escape(&error.to_string())))
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
