use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub pdf: PdfConfig,
    pub branding: BrandingConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct PdfConfig {
    /// Explicit converter path; when unset the binary is discovered on PATH.
    pub wkhtmltopdf_path: Option<String>,
    pub render_timeout_secs: u64,
    /// Directory of Tera templates; when unset the embedded template is used.
    pub template_dir: Option<PathBuf>,
    pub output_dir: PathBuf,
}

/// Injected document theming. Passed explicitly into the render step; the
/// renderer never reads ambient theme state.
#[derive(Clone, Debug, Serialize)]
pub struct BrandingConfig {
    pub company_name: String,
    pub primary_color: String,
    pub secondary_color: String,
    pub accent_color: String,
    pub validity_note: String,
    pub logo_paths: Vec<PathBuf>,
    pub watermark_path: Option<PathBuf>,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub wkhtmltopdf_path: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://cotiza.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            pdf: PdfConfig {
                wkhtmltopdf_path: None,
                render_timeout_secs: 30,
                template_dir: None,
                output_dir: PathBuf::from("."),
            },
            branding: BrandingConfig {
                company_name: "CCD Certificaciones".to_string(),
                primary_color: "#1e3a8a".to_string(),
                secondary_color: "#2563eb".to_string(),
                accent_color: "#dc2626".to_string(),
                validity_note: "Cotización válida por 48 horas".to_string(),
                logo_paths: Vec::new(),
                watermark_path: None,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("cotiza.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(pdf) = patch.pdf {
            if let Some(wkhtmltopdf_path) = pdf.wkhtmltopdf_path {
                self.pdf.wkhtmltopdf_path = Some(wkhtmltopdf_path);
            }
            if let Some(render_timeout_secs) = pdf.render_timeout_secs {
                self.pdf.render_timeout_secs = render_timeout_secs;
            }
            if let Some(template_dir) = pdf.template_dir {
                self.pdf.template_dir = Some(template_dir);
            }
            if let Some(output_dir) = pdf.output_dir {
                self.pdf.output_dir = output_dir;
            }
        }

        if let Some(branding) = patch.branding {
            if let Some(company_name) = branding.company_name {
                self.branding.company_name = company_name;
            }
            if let Some(primary_color) = branding.primary_color {
                self.branding.primary_color = primary_color;
            }
            if let Some(secondary_color) = branding.secondary_color {
                self.branding.secondary_color = secondary_color;
            }
            if let Some(accent_color) = branding.accent_color {
                self.branding.accent_color = accent_color;
            }
            if let Some(validity_note) = branding.validity_note {
                self.branding.validity_note = validity_note;
            }
            if let Some(logo_paths) = branding.logo_paths {
                self.branding.logo_paths = logo_paths;
            }
            if let Some(watermark_path) = branding.watermark_path {
                self.branding.watermark_path = Some(watermark_path);
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("COTIZA_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("COTIZA_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse_u32("COTIZA_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("COTIZA_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("COTIZA_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("COTIZA_PDF_WKHTMLTOPDF_PATH") {
            self.pdf.wkhtmltopdf_path = Some(value);
        }
        if let Some(value) = read_env("COTIZA_PDF_RENDER_TIMEOUT_SECS") {
            self.pdf.render_timeout_secs = parse_u64("COTIZA_PDF_RENDER_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("COTIZA_PDF_TEMPLATE_DIR") {
            self.pdf.template_dir = Some(PathBuf::from(value));
        }
        if let Some(value) = read_env("COTIZA_PDF_OUTPUT_DIR") {
            self.pdf.output_dir = PathBuf::from(value);
        }

        if let Some(value) = read_env("COTIZA_BRANDING_COMPANY_NAME") {
            self.branding.company_name = value;
        }
        if let Some(value) = read_env("COTIZA_BRANDING_PRIMARY_COLOR") {
            self.branding.primary_color = value;
        }
        if let Some(value) = read_env("COTIZA_BRANDING_SECONDARY_COLOR") {
            self.branding.secondary_color = value;
        }
        if let Some(value) = read_env("COTIZA_BRANDING_ACCENT_COLOR") {
            self.branding.accent_color = value;
        }

        let log_level = read_env("COTIZA_LOGGING_LEVEL").or_else(|| read_env("COTIZA_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("COTIZA_LOGGING_FORMAT").or_else(|| read_env("COTIZA_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(output_dir) = overrides.output_dir {
            self.pdf.output_dir = output_dir;
        }
        if let Some(wkhtmltopdf_path) = overrides.wkhtmltopdf_path {
            self.pdf.wkhtmltopdf_path = Some(wkhtmltopdf_path);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_pdf(&self.pdf)?;
        validate_branding(&self.branding)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("cotiza.toml"), PathBuf::from("config/cotiza.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_pdf(pdf: &PdfConfig) -> Result<(), ConfigError> {
    if pdf.render_timeout_secs == 0 || pdf.render_timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "pdf.render_timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_branding(branding: &BrandingConfig) -> Result<(), ConfigError> {
    if branding.company_name.trim().is_empty() {
        return Err(ConfigError::Validation("branding.company_name must not be empty".to_string()));
    }

    for (field, value) in [
        ("branding.primary_color", &branding.primary_color),
        ("branding.secondary_color", &branding.secondary_color),
        ("branding.accent_color", &branding.accent_color),
    ] {
        let valid = value.starts_with('#')
            && matches!(value.len(), 4 | 7)
            && value[1..].chars().all(|ch| ch.is_ascii_hexdigit());
        if !valid {
            return Err(ConfigError::Validation(format!(
                "{field} must be a hex color like `#1e3a8a`, got `{value}`"
            )));
        }
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    pdf: Option<PdfPatch>,
    branding: Option<BrandingPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct PdfPatch {
    wkhtmltopdf_path: Option<String>,
    render_timeout_secs: Option<u64>,
    template_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct BrandingPatch {
    company_name: Option<String>,
    primary_color: Option<String>,
    secondary_color: Option<String>,
    accent_color: Option<String>,
    validity_note: Option<String>,
    logo_paths: Option<Vec<PathBuf>>,
    watermark_path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
