//! HTML rendering and PDF conversion.
//!
//! The quotation view renders through Tera and is converted by wkhtmltopdf
//! at A4 portrait with 10mm margins. Conversion runs under a bounded
//! timeout, and capture refuses to start while any referenced visual asset
//! is missing from disk.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tera::{Context, Tera};
use tokio::process::Command;
use tracing::{error, info, warn};

use cotiza_core::config::PdfConfig;

use crate::view::DocumentView;

const TEMPLATE_NAME: &str = "acuerdo_comercial.html.tera";
const EMBEDDED_TEMPLATE: &str =
    include_str!("../../../templates/quotation/acuerdo_comercial.html.tera");

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("template error: {0}")]
    Template(String),
    #[error("wkhtmltopdf not found; install it or set pdf.wkhtmltopdf_path")]
    ToolNotFound,
    #[error("required visual asset is missing: {0}")]
    AssetMissing(PathBuf),
    #[error("conversion error: {0}")]
    Conversion(String),
    #[error("render timed out after {0:?}")]
    Timeout(Duration),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Resolve the converter binary: explicit config path first, then PATH.
pub fn converter_path(config: &PdfConfig) -> Option<String> {
    config
        .wkhtmltopdf_path
        .clone()
        .or_else(|| which::which("wkhtmltopdf").ok().map(|p| p.to_string_lossy().to_string()))
}

pub struct QuotationRenderer {
    tera: Tera,
    wkhtmltopdf_path: Option<String>,
    render_timeout: Duration,
}

impl QuotationRenderer {
    /// Build a renderer from config: templates from `pdf.template_dir` when
    /// set, the embedded template otherwise; the converter from
    /// `pdf.wkhtmltopdf_path` or PATH discovery.
    pub fn new(config: &PdfConfig) -> Result<Self, RenderError> {
        let tera = match &config.template_dir {
            Some(dir) => Tera::new(&format!("{}/**/*.tera", dir.display()))
                .map_err(|error| RenderError::Template(error.to_string()))?,
            None => embedded_tera()?,
        };

        let wkhtmltopdf_path = converter_path(config);

        if wkhtmltopdf_path.is_none() {
            warn!("wkhtmltopdf not found in PATH; PDF conversion will be unavailable");
        }

        Ok(Self {
            tera,
            wkhtmltopdf_path,
            render_timeout: Duration::from_secs(config.render_timeout_secs),
        })
    }

    pub fn with_embedded_template() -> Result<Self, RenderError> {
        Ok(Self {
            tera: embedded_tera()?,
            wkhtmltopdf_path: which::which("wkhtmltopdf")
                .ok()
                .map(|p| p.to_string_lossy().to_string()),
            render_timeout: Duration::from_secs(30),
        })
    }

    /// Render the document view to HTML. Used for previews and as the first
    /// half of [`Self::render_pdf`].
    pub fn render_html(&self, view: &DocumentView) -> Result<String, RenderError> {
        let context = Context::from_serialize(view)
            .map_err(|error| RenderError::Template(error.to_string()))?;
        self.tera
            .render(TEMPLATE_NAME, &context)
            .map_err(|error| RenderError::Template(error.to_string()))
    }

    /// Serialize the view to PDF bytes at fixed A4/10mm page geometry.
    pub async fn render_pdf(&self, view: &DocumentView) -> Result<Vec<u8>, RenderError> {
        for asset in view.asset_paths() {
            if !asset.exists() {
                return Err(RenderError::AssetMissing(asset));
            }
        }

        let html = self.render_html(view)?;
        let wkhtmltopdf = self.wkhtmltopdf_path.as_deref().ok_or(RenderError::ToolNotFound)?;

        let temp_dir = std::env::temp_dir();
        let html_path = temp_dir.join(format!("cotiza_{}.html", uuid::Uuid::new_v4()));
        let pdf_path = temp_dir.join(format!("cotiza_{}.pdf", uuid::Uuid::new_v4()));

        tokio::fs::write(&html_path, &html).await?;

        let result = self.convert(wkhtmltopdf, &html_path, &pdf_path).await;

        let _ = tokio::fs::remove_file(&html_path).await;
        let pdf_bytes = match result {
            Ok(()) => tokio::fs::read(&pdf_path).await,
            Err(render_error) => {
                let _ = tokio::fs::remove_file(&pdf_path).await;
                return Err(render_error);
            }
        };
        let _ = tokio::fs::remove_file(&pdf_path).await;

        let pdf_bytes = pdf_bytes?;
        info!(code = %view.code, size = pdf_bytes.len(), "quotation PDF generated");
        Ok(pdf_bytes)
    }

    async fn convert(
        &self,
        wkhtmltopdf: &str,
        html_path: &std::path::Path,
        pdf_path: &std::path::Path,
    ) -> Result<(), RenderError> {
        let mut command = Command::new(wkhtmltopdf);
        command
            .arg("--page-size")
            .arg("A4")
            .arg("--orientation")
            .arg("Portrait")
            .arg("--margin-top")
            .arg("10mm")
            .arg("--margin-bottom")
            .arg("10mm")
            .arg("--margin-left")
            .arg("10mm")
            .arg("--margin-right")
            .arg("10mm")
            .arg("--dpi")
            .arg("192")
            .arg("--image-quality")
            .arg("98")
            .arg("--encoding")
            .arg("utf-8")
            .arg("--enable-local-file-access")
            .arg(html_path)
            .arg(pdf_path)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let output = match tokio::time::timeout(self.render_timeout, command.output()).await {
            Ok(result) => result?,
            Err(_) => {
                error!(timeout_secs = self.render_timeout.as_secs(), "wkhtmltopdf timed out");
                return Err(RenderError::Timeout(self.render_timeout));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!(stderr = %stderr, "wkhtmltopdf failed");
            return Err(RenderError::Conversion(stderr.to_string()));
        }

        Ok(())
    }
}

fn embedded_tera() -> Result<Tera, RenderError> {
    let mut tera = Tera::default();
    tera.add_raw_template(TEMPLATE_NAME, EMBEDDED_TEMPLATE)
        .map_err(|error| RenderError::Template(error.to_string()))?;
    Ok(tera)
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use cotiza_core::pricing::PricingPolicy;

    use crate::view::fixtures::{advisor, bank_account, branding, quotation, standard, steps};
    use crate::view::build_document_view;

    use super::{QuotationRenderer, RenderError};

    fn view() -> crate::view::DocumentView {
        let quotation = quotation(PricingPolicy::PercentDiscount {
            discount_percent: Decimal::from(10),
        });
        build_document_view(
            &quotation,
            &[standard()],
            Some(&advisor()),
            &[bank_account()],
            &steps(),
            &branding(),
        )
    }

    #[test]
    fn html_contains_code_client_and_totals() {
        let renderer = QuotationRenderer::with_embedded_template().expect("renderer");
        let html = renderer.render_html(&view()).expect("render html");

        assert!(html.contains("COT-2026-08-00007"));
        assert!(html.contains("Constructora Andina S.A.C."));
        assert!(html.contains("ACUERDO COMERCIAL"));
        assert!(html.contains("DESCUENTO (10%)"));
        assert!(html.contains("Soles Peruanos"));
    }

    #[test]
    fn html_renders_dashes_for_disabled_components() {
        let renderer = QuotationRenderer::with_embedded_template().expect("renderer");
        let html = renderer.render_html(&view()).expect("render html");
        assert!(html.contains(">-<"));
    }

    #[tokio::test]
    async fn missing_tool_is_reported_before_conversion() {
        let mut renderer = QuotationRenderer::with_embedded_template().expect("renderer");
        renderer.wkhtmltopdf_path = None;

        let error = renderer.render_pdf(&view()).await.expect_err("render should fail");
        assert!(matches!(error, RenderError::ToolNotFound));
    }

    #[tokio::test]
    async fn missing_asset_blocks_capture() {
        let renderer = QuotationRenderer::with_embedded_template().expect("renderer");
        let mut view = view();
        view.logo_paths.push("/definitely/not/here/logo.png".to_string());

        let error = renderer.render_pdf(&view).await.expect_err("render should fail");
        assert!(matches!(error, RenderError::AssetMissing(path) if path.ends_with("logo.png")));
    }
}
