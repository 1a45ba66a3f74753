//! Document assembly for quotations: a Tera-rendered HTML view converted to
//! PDF by wkhtmltopdf, optionally concatenated page-wise with the active
//! attachment.

pub mod merge;
pub mod render;
pub mod view;

pub use merge::{merge_pdfs, MergeError};
pub use render::{QuotationRenderer, RenderError};
pub use view::{build_document_view, DocumentView};

/// Download name for a generated quotation document.
pub fn download_file_name(code: &str) -> String {
    format!("{code}.pdf")
}

#[cfg(test)]
mod tests {
    use super::download_file_name;

    #[test]
    fn download_name_is_the_code_with_pdf_extension() {
        assert_eq!(download_file_name("COT-2026-08-00001"), "COT-2026-08-00001.pdf");
    }
}
