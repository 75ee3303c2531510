pub mod chrome;

use crate::error::FolioError;
use crate::model::{CompanyData, InvoiceData};
use crate::render::{render, RenderOptions};
use crate::template::schema::TemplateSpec;
use serde::{Deserialize, Serialize};

/// Page margins applied by the printer, in mm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PrintMargins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl PrintMargins {
    pub fn is_zero(&self) -> bool {
        self.top == 0.0 && self.right == 0.0 && self.bottom == 0.0 && self.left == 0.0
    }
}

/// Options for PDF output.
///
/// Rendered markup positions every area from the page origin, so the
/// printer margins stay at zero unless a caller asks otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdfOptions {
    pub margins: PrintMargins,
    pub print_background: bool,
    pub prefer_css_page_size: bool,
}

impl Default for PdfOptions {
    fn default() -> Self {
        PdfOptions {
            margins: PrintMargins::default(),
            print_background: true,
            prefer_css_page_size: true,
        }
    }
}

/// Viewport for PNG previews, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PreviewOptions {
    pub width: u32,
    pub height: u32,
    pub device_scale_factor: f64,
}

impl Default for PreviewOptions {
    fn default() -> Self {
        PreviewOptions {
            width: 800,
            height: 1200,
            device_scale_factor: 2.0,
        }
    }
}

/// One live browser page. Used once, then closed.
pub trait BrowserSession {
    fn set_content(&mut self, html: &str) -> Result<(), FolioError>;

    fn pdf(&mut self, options: &PdfOptions) -> Result<Vec<u8>, FolioError>;

    fn screenshot(&mut self, options: &PreviewOptions) -> Result<Vec<u8>, FolioError>;

    /// Release the session and everything it holds.
    fn close(self: Box<Self>) -> Result<(), FolioError>;
}

/// Trait for headless browser backends that turn HTML into PDF or PNG.
pub trait Rasterizer: Send + Sync {
    fn launch(&self) -> Result<Box<dyn BrowserSession>, FolioError>;

    /// Name of this backend (for diagnostics).
    fn backend_name(&self) -> &str;
}

/// Run `job` on a fresh session loaded with `html`, closing the session on
/// every path out.
fn with_session<T>(
    rasterizer: &dyn Rasterizer,
    html: &str,
    job: impl FnOnce(&mut dyn BrowserSession) -> Result<T, FolioError>,
) -> Result<T, FolioError> {
    let mut session = rasterizer.launch()?;

    let result = session
        .set_content(html)
        .and_then(|()| job(session.as_mut()));

    if let Err(e) = session.close() {
        log::warn!("{}: failed to close browser session: {e}", rasterizer.backend_name());
    }

    result
}

fn wrap(stage: &str, err: FolioError) -> FolioError {
    match err {
        FolioError::BrowserNotFound => FolioError::BrowserNotFound,
        other => FolioError::generation_failed(stage, other),
    }
}

/// Render an invoice and print it to PDF bytes.
pub fn generate_pdf(
    invoice: &InvoiceData,
    company: &CompanyData,
    template: &TemplateSpec,
    render_options: &RenderOptions,
    pdf_options: &PdfOptions,
    rasterizer: &dyn Rasterizer,
) -> Result<Vec<u8>, FolioError> {
    let html = render(invoice, company, template, render_options);
    let bytes = with_session(rasterizer, &html, |session| session.pdf(pdf_options))
        .map_err(|e| wrap("PDF", e))?;

    log::debug!(
        "generated PDF for invoice {} via {} ({} bytes)",
        invoice.number,
        rasterizer.backend_name(),
        bytes.len()
    );
    Ok(bytes)
}

/// Render an invoice and capture a PNG preview of the first screen.
pub fn generate_preview(
    invoice: &InvoiceData,
    company: &CompanyData,
    template: &TemplateSpec,
    render_options: &RenderOptions,
    preview_options: &PreviewOptions,
    rasterizer: &dyn Rasterizer,
) -> Result<Vec<u8>, FolioError> {
    let html = render(invoice, company, template, render_options);
    let bytes = with_session(rasterizer, &html, |session| {
        session.screenshot(preview_options)
    })
    .map_err(|e| wrap("Preview", e))?;

    log::debug!(
        "generated preview for invoice {} via {} ({} bytes)",
        invoice.number,
        rasterizer.backend_name(),
        bytes.len()
    );
    Ok(bytes)
}

/// Launch and immediately close a session to check the backend works.
pub fn health_check(rasterizer: &dyn Rasterizer) -> Result<(), FolioError> {
    let session = rasterizer.launch()?;
    session.close()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct Counters {
        launched: AtomicUsize,
        closed: AtomicUsize,
    }

    struct FakeRasterizer {
        counters: Arc<Counters>,
        fail_content: bool,
        fail_pdf: bool,
    }

    struct FakeSession {
        counters: Arc<Counters>,
        fail_content: bool,
        fail_pdf: bool,
        html: String,
    }

    impl BrowserSession for FakeSession {
        fn set_content(&mut self, html: &str) -> Result<(), FolioError> {
            if self.fail_content {
                return Err(FolioError::Rasterization("page crashed".into()));
            }
            self.html = html.to_string();
            Ok(())
        }

        fn pdf(&mut self, _options: &PdfOptions) -> Result<Vec<u8>, FolioError> {
            if self.fail_pdf {
                return Err(FolioError::Rasterization("printing failed".into()));
            }
            Ok(format!("%PDF-{}", self.html.len()).into_bytes())
        }

        fn screenshot(&mut self, options: &PreviewOptions) -> Result<Vec<u8>, FolioError> {
            Ok(vec![0x89, options.width as u8])
        }

        fn close(self: Box<Self>) -> Result<(), FolioError> {
            self.counters.closed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    impl Rasterizer for FakeRasterizer {
        fn launch(&self) -> Result<Box<dyn BrowserSession>, FolioError> {
            self.counters.launched.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(FakeSession {
                counters: self.counters.clone(),
                fail_content: self.fail_content,
                fail_pdf: self.fail_pdf,
                html: String::new(),
            }))
        }

        fn backend_name(&self) -> &str {
            "fake"
        }
    }

    fn fake(fail_content: bool, fail_pdf: bool) -> (FakeRasterizer, Arc<Counters>) {
        let counters = Arc::new(Counters::default());
        (
            FakeRasterizer {
                counters: counters.clone(),
                fail_content,
                fail_pdf,
            },
            counters,
        )
    }

    #[test]
    fn test_session_closed_on_success() {
        let (rasterizer, counters) = fake(false, false);
        let bytes = with_session(&rasterizer, "<p>x</p>", |s| s.pdf(&PdfOptions::default())).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
        assert_eq!(counters.launched.load(Ordering::SeqCst), 1);
        assert_eq!(counters.closed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_session_closed_when_content_fails() {
        let (rasterizer, counters) = fake(true, false);
        let result = with_session(&rasterizer, "<p>x</p>", |s| s.pdf(&PdfOptions::default()));
        assert!(result.is_err());
        assert_eq!(counters.closed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_session_closed_when_printing_fails() {
        let (rasterizer, counters) = fake(false, true);
        let err = with_session(&rasterizer, "<p>x</p>", |s| s.pdf(&PdfOptions::default()))
            .map_err(|e| wrap("PDF", e))
            .unwrap_err();
        assert_eq!(err.to_string(), "PDF generation failed: printing failed");
        assert_eq!(counters.closed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_health_check_launches_and_closes() {
        let (rasterizer, counters) = fake(false, false);
        health_check(&rasterizer).unwrap();
        assert_eq!(counters.launched.load(Ordering::SeqCst), 1);
        assert_eq!(counters.closed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_default_options() {
        let pdf = PdfOptions::default();
        assert!(pdf.print_background && pdf.prefer_css_page_size);
        assert!(pdf.margins.is_zero());
        let preview = PreviewOptions::default();
        assert_eq!((preview.width, preview.height), (800, 1200));
        assert_eq!(preview.device_scale_factor, 2.0);
    }
}
