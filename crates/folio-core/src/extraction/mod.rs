pub mod content_stream;
pub mod pdftotext;

use crate::error::FolioError;
use serde::{Deserialize, Serialize};

/// Resolution extracted coordinates are expressed in unless told otherwise.
pub const DEFAULT_DPI: u32 = 300;

/// Width of one character, as a fraction of the font size, when the backend
/// reports no advance width.
const FALLBACK_CHAR_WIDTH: f64 = 0.5;

/// A run of text as positioned by the PDF, in 72-DPI document space.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphRun {
    pub text: String,
    /// `[scaleX, skewY, skewX, scaleY, translateX, translateY]`, with the
    /// origin at the bottom-left of the page.
    pub transform: [f64; 6],
    /// Advance width in document units, when the backend knows it.
    pub width: Option<f64>,
    pub font_name: String,
}

/// Everything a backend reports about the first page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageGlyphs {
    /// Page width in points.
    pub width: f64,
    /// Page height in points.
    pub height: f64,
    pub runs: Vec<GlyphRun>,
}

/// Trait for PDF text extraction backends.
pub trait GlyphSource: Send + Sync {
    /// Page size and positioned text runs of the first page.
    fn first_page(&self, pdf_bytes: &[u8]) -> Result<PageGlyphs, FolioError>;

    /// Name of this extraction backend (for diagnostics).
    fn backend_name(&self) -> &str;
}

/// A positioned text fragment in device pixels, origin at the top-left.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextItem {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub font_size: f64,
    pub font_name: String,
    pub transform: [f64; 6],
}

/// All fragments of the first page at a given DPI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedText {
    pub items: Vec<TextItem>,
    pub page_width: f64,
    pub page_height: f64,
    pub dpi: u32,
}

/// Extract positioned text fragments from the first page of a PDF.
///
/// Either the whole page is extracted or the call fails; there are no
/// partial results.
pub fn extract_text(
    pdf_bytes: &[u8],
    source: &dyn GlyphSource,
    dpi: u32,
) -> Result<ExtractedText, FolioError> {
    if dpi == 0 {
        return Err(FolioError::Extraction("DPI must be positive".into()));
    }

    let page = source.first_page(pdf_bytes)?;
    let extracted = to_device_space(page, dpi);

    log::debug!(
        "{}: extracted {} fragments from a {:.0}x{:.0}px page at {} DPI",
        source.backend_name(),
        extracted.items.len(),
        extracted.page_width,
        extracted.page_height,
        dpi
    );
    Ok(extracted)
}

/// Convert document-space runs to top-left-origin pixels at `dpi`.
///
/// Skew components are ignored: text is assumed to be axis-aligned.
pub fn to_device_space(page: PageGlyphs, dpi: u32) -> ExtractedText {
    let scale = f64::from(dpi) / 72.0;
    let page_width = page.width * scale;
    let page_height = page.height * scale;

    let items = page
        .runs
        .into_iter()
        .filter_map(|run| {
            let text = run.text.trim();
            if text.is_empty() {
                return None;
            }

            let [_, _, _, scale_y, translate_x, translate_y] = run.transform;
            let font_size = scale_y.abs() * scale;
            let width = match run.width {
                Some(advance) => advance * scale,
                None => text.chars().count() as f64 * font_size * FALLBACK_CHAR_WIDTH,
            };

            Some(TextItem {
                text: text.to_string(),
                x: translate_x * scale,
                y: page_height - translate_y * scale - font_size,
                width,
                height: font_size,
                font_size,
                font_name: run.font_name,
                transform: run.transform,
            })
        })
        .collect();

    ExtractedText {
        items,
        page_width,
        page_height,
        dpi,
    }
}
