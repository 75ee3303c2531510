pub mod classify;
pub mod error;
pub mod extraction;
pub mod layout;
pub mod model;
pub mod raster;
pub mod render;
pub mod suggest;
pub mod template;

use error::FolioError;
use extraction::GlyphSource;
use suggest::SuggestedTemplate;

pub use layout::{layout, max_items_for_template, AdjustedLayout};
pub use render::{render, RenderOptions};

/// Main API entry point for uploads: extract page one of a PDF and draft a
/// template from it.
///
/// Extraction failures abort the whole call. Validation problems of the
/// draft do not; they are reported in [`SuggestedTemplate::errors`].
pub fn suggest_from_pdf(
    pdf_bytes: &[u8],
    source: &dyn GlyphSource,
    dpi: u32,
    name: &str,
) -> Result<SuggestedTemplate, FolioError> {
    let extracted = extraction::extract_text(pdf_bytes, source, dpi)?;
    Ok(suggest::suggest_template(&extracted, name))
}
