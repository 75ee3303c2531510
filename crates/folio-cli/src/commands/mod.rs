pub mod extract;
pub mod render;
pub mod suggest;
pub mod templates;

use crate::Backend;
use folio_core::extraction::content_stream::ContentStreamSource;
use folio_core::extraction::pdftotext::PdftotextSource;
use folio_core::extraction::GlyphSource;

pub(crate) fn glyph_source(backend: Backend) -> Box<dyn GlyphSource> {
    match backend {
        Backend::Lopdf => Box::new(ContentStreamSource::new()),
        Backend::Pdftotext => Box::new(PdftotextSource::new()),
    }
}
