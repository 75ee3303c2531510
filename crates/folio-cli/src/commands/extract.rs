use folio_core::classify::{classify_items, detect_tables};
use folio_core::error::FolioError;
use folio_core::extraction;
use std::path::PathBuf;

use crate::output;
use crate::Backend;

pub fn run(
    pdf_file: PathBuf,
    dpi: u32,
    backend: Backend,
    output_format: &str,
) -> Result<(), FolioError> {
    let pdf_bytes = std::fs::read(&pdf_file)?;
    let source = super::glyph_source(backend);
    log::debug!("extracting {} with {}", pdf_file.display(), source.backend_name());
    let extracted = extraction::extract_text(&pdf_bytes, source.as_ref(), dpi)?;

    let items = classify_items(&extracted);
    let tables = detect_tables(&extracted.items);

    match output_format {
        "json" => output::json::print_extraction(&extracted, &items, &tables)?,
        _ => output::table::print_extraction(&extracted, &items, &tables),
    }

    Ok(())
}
