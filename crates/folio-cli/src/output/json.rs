use folio_core::classify::{ClassifiedItem, DetectedTable};
use folio_core::error::FolioError;
use folio_core::extraction::ExtractedText;
use folio_core::template::schema::TemplateSpec;
use serde::Serialize;

#[derive(Serialize)]
struct ExtractionReport<'a> {
    page_width: f64,
    page_height: f64,
    dpi: u32,
    items: &'a [ClassifiedItem],
    tables: &'a [DetectedTable],
}

pub fn print_extraction(
    extracted: &ExtractedText,
    items: &[ClassifiedItem],
    tables: &[DetectedTable],
) -> Result<(), FolioError> {
    let report = ExtractionReport {
        page_width: extracted.page_width,
        page_height: extracted.page_height,
        dpi: extracted.dpi,
        items,
        tables,
    };
    let json = serde_json::to_string_pretty(&report)?;
    println!("{json}");
    Ok(())
}

pub fn print_spec(spec: &TemplateSpec) -> Result<(), FolioError> {
    let json = serde_json::to_string_pretty(spec)?;
    println!("{json}");
    Ok(())
}
