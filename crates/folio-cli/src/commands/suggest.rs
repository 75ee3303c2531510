use folio_core::error::FolioError;
use std::path::PathBuf;

use crate::output;
use crate::Backend;

pub fn run(
    pdf_file: PathBuf,
    name: Option<String>,
    dpi: u32,
    backend: Backend,
    output_file: Option<PathBuf>,
) -> Result<(), FolioError> {
    let pdf_bytes = std::fs::read(&pdf_file)?;
    let name = name.unwrap_or_else(|| {
        pdf_file
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Imported template".to_string())
    });

    let source = super::glyph_source(backend);
    log::debug!("extracting {} with {}", pdf_file.display(), source.backend_name());
    let suggested = folio_core::suggest_from_pdf(&pdf_bytes, source.as_ref(), dpi, &name)?;

    match output_file {
        Some(path) => {
            // Only the spec is saved; it loads straight back with --template.
            let json = serde_json::to_string_pretty(&suggested.spec)?;
            std::fs::write(&path, json)?;
            eprintln!(
                "Drafted '{}' with {} area(s), written to {}",
                suggested.spec.meta.name,
                suggested.spec.areas.iter().count(),
                path.display()
            );
        }
        None => output::json::print_spec(&suggested.spec)?,
    }

    output::table::print_suggestion_notes(&suggested);
    Ok(())
}
