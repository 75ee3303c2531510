use folio_core::error::FolioError;
use folio_core::extraction::pdftotext::PdftotextSource;
use folio_core::model::{CompanyData, InvoiceData};
use folio_core::raster::chrome::ChromeRasterizer;
use folio_core::raster::{self, PdfOptions, PreviewOptions};
use folio_core::template::builtin;
use folio_core::template::schema::TemplateSpec;
use folio_core::RenderOptions;
use std::io::Write;
use std::path::PathBuf;

use crate::RenderFormat;

const DEFAULT_PRESET: &str = "minimal";

pub struct RenderArgs {
    pub invoice_file: PathBuf,
    pub company_file: PathBuf,
    pub template: Option<PathBuf>,
    pub preset: Option<String>,
    pub format: RenderFormat,
    pub out: Option<PathBuf>,
    pub options: RenderOptions,
    pub chrome: Option<PathBuf>,
}

pub fn run(args: RenderArgs) -> Result<(), FolioError> {
    let invoice: InvoiceData = serde_json::from_slice(&std::fs::read(&args.invoice_file)?)?;
    let company: CompanyData = serde_json::from_slice(&std::fs::read(&args.company_file)?)?;

    let template = match (&args.template, &args.preset) {
        (Some(path), _) => folio_core::template::load_template(path)?,
        (None, Some(name)) => builtin::load_preset(name)?,
        (None, None) => builtin::load_preset(DEFAULT_PRESET)?,
    };
    folio_core::template::validate_template(&template)?;
    warn_on_overflow(&template, &invoice);

    let bytes = match args.format {
        RenderFormat::Html => {
            folio_core::render(&invoice, &company, &template, &args.options).into_bytes()
        }
        RenderFormat::Pdf => raster::generate_pdf(
            &invoice,
            &company,
            &template,
            &args.options,
            &PdfOptions::default(),
            &rasterizer(args.chrome),
        )?,
        RenderFormat::Png => raster::generate_preview(
            &invoice,
            &company,
            &template,
            &args.options,
            &PreviewOptions::default(),
            &rasterizer(args.chrome),
        )?,
    };

    match args.out {
        Some(path) => {
            std::fs::write(&path, &bytes)?;
            eprintln!(
                "Rendered invoice {} ({} items) with '{}', written to {}",
                invoice.number,
                invoice.items.len(),
                template.meta.name,
                path.display()
            );
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&bytes)?;
            stdout.flush()?;
        }
    }

    Ok(())
}

pub fn health(chrome: Option<PathBuf>) -> Result<(), FolioError> {
    let rasterizer = rasterizer(chrome);
    raster::health_check(&rasterizer)?;
    println!("PDF backend is working.");

    if !PdftotextSource::is_available() {
        eprintln!("  note: pdftotext not found; use --backend lopdf for extraction");
    }
    Ok(())
}

fn rasterizer(chrome: Option<PathBuf>) -> ChromeRasterizer {
    match chrome {
        Some(path) => ChromeRasterizer::with_binary(path),
        None => ChromeRasterizer::new(),
    }
}

/// The page grows to fit, but users usually want to know.
fn warn_on_overflow(template: &TemplateSpec, invoice: &InvoiceData) {
    let capacity = folio_core::max_items_for_template(template);
    if invoice.items.len() > capacity {
        eprintln!(
            "  note: {} items exceed the {} that fit on '{}'; the page will be extended",
            invoice.items.len(),
            capacity,
            template.meta.name
        );
    }
}
