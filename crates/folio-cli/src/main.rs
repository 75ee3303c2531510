mod commands;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use folio_core::render::format::DateFormat;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "folio",
    version,
    about = "Invoice layout engine: render invoices from templates and draft templates from PDFs"
)]
struct Cli {
    /// Log more (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render an invoice to HTML, PDF or a PNG preview
    Render {
        /// Invoice JSON (items, client, totals)
        invoice_file: PathBuf,

        /// Issuing company JSON
        #[arg(short, long, value_name = "FILE")]
        company: PathBuf,

        /// Template spec JSON file
        #[arg(short, long, value_name = "FILE", conflicts_with = "preset")]
        template: Option<PathBuf>,

        /// Curated template: minimal, modern, classic (default: minimal)
        #[arg(short, long, value_name = "NAME")]
        preset: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "html")]
        format: RenderFormat,

        /// Write output to a file instead of stdout
        #[arg(short = 'O', long = "out", value_name = "FILE")]
        out: Option<PathBuf>,

        /// Show the contact person under business client names
        #[arg(long)]
        include_contact_name: bool,

        /// Drop tax rate columns from the items table
        #[arg(long)]
        hide_tax_column: bool,

        /// Date order: US (MM/DD/YYYY) or AU (DD/MM/YYYY)
        #[arg(long, default_value = "AU")]
        date_format: DateFormat,

        /// Chrome/Chromium binary used for pdf and png output
        #[arg(long, env = "FOLIO_CHROME", value_name = "PATH")]
        chrome: Option<PathBuf>,
    },
    /// Extract and classify the text of a PDF's first page
    Extract {
        /// Path to PDF file
        input_file: PathBuf,

        /// Resolution of the returned coordinates
        #[arg(long, default_value_t = folio_core::extraction::DEFAULT_DPI)]
        dpi: u32,

        /// Text extraction backend
        #[arg(short, long, value_enum, default_value = "lopdf")]
        backend: Backend,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,
    },
    /// Draft a template spec from a PDF
    Suggest {
        /// Path to PDF file
        input_file: PathBuf,

        /// Template name (default: the file stem)
        #[arg(short, long)]
        name: Option<String>,

        #[arg(long, default_value_t = folio_core::extraction::DEFAULT_DPI)]
        dpi: u32,

        #[arg(short, long, value_enum, default_value = "lopdf")]
        backend: Backend,

        /// Write the draft spec JSON to a file
        #[arg(short = 'O', long = "out", value_name = "FILE")]
        out: Option<PathBuf>,
    },
    /// Manage and inspect templates
    Templates {
        #[command(subcommand)]
        action: TemplatesAction,
    },
    /// Check that the PDF backend can start
    Health {
        #[arg(long, env = "FOLIO_CHROME", value_name = "PATH")]
        chrome: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum TemplatesAction {
    /// List curated templates
    List,
    /// Print a curated template's JSON
    Show {
        /// Preset name (e.g., "modern")
        preset: String,
    },
    /// Validate a template spec file
    Validate {
        /// Path to template JSON
        file: PathBuf,
    },
    /// How many items fit before the page grows
    Capacity {
        /// Preset name or path to template JSON
        template: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum RenderFormat {
    Html,
    Pdf,
    Png,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum Backend {
    /// Built-in content stream interpreter
    Lopdf,
    /// poppler's pdftotext
    Pdftotext,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Render {
            invoice_file,
            company,
            template,
            preset,
            format,
            out,
            include_contact_name,
            hide_tax_column,
            date_format,
            chrome,
        } => commands::render::run(commands::render::RenderArgs {
            invoice_file,
            company_file: company,
            template,
            preset,
            format,
            out,
            options: folio_core::RenderOptions {
                include_contact_name,
                hide_tax_column,
                date_format,
            },
            chrome,
        }),
        Commands::Extract {
            input_file,
            dpi,
            backend,
            output,
        } => commands::extract::run(input_file, dpi, backend, &output),
        Commands::Suggest {
            input_file,
            name,
            dpi,
            backend,
            out,
        } => commands::suggest::run(input_file, name, dpi, backend, out),
        Commands::Templates { action } => match action {
            TemplatesAction::List => commands::templates::list(),
            TemplatesAction::Show { preset } => commands::templates::show(&preset),
            TemplatesAction::Validate { file } => commands::templates::validate(&file),
            TemplatesAction::Capacity { template } => commands::templates::capacity(&template),
        },
        Commands::Health { chrome } => commands::render::health(chrome),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
