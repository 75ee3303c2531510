use crate::error::FolioError;
use crate::raster::{BrowserSession, PdfOptions, PreviewOptions, PrintMargins, Rasterizer};
use crate::render::format::num;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Executable names tried on `PATH` when no binary is given.
const CANDIDATES: &[&str] = &[
    "google-chrome",
    "google-chrome-stable",
    "chromium",
    "chromium-browser",
    "chrome",
];

#[cfg(target_os = "macos")]
const APP_BUNDLES: &[&str] = &[
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
];

#[cfg(not(target_os = "macos"))]
const APP_BUNDLES: &[&str] = &[];

/// Rasterization backend driving a headless Chrome/Chromium binary.
///
/// Every session gets its own temp directory holding the page and the
/// printed output; it is removed when the session is closed or dropped.
pub struct ChromeRasterizer {
    binary: Option<PathBuf>,
}

impl ChromeRasterizer {
    /// Locate Chrome on `PATH` at launch time.
    pub fn new() -> Self {
        ChromeRasterizer { binary: None }
    }

    /// Use a specific Chrome/Chromium executable.
    pub fn with_binary(path: impl Into<PathBuf>) -> Self {
        ChromeRasterizer {
            binary: Some(path.into()),
        }
    }

    /// Check if a usable browser binary can be found.
    pub fn is_available(&self) -> bool {
        self.resolve_binary().is_ok()
    }

    fn resolve_binary(&self) -> Result<PathBuf, FolioError> {
        if let Some(path) = &self.binary {
            if path.is_file() {
                return Ok(path.clone());
            }
            // Bare names like "chromium" are looked up on PATH.
            return which::which(path).map_err(|_| FolioError::BrowserNotFound);
        }

        CANDIDATES
            .iter()
            .find_map(|name| which::which(name).ok())
            .or_else(|| {
                APP_BUNDLES
                    .iter()
                    .map(PathBuf::from)
                    .find(|path| path.is_file())
            })
            .ok_or(FolioError::BrowserNotFound)
    }
}

impl Default for ChromeRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Rasterizer for ChromeRasterizer {
    fn launch(&self) -> Result<Box<dyn BrowserSession>, FolioError> {
        let binary = self.resolve_binary()?;
        let workdir = tempfile::Builder::new().prefix("folio-chrome-").tempdir()?;
        log::debug!(
            "chrome session using {} in {}",
            binary.display(),
            workdir.path().display()
        );

        Ok(Box::new(ChromeSession {
            binary,
            workdir,
            html: None,
        }))
    }

    fn backend_name(&self) -> &str {
        "chrome"
    }
}

struct ChromeSession {
    binary: PathBuf,
    workdir: tempfile::TempDir,
    html: Option<String>,
}

impl ChromeSession {
    fn page_path(&self) -> PathBuf {
        self.workdir.path().join("page.html")
    }

    /// Write the page, optionally with an extra stylesheet appended to `<head>`.
    fn write_page(&self, extra_css: Option<&str>) -> Result<PathBuf, FolioError> {
        let html = self
            .html
            .as_deref()
            .ok_or_else(|| FolioError::Rasterization("no content loaded".into()))?;

        let page = match extra_css {
            Some(css) => inject_style(html, css),
            None => html.to_string(),
        };

        let path = self.page_path();
        std::fs::write(&path, page)?;
        Ok(path)
    }

    fn run(&self, args: Vec<String>, output: &Path) -> Result<Vec<u8>, FolioError> {
        let result = Command::new(&self.binary)
            .args(&args)
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    FolioError::BrowserNotFound
                } else {
                    FolioError::Rasterization(format!("failed to start {}: {e}", self.binary.display()))
                }
            })?;

        if !result.status.success() {
            let code = result.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(FolioError::Rasterization(format!(
                "browser exited with code {code}: {}",
                stderr.trim()
            )));
        }

        let bytes = std::fs::read(output).map_err(|e| {
            FolioError::Rasterization(format!("browser produced no output: {e}"))
        })?;
        if bytes.is_empty() {
            return Err(FolioError::Rasterization("browser produced an empty file".into()));
        }
        Ok(bytes)
    }
}

impl BrowserSession for ChromeSession {
    fn set_content(&mut self, html: &str) -> Result<(), FolioError> {
        self.html = Some(html.to_string());
        Ok(())
    }

    fn pdf(&mut self, options: &PdfOptions) -> Result<Vec<u8>, FolioError> {
        let page = self.write_page(print_overrides(options).as_deref())?;
        let output = self.workdir.path().join("out.pdf");

        let mut args = base_args();
        args.push("--no-pdf-header-footer".into());
        args.push("--print-to-pdf-no-header".into());
        args.push(format!("--print-to-pdf={}", output.display()));
        args.push(file_url(&page));

        self.run(args, &output)
    }

    fn screenshot(&mut self, options: &PreviewOptions) -> Result<Vec<u8>, FolioError> {
        let page = self.write_page(None)?;
        let output = self.workdir.path().join("out.png");

        let mut args = base_args();
        args.push("--hide-scrollbars".into());
        args.push(format!("--window-size={},{}", options.width, options.height));
        args.push(format!(
            "--force-device-scale-factor={}",
            num(options.device_scale_factor)
        ));
        args.push(format!("--screenshot={}", output.display()));
        args.push(file_url(&page));

        self.run(args, &output)
    }

    fn close(self: Box<Self>) -> Result<(), FolioError> {
        let ChromeSession { workdir, .. } = *self;
        workdir.close()?;
        Ok(())
    }
}

fn base_args() -> Vec<String> {
    vec![
        "--headless".into(),
        "--disable-gpu".into(),
        "--no-sandbox".into(),
        "--no-first-run".into(),
        "--allow-file-access-from-files".into(),
    ]
}

fn file_url(path: &Path) -> String {
    format!("file://{}", path.display())
}

/// Extra CSS for options the command-line printer has no flag for.
///
/// The printer always honours the CSS `@page` size, so
/// `prefer_css_page_size` needs no override.
fn print_overrides(options: &PdfOptions) -> Option<String> {
    let mut css = String::new();

    if !options.margins.is_zero() {
        let PrintMargins {
            top,
            right,
            bottom,
            left,
        } = options.margins;
        css.push_str(&format!(
            "@page {{ margin: {}mm {}mm {}mm {}mm; }}",
            num(top),
            num(right),
            num(bottom),
            num(left)
        ));
    }
    if !options.print_background {
        css.push_str("* { -webkit-print-color-adjust: economy !important; print-color-adjust: economy !important; }");
    }

    (!css.is_empty()).then_some(css)
}

fn inject_style(html: &str, css: &str) -> String {
    let style = format!("<style>{css}</style>");
    match html.find("</head>") {
        Some(pos) => format!("{}{}{}", &html[..pos], style, &html[pos..]),
        None => format!("{style}{html}"),
    }
}
