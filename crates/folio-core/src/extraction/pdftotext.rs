use crate::error::FolioError;
use crate::extraction::{GlyphRun, GlyphSource, PageGlyphs};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::Write;
use std::process::Command;

/// Horizontal gap, as a multiple of the line height, that splits a line into
/// separate runs (table cells, label/value pairs).
const RUN_GAP_FACTOR: f64 = 1.0;

/// PDF extraction backend using pdftotext (from poppler-utils).
///
/// Uses `pdftotext -bbox-layout` on the first page and turns every line into
/// one or more runs, split wherever words sit far apart.
pub struct PdftotextSource;

impl PdftotextSource {
    pub fn new() -> Self {
        PdftotextSource
    }

    /// Check if pdftotext is available on the system.
    pub fn is_available() -> bool {
        Command::new("pdftotext")
            .arg("-v")
            .output()
            .map(|o| o.status.success() || !o.stderr.is_empty())
            .unwrap_or(false)
    }
}

impl Default for PdftotextSource {
    fn default() -> Self {
        Self::new()
    }
}

impl GlyphSource for PdftotextSource {
    fn first_page(&self, pdf_bytes: &[u8]) -> Result<PageGlyphs, FolioError> {
        let mut tmpfile =
            tempfile::NamedTempFile::new().map_err(|e| FolioError::Extraction(e.to_string()))?;
        tmpfile
            .write_all(pdf_bytes)
            .map_err(|e| FolioError::Extraction(e.to_string()))?;

        let output = Command::new("pdftotext")
            .args(["-bbox-layout", "-f", "1", "-l", "1"])
            .arg(tmpfile.path())
            .arg("-") // output to stdout
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    FolioError::PdftotextNotFound
                } else {
                    FolioError::Extraction(format!("pdftotext failed: {}", e))
                }
            })?;

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(FolioError::PdftotextFailed { code, stderr });
        }

        let xml = String::from_utf8_lossy(&output.stdout);
        parse_bbox_layout(&xml)
    }

    fn backend_name(&self) -> &str {
        "pdftotext"
    }
}

/// Word box in points, origin at the top-left of the page.
#[derive(Debug, Clone)]
struct Word {
    text: String,
    x_min: f64,
    y_min: f64,
    x_max: f64,
    y_max: f64,
}

/// Parse the `-bbox-layout` XHTML of a single page.
fn parse_bbox_layout(xml: &str) -> Result<PageGlyphs, FolioError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut page_size: Option<(f64, f64)> = None;
    let mut lines: Vec<Vec<Word>> = Vec::new();
    let mut current_line: Vec<Word> = Vec::new();
    let mut current_word: Option<Word> = None;

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(e) => match e.name().as_ref() {
                // Only the first page is read.
                b"page" if page_size.is_none() => {
                    page_size = Some((attr_f64(&e, b"width")?, attr_f64(&e, b"height")?));
                }
                b"page" => break,
                b"line" => current_line.clear(),
                b"word" => current_word = Some(word_box(&e)?),
                _ => {}
            },
            Event::Text(t) => {
                if let Some(word) = current_word.as_mut() {
                    word.text.push_str(&t.unescape().map_err(xml_error)?);
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"word" => {
                    if let Some(word) = current_word.take() {
                        if !word.text.trim().is_empty() {
                            current_line.push(word);
                        }
                    }
                }
                b"line" => {
                    if !current_line.is_empty() {
                        lines.push(std::mem::take(&mut current_line));
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    let (width, height) =
        page_size.ok_or_else(|| FolioError::Extraction("document has no pages".into()))?;

    let runs = lines
        .iter()
        .flat_map(|line| split_line(line))
        .map(|words| to_run(&words, height))
        .collect();

    Ok(PageGlyphs { width, height, runs })
}

fn xml_error(e: impl std::fmt::Display) -> FolioError {
    FolioError::Extraction(format!("invalid pdftotext output: {e}"))
}

fn attr_f64(e: &BytesStart<'_>, name: &[u8]) -> Result<f64, FolioError> {
    for attr in e.attributes() {
        let attr = attr.map_err(xml_error)?;
        if attr.key.as_ref() == name {
            let value = attr.unescape_value().map_err(xml_error)?;
            return value
                .trim()
                .parse()
                .map_err(|_| xml_error(format!("bad {} value '{value}'", String::from_utf8_lossy(name))));
        }
    }
    Err(xml_error(format!(
        "missing attribute {}",
        String::from_utf8_lossy(name)
    )))
}

fn word_box(e: &BytesStart<'_>) -> Result<Word, FolioError> {
    Ok(Word {
        text: String::new(),
        x_min: attr_f64(e, b"xMin")?,
        y_min: attr_f64(e, b"yMin")?,
        x_max: attr_f64(e, b"xMax")?,
        y_max: attr_f64(e, b"yMax")?,
    })
}

/// Split a line into groups of words separated by less than one line height.
fn split_line(words: &[Word]) -> Vec<Vec<Word>> {
    let mut groups: Vec<Vec<Word>> = Vec::new();

    for word in words {
        let starts_new = match groups.last().and_then(|g| g.last()) {
            Some(prev) => {
                let line_height = (prev.y_max - prev.y_min).max(word.y_max - word.y_min);
                word.x_min - prev.x_max > line_height * RUN_GAP_FACTOR
            }
            None => true,
        };

        if starts_new {
            groups.push(vec![word.clone()]);
        } else if let Some(group) = groups.last_mut() {
            group.push(word.clone());
        }
    }

    groups
}

/// Convert a word group to a bottom-left-origin run.
fn to_run(words: &[Word], page_height: f64) -> GlyphRun {
    let x_min = words.iter().map(|w| w.x_min).fold(f64::INFINITY, f64::min);
    let x_max = words.iter().map(|w| w.x_max).fold(f64::NEG_INFINITY, f64::max);
    let y_min = words.iter().map(|w| w.y_min).fold(f64::INFINITY, f64::min);
    let y_max = words.iter().map(|w| w.y_max).fold(f64::NEG_INFINITY, f64::max);
    let size = y_max - y_min;

    let text = words
        .iter()
        .map(|w| w.text.trim())
        .collect::<Vec<_>>()
        .join(" ");

    GlyphRun {
        text,
        transform: [size, 0.0, 0.0, size, x_min, page_height - y_max],
        width: Some(x_max - x_min),
        // pdftotext does not report fonts.
        font_name: String::new(),
    }
}
