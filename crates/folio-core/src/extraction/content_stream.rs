use crate::error::FolioError;
use crate::extraction::{GlyphRun, GlyphSource, PageGlyphs};
use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::{BTreeMap, HashMap};

/// US Letter, used when a page carries no usable MediaBox.
const DEFAULT_MEDIA_BOX: [f64; 4] = [0.0, 0.0, 612.0, 792.0];

/// Glyph width (in 1/1000 em) assumed when a font has no `Widths` entry.
const DEFAULT_GLYPH_WIDTH: f64 = 500.0;

/// TJ adjustments beyond this (1/1000 em) read as a word break.
const SPACE_THRESHOLD: f64 = 200.0;

type Matrix = [f64; 6];

const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// PDF extraction backend parsing the page content stream with lopdf.
///
/// Runs in-process with no external tools. Handles the text positioning and
/// showing operators plus the `cm` transformation; XObjects and annotations
/// are not followed.
pub struct ContentStreamSource;

impl ContentStreamSource {
    pub fn new() -> Self {
        ContentStreamSource
    }
}

impl Default for ContentStreamSource {
    fn default() -> Self {
        Self::new()
    }
}

impl GlyphSource for ContentStreamSource {
    fn first_page(&self, pdf_bytes: &[u8]) -> Result<PageGlyphs, FolioError> {
        let doc = Document::load_mem(pdf_bytes).map_err(|e| FolioError::Extraction(e.to_string()))?;

        let page_id = doc
            .get_pages()
            .into_values()
            .next()
            .ok_or_else(|| FolioError::Extraction("document has no pages".into()))?;

        let [llx, lly, urx, ury] = media_box(&doc, page_id);

        let fonts = doc
            .get_page_fonts(page_id)
            .map_err(|e| FolioError::Extraction(e.to_string()))?;
        let content = doc
            .get_page_content(page_id)
            .map_err(|e| FolioError::Extraction(e.to_string()))?;
        let content = Content::decode(&content).map_err(|e| FolioError::Extraction(e.to_string()))?;

        let runs = TextInterpreter::new(&doc, &fonts).run(&content);

        Ok(PageGlyphs {
            width: (urx - llx).abs(),
            height: (ury - lly).abs(),
            runs,
        })
    }

    fn backend_name(&self) -> &str {
        "lopdf"
    }
}

/// MediaBox of a page, following `Parent` links for inherited boxes.
fn media_box(doc: &Document, page_id: ObjectId) -> [f64; 4] {
    let mut current = doc.get_dictionary(page_id).ok();

    while let Some(dict) = current {
        if let Some(rect) = dict
            .get(b"MediaBox")
            .ok()
            .and_then(|obj| resolve(doc, obj).as_array().ok())
            .and_then(|arr| parse_rect(arr))
        {
            return rect;
        }
        current = dict
            .get(b"Parent")
            .ok()
            .and_then(|obj| obj.as_reference().ok())
            .and_then(|id| doc.get_dictionary(id).ok());
    }

    log::warn!("page has no MediaBox, assuming US Letter");
    DEFAULT_MEDIA_BOX
}

fn parse_rect(arr: &[Object]) -> Option<[f64; 4]> {
    if arr.len() != 4 {
        return None;
    }
    let mut rect = [0.0; 4];
    for (slot, obj) in rect.iter_mut().zip(arr) {
        *slot = get_number(obj)?;
    }
    Some(rect)
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

/// Helper to extract number from PDF object.
fn get_number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(f64::from(*r)),
        _ => None,
    }
}

fn multiply(m: &Matrix, n: &Matrix) -> Matrix {
    [
        m[0] * n[0] + m[1] * n[2],
        m[0] * n[1] + m[1] * n[3],
        m[2] * n[0] + m[3] * n[2],
        m[2] * n[1] + m[3] * n[3],
        m[4] * n[0] + m[5] * n[2] + n[4],
        m[4] * n[1] + m[5] * n[3] + n[5],
    ]
}

fn translation(tx: f64, ty: f64) -> Matrix {
    [1.0, 0.0, 0.0, 1.0, tx, ty]
}

/// Width and naming data for one font resource.
struct FontMetrics {
    base_font: String,
    first_char: i64,
    widths: Vec<f64>,
    /// Composite (Type0) fonts use two-byte codes.
    two_byte: bool,
}

impl FontMetrics {
    fn from_dict(doc: &Document, dict: &Dictionary) -> Self {
        let base_font = dict
            .get(b"BaseFont")
            .ok()
            .and_then(|o| o.as_name().ok())
            .map(|n| String::from_utf8_lossy(n).to_string())
            .unwrap_or_else(|| "Unknown".to_string());

        let two_byte = dict
            .get(b"Subtype")
            .ok()
            .and_then(|o| o.as_name().ok())
            .is_some_and(|name| name == b"Type0");

        let first_char = dict
            .get(b"FirstChar")
            .ok()
            .and_then(|o| o.as_i64().ok())
            .unwrap_or(0);

        let widths = dict
            .get(b"Widths")
            .ok()
            .and_then(|o| resolve(doc, o).as_array().ok())
            .map(|arr| {
                arr.iter()
                    .map(|w| get_number(resolve(doc, w)).unwrap_or(DEFAULT_GLYPH_WIDTH))
                    .collect()
            })
            .unwrap_or_default();

        FontMetrics {
            base_font,
            first_char,
            widths,
            two_byte,
        }
    }

    fn code_count(&self, bytes: &[u8]) -> usize {
        if self.two_byte {
            bytes.len().div_ceil(2)
        } else {
            bytes.len()
        }
    }

    fn glyph_width(&self, code: u8) -> f64 {
        usize::try_from(i64::from(code) - self.first_char)
            .ok()
            .and_then(|i| self.widths.get(i).copied())
            .unwrap_or(DEFAULT_GLYPH_WIDTH)
    }
}

/// Graphics and text state saved by `q` and restored by `Q`.
#[derive(Debug, Clone)]
struct GraphicsState {
    ctm: Matrix,
    font: Vec<u8>,
    font_size: f64,
    leading: f64,
    char_spacing: f64,
    word_spacing: f64,
    horizontal_scale: f64,
    rise: f64,
}

impl Default for GraphicsState {
    fn default() -> Self {
        GraphicsState {
            ctm: IDENTITY,
            font: Vec::new(),
            font_size: 12.0,
            leading: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scale: 1.0,
            rise: 0.0,
        }
    }
}

/// Walks content stream operations and emits one run per show operator.
struct TextInterpreter<'a> {
    doc: &'a Document,
    fonts: &'a BTreeMap<Vec<u8>, &'a Dictionary>,
    metrics: HashMap<Vec<u8>, FontMetrics>,
    state: GraphicsState,
    stack: Vec<GraphicsState>,
    text_matrix: Matrix,
    line_matrix: Matrix,
    runs: Vec<GlyphRun>,
}

impl<'a> TextInterpreter<'a> {
    fn new(doc: &'a Document, fonts: &'a BTreeMap<Vec<u8>, &'a Dictionary>) -> Self {
        let metrics = fonts
            .iter()
            .map(|(name, dict)| (name.clone(), FontMetrics::from_dict(doc, dict)))
            .collect();

        TextInterpreter {
            doc,
            fonts,
            metrics,
            state: GraphicsState::default(),
            stack: Vec::new(),
            text_matrix: IDENTITY,
            line_matrix: IDENTITY,
            runs: Vec::new(),
        }
    }

    fn run(mut self, content: &Content) -> Vec<GlyphRun> {
        for op in &content.operations {
            let nums: Vec<f64> = op.operands.iter().filter_map(get_number).collect();

            match op.operator.as_str() {
                "q" => self.stack.push(self.state.clone()),
                "Q" => match self.stack.pop() {
                    Some(state) => self.state = state,
                    None => log::warn!("unbalanced Q operator ignored"),
                },
                "cm" if nums.len() >= 6 => {
                    let m = [nums[0], nums[1], nums[2], nums[3], nums[4], nums[5]];
                    self.state.ctm = multiply(&m, &self.state.ctm);
                }
                "BT" => {
                    self.text_matrix = IDENTITY;
                    self.line_matrix = IDENTITY;
                }
                "Tf" if op.operands.len() >= 2 => {
                    if let Object::Name(name) = &op.operands[0] {
                        self.state.font = name.clone();
                    }
                    self.state.font_size = get_number(&op.operands[1]).unwrap_or(12.0);
                }
                "TL" if !nums.is_empty() => self.state.leading = nums[0],
                "Tc" if !nums.is_empty() => self.state.char_spacing = nums[0],
                "Tw" if !nums.is_empty() => self.state.word_spacing = nums[0],
                "Tz" if !nums.is_empty() => self.state.horizontal_scale = nums[0] / 100.0,
                "Ts" if !nums.is_empty() => self.state.rise = nums[0],
                "Td" if nums.len() >= 2 => self.move_line(nums[0], nums[1]),
                "TD" if nums.len() >= 2 => {
                    self.state.leading = -nums[1];
                    self.move_line(nums[0], nums[1]);
                }
                "Tm" if nums.len() >= 6 => {
                    let m = [nums[0], nums[1], nums[2], nums[3], nums[4], nums[5]];
                    self.text_matrix = m;
                    self.line_matrix = m;
                }
                "T*" => self.next_line(),
                "Tj" => {
                    if let Some(obj @ Object::String(..)) = op.operands.first() {
                        self.show(std::slice::from_ref(obj));
                    }
                }
                "TJ" => {
                    if let Some(Object::Array(items)) = op.operands.first() {
                        self.show(items);
                    }
                }
                "'" => {
                    self.next_line();
                    if let Some(obj @ Object::String(..)) = op.operands.first() {
                        self.show(std::slice::from_ref(obj));
                    }
                }
                "\"" => {
                    if let (Some(aw), Some(ac)) = (
                        op.operands.first().and_then(get_number),
                        op.operands.get(1).and_then(get_number),
                    ) {
                        self.state.word_spacing = aw;
                        self.state.char_spacing = ac;
                    }
                    self.next_line();
                    if let Some(obj @ Object::String(..)) = op.operands.get(2) {
                        self.show(std::slice::from_ref(obj));
                    }
                }
                _ => {}
            }
        }

        self.runs
    }

    fn move_line(&mut self, tx: f64, ty: f64) {
        self.line_matrix = multiply(&translation(tx, ty), &self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        self.move_line(0.0, -self.state.leading);
    }

    fn decode(&self, bytes: &[u8]) -> String {
        let encoding = self
            .fonts
            .get(&self.state.font)
            .and_then(|f| f.get_font_encoding(self.doc).ok());

        match encoding {
            Some(enc) => Document::decode_text(&enc, bytes).unwrap_or_else(|_| decode_text_simple(bytes)),
            None => decode_text_simple(bytes),
        }
    }

    /// Text-space advance of one string, before horizontal scaling.
    fn advance(&self, bytes: &[u8]) -> f64 {
        let state = &self.state;
        let metrics = self.metrics.get(&state.font);

        match metrics {
            Some(m) if !m.two_byte => bytes
                .iter()
                .map(|&code| {
                    let mut w = m.glyph_width(code) / 1000.0 * state.font_size + state.char_spacing;
                    if code == b' ' {
                        w += state.word_spacing;
                    }
                    w
                })
                .sum(),
            Some(m) => {
                m.code_count(bytes) as f64
                    * (DEFAULT_GLYPH_WIDTH / 1000.0 * state.font_size + state.char_spacing)
            }
            None => {
                bytes.len() as f64
                    * (DEFAULT_GLYPH_WIDTH / 1000.0 * state.font_size + state.char_spacing)
            }
        }
    }

    /// Show a sequence of strings and TJ spacing adjustments as one run.
    fn show(&mut self, items: &[Object]) {
        let state = &self.state;
        let start = multiply(&self.text_matrix, &state.ctm);
        let font_matrix = [
            state.font_size * state.horizontal_scale,
            0.0,
            0.0,
            state.font_size,
            0.0,
            state.rise,
        ];
        let transform = multiply(&font_matrix, &start);

        let mut text = String::new();
        let mut advance = 0.0;

        for item in items {
            match item {
                Object::String(bytes, _) => {
                    text.push_str(&self.decode(bytes));
                    advance += self.advance(bytes) * self.state.horizontal_scale;
                }
                other => {
                    if let Some(adjust) = get_number(other) {
                        advance -= adjust / 1000.0 * self.state.font_size * self.state.horizontal_scale;
                        if -adjust > SPACE_THRESHOLD && !text.is_empty() && !text.ends_with(' ') {
                            text.push(' ');
                        }
                    }
                }
            }
        }

        // Text-space advance mapped through the text and user-space scale.
        let x_scale = (start[0] * start[0] + start[1] * start[1]).sqrt();
        let width = advance * x_scale;

        self.text_matrix = multiply(&translation(advance, 0.0), &self.text_matrix);

        if text.trim().is_empty() {
            return;
        }

        let font_name = self
            .metrics
            .get(&self.state.font)
            .map(|m| m.base_font.clone())
            .unwrap_or_else(|| String::from_utf8_lossy(&self.state.font).to_string());

        self.runs.push(GlyphRun {
            text,
            transform,
            width: Some(width),
            font_name,
        });
    }
}

/// Simple text decoding fallback when no encoding is available.
fn decode_text_simple(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&utf16);
    }

    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    // Latin-1
    bytes.iter().map(|&b| b as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::Operation;
    use lopdf::{dictionary, Stream};

    /// Single-page document with one Helvetica font resource named F1.
    fn build_pdf(operations: Vec<Operation>, media_box: Option<[i64; 4]>) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
            "FirstChar" => 32,
            "Widths" => vec![Object::Integer(278); 95],
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));

        let mut page = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        };
        if let Some(rect) = media_box {
            page.set("MediaBox", rect.iter().map(|&v| Object::Integer(v)).collect::<Vec<_>>());
        }
        let page_id = doc.add_object(page);

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    fn text_ops(x: i64, y: i64, text: &str) -> Vec<Operation> {
        vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Td", vec![x.into(), y.into()]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ]
    }

    #[test]
    fn test_single_run_position_and_width() {
        let pdf = build_pdf(text_ops(72, 700, "INVOICE"), Some([0, 0, 612, 792]));
        let page = ContentStreamSource::new().first_page(&pdf).unwrap();

        assert_eq!((page.width, page.height), (612.0, 792.0));
        assert_eq!(page.runs.len(), 1);
        let run = &page.runs[0];
        assert_eq!(run.text, "INVOICE");
        assert_eq!(run.font_name, "Helvetica-Bold");
        assert_eq!(run.transform, [12.0, 0.0, 0.0, 12.0, 72.0, 700.0]);
        // 7 glyphs * 278/1000 * 12
        let width = run.width.unwrap();
        assert!((width - 23.352).abs() < 1e-6);
    }

    #[test]
    fn test_media_box_inherited_from_parent() {
        let pdf = build_pdf(text_ops(10, 10, "x"), None);
        let page = ContentStreamSource::new().first_page(&pdf).unwrap();
        assert_eq!((page.width, page.height), (595.0, 842.0));
    }

    #[test]
    fn test_cm_and_next_line_operators() {
        let ops = vec![
            Operation::new("q", vec![]),
            Operation::new("cm", vec![2.into(), 0.into(), 0.into(), 2.into(), 10.into(), 20.into()]),
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 10.into()]),
            Operation::new("TL", vec![14.into()]),
            Operation::new("Td", vec![5.into(), 100.into()]),
            Operation::new("Tj", vec![Object::string_literal("Bill To")]),
            Operation::new("T*", vec![]),
            Operation::new("Tj", vec![Object::string_literal("Jane")]),
            Operation::new("ET", vec![]),
            Operation::new("Q", vec![]),
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 10.into()]),
            Operation::new("Td", vec![5.into(), 100.into()]),
            Operation::new("Tj", vec![Object::string_literal("Plain")]),
            Operation::new("ET", vec![]),
        ];
        let pdf = build_pdf(ops, Some([0, 0, 612, 792]));
        let runs = ContentStreamSource::new().first_page(&pdf).unwrap().runs;

        assert_eq!(runs.len(), 3);
        assert_eq!(runs[0].transform, [20.0, 0.0, 0.0, 20.0, 20.0, 220.0]);
        // T* moves down by the leading in text space: (100 - 14) * 2 + 20
        assert_eq!(runs[1].transform[5], 192.0);
        assert_eq!(runs[1].transform[4], 20.0);
        // Q restores the identity CTM
        assert_eq!(runs[2].transform, [10.0, 0.0, 0.0, 10.0, 5.0, 100.0]);
    }

    #[test]
    fn test_tj_array_spacing_and_advance() {
        let ops = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 10.into()]),
            Operation::new("Td", vec![0.into(), 0.into()]),
            Operation::new(
                "TJ",
                vec![Object::Array(vec![
                    Object::string_literal("Due"),
                    Object::Integer(-250),
                    Object::string_literal("Date"),
                ])],
            ),
            Operation::new("Tj", vec![Object::string_literal("X")]),
            Operation::new("ET", vec![]),
        ];
        let pdf = build_pdf(ops, Some([0, 0, 612, 792]));
        let runs = ContentStreamSource::new().first_page(&pdf).unwrap().runs;

        assert_eq!(runs[0].text, "Due Date");
        // 7 glyphs * 2.78 + 2.5
        let width = runs[0].width.unwrap();
        assert!((width - 21.96).abs() < 1e-6);
        assert!((runs[1].transform[4] - 21.96).abs() < 1e-6);
    }

    #[test]
    fn test_garbage_is_extraction_error() {
        let err = ContentStreamSource::new().first_page(b"not a pdf").unwrap_err();
        assert!(matches!(err, FolioError::Extraction(_)));
    }

    #[test]
    fn test_decode_simple_fallbacks() {
        assert_eq!(decode_text_simple(&[0xFE, 0xFF, 0x00, 0x41]), "A");
        assert_eq!(decode_text_simple(b"Tax"), "Tax");
        assert_eq!(decode_text_simple(&[0xE9]), "é");
    }

    #[test]
    fn test_matrix_multiply() {
        let m = multiply(&translation(5.0, 0.0), &[2.0, 0.0, 0.0, 2.0, 10.0, 10.0]);
        assert_eq!(m, [2.0, 0.0, 0.0, 2.0, 20.0, 10.0]);
    }
}
