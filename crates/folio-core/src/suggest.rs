use crate::classify::{classify_items, detect_tables, ClassifiedItem, DetectedTable};
use crate::extraction::{ExtractedText, TextItem};
use crate::layout::ResolvedTable;
use crate::template::schema::{
    Align, AreaKey, AreaSpec, Areas, Colors, ColumnKey, ColumnSpec, FontWeight, Fonts, Margins,
    PageMeta, Sizes, Styles, TableSpec, TemplateSpec,
};
use crate::template::validation_errors;
use serde::Serialize;
use std::collections::BTreeMap;

const DEFAULT_MARGIN_MM: f64 = 15.0;
const DEFAULT_ROW_HEIGHT_MM: f64 = 8.0;
const DEFAULT_HEADER_HEIGHT_MM: f64 = 10.0;
/// Gap between the last header area and a proposed items table.
const TABLE_GAP_MM: f64 = 10.0;
const TOTAL_WIDTH_MM: f64 = 60.0;
const TOTAL_GAP_MM: f64 = 5.0;

/// A draft template and the evidence it was built from.
#[derive(Debug, Clone, Serialize)]
pub struct SuggestedTemplate {
    pub spec: TemplateSpec,
    pub items: Vec<ClassifiedItem>,
    pub tables: Vec<DetectedTable>,
    /// Validation problems of the draft, for the user to resolve.
    pub errors: Vec<String>,
}

/// Pixel to unit conversions at the extraction DPI.
#[derive(Debug, Clone, Copy)]
struct Units {
    dpi: f64,
}

impl Units {
    fn mm(&self, px: f64) -> f64 {
        round2(px * 25.4 / self.dpi)
    }

    fn pt(&self, px: f64) -> f64 {
        round2(px * 72.0 / self.dpi)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Build a draft [`TemplateSpec`] from the first page of an extracted PDF.
pub fn suggest_template(extracted: &ExtractedText, name: &str) -> SuggestedTemplate {
    let units = Units {
        dpi: f64::from(extracted.dpi.max(1)),
    };
    let page_width = units.mm(extracted.page_width);
    let page_height = units.mm(extracted.page_height);

    let items = classify_items(extracted);
    let tables = detect_tables(&extracted.items);
    let dominant = tables
        .iter()
        .max_by(|a, b| a.area().total_cmp(&b.area()));

    let fields = claim_fields(&items, dominant, units);

    let items_table = match dominant {
        Some(table) => table_from_detected(table, units),
        None => default_table(&fields, page_width, page_height),
    };

    let grand_total = fields
        .get(&AreaKey::GrandTotal)
        .cloned()
        .unwrap_or_else(|| total_below(&items_table, dominant, units));

    let mut areas = Areas::new(items_table, grand_total);
    for (key, area) in fields {
        areas.set(key, Some(area));
    }

    let spec = TemplateSpec {
        meta: PageMeta {
            name: name.to_string(),
            description: Some("Suggested from an uploaded PDF".to_string()),
            width: page_width,
            height: page_height,
            dpi: extracted.dpi,
            margins: fit_margins(&areas, page_width, page_height),
            background_image_url: None,
            background_pdf_url: None,
        },
        styles: default_styles(),
        areas,
    };

    let errors = validation_errors(&spec);
    log::debug!(
        "suggested template '{}': {} areas, {} table(s) detected, {} validation error(s)",
        name,
        spec.areas.iter().count(),
        tables.len(),
        errors.len()
    );

    SuggestedTemplate {
        spec,
        items,
        tables,
        errors,
    }
}

fn inside(item: &TextItem, table: &DetectedTable) -> bool {
    item.x >= table.x
        && item.y >= table.y
        && item.x <= table.x + table.width
        && item.y <= table.y + table.height
}

/// The top-most fragment suggested for a field claims it. Fragments that
/// belong to the items table are rows, not fields.
fn claim_fields(
    items: &[ClassifiedItem],
    table: Option<&DetectedTable>,
    units: Units,
) -> BTreeMap<AreaKey, AreaSpec> {
    let mut candidates: Vec<&ClassifiedItem> = items
        .iter()
        .filter(|c| c.suggested_field.is_some())
        .filter(|c| !table.is_some_and(|t| inside(&c.item, t)))
        .collect();
    candidates.sort_by(|a, b| a.item.y.total_cmp(&b.item.y).then(a.item.x.total_cmp(&b.item.x)));

    let mut fields = BTreeMap::new();
    for candidate in candidates {
        if let Some(key) = candidate.suggested_field {
            fields
                .entry(key)
                .or_insert_with(|| area_from_item(&candidate.item, units));
        }
    }
    fields
}

fn area_from_item(item: &TextItem, units: Units) -> AreaSpec {
    let bold = item.font_name.to_lowercase().contains("bold");
    AreaSpec {
        w: Some(units.mm(item.width)),
        h: Some(units.mm(item.height)),
        font_size: Some(units.pt(item.font_size)),
        font_weight: bold.then_some(FontWeight::Bold),
        ..AreaSpec::at(units.mm(item.x), units.mm(item.y))
    }
}

fn columns_for(width: f64) -> Vec<ColumnSpec> {
    let w = round2(width / ColumnKey::ALL.len() as f64);
    ColumnKey::ALL
        .iter()
        .map(|&key| ColumnSpec {
            key,
            label: key.default_label().to_string(),
            w,
            align: match key {
                ColumnKey::Description => None,
                _ => Some(Align::Right),
            },
            font_size: None,
        })
        .collect()
}

fn table_spec(x: f64, y: f64, w: f64, row_height: f64, header_height: Option<f64>) -> TableSpec {
    TableSpec {
        x,
        y,
        w,
        row_height,
        header_height,
        columns: columns_for(w),
        border_color: None,
        border_width: None,
        header_bg: None,
        alt_row_bg: None,
        header_font_size: None,
        header_font_weight: None,
        header_color: None,
    }
}

fn table_from_detected(table: &DetectedTable, units: Units) -> TableSpec {
    let rows = table.rows.max(1) as f64;
    let height = units.mm(table.height);
    table_spec(
        units.mm(table.x),
        units.mm(table.y),
        units.mm(table.width),
        round2(height / rows),
        None,
    )
}

/// Full-width table under the lowest claimed area.
fn default_table(fields: &BTreeMap<AreaKey, AreaSpec>, page_width: f64, page_height: f64) -> TableSpec {
    let below_header = fields
        .values()
        .map(|a| a.y + a.h.unwrap_or(0.0))
        .fold(DEFAULT_MARGIN_MM, f64::max);
    let y = (below_header + TABLE_GAP_MM).min(page_height - DEFAULT_MARGIN_MM);

    table_spec(
        DEFAULT_MARGIN_MM,
        round2(y),
        round2(page_width - 2.0 * DEFAULT_MARGIN_MM),
        DEFAULT_ROW_HEIGHT_MM,
        Some(DEFAULT_HEADER_HEIGHT_MM),
    )
}

/// Right-aligned total under the table's bottom-right corner.
fn total_below(table: &TableSpec, detected: Option<&DetectedTable>, units: Units) -> AreaSpec {
    let table_height = match detected {
        Some(t) => units.mm(t.height),
        None => ResolvedTable::resolve(table).header_height,
    };
    let x = (table.x + table.w - TOTAL_WIDTH_MM).max(table.x);

    AreaSpec {
        w: Some(TOTAL_WIDTH_MM),
        align: Some(Align::Right),
        font_weight: Some(FontWeight::Bold),
        ..AreaSpec::at(round2(x), round2(table.y + table_height + TOTAL_GAP_MM))
    }
}

/// Default margins, shrunk so every suggested area lies inside them.
fn fit_margins(areas: &Areas, page_width: f64, page_height: f64) -> Margins {
    let table = &areas.items_table;
    let points: Vec<(f64, f64)> = areas
        .iter()
        .map(|(_, a)| (a.x, a.y))
        .chain(std::iter::once((table.x, table.y)))
        .collect();

    let min_x = points.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
    let max_x = points.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
    let min_y = points.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
    let max_y = points.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);

    // Rounded down so no area ends up outside.
    let fit = |room: f64| ((room * 100.0).floor() / 100.0).clamp(0.0, DEFAULT_MARGIN_MM);

    Margins {
        top: fit(min_y),
        left: fit(min_x),
        right: fit(page_width - max_x),
        bottom: fit(page_height - max_y),
    }
}

fn default_styles() -> Styles {
    Styles {
        fonts: Fonts {
            primary: "Helvetica, Arial, sans-serif".to_string(),
            secondary: None,
        },
        colors: Colors {
            primary: "#111111".to_string(),
            secondary: "#666666".to_string(),
            accent: None,
        },
        sizes: Sizes {
            default: 10.0,
            small: 8.0,
            large: 12.0,
            title: 24.0,
        },
    }
}
