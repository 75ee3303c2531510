use crate::template::schema::{AreaKey, AreaSpec, Areas, PageMeta, TableSpec, TemplateSpec};

/// Item count a template is assumed to be designed for.
pub const BASELINE_ITEM_COUNT: usize = 10;

/// Clearance kept between the last table row and the next fixed area.
pub const SAFETY_BUFFER_MM: f64 = 2.0;

/// Areas that follow the items table and move with it.
pub const REFLOWED_AREAS: [AreaKey; 6] = [
    AreaKey::Subtotal,
    AreaKey::TaxTotal,
    AreaKey::GrandTotal,
    AreaKey::Notes,
    AreaKey::PaymentInfo,
    AreaKey::Footer,
];

/// Areas whose position bounds how many rows fit under the table.
const CAPACITY_LIMITING_AREAS: [AreaKey; 3] =
    [AreaKey::Subtotal, AreaKey::GrandTotal, AreaKey::Notes];

/// Table geometry with its defaults applied once.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedTable {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub row_height: f64,
    /// Falls back to `row_height` when the template leaves it unset or zero.
    pub header_height: f64,
}

impl ResolvedTable {
    pub fn resolve(table: &TableSpec) -> Self {
        ResolvedTable {
            x: table.x,
            y: table.y,
            w: table.w,
            row_height: table.row_height,
            header_height: table
                .header_height
                .filter(|h| *h > 0.0)
                .unwrap_or(table.row_height),
        }
    }

    /// Header plus one row per item.
    pub fn height_for(&self, item_count: usize) -> f64 {
        self.header_height + item_count as f64 * self.row_height
    }

    pub fn baseline_height(&self) -> f64 {
        self.height_for(BASELINE_ITEM_COUNT)
    }
}

/// Final positions for one `(template, item count)` pair.
///
/// Built from scratch on every call; the source template is never touched.
#[derive(Debug, Clone, PartialEq)]
pub struct AdjustedLayout {
    pub meta: PageMeta,
    pub areas: Areas,
    pub table: ResolvedTable,
    pub item_count: usize,
    /// Actual table height for `item_count` rows.
    pub table_height: f64,
    /// Distance every reflowed area moved down; zero when nothing moved.
    pub shift: f64,
}

impl AdjustedLayout {
    pub fn area(&self, key: AreaKey) -> Option<&AreaSpec> {
        self.areas.get(key)
    }

    pub fn page_width(&self) -> f64 {
        self.meta.width
    }

    pub fn page_height(&self) -> f64 {
        self.meta.height
    }
}

/// Compute adjusted area positions and page height for `item_count` rows.
pub fn layout(spec: &TemplateSpec, item_count: usize) -> AdjustedLayout {
    let table = ResolvedTable::resolve(&spec.areas.items_table);
    let table_height = table.height_for(item_count);
    let delta = table_height - table.baseline_height();

    let mut areas = spec.areas.clone();
    let mut meta = spec.meta.clone();
    let shift = if delta > 0.0 { delta } else { 0.0 };

    if shift > 0.0 {
        for key in REFLOWED_AREAS {
            if let Some(area) = spec.areas.get(key) {
                let moved = AreaSpec {
                    y: area.y + shift,
                    ..area.clone()
                };
                areas.set(key, Some(moved));
            }
        }
        meta.height = spec.meta.height + shift;
        log::debug!(
            "layout '{}': {} items, table {:.1}mm, shifted trailing areas by {:.1}mm",
            spec.meta.name,
            item_count,
            table_height,
            shift
        );
    }

    AdjustedLayout {
        meta,
        areas,
        table,
        item_count,
        table_height,
        shift,
    }
}

/// Greatest number of rows that fit before the table runs into the nearest
/// area below it (subtotal, grand total or notes), keeping a 2mm buffer.
///
/// Advisory only: rendering never truncates items. Always at least 1.
pub fn max_items_for_template(spec: &TemplateSpec) -> usize {
    let table = ResolvedTable::resolve(&spec.areas.items_table);

    let next_y = CAPACITY_LIMITING_AREAS
        .iter()
        .filter_map(|&key| spec.areas.get(key))
        .map(|area| area.y)
        .filter(|&y| y > table.y)
        .fold(spec.meta.height, f64::min);

    let available = next_y - (table.y + table.header_height);
    let rows = ((available - SAFETY_BUFFER_MM) / table.row_height).floor();

    if rows.is_finite() && rows >= 1.0 {
        rows as usize
    } else {
        1
    }
}
