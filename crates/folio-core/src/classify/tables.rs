use crate::extraction::TextItem;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Row bucket size in pixels.
const ROW_TOLERANCE: f64 = 5.0;

/// Column bucket size in pixels, used only to estimate the column count.
const COLUMN_TOLERANCE: f64 = 10.0;

const MIN_ROW_FRAGMENTS: usize = 3;
const MIN_TABLE_ROWS: usize = 2;
const MIN_TABLE_FRAGMENTS: usize = 6;

/// Rows closer than this (px) belong to the same table.
const MAX_ROW_GAP: f64 = 50.0;

/// A grid of aligned fragments.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectedTable {
    pub items: Vec<TextItem>,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Estimated from distinct row buckets.
    pub rows: usize,
    /// Estimated from distinct column buckets.
    pub columns: usize,
}

impl DetectedTable {
    fn from_items(items: Vec<TextItem>) -> Self {
        let x = items.iter().map(|i| i.x).fold(f64::INFINITY, f64::min);
        let y = items.iter().map(|i| i.y).fold(f64::INFINITY, f64::min);
        let right = items.iter().map(|i| i.x + i.width).fold(f64::NEG_INFINITY, f64::max);
        let bottom = items.iter().map(|i| i.y + i.height).fold(f64::NEG_INFINITY, f64::max);

        let rows = items
            .iter()
            .map(|i| bucket(i.y, ROW_TOLERANCE))
            .collect::<BTreeSet<_>>()
            .len();
        let columns = items
            .iter()
            .map(|i| bucket(i.x, COLUMN_TOLERANCE))
            .collect::<BTreeSet<_>>()
            .len();

        DetectedTable {
            items,
            x,
            y,
            width: right - x,
            height: bottom - y,
            rows,
            columns,
        }
    }

    /// Area of the bounding box, used to pick the dominant table.
    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

/// Round to the nearest bucket index, halves rounding up.
fn bucket(value: f64, size: f64) -> i64 {
    (value / size + 0.5).floor() as i64
}

/// Find grid-like groups of fragments.
///
/// Fragments are grouped into 5px rows; rows with at least three fragments
/// are candidate table rows, and consecutive candidates less than 50px apart
/// form one table. Tables need at least six fragments.
pub fn detect_tables(items: &[TextItem]) -> Vec<DetectedTable> {
    let mut row_groups: BTreeMap<i64, Vec<&TextItem>> = BTreeMap::new();
    for item in items {
        row_groups
            .entry(bucket(item.y, ROW_TOLERANCE))
            .or_default()
            .push(item);
    }

    let table_rows: Vec<(f64, Vec<&TextItem>)> = row_groups
        .into_iter()
        .filter(|(_, row)| row.len() >= MIN_ROW_FRAGMENTS)
        .map(|(key, row)| (key as f64 * ROW_TOLERANCE, row))
        .collect();

    if table_rows.len() < MIN_TABLE_ROWS {
        return Vec::new();
    }

    let mut tables = Vec::new();
    let mut current: Vec<TextItem> = Vec::new();
    let mut prev_y: Option<f64> = None;

    for (y, row) in table_rows {
        let continues = prev_y.is_some_and(|prev| y - prev < MAX_ROW_GAP);

        if !current.is_empty() && !continues {
            if current.len() >= MIN_TABLE_FRAGMENTS {
                tables.push(DetectedTable::from_items(std::mem::take(&mut current)));
            } else {
                current.clear();
            }
        }
        current.extend(row.into_iter().cloned());
        prev_y = Some(y);
    }

    if current.len() >= MIN_TABLE_FRAGMENTS {
        tables.push(DetectedTable::from_items(current));
    }

    log::debug!("detected {} table(s) among {} fragments", tables.len(), items.len());
    tables
}
