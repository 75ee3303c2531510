pub mod rules;
pub mod tables;

pub use rules::{classify, classify_with_rule, suggest_field_mapping};
pub use tables::{detect_tables, DetectedTable};

use crate::extraction::{ExtractedText, TextItem};
use crate::template::schema::AreaKey;
use serde::{Deserialize, Serialize};

/// Whether a fragment is part of the template or filled per invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    /// Fixed label text, e.g. "Bill To:".
    Static,
    /// Data that changes per invoice, e.g. a date or an amount.
    Dynamic,
}

/// A fragment with its label and, for dynamic data, a suggested field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedItem {
    #[serde(flatten)]
    pub item: TextItem,
    pub classification: Classification,
    /// Name of the rule that decided the classification.
    pub rule: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_field: Option<AreaKey>,
}

/// Classify every fragment and suggest fields for the dynamic ones.
pub fn classify_items(extracted: &ExtractedText) -> Vec<ClassifiedItem> {
    let classified: Vec<ClassifiedItem> = extracted
        .items
        .iter()
        .map(|item| {
            let (classification, rule) = classify_with_rule(&item.text);
            let suggested_field = match classification {
                Classification::Dynamic => {
                    suggest_field_mapping(&item.text, item, &extracted.items)
                }
                Classification::Static => None,
            };
            ClassifiedItem {
                item: item.clone(),
                classification,
                rule,
                suggested_field,
            }
        })
        .collect();

    log::debug!(
        "classified {} fragments: {} static, {} with a suggested field",
        classified.len(),
        classified
            .iter()
            .filter(|c| c.classification == Classification::Static)
            .count(),
        classified.iter().filter(|c| c.suggested_field.is_some()).count()
    );

    classified
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(text: &str, x: f64, y: f64) -> TextItem {
        TextItem {
            text: text.to_string(),
            x,
            y,
            width: 40.0,
            height: 10.0,
            font_size: 10.0,
            font_name: "Helvetica".into(),
            transform: [10.0, 0.0, 0.0, 10.0, x, y],
        }
    }

    #[test]
    fn test_classify_items_suggests_only_for_dynamic() {
        let extracted = ExtractedText {
            items: vec![
                item("Due Date:", 100.0, 500.0),
                item("02/15/2024", 300.0, 505.0),
                item("jane@example.com", 100.0, 600.0),
                item("Invoice", 100.0, 100.0),
            ],
            page_width: 2550.0,
            page_height: 3300.0,
            dpi: 300,
        };
        let classified = classify_items(&extracted);

        assert_eq!(classified[0].classification, Classification::Static);
        assert_eq!(classified[0].suggested_field, None);
        assert_eq!(classified[1].suggested_field, Some(AreaKey::DueDate));
        assert_eq!(classified[2].suggested_field, Some(AreaKey::ClientEmail));
        assert_eq!(classified[3].rule, "label vocabulary");
    }

    #[test]
    fn test_classified_item_serializes_flat() {
        let extracted = ExtractedText {
            items: vec![item("$1,250.00", 10.0, 20.0)],
            page_width: 100.0,
            page_height: 100.0,
            dpi: 72,
        };
        let json = serde_json::to_value(&classify_items(&extracted)[0]).unwrap();
        assert_eq!(json["text"], "$1,250.00");
        assert_eq!(json["classification"], "dynamic");
        assert_eq!(json["suggested_field"], "grand_total");
    }
}
