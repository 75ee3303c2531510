use crate::classify::Classification;
use crate::extraction::TextItem;
use crate::template::schema::AreaKey;
use regex::Regex;
use std::sync::LazyLock;

/// Fragments shorter than this with no digits, `@` or `$` read as labels.
const SHORT_LABEL_CHARS: usize = 20;

/// Vertical distance (px) within which a "due" label applies to a date.
const LABEL_ROW_TOLERANCE: f64 = 20.0;

enum Test {
    Pattern(Regex),
    /// Short text with no digit, `@` or `$`.
    ShortPlain,
}

struct Rule {
    name: &'static str,
    test: Test,
    label: Classification,
}

impl Rule {
    fn pattern(name: &'static str, pattern: &str, label: Classification) -> Self {
        Rule {
            name,
            test: Test::Pattern(Regex::new(pattern).expect("static pattern")),
            label,
        }
    }

    fn matches(&self, text: &str) -> bool {
        match &self.test {
            Test::Pattern(re) => re.is_match(text),
            Test::ShortPlain => {
                text.chars().count() < SHORT_LABEL_CHARS
                    && !text.chars().any(|c| c.is_ascii_digit() || c == '@' || c == '$')
            }
        }
    }
}

const INVOICE_NUMBER: &str = r"^INV-[0-9]{4}-[0-9]+$";
const SLASH_DATE: &str = r"^[0-9]{1,2}/[0-9]{1,2}/[0-9]{2,4}$";
const ISO_DATE: &str = r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$";
const CURRENCY: &str = r"^\$[0-9,]+\.?[0-9]*$";
const EMAIL: &str = r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$";

static RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    use Classification::{Dynamic, Static};
    vec![
        Rule::pattern("invoice number", INVOICE_NUMBER, Dynamic),
        Rule::pattern("slash date", SLASH_DATE, Dynamic),
        Rule::pattern("iso date", ISO_DATE, Dynamic),
        Rule::pattern("currency", CURRENCY, Dynamic),
        Rule::pattern("number", r"^[0-9,]+\.?[0-9]*$", Dynamic),
        Rule::pattern("email", EMAIL, Dynamic),
        Rule::pattern("quantity", r"^[0-9]{1,3}$", Dynamic),
        Rule::pattern("hash id", r"^#[0-9]+$", Dynamic),
        Rule::pattern(
            "label vocabulary",
            r"(?i)^(invoice|bill to|bill from|date|due date|amount|total|subtotal|tax|item|description|qty|quantity|price|notes|payment|terms)$",
            Static,
        ),
        Rule::pattern("all caps", r"^[A-Z\s]{2,}$", Static),
        Rule::pattern("trailing colon", r":\s*$", Static),
        Rule {
            name: "short plain text",
            test: Test::ShortPlain,
            label: Static,
        },
    ]
});

struct FieldPatterns {
    invoice_number: Regex,
    numeric_id: Regex,
    slash_date: Regex,
    iso_date: Regex,
    currency: Regex,
    email: Regex,
    due: Regex,
}

static FIELDS: LazyLock<FieldPatterns> = LazyLock::new(|| FieldPatterns {
    invoice_number: Regex::new(INVOICE_NUMBER).expect("static pattern"),
    numeric_id: Regex::new(r"^#?[0-9]{4,}$").expect("static pattern"),
    slash_date: Regex::new(SLASH_DATE).expect("static pattern"),
    iso_date: Regex::new(ISO_DATE).expect("static pattern"),
    currency: Regex::new(CURRENCY).expect("static pattern"),
    email: Regex::new(EMAIL).expect("static pattern"),
    due: Regex::new(r"(?i)due").expect("static pattern"),
});

/// Label a fragment static or dynamic.
pub fn classify(text: &str) -> Classification {
    classify_with_rule(text).0
}

/// Like [`classify`], also naming the rule that decided.
pub fn classify_with_rule(text: &str) -> (Classification, &'static str) {
    let trimmed = text.trim();
    RULES
        .iter()
        .find(|rule| rule.matches(trimmed))
        .map(|rule| (rule.label, rule.name))
        .unwrap_or((Classification::Dynamic, "default"))
}

/// Suggest which template field a dynamic fragment fills.
///
/// Dates are `due_date` when a fragment mentioning "due" sits to their left
/// on roughly the same row, `issue_date` otherwise. Every currency amount is
/// proposed as `grand_total`; telling totals apart is left to the user.
pub fn suggest_field_mapping(text: &str, item: &TextItem, all_items: &[TextItem]) -> Option<AreaKey> {
    let trimmed = text.trim();
    let p = &*FIELDS;

    if p.invoice_number.is_match(trimmed) || p.numeric_id.is_match(trimmed) {
        return Some(AreaKey::InvoiceNumber);
    }

    if p.slash_date.is_match(trimmed) || p.iso_date.is_match(trimmed) {
        let has_due_label = all_items.iter().any(|other| {
            (other.y - item.y).abs() < LABEL_ROW_TOLERANCE
                && other.x < item.x
                && p.due.is_match(&other.text)
        });
        return Some(if has_due_label {
            AreaKey::DueDate
        } else {
            AreaKey::IssueDate
        });
    }

    if p.currency.is_match(trimmed) {
        return Some(AreaKey::GrandTotal);
    }

    if p.email.is_match(trimmed) {
        return Some(AreaKey::ClientEmail);
    }

    // Small integers are quantities in the items table.
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use Classification::{Dynamic, Static};

    fn item(text: &str, x: f64, y: f64) -> TextItem {
        TextItem {
            text: text.to_string(),
            x,
            y,
            width: 50.0,
            height: 12.0,
            font_size: 12.0,
            font_name: String::new(),
            transform: [12.0, 0.0, 0.0, 12.0, x, y],
        }
    }

    #[test]
    fn test_dynamic_patterns() {
        for text in [
            "INV-2024-001",
            "01/15/2024",
            "1/5/24",
            "2024-01-15",
            "$1,234.56",
            "1234.56",
            "jane.doe+billing@example.co",
            "42",
            "#123",
        ] {
            assert_eq!(classify(text), Dynamic, "{text}");
        }
    }

    #[test]
    fn test_static_patterns() {
        for text in ["Bill To", "SUBTOTAL", "due date", "INVOICE NUMBER", "Invoice Number:", "Date:", "Terms:  ", "Thank you"] {
            assert_eq!(classify(text), Static, "{text}");
        }
    }

    #[test]
    fn test_first_match_wins() {
        // Digits only, so the number rule fires before any label rule.
        assert_eq!(classify_with_rule("2024"), (Dynamic, "number"));
        assert_eq!(classify_with_rule("  Qty "), (Static, "label vocabulary"));
        assert_eq!(classify_with_rule("TOTAL"), (Static, "label vocabulary"));
        assert_eq!(classify_with_rule("Invoice #:"), (Static, "trailing colon"));
    }

    #[test]
    fn test_fallbacks() {
        assert_eq!(classify_with_rule("Acme Widgets"), (Static, "short plain text"));
        assert_eq!(classify_with_rule("Suite 4, 12 High Street"), (Dynamic, "default"));
        assert_eq!(classify_with_rule("A very long sentence of prose here"), (Dynamic, "default"));
        assert_eq!(classify_with_rule("Pay to acct@bank"), (Dynamic, "default"));
    }

    #[test]
    fn test_classification_is_deterministic() {
        for text in ["Due Date:", "$5", "hello world", "2024-13-45"] {
            assert_eq!(classify(text), classify(text));
        }
    }

    #[test]
    fn test_field_mapping_invoice_number() {
        let it = item("INV-2024-007", 0.0, 0.0);
        assert_eq!(suggest_field_mapping("INV-2024-007", &it, &[]), Some(AreaKey::InvoiceNumber));
        assert_eq!(suggest_field_mapping("#10045", &it, &[]), Some(AreaKey::InvoiceNumber));
    }

    #[test]
    fn test_field_mapping_due_date_needs_label_to_the_left() {
        let date = item("02/15/2024", 400.0, 300.0);
        let label_left = item("Due Date:", 100.0, 305.0);
        let label_right = item("Due Date:", 600.0, 300.0);
        let label_far = item("Due Date:", 100.0, 330.0);

        assert_eq!(
            suggest_field_mapping(&date.text, &date, &[label_left, date.clone()]),
            Some(AreaKey::DueDate)
        );
        assert_eq!(
            suggest_field_mapping(&date.text, &date, &[label_right, label_far]),
            Some(AreaKey::IssueDate)
        );
    }

    #[test]
    fn test_field_mapping_others() {
        let it = item("x", 0.0, 0.0);
        assert_eq!(suggest_field_mapping("$99.00", &it, &[]), Some(AreaKey::GrandTotal));
        assert_eq!(suggest_field_mapping("a@b.io", &it, &[]), Some(AreaKey::ClientEmail));
        assert_eq!(suggest_field_mapping("12", &it, &[]), None);
        assert_eq!(suggest_field_mapping("Net 30", &it, &[]), None);
    }
}
