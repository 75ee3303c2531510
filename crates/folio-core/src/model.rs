use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single billed line on an invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub position: u32,
    pub description: String,
    pub qty: Decimal,
    pub unit_price: Decimal,
    /// Fractional rate, `0.1` for 10%.
    #[serde(default)]
    pub tax_rate: Decimal,
    /// Net line total, before tax.
    pub line_total: Decimal,
}

impl LineItem {
    /// Line total including its proportional tax.
    pub fn gross_total(&self) -> Decimal {
        self.line_total + self.line_total * self.tax_rate
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientData {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legal_name: Option<String>,
}

impl ClientData {
    /// The registered business name, if the client bills as a business.
    pub fn business_name(&self) -> Option<&str> {
        non_empty(&self.legal_name).or_else(|| non_empty(&self.company))
    }
}

/// Invoice record as handed over by the persistence layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceData {
    #[serde(default)]
    pub id: String,
    pub number: String,
    pub issue_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    pub currency: String,
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub subtotal: Decimal,
    pub tax_total: Decimal,
    pub total: Decimal,
    #[serde(default)]
    pub amount_paid: Decimal,
    pub client: ClientData,
    #[serde(default)]
    pub items: Vec<LineItem>,
}

impl InvoiceData {
    /// Items in their display order.
    pub fn ordered_items(&self) -> Vec<&LineItem> {
        let mut items: Vec<&LineItem> = self.items.iter().collect();
        items.sort_by_key(|item| item.position);
        items
    }

    pub fn balance_due(&self) -> Decimal {
        self.total - self.amount_paid
    }
}

/// The issuing organization (or individual).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_details: Option<String>,
}

impl CompanyData {
    pub fn display_name(&self) -> &str {
        non_empty(&self.company_name)
            .or_else(|| non_empty(&self.full_name))
            .unwrap_or("Company Name")
    }
}

/// Treat blank strings the same as missing fields.
pub(crate) fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn item(position: u32, line_total: Decimal, tax_rate: Decimal) -> LineItem {
        LineItem {
            id: format!("item-{position}"),
            position,
            description: "Consulting".into(),
            qty: dec!(1),
            unit_price: line_total,
            tax_rate,
            line_total,
        }
    }

    #[test]
    fn test_gross_total_adds_tax() {
        assert_eq!(item(1, dec!(100), dec!(0.1)).gross_total(), dec!(110.0));
    }

    #[test]
    fn test_business_name_prefers_legal_name() {
        let client = ClientData {
            name: "Jane".into(),
            company: Some("Acme".into()),
            legal_name: Some("Acme Pty Ltd".into()),
            ..Default::default()
        };
        assert_eq!(client.business_name(), Some("Acme Pty Ltd"));

        let individual = ClientData {
            name: "Jane".into(),
            company: Some("  ".into()),
            ..Default::default()
        };
        assert_eq!(individual.business_name(), None);
    }

    #[test]
    fn test_company_display_name_fallbacks() {
        let mut company = CompanyData::default();
        assert_eq!(company.display_name(), "Company Name");
        company.full_name = Some("Jane Doe".into());
        assert_eq!(company.display_name(), "Jane Doe");
        company.company_name = Some("Doe Design".into());
        assert_eq!(company.display_name(), "Doe Design");
    }

    #[test]
    fn test_invoice_accepts_numeric_and_string_amounts() {
        let json = r#"{
            "number": "INV-2024-001",
            "issue_date": "2024-01-15",
            "currency": "USD",
            "subtotal": 100,
            "tax_total": "10.00",
            "total": 110.0,
            "client": { "name": "Jane" },
            "items": [
                { "position": 2, "description": "B", "qty": 1, "unit_price": 50, "line_total": 50 },
                { "position": 1, "description": "A", "qty": 1, "unit_price": 50, "tax_rate": 0.1, "line_total": 50 }
            ]
        }"#;
        let invoice: InvoiceData = serde_json::from_str(json).unwrap();
        assert_eq!(invoice.tax_total, dec!(10.00));
        assert_eq!(invoice.amount_paid, Decimal::ZERO);
        let ordered = invoice.ordered_items();
        assert_eq!(ordered[0].description, "A");
        assert_eq!(ordered[1].description, "B");
    }
}
