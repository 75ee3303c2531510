use serde::{Deserialize, Serialize};
use std::fmt;

/// A complete document blueprint: page, styles and positioned areas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateSpec {
    pub meta: PageMeta,
    pub styles: Styles,
    pub areas: Areas,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageMeta {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Page width in mm.
    pub width: f64,
    /// Page height in mm.
    pub height: f64,
    pub dpi: u32,
    pub margins: Margins,
    /// PNG/JPEG rendition of the page, used while mapping fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_image_url: Option<String>,
    /// Original PDF, preferred over the image for final rendering.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_pdf_url: Option<String>,
}

impl PageMeta {
    /// The background to paint behind the page, PDF first.
    pub fn background(&self) -> Option<&str> {
        self.background_pdf_url
            .as_deref()
            .or(self.background_image_url.as_deref())
            .filter(|url| !url.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Styles {
    pub fonts: Fonts,
    pub colors: Colors,
    pub sizes: Sizes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fonts {
    pub primary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Colors {
    pub primary: String,
    pub secondary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accent: Option<String>,
}

/// Font size scale, in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sizes {
    pub default: f64,
    pub small: f64,
    pub large: f64,
    pub title: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    Left,
    Center,
    Right,
}

impl Align {
    pub fn as_css(self) -> &'static str {
        match self {
            Align::Left => "left",
            Align::Center => "center",
            Align::Right => "right",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VAlign {
    Top,
    Middle,
    Bottom,
}

impl VAlign {
    pub fn as_css(self) -> &'static str {
        match self {
            VAlign::Top => "flex-start",
            VAlign::Middle => "center",
            VAlign::Bottom => "flex-end",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    Normal,
    Bold,
}

impl FontWeight {
    pub fn as_css(self) -> &'static str {
        match self {
            FontWeight::Normal => "normal",
            FontWeight::Bold => "bold",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    Normal,
    Italic,
}

impl FontStyle {
    pub fn as_css(self) -> &'static str {
        match self {
            FontStyle::Normal => "normal",
            FontStyle::Italic => "italic",
        }
    }
}

/// One positioned text region. Coordinates are mm from the top-left corner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaSpec {
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub w: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<Align>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valign: Option<VAlign>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<FontWeight>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<FontStyle>,
}

impl AreaSpec {
    pub fn at(x: f64, y: f64) -> Self {
        AreaSpec {
            x,
            y,
            w: None,
            h: None,
            align: None,
            valign: None,
            font_size: None,
            font_weight: None,
            color: None,
            style: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKey {
    Description,
    Qty,
    UnitPrice,
    TaxRate,
    LineTotal,
}

impl ColumnKey {
    pub const ALL: [ColumnKey; 5] = [
        ColumnKey::Description,
        ColumnKey::Qty,
        ColumnKey::UnitPrice,
        ColumnKey::TaxRate,
        ColumnKey::LineTotal,
    ];

    pub fn default_label(self) -> &'static str {
        match self {
            ColumnKey::Description => "Description",
            ColumnKey::Qty => "Qty",
            ColumnKey::UnitPrice => "Unit Price",
            ColumnKey::TaxRate => "Tax",
            ColumnKey::LineTotal => "Total",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub key: ColumnKey,
    pub label: String,
    pub w: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<Align>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
}

/// The line-items grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSpec {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub row_height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_height: Option<f64>,
    pub columns: Vec<ColumnSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_bg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_row_bg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_font_weight: Option<FontWeight>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_color: Option<String>,
}

/// Semantic names of the positioned text areas a template may define.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AreaKey {
    InvoiceTitle,
    InvoiceNumber,
    IssueDate,
    DueDate,
    CompanyInfo,
    CompanyAddress,
    ClientName,
    ClientCompany,
    ClientAddress,
    ClientEmail,
    ClientTaxId,
    Subtotal,
    TaxTotal,
    GrandTotal,
    Notes,
    PaymentInfo,
    Footer,
}

impl AreaKey {
    /// Every area key, in document order.
    pub const ALL: [AreaKey; 17] = [
        AreaKey::InvoiceTitle,
        AreaKey::InvoiceNumber,
        AreaKey::IssueDate,
        AreaKey::DueDate,
        AreaKey::CompanyInfo,
        AreaKey::CompanyAddress,
        AreaKey::ClientName,
        AreaKey::ClientCompany,
        AreaKey::ClientAddress,
        AreaKey::ClientEmail,
        AreaKey::ClientTaxId,
        AreaKey::Subtotal,
        AreaKey::TaxTotal,
        AreaKey::GrandTotal,
        AreaKey::Notes,
        AreaKey::PaymentInfo,
        AreaKey::Footer,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AreaKey::InvoiceTitle => "invoice_title",
            AreaKey::InvoiceNumber => "invoice_number",
            AreaKey::IssueDate => "issue_date",
            AreaKey::DueDate => "due_date",
            AreaKey::CompanyInfo => "company_info",
            AreaKey::CompanyAddress => "company_address",
            AreaKey::ClientName => "client_name",
            AreaKey::ClientCompany => "client_company",
            AreaKey::ClientAddress => "client_address",
            AreaKey::ClientEmail => "client_email",
            AreaKey::ClientTaxId => "client_tax_id",
            AreaKey::Subtotal => "subtotal",
            AreaKey::TaxTotal => "tax_total",
            AreaKey::GrandTotal => "grand_total",
            AreaKey::Notes => "notes",
            AreaKey::PaymentInfo => "payment_info",
            AreaKey::Footer => "footer",
        }
    }
}

impl fmt::Display for AreaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named areas of a template. `items_table` and `grand_total` are mandatory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Areas {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice_title: Option<AreaSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice_number: Option<AreaSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_date: Option<AreaSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<AreaSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_info: Option<AreaSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_address: Option<AreaSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_name: Option<AreaSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_company: Option<AreaSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_address: Option<AreaSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_email: Option<AreaSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_tax_id: Option<AreaSpec>,
    pub items_table: TableSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtotal: Option<AreaSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_total: Option<AreaSpec>,
    pub grand_total: AreaSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<AreaSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_info: Option<AreaSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer: Option<AreaSpec>,
}

impl Areas {
    /// An area set holding only the mandatory entries.
    pub fn new(items_table: TableSpec, grand_total: AreaSpec) -> Self {
        Areas {
            invoice_title: None,
            invoice_number: None,
            issue_date: None,
            due_date: None,
            company_info: None,
            company_address: None,
            client_name: None,
            client_company: None,
            client_address: None,
            client_email: None,
            client_tax_id: None,
            items_table,
            subtotal: None,
            tax_total: None,
            grand_total,
            notes: None,
            payment_info: None,
            footer: None,
        }
    }

    pub fn get(&self, key: AreaKey) -> Option<&AreaSpec> {
        match key {
            AreaKey::InvoiceTitle => self.invoice_title.as_ref(),
            AreaKey::InvoiceNumber => self.invoice_number.as_ref(),
            AreaKey::IssueDate => self.issue_date.as_ref(),
            AreaKey::DueDate => self.due_date.as_ref(),
            AreaKey::CompanyInfo => self.company_info.as_ref(),
            AreaKey::CompanyAddress => self.company_address.as_ref(),
            AreaKey::ClientName => self.client_name.as_ref(),
            AreaKey::ClientCompany => self.client_company.as_ref(),
            AreaKey::ClientAddress => self.client_address.as_ref(),
            AreaKey::ClientEmail => self.client_email.as_ref(),
            AreaKey::ClientTaxId => self.client_tax_id.as_ref(),
            AreaKey::Subtotal => self.subtotal.as_ref(),
            AreaKey::TaxTotal => self.tax_total.as_ref(),
            AreaKey::GrandTotal => Some(&self.grand_total),
            AreaKey::Notes => self.notes.as_ref(),
            AreaKey::PaymentInfo => self.payment_info.as_ref(),
            AreaKey::Footer => self.footer.as_ref(),
        }
    }

    /// Replace an area. Setting `grand_total` to `None` is ignored since it is mandatory.
    pub fn set(&mut self, key: AreaKey, area: Option<AreaSpec>) {
        let slot = match key {
            AreaKey::InvoiceTitle => &mut self.invoice_title,
            AreaKey::InvoiceNumber => &mut self.invoice_number,
            AreaKey::IssueDate => &mut self.issue_date,
            AreaKey::DueDate => &mut self.due_date,
            AreaKey::CompanyInfo => &mut self.company_info,
            AreaKey::CompanyAddress => &mut self.company_address,
            AreaKey::ClientName => &mut self.client_name,
            AreaKey::ClientCompany => &mut self.client_company,
            AreaKey::ClientAddress => &mut self.client_address,
            AreaKey::ClientEmail => &mut self.client_email,
            AreaKey::ClientTaxId => &mut self.client_tax_id,
            AreaKey::Subtotal => &mut self.subtotal,
            AreaKey::TaxTotal => &mut self.tax_total,
            AreaKey::GrandTotal => {
                if let Some(area) = area {
                    self.grand_total = area;
                }
                return;
            }
            AreaKey::Notes => &mut self.notes,
            AreaKey::PaymentInfo => &mut self.payment_info,
            AreaKey::Footer => &mut self.footer,
        };
        *slot = area;
    }

    /// Defined areas in document order (the items table is not included).
    pub fn iter(&self) -> impl Iterator<Item = (AreaKey, &AreaSpec)> + '_ {
        AreaKey::ALL
            .iter()
            .filter_map(move |&key| self.get(key).map(|area| (key, area)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_json() -> &'static str {
        r##"{
            "meta": {
                "name": "Tiny",
                "width": 210, "height": 297, "dpi": 300,
                "margins": { "top": 10, "right": 10, "bottom": 10, "left": 10 }
            },
            "styles": {
                "fonts": { "primary": "Helvetica" },
                "colors": { "primary": "#111", "secondary": "#666" },
                "sizes": { "default": 10, "small": 8, "large": 14, "title": 24 }
            },
            "areas": {
                "items_table": {
                    "x": 15, "y": 90, "w": 180, "row_height": 8,
                    "columns": [ { "key": "unit_price", "label": "Price", "w": 40, "align": "right" } ]
                },
                "grand_total": { "x": 150, "y": 250, "font_weight": "bold" }
            }
        }"##
    }

    #[test]
    fn test_parse_minimal_template() {
        let spec: TemplateSpec = serde_json::from_str(minimal_json()).unwrap();
        assert_eq!(spec.meta.name, "Tiny");
        assert_eq!(spec.areas.items_table.columns[0].key, ColumnKey::UnitPrice);
        assert_eq!(spec.areas.grand_total.font_weight, Some(FontWeight::Bold));
        assert!(spec.areas.subtotal.is_none());
    }

    #[test]
    fn test_optional_fields_stay_absent_when_serialized() {
        let spec: TemplateSpec = serde_json::from_str(minimal_json()).unwrap();
        let json = serde_json::to_string(&spec).unwrap();
        assert!(!json.contains("subtotal"));
        assert!(!json.contains("header_height"));
        assert!(!json.contains("background_image_url"));
    }

    #[test]
    fn test_missing_grand_total_rejected() {
        let json = minimal_json().replace(
            r#""grand_total": { "x": 150, "y": 250, "font_weight": "bold" }"#,
            r#""subtotal": { "x": 150, "y": 250 }"#,
        );
        assert!(serde_json::from_str::<TemplateSpec>(&json).is_err());
    }

    #[test]
    fn test_unknown_area_rejected() {
        let json = minimal_json().replace(r#""grand_total""#, r#""qr_code": { "x": 1, "y": 1 }, "grand_total""#);
        assert!(serde_json::from_str::<TemplateSpec>(&json).is_err());
    }

    #[test]
    fn test_unknown_column_key_rejected() {
        let json = minimal_json().replace("unit_price", "discount");
        assert!(serde_json::from_str::<TemplateSpec>(&json).is_err());
    }

    #[test]
    fn test_area_iteration_order_and_set() {
        let mut spec: TemplateSpec = serde_json::from_str(minimal_json()).unwrap();
        spec.areas.set(AreaKey::Notes, Some(AreaSpec::at(15.0, 260.0)));
        spec.areas.set(AreaKey::InvoiceTitle, Some(AreaSpec::at(15.0, 15.0)));
        let keys: Vec<AreaKey> = spec.areas.iter().map(|(k, _)| k).collect();
        assert_eq!(
            keys,
            vec![AreaKey::InvoiceTitle, AreaKey::GrandTotal, AreaKey::Notes]
        );

        spec.areas.set(AreaKey::GrandTotal, None);
        assert_eq!(spec.areas.grand_total.x, 150.0);
    }

    #[test]
    fn test_background_prefers_pdf() {
        let mut spec: TemplateSpec = serde_json::from_str(minimal_json()).unwrap();
        assert_eq!(spec.meta.background(), None);
        spec.meta.background_image_url = Some("https://cdn.example/bg.png".into());
        assert_eq!(spec.meta.background(), Some("https://cdn.example/bg.png"));
        spec.meta.background_pdf_url = Some("https://cdn.example/bg.pdf".into());
        assert_eq!(spec.meta.background(), Some("https://cdn.example/bg.pdf"));
    }
}
