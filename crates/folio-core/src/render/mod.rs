pub mod format;

use crate::layout::{layout, AdjustedLayout, REFLOWED_AREAS};
use crate::model::{non_empty, CompanyData, InvoiceData, LineItem};
use crate::template::schema::{AreaKey, AreaSpec, ColumnKey, ColumnSpec, FontWeight, Styles};
use format::{
    css_url, css_value, escape_html, escape_multiline, format_currency, format_date,
    format_percent, format_quantity, num, DateFormat,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Per-render presentation switches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOptions {
    /// For business clients, add the contact person under the business name.
    #[serde(default)]
    pub include_contact_name: bool,
    /// Drop `tax_rate` columns from the items table.
    #[serde(default)]
    pub hide_tax_column: bool,
    #[serde(default)]
    pub date_format: DateFormat,
}

/// Render an invoice to a complete HTML document using a template.
pub fn render(
    invoice: &InvoiceData,
    company: &CompanyData,
    template: &crate::template::schema::TemplateSpec,
    options: &RenderOptions,
) -> String {
    let adjusted = layout(template, invoice.items.len());
    let styles = &template.styles;

    let mut content = String::new();

    let (trailing, leading): (Vec<_>, Vec<_>) = adjusted
        .areas
        .iter()
        .partition(|(key, _)| REFLOWED_AREAS.contains(key));

    for (key, area) in leading {
        if let Some(html) = area_content(key, invoice, company, options) {
            content.push_str(&render_area(key, area, &html));
        }
    }

    content.push_str(&render_table(&adjusted, styles, invoice, options));

    for (key, area) in trailing {
        if let Some(html) = area_content(key, invoice, company, options) {
            content.push_str(&render_area(key, area, &html));
        }
    }

    log::debug!(
        "rendered invoice {} with template '{}' ({} items, page {}x{}mm)",
        invoice.number,
        template.meta.name,
        invoice.items.len(),
        num(adjusted.page_width()),
        num(adjusted.page_height())
    );

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>Invoice {title}</title>\n<style>{css}</style>\n</head>\n<body>\n<div class=\"page\">\n{content}</div>\n</body>\n</html>\n",
        title = escape_html(&invoice.number),
        css = stylesheet(&adjusted, styles),
    )
}

/// Escaped inner HTML for an area, or `None` when there is nothing to show.
fn area_content(
    key: AreaKey,
    invoice: &InvoiceData,
    company: &CompanyData,
    options: &RenderOptions,
) -> Option<String> {
    let client = &invoice.client;
    let money = |amount: Decimal| format_currency(amount, &invoice.currency);
    let date = |raw: &str| escape_html(&format_date(raw, options.date_format));

    match key {
        AreaKey::InvoiceTitle => Some("INVOICE".to_string()),
        AreaKey::InvoiceNumber => Some(escape_html(&invoice.number)),
        AreaKey::CompanyInfo => {
            let mut lines = vec![escape_html(company.display_name())];
            if let Some(address) = non_empty(&company.company_address) {
                lines.push(escape_multiline(address));
            }
            if let Some(tax_id) = non_empty(&company.tax_id) {
                lines.push(format!("Tax ID: {}", escape_html(tax_id)));
            }
            Some(lines.join("<br>"))
        }
        AreaKey::CompanyAddress => non_empty(&company.company_address).map(escape_multiline),
        AreaKey::IssueDate => Some(format!("Issue Date: {}", date(&invoice.issue_date))),
        AreaKey::DueDate => {
            non_empty(&invoice.due_date).map(|due| format!("Due Date: {}", date(due)))
        }
        AreaKey::ClientName => match client.business_name() {
            Some(business) if options.include_contact_name => {
                let mut html = escape_html(business);
                if !client.name.trim().is_empty() && client.name.trim() != business {
                    html.push_str(&format!("<br>Attn: {}", escape_html(client.name.trim())));
                }
                Some(html)
            }
            _ => Some(escape_html(&client.name)),
        },
        AreaKey::ClientCompany => non_empty(&client.company).map(escape_html),
        AreaKey::ClientEmail => non_empty(&client.email).map(escape_html),
        AreaKey::ClientAddress => non_empty(&client.company_address).map(escape_multiline),
        AreaKey::ClientTaxId => {
            non_empty(&client.tax_id).map(|id| format!("Tax ID: {}", escape_html(id)))
        }
        AreaKey::Subtotal => Some(format!("Subtotal: {}", money(invoice.subtotal))),
        AreaKey::TaxTotal => Some(format!("Tax: {}", money(invoice.tax_total))),
        AreaKey::GrandTotal => Some(format!("Total: {}", money(invoice.total))),
        AreaKey::Notes => non_empty(&invoice.notes).map(escape_multiline),
        AreaKey::PaymentInfo => non_empty(&company.bank_details).map(escape_multiline),
        AreaKey::Footer => {
            if invoice.amount_paid > Decimal::ZERO {
                Some(format!("Balance due: {}", money(invoice.balance_due())))
            } else {
                Some("Thank you for your business".to_string())
            }
        }
    }
}

fn area_style(area: &AreaSpec) -> String {
    let mut style = vec![
        "position: absolute".to_string(),
        format!("left: {}mm", num(area.x)),
        format!("top: {}mm", num(area.y)),
    ];

    if let Some(w) = area.w {
        style.push(format!("width: {}mm", num(w)));
    }
    if let Some(h) = area.h {
        style.push(format!("height: {}mm", num(h)));
    }
    if let Some(align) = area.align {
        style.push(format!("text-align: {}", align.as_css()));
    }
    if let (Some(valign), Some(_)) = (area.valign, area.h) {
        style.push("display: flex".to_string());
        style.push("flex-direction: column".to_string());
        style.push(format!("justify-content: {}", valign.as_css()));
    }
    if let Some(color) = &area.color {
        style.push(format!("color: {}", css_value(color)));
    }
    if let Some(size) = area.font_size {
        style.push(format!("font-size: {}pt", num(size)));
    }
    if let Some(weight) = area.font_weight {
        style.push(format!("font-weight: {}", weight.as_css()));
    }
    if let Some(font_style) = area.style {
        style.push(format!("font-style: {}", font_style.as_css()));
    }

    escape_html(&style.join("; "))
}

fn render_area(key: AreaKey, area: &AreaSpec, content: &str) -> String {
    format!(
        "<div class=\"area area-{key}\" style=\"{style}\">{content}</div>\n",
        style = area_style(area)
    )
}

fn visible_columns<'a>(columns: &'a [ColumnSpec], options: &RenderOptions) -> Vec<&'a ColumnSpec> {
    columns
        .iter()
        .filter(|col| !(options.hide_tax_column && col.key == ColumnKey::TaxRate))
        .collect()
}

fn cell_content(col: &ColumnSpec, item: &LineItem, currency: &str) -> String {
    match col.key {
        ColumnKey::Description => escape_multiline(&item.description),
        ColumnKey::Qty => format_quantity(item.qty),
        ColumnKey::UnitPrice => format_currency(item.unit_price, currency),
        ColumnKey::TaxRate => format_percent(item.tax_rate),
        ColumnKey::LineTotal => format_currency(item.gross_total(), currency),
    }
}

fn render_table(
    adjusted: &AdjustedLayout,
    styles: &Styles,
    invoice: &InvoiceData,
    options: &RenderOptions,
) -> String {
    let spec = &adjusted.areas.items_table;
    let table = &adjusted.table;
    let columns = visible_columns(&spec.columns, options);
    let border_color = spec.border_color.as_deref().map(css_value);

    let table_style = [
        "position: absolute".to_string(),
        format!("left: {}mm", num(table.x)),
        format!("top: {}mm", num(table.y)),
        format!("width: {}mm", num(table.w)),
        "border-collapse: collapse".to_string(),
        "table-layout: fixed".to_string(),
    ]
    .join("; ");

    let mut html = format!("<table class=\"items\" style=\"{}\">\n", escape_html(&table_style));

    let mut header_row_style = format!("height: {}mm", num(table.header_height));
    if let Some(bg) = &spec.header_bg {
        header_row_style.push_str(&format!("; background: {}", css_value(bg)));
    }
    html.push_str(&format!(
        "<thead><tr style=\"{}\">",
        escape_html(&header_row_style)
    ));

    for col in &columns {
        let header_style = [
            format!("width: {}mm", num(col.w)),
            format!("text-align: {}", col.align.map_or("left", |a| a.as_css())),
            "padding: 0 2mm".to_string(),
            format!(
                "font-size: {}pt",
                num(spec.header_font_size.unwrap_or(styles.sizes.small))
            ),
            format!(
                "font-weight: {}",
                spec.header_font_weight.unwrap_or(FontWeight::Bold).as_css()
            ),
            format!(
                "color: {}",
                css_value(spec.header_color.as_deref().unwrap_or(&styles.colors.secondary))
            ),
            format!(
                "border-bottom: {}px solid {}",
                num(spec.border_width.unwrap_or(1.0)),
                border_color.as_deref().unwrap_or("#eee")
            ),
        ]
        .join("; ");

        html.push_str(&format!(
            "<th style=\"{}\">{}</th>",
            escape_html(&header_style),
            escape_html(&col.label)
        ));
    }
    html.push_str("</tr></thead>\n<tbody>\n");

    for (index, item) in invoice.ordered_items().into_iter().enumerate() {
        let mut row_style = format!("height: {}mm", num(table.row_height));
        if let (Some(bg), true) = (&spec.alt_row_bg, index % 2 == 1) {
            row_style.push_str(&format!("; background: {}", css_value(bg)));
        }
        html.push_str(&format!("<tr style=\"{}\">", escape_html(&row_style)));

        for col in &columns {
            let cell_style = [
                "padding: 0 2mm".to_string(),
                format!("text-align: {}", col.align.map_or("left", |a| a.as_css())),
                format!(
                    "font-size: {}pt",
                    num(col.font_size.unwrap_or(styles.sizes.default))
                ),
                format!(
                    "border-bottom: {}px solid {}",
                    num(spec.border_width.unwrap_or(0.5)),
                    border_color.as_deref().unwrap_or("#f5f5f5")
                ),
            ]
            .join("; ");

            html.push_str(&format!(
                "<td style=\"{}\">{}</td>",
                escape_html(&cell_style),
                cell_content(col, item, &invoice.currency)
            ));
        }
        html.push_str("</tr>\n");
    }

    html.push_str("</tbody>\n</table>\n");
    html
}

fn stylesheet(adjusted: &AdjustedLayout, styles: &Styles) -> String {
    let width = num(adjusted.page_width());
    let height = num(adjusted.page_height());

    let background = adjusted
        .meta
        .background()
        .map(|url| {
            format!(
                "\n  background-image: url('{}');\n  background-size: {width}mm {height}mm;\n  background-repeat: no-repeat;\n  background-position: 0 0;",
                css_url(url)
            )
        })
        .unwrap_or_default();

    format!(
        r#"
@page {{
  size: {width}mm {height}mm;
  margin: 0;
}}
html, body {{
  margin: 0;
  padding: 0;
}}
body {{
  font-family: {font};
  font-size: {size}pt;
  line-height: 1.4;
  color: {color};
  -webkit-print-color-adjust: exact;
  print-color-adjust: exact;
}}
.page {{
  position: relative;
  width: {width}mm;
  height: {height}mm;{background}
}}
.area {{
  overflow: hidden;
}}
.items th, .items td {{
  overflow: hidden;
  vertical-align: middle;
}}
"#,
        font = css_value(&styles.fonts.primary),
        size = num(styles.sizes.default),
        color = css_value(&styles.colors.primary),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ClientData;
    use crate::template::builtin::load_preset;
    use crate::template::schema::TemplateSpec;
    use rust_decimal_macros::dec;

    fn invoice(item_count: usize) -> InvoiceData {
        let items = (0..item_count)
            .map(|i| LineItem {
                id: format!("li-{i}"),
                position: i as u32 + 1,
                description: format!("Item {}", i + 1),
                qty: dec!(2),
                unit_price: dec!(19.999),
                tax_rate: dec!(0.1),
                line_total: dec!(39.998),
            })
            .collect();

        InvoiceData {
            id: "inv-1".into(),
            number: "INV-2024-007".into(),
            issue_date: "2024-03-05".into(),
            due_date: None,
            currency: "USD".into(),
            status: "draft".into(),
            notes: None,
            subtotal: dec!(100),
            tax_total: dec!(10),
            total: dec!(110),
            amount_paid: Decimal::ZERO,
            client: ClientData {
                name: "Jane Doe".into(),
                ..Default::default()
            },
            items,
        }
    }

    fn template() -> TemplateSpec {
        load_preset("minimal").unwrap()
    }

    #[test]
    fn test_cell_formatting() {
        let html = render(&invoice(1), &CompanyData::default(), &template(), &RenderOptions::default());
        assert!(html.contains(">$20.00</td>"));
        assert!(html.contains(">10.0%</td>"));
        // 39.998 * 1.1 = 43.9978
        assert!(html.contains(">$44.00</td>"));
        assert!(html.contains(">2</td>"));
    }

    #[test]
    fn test_client_name_is_escaped() {
        let mut inv = invoice(1);
        inv.client.name = "<script>alert(1)</script>".into();
        let html = render(&inv, &CompanyData::default(), &template(), &RenderOptions::default());
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
    }

    #[test]
    fn test_optional_area_omitted_without_data() {
        let html = render(&invoice(1), &CompanyData::default(), &template(), &RenderOptions::default());
        assert!(!html.contains("area-due_date"));
        assert!(!html.contains("area-notes"));
        assert!(!html.contains("area-client_email"));
        assert!(html.contains("area-grand_total"));

        let mut inv = invoice(1);
        inv.due_date = Some("2024-04-05".into());
        let html = render(&inv, &CompanyData::default(), &template(), &RenderOptions::default());
        assert!(html.contains("Due Date: 05/04/2024"));
    }

    #[test]
    fn test_area_omitted_when_template_lacks_it() {
        let mut spec = template();
        spec.areas.client_email = None;
        let mut inv = invoice(1);
        inv.client.email = Some("jane@example.com".into());
        let html = render(&inv, &CompanyData::default(), &spec, &RenderOptions::default());
        assert!(!html.contains("jane@example.com"));
    }

    #[test]
    fn test_page_grows_with_items() {
        let spec = template();
        let html = render(&invoice(15), &CompanyData::default(), &spec, &RenderOptions::default());
        // header 10 + 15 * 8 = 130 vs baseline 90 -> +40
        assert!(html.contains("size: 210mm 337mm"));
        assert!(html.contains("top: 240mm"));

        let html = render(&invoice(3), &CompanyData::default(), &spec, &RenderOptions::default());
        assert!(html.contains("size: 210mm 297mm"));
        assert!(html.contains("top: 200mm"));
    }

    #[test]
    fn test_hide_tax_column() {
        let options = RenderOptions {
            hide_tax_column: true,
            ..Default::default()
        };
        let html = render(&invoice(2), &CompanyData::default(), &template(), &options);
        assert!(!html.contains("10.0%"));
        assert!(!html.contains(">Tax</th>"));
        assert!(html.contains(">Amount</th>"));
    }

    #[test]
    fn test_include_contact_name_for_business_client() {
        let mut inv = invoice(1);
        inv.client.company = Some("Acme & Co".into());
        let options = RenderOptions {
            include_contact_name: true,
            ..Default::default()
        };
        let html = render(&inv, &CompanyData::default(), &template(), &options);
        assert!(html.contains("Acme &amp; Co<br>Attn: Jane Doe"));

        let html = render(&inv, &CompanyData::default(), &template(), &RenderOptions::default());
        assert!(!html.contains("Attn:"));
    }

    #[test]
    fn test_multiline_fields_get_line_breaks() {
        let mut inv = invoice(1);
        inv.notes = Some("Thanks!\nPay within 14 days".into());
        let company = CompanyData {
            company_name: Some("Doe Design".into()),
            company_address: Some("1 Main St\nSpringfield".into()),
            tax_id: Some("AB-123".into()),
            bank_details: Some("BSB 000-000\nACC 12345678".into()),
            ..Default::default()
        };
        let html = render(&inv, &company, &template(), &RenderOptions::default());
        assert!(html.contains("Thanks!<br>Pay within 14 days"));
        assert!(html.contains("Doe Design<br>1 Main St<br>Springfield<br>Tax ID: AB-123"));
        assert!(html.contains("BSB 000-000<br>ACC 12345678"));
    }

    #[test]
    fn test_background_painted_at_page_size() {
        let mut spec = template();
        spec.meta.background_image_url = Some("https://cdn.test/blank.png".into());
        let html = render(&invoice(12), &CompanyData::default(), &spec, &RenderOptions::default());
        assert!(html.contains("background-image: url('https://cdn.test/blank.png')"));
        // 12 items: +16mm
        assert!(html.contains("background-size: 210mm 313mm"));
    }

    #[test]
    fn test_zero_items_renders_header_only_table() {
        let html = render(&invoice(0), &CompanyData::default(), &template(), &RenderOptions::default());
        assert!(html.contains("<thead>"));
        assert!(html.contains("<tbody>\n</tbody>"));
    }

    #[test]
    fn test_alternating_rows() {
        let spec = load_preset("modern").unwrap();
        let html = render(&invoice(3), &CompanyData::default(), &spec, &RenderOptions::default());
        assert_eq!(html.matches("background: #f9fafb").count(), 1);
    }

    #[test]
    fn test_footer_shows_balance_when_partially_paid() {
        let mut inv = invoice(1);
        inv.amount_paid = dec!(50);
        let html = render(&inv, &CompanyData::default(), &template(), &RenderOptions::default());
        assert!(html.contains("Balance due: $60.00"));
    }
}
