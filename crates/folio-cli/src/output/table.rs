use folio_core::classify::{Classification, ClassifiedItem, DetectedTable};
use folio_core::extraction::ExtractedText;
use folio_core::suggest::SuggestedTemplate;

pub fn print_extraction(
    extracted: &ExtractedText,
    items: &[ClassifiedItem],
    tables: &[DetectedTable],
) {
    println!(
        "Page: {:.0} x {:.0} px at {} dpi, {} fragment(s)\n",
        extracted.page_width,
        extracted.page_height,
        extracted.dpi,
        items.len()
    );

    if items.is_empty() {
        println!("  No text found on the first page.");
        return;
    }

    let max_text = items
        .iter()
        .map(|c| c.item.text.chars().count())
        .max()
        .unwrap_or(10)
        .clamp(10, 40);

    println!(
        "  {:<width$}  {:>7}  {:>7}  {:>5}  {:<8}  {:<18}  Rule",
        "Text",
        "X",
        "Y",
        "Size",
        "Kind",
        "Field",
        width = max_text
    );
    println!("  {}", "-".repeat(max_text + 70));

    for c in items {
        let kind = match c.classification {
            Classification::Static => "static",
            Classification::Dynamic => "dynamic",
        };
        let field = c.suggested_field.map(|f| f.as_str()).unwrap_or("-");
        println!(
            "  {:<width$}  {:>7.1}  {:>7.1}  {:>5.1}  {:<8}  {:<18}  {}",
            truncate(&c.item.text, max_text),
            c.item.x,
            c.item.y,
            c.item.font_size,
            kind,
            field,
            c.rule,
            width = max_text
        );
    }
    println!();

    if tables.is_empty() {
        println!("  No tables detected.");
    } else {
        println!("  Detected tables:");
        for (i, t) in tables.iter().enumerate() {
            println!(
                "    #{}  at ({:.0}, {:.0}) px, {:.0} x {:.0} px, ~{} rows x {} columns, {} fragments",
                i + 1,
                t.x,
                t.y,
                t.width,
                t.height,
                t.rows,
                t.columns,
                t.items.len()
            );
        }
    }
}

pub fn print_suggestion_notes(suggested: &SuggestedTemplate) {
    let mapped: Vec<&str> = suggested
        .spec
        .areas
        .iter()
        .map(|(key, _)| key.as_str())
        .collect();
    eprintln!("  mapped areas: {}", mapped.join(", "));

    if suggested.tables.is_empty() {
        eprintln!("  no table detected; a default items table was proposed");
    }

    if !suggested.errors.is_empty() {
        eprintln!("  the draft needs attention before use:");
        for e in &suggested.errors {
            eprintln!("    - {}", e);
        }
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let mut short: String = text.chars().take(max.saturating_sub(3)).collect();
        short.push_str("...");
        short
    }
}
