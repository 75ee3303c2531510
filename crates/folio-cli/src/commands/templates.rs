use folio_core::error::FolioError;
use folio_core::layout::ResolvedTable;
use folio_core::template::builtin;
use folio_core::template::schema::TemplateSpec;
use std::path::Path;

pub fn list() -> Result<(), FolioError> {
    println!("Available templates:\n");
    for (name, spec) in builtin::all_presets()? {
        println!(
            "  {:<8} {} ({} x {} mm, up to {} items)",
            name,
            spec.meta.name,
            spec.meta.width,
            spec.meta.height,
            folio_core::max_items_for_template(&spec)
        );
        if let Some(ref desc) = spec.meta.description {
            println!("           {}", desc);
        }
        println!();
    }
    Ok(())
}

pub fn show(preset: &str) -> Result<(), FolioError> {
    print!("{}", builtin::preset_json(preset)?);
    Ok(())
}

pub fn validate(file: &Path) -> Result<(), FolioError> {
    let content = std::fs::read_to_string(file)?;
    let missing = folio_core::template::missing_sections(&content);
    if !missing.is_empty() {
        report_problems(&file.display().to_string(), &missing);
        return Err(FolioError::TemplateInvalid(missing));
    }

    let spec: TemplateSpec =
        serde_json::from_str(&content).map_err(|e| FolioError::TemplateLoad {
            path: file.to_path_buf(),
            reason: e.to_string(),
        })?;

    let errors = folio_core::template::validation_errors(&spec);
    if !errors.is_empty() {
        report_problems(&spec.meta.name, &errors);
        return Err(FolioError::TemplateInvalid(errors));
    }

    println!("Template '{}' is valid.", spec.meta.name);
    println!("  Page: {} x {} mm", spec.meta.width, spec.meta.height);
    println!("  Areas: {}", spec.areas.iter().count());
    println!(
        "  Columns: {}",
        spec.areas
            .items_table
            .columns
            .iter()
            .map(|c| c.label.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    // Warnings, not errors
    let mut warnings = Vec::new();
    if spec.meta.background_image_url.is_some() && spec.meta.background_pdf_url.is_some() {
        warnings.push("both background_image_url and background_pdf_url are set; the PDF wins".to_string());
    }
    let total_width: f64 = spec.areas.items_table.columns.iter().map(|c| c.w).sum();
    if total_width > spec.areas.items_table.w {
        warnings.push(format!(
            "column widths add up to {total_width} mm, wider than the table ({} mm)",
            spec.areas.items_table.w
        ));
    }

    if !warnings.is_empty() {
        println!("\nWarnings:");
        for w in &warnings {
            println!("  - {}", w);
        }
    }

    Ok(())
}

pub fn capacity(template: &str) -> Result<(), FolioError> {
    let spec = if builtin::PRESETS.contains(&template) {
        builtin::load_preset(template)?
    } else {
        folio_core::template::load_template(Path::new(template))?
    };

    let table = ResolvedTable::resolve(&spec.areas.items_table);
    println!("{}\n", spec.meta.name);
    println!("  Items table:  {:.1} mm header, {:.1} mm rows", table.header_height, table.row_height);
    println!(
        "  Fits:         {} items on the {} mm page",
        folio_core::max_items_for_template(&spec),
        spec.meta.height
    );
    println!("  More items extend the page; nothing is paginated.");
    Ok(())
}

fn report_problems(name: &str, errors: &[String]) {
    println!("Template '{}' has {} problem(s):", name, errors.len());
    for e in errors {
        println!("  - {}", e);
    }
}
