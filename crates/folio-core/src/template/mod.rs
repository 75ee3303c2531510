pub mod builtin;
pub mod schema;

use crate::error::FolioError;
use schema::TemplateSpec;
use std::path::Path;

/// Load a template spec from a JSON file.
pub fn load_template(path: &Path) -> Result<TemplateSpec, FolioError> {
    let content = std::fs::read_to_string(path).map_err(|e| FolioError::TemplateLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    parse_template(&content, path)
}

/// Parse a template spec from a JSON string.
pub fn parse_template(json: &str, source: &Path) -> Result<TemplateSpec, FolioError> {
    reject_missing_sections(json)?;
    let spec: TemplateSpec = serde_json::from_str(json).map_err(|e| FolioError::TemplateLoad {
        path: source.to_path_buf(),
        reason: e.to_string(),
    })?;
    validate_template(&spec)?;
    Ok(spec)
}

/// Parse a template spec from a JSON string (no file path context).
pub fn parse_template_str(json: &str) -> Result<TemplateSpec, FolioError> {
    reject_missing_sections(json)?;
    let spec: TemplateSpec = serde_json::from_str(json).map_err(FolioError::Json)?;
    validate_template(&spec)?;
    Ok(spec)
}

/// Required sections absent from raw template JSON, as validation messages.
///
/// Runs before typed deserialization so a template missing several sections
/// reports all of them instead of serde's first "missing field". Returns an
/// empty list for JSON that is not an object; serde reports that instead.
pub fn missing_sections(json: &str) -> Vec<String> {
    let Ok(serde_json::Value::Object(root)) = serde_json::from_str(json) else {
        return Vec::new();
    };
    let mut errors = Vec::new();

    match root.get("meta") {
        Some(meta) => {
            if meta.get("margins").is_none() {
                errors.push("Page margins are required".to_string());
            }
        }
        None => errors.push("Template meta information is required".to_string()),
    }
    match root.get("styles") {
        Some(styles) => {
            if styles.get("sizes").is_none() {
                errors.push("Font sizes are required".to_string());
            }
        }
        None => errors.push("Template styles are required".to_string()),
    }
    match root.get("areas") {
        Some(areas) => {
            if areas.get("items_table").is_none() {
                errors.push("Items table area is required".to_string());
            }
            if areas.get("grand_total").is_none() {
                errors.push("Grand total area is required".to_string());
            }
        }
        None => errors.push("Template areas are required".to_string()),
    }

    errors
}

fn reject_missing_sections(json: &str) -> Result<(), FolioError> {
    let errors = missing_sections(json);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(FolioError::TemplateInvalid(errors))
    }
}

/// Validate that a template is well-formed, reporting every problem at once.
pub fn validate_template(spec: &TemplateSpec) -> Result<(), FolioError> {
    let errors = validation_errors(spec);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(FolioError::TemplateInvalid(errors))
    }
}

/// Human-readable validation messages; empty when the template is usable.
///
/// Out-of-bounds coordinates are reported, never corrected.
pub fn validation_errors(spec: &TemplateSpec) -> Vec<String> {
    let mut errors = Vec::new();
    let meta = &spec.meta;

    if meta.name.trim().is_empty() {
        errors.push("Template name is required".to_string());
    }
    if meta.width.is_nan() || meta.width <= 0.0 {
        errors.push("Valid page width is required".to_string());
    }
    if meta.height.is_nan() || meta.height <= 0.0 {
        errors.push("Valid page height is required".to_string());
    }

    let styles = &spec.styles;
    if styles.fonts.primary.trim().is_empty() {
        errors.push("Primary font is required".to_string());
    }
    if styles.colors.primary.trim().is_empty() {
        errors.push("Primary color is required".to_string());
    }
    if styles.colors.secondary.trim().is_empty() {
        errors.push("Secondary color is required".to_string());
    }

    let table = &spec.areas.items_table;
    if table.columns.is_empty() {
        errors.push("Items table must have at least one column".to_string());
    }
    if table.row_height.is_nan() || table.row_height <= 0.0 {
        errors.push("Items table row height must be positive".to_string());
    }

    let min_x = meta.margins.left;
    let max_x = meta.width - meta.margins.right;
    let min_y = meta.margins.top;
    let max_y = meta.height - meta.margins.bottom;

    let positions = spec
        .areas
        .iter()
        .map(|(key, area)| (key.as_str(), area.x, area.y))
        .chain(std::iter::once(("items_table", table.x, table.y)));

    for (name, x, y) in positions {
        if x < min_x || x > max_x {
            errors.push(format!("{name}: X coordinate out of bounds"));
        }
        if y < min_y || y > max_y {
            errors.push(format!("{name}: Y coordinate out of bounds"));
        }
    }

    errors
}
