use crate::error::FolioError;
use crate::template::schema::TemplateSpec;

const MINIMAL_JSON: &str = include_str!("../../../../templates/minimal.json");
const MODERN_JSON: &str = include_str!("../../../../templates/modern.json");
const CLASSIC_JSON: &str = include_str!("../../../../templates/classic.json");

/// Curated templates shipped with the engine.
pub const PRESETS: &[&str] = &["minimal", "modern", "classic"];

/// Raw JSON of a curated template.
pub fn preset_json(name: &str) -> Result<&'static str, FolioError> {
    match name {
        "minimal" => Ok(MINIMAL_JSON),
        "modern" => Ok(MODERN_JSON),
        "classic" => Ok(CLASSIC_JSON),
        _ => Err(FolioError::UnknownPreset {
            name: name.to_string(),
            available: PRESETS.join(", "),
        }),
    }
}

/// Load a curated template by name.
pub fn load_preset(name: &str) -> Result<TemplateSpec, FolioError> {
    let spec: TemplateSpec = serde_json::from_str(preset_json(name)?)?;
    Ok(spec)
}

/// All curated templates, in listing order.
pub fn all_presets() -> Result<Vec<(&'static str, TemplateSpec)>, FolioError> {
    PRESETS
        .iter()
        .map(|&name| load_preset(name).map(|spec| (name, spec)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::validation_errors;

    #[test]
    fn test_load_minimal_preset() {
        let spec = load_preset("minimal").unwrap();
        assert_eq!(spec.meta.name, "Minimal");
        assert!(!spec.areas.items_table.columns.is_empty());
    }

    #[test]
    fn test_unknown_preset() {
        let err = load_preset("xyz").unwrap_err();
        assert!(err.to_string().contains("minimal, modern, classic"));
    }

    #[test]
    fn test_presets_are_valid() {
        for (name, spec) in all_presets().unwrap() {
            let errors = validation_errors(&spec);
            assert!(errors.is_empty(), "preset {name}: {errors:?}");
        }
    }

    #[test]
    fn test_presets_round_trip() {
        for (name, spec) in all_presets().unwrap() {
            let json = serde_json::to_string_pretty(&spec).unwrap();
            let back: TemplateSpec = serde_json::from_str(&json).unwrap();
            assert_eq!(back, spec, "preset {name} lost data");

            let original: serde_json::Value = serde_json::from_str(preset_json(name).unwrap()).unwrap();
            let reserialized: serde_json::Value = serde_json::to_value(&spec).unwrap();
            assert_eq!(
                normalize_numbers(original),
                normalize_numbers(reserialized),
                "preset {name} differs from its source JSON"
            );
        }
    }

    /// Integers and floats with the same value compare equal.
    fn normalize_numbers(value: serde_json::Value) -> serde_json::Value {
        use serde_json::Value;
        match value {
            Value::Number(n) => n
                .as_f64()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
                .unwrap_or(Value::Number(n)),
            Value::Array(items) => Value::Array(items.into_iter().map(normalize_numbers).collect()),
            Value::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(k, v)| (k, normalize_numbers(v)))
                    .collect(),
            ),
            other => other,
        }
    }
}
