//! Settings loading from configuration files.
//!
//! This module loads [`FormationSettings`] from TOML or JSON and applies
//! environment variable overrides.
//!
//! ## Loading Order
//!
//! 1. Start with default settings.
//! 2. Load from a TOML or JSON document (overriding defaults).
//! 3. Apply environment variable overrides (highest priority).
//!
//! ## Environment Variable Mapping
//!
//! | Env Var | Setting |
//! |---|---|
//! | `FORMATION_LOG_LEVEL` | `log_level` |
//! | `FORMATION_DEBUG` | `debug` |
//! | `FORMATION_LABEL_CLASS` | `label_class` |
//! | `FORMATION_FIELD_CLASS` | `field_class` |
//! | `FORMATION_DATE_FORMAT` | `date_display_format` |
//!
//! ## Examples
//!
//! ```rust,no_run
//! use formation_core::settings_loader;
//!
//! let settings = settings_loader::from_toml_file("config/formation.toml").unwrap();
//! let settings = settings_loader::from_toml_file_with_env("config/formation.toml").unwrap();
//! ```

use std::path::Path;

use crate::error::FormationError;
use crate::settings::FormationSettings;

/// Loads settings from a TOML string.
///
/// Any key missing from the document keeps its default value.
///
/// # Errors
///
/// Returns an error if the TOML is malformed or cannot be deserialized.
pub fn from_toml_str(toml_str: &str) -> Result<FormationSettings, FormationError> {
    let toml_value: toml::Value = toml::from_str(toml_str)
        .map_err(|e| FormationError::Configuration(format!("Failed to parse TOML: {e}")))?;
    from_json_value(toml_to_json(toml_value), "TOML")
}

/// Loads settings from a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the TOML is malformed.
pub fn from_toml_file(path: impl AsRef<Path>) -> Result<FormationSettings, FormationError> {
    let content = read_file(path.as_ref(), "TOML")?;
    from_toml_str(&content)
}

/// Loads settings from a TOML file and then applies environment variable overrides.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the TOML is malformed.
pub fn from_toml_file_with_env(
    path: impl AsRef<Path>,
) -> Result<FormationSettings, FormationError> {
    let mut settings = from_toml_file(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Loads settings from a JSON string.
///
/// # Errors
///
/// Returns an error if the JSON is malformed or cannot be deserialized.
pub fn from_json_str(json_str: &str) -> Result<FormationSettings, FormationError> {
    let json_value: serde_json::Value = serde_json::from_str(json_str)
        .map_err(|e| FormationError::Configuration(format!("Failed to parse JSON: {e}")))?;
    from_json_value(json_value, "JSON")
}

/// Loads settings from a JSON file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the JSON is malformed.
pub fn from_json_file(path: impl AsRef<Path>) -> Result<FormationSettings, FormationError> {
    let content = read_file(path.as_ref(), "JSON")?;
    from_json_str(&content)
}

/// Loads settings from just environment variables (starting from defaults).
pub fn from_env() -> FormationSettings {
    let mut settings = FormationSettings::default();
    apply_env_overrides(&mut settings);
    settings
}

/// Applies environment variable overrides to a settings struct.
///
/// `FORMATION_DEBUG` accepts "true"/"1"/"yes"; anything else turns debug off.
pub fn apply_env_overrides(settings: &mut FormationSettings) {
    if let Ok(val) = std::env::var("FORMATION_LOG_LEVEL") {
        settings.log_level = val;
    }

    if let Ok(val) = std::env::var("FORMATION_DEBUG") {
        settings.debug = matches!(val.to_lowercase().as_str(), "true" | "1" | "yes");
    }

    if let Ok(val) = std::env::var("FORMATION_LABEL_CLASS") {
        settings.label_class = val;
    }

    if let Ok(val) = std::env::var("FORMATION_FIELD_CLASS") {
        settings.field_class = val;
    }

    if let Ok(val) = std::env::var("FORMATION_DATE_FORMAT") {
        settings.date_display_format = val;
    }
}

// ============================================================
// Helpers
// ============================================================

fn read_file(path: &Path, kind: &str) -> Result<String, FormationError> {
    std::fs::read_to_string(path).map_err(|e| {
        FormationError::Configuration(format!(
            "Failed to read {kind} file '{}': {e}",
            path.display()
        ))
    })
}

/// Merges a parsed document over the default settings and deserializes it.
fn from_json_value(
    value: serde_json::Value,
    kind: &str,
) -> Result<FormationSettings, FormationError> {
    let default_json = serde_json::to_value(FormationSettings::default()).map_err(|e| {
        FormationError::Configuration(format!("Failed to serialize default settings: {e}"))
    })?;

    let merged = merge_json(default_json, value);
    serde_json::from_value(merged).map_err(|e| {
        FormationError::Configuration(format!("Failed to deserialize settings from {kind}: {e}"))
    })
}

/// Converts a TOML value to a `serde_json::Value`.
pub fn toml_to_json(value: toml::Value) -> serde_json::Value {
    match value {
        toml::Value::String(s) => serde_json::Value::String(s),
        toml::Value::Integer(i) => serde_json::json!(i),
        toml::Value::Float(f) => serde_json::json!(f),
        toml::Value::Boolean(b) => serde_json::Value::Bool(b),
        toml::Value::Datetime(dt) => serde_json::Value::String(dt.to_string()),
        toml::Value::Array(arr) => {
            serde_json::Value::Array(arr.into_iter().map(toml_to_json).collect())
        }
        toml::Value::Table(table) => {
            let map: serde_json::Map<String, serde_json::Value> = table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect();
            serde_json::Value::Object(map)
        }
    }
}

/// Deep-merges two JSON values. The `override_val` takes precedence.
fn merge_json(base: serde_json::Value, override_val: serde_json::Value) -> serde_json::Value {
    match (base, override_val) {
        (serde_json::Value::Object(mut base_map), serde_json::Value::Object(override_map)) => {
            for (key, override_v) in override_map {
                let merged = if let Some(base_v) = base_map.remove(&key) {
                    merge_json(base_v, override_v)
                } else {
                    override_v
                };
                base_map.insert(key, merged);
            }
            serde_json::Value::Object(base_map)
        }
        (_, override_val) => override_val,
    }
}
