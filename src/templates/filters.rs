//! Helper filters available to every template.

use std::collections::HashMap;

use tera::{Result, Value};

/// Returned by `yamlfy` when YAML output is unavailable.
pub const YAML_UNAVAILABLE: &str = "(yaml support not compiled in)";

/// Message of the render error raised by `required`.
pub const MISSING_REQUIRED_VALUE: &str = "Missing required value";

/// Dump any value as YAML, for inspecting the context from inside a template.
pub(crate) fn yamlfy(value: &Value, _args: &HashMap<String, Value>) -> Result<Value> {
    Ok(Value::String(to_yaml(value)))
}

#[cfg(feature = "yaml")]
fn to_yaml(value: &Value) -> String {
    serde_yaml::to_string(value).unwrap_or_else(|e| format!("(yaml serialization failed: {e})"))
}

#[cfg(not(feature = "yaml"))]
fn to_yaml(_value: &Value) -> String {
    YAML_UNAVAILABLE.to_string()
}

/// Pass the value through, or fail the render if it is absent.
///
/// Optional attributes are serialized as `null`, so `null` is the absent marker.
/// A name that is not in the context at all (`T.no_such_attr`) never reaches
/// this filter: Tera fails the render first with its own "not found" error.
pub(crate) fn required(value: &Value, _args: &HashMap<String, Value>) -> Result<Value> {
    if value.is_null() {
        return Err(tera::Error::msg(MISSING_REQUIRED_VALUE));
    }
    Ok(value.clone())
}

/// `"my.field name"` → `"MY_FIELD_NAME"`
pub(crate) fn macrofy(value: &Value, _args: &HashMap<String, Value>) -> Result<Value> {
    let s = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("macrofy filter expects a string"))?;
    Ok(Value::String(macrofy_str(s)))
}

pub fn macrofy_str(s: &str) -> String {
    s.replace([' ', '.'], "_").to_uppercase()
}
