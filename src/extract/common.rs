//! Shared extraction helpers
//!
//! Source records are opaque string-keyed bags. These helpers read them with
//! explicit defaults for optional fields and `MissingAttribute` for required
//! ones. Frameworks that serialize everything as strings (MXNet writes
//! `"(2, 2)"`, `"True"`) are accepted transparently.

use indexmap::IndexMap;

use crate::error::{GraphResult, TransformError};
use crate::graph::{AttrValue, Attributes};

/// Raw attribute record of one source operator
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawAttrs {
    values: IndexMap<String, AttrValue>,
}

impl RawAttrs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, name: &str, value: impl Into<AttrValue>) -> Self {
        self.values.insert(name.to_string(), value.into());
        self
    }

    pub fn insert(&mut self, name: &str, value: impl Into<AttrValue>) {
        self.values.insert(name.to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<AttrValue>> FromIterator<(K, V)> for RawAttrs {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Canonical attributes produced by an extractor
#[derive(Debug, Clone, PartialEq)]
pub struct NodeAttrs {
    /// Canonical type tag
    pub op_type: String,
    /// Canonical attributes
    pub attrs: Attributes,
    /// Minimum number of input ports
    pub inputs: usize,
    /// Minimum number of output ports
    pub outputs: usize,
}

impl NodeAttrs {
    /// Canonical node of `op_type` with one input and one output
    pub fn new(op_type: &str) -> Self {
        Self {
            op_type: op_type.to_string(),
            attrs: Attributes::new(),
            inputs: 1,
            outputs: 1,
        }
    }

    pub fn attr(mut self, name: &str, value: impl Into<AttrValue>) -> Self {
        self.attrs.set(name, value);
        self
    }

    pub fn ports(mut self, inputs: usize, outputs: usize) -> Self {
        self.inputs = inputs;
        self.outputs = outputs;
        self
    }
}

fn invalid(name: &str, expected: &'static str, found: &AttrValue) -> TransformError {
    TransformError::InvalidAttribute {
        name: name.to_string(),
        expected,
        found: found.kind().name(),
    }
}

fn parse_int_list(name: &str, text: &str, value: &AttrValue) -> GraphResult<Vec<i64>> {
    let inner = text.trim().trim_start_matches(['(', '[']).trim_end_matches([')', ']']);
    inner
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<i64>().map_err(|_| invalid(name, "int list", value)))
        .collect()
}

fn parse_float_list(name: &str, text: &str, value: &AttrValue) -> GraphResult<Vec<f64>> {
    let inner = text.trim().trim_start_matches(['(', '[']).trim_end_matches([')', ']']);
    inner
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<f64>().map_err(|_| invalid(name, "float list", value)))
        .collect()
}

// ============================================================================
// Optional reads (with defaults)
// ============================================================================

/// Integer attribute, `default` when absent
pub fn attr_int(raw: &RawAttrs, name: &str, default: i64) -> GraphResult<i64> {
    match raw.get(name) {
        None => Ok(default),
        Some(value) => read_int(name, value),
    }
}

/// Float attribute, `default` when absent
pub fn attr_float(raw: &RawAttrs, name: &str, default: f64) -> GraphResult<f64> {
    match raw.get(name) {
        None => Ok(default),
        Some(value @ AttrValue::Str(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| invalid(name, "float", value)),
        Some(value) => value.as_float().ok_or_else(|| invalid(name, "float", value)),
    }
}

/// String attribute, `default` when absent
pub fn attr_str(raw: &RawAttrs, name: &str, default: &str) -> GraphResult<String> {
    match raw.get(name) {
        None => Ok(default.to_string()),
        Some(value) => read_str(name, value),
    }
}

/// Boolean attribute, `default` when absent
///
/// Accepts `Bool`, `Int` (0/1) and the strings `true`/`false`/`1`/`0`.
pub fn attr_bool(raw: &RawAttrs, name: &str, default: bool) -> GraphResult<bool> {
    match raw.get(name) {
        None => Ok(default),
        Some(AttrValue::Bool(b)) => Ok(*b),
        Some(AttrValue::Int(i)) => Ok(*i != 0),
        Some(value @ AttrValue::Str(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(invalid(name, "bool", value)),
        },
        Some(value) => Err(invalid(name, "bool", value)),
    }
}

/// Integer list attribute, `default` when absent
pub fn attr_ints(raw: &RawAttrs, name: &str, default: &[i64]) -> GraphResult<Vec<i64>> {
    match raw.get(name) {
        None => Ok(default.to_vec()),
        Some(value) => read_ints(name, value),
    }
}

/// Float list attribute, `default` when absent
pub fn attr_floats(raw: &RawAttrs, name: &str, default: &[f64]) -> GraphResult<Vec<f64>> {
    match raw.get(name) {
        None => Ok(default.to_vec()),
        Some(AttrValue::Floats(v)) => Ok(v.clone()),
        Some(AttrValue::Ints(v)) => Ok(v.iter().map(|&i| i as f64).collect()),
        Some(AttrValue::Float(f)) => Ok(vec![*f]),
        Some(value @ AttrValue::Str(s)) => parse_float_list(name, s, value),
        Some(value) => Err(invalid(name, "float list", value)),
    }
}

// ============================================================================
// Required reads
// ============================================================================

/// Integer attribute that must be present
pub fn required_int(raw: &RawAttrs, name: &str) -> GraphResult<i64> {
    let value = raw
        .get(name)
        .ok_or_else(|| TransformError::MissingAttribute(name.to_string()))?;
    read_int(name, value)
}

/// String attribute that must be present
pub fn required_str(raw: &RawAttrs, name: &str) -> GraphResult<String> {
    let value = raw
        .get(name)
        .ok_or_else(|| TransformError::MissingAttribute(name.to_string()))?;
    read_str(name, value)
}

/// Integer list attribute that must be present
pub fn required_ints(raw: &RawAttrs, name: &str) -> GraphResult<Vec<i64>> {
    let value = raw
        .get(name)
        .ok_or_else(|| TransformError::MissingAttribute(name.to_string()))?;
    read_ints(name, value)
}

fn read_int(name: &str, value: &AttrValue) -> GraphResult<i64> {
    match value {
        AttrValue::Int(i) => Ok(*i),
        AttrValue::Bool(b) => Ok(i64::from(*b)),
        AttrValue::Str(s) => s.trim().parse::<i64>().map_err(|_| invalid(name, "int", value)),
        _ => Err(invalid(name, "int", value)),
    }
}

fn read_str(name: &str, value: &AttrValue) -> GraphResult<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| invalid(name, "string", value))
}

fn read_ints(name: &str, value: &AttrValue) -> GraphResult<Vec<i64>> {
    match value {
        AttrValue::Ints(v) => Ok(v.clone()),
        AttrValue::Int(i) => Ok(vec![*i]),
        AttrValue::Str(s) => parse_int_list(name, s, value),
        _ => Err(invalid(name, "int list", value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_defaults() {
        let raw = RawAttrs::new();
        assert_eq!(attr_int(&raw, "axis", 0).unwrap(), 0);
        assert_eq!(attr_str(&raw, "mode", "floor").unwrap(), "floor");
        assert!(!attr_bool(&raw, "clip", false).unwrap());
        assert_eq!(attr_ints(&raw, "pads", &[0, 0]).unwrap(), vec![0, 0]);
    }

    #[test]
    fn test_required_missing() {
        let raw = RawAttrs::new();
        assert_eq!(
            required_ints(&raw, "kernel_shape"),
            Err(TransformError::MissingAttribute("kernel_shape".to_string()))
        );
    }

    #[test]
    fn test_wrong_kind() {
        let raw = RawAttrs::new().with("axis", vec![1i64, 2]);
        assert!(matches!(
            attr_int(&raw, "axis", 0),
            Err(TransformError::InvalidAttribute { expected: "int", .. })
        ));
    }

    #[test]
    fn test_string_encoded_values() {
        let raw = RawAttrs::new()
            .with("kernel", "(3, 3)")
            .with("global_pool", "True")
            .with("sizes", "(0.2,0.272)")
            .with("axis", "1");

        assert_eq!(required_ints(&raw, "kernel").unwrap(), vec![3, 3]);
        assert!(attr_bool(&raw, "global_pool", false).unwrap());
        assert_eq!(attr_floats(&raw, "sizes", &[]).unwrap(), vec![0.2, 0.272]);
        assert_eq!(attr_int(&raw, "axis", 0).unwrap(), 1);
    }
}
