//! Typed node attributes
//!
//! Attributes are a string-keyed bag of tagged values. Lookup returns
//! `Option`, so an absent attribute is an ordinary state rather than an
//! error. Deletion goes through [`Attributes::remove`], which records the
//! name so that "removed by a pass" stays distinguishable from "never set".

use indexmap::IndexMap;
use smallvec::SmallVec;

/// A single attribute value
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    /// Integer scalar
    Int(i64),
    /// Float scalar
    Float(f64),
    /// String scalar
    Str(String),
    /// Boolean flag
    Bool(bool),
    /// Integer list
    Ints(Vec<i64>),
    /// Float list
    Floats(Vec<f64>),
    /// String list
    Strs(Vec<String>),
}

/// Discriminant of [`AttrValue`], used by type predicates and error messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttrKind {
    Int,
    Float,
    Str,
    Bool,
    Ints,
    Floats,
    Strs,
}

impl AttrKind {
    /// Human readable kind name
    pub fn name(self) -> &'static str {
        match self {
            AttrKind::Int => "int",
            AttrKind::Float => "float",
            AttrKind::Str => "string",
            AttrKind::Bool => "bool",
            AttrKind::Ints => "int list",
            AttrKind::Floats => "float list",
            AttrKind::Strs => "string list",
        }
    }
}

impl AttrValue {
    pub fn kind(&self) -> AttrKind {
        match self {
            AttrValue::Int(_) => AttrKind::Int,
            AttrValue::Float(_) => AttrKind::Float,
            AttrValue::Str(_) => AttrKind::Str,
            AttrValue::Bool(_) => AttrKind::Bool,
            AttrValue::Ints(_) => AttrKind::Ints,
            AttrValue::Floats(_) => AttrKind::Floats,
            AttrValue::Strs(_) => AttrKind::Strs,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            AttrValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Float view; integers widen
    pub fn as_float(&self) -> Option<f64> {
        match self {
            AttrValue::Float(v) => Some(*v),
            AttrValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_ints(&self) -> Option<&[i64]> {
        match self {
            AttrValue::Ints(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_floats(&self) -> Option<&[f64]> {
        match self {
            AttrValue::Floats(v) => Some(v),
            _ => None,
        }
    }

    /// Number of elements for list values, `None` for scalars
    pub fn list_len(&self) -> Option<usize> {
        match self {
            AttrValue::Ints(v) => Some(v.len()),
            AttrValue::Floats(v) => Some(v.len()),
            AttrValue::Strs(v) => Some(v.len()),
            _ => None,
        }
    }

    /// Truthiness used by flag checks: `Bool(true)` or a non-zero `Int`
    pub fn is_truthy(&self) -> bool {
        match self {
            AttrValue::Bool(v) => *v,
            AttrValue::Int(v) => *v != 0,
            _ => false,
        }
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        AttrValue::Int(v)
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::Float(v)
    }
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        AttrValue::Bool(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        AttrValue::Str(v.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        AttrValue::Str(v)
    }
}

impl From<Vec<i64>> for AttrValue {
    fn from(v: Vec<i64>) -> Self {
        AttrValue::Ints(v)
    }
}

impl From<Vec<f64>> for AttrValue {
    fn from(v: Vec<f64>) -> Self {
        AttrValue::Floats(v)
    }
}

impl From<Vec<String>> for AttrValue {
    fn from(v: Vec<String>) -> Self {
        AttrValue::Strs(v)
    }
}

/// Ordered attribute container of a node
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes {
    values: IndexMap<String, AttrValue>,
    removed: SmallVec<[String; 2]>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, name: &str, value: impl Into<AttrValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Set or replace an attribute
    pub fn set(&mut self, name: &str, value: impl Into<AttrValue>) {
        self.removed.retain(|n| n != name);
        self.values.insert(name.to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Remove an attribute
    ///
    /// Returns the removed value, or `None` when the attribute was never
    /// present. Only actual removals are recorded.
    pub fn remove(&mut self, name: &str) -> Option<AttrValue> {
        let value = self.values.shift_remove(name)?;
        self.removed.push(name.to_string());
        Some(value)
    }

    /// Whether `name` was explicitly removed and not set again since
    pub fn was_removed(&self, name: &str) -> bool {
        self.removed.iter().any(|n| n == name)
    }

    /// Names removed so far, in removal order
    pub fn removed(&self) -> &[String] {
        &self.removed
    }

    /// True if the attribute exists and is truthy (see [`AttrValue::is_truthy`])
    pub fn has_and_set(&self, name: &str) -> bool {
        self.get(name).map(AttrValue::is_truthy).unwrap_or(false)
    }

    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(AttrValue::as_int)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(AttrValue::as_str)
    }

    pub fn get_ints(&self, name: &str) -> Option<&[i64]> {
        self.get(name).and_then(AttrValue::as_ints)
    }

    pub fn get_floats(&self, name: &str) -> Option<&[f64]> {
        self.get(name).and_then(AttrValue::as_floats)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &AttrValue)> {
        self.values.iter()
    }
}

impl<K: Into<String>, V: Into<AttrValue>> FromIterator<(K, V)> for Attributes {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            removed: SmallVec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_is_none() {
        let attrs = Attributes::new().with("axis", 1i64);
        assert_eq!(attrs.get_int("axis"), Some(1));
        assert!(attrs.get("missing").is_none());
        assert!(!attrs.was_removed("missing"));
    }

    #[test]
    fn test_remove_is_auditable() {
        let mut attrs = Attributes::new().with("pool_method", "max");

        assert_eq!(attrs.remove("pool_method"), Some(AttrValue::from("max")));
        assert!(!attrs.contains("pool_method"));
        assert!(attrs.was_removed("pool_method"));

        // Removing something that never existed is not recorded
        assert_eq!(attrs.remove("exclude_pad"), None);
        assert!(!attrs.was_removed("exclude_pad"));
        assert_eq!(attrs.removed(), &["pool_method".to_string()]);
    }

    #[test]
    fn test_set_after_remove_clears_record() {
        let mut attrs = Attributes::new().with("axis", 0i64);
        attrs.remove("axis");
        attrs.set("axis", 2i64);
        assert!(!attrs.was_removed("axis"));
        assert_eq!(attrs.get_int("axis"), Some(2));
    }

    #[test]
    fn test_has_and_set() {
        let attrs = Attributes::new()
            .with("on", true)
            .with("off", false)
            .with("one", 1i64)
            .with("name", "x");
        assert!(attrs.has_and_set("on"));
        assert!(!attrs.has_and_set("off"));
        assert!(attrs.has_and_set("one"));
        assert!(!attrs.has_and_set("name"));
        assert!(!attrs.has_and_set("absent"));
    }

    #[test]
    fn test_kind_and_list_len() {
        let v = AttrValue::Floats(vec![1.0, 2.0]);
        assert_eq!(v.kind(), AttrKind::Floats);
        assert_eq!(v.list_len(), Some(2));
        assert_eq!(AttrValue::Int(3).list_len(), None);
        assert_eq!(AttrValue::Int(3).as_float(), Some(3.0));
    }
}
