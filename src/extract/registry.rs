//! Extractor registry
//!
//! Maps `(source format, operator type)` to the function that turns a raw
//! record into canonical [`NodeAttrs`]. Lookup is exact; a missing or
//! disabled entry is `UnsupportedOperator`.

use std::fmt;

use indexmap::IndexMap;
use log::debug;

use crate::error::{GraphResult, TransformError};

use super::common::{NodeAttrs, RawAttrs};

/// Source framework an operator record comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceFormat {
    Onnx,
    MxNet,
}

impl SourceFormat {
    pub fn name(self) -> &'static str {
        match self {
            SourceFormat::Onnx => "onnx",
            SourceFormat::MxNet => "mxnet",
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Extraction function: raw record in, canonical attributes out
pub type ExtractFn = fn(&RawAttrs) -> GraphResult<NodeAttrs>;

/// One registered extractor
#[derive(Debug, Clone)]
pub struct ExtractorEntry {
    /// Source format
    pub format: SourceFormat,
    /// Operator type name in that format
    pub op: String,
    /// Extraction function
    pub extract: ExtractFn,
    /// Disabled entries behave as if unregistered
    pub enabled: bool,
}

/// Registration table of extractors
#[derive(Debug, Clone, Default)]
pub struct ExtractorRegistry {
    entries: IndexMap<(SourceFormat, String), ExtractorEntry>,
}

impl ExtractorRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with all built-in ONNX and MXNet extractors
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        super::onnx::register(&mut registry);
        super::mxnet::register(&mut registry);
        registry
    }

    /// Register an enabled extractor, replacing any previous entry
    pub fn register(&mut self, format: SourceFormat, op: &str, extract: ExtractFn) -> &mut Self {
        self.register_with(format, op, extract, true)
    }

    /// Register an extractor with an explicit `enabled` flag
    pub fn register_with(
        &mut self,
        format: SourceFormat,
        op: &str,
        extract: ExtractFn,
        enabled: bool,
    ) -> &mut Self {
        let key = (format, op.to_string());
        if self.entries.contains_key(&key) {
            debug!("Overriding {} extractor for '{}'", format, op);
        }
        self.entries.insert(
            key,
            ExtractorEntry {
                format,
                op: op.to_string(),
                extract,
                enabled,
            },
        );
        self
    }

    /// Enable or disable an entry; returns false if it does not exist
    pub fn set_enabled(&mut self, format: SourceFormat, op: &str, enabled: bool) -> bool {
        match self.entries.get_mut(&(format, op.to_string())) {
            Some(entry) => {
                entry.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Whether an enabled extractor exists for the pair
    pub fn is_supported(&self, format: SourceFormat, op: &str) -> bool {
        self.lookup(format, op).is_some()
    }

    fn lookup(&self, format: SourceFormat, op: &str) -> Option<&ExtractorEntry> {
        self.entries
            .get(&(format, op.to_string()))
            .filter(|e| e.enabled)
    }

    /// Extract canonical attributes for one operator record
    pub fn extract(&self, format: SourceFormat, op: &str, raw: &RawAttrs) -> GraphResult<NodeAttrs> {
        let entry = self
            .lookup(format, op)
            .ok_or_else(|| TransformError::UnsupportedOperator {
                format: format.to_string(),
                op: op.to_string(),
            })?;
        let attrs = (entry.extract)(raw)?;
        debug!(
            "Extracted {} '{}' as {} with {} attribute(s)",
            format,
            op,
            attrs.op_type,
            attrs.attrs.len()
        );
        Ok(attrs)
    }

    /// Number of entries (enabled or not)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in registration order
    pub fn entries(&self) -> impl Iterator<Item = &ExtractorEntry> {
        self.entries.values()
    }
}
