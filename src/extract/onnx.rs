//! ONNX operator extractors

use crate::error::{GraphResult, TransformError};

use super::common::{attr_int, attr_ints, attr_str, required_ints, NodeAttrs, RawAttrs};
use super::registry::{ExtractorRegistry, SourceFormat};

/// Register every built-in ONNX extractor
pub fn register(registry: &mut ExtractorRegistry) {
    registry
        .register(SourceFormat::Onnx, "Gather", extract_gather)
        .register(SourceFormat::Onnx, "MaxPool", extract_max_pool)
        .register(SourceFormat::Onnx, "AveragePool", extract_average_pool)
        .register(SourceFormat::Onnx, "Relu", extract_relu)
        .register(SourceFormat::Onnx, "Identity", extract_identity)
        .register(SourceFormat::Onnx, "Shape", extract_shape);
}

/// `Gather` → `AttributedGather`; `axis` defaults to 0
pub fn extract_gather(raw: &RawAttrs) -> GraphResult<NodeAttrs> {
    let axis = attr_int(raw, "axis", 0)?;
    Ok(NodeAttrs::new("AttributedGather")
        .attr("axis", axis)
        .ports(2, 1))
}

pub fn extract_max_pool(raw: &RawAttrs) -> GraphResult<NodeAttrs> {
    // Values and indices
    Ok(pooling(raw, "max")?.ports(1, 2))
}

pub fn extract_average_pool(raw: &RawAttrs) -> GraphResult<NodeAttrs> {
    let count_include_pad = attr_int(raw, "count_include_pad", 0)?;
    Ok(pooling(raw, "avg")?.attr("exclude_pad", count_include_pad == 0))
}

pub fn extract_relu(_raw: &RawAttrs) -> GraphResult<NodeAttrs> {
    Ok(NodeAttrs::new("Relu"))
}

pub fn extract_identity(_raw: &RawAttrs) -> GraphResult<NodeAttrs> {
    Ok(NodeAttrs::new("Identity"))
}

pub fn extract_shape(_raw: &RawAttrs) -> GraphResult<NodeAttrs> {
    Ok(NodeAttrs::new("ShapeOf"))
}

/// Common `Pooling` attributes of `MaxPool` and `AveragePool`
///
/// ONNX pads are `[x1_begin, x2_begin, ..., x1_end, x2_end, ...]`; the
/// canonical `pad` attribute keeps that layout.
fn pooling(raw: &RawAttrs, method: &str) -> GraphResult<NodeAttrs> {
    let window = required_ints(raw, "kernel_shape")?;
    let rank = window.len();
    let stride = attr_ints(raw, "strides", &vec![1; rank])?;
    let pad = attr_ints(raw, "pads", &vec![0; rank * 2])?;
    let ceil_mode = attr_int(raw, "ceil_mode", 0)?;
    let auto_pad = attr_str(raw, "auto_pad", "NOTSET")?;

    if stride.len() != rank || pad.len() != rank * 2 {
        return Err(TransformError::InvalidAttribute {
            name: if stride.len() != rank { "strides" } else { "pads" }.to_string(),
            expected: "one entry per spatial axis",
            found: "mismatched length",
        });
    }

    let mut attrs = NodeAttrs::new("Pooling")
        .attr("pool_method", method)
        .attr("window", window)
        .attr("stride", stride)
        .attr("pad", pad)
        .attr("rounding_type", if ceil_mode != 0 { "ceil" } else { "floor" })
        .attr("exclude_pad", false);
    if auto_pad != "NOTSET" {
        attrs = attrs.attr("auto_pad", auto_pad.to_ascii_lowercase());
    }
    Ok(attrs)
}
