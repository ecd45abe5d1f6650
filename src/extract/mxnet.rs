//! MXNet operator extractors
//!
//! MXNet symbol files store every attribute as a string; the shared helpers
//! parse `"(2, 2)"`, `"True"` and numeric strings.

use crate::error::{GraphResult, TransformError};

use super::common::{
    attr_bool, attr_floats, attr_ints, attr_str, required_ints, required_str, NodeAttrs, RawAttrs,
};
use super::registry::{ExtractorRegistry, SourceFormat};

/// Register every built-in MXNet extractor
pub fn register(registry: &mut ExtractorRegistry) {
    registry
        .register(SourceFormat::MxNet, "Pooling", extract_pooling)
        .register(SourceFormat::MxNet, "_contrib_MultiBoxPrior", extract_multi_box_prior)
        .register(SourceFormat::MxNet, "Activation", extract_activation);
}

/// `Pooling`: `pool_type` becomes `pool_method`
pub fn extract_pooling(raw: &RawAttrs) -> GraphResult<NodeAttrs> {
    let window = required_ints(raw, "kernel")?;
    let rank = window.len();
    let stride = attr_ints(raw, "stride", &vec![1; rank])?;
    let per_axis_pad = attr_ints(raw, "pad", &vec![0; rank])?;
    let method = attr_str(raw, "pool_type", "max")?;
    let convention = attr_str(raw, "pooling_convention", "valid")?;
    let global = attr_bool(raw, "global_pool", false)?;

    // MXNet pads symmetrically
    let pad: Vec<i64> = per_axis_pad.iter().chain(per_axis_pad.iter()).copied().collect();

    let outputs = if method == "max" { 2 } else { 1 };
    Ok(NodeAttrs::new("Pooling")
        .attr("pool_method", method)
        .attr("window", window)
        .attr("stride", stride)
        .attr("pad", pad)
        .attr("rounding_type", if convention == "full" { "ceil" } else { "floor" })
        .attr("global_pool", global)
        .attr("exclude_pad", false)
        .ports(1, outputs))
}

/// `_contrib_MultiBoxPrior` → `MultiBoxPrior`
///
/// `V10_infer` is taken from the record when present and always written out,
/// so inference sees an explicit flag.
pub fn extract_multi_box_prior(raw: &RawAttrs) -> GraphResult<NodeAttrs> {
    let min_size = attr_floats(raw, "sizes", &[1.0])?;
    let aspect_ratio = attr_floats(raw, "ratios", &[1.0])?;
    let max_size = attr_floats(raw, "max_sizes", &[])?;
    let step = attr_floats(raw, "steps", &[-1.0, -1.0])?;
    let offset = attr_floats(raw, "offsets", &[0.5, 0.5])?;
    let clip = attr_bool(raw, "clip", false)?;
    let v10_infer = attr_bool(raw, "V10_infer", false)?;

    Ok(NodeAttrs::new("MultiBoxPrior")
        .attr("min_size", min_size)
        .attr("aspect_ratio", aspect_ratio)
        .attr("max_size", max_size)
        .attr("step", step.first().copied().unwrap_or(-1.0))
        .attr("offset", offset.first().copied().unwrap_or(0.5))
        .attr("clip", clip)
        .attr("flip", false)
        .attr("V10_infer", v10_infer))
}

/// `Activation`: `act_type` selects the canonical type
pub fn extract_activation(raw: &RawAttrs) -> GraphResult<NodeAttrs> {
    let act_type = required_str(raw, "act_type")?;
    let op_type = match act_type.as_str() {
        "relu" => "Relu",
        "sigmoid" => "Sigmoid",
        "tanh" => "Tanh",
        "softrelu" => "SoftPlus",
        "softsign" => "SoftSign",
        other => {
            return Err(TransformError::UnsupportedOperator {
                format: SourceFormat::MxNet.to_string(),
                op: format!("Activation({})", other),
            })
        }
    };
    Ok(NodeAttrs::new(op_type))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::AttrValue;

    #[test]
    fn test_pooling_from_strings() {
        let raw = RawAttrs::new()
            .with("kernel", "(2, 2)")
            .with("stride", "(2, 2)")
            .with("pad", "(1, 0)")
            .with("pool_type", "avg")
            .with("pooling_convention", "full");
        let attrs = extract_pooling(&raw).unwrap();

        assert_eq!(attrs.attrs.get_str("pool_method"), Some("avg"));
        assert_eq!(attrs.attrs.get_ints("pad"), Some(&[1, 0, 1, 0][..]));
        assert_eq!(attrs.attrs.get_str("rounding_type"), Some("ceil"));
        assert_eq!(attrs.outputs, 1);
    }

    #[test]
    fn test_pooling_defaults_to_max() {
        let attrs = extract_pooling(&RawAttrs::new().with("kernel", "(3,3)")).unwrap();
        assert_eq!(attrs.attrs.get_str("pool_method"), Some("max"));
        assert_eq!(attrs.attrs.get_ints("stride"), Some(&[1, 1][..]));
        assert_eq!(attrs.outputs, 2);
    }

    #[test]
    fn test_pooling_requires_kernel() {
        assert_eq!(
            extract_pooling(&RawAttrs::new()),
            Err(TransformError::MissingAttribute("kernel".to_string()))
        );
    }

    #[test]
    fn test_multi_box_prior() {
        let raw = RawAttrs::new()
            .with("sizes", "(0.2, 0.272, 0.3)")
            .with("ratios", "(1, 2)")
            .with("clip", "False");
        let attrs = extract_multi_box_prior(&raw).unwrap();

        assert_eq!(attrs.op_type, "MultiBoxPrior");
        assert_eq!(attrs.attrs.get_floats("min_size").map(|v| v.len()), Some(3));
        assert_eq!(attrs.attrs.get_floats("aspect_ratio"), Some(&[1.0, 2.0][..]));
        assert_eq!(attrs.attrs.get("V10_infer"), Some(&AttrValue::Bool(false)));
        assert_eq!(attrs.attrs.get("max_size"), Some(&AttrValue::Floats(vec![])));
    }

    #[test]
    fn test_activation() {
        let attrs = extract_activation(&RawAttrs::new().with("act_type", "relu")).unwrap();
        assert_eq!(attrs.op_type, "Relu");

        assert!(matches!(
            extract_activation(&RawAttrs::new().with("act_type", "gelu")),
            Err(TransformError::UnsupportedOperator { .. })
        ));
        assert_eq!(
            extract_activation(&RawAttrs::new()),
            Err(TransformError::MissingAttribute("act_type".to_string()))
        );
    }
}
