//! Built-in inference functions

use crate::error::{GraphResult, TransformError};
use crate::graph::{Annotation, Node};
use crate::tensor::{normalize_axis, pooled_dim, Shape};

/// Types whose single output mirrors input 0
pub const ELEMENTWISE: &[&str] = &[
    "Relu", "Identity", "FakeOutput", "Sigmoid", "Tanh", "SoftPlus", "SoftSign",
];

pub(crate) fn failed(node: &Node, msg: impl std::fmt::Display) -> TransformError {
    TransformError::ShapeInferenceFailed(format!("{} ({}): {}", node.name(), node.op_type, msg))
}

/// Shape of input `index`, failing if it is unknown
pub(crate) fn input_shape<'a>(node: &Node, inputs: &'a [Annotation], index: usize) -> GraphResult<&'a [i64]> {
    inputs
        .get(index)
        .and_then(|a| a.shape.as_deref())
        .ok_or_else(|| failed(node, format_args!("input {} has no shape", index)))
}

/// Constant value of input `index`, failing if it is unknown
pub(crate) fn input_value<'a>(node: &Node, inputs: &'a [Annotation], index: usize) -> GraphResult<&'a [i64]> {
    inputs
        .get(index)
        .and_then(|a| a.value.as_deref())
        .ok_or_else(|| failed(node, format_args!("input {} has no constant value", index)))
}

fn required_ints<'a>(node: &'a Node, name: &str) -> GraphResult<&'a [i64]> {
    node.attrs
        .get_ints(name)
        .ok_or_else(|| failed(node, format_args!("attribute '{}' missing or not an int list", name)))
}

/// Same annotation repeated for every output port
fn replicate(node: &Node, annotation: Annotation) -> Vec<Annotation> {
    vec![annotation; node.outputs().len()]
}

// ============================================================================
// Sources and sinks
// ============================================================================

/// `Parameter`: shape comes from the `shape` attribute
pub fn infer_parameter(node: &Node, _inputs: &[Annotation]) -> GraphResult<Vec<Annotation>> {
    let shape = required_ints(node, "shape")?.to_vec();
    Ok(replicate(node, Annotation::shape(shape)))
}

/// `Const`: value from `value`, shape from `shape` when given
pub fn infer_const(node: &Node, _inputs: &[Annotation]) -> GraphResult<Vec<Annotation>> {
    let value = required_ints(node, "value")?.to_vec();
    let mut annotation = Annotation::value(value);
    if let Some(shape) = node.attrs.get_ints("shape") {
        annotation.shape = Some(shape.to_vec());
    }
    Ok(replicate(node, annotation))
}

/// `ShapeOf`: the input shape becomes a constant value
pub fn infer_shape_of(node: &Node, inputs: &[Annotation]) -> GraphResult<Vec<Annotation>> {
    let shape = input_shape(node, inputs, 0)?;
    Ok(replicate(node, Annotation::value(shape.to_vec())))
}

pub fn infer_result(_node: &Node, _inputs: &[Annotation]) -> GraphResult<Vec<Annotation>> {
    Ok(Vec::new())
}

/// Output 0 mirrors input 0 (shape and value)
pub fn infer_elementwise(node: &Node, inputs: &[Annotation]) -> GraphResult<Vec<Annotation>> {
    let input = inputs
        .first()
        .filter(|a| a.is_resolved())
        .ok_or_else(|| failed(node, "input 0 is unresolved"))?;
    Ok(replicate(node, input.clone()))
}

// ============================================================================
// Gather
// ============================================================================

/// `AttributedGather`: axis from the `axis` attribute
pub fn infer_attributed_gather(node: &Node, inputs: &[Annotation]) -> GraphResult<Vec<Annotation>> {
    let axis = node
        .attrs
        .get_int("axis")
        .ok_or_else(|| failed(node, "attribute 'axis' missing"))?;
    gather(node, inputs, axis)
}

/// `Gather`: axis from the constant on input 2
pub fn infer_gather(node: &Node, inputs: &[Annotation]) -> GraphResult<Vec<Annotation>> {
    let axis = match input_value(node, inputs, 2)? {
        [axis] => *axis,
        other => return Err(failed(node, format_args!("axis input must hold one value, got {}", other.len()))),
    };
    gather(node, inputs, axis)
}

fn gather(node: &Node, inputs: &[Annotation], axis: i64) -> GraphResult<Vec<Annotation>> {
    let data = input_shape(node, inputs, 0)?;
    let indices = input_shape(node, inputs, 1)?;
    let axis = normalize_axis(axis, data.len())?;

    let mut shape: Shape = Vec::with_capacity(data.len() + indices.len());
    shape.extend_from_slice(&data[..axis]);
    shape.extend_from_slice(indices);
    shape.extend_from_slice(&data[axis + 1..]);

    // Constant folding of 1-D values, e.g. picking dims out of a ShapeOf
    let value = match (inputs[0].value.as_deref(), inputs[1].value.as_deref()) {
        (Some(data_value), Some(index_value)) if data.len() == 1 => {
            let len = data_value.len() as i64;
            index_value
                .iter()
                .map(|&i| {
                    let i = if i < 0 { i + len } else { i };
                    usize::try_from(i)
                        .ok()
                        .and_then(|i| data_value.get(i).copied())
                        .ok_or_else(|| failed(node, format_args!("index {} out of range", i)))
                })
                .collect::<GraphResult<Vec<i64>>>()
                .map(Some)?
        }
        _ => None,
    };

    Ok(replicate(
        node,
        Annotation {
            shape: Some(shape),
            value,
        },
    ))
}

// ============================================================================
// Pooling
// ============================================================================

/// `Pooling`, `MaxPool`, `AvgPool`
///
/// Input layout is `[N, C, spatial...]`. Extra output ports (the indices of
/// max pooling) mirror output 0.
pub fn infer_pooling(node: &Node, inputs: &[Annotation]) -> GraphResult<Vec<Annotation>> {
    let input = input_shape(node, inputs, 0)?;
    let window = required_ints(node, "window")?;
    let rank = window.len();
    if input.len() != rank + 2 {
        return Err(failed(
            node,
            format_args!("{}-d window on {}-d input", rank, input.len()),
        ));
    }

    let mut shape: Shape = input[..2].to_vec();
    if node.attrs.has_and_set("global_pool") {
        shape.extend(std::iter::repeat(1).take(rank));
        return Ok(replicate(node, Annotation::shape(shape)));
    }

    let ones = vec![1; rank];
    let zeros = vec![0; rank * 2];
    let stride = node.attrs.get_ints("stride").unwrap_or(&ones[..]);
    let pad = node.attrs.get_ints("pad").unwrap_or(&zeros[..]);
    if stride.len() != rank || pad.len() != rank * 2 {
        return Err(failed(node, "stride/pad length does not match window"));
    }
    if let Some(axis) = (0..rank).find(|&a| stride[a] <= 0 || window[a] <= 0) {
        return Err(failed(
            node,
            format_args!(
                "non-positive window {} or stride {} on axis {}",
                window[axis], stride[axis], axis
            ),
        ));
    }
    let ceil = node.attrs.get_str("rounding_type") == Some("ceil");
    let same = matches!(node.attrs.get_str("auto_pad"), Some("same_upper" | "same_lower"));

    for axis in 0..rank {
        let extent = input[axis + 2];
        let dim = if same {
            if extent < 0 {
                -1
            } else {
                (extent + stride[axis] - 1) / stride[axis]
            }
        } else {
            pooled_dim(extent, window[axis], stride[axis], pad[axis] + pad[axis + rank], ceil)?
        };
        shape.push(dim);
    }

    Ok(replicate(node, Annotation::shape(shape)))
}
