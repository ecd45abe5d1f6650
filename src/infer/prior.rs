//! Prior-box inference
//!
//! `MultiBoxPrior` has two output layouts. Which one applies is decided by
//! the node's `V10_infer` flag, written at extraction time.

use crate::error::GraphResult;
use crate::graph::{Annotation, Node};

use super::ops::{failed, input_shape, input_value};

/// Output layout of version-gated shape formulas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeFormat {
    /// H and W come from the input's value (a `[H, W]` shape tensor);
    /// output is `[2, N]`
    Legacy,
    /// H and W come from dims 2 and 3 of the input shape;
    /// output is `[1, 2, N]`
    Current,
}

impl ShapeFormat {
    /// Format selected by a node's `V10_infer` flag
    pub fn of(node: &Node) -> Self {
        if node.attrs.has_and_set("V10_infer") {
            ShapeFormat::Legacy
        } else {
            ShapeFormat::Current
        }
    }
}

/// Number of priors generated per spatial location
pub fn num_priors(node: &Node) -> GraphResult<i64> {
    let min_size = node
        .attrs
        .get_floats("min_size")
        .ok_or_else(|| failed(node, "attribute 'min_size' missing"))?;
    let aspect_ratio = node
        .attrs
        .get_floats("aspect_ratio")
        .ok_or_else(|| failed(node, "attribute 'aspect_ratio' missing"))?;
    if min_size.is_empty() || aspect_ratio.is_empty() {
        return Err(failed(node, "min_size and aspect_ratio must be non-empty"));
    }

    let max_size = node.attrs.get_floats("max_size").unwrap_or(&[]);
    if !max_size.is_empty() && max_size.len() != min_size.len() {
        return Err(failed(
            node,
            format_args!(
                "max_size has {} entries, min_size has {}",
                max_size.len(),
                min_size.len()
            ),
        ));
    }

    Ok((min_size.len() + aspect_ratio.len() - 1) as i64)
}

pub fn infer_multi_box_prior(node: &Node, inputs: &[Annotation]) -> GraphResult<Vec<Annotation>> {
    let priors = num_priors(node)?;
    let format = ShapeFormat::of(node);

    let (height, width) = match format {
        ShapeFormat::Legacy => match input_value(node, inputs, 0)? {
            [h, w] => (*h, *w),
            other => {
                return Err(failed(
                    node,
                    format_args!("expected a [H, W] value, got {} element(s)", other.len()),
                ))
            }
        },
        ShapeFormat::Current => match input_shape(node, inputs, 0)? {
            [_, _, h, w] => (*h, *w),
            other => {
                return Err(failed(
                    node,
                    format_args!("expected a 4-d input, got rank {}", other.len()),
                ))
            }
        },
    };

    let size = if height < 0 || width < 0 {
        -1
    } else {
        height
            .checked_mul(width)
            .and_then(|n| n.checked_mul(priors))
            .and_then(|n| n.checked_mul(4))
            .ok_or_else(|| {
                failed(
                    node,
                    format_args!("{}x{} grid with {} priors overflows", height, width, priors),
                )
            })?
    };
    let shape = match format {
        ShapeFormat::Legacy => vec![2, size],
        ShapeFormat::Current => vec![1, 2, size],
    };
    Ok(vec![Annotation::shape(shape); node.outputs().len()])
}
