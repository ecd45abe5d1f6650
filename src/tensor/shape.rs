//! Shape utilities for port annotations
//!
//! Functions for working with tensor shapes and dimensions.

use crate::error::{GraphResult, TransformError};

/// Static shape of a tensor flowing through a port
pub type Shape = Vec<i64>;

/// Calculate total number of elements from shape
pub fn numel(shape: &[i64]) -> usize {
    if shape.is_empty() {
        1 // scalar
    } else {
        shape.iter().map(|&d| d.max(0) as usize).product()
    }
}

/// Check if shape contains dynamic dimensions (negative values)
pub fn is_dynamic(shape: &[i64]) -> bool {
    shape.iter().any(|&d| d < 0)
}

/// Normalize axis to positive index
pub fn normalize_axis(axis: i64, ndim: usize) -> GraphResult<usize> {
    let ndim_i64 = ndim as i64;
    let normalized = if axis < 0 { axis + ndim_i64 } else { axis };

    if normalized < 0 || normalized >= ndim_i64 {
        return Err(TransformError::ShapeInferenceFailed(format!(
            "Axis {} out of bounds for ndim {}",
            axis, ndim
        )));
    }

    Ok(normalized as usize)
}

/// Output extent of one pooled spatial dimension
///
/// `pad` is the sum of the begin and end padding. Dynamic inputs stay dynamic.
pub fn pooled_dim(input: i64, kernel: i64, stride: i64, pad: i64, ceil: bool) -> GraphResult<i64> {
    if input < 0 {
        return Ok(-1);
    }
    if kernel <= 0 || stride <= 0 {
        return Err(TransformError::ShapeInferenceFailed(format!(
            "Non-positive pooling window {} or stride {}",
            kernel, stride
        )));
    }
    let span = input + pad - kernel;
    if span < 0 {
        return Err(TransformError::ShapeInferenceFailed(format!(
            "Pooling window {} larger than padded input {}",
            kernel,
            input + pad
        )));
    }
    let steps = if ceil {
        (span + stride - 1) / stride
    } else {
        span / stride
    };
    Ok(steps + 1)
}

/// Render a shape as `[d0, d1, ...]` with `?` for dynamic dims
pub fn format_shape(shape: &[i64]) -> String {
    let dims: Vec<String> = shape
        .iter()
        .map(|&d| if d < 0 { "?".to_string() } else { d.to_string() })
        .collect();
    format!("[{}]", dims.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numel() {
        assert_eq!(numel(&[2, 3, 4]), 24);
        assert_eq!(numel(&[1, 1, 1]), 1);
        assert_eq!(numel(&[]), 1); // scalar
    }

    #[test]
    fn test_is_dynamic() {
        assert!(!is_dynamic(&[1, 3, 224, 224]));
        assert!(is_dynamic(&[-1, 3, 224, 224]));
    }

    #[test]
    fn test_normalize_axis() {
        assert_eq!(normalize_axis(0, 4).unwrap(), 0);
        assert_eq!(normalize_axis(-1, 4).unwrap(), 3);
        assert!(normalize_axis(4, 4).is_err());
        assert!(normalize_axis(-5, 4).is_err());
    }

    #[test]
    fn test_pooled_dim() {
        assert_eq!(pooled_dim(224, 2, 2, 0, false).unwrap(), 112);
        assert_eq!(pooled_dim(7, 2, 2, 0, false).unwrap(), 3);
        assert_eq!(pooled_dim(7, 2, 2, 0, true).unwrap(), 4);
        assert_eq!(pooled_dim(-1, 3, 1, 2, false).unwrap(), -1);
        assert!(pooled_dim(2, 5, 1, 0, false).is_err());
    }

    #[test]
    fn test_format_shape() {
        assert_eq!(format_shape(&[1, -1, 3]), "[1, ?, 3]");
    }
}
