//! Multi-label classification loss.

use crate::error::{Error, Result};
use candle_core::Tensor;

/// Multi-label soft-margin loss on raw logits.
///
/// Each class is an independent binary problem:
///
/// ```text
/// l(x, y) = -[y * log σ(x) + (1 - y) * log σ(-x)]
///         = max(x, 0) - x * y + log(1 + exp(-|x|))
/// ```
///
/// The second form never exponentiates a positive number, so it stays finite
/// for large logits. The result is averaged over classes, then over the batch
/// (a plain mean over all elements, since every row has the same width).
///
/// # Arguments
/// - `logits`: Raw scores (N x C)
/// - `targets`: 0/1 labels (N x C), any float or integer dtype
pub fn multilabel_soft_margin_loss(logits: &Tensor, targets: &Tensor) -> Result<Tensor> {
    let (rows, classes) = logits.dims2()?;
    let (target_rows, target_classes) = targets.dims2()?;
    if target_rows != rows {
        return Err(Error::DimensionMismatch {
            expected: rows,
            got: target_rows,
        });
    }
    if target_classes != classes {
        return Err(Error::DimensionMismatch {
            expected: classes,
            got: target_classes,
        });
    }

    let targets = targets.to_dtype(logits.dtype())?;

    let positive = logits.relu()?;
    let agreement = logits.mul(&targets)?;
    let softplus_tail = logits.abs()?.neg()?.exp()?.affine(1.0, 1.0)?.log()?;

    let per_element = positive.sub(&agreement)?.add(&softplus_tail)?;
    Ok(per_element.mean_all()?)
}
