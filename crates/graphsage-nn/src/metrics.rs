//! F1 scores for multi-label predictions.
//!
//! Both inputs are (N x C) matrices. Values above 0.5 count as positive, so
//! 0/1 predictions from [`crate::SupervisedGraphSage::predict`] and
//! probabilities both work. Undefined ratios (no positives anywhere) score 0.

use crate::error::{Error, Result};
use candle_core::{DType, Tensor};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Counts {
    tp: usize,
    fp: usize,
    fn_: usize,
}

impl Counts {
    fn f1(self) -> f32 {
        let denom = 2 * self.tp + self.fp + self.fn_;
        if denom == 0 {
            0.0
        } else {
            (2 * self.tp) as f32 / denom as f32
        }
    }
}

fn per_class_counts(preds: &Tensor, labels: &Tensor) -> Result<Vec<Counts>> {
    let (rows, classes) = preds.dims2()?;
    let (label_rows, label_classes) = labels.dims2()?;
    if label_rows != rows {
        return Err(Error::DimensionMismatch {
            expected: rows,
            got: label_rows,
        });
    }
    if label_classes != classes {
        return Err(Error::DimensionMismatch {
            expected: classes,
            got: label_classes,
        });
    }

    let preds = preds.to_dtype(DType::F32)?.to_vec2::<f32>()?;
    let labels = labels.to_dtype(DType::F32)?.to_vec2::<f32>()?;

    let mut counts = vec![Counts::default(); classes];
    for (p_row, l_row) in preds.iter().zip(labels.iter()) {
        for (c, (&p, &l)) in p_row.iter().zip(l_row.iter()).enumerate() {
            match (p > 0.5, l > 0.5) {
                (true, true) => counts[c].tp += 1,
                (true, false) => counts[c].fp += 1,
                (false, true) => counts[c].fn_ += 1,
                (false, false) => {}
            }
        }
    }
    Ok(counts)
}

/// F1 over all (node, class) decisions pooled together.
pub fn micro_f1(preds: &Tensor, labels: &Tensor) -> Result<f32> {
    let total = per_class_counts(preds, labels)?
        .into_iter()
        .fold(Counts::default(), |acc, c| Counts {
            tp: acc.tp + c.tp,
            fp: acc.fp + c.fp,
            fn_: acc.fn_ + c.fn_,
        });
    Ok(total.f1())
}

/// Unweighted mean of per-class F1 scores.
pub fn macro_f1(preds: &Tensor, labels: &Tensor) -> Result<f32> {
    let counts = per_class_counts(preds, labels)?;
    if counts.is_empty() {
        return Ok(0.0);
    }
    let sum: f32 = counts.iter().map(|c| c.f1()).sum();
    Ok(sum / counts.len() as f32)
}
