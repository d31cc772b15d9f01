// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Lossless conversion between region class indices and one-hot ground-truth
//! vectors.
//!
//! The ground-truth vector concatenates one one-hot block per region; block
//! size is the mode's classes-per-region. Decoding runs every block through
//! softmax and takes the arg-max. One-hot inputs are a fixed point of that
//! transform, so `gt2err(err2gt(v)) == v` exactly; decoding predictions and
//! decoding ground truth share a single code path.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

use crate::error::{PipelineError, Result};
use crate::mode::Mode;

/// Encode region class indices into a one-hot ground-truth vector.
///
/// For Joints mode, region `r` with class `e` sets position `r*4 + e`. For
/// the binary modes, class 0 sets position `r*2` and any non-zero class sets
/// `r*2 + 1`.
///
/// # Errors
///
/// [`PipelineError::LabelShapeMismatch`] if `errors` does not hold one class
/// per region, [`PipelineError::ClassOutOfRange`] if a Joints-mode class
/// exceeds the severity range.
pub fn err2gt(errors: &[u8], mode: Mode) -> Result<Array1<f32>> {
    let regions = mode.region_count();
    if errors.len() != regions {
        return Err(PipelineError::LabelShapeMismatch {
            mode,
            expected: regions,
            actual: errors.len(),
        });
    }

    let classes = mode.classes_per_region();
    let mut gt = Array1::zeros(mode.vector_length());
    for (r, &e) in errors.iter().enumerate() {
        let class = if mode == Mode::Joints {
            if usize::from(e) >= classes {
                return Err(PipelineError::ClassOutOfRange {
                    mode,
                    region: r,
                    class: e,
                });
            }
            usize::from(e)
        } else {
            usize::from(e != 0)
        };
        gt[r * classes + class] = 1.0;
    }
    Ok(gt)
}

/// Encode a batch of class-index vectors, one ground-truth row per input row.
///
/// # Errors
///
/// Propagates the per-vector errors of [`err2gt`].
pub fn errs2gts(errors: &[Vec<u8>], mode: Mode) -> Result<Array2<f32>> {
    let mut gts = Array2::zeros((errors.len(), mode.vector_length()));
    for (i, err) in errors.iter().enumerate() {
        gts.row_mut(i).assign(&err2gt(err, mode)?);
    }
    Ok(gts)
}

/// Decode a ground-truth-shaped vector into class indices and confidences.
///
/// Every region block goes through softmax; the arg-max is the class, the
/// maximal probability the confidence. Exact inverse of [`err2gt`] for true
/// one-hot inputs.
///
/// # Errors
///
/// [`PipelineError::LabelShapeMismatch`] if the vector length does not equal
/// the mode's layout; never truncates or pads.
pub fn gt2err(gt: ArrayView1<'_, f32>, mode: Mode) -> Result<(Vec<u8>, Vec<f32>)> {
    let expected = mode.vector_length();
    if gt.len() != expected {
        return Err(PipelineError::LabelShapeMismatch {
            mode,
            expected,
            actual: gt.len(),
        });
    }

    let classes = mode.classes_per_region();
    let mut err = Vec::with_capacity(mode.region_count());
    let mut confidence = Vec::with_capacity(mode.region_count());

    for block in gt.exact_chunks(classes) {
        let probs = softmax(block);
        let (class, conf) = probs
            .iter()
            .enumerate()
            .fold((0, f32::NEG_INFINITY), |(bi, bp), (i, &p)| {
                if p > bp {
                    (i, p)
                } else {
                    (bi, bp)
                }
            });
        #[allow(clippy::cast_possible_truncation)]
        err.push(class as u8);
        confidence.push(conf);
    }

    Ok((err, confidence))
}

/// Decode a batch of ground-truth-shaped rows.
///
/// Returns class indices and confidences, both shaped (rows, regions), in the
/// input row order.
///
/// # Errors
///
/// Propagates the per-row errors of [`gt2err`].
pub fn gts2errs(gts: ArrayView2<'_, f32>, mode: Mode) -> Result<(Array2<u8>, Array2<f32>)> {
    let rows = gts.len_of(Axis(0));
    let regions = mode.region_count();
    let mut errs = Array2::zeros((rows, regions));
    let mut confidences = Array2::zeros((rows, regions));

    for (i, row) in gts.axis_iter(Axis(0)).enumerate() {
        let (err, conf) = gt2err(row, mode)?;
        for r in 0..regions {
            errs[[i, r]] = err[r];
            confidences[[i, r]] = conf[r];
        }
    }

    Ok((errs, confidences))
}

/// Numerically stable softmax over one region block.
fn softmax(block: ArrayView1<'_, f32>) -> Vec<f32> {
    let max = block.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = block.iter().map(|&v| (v - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.iter().map(|&e| e / sum).collect()
}
