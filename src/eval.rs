// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Per-region agreement statistics between predictions and ground truth.
//!
//! Batches of one-hot-shaped vectors are decoded through the label codec and
//! compared region by region. Joints mode first gets a multi-class agreement
//! row, then every mode gets a binarized error/no-error row. The positive
//! class of the binary matrix is "no error"; this polarity is part of the
//! metric definition and keeps results comparable across runs.
//!
//! The results table is append-only. Appending takes `&mut self`, so
//! concurrent workers accumulate disjoint tables and [`EvalTable::merge`]
//! them afterward.

use std::io::{self, Write};

use ndarray::{ArrayView1, ArrayView2};

use crate::dataset::Split;
use crate::error::{PipelineError, Result};
use crate::labels::gts2errs;
use crate::mode::Mode;

/// Raw confusion counts of one region comparison.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfusionCounts {
    /// Both sides agree on the positive class.
    pub true_pos: u64,
    /// Both sides agree on the negative class.
    pub true_neg: u64,
    /// Predicted positive, truth negative.
    pub false_pos: u64,
    /// Predicted negative, truth positive.
    pub false_neg: u64,
}

impl ConfusionCounts {
    /// Precision; 0 when undefined.
    #[must_use]
    pub fn precision(&self) -> f64 {
        ratio(self.true_pos, self.true_pos + self.false_pos)
    }

    /// Recall; 0 when undefined.
    #[must_use]
    pub fn recall(&self) -> f64 {
        ratio(self.true_pos, self.true_pos + self.false_neg)
    }

    /// Harmonic mean of precision and recall; 0 when undefined.
    #[must_use]
    pub fn f1(&self) -> f64 {
        let p = self.precision();
        let r = self.recall();
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * p * r / (p + r)
        }
    }

    /// Fraction of agreeing comparisons; 0 when undefined.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        ratio(
            self.true_pos + self.true_neg,
            self.true_pos + self.true_neg + self.false_pos + self.false_neg,
        )
    }

    /// Cohen's kappa; 0 when undefined.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn kappa(&self) -> f64 {
        let (tp, tn, fp, fn_) = (
            self.true_pos as f64,
            self.true_neg as f64,
            self.false_pos as f64,
            self.false_neg as f64,
        );
        let denom = (tp + fp) * (fp + tn) + (tp + fn_) * (fn_ + tn);
        if denom == 0.0 {
            0.0
        } else {
            2.0 * (tp * tn - fn_ * fp) / denom
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn ratio(num: u64, denom: u64) -> f64 {
    if denom == 0 {
        0.0
    } else {
        num as f64 / denom as f64
    }
}

/// Bookkeeping identifiers attached to every row of one batch.
#[derive(Debug, Clone)]
pub struct EvalContext {
    /// Training epoch.
    pub epoch: usize,
    /// Step within the epoch.
    pub step: usize,
    /// Split the batch came from.
    pub split: Split,
    /// Exercise identifier of the batch's session.
    pub exercise: String,
    /// Loss value at this step.
    pub loss: f32,
    /// Learning rate at this step.
    pub learning_rate: f32,
}

/// One appended results record: the confusion counts and derived metrics of
/// one (epoch, step, region, binarized) combination. Never mutated after
/// insertion.
#[derive(Debug, Clone)]
pub struct EvalRow {
    /// Training epoch.
    pub epoch: usize,
    /// Step within the epoch.
    pub step: usize,
    /// Split the batch came from.
    pub split: Split,
    /// Exercise identifier.
    pub exercise: String,
    /// Label granularity.
    pub mode: Mode,
    /// Region display name.
    pub region: &'static str,
    /// Whether the comparison was binarized to error/no-error.
    pub binarized: bool,
    /// Raw confusion counts.
    pub counts: ConfusionCounts,
    /// Derived precision.
    pub precision: f64,
    /// Derived recall.
    pub recall: f64,
    /// Derived F1.
    pub f1: f64,
    /// Derived accuracy.
    pub accuracy: f64,
    /// Cohen's kappa; only computed for binarized rows.
    pub kappa: Option<f64>,
    /// Loss value at this step.
    pub loss: f32,
    /// Learning rate at this step.
    pub learning_rate: f32,
}

impl EvalRow {
    fn new(
        ctx: &EvalContext,
        mode: Mode,
        region: &'static str,
        counts: ConfusionCounts,
        binarized: bool,
    ) -> Self {
        Self {
            epoch: ctx.epoch,
            step: ctx.step,
            split: ctx.split,
            exercise: ctx.exercise.clone(),
            mode,
            region,
            binarized,
            counts,
            precision: counts.precision(),
            recall: counts.recall(),
            f1: counts.f1(),
            accuracy: counts.accuracy(),
            kappa: binarized.then(|| counts.kappa()),
            loss: ctx.loss,
            learning_rate: ctx.learning_rate,
        }
    }
}

/// Append-only results table.
#[derive(Debug, Clone, Default)]
pub struct EvalTable {
    rows: Vec<EvalRow>,
}

impl EvalTable {
    /// An empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one row.
    pub fn push(&mut self, row: EvalRow) {
        self.rows.push(row);
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All rows, in append order.
    #[must_use]
    pub fn rows(&self) -> &[EvalRow] {
        &self.rows
    }

    /// Append another table's rows, preserving their order. Used to combine
    /// per-worker shards.
    pub fn merge(&mut self, other: Self) {
        self.rows.extend(other.rows);
    }

    /// Write the table as CSV for the external reporting layer.
    ///
    /// # Errors
    ///
    /// Propagates write failures.
    pub fn write_csv<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writeln!(
            writer,
            "epoch,step,split,exercise,mode,region,binarized,loss,learning_rate,\
             tp,tn,fp,fn,precision,recall,f1,accuracy,kappa"
        )?;
        for row in &self.rows {
            let kappa = row
                .kappa
                .map_or_else(String::new, |k| format!("{k:.6}"));
            writeln!(
                writer,
                "{},{},{},{},{},{},{},{},{},{},{},{},{},{:.6},{:.6},{:.6},{:.6},{}",
                row.epoch,
                row.step,
                row.split,
                row.exercise,
                row.mode,
                row.region,
                row.binarized,
                row.loss,
                row.learning_rate,
                row.counts.true_pos,
                row.counts.true_neg,
                row.counts.false_pos,
                row.counts.false_neg,
                row.precision,
                row.recall,
                row.f1,
                row.accuracy,
                kappa,
            )?;
        }
        Ok(())
    }
}

/// Decodes prediction/ground-truth batches and accumulates per-region rows.
#[derive(Debug, Default)]
pub struct Evaluator {
    mode: Mode,
    table: EvalTable,
}

impl Evaluator {
    /// An evaluator for one label granularity.
    #[must_use]
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            table: EvalTable::new(),
        }
    }

    /// Compare one batch of predicted and ground-truth vectors and append
    /// the per-region rows.
    ///
    /// For Joints mode each region first gets a multi-class agreement row
    /// (`binarized = false`), then every region gets the binarized
    /// error/no-error row with Cohen's kappa.
    ///
    /// # Errors
    ///
    /// [`PipelineError::LabelShapeMismatch`] if the two batches disagree in
    /// size or a row does not match the mode's vector length.
    pub fn record_batch(
        &mut self,
        predictions: ArrayView2<'_, f32>,
        ground_truth: ArrayView2<'_, f32>,
        ctx: &EvalContext,
    ) -> Result<()> {
        if predictions.nrows() != ground_truth.nrows() {
            return Err(PipelineError::LabelShapeMismatch {
                mode: self.mode,
                expected: ground_truth.nrows(),
                actual: predictions.nrows(),
            });
        }

        let (pred_classes, _) = gts2errs(predictions, self.mode)?;
        let (gt_classes, _) = gts2errs(ground_truth, self.mode)?;
        let multi_class = self.mode.classes_per_region() > 2;

        for r in 0..self.mode.region_count() {
            let region = self.mode.region_name(r).unwrap_or_default();
            let pred = pred_classes.column(r);
            let gt = gt_classes.column(r);

            if multi_class {
                let counts = multi_class_counts(pred, gt);
                self.table
                    .push(EvalRow::new(ctx, self.mode, region, counts, false));
            }

            let counts = binarized_counts(pred, gt);
            self.table
                .push(EvalRow::new(ctx, self.mode, region, counts, true));
        }
        Ok(())
    }

    /// The accumulated results table.
    #[must_use]
    pub fn table(&self) -> &EvalTable {
        &self.table
    }

    /// Consume the evaluator, returning its table.
    #[must_use]
    pub fn into_table(self) -> EvalTable {
        self.table
    }
}

/// Elementwise agreement at the native class granularity: matches count as
/// both tp and tn, mismatches as both fp and fn. Error kinds are not
/// distinguished, only agreement.
fn multi_class_counts(pred: ArrayView1<'_, u8>, gt: ArrayView1<'_, u8>) -> ConfusionCounts {
    let matches = pred.iter().zip(gt.iter()).filter(|(p, g)| p == g).count() as u64;
    let mismatches = pred.len() as u64 - matches;
    ConfusionCounts {
        true_pos: matches,
        true_neg: matches,
        false_pos: mismatches,
        false_neg: mismatches,
    }
}

/// Binary confusion with "no error" as the positive class: tp counts joint
/// agreement on "no error", tn agreement on "error".
fn binarized_counts(pred: ArrayView1<'_, u8>, gt: ArrayView1<'_, u8>) -> ConfusionCounts {
    let mut counts = ConfusionCounts::default();
    for (&p, &g) in pred.iter().zip(gt.iter()) {
        match (p == 0, g == 0) {
            (true, true) => counts.true_pos += 1,
            (false, false) => counts.true_neg += 1,
            (false, true) => counts.false_pos += 1,
            (true, false) => counts.false_neg += 1,
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::errs2gts;

    fn ctx() -> EvalContext {
        EvalContext {
            epoch: 1,
            step: 10,
            split: Split::Test,
            exercise: "squat".to_string(),
            loss: 0.25,
            learning_rate: 5e-5,
        }
    }

    #[test]
    fn test_division_guards() {
        let counts = ConfusionCounts::default();
        assert_eq!(counts.precision(), 0.0);
        assert_eq!(counts.recall(), 0.0);
        assert_eq!(counts.f1(), 0.0);
        assert_eq!(counts.accuracy(), 0.0);
        assert_eq!(counts.kappa(), 0.0);

        // tp = fp = 0 with non-empty counts still yields 0, not NaN.
        let counts = ConfusionCounts {
            true_pos: 0,
            true_neg: 3,
            false_pos: 0,
            false_neg: 2,
        };
        assert_eq!(counts.precision(), 0.0);
        assert!(counts.precision().is_finite());
    }

    #[test]
    fn test_kappa_formula() {
        let counts = ConfusionCounts {
            true_pos: 55,
            true_neg: 110,
            false_pos: 64,
            false_neg: 11,
        };
        // 2*(55*110 - 11*64) / ((55+64)*(64+110) + (55+11)*(11+110))
        let expected = 10692.0 / 28692.0;
        assert!((counts.kappa() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_perfect_agreement() {
        let gts = errs2gts(&[vec![0, 1], vec![1, 0], vec![0, 0]], Mode::HalfBody).unwrap();
        let mut evaluator = Evaluator::new(Mode::HalfBody);
        evaluator
            .record_batch(gts.view(), gts.view(), &ctx())
            .unwrap();

        let rows = evaluator.table().rows();
        assert_eq!(rows.len(), 2);
        for row in rows {
            assert!(row.binarized);
            assert_eq!(row.counts.false_pos, 0);
            assert_eq!(row.counts.false_neg, 0);
            assert_eq!(row.accuracy, 1.0);
            assert_eq!(row.kappa, Some(1.0));
        }
        assert_eq!(rows[0].region, "Upper Body");
        assert_eq!(rows[1].region, "Lower Body");
    }

    #[test]
    fn test_binarized_polarity() {
        // Truth says "no error" everywhere, prediction says "error":
        // all comparisons are false positives under the "no error is
        // positive" convention.
        let gt = errs2gts(&[vec![0, 0], vec![0, 0]], Mode::HalfBody).unwrap();
        let pred = errs2gts(&[vec![1, 1], vec![1, 1]], Mode::HalfBody).unwrap();

        let mut evaluator = Evaluator::new(Mode::HalfBody);
        evaluator
            .record_batch(pred.view(), gt.view(), &ctx())
            .unwrap();

        for row in evaluator.table().rows() {
            assert_eq!(row.counts.true_pos, 0);
            assert_eq!(row.counts.true_neg, 0);
            assert_eq!(row.counts.false_pos, 2);
            assert_eq!(row.counts.false_neg, 0);
            assert_eq!(row.precision, 0.0);
        }
    }

    #[test]
    fn test_joints_mode_adds_multi_class_rows() {
        let mut truth = vec![0u8; 20];
        truth[7] = 2;
        let mut pred = vec![0u8; 20];
        pred[7] = 1; // disagrees on severity, agrees on "some error"

        let gt = errs2gts(&[truth], Mode::Joints).unwrap();
        let pd = errs2gts(&[pred], Mode::Joints).unwrap();

        let mut evaluator = Evaluator::new(Mode::Joints);
        evaluator.record_batch(pd.view(), gt.view(), &ctx()).unwrap();

        let rows = evaluator.table().rows();
        // Two rows per joint region.
        assert_eq!(rows.len(), 40);

        // Joint 7: the multi-class row sees a mismatch...
        let multi = rows
            .iter()
            .find(|r| r.region == "Left Wrist" && !r.binarized)
            .unwrap();
        assert_eq!(multi.counts.false_pos, 1);
        assert_eq!(multi.kappa, None);

        // ...while the binarized row agrees that the joint is faulty.
        let binary = rows
            .iter()
            .find(|r| r.region == "Left Wrist" && r.binarized)
            .unwrap();
        assert_eq!(binary.counts.true_neg, 1);
        assert_eq!(binary.counts.false_pos, 0);
    }

    #[test]
    fn test_batch_size_mismatch() {
        let a = errs2gts(&[vec![0, 0]], Mode::HalfBody).unwrap();
        let b = errs2gts(&[vec![0, 0], vec![1, 1]], Mode::HalfBody).unwrap();
        let mut evaluator = Evaluator::new(Mode::HalfBody);
        let err = evaluator.record_batch(a.view(), b.view(), &ctx()).unwrap_err();
        assert!(matches!(err, PipelineError::LabelShapeMismatch { .. }));
    }

    #[test]
    fn test_merge_preserves_rows() {
        let gts = errs2gts(&[vec![0, 1]], Mode::HalfBody).unwrap();
        let mut a = Evaluator::new(Mode::HalfBody);
        a.record_batch(gts.view(), gts.view(), &ctx()).unwrap();
        let mut b = Evaluator::new(Mode::HalfBody);
        b.record_batch(gts.view(), gts.view(), &ctx()).unwrap();

        let mut table = a.into_table();
        table.merge(b.into_table());
        assert_eq!(table.len(), 4);
    }

    #[test]
    fn test_write_csv() {
        let gts = errs2gts(&[vec![0, 1]], Mode::HalfBody).unwrap();
        let mut evaluator = Evaluator::new(Mode::HalfBody);
        evaluator.record_batch(gts.view(), gts.view(), &ctx()).unwrap();

        let mut out = Vec::new();
        evaluator.table().write_csv(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("epoch,step,split"));
        assert!(lines[1].contains("Upper Body"));
        assert!(lines[2].contains("Lower Body"));
        assert!(lines[1].contains("test,squat,half-body"));
    }
}
