// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

#![allow(clippy::multiple_crate_versions)]

//! # Pose-Fault Pipeline Library
//!
//! Dataset and evaluation pipeline for estimating mis-posed body joints from
//! depth+RGB+skeleton exercise recordings. The library turns a directory of
//! multi-sensor recording sessions into supervised training examples at one
//! of four label granularities, and scores model predictions against the
//! derived ground truth at the same granularities.
//!
//! ## Features
//!
//! - **Four label granularities** - whole body, body halves, limb groups, or
//!   per-joint severity, selected by [`Mode`]
//! - **Deterministic label derivation** - per-joint error annotations reduce
//!   to region classes through fixed, hand-calibrated thresholds
//! - **Geometry-aware cropping** - square crops driven by the skeleton
//!   bounding box, with edge-aware padding and optional random placement
//! - **Lossless label codec** - class-index vectors round-trip exactly
//!   through the one-hot ground-truth encoding
//! - **Per-region evaluation** - confusion counts, precision/recall/F1,
//!   accuracy, and Cohen's kappa, multi-class and binarized
//!
//! ## Quick Start
//!
//! ```no_run
//! use posefault::{DatasetConfig, Mode, RecordingDataset};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let dataset = RecordingDataset::new(
//!         "/data/recordings",
//!         DatasetConfig::new()
//!             .with_mode(Mode::Limbs)
//!             .with_output_size(224)
//!             .with_test_exercises(["squat"]),
//!     )?;
//!
//!     let example = dataset.get(0)?;
//!     println!("rgb {:?}, labels {:?}", example.rgb.dim(), example.gt);
//!     Ok(())
//! }
//! ```
//!
//! ## Evaluation
//!
//! ```no_run
//! use posefault::dataset::Split;
//! use posefault::{errs2gts, EvalContext, Evaluator, Mode};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let truth = errs2gts(&[vec![0, 1]], Mode::HalfBody)?;
//! let predictions = truth.clone(); // model output, same layout
//!
//! let mut evaluator = Evaluator::new(Mode::HalfBody);
//! evaluator.record_batch(
//!     predictions.view(),
//!     truth.view(),
//!     &EvalContext {
//!         epoch: 1,
//!         step: 1,
//!         split: Split::Test,
//!         exercise: "squat".to_string(),
//!         loss: 0.1,
//!         learning_rate: 5e-5,
//!     },
//! )?;
//!
//! let mut csv = Vec::new();
//! evaluator.table().write_csv(&mut csv)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`mode`] | Label granularities and region tables ([`Mode`]) |
//! | [`skeleton`] | Skeleton-error records and the label reduction |
//! | [`labels`] | One-hot ground-truth codec |
//! | [`frame`] | Binary frame records and the per-frame loader |
//! | [`preprocess`] | Crop, flip, blur, overlay, and resize geometry |
//! | [`metadata`] | Session metadata parsing |
//! | [`augment`] | Per-access augmentation parameters |
//! | [`dataset`] | Flat frame index with train/test partitioning |
//! | [`eval`] | Per-region evaluation rows ([`Evaluator`]) |
//! | [`error`] | Error types ([`PipelineError`], [`Result`]) |

// Modules
pub mod augment;
pub mod cli;
pub mod dataset;
pub mod error;
pub mod eval;
pub mod frame;
pub mod labels;
pub mod metadata;
pub mod mode;
pub mod preprocess;
pub mod skeleton;

// Re-export main types for convenience
pub use augment::AugmentationParams;
pub use dataset::{DatasetConfig, RecordingDataset, Split, TrainingExample};
pub use error::{PipelineError, Result};
pub use eval::{ConfusionCounts, EvalContext, EvalRow, EvalTable, Evaluator};
pub use frame::{Frame, FrameEncoding};
pub use labels::{err2gt, errs2gts, gt2err, gts2errs};
pub use metadata::SessionMeta;
pub use mode::{Mode, RegionSpec, JOINT_COUNT, JOINT_NAMES};
pub use skeleton::{BoundingBox, SkeletonRecord, SkeletonReduction};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        // Version should be semver format like "0.1.0"
        assert!(VERSION.contains('.'));
    }

    #[test]
    fn test_name() {
        assert_eq!(NAME, "posefault");
    }
}
