// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Skeleton-error records and the per-frame label reduction.
//!
//! The recording tool stores, for every sampled frame, a list of person
//! candidates, each carrying a person-level error flag and a joint array with
//! per-joint error annotations. This module selects the reference candidate,
//! normalizes the joint set to the reduced 20-joint topology, and aggregates
//! the per-joint error codes into the region labels of a [`Mode`], together
//! with the bounding boxes that drive image cropping.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::{FrameId, PipelineError, Result};
use crate::mode::{Mode, FULL_BODY_THRESHOLD, JOINT_COUNT};

/// Raw slot count of the full skeleton topology.
const FULL_TOPOLOGY_LEN: usize = 25;

/// Raw slots dropped when reducing the full topology (placeholder, fingertips,
/// feet). 20-joint recordings are already reduced and keep every slot.
const EXCLUDED_SLOTS: [usize; 5] = [0, 10, 16, 20, 24];

/// Position of the anchor joint (waist) in the raw joint array.
const ANCHOR_INDEX: usize = 4;

/// Effective error code assigned to every joint of a person-level faulty
/// detection.
const PERSON_ERROR_CODE: u8 = 2;

/// Error code marking a joint as erroneous (excluded from bounding boxes).
const JOINT_ERROR: u8 = 1;

/// Left/right mirror-image joint pairs (arms, then legs), in reduced indices.
const MIRROR_PAIRS: [(usize, usize); 7] = [
    (5, 10),
    (6, 11),
    (7, 12),
    (8, 13),
    (14, 17),
    (15, 18),
    (16, 19),
];

/// One joint record from the skeleton-error file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JointRecord {
    /// Joint slot index within the recording topology.
    pub i: usize,
    /// Projected image column.
    pub u: f32,
    /// Projected image row.
    pub v: f32,
    /// Depth sample at the projected pixel, in meters.
    pub d: f32,
    /// Real-world position, in meters.
    pub x: f32,
    /// Real-world position, in meters.
    pub y: f32,
    /// Real-world position, in meters.
    pub z: f32,
    /// Annotated error code (0 ok, 1 error, higher codes not applicable).
    pub error: u8,
}

/// One person candidate: a joint array plus a person-level error flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkeletonRecord {
    /// Person-level error flag; non-zero marks the whole detection faulty.
    pub error: u8,
    /// Joint records in slot order.
    #[serde(rename = "Skeleton")]
    pub skeleton: Vec<JointRecord>,
}

/// Axis-aligned min/max bounds over joint positions.
///
/// Joints flagged erroneous never contribute. The max corner initializes to
/// the origin, matching the recording tool's accumulation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Minimum corner.
    pub min: [f32; 3],
    /// Maximum corner.
    pub max: [f32; 3],
}

impl BoundingBox {
    /// An empty box that any included point will collapse onto.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            min: [f32::INFINITY, f32::INFINITY, f32::INFINITY],
            max: [0.0, 0.0, 0.0],
        }
    }

    /// Fold a point into the bounds.
    pub fn include(&mut self, p: [f32; 3]) {
        for k in 0..3 {
            self.min[k] = self.min[k].min(p[k]);
            self.max[k] = self.max[k].max(p[k]);
        }
    }

    /// Whether no point was ever included.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.min[0] > self.max[0] || self.min[1] > self.max[1]
    }

    /// Extent along the first (column) axis.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.max[0] - self.min[0]
    }

    /// Extent along the second (row) axis.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.max[1] - self.min[1]
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::empty()
    }
}

/// Output of the per-frame skeleton reduction.
#[derive(Debug, Clone)]
pub struct SkeletonReduction {
    /// Anchor-relative projected positions, shape (joints, 3) as (u, v, d).
    pub pose_2d: Array2<f32>,
    /// Anchor-relative real-world positions, shape (joints, 3).
    pub pose_3d: Array2<f32>,
    /// Region error class indices, one per region of the mode.
    pub labels: Vec<u8>,
    /// Projected-coordinate bounds over non-erroneous joints.
    pub bbox_2d: BoundingBox,
    /// Real-world bounds over non-erroneous joints.
    pub bbox_3d: BoundingBox,
    /// Absolute projected (u, v) of every kept joint, for the pose overlay.
    pub joints_px: Vec<(f32, f32)>,
}

/// Select the reference candidate: the last person whose overall flag is ok,
/// falling back to the first candidate.
fn reference_index(candidates: &[SkeletonRecord]) -> usize {
    candidates
        .iter()
        .enumerate()
        .filter(|(_, skel)| skel.error == 0)
        .last()
        .map_or(0, |(i, _)| i)
}

/// Swap the error codes of left/right mirror-image joints.
///
/// After a geometric left-right mirror of the image and pose data, "left"
/// must still mean anatomical left; the codes of both arm and both leg chains
/// trade places.
fn mirror_error_codes(codes: &mut [u8]) {
    for &(left, right) in &MIRROR_PAIRS {
        codes.swap(left, right);
    }
}

/// Reduce one frame's candidate list into pose arrays, region labels, and
/// bounding boxes.
///
/// # Errors
///
/// [`PipelineError::NoSkeletonDetected`] if the candidate list is empty,
/// [`PipelineError::Skeleton`] if the reference skeleton is malformed (missing
/// anchor joint or an unexpected joint count after reduction).
pub fn reduce_skeletons(
    candidates: &[SkeletonRecord],
    flip: bool,
    mode: Mode,
    id: FrameId<'_>,
) -> Result<SkeletonReduction> {
    if candidates.is_empty() {
        return Err(PipelineError::NoSkeletonDetected {
            session: id.session.to_string(),
            frame: id.ordinal,
        });
    }

    let person = &candidates[reference_index(candidates)];
    let anchor = *person.skeleton.get(ANCHOR_INDEX).ok_or_else(|| {
        PipelineError::Skeleton(format!(
            "session '{}', frame {}: skeleton has no anchor joint (slot {ANCHOR_INDEX})",
            id.session, id.ordinal
        ))
    })?;

    let full_topology = person.skeleton.len() == FULL_TOPOLOGY_LEN;
    let sign = if flip { -1.0 } else { 1.0 };

    let mut pose_2d = Vec::with_capacity(JOINT_COUNT * 3);
    let mut pose_3d = Vec::with_capacity(JOINT_COUNT * 3);
    let mut codes = Vec::with_capacity(JOINT_COUNT);
    let mut joints_px = Vec::with_capacity(JOINT_COUNT);
    let mut bbox_2d = BoundingBox::empty();
    let mut bbox_3d = BoundingBox::empty();

    for joint in &person.skeleton {
        if full_topology && EXCLUDED_SLOTS.contains(&joint.i) {
            continue;
        }

        if joint.error != JOINT_ERROR {
            bbox_2d.include([joint.u, joint.v, joint.d]);
            bbox_3d.include([joint.x, joint.y, joint.z]);
        }

        pose_2d.extend_from_slice(&[
            (joint.u - anchor.u) * sign,
            (joint.v - anchor.v) * sign,
            (joint.d - anchor.d) * sign,
        ]);
        pose_3d.extend_from_slice(&[
            (joint.x - anchor.x) * sign,
            (joint.y - anchor.y) * sign,
            (joint.z - anchor.z) * sign,
        ]);
        joints_px.push((joint.u, joint.v));

        codes.push(if person.error != 0 {
            PERSON_ERROR_CODE
        } else {
            joint.error
        });
    }

    if codes.len() != JOINT_COUNT {
        return Err(PipelineError::Skeleton(format!(
            "session '{}', frame {}: expected {JOINT_COUNT} joints after reduction, got {}",
            id.session,
            id.ordinal,
            codes.len()
        )));
    }

    if flip {
        mirror_error_codes(&mut codes);
    }

    let labels = reduce_codes(&codes, mode)?;

    let joints = codes.len();
    Ok(SkeletonReduction {
        pose_2d: Array2::from_shape_vec((joints, 3), pose_2d).expect("pose array shape"),
        pose_3d: Array2::from_shape_vec((joints, 3), pose_3d).expect("pose array shape"),
        labels,
        bbox_2d,
        bbox_3d,
        joints_px,
    })
}

/// Aggregate per-joint error codes into the mode's region class indices.
fn reduce_codes(codes: &[u8], mode: Mode) -> Result<Vec<u8>> {
    let labels = match mode {
        Mode::FullBody => {
            let erroring = codes.iter().filter(|&&c| c != 0).count();
            vec![u8::from(erroring > FULL_BODY_THRESHOLD)]
        }
        Mode::HalfBody | Mode::Limbs => mode
            .regions()?
            .iter()
            .map(|region| {
                let erroring = region.joints.iter().filter(|&&j| codes[j] != 0).count();
                u8::from(erroring > region.threshold)
            })
            .collect(),
        Mode::Joints => codes.to_vec(),
    };
    Ok(labels)
}
