// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Label granularities for pose-fault classification.
//!
//! A frame's per-joint error annotations are aggregated into one of four
//! granularities: the whole body, the upper/lower halves, six limb groups, or
//! each joint on its own. The mode fixes the number of classified regions, the
//! number of error classes per region, and the joint set feeding each region's
//! aggregation. All lookups are static tables; they run on every frame access
//! and every evaluation row.

use std::fmt;
use std::str::FromStr;

use crate::error::{PipelineError, Result};

/// Number of joints in the reduced skeleton topology.
pub const JOINT_COUNT: usize = 20;

/// Display names of the reduced 20-joint topology, in joint-index order.
pub const JOINT_NAMES: [&str; JOINT_COUNT] = [
    "Head",
    "Neck",
    "Torso",
    "Waist",
    "Left Collar",
    "Left Shoulder",
    "Left Elbow",
    "Left Wrist",
    "Left Hand",
    "Right Collar",
    "Right Shoulder",
    "Right Elbow",
    "Right Wrist",
    "Right Hand",
    "Left Hip",
    "Left Knee",
    "Left Ankle",
    "Right Hip",
    "Right Knee",
    "Right Ankle",
];

/// One aggregation region: a named joint group and its error-count threshold.
///
/// The region is labeled "error" iff strictly more than `threshold` of its
/// joints carry a non-zero error code. Thresholds are hand-calibrated per
/// anatomical region and are part of the label definition, not derivable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionSpec {
    /// Region display name.
    pub name: &'static str,
    /// Member indices into the reduced 20-joint array.
    pub joints: &'static [usize],
    /// Error-count threshold (strict: "error" iff count > threshold).
    pub threshold: usize,
}

const HALF_BODY_REGIONS: [RegionSpec; 2] = [
    RegionSpec {
        name: "Upper Body",
        joints: &[0, 1, 2, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13],
        threshold: 0,
    },
    RegionSpec {
        name: "Lower Body",
        joints: &[3, 14, 15, 16, 17, 18, 19],
        threshold: 1,
    },
];

const LIMB_REGIONS: [RegionSpec; 6] = [
    RegionSpec {
        name: "Torso",
        joints: &[2, 3, 4, 9],
        threshold: 0,
    },
    RegionSpec {
        name: "Head",
        joints: &[0, 1],
        threshold: 0,
    },
    RegionSpec {
        name: "Left Arm",
        joints: &[5, 6, 7, 8],
        threshold: 0,
    },
    RegionSpec {
        name: "Right Arm",
        joints: &[10, 11, 12, 13],
        threshold: 0,
    },
    RegionSpec {
        name: "Left Leg",
        joints: &[14, 15, 16],
        threshold: 1,
    },
    RegionSpec {
        name: "Right Leg",
        joints: &[17, 18, 19],
        threshold: 1,
    },
];

/// Whole-body error-count threshold (FullBody has no named sub-regions).
pub(crate) const FULL_BODY_THRESHOLD: usize = 2;

/// Label granularity of the fault classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// One binary label for the whole body.
    FullBody,
    /// Binary labels for the upper and lower body halves.
    HalfBody,
    /// Binary labels for six limb groups.
    Limbs,
    /// A four-way severity label per joint.
    Joints,
}

impl Mode {
    /// Number of regions this mode classifies.
    #[must_use]
    pub const fn region_count(&self) -> usize {
        match self {
            Self::FullBody => 1,
            Self::HalfBody => 2,
            Self::Limbs => 6,
            Self::Joints => JOINT_COUNT,
        }
    }

    /// Number of error classes per region.
    #[must_use]
    pub const fn classes_per_region(&self) -> usize {
        match self {
            Self::Joints => 4,
            _ => 2,
        }
    }

    /// Length of the one-hot ground-truth vector.
    #[must_use]
    pub const fn vector_length(&self) -> usize {
        self.region_count() * self.classes_per_region()
    }

    /// Static region table for modes with named sub-regions.
    ///
    /// Region order here defines the label-vector layout.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::UnsupportedMode`] for `FullBody` and `Joints`,
    /// which have no named sub-regions.
    pub fn regions(&self) -> Result<&'static [RegionSpec]> {
        match self {
            Self::HalfBody => Ok(&HALF_BODY_REGIONS),
            Self::Limbs => Ok(&LIMB_REGIONS),
            Self::FullBody | Self::Joints => Err(PipelineError::UnsupportedMode(*self)),
        }
    }

    /// Display name of region `index`, for evaluation rows and CLI output.
    #[must_use]
    pub fn region_name(&self, index: usize) -> Option<&'static str> {
        match self {
            Self::FullBody => (index == 0).then_some("Full Body"),
            Self::HalfBody => HALF_BODY_REGIONS.get(index).map(|r| r.name),
            Self::Limbs => LIMB_REGIONS.get(index).map(|r| r.name),
            Self::Joints => JOINT_NAMES.get(index).copied(),
        }
    }

    /// String representation used in results tables and CLI flags.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::FullBody => "full-body",
            Self::HalfBody => "half-body",
            Self::Limbs => "limbs",
            Self::Joints => "joints",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Mode {
    type Err = ModeParseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "full-body" | "full_body" | "fullbody" | "full" => Ok(Self::FullBody),
            "half-body" | "half_body" | "halfbody" | "half" => Ok(Self::HalfBody),
            "limbs" | "limb" => Ok(Self::Limbs),
            "joints" | "joint" => Ok(Self::Joints),
            _ => Err(ModeParseError(s.to_string())),
        }
    }
}

impl Default for Mode {
    fn default() -> Self {
        Self::FullBody
    }
}

/// Error returned when parsing an invalid mode string.
#[derive(Debug, Clone)]
pub struct ModeParseError(String);

impl fmt::Display for ModeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid mode '{}', expected one of: full-body, half-body, limbs, joints",
            self.0
        )
    }
}

impl std::error::Error for ModeParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_counts() {
        assert_eq!(Mode::FullBody.region_count(), 1);
        assert_eq!(Mode::HalfBody.region_count(), 2);
        assert_eq!(Mode::Limbs.region_count(), 6);
        assert_eq!(Mode::Joints.region_count(), 20);
    }

    #[test]
    fn test_classes_per_region() {
        assert_eq!(Mode::FullBody.classes_per_region(), 2);
        assert_eq!(Mode::HalfBody.classes_per_region(), 2);
        assert_eq!(Mode::Limbs.classes_per_region(), 2);
        assert_eq!(Mode::Joints.classes_per_region(), 4);
    }

    #[test]
    fn test_vector_lengths() {
        assert_eq!(Mode::FullBody.vector_length(), 2);
        assert_eq!(Mode::HalfBody.vector_length(), 4);
        assert_eq!(Mode::Limbs.vector_length(), 12);
        assert_eq!(Mode::Joints.vector_length(), 80);
    }

    #[test]
    fn test_region_tables_cover_all_joints() {
        for mode in [Mode::HalfBody, Mode::Limbs] {
            let regions = mode.regions().unwrap();
            let mut seen = [false; JOINT_COUNT];
            for region in regions {
                for &j in region.joints {
                    assert!(!seen[j], "{mode}: joint {j} in two regions");
                    seen[j] = true;
                }
            }
            assert!(seen.iter().all(|&s| s), "{mode}: not all joints covered");
        }
    }

    #[test]
    fn test_region_thresholds() {
        let half = Mode::HalfBody.regions().unwrap();
        assert_eq!(half[0].threshold, 0);
        assert_eq!(half[1].threshold, 1);

        let limbs = Mode::Limbs.regions().unwrap();
        assert_eq!(limbs[0].name, "Torso");
        assert_eq!(limbs[0].threshold, 0);
        assert_eq!(limbs[1].name, "Head");
        assert_eq!(limbs[1].threshold, 0);
        assert_eq!(limbs[4].name, "Left Leg");
        assert_eq!(limbs[4].threshold, 1);
        assert_eq!(limbs[5].name, "Right Leg");
        assert_eq!(limbs[5].threshold, 1);
    }

    #[test]
    fn test_regions_unsupported_modes() {
        assert!(matches!(
            Mode::FullBody.regions(),
            Err(PipelineError::UnsupportedMode(Mode::FullBody))
        ));
        assert!(matches!(
            Mode::Joints.regions(),
            Err(PipelineError::UnsupportedMode(Mode::Joints))
        ));
    }

    #[test]
    fn test_region_names() {
        assert_eq!(Mode::FullBody.region_name(0), Some("Full Body"));
        assert_eq!(Mode::FullBody.region_name(1), None);
        assert_eq!(Mode::HalfBody.region_name(1), Some("Lower Body"));
        assert_eq!(Mode::Limbs.region_name(2), Some("Left Arm"));
        assert_eq!(Mode::Joints.region_name(3), Some("Waist"));
        assert_eq!(Mode::Joints.region_name(20), None);
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!("full-body".parse::<Mode>().unwrap(), Mode::FullBody);
        assert_eq!("half_body".parse::<Mode>().unwrap(), Mode::HalfBody);
        assert_eq!("limbs".parse::<Mode>().unwrap(), Mode::Limbs);
        assert_eq!("Joints".parse::<Mode>().unwrap(), Mode::Joints);
        assert!("torso".parse::<Mode>().is_err());
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(Mode::FullBody.to_string(), "full-body");
        assert_eq!(Mode::Joints.to_string(), "joints");
    }
}
