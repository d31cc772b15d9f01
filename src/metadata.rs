// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Session metadata parsing.
//!
//! Every recording session is described by one JSON file written by the
//! capture tool: total frame count, the camera list (each camera records into
//! its own subdirectory of binary frames), the name of the paired
//! skeleton-error file, and the session parameters including the exercise
//! descriptor used for the train/test partition.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// One camera of a recording session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraMeta {
    /// Camera type tag (e.g. a vendor name).
    #[serde(rename = "Type", default)]
    pub kind: String,
    /// Human-readable camera name.
    #[serde(rename = "Name", default)]
    pub name: String,
    /// Subdirectory holding this camera's binary frame files.
    #[serde(rename = "FileName")]
    pub file_name: String,
    /// Principal point, x.
    #[serde(rename = "Cx", default)]
    pub cx: f64,
    /// Principal point, y.
    #[serde(rename = "Cy", default)]
    pub cy: f64,
    /// Focal length, x.
    #[serde(rename = "Fx", default)]
    pub fx: f64,
    /// Focal length, y.
    #[serde(rename = "Fy", default)]
    pub fy: f64,
    /// Depth-unit to meter conversion factor.
    #[serde(rename = "MeterPerUnit", default)]
    pub meter_per_unit: f64,
}

/// The exercise performed during a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseMeta {
    /// Exercise identifier; drives the train/test partition.
    #[serde(rename = "Name")]
    pub name: String,
    /// Performed sitting down.
    #[serde(rename = "Sitting", default)]
    pub sitting: bool,
    /// Performed with ankle weights.
    #[serde(rename = "Ankle Weight", default)]
    pub ankle_weight: bool,
    /// Performed holding a weight.
    #[serde(rename = "Holding Weight", default)]
    pub holding_weight: bool,
}

/// Capture conditions of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionParams {
    /// Camera angle toward the subject, in degrees.
    #[serde(rename = "Angle", default)]
    pub angle: f64,
    /// Camera height, in meters.
    #[serde(rename = "Height", default)]
    pub height: f64,
    /// Camera-to-subject distance, in meters.
    #[serde(rename = "Distance", default)]
    pub distance: f64,
    /// Cluttered background close behind the subject.
    #[serde(rename = "Background close", default)]
    pub close_background: bool,
    /// Cramped recording space.
    #[serde(rename = "Cramped", default)]
    pub cramped: bool,
    /// Subject wearing dark clothing.
    #[serde(rename = "Dark Clothing", default)]
    pub dark_clothing: bool,
    /// The exercise descriptor.
    #[serde(rename = "Exercise")]
    pub exercise: ExerciseMeta,
}

/// Metadata of one recording session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMeta {
    /// Session name.
    #[serde(rename = "Name")]
    pub name: String,
    /// Total sampled frames in this session.
    #[serde(rename = "Frames")]
    pub frames: usize,
    /// Recording duration, in seconds.
    #[serde(rename = "Duration", default)]
    pub duration: f64,
    /// Cameras that recorded this session.
    #[serde(rename = "Cameras")]
    pub cameras: Vec<CameraMeta>,
    /// File name of the paired skeleton-error JSON, relative to the
    /// recording root.
    #[serde(rename = "Skeleton")]
    pub skeleton: String,
    /// Capture conditions and exercise descriptor.
    #[serde(rename = "Session Parameters")]
    pub params: SessionParams,
}

impl SessionMeta {
    /// Parse session metadata from a JSON file.
    ///
    /// # Errors
    ///
    /// [`PipelineError::Io`] if the file cannot be read,
    /// [`PipelineError::Metadata`] if the JSON is malformed or a required
    /// field is missing.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text).map_err(|err| {
            PipelineError::Metadata(format!("{}: {err}", path.display()))
        })
    }

    /// Parse session metadata from a JSON string.
    ///
    /// # Errors
    ///
    /// [`PipelineError::Json`] if the JSON is malformed or a required field
    /// is missing.
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// The exercise identifier used for the train/test partition.
    #[must_use]
    pub fn exercise(&self) -> &str {
        &self.params.exercise.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_SESSION: &str = r#"{
        "Name": "rec_2023_02_14_01",
        "Frames": 60,
        "Duration": 120.5,
        "Cameras": [
            {
                "Type": "Realsense",
                "Name": "Front",
                "FileName": "rec_2023_02_14_01_cam0",
                "Cx": 320.1,
                "Cy": 240.7,
                "Fx": 611.2,
                "Fy": 610.9,
                "MeterPerUnit": 0.001
            }
        ],
        "Skeleton": "rec_2023_02_14_01Skeleton.json",
        "Session Parameters": {
            "Angle": 0.0,
            "Height": 1.2,
            "Distance": 2.5,
            "Background close": false,
            "Cramped": false,
            "Dark Clothing": true,
            "Exercise": {
                "Name": "squat",
                "Sitting": false,
                "Ankle Weight": false,
                "Holding Weight": true
            }
        }
    }"#;

    #[test]
    fn test_parse_session() {
        let meta = SessionMeta::from_json_str(SAMPLE_SESSION).unwrap();
        assert_eq!(meta.name, "rec_2023_02_14_01");
        assert_eq!(meta.frames, 60);
        assert_eq!(meta.cameras.len(), 1);
        assert_eq!(meta.cameras[0].file_name, "rec_2023_02_14_01_cam0");
        assert_eq!(meta.skeleton, "rec_2023_02_14_01Skeleton.json");
        assert_eq!(meta.exercise(), "squat");
        assert!(meta.params.dark_clothing);
        assert!(meta.params.exercise.holding_weight);
    }

    #[test]
    fn test_missing_required_field_fails() {
        // No "Frames" field.
        let text = r#"{"Name": "x", "Cameras": [], "Skeleton": "s.json",
            "Session Parameters": {"Exercise": {"Name": "squat"}}}"#;
        assert!(SessionMeta::from_json_str(text).is_err());
    }

    #[test]
    fn test_optional_fields_default() {
        let text = r#"{
            "Name": "x",
            "Frames": 3,
            "Cameras": [{"FileName": "cam"}],
            "Skeleton": "xSkeleton.json",
            "Session Parameters": {"Exercise": {"Name": "lunge"}}
        }"#;
        let meta = SessionMeta::from_json_str(text).unwrap();
        assert_eq!(meta.duration, 0.0);
        assert_eq!(meta.cameras[0].meter_per_unit, 0.0);
        assert!(!meta.params.exercise.sitting);
    }

    #[test]
    fn test_from_file_missing_is_io_error() {
        let err = SessionMeta::from_file(Path::new("/nonexistent/session.json")).unwrap_err();
        assert!(matches!(err, PipelineError::Io(_)));
    }
}
