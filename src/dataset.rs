// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Flat frame index over a directory of recording sessions.
//!
//! The dataset scans every session metadata file under a recording root,
//! keeps the sessions matching the requested train/test split, and exposes
//! the union of their frames as one flat index. Each access loads its frame
//! from disk, applies augmentation, resizes to the training size, and encodes
//! the region labels as a one-hot ground-truth vector.

use std::fs;
use std::path::{Path, PathBuf};

use ndarray::{Array1, Array2, Array3};

use crate::augment::AugmentationParams;
use crate::error::{PipelineError, Result};
use crate::frame::{load_frame, FrameEncoding};
use crate::labels::err2gt;
use crate::metadata::SessionMeta;
use crate::mode::Mode;
use crate::preprocess::{resize_bilinear, resize_plane};

/// Which partition of the exercise split a dataset serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Split {
    /// Sessions whose exercise is not in the held-out set.
    #[default]
    Train,
    /// Sessions whose exercise is in the held-out set.
    Test,
}

impl Split {
    /// String representation used in results tables.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Train => "train",
            Self::Test => "test",
        }
    }
}

impl std::fmt::Display for Split {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Configuration for a [`RecordingDataset`].
///
/// Uses a builder pattern for convenient construction.
#[derive(Debug, Clone)]
pub struct DatasetConfig {
    /// Side length of the square output rasters.
    pub output_size: usize,
    /// Label granularity.
    pub mode: Mode,
    /// Which rasters each example carries.
    pub encoding: FrameEncoding,
    /// Partition served by this dataset.
    pub split: Split,
    /// Exercise identifiers held out for the test split.
    pub test_exercises: Vec<String>,
    /// Base augmentation applied to every access.
    pub augmentation: AugmentationParams,
    /// Sample a fresh augmentation value per access instead of the base one.
    pub randomize_augmentation: bool,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            output_size: 224,
            mode: Mode::default(),
            encoding: FrameEncoding::default(),
            split: Split::Train,
            test_exercises: Vec::new(),
            augmentation: AugmentationParams::default(),
            randomize_augmentation: false,
        }
    }
}

impl DatasetConfig {
    /// Create a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the output raster side length.
    #[must_use]
    pub fn with_output_size(mut self, size: usize) -> Self {
        self.output_size = size;
        self
    }

    /// Set the label granularity.
    #[must_use]
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the frame encoding.
    #[must_use]
    pub fn with_encoding(mut self, encoding: FrameEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Set the served split.
    #[must_use]
    pub fn with_split(mut self, split: Split) -> Self {
        self.split = split;
        self
    }

    /// Set the held-out exercise identifiers.
    #[must_use]
    pub fn with_test_exercises<I, S>(mut self, exercises: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.test_exercises = exercises.into_iter().map(Into::into).collect();
        self
    }

    /// Set the base augmentation parameters.
    #[must_use]
    pub fn with_augmentation(mut self, params: AugmentationParams) -> Self {
        self.augmentation = params;
        self
    }

    /// Enable per-access augmentation sampling.
    #[must_use]
    pub fn with_randomized_augmentation(mut self, randomize: bool) -> Self {
        self.randomize_augmentation = randomize;
        self
    }
}

/// One training example produced by a dataset access.
#[derive(Debug, Clone)]
pub struct TrainingExample {
    /// RGB raster, shape (size, size, 3).
    pub rgb: Array3<f32>,
    /// Depth raster, shape (size, size, channels).
    pub depth: Array3<f32>,
    /// Pose-overlay raster, present for [`FrameEncoding::RgbdPose`].
    pub overlay: Option<Array2<f32>>,
    /// Anchor-relative projected pose, shape (joints, 3).
    pub pose_2d: Array2<f32>,
    /// One-hot ground-truth vector for the configured mode.
    pub gt: Array1<f32>,
    /// Metadata of the owning session.
    pub session: SessionMeta,
}

/// Flat frame index over the sessions of one split.
#[derive(Debug)]
pub struct RecordingDataset {
    root: PathBuf,
    config: DatasetConfig,
    sessions: Vec<SessionMeta>,
    /// Cumulative frame offsets; `offsets[i]` is the flat index of session
    /// `i`'s first frame, `offsets[len]` the total frame count.
    offsets: Vec<usize>,
}

impl RecordingDataset {
    /// Index every session under `root` that belongs to the configured split.
    ///
    /// Session metadata files are the `.json` entries of the root directory,
    /// excluding the skeleton-error files (`*Skeleton.json`).
    ///
    /// # Errors
    ///
    /// [`PipelineError::Io`] if the root cannot be listed,
    /// [`PipelineError::Metadata`] for malformed session files. There is no
    /// partial-session recovery.
    pub fn new(root: impl AsRef<Path>, config: DatasetConfig) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        let mut paths: Vec<PathBuf> = fs::read_dir(&root)?
            .filter_map(std::result::Result::ok)
            .map(|entry| entry.path())
            .filter(|path| is_session_file(path))
            .collect();
        paths.sort();

        let mut sessions = Vec::new();
        for path in paths {
            let meta = SessionMeta::from_file(&path)?;
            let held_out = config
                .test_exercises
                .iter()
                .any(|e| e == meta.exercise());
            let wanted = match config.split {
                Split::Train => !held_out,
                Split::Test => held_out,
            };
            if wanted {
                sessions.push(meta);
            }
        }

        let mut offsets = Vec::with_capacity(sessions.len() + 1);
        let mut total = 0;
        offsets.push(0);
        for session in &sessions {
            total += session.frames;
            offsets.push(total);
        }

        Ok(Self {
            root,
            config,
            sessions,
            offsets,
        })
    }

    /// Total frames across the included sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        *self.offsets.last().unwrap_or(&0)
    }

    /// Whether the split holds no frames.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The included sessions, in scan order.
    #[must_use]
    pub fn sessions(&self) -> &[SessionMeta] {
        &self.sessions
    }

    /// The dataset configuration.
    #[must_use]
    pub fn config(&self) -> &DatasetConfig {
        &self.config
    }

    /// Map a flat index to (session index, in-session frame ordinal) via the
    /// cumulative offset table.
    fn locate(&self, index: usize) -> Result<(usize, usize)> {
        if index >= self.len() {
            return Err(PipelineError::IndexOutOfRange {
                index,
                len: self.len(),
            });
        }
        let session = self.offsets.partition_point(|&start| start <= index) - 1;
        Ok((session, index - self.offsets[session]))
    }

    /// Load one training example.
    ///
    /// With randomized augmentation enabled, a fresh parameter value is
    /// sampled for this call; concurrent callers never share mutable
    /// augmentation state.
    ///
    /// # Errors
    ///
    /// [`PipelineError::IndexOutOfRange`] past the end of the index, plus any
    /// loader error.
    pub fn get(&self, index: usize) -> Result<TrainingExample> {
        let params = if self.config.randomize_augmentation {
            AugmentationParams::sample(&mut rand::thread_rng())
        } else {
            self.config.augmentation
        };
        self.get_with_params(index, &params)
    }

    /// Load one training example under explicit augmentation parameters.
    ///
    /// # Errors
    ///
    /// Same conditions as [`RecordingDataset::get`].
    pub fn get_with_params(
        &self,
        index: usize,
        params: &AugmentationParams,
    ) -> Result<TrainingExample> {
        let (si, ordinal) = self.locate(index)?;
        let session = &self.sessions[si];

        let frame = load_frame(
            &self.root,
            session,
            ordinal,
            params,
            self.config.mode,
            self.config.encoding,
        )?;

        let size = self.config.output_size;
        let gt = err2gt(&frame.labels, self.config.mode)?;

        Ok(TrainingExample {
            rgb: resize_bilinear(&frame.rgb, size, size),
            depth: resize_bilinear(&frame.depth, size, size),
            overlay: frame.overlay.as_ref().map(|o| resize_plane(o, size, size)),
            pose_2d: frame.pose_2d,
            gt,
            session: frame.session,
        })
    }
}

/// Whether a path names a session metadata file (and not a skeleton file).
fn is_session_file(path: &Path) -> bool {
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case("json"));
    let is_skeleton = path
        .file_stem()
        .is_some_and(|stem| stem.to_string_lossy().ends_with("Skeleton"));
    is_json && !is_skeleton
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_session(dir: &Path, name: &str, frames: usize, exercise: &str) {
        let text = format!(
            r#"{{
                "Name": "{name}",
                "Frames": {frames},
                "Cameras": [{{"FileName": "{name}_cam0"}}],
                "Skeleton": "{name}Skeleton.json",
                "Session Parameters": {{"Exercise": {{"Name": "{exercise}"}}}}
            }}"#
        );
        fs::write(dir.join(format!("{name}.json")), text).unwrap();
    }

    fn recording_root() -> TempDir {
        let dir = TempDir::new().unwrap();
        write_session(dir.path(), "rec_a", 2, "squat");
        write_session(dir.path(), "rec_b", 3, "squat");
        write_session(dir.path(), "rec_c", 4, "lunge");
        // Skeleton files are not session metadata and must be skipped.
        fs::write(dir.path().join("rec_aSkeleton.json"), "[[]]").unwrap();
        dir
    }

    #[test]
    fn test_split_partition_is_exclusive() {
        let root = recording_root();
        let train = RecordingDataset::new(
            root.path(),
            DatasetConfig::new().with_test_exercises(["lunge"]),
        )
        .unwrap();
        let test = RecordingDataset::new(
            root.path(),
            DatasetConfig::new()
                .with_test_exercises(["lunge"])
                .with_split(Split::Test),
        )
        .unwrap();

        assert_eq!(train.sessions().len(), 2);
        assert_eq!(train.len(), 5);
        assert_eq!(test.sessions().len(), 1);
        assert_eq!(test.len(), 4);
        assert!(train
            .sessions()
            .iter()
            .all(|s| s.exercise() != "lunge"));
        assert!(test.sessions().iter().all(|s| s.exercise() == "lunge"));
    }

    #[test]
    fn test_locate_with_unequal_session_lengths() {
        let root = recording_root();
        let dataset = RecordingDataset::new(
            root.path(),
            DatasetConfig::new().with_test_exercises(["lunge"]),
        )
        .unwrap();

        // rec_a holds frames 0..2, rec_b frames 2..5.
        assert_eq!(dataset.locate(0).unwrap(), (0, 0));
        assert_eq!(dataset.locate(1).unwrap(), (0, 1));
        assert_eq!(dataset.locate(2).unwrap(), (1, 0));
        assert_eq!(dataset.locate(4).unwrap(), (1, 2));

        let err = dataset.locate(5).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::IndexOutOfRange { index: 5, len: 5 }
        ));
    }

    #[test]
    fn test_malformed_session_fails_construction() {
        let root = recording_root();
        fs::write(root.path().join("rec_d.json"), "{not json").unwrap();
        let err = RecordingDataset::new(root.path(), DatasetConfig::new()).unwrap_err();
        assert!(matches!(err, PipelineError::Metadata(_)));
    }

    #[test]
    fn test_empty_root() {
        let dir = TempDir::new().unwrap();
        let dataset = RecordingDataset::new(dir.path(), DatasetConfig::new()).unwrap();
        assert!(dataset.is_empty());
        assert!(matches!(
            dataset.get(0),
            Err(PipelineError::IndexOutOfRange { .. })
        ));
    }

    #[test]
    fn test_is_session_file() {
        assert!(is_session_file(Path::new("/r/rec_a.json")));
        assert!(!is_session_file(Path::new("/r/rec_aSkeleton.json")));
        assert!(!is_session_file(Path::new("/r/frame_0.bin")));
    }
}
