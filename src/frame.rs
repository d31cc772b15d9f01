// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Binary frame records and the per-frame loader.
//!
//! A frame file is a 16-byte little-endian header (rows, columns, pixel-type
//! tag, channel count) followed by a flat half-precision payload of
//! rows x cols x channels samples. The first three channels are RGB, the rest
//! is depth. [`load_frame`] pairs the raster with the frame's skeleton-error
//! entry, derives the region labels, and applies the crop/flip/blur
//! augmentations.

use std::fs;
use std::path::Path;

use half::f16;
use image::RgbImage;
use ndarray::{s, Array2, Array3};

use crate::augment::AugmentationParams;
use crate::error::{FrameId, PipelineError, Result};
use crate::metadata::SessionMeta;
use crate::mode::Mode;
use crate::preprocess::{
    crop, crop_plane, crop_window, flip_horizontal, flip_plane, gaussian_blur, splat_pose,
    GAUSSIAN_SIGMA,
};
use crate::skeleton::{reduce_skeletons, SkeletonRecord};

/// Recorded skeleton samples per sampled frame. The capture tool writes one
/// frame file and one skeleton entry per raw sample; frames enter the dataset
/// at every tenth sample. Recording-format constant, not a tunable.
pub const SKELETON_SAMPLE_STRIDE: usize = 10;

/// Number of leading raster channels holding RGB.
const RGB_CHANNELS: usize = 3;

/// Byte length of the binary frame header.
const HEADER_LEN: usize = 16;

/// Depth divisor used when rendering previews (meters to display range).
const PREVIEW_DEPTH_SCALE: f32 = 5.0;

/// Which rasters a loaded frame carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameEncoding {
    /// RGB and depth rasters.
    #[default]
    Rgbd,
    /// RGB, depth, and a rasterized pose-overlay plane.
    RgbdPose,
}

impl FrameEncoding {
    /// Whether this encoding carries the pose-overlay raster.
    #[must_use]
    pub const fn has_pose_overlay(&self) -> bool {
        matches!(self, Self::RgbdPose)
    }

    /// String representation used in CLI flags.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Rgbd => "rgbd",
            Self::RgbdPose => "rgbd-pose",
        }
    }
}

impl std::fmt::Display for FrameEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for FrameEncoding {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rgbd" => Ok(Self::Rgbd),
            "rgbd-pose" | "rgbd_pose" | "pose" => Ok(Self::RgbdPose),
            _ => Err(format!("invalid encoding '{s}', expected rgbd or rgbd-pose")),
        }
    }
}

/// One loaded timestep of a recording session.
///
/// Constructed fresh on every dataset access; nothing is cached between
/// accesses.
#[derive(Debug, Clone)]
pub struct Frame {
    /// RGB raster, shape (rows, cols, 3).
    pub rgb: Array3<f32>,
    /// Depth raster, shape (rows, cols, channels - 3).
    pub depth: Array3<f32>,
    /// Pose-overlay raster, present for [`FrameEncoding::RgbdPose`].
    pub overlay: Option<Array2<f32>>,
    /// Anchor-relative projected pose, shape (joints, 3).
    pub pose_2d: Array2<f32>,
    /// Anchor-relative real-world pose, shape (joints, 3).
    pub pose_3d: Array2<f32>,
    /// Region error class indices per the loading mode.
    pub labels: Vec<u8>,
    /// Metadata of the owning session.
    pub session: SessionMeta,
}

impl Frame {
    /// Write an 8-bit preview PNG: RGB beside the normalized depth plane.
    ///
    /// # Errors
    ///
    /// [`PipelineError::Image`] if encoding fails, [`PipelineError::Io`] on
    /// write failure.
    pub fn save_preview(&self, path: &Path) -> Result<()> {
        let (rows, cols, _) = self.rgb.dim();
        #[allow(clippy::cast_possible_truncation)]
        let mut preview = RgbImage::new((cols * 2) as u32, rows as u32);

        for r in 0..rows {
            for c in 0..cols {
                let px = [
                    to_u8(self.rgb[[r, c, 0]]),
                    to_u8(self.rgb[[r, c, 1]]),
                    to_u8(self.rgb[[r, c, 2]]),
                ];
                #[allow(clippy::cast_possible_truncation)]
                preview.put_pixel(c as u32, r as u32, image::Rgb(px));

                let d = to_u8(self.depth[[r, c, 0]] / PREVIEW_DEPTH_SCALE);
                #[allow(clippy::cast_possible_truncation)]
                preview.put_pixel((cols + c) as u32, r as u32, image::Rgb([d, d, d]));
            }
        }

        preview.save(path)?;
        Ok(())
    }
}

fn to_u8(v: f32) -> u8 {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    {
        (v * 255.0).clamp(0.0, 255.0) as u8
    }
}

/// File name of the binary frame record for one raw sample index.
#[must_use]
pub fn frame_file_name(sample: usize) -> String {
    format!("frame_{sample}.bin")
}

/// Read one binary frame record and split it into RGB and depth rasters.
///
/// # Errors
///
/// [`PipelineError::Io`] if the file cannot be read,
/// [`PipelineError::FrameFormat`] if the header is implausible or the payload
/// length does not match it.
pub fn read_frame_record(path: &Path) -> Result<(Array3<f32>, Array3<f32>)> {
    let bytes = fs::read(path)?;
    if bytes.len() < HEADER_LEN {
        return Err(PipelineError::FrameFormat(format!(
            "{}: {} bytes is shorter than the header",
            path.display(),
            bytes.len()
        )));
    }

    let header: Vec<i32> = bytes[..HEADER_LEN]
        .chunks_exact(4)
        .map(|c| i32::from_le_bytes(c.try_into().expect("4-byte chunk")))
        .collect();
    let (rows, cols, _pixel_type, channels) = (header[0], header[1], header[2], header[3]);

    if rows <= 0 || cols <= 0 || channels <= RGB_CHANNELS as i32 {
        return Err(PipelineError::FrameFormat(format!(
            "{}: implausible header {rows}x{cols}x{channels}",
            path.display()
        )));
    }

    #[allow(clippy::cast_sign_loss)]
    let (rows, cols, channels) = (rows as usize, cols as usize, channels as usize);
    let expected = rows * cols * channels * 2;
    let payload = &bytes[HEADER_LEN..];
    if payload.len() != expected {
        return Err(PipelineError::FrameFormat(format!(
            "{}: payload is {} bytes, header implies {expected}",
            path.display(),
            payload.len()
        )));
    }

    let samples: Vec<f32> = payload
        .chunks_exact(2)
        .map(|c| f16::from_le_bytes([c[0], c[1]]).to_f32())
        .collect();
    let raster =
        Array3::from_shape_vec((rows, cols, channels), samples).expect("raster shape");

    let rgb = raster.slice(s![.., .., ..RGB_CHANNELS]).to_owned();
    let depth = raster.slice(s![.., .., RGB_CHANNELS..]).to_owned();
    Ok((rgb, depth))
}

/// Load one frame of a session: raster, pose, labels, and augmentations.
///
/// Reads the binary frame record and the skeleton-error entry at the
/// stride-10 sample index, reduces the skeleton into labels and bounding
/// boxes, then applies bounding-box cropping, the horizontal mirror, and the
/// Gaussian blur as requested by `params`. The skeleton file is re-read on
/// every call.
///
/// # Errors
///
/// Any of the loader's typed conditions: IO and format errors for the frame
/// record, [`PipelineError::Skeleton`] for a missing skeleton entry, plus the
/// reduction and cropping errors.
pub fn load_frame(
    recording_dir: &Path,
    session: &SessionMeta,
    ordinal: usize,
    params: &AugmentationParams,
    mode: Mode,
    encoding: FrameEncoding,
) -> Result<Frame> {
    let camera = session.cameras.first().ok_or_else(|| {
        PipelineError::Metadata(format!("session '{}' has no cameras", session.name))
    })?;

    let sample = ordinal * SKELETON_SAMPLE_STRIDE;
    let frame_path = recording_dir
        .join(&camera.file_name)
        .join(frame_file_name(sample));
    let (mut rgb, mut depth) = read_frame_record(&frame_path)?;

    let skeleton_path = recording_dir.join(&session.skeleton);
    let text = fs::read_to_string(&skeleton_path)?;
    let entries: Vec<Vec<SkeletonRecord>> = serde_json::from_str(&text)?;
    let candidates = entries.get(sample).ok_or_else(|| {
        PipelineError::Skeleton(format!(
            "{}: no entry for sample {sample} (frame {ordinal})",
            skeleton_path.display()
        ))
    })?;

    let id = FrameId {
        session: &session.name,
        ordinal,
    };
    let reduction = reduce_skeletons(candidates, params.flip, mode, id)?;

    let (rows, cols, _) = rgb.dim();
    let mut overlay = encoding
        .has_pose_overlay()
        .then(|| splat_pose(&reduction.joints_px, rows, cols));

    if params.crop || params.crop_random {
        let mut rng = params.rng();
        let window = crop_window(&reduction.bbox_2d, rows, cols, params, &mut rng, id)?;
        rgb = crop(&rgb, window);
        depth = crop(&depth, window);
        overlay = overlay.map(|o| crop_plane(&o, window));
    }

    if params.flip {
        rgb = flip_horizontal(&rgb);
        depth = flip_horizontal(&depth);
        overlay = overlay.map(|o| flip_plane(&o));
    }

    if params.gaussian {
        rgb = gaussian_blur(&rgb, GAUSSIAN_SIGMA);
        depth = gaussian_blur(&depth, GAUSSIAN_SIGMA);
    }

    Ok(Frame {
        rgb,
        depth,
        overlay,
        pose_2d: reduction.pose_2d,
        pose_3d: reduction.pose_3d,
        labels: reduction.labels,
        session: session.clone(),
    })
}
