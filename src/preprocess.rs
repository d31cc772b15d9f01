// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Raster geometry for frame loading.
//!
//! Cropping is driven by the skeleton bounding box: the crop window is a
//! square sized from the box plus a padding margin, fitted against the image
//! edges with an edge-aware policy that transfers clipped padding to the
//! opposite side. The module also provides the horizontal mirror, the
//! Gaussian-blur augmentation, the pose-overlay raster, and the bilinear
//! resize used to bring cropped rasters to the training size.

#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss
)]

use image::{ImageBuffer, Luma};
use ndarray::{s, Array2, Array3};
use rand::Rng;

use crate::augment::AugmentationParams;
use crate::error::{FrameId, PipelineError, Result};
use crate::skeleton::BoundingBox;

/// Half-width of the pose-overlay splat square (7x7 pixels).
const SPLAT_RADIUS: i64 = 3;

/// Value written into the pose-overlay raster at joint locations.
const OVERLAY_VALUE: f32 = 1.0;

/// Standard deviation of the Gaussian-blur augmentation.
pub const GAUSSIAN_SIGMA: f32 = 1.1;

/// A crop window in pixel coordinates, rows `row0..row1`, columns
/// `col0..col1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropWindow {
    /// First row of the window.
    pub row0: usize,
    /// One past the last row.
    pub row1: usize,
    /// First column of the window.
    pub col0: usize,
    /// One past the last column.
    pub col1: usize,
}

impl CropWindow {
    /// Window width in pixels.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.col1 - self.col0
    }

    /// Window height in pixels.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.row1 - self.row0
    }
}

/// Grow (or shrink, for negative padding) the interval `[mi, ma)` by
/// `pad_before` on the low side and `pad_after` on the high side, keeping it
/// inside `[min_bound, max_bound]`.
///
/// When a side would leave the bounds it is clamped there; with `overflow`
/// set, the clipped amount transfers to the opposite side, so the interval
/// width is preserved whenever the bounds are wide enough to hold it.
#[must_use]
pub fn pad(
    mi: i64,
    ma: i64,
    pad_before: i64,
    pad_after: i64,
    min_bound: i64,
    max_bound: i64,
    overflow: bool,
) -> (i64, i64) {
    let mut lo = mi - pad_before;
    let mut hi = ma + pad_after;

    if lo < min_bound {
        if overflow {
            hi += min_bound - lo;
        }
        lo = min_bound;
    }
    if hi > max_bound {
        if overflow {
            lo -= hi - max_bound;
        }
        hi = max_bound;
    }
    // The transfer itself may have pushed past the low bound again.
    if lo < min_bound {
        lo = min_bound;
    }

    (lo, hi)
}

/// Pad one axis of the bounding box out to `target` pixels within `[0, dim)`.
fn pad_axis<R: Rng + ?Sized>(
    min_v: f32,
    max_v: f32,
    target: i64,
    dim: i64,
    random: bool,
    rng: &mut R,
) -> (i64, i64) {
    let mut mi = (min_v.floor() as i64).clamp(0, dim);
    let mut ma = (max_v.ceil() as i64).clamp(0, dim);
    if ma < mi {
        mi = 0;
        ma = dim;
    }

    let total = target - (ma - mi);
    let (before, after) = if random && total > 0 {
        let before = rng.gen_range(0..=total);
        (before, total - before)
    } else {
        (total / 2, total - total / 2)
    };

    pad(mi, ma, before, after, 0, dim, true)
}

/// Compute the square crop window for one frame.
///
/// The target side is the bounding-box extent plus the crop padding, clamped
/// to the smaller image dimension. The deterministic policy pads the box
/// symmetrically; with `crop_random` the padding slack is split at a seeded
/// random offset instead.
///
/// # Errors
///
/// [`PipelineError::UnsquareCrop`] if the image cannot hold a square window
/// (zero-sized image) or the equalization pass fails to square the window.
pub fn crop_window<R: Rng + ?Sized>(
    bbox: &BoundingBox,
    rows: usize,
    cols: usize,
    params: &AugmentationParams,
    rng: &mut R,
    id: FrameId<'_>,
) -> Result<CropWindow> {
    let rows_i = rows as i64;
    let cols_i = cols as i64;
    let limit = rows_i.min(cols_i);
    if limit < 1 {
        return Err(PipelineError::UnsquareCrop {
            session: id.session.to_string(),
            frame: id.ordinal,
            width: cols,
            height: rows,
        });
    }

    let target = if bbox.is_empty() {
        limit
    } else {
        let side = bbox.width().max(bbox.height()).floor() as i64;
        (side + i64::from(params.crop_pad)).clamp(1, limit)
    };

    let (mut col0, mut col1) = pad_axis(
        bbox.min[0],
        bbox.max[0],
        target,
        cols_i,
        params.crop_random,
        rng,
    );
    let (mut row0, mut row1) = pad_axis(
        bbox.min[1],
        bbox.max[1],
        target,
        rows_i,
        params.crop_random,
        rng,
    );

    // Best-effort equalization when the axes came out unequal.
    let width = col1 - col0;
    let height = row1 - row0;
    if width < height {
        let (lo, hi) = pad(col0, col1, 0, height - width, 0, cols_i, true);
        col0 = lo;
        col1 = hi;
    } else if height < width {
        let (lo, hi) = pad(row0, row1, 0, width - height, 0, rows_i, true);
        row0 = lo;
        row1 = hi;
    }

    if col1 - col0 != row1 - row0 {
        return Err(PipelineError::UnsquareCrop {
            session: id.session.to_string(),
            frame: id.ordinal,
            width: (col1 - col0) as usize,
            height: (row1 - row0) as usize,
        });
    }

    Ok(CropWindow {
        row0: row0 as usize,
        row1: row1 as usize,
        col0: col0 as usize,
        col1: col1 as usize,
    })
}

/// Crop a (rows, cols, channels) raster to the window.
#[must_use]
pub fn crop(src: &Array3<f32>, window: CropWindow) -> Array3<f32> {
    src.slice(s![window.row0..window.row1, window.col0..window.col1, ..])
        .to_owned()
}

/// Crop a single-plane raster to the window.
#[must_use]
pub fn crop_plane(src: &Array2<f32>, window: CropWindow) -> Array2<f32> {
    src.slice(s![window.row0..window.row1, window.col0..window.col1])
        .to_owned()
}

/// Mirror a (rows, cols, channels) raster left-to-right.
#[must_use]
pub fn flip_horizontal(src: &Array3<f32>) -> Array3<f32> {
    src.slice(s![.., ..;-1, ..]).to_owned()
}

/// Mirror a single-plane raster left-to-right.
#[must_use]
pub fn flip_plane(src: &Array2<f32>) -> Array2<f32> {
    src.slice(s![.., ..;-1]).to_owned()
}

/// Blur every channel of a raster with a Gaussian of deviation `sigma`.
#[must_use]
pub fn gaussian_blur(src: &Array3<f32>, sigma: f32) -> Array3<f32> {
    let (rows, cols, channels) = src.dim();
    let mut out = Array3::zeros((rows, cols, channels));
    if rows == 0 || cols == 0 {
        return out;
    }

    for c in 0..channels {
        let plane: Vec<f32> = src.slice(s![.., .., c]).iter().copied().collect();
        let img = ImageBuffer::<Luma<f32>, Vec<f32>>::from_raw(cols as u32, rows as u32, plane)
            .expect("plane buffer size");
        let blurred = imageproc::filter::gaussian_blur_f32(&img, sigma);
        let data = blurred.into_raw();
        for r in 0..rows {
            for cc in 0..cols {
                out[[r, cc, c]] = data[r * cols + cc];
            }
        }
    }
    out
}

/// Rasterize joint locations: a 7x7 maximum-value square at every projected
/// joint position, clamped to the image bounds.
#[must_use]
pub fn splat_pose(joints_px: &[(f32, f32)], rows: usize, cols: usize) -> Array2<f32> {
    let mut overlay = Array2::zeros((rows, cols));
    let rows_i = rows as i64;
    let cols_i = cols as i64;

    for &(u, v) in joints_px {
        let cu = u.round() as i64;
        let cv = v.round() as i64;
        for dv in -SPLAT_RADIUS..=SPLAT_RADIUS {
            for du in -SPLAT_RADIUS..=SPLAT_RADIUS {
                let r = cv + dv;
                let c = cu + du;
                if r >= 0 && r < rows_i && c >= 0 && c < cols_i {
                    overlay[[r as usize, c as usize]] = OVERLAY_VALUE;
                }
            }
        }
    }
    overlay
}

/// Per-destination-index source sampling positions for one axis.
fn axis_lut(dst: usize, src: usize) -> Vec<(usize, usize, f32)> {
    let scale = src as f32 / dst as f32;
    (0..dst)
        .map(|d| {
            let s = ((d as f32 + 0.5) * scale - 0.5).max(0.0);
            let i0 = (s.floor() as usize).min(src - 1);
            let frac = (s - i0 as f32).clamp(0.0, 1.0);
            let i1 = (i0 + 1).min(src - 1);
            (i0, i1, frac)
        })
        .collect()
}

/// Bilinear resize of a (rows, cols, channels) raster.
#[must_use]
pub fn resize_bilinear(src: &Array3<f32>, rows: usize, cols: usize) -> Array3<f32> {
    let (src_rows, src_cols, channels) = src.dim();
    let mut out = Array3::zeros((rows, cols, channels));
    if src_rows == 0 || src_cols == 0 {
        return out;
    }

    let row_lut = axis_lut(rows, src_rows);
    let col_lut = axis_lut(cols, src_cols);

    for r in 0..rows {
        let (y0, y1, fy) = row_lut[r];
        for c in 0..cols {
            let (x0, x1, fx) = col_lut[c];
            for k in 0..channels {
                let p00 = src[[y0, x0, k]];
                let p10 = src[[y0, x1, k]];
                let p01 = src[[y1, x0, k]];
                let p11 = src[[y1, x1, k]];
                let top = p00 * (1.0 - fx) + p10 * fx;
                let bottom = p01 * (1.0 - fx) + p11 * fx;
                out[[r, c, k]] = top * (1.0 - fy) + bottom * fy;
            }
        }
    }
    out
}

/// Bilinear resize of a single-plane raster.
#[must_use]
pub fn resize_plane(src: &Array2<f32>, rows: usize, cols: usize) -> Array2<f32> {
    let (src_rows, src_cols) = src.dim();
    let mut out = Array2::zeros((rows, cols));
    if src_rows == 0 || src_cols == 0 {
        return out;
    }

    let row_lut = axis_lut(rows, src_rows);
    let col_lut = axis_lut(cols, src_cols);

    for r in 0..rows {
        let (y0, y1, fy) = row_lut[r];
        for c in 0..cols {
            let (x0, x1, fx) = col_lut[c];
            let top = src[[y0, x0]] * (1.0 - fx) + src[[y0, x1]] * fx;
            let bottom = src[[y1, x0]] * (1.0 - fx) + src[[y1, x1]] * fx;
            out[[r, c]] = top * (1.0 - fy) + bottom * fy;
        }
    }
    out
}
