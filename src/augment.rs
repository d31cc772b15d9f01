// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Per-access augmentation parameters.
//!
//! Parameters are plain immutable values: a dataset holds a base value and,
//! when randomization is on, constructs a fresh sample for every access.
//! Nothing is resampled in place, so concurrent `get` calls never share
//! mutable augmentation state.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Upper bound (exclusive) for sampled crop padding, in pixels.
pub const CROP_PAD_RANGE: u32 = 100;

/// Upper bound (exclusive) for sampled crop seeds.
pub const SEED_RANGE: i64 = 100_000;

/// Augmentation applied to one frame access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AugmentationParams {
    /// Mirror the image, pose, and labels left-to-right.
    pub flip: bool,
    /// Crop to the skeleton bounding box with deterministic padding.
    pub crop: bool,
    /// Crop with the padding slack split at random instead of symmetrically.
    pub crop_random: bool,
    /// Pixel margin added around the bounding box before cropping.
    pub crop_pad: u32,
    /// Blur the RGB and depth rasters after cropping.
    pub gaussian: bool,
    /// Seed for the crop randomness; negative draws a fresh seed per access.
    pub seed: i64,
}

impl AugmentationParams {
    /// Draw a fresh parameter value for one access.
    pub fn sample<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            flip: rng.gen_bool(0.5),
            crop: false,
            crop_random: rng.gen_bool(0.5),
            crop_pad: rng.gen_range(0..CROP_PAD_RANGE),
            gaussian: rng.gen_bool(0.5),
            seed: rng.gen_range(0..SEED_RANGE),
        }
    }

    /// RNG for the crop randomness: seeded reproducibly when `seed` is
    /// non-negative, from OS entropy otherwise.
    #[must_use]
    pub fn rng(&self) -> StdRng {
        if self.seed < 0 {
            StdRng::from_entropy()
        } else {
            #[allow(clippy::cast_sign_loss)]
            StdRng::seed_from_u64(self.seed as u64)
        }
    }
}

impl Default for AugmentationParams {
    fn default() -> Self {
        Self {
            flip: false,
            crop: false,
            crop_random: false,
            crop_pad: 0,
            gaussian: false,
            seed: -1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_identity() {
        let params = AugmentationParams::default();
        assert!(!params.flip);
        assert!(!params.crop);
        assert!(!params.crop_random);
        assert_eq!(params.crop_pad, 0);
        assert!(!params.gaussian);
        assert_eq!(params.seed, -1);
    }

    #[test]
    fn test_sample_ranges() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let params = AugmentationParams::sample(&mut rng);
            assert!(params.crop_pad < CROP_PAD_RANGE);
            assert!(params.seed >= 0 && params.seed < SEED_RANGE);
            // Plain crop is never sampled on; only crop_random toggles.
            assert!(!params.crop);
        }
    }

    #[test]
    fn test_sample_is_deterministic_per_seed() {
        let a = AugmentationParams::sample(&mut StdRng::seed_from_u64(42));
        let b = AugmentationParams::sample(&mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_rng_reproducible_for_fixed_seed() {
        let params = AugmentationParams {
            seed: 1234,
            ..AugmentationParams::default()
        };
        let a: u64 = params.rng().gen();
        let b: u64 = params.rng().gen();
        assert_eq!(a, b);
    }
}
