//! Aesthetic scoring seam.
//!
//! The folder walker never knows how an image is judged: it hands raw file
//! bytes to an [`AestheticScorer`] and gets back a number in `[0, 1]`. Model
//! backed scorers live outside this crate and plug in through the trait.
//!
//! [`ContrastScorer`] is the built-in baseline used by the CLI: RMS
//! luminance contrast computed with the `image` crate's pure-Rust decoders
//! (JPEG, PNG, TIFF, WebP, BMP). HEIF and AVIF files have no decoder here and
//! fail with [`ScoreError::Decode`], which the walker counts as a skip.

use image::DynamicImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScoreError {
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Score {0} outside [0, 1]")]
    OutOfRange(f64),
}

/// Scores image bytes on a `[0, 1]` scale, higher is better.
///
/// Implementations are called concurrently from worker threads and must not
/// panic on undecodable input; return `Err` instead.
pub trait AestheticScorer: Send + Sync {
    fn score(&self, image: &[u8]) -> Result<f64, ScoreError>;
}

/// Check that a scorer's output is a finite number in `[0, 1]`.
pub fn validate_score(score: f64) -> Result<f64, ScoreError> {
    if score.is_finite() && (0.0..=1.0).contains(&score) {
        Ok(score)
    } else {
        Err(ScoreError::OutOfRange(score))
    }
}

/// Longest edge the contrast is measured at. Larger images are downscaled.
const MAX_EDGE: u32 = 512;

/// RMS contrast of the luminance channel, normalised so a half-black,
/// half-white image scores 1.0 and a flat image scores 0.0.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContrastScorer;

impl AestheticScorer for ContrastScorer {
    fn score(&self, image: &[u8]) -> Result<f64, ScoreError> {
        let img = image::load_from_memory(image).map_err(|e| ScoreError::Decode(e.to_string()))?;
        Ok(rms_contrast(&downscale(img)))
    }
}

fn downscale(img: DynamicImage) -> DynamicImage {
    if img.width() > MAX_EDGE || img.height() > MAX_EDGE {
        img.thumbnail(MAX_EDGE, MAX_EDGE)
    } else {
        img
    }
}

fn rms_contrast(img: &DynamicImage) -> f64 {
    let luma = img.to_luma8();
    let n = luma.as_raw().len();
    if n == 0 {
        return 0.0;
    }
    let mean = luma.as_raw().iter().map(|&p| f64::from(p)).sum::<f64>() / n as f64;
    let variance = luma
        .as_raw()
        .iter()
        .map(|&p| (f64::from(p) - mean).powi(2))
        .sum::<f64>()
        / n as f64;
    (variance.sqrt() / 127.5).clamp(0.0, 1.0)
}
