//! Pick the "best" image from a batch.
//!
//! The heuristic averages each color channel separately and scores an
//! image by the mean of those three channel averages. The brightest image
//! wins; ties go to the earliest one.

use crate::error::{LetzError, Result};
use crate::tensor::{ImageBatch, CHANNELS};

/// Per-channel mean brightness of a flat RGB slice.
pub fn channel_means(pixels: &[f32]) -> [f32; CHANNELS] {
    let mut sums = [0.0f64; CHANNELS];
    let mut count = 0usize;
    for px in pixels.chunks_exact(CHANNELS) {
        for (sum, &v) in sums.iter_mut().zip(px) {
            *sum += f64::from(v);
        }
        count += 1;
    }
    if count == 0 {
        return [0.0; CHANNELS];
    }
    sums.map(|s| (s / count as f64) as f32)
}

/// Brightness score of one image: mean of its channel means.
pub fn brightness(pixels: &[f32]) -> f32 {
    let means = channel_means(pixels);
    means.iter().sum::<f32>() / CHANNELS as f32
}

/// Index of the brightest image in `batch`.
pub fn best_index(batch: &ImageBatch) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for idx in 0..batch.len() {
        let score = batch.image(idx).map(brightness).unwrap_or(0.0);
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((idx, score)),
        }
    }
    best.map(|(idx, _)| idx)
}

/// Return a single-image batch holding the brightest image.
pub fn select_best(batch: &ImageBatch) -> Result<ImageBatch> {
    best_index(batch)
        .and_then(|idx| batch.select(idx))
        .ok_or_else(|| LetzError::InvalidInput("Image batch is empty".into()))
}
