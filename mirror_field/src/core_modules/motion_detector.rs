// THEORY:
// The `MotionDetector` is the temporal layer of the engine. It holds exactly one
// frame of memory, the previous `SampleGrid`, and turns the difference between
// that reference and the current grid into a `MotionField`.
//
// Key principles:
// 1.  **Insufficient history is a state, not an error**: the first call stores the
//     reference and returns `None`.
// 2.  **Noise gate + amplification**: per-cell intensity is the mean absolute RGB
//     difference; values at or below the noise threshold are zeroed, values above
//     it are multiplied by the amplification factor.
// 3.  **Always advance the reference**: the current grid replaces the reference
//     before returning, so the next call diffs against this tick.
// 4.  **Resolution changes reset**: a grid with different dimensions from the
//     reference is never diffed; it becomes the new reference and `None` is
//     returned.

use crate::config::MotionConfig;
use crate::core_modules::sampler::SampleGrid;
use image::RgbaImage;
use tracing::debug;

/// Per-cell motion intensity for one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionField {
    cols: u32,
    rows: u32,
    intensities: Vec<f32>,
}

impl MotionField {
    /// A field with no motion anywhere.
    pub fn still(cols: u32, rows: u32) -> Self {
        Self {
            cols,
            rows,
            intensities: vec![0.0; cols as usize * rows as usize],
        }
    }

    pub fn cols(&self) -> u32 {
        self.cols
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn intensities(&self) -> &[f32] {
        &self.intensities
    }

    /// Intensity at a cell, clamped to the grid edge.
    pub fn get(&self, col: i64, row: i64) -> f32 {
        if self.cols == 0 || self.rows == 0 {
            return 0.0;
        }
        let c = col.clamp(0, self.cols as i64 - 1) as usize;
        let r = row.clamp(0, self.rows as i64 - 1) as usize;
        self.intensities[r * self.cols as usize + c]
    }

    pub fn max(&self) -> f32 {
        self.intensities.iter().copied().fold(0.0, f32::max)
    }

    pub fn mean(&self) -> f32 {
        if self.intensities.is_empty() {
            return 0.0;
        }
        self.intensities.iter().sum::<f32>() / self.intensities.len() as f32
    }

    /// Fraction of cells with any motion.
    pub fn active_ratio(&self) -> f32 {
        if self.intensities.is_empty() {
            return 0.0;
        }
        let active = self.intensities.iter().filter(|v| **v > 0.0).count();
        active as f32 / self.intensities.len() as f32
    }

    /// The field as a grey RGBA buffer: intensity replicated across R, G and B,
    /// saturated at 255, alpha opaque.
    pub fn to_rgba(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.intensities.len() * 4);
        for v in &self.intensities {
            let level = v.round().clamp(0.0, 255.0) as u8;
            out.extend_from_slice(&[level, level, level, 255]);
        }
        out
    }

    pub fn to_image(&self) -> Option<RgbaImage> {
        RgbaImage::from_raw(self.cols, self.rows, self.to_rgba())
    }
}

/// Diffs each sample grid against the previous one.
#[derive(Debug, Clone)]
pub struct MotionDetector {
    config: MotionConfig,
    reference: Option<SampleGrid>,
}

impl MotionDetector {
    pub fn new(config: MotionConfig) -> Self {
        Self {
            config,
            reference: None,
        }
    }

    /// Forgets the reference frame. The next call returns `None`.
    pub fn reset(&mut self) {
        self.reference = None;
    }

    pub fn has_reference(&self) -> bool {
        self.reference.is_some()
    }

    pub fn detect_motion(&mut self, current: &SampleGrid) -> Option<MotionField> {
        let previous = match self.reference.replace(current.clone()) {
            Some(previous) => previous,
            None => return None,
        };

        if previous.dimensions() != current.dimensions() {
            debug!(
                from = ?previous.dimensions(),
                to = ?current.dimensions(),
                "sample grid resolution changed, motion reference reset"
            );
            return None;
        }

        let intensities = current
            .pixels()
            .zip(previous.pixels())
            .map(|(now, before)| {
                let intensity = now.mean_abs_difference(&before);
                if intensity > self.config.noise_threshold {
                    intensity * self.config.amplification
                } else {
                    0.0
                }
            })
            .collect();

        Some(MotionField {
            cols: current.cols(),
            rows: current.rows(),
            intensities,
        })
    }
}
