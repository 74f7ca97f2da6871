// THEORY:
// The `ParticleField` owns every particle on the canvas. It lays them out on a
// regular `cols x rows` grid, one particle centred in each cell, and drives
// them one tick at a time from the sampled brightness and motion of their own
// cell.
//
// Key architectural principles:
// 1.  **Wholesale rebuild**: particles are created in `rebuild` and never
//     individually added or removed. A resize discards the whole set.
// 2.  **Local forcing**: each particle reads only its own cell (and the
//     immediate neighbours for the motion gradient). Particles are pushed from
//     high-motion cells toward calmer ones.
// 3.  **Never stalls**: when the camera has nothing to offer the field keeps
//     animating with neutral input (brightness 100, motion 0).

use crate::config::FieldConfig;
use crate::core_modules::motion_detector::MotionField;
use crate::core_modules::particle::{Particle, ParticleSize, Vec2};
use crate::core_modules::sampler::SampleGrid;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::TAU;
use tracing::debug;

/// Brightness used when no camera sample is available.
pub const NEUTRAL_BRIGHTNESS: f32 = 100.0;
/// Motion used when no motion field is available.
pub const NEUTRAL_MOTION: f32 = 0.0;

pub struct ParticleField {
    config: FieldConfig,
    width: u32,
    height: u32,
    particles: Vec<Particle>,
    rng: StdRng,
    /// Field clock in seconds, drives the idle wave.
    time: f32,
}

impl ParticleField {
    pub fn new(config: FieldConfig, width: u32, height: u32) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut field = Self {
            config,
            width: 0,
            height: 0,
            particles: Vec::new(),
            rng,
            time: 0.0,
        };
        field.rebuild(width, height);
        field
    }

    /// Discards every particle and lays out a fresh grid over `width x height`.
    pub fn rebuild(&mut self, width: u32, height: u32) {
        let cols = self.config.cols;
        let rows = self.config.rows;
        let cell_w = width as f32 / cols as f32;
        let cell_h = height as f32 / rows as f32;

        let mut particles = Vec::with_capacity(cols as usize * rows as usize);
        for row in 0..rows {
            for col in 0..cols {
                let rest = Vec2::new((col as f32 + 0.5) * cell_w, (row as f32 + 0.5) * cell_h);
                let size = ParticleSize::ALL[self.rng.gen_range(0..ParticleSize::ALL.len())];
                let opacity = self.rng.gen_range(0.6..=1.0);
                let phase = self.rng.gen_range(0.0..TAU);
                particles.push(Particle::new((col, row), rest, size, opacity, phase));
            }
        }

        self.width = width;
        self.height = height;
        self.particles = particles;
        debug!(width, height, count = self.particles.len(), "particle field rebuilt");
    }

    /// Adds an external force to one particle. Out-of-range indices are ignored.
    pub fn apply_force(&mut self, index: usize, force: Vec2, motion: f32) {
        if let Some(p) = self.particles.get_mut(index) {
            p.apply_force(force, motion, &self.config);
        }
    }

    /// Advances one particle at the current field time.
    pub fn update(&mut self, index: usize, brightness: f32, motion: f32) {
        let time = self.time;
        if let Some(p) = self.particles.get_mut(index) {
            p.update(brightness, motion, time, &self.config);
        }
    }

    /// One whole-field tick driven by camera samples and, once history
    /// exists, a motion field.
    pub fn step(&mut self, samples: &SampleGrid, motion: Option<&MotionField>) {
        let (cols, rows) = (self.config.cols, self.config.rows);
        let time = self.time;
        let config = &self.config;

        for p in self.particles.iter_mut() {
            let (col, row) = p.cell;
            let brightness = if samples.is_empty() {
                NEUTRAL_BRIGHTNESS
            } else {
                let (sc, sr) = map_cell(col, row, cols, rows, samples.cols(), samples.rows());
                samples.brightness(sc, sr)
            };

            let (force, value) = match motion {
                Some(field) if field.cols() > 0 && field.rows() > 0 => {
                    let (mc, mr) = map_cell(col, row, cols, rows, field.cols(), field.rows());
                    let (mc, mr) = (mc as i64, mr as i64);
                    let gx = field.get(mc + 1, mr) - field.get(mc - 1, mr);
                    let gy = field.get(mc, mr + 1) - field.get(mc, mr - 1);
                    let force = Vec2::new(-gx, -gy) * (config.force_scale * 0.5);
                    (force, field.get(mc, mr))
                }
                _ => (Vec2::ZERO, NEUTRAL_MOTION),
            };

            p.apply_force(force, value, config);
            p.update(brightness, value, time, config);
        }

        self.time += self.config.time_step;
    }

    /// A tick with no camera input at all.
    pub fn step_neutral(&mut self) {
        for index in 0..self.particles.len() {
            self.apply_force(index, Vec2::ZERO, NEUTRAL_MOTION);
            self.update(index, NEUTRAL_BRIGHTNESS, NEUTRAL_MOTION);
        }
        self.time += self.config.time_step;
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn attracted_count(&self) -> usize {
        self.particles.iter().filter(|p| p.attracted).count()
    }

    pub fn max_speed(&self) -> f32 {
        self.particles.iter().map(Particle::speed).fold(0.0, f32::max)
    }

    /// Pixel bounds `(x0, y0, x1, y1)` of a grid cell.
    pub fn cell_bounds(&self, col: u32, row: u32) -> (f32, f32, f32, f32) {
        let cell_w = self.width as f32 / self.config.cols as f32;
        let cell_h = self.height as f32 / self.config.rows as f32;
        (
            col as f32 * cell_w,
            row as f32 * cell_h,
            (col + 1) as f32 * cell_w,
            (row + 1) as f32 * cell_h,
        )
    }
}

/// Maps a particle cell onto a grid of a possibly different resolution.
fn map_cell(col: u32, row: u32, cols: u32, rows: u32, to_cols: u32, to_rows: u32) -> (u32, u32) {
    if cols == to_cols && rows == to_rows {
        return (col, row);
    }
    let c = (col as u64 * to_cols as u64 / cols.max(1) as u64) as u32;
    let r = (row as u64 * to_rows as u64 / rows.max(1) as u64) as u32;
    (c.min(to_cols.saturating_sub(1)), r.min(to_rows.saturating_sub(1)))
}
