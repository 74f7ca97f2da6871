// THEORY:
// The `pipeline` module is the top-level per-frame API of the engine. One call
// to `FieldPipeline::tick` runs the whole chain for a single animation frame:
//
//   Frame -> Sampler -> MotionDetector -> ParticleField -> Canvas
//
// and hands back a small `FrameReport` describing what happened.
//
// The pipeline never fails a tick. No frame, an unready frame, or the very first
// frame (no motion history yet) all degrade to a neutral or partial update so
// the animation keeps running whatever the camera is doing. Entering and leaving
// that degraded mode is logged once per transition, not once per frame.
//
// `resize` rebuilds the particle grid, resets the motion history and reallocates
// the canvas in one call, so the next tick always starts from a consistent
// state.

use crate::config::AppConfig;
use crate::core_modules::frame::Frame;
use crate::core_modules::motion_detector::{MotionDetector, MotionField};
use crate::core_modules::particle_field::ParticleField;
use crate::core_modules::renderer::Canvas;
use crate::core_modules::sampler::Sampler;
use crate::error::Result;
use tracing::{debug, info, warn};

/// Where a tick's input came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputState {
    /// A frame was sampled and compared with the previous one.
    Live,
    /// A frame was sampled but there was no usable history to diff against.
    Warmup,
    /// No usable frame; the field animated on neutral input.
    Neutral,
}

/// Motion statistics for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionSummary {
    pub max: f32,
    pub mean: f32,
    pub active_ratio: f32,
}

/// The output of the pipeline for a single frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub frame_index: u64,
    pub input: InputState,
    pub motion: Option<MotionSummary>,
    /// Particles currently reacting to motion.
    pub attracted: usize,
    pub max_speed: f32,
}

pub struct FieldPipeline {
    config: AppConfig,
    sampler: Sampler,
    detector: MotionDetector,
    field: ParticleField,
    canvas: Canvas,
    last_motion: Option<MotionField>,
    frame_index: u64,
    degraded: bool,
}

impl FieldPipeline {
    pub fn new(config: AppConfig, width: u32, height: u32) -> Result<Self> {
        config.validate()?;
        let sampler = Sampler::new(config.field.cols, config.field.rows, config.sampler.mirror);
        let detector = MotionDetector::new(config.motion.clone());
        let field = ParticleField::new(config.field.clone(), width, height);
        let canvas = Canvas::new(width, height, config.render.clone());
        info!(
            width,
            height,
            particles = field.len(),
            "field pipeline ready"
        );
        Ok(Self {
            config,
            sampler,
            detector,
            field,
            canvas,
            last_motion: None,
            frame_index: 0,
            degraded: false,
        })
    }

    /// Runs one animation frame.
    pub fn tick(&mut self, frame: Option<&Frame>) -> FrameReport {
        let samples = frame.and_then(|frame| self.sampler.sample(frame));

        let input = match samples {
            Some(samples) => {
                self.set_degraded(false);
                self.last_motion = self.detector.detect_motion(&samples);
                self.field.step(&samples, self.last_motion.as_ref());
                if self.last_motion.is_some() {
                    InputState::Live
                } else {
                    InputState::Warmup
                }
            }
            None => {
                self.set_degraded(true);
                self.last_motion = None;
                self.field.step_neutral();
                InputState::Neutral
            }
        };

        self.canvas.render(&self.field);

        let report = FrameReport {
            frame_index: self.frame_index,
            input,
            motion: self.last_motion.as_ref().map(|motion| MotionSummary {
                max: motion.max(),
                mean: motion.mean(),
                active_ratio: motion.active_ratio(),
            }),
            attracted: self.field.attracted_count(),
            max_speed: self.field.max_speed(),
        };
        self.frame_index += 1;
        report
    }

    /// Adapts to a new surface size. Particles are rebuilt and the motion
    /// history is dropped before the next tick.
    pub fn resize(&mut self, width: u32, height: u32) {
        debug!(width, height, "resizing field pipeline");
        self.field.rebuild(width, height);
        self.detector.reset();
        self.last_motion = None;
        self.canvas.resize(width, height);
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn field(&self) -> &ParticleField {
        &self.field
    }

    pub fn last_motion(&self) -> Option<&MotionField> {
        self.last_motion.as_ref()
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn frames_processed(&self) -> u64 {
        self.frame_index
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    fn set_degraded(&mut self, degraded: bool) {
        if degraded == self.degraded {
            return;
        }
        self.degraded = degraded;
        if degraded {
            warn!(frame = self.frame_index, "no camera data, animating with neutral input");
        } else {
            info!(frame = self.frame_index, "camera data available");
        }
    }
}
