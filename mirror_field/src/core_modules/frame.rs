// THEORY:
// A `Frame` is one captured camera image as a raw RGBA buffer. It is replaced
// every tick and never persisted. The engine never talks to a camera directly;
// it pulls frames through the `FrameSource` trait so the whole pipeline can be
// driven by synthetic input in tests, and a denied camera is just a source that
// never yields data.
//
// A zero-sized frame is legal and means "camera not ready yet". A buffer whose
// length disagrees with its dimensions is a construction error.

use crate::error::{FieldError, Result};

/// A captured RGBA8 image.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Frame {
    /// Wraps an RGBA buffer, checking that its length matches the dimensions.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(FieldError::MalformedFrame {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// A frame filled with a single colour.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let data = rgba
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self {
            width,
            height,
            data,
        }
    }

    /// A frame that has not received any camera data yet.
    pub fn empty() -> Self {
        Self {
            width: 0,
            height: 0,
            data: Vec::new(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn is_ready(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// Anything that can deliver camera frames to the render loop.
///
/// `None` means no data this tick; callers keep animating with neutral input.
pub trait FrameSource {
    fn next_frame(&mut self) -> Option<Frame>;
}

/// The source used when capture permission is denied or no camera exists.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeniedSource;

impl FrameSource for DeniedSource {
    fn next_frame(&mut self) -> Option<Frame> {
        None
    }
}

/// A dark frame with a bright square sweeping left to right.
///
/// Gives the motion detector something to chew on without a camera.
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    width: u32,
    height: u32,
    blob_size: u32,
    speed: u32,
    tick: u32,
}

impl SyntheticSource {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            blob_size: (width.min(height) / 5).max(1),
            speed: (width / 60).max(1),
            tick: 0,
        }
    }
}

impl FrameSource for SyntheticSource {
    fn next_frame(&mut self) -> Option<Frame> {
        let mut frame = Frame::filled(self.width, self.height, [16, 16, 24, 255]);
        let travel = self.width.saturating_sub(self.blob_size).max(1);
        let x0 = self.tick.wrapping_mul(self.speed) % travel;
        let y0 = self.height.saturating_sub(self.blob_size) / 2;
        for y in y0..(y0 + self.blob_size).min(self.height) {
            for x in x0..(x0 + self.blob_size).min(self.width) {
                let i = (y as usize * self.width as usize + x as usize) * 4;
                frame.data[i..i + 4].copy_from_slice(&[240, 230, 220, 255]);
            }
        }
        self.tick = self.tick.wrapping_add(1);
        Some(frame)
    }
}
