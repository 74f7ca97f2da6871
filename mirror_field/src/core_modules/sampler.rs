// THEORY:
// The `Sampler` reduces a full camera frame to a small fixed grid of colour
// samples (one per particle cell). It plays the role of drawing the video into
// a tiny offscreen canvas and reading the pixels back: the frame is scaled
// into a `cols x rows` buffer with the `image` crate and the raw RGBA bytes of
// that buffer become the `SampleGrid`.
//
// Key principles:
// 1.  **No data is not an error**: a frame with zero width or height (camera not
//     ready) yields `None` and the caller animates with neutral input.
// 2.  **Mirroring happens in the draw step**: for a self-facing camera the scaled
//     buffer is flipped horizontally before readback, so no downstream math
//     ever needs to know about it.

use crate::core_modules::frame::Frame;
use crate::core_modules::pixel::pixel::{self, Pixel};
use crate::error::{FieldError, Result};
use image::imageops::{self, FilterType};
use image::{ImageBuffer, Rgba};

/// A downsampled `cols x rows` RGBA grid.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleGrid {
    cols: u32,
    rows: u32,
    data: Vec<u8>,
}

impl SampleGrid {
    pub fn from_rgba(cols: u32, rows: u32, data: Vec<u8>) -> Result<Self> {
        let expected = cols as usize * rows as usize * pixel::CHANNELS;
        if data.len() != expected {
            return Err(FieldError::MalformedFrame {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { cols, rows, data })
    }

    /// A grid with every cell set to the same colour.
    pub fn uniform(cols: u32, rows: u32, rgba: [u8; 4]) -> Self {
        let data = rgba
            .iter()
            .copied()
            .cycle()
            .take(cols as usize * rows as usize * pixel::CHANNELS)
            .collect();
        Self { cols, rows, data }
    }

    pub fn cols(&self) -> u32 {
        self.cols
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.cols, self.rows)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.cols as usize * self.rows as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The sample at a cell. Out-of-range cells read as a default (black) pixel.
    pub fn pixel(&self, col: u32, row: u32) -> Pixel {
        if col >= self.cols || row >= self.rows {
            return Pixel::default();
        }
        let i = (row as usize * self.cols as usize + col as usize) * pixel::CHANNELS;
        pixel::from_rgba(&self.data[i..]).unwrap_or_default()
    }

    pub fn brightness(&self, col: u32, row: u32) -> f32 {
        self.pixel(col, row).brightness()
    }

    pub fn pixels(&self) -> impl Iterator<Item = Pixel> + '_ {
        self.data
            .chunks_exact(pixel::CHANNELS)
            .filter_map(pixel::from_rgba)
    }
}

/// Scales frames down to the particle grid resolution.
#[derive(Debug, Clone)]
pub struct Sampler {
    cols: u32,
    rows: u32,
    mirror: bool,
}

impl Sampler {
    pub fn new(cols: u32, rows: u32, mirror: bool) -> Self {
        Self { cols, rows, mirror }
    }

    pub fn grid(&self) -> (u32, u32) {
        (self.cols, self.rows)
    }

    pub fn mirror(&self) -> bool {
        self.mirror
    }

    /// Downsamples `frame` to the configured grid.
    ///
    /// Returns `None` while the frame has no pixels or the grid is empty.
    pub fn sample(&self, frame: &Frame) -> Option<SampleGrid> {
        if !frame.is_ready() || self.cols == 0 || self.rows == 0 {
            return None;
        }
        let source: ImageBuffer<Rgba<u8>, &[u8]> =
            ImageBuffer::from_raw(frame.width(), frame.height(), frame.data())?;

        let mut scaled = imageops::resize(&source, self.cols, self.rows, FilterType::Triangle);
        if self.mirror {
            imageops::flip_horizontal_in_place(&mut scaled);
        }

        Some(SampleGrid {
            cols: self.cols,
            rows: self.rows,
            data: scaled.into_raw(),
        })
    }
}
