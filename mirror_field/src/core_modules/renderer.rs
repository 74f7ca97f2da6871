// THEORY:
// The renderer is a tiny software canvas. Each particle is drawn as a radial
// gradient whose base colour depends on how far down the canvas it sits
// (warm at the top, cool at the bottom) and whose opacity is boosted while the
// particle is attracted.
//
// Particles are drawn with additive blending so overlapping particles brighten
// instead of occluding each other. That blend mode must never leak into other
// canvas operations (the background fade in particular), so it is only ever
// active inside `with_blend`, which restores the previous mode on the way out.

use crate::config::RenderConfig;
use crate::core_modules::particle::Particle;
use crate::core_modules::particle_field::ParticleField;
use crate::error::Result;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, Rgba, RgbaImage};
use std::io::BufWriter;
use std::path::Path;

/// How a drawn colour combines with what is already on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendMode {
    /// Ordinary alpha compositing.
    #[default]
    SourceOver,
    /// Colour is added on top; overlaps brighten.
    Additive,
}

/// Gradient stops as (fraction of radius, fraction of opacity).
const GRADIENT_STOPS: [(f32, f32); 3] = [(0.0, 1.0), (0.4, 0.5), (1.0, 0.0)];

pub struct Canvas {
    image: RgbaImage,
    blend: BlendMode,
    config: RenderConfig,
}

impl Canvas {
    pub fn new(width: u32, height: u32, config: RenderConfig) -> Self {
        let [r, g, b] = config.background;
        Self {
            image: RgbaImage::from_pixel(width, height, Rgba([r, g, b, 255])),
            blend: BlendMode::default(),
            config,
        }
    }

    /// Reallocates the canvas, clearing it to the background colour.
    pub fn resize(&mut self, width: u32, height: u32) {
        let [r, g, b] = self.config.background;
        self.image = RgbaImage::from_pixel(width, height, Rgba([r, g, b, 255]));
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn blend_mode(&self) -> BlendMode {
        self.blend
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.image.get_pixel(x, y).0
    }

    /// Runs `draw` with `mode` active, then restores the previous mode.
    pub fn with_blend<R>(&mut self, mode: BlendMode, draw: impl FnOnce(&mut Self) -> R) -> R {
        let previous = std::mem::replace(&mut self.blend, mode);
        let out = draw(self);
        self.blend = previous;
        out
    }

    /// Draws the background colour over everything at the configured opacity.
    pub fn fade(&mut self) {
        let color = self.config.background;
        let alpha = self.config.fade_alpha.clamp(0.0, 1.0);
        self.with_blend(BlendMode::SourceOver, |canvas| {
            for pixel in canvas.image.pixels_mut() {
                blend_into(pixel, color, alpha, BlendMode::SourceOver);
            }
        });
    }

    /// Base colour for a vertical position, interpolated warm (top) to cool (bottom).
    pub fn base_color(&self, y: f32) -> [u8; 3] {
        let height = self.image.height().max(1) as f32;
        let t = (y / height).clamp(0.0, 1.0);
        let [wr, wg, wb] = self.config.warm;
        let [cr, cg, cb] = self.config.cool;
        [lerp(wr, cr, t), lerp(wg, cg, t), lerp(wb, cb, t)]
    }

    pub fn draw_particle(&mut self, particle: &Particle) {
        let color = self.base_color(particle.position.y);
        let opacity = particle.opacity(self.config.attracted_boost);
        let radius = particle.current_radius.max(0.5);
        let (cx, cy) = (particle.position.x, particle.position.y);

        let x0 = (cx - radius).floor().max(0.0) as i64;
        let y0 = (cy - radius).floor().max(0.0) as i64;
        let x1 = ((cx + radius).ceil() as i64).min(self.image.width() as i64 - 1);
        let y1 = ((cy + radius).ceil() as i64).min(self.image.height() as i64 - 1);
        if x1 < x0 || y1 < y0 {
            return;
        }

        self.with_blend(BlendMode::Additive, |canvas| {
            let mode = canvas.blend;
            for y in y0..=y1 {
                for x in x0..=x1 {
                    let dx = x as f32 + 0.5 - cx;
                    let dy = y as f32 + 0.5 - cy;
                    let d = (dx * dx + dy * dy).sqrt() / radius;
                    if d >= 1.0 {
                        continue;
                    }
                    let alpha = opacity * gradient_at(d);
                    let pixel = canvas.image.get_pixel_mut(x as u32, y as u32);
                    blend_into(pixel, color, alpha, mode);
                }
            }
        });
    }

    /// Fades the previous frame and draws every particle.
    pub fn render(&mut self, field: &ParticleField) {
        self.fade();
        for particle in field.particles() {
            self.draw_particle(particle);
        }
    }

    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<()> {
        save_rgba_png(path, self.image.width(), self.image.height(), self.image.as_raw())
    }
}

/// Writes a raw RGBA buffer as a PNG file.
pub fn save_rgba_png(path: impl AsRef<Path>, width: u32, height: u32, buffer: &[u8]) -> Result<()> {
    let output = std::fs::File::create(path)?;
    let encoder = PngEncoder::new(BufWriter::new(output));
    encoder.write_image(buffer, width, height, ExtendedColorType::Rgba8)?;
    Ok(())
}

fn gradient_at(d: f32) -> f32 {
    for pair in GRADIENT_STOPS.windows(2) {
        let (d0, a0) = pair[0];
        let (d1, a1) = pair[1];
        if d <= d1 {
            let t = (d - d0) / (d1 - d0);
            return a0 + (a1 - a0) * t;
        }
    }
    0.0
}

fn lerp(a: u8, b: u8, t: f32) -> u8 {
    (a as f32 + (b as f32 - a as f32) * t).round().clamp(0.0, 255.0) as u8
}

fn blend_into(pixel: &mut Rgba<u8>, color: [u8; 3], alpha: f32, mode: BlendMode) {
    for (dst, src) in pixel.0.iter_mut().zip(color) {
        let d = *dst as f32;
        let s = src as f32;
        let out = match mode {
            BlendMode::SourceOver => d * (1.0 - alpha) + s * alpha,
            BlendMode::Additive => d + s * alpha,
        };
        *dst = out.round().clamp(0.0, 255.0) as u8;
    }
    pixel.0[3] = 255;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::particle::{ParticleSize, Vec2};

    fn particle(x: f32, y: f32) -> Particle {
        let mut p = Particle::new((0, 0), Vec2::new(x, y), ParticleSize::Large, 0.6, 0.0);
        p.current_radius = 4.0;
        p
    }

    fn config() -> RenderConfig {
        RenderConfig {
            warm: [200, 100, 0],
            cool: [0, 100, 200],
            ..RenderConfig::default()
        }
    }

    #[test]
    fn blend_mode_resets_after_each_particle() {
        let mut canvas = Canvas::new(20, 20, config());
        canvas.draw_particle(&particle(10.0, 10.0));
        assert_eq!(canvas.blend_mode(), BlendMode::SourceOver);
        assert!(canvas.pixel(10, 10)[0] > 0);
    }

    #[test]
    fn overlapping_particles_brighten() {
        let mut once = Canvas::new(20, 20, config());
        once.draw_particle(&particle(10.0, 10.0));
        let mut twice = Canvas::new(20, 20, config());
        twice.draw_particle(&particle(10.0, 10.0));
        twice.draw_particle(&particle(10.0, 10.0));
        assert!(twice.pixel(10, 10)[0] > once.pixel(10, 10)[0]);
    }

    #[test]
    fn colour_follows_vertical_position() {
        let canvas = Canvas::new(10, 100, config());
        assert_eq!(canvas.base_color(0.0), [200, 100, 0]);
        assert_eq!(canvas.base_color(100.0), [0, 100, 200]);
        assert_eq!(canvas.base_color(50.0), [100, 100, 100]);
        assert_eq!(canvas.base_color(-40.0), [200, 100, 0]);
    }

    #[test]
    fn attracted_particles_draw_brighter() {
        let mut calm = Canvas::new(20, 20, config());
        calm.draw_particle(&particle(10.0, 10.0));
        let mut excited = Canvas::new(20, 20, config());
        let mut p = particle(10.0, 10.0);
        p.attracted = true;
        excited.draw_particle(&p);
        assert!(excited.pixel(10, 10)[0] > calm.pixel(10, 10)[0]);
    }

    #[test]
    fn fade_pulls_toward_background() {
        let mut canvas = Canvas::new(4, 4, config());
        canvas.with_blend(BlendMode::Additive, |c| {
            let mode = c.blend_mode();
            blend_into(c.image.get_pixel_mut(1, 1), [250, 250, 250], 1.0, mode);
        });
        let before = canvas.pixel(1, 1)[0];
        canvas.fade();
        assert!(canvas.pixel(1, 1)[0] < before);
        assert_eq!(canvas.blend_mode(), BlendMode::SourceOver);
    }

    #[test]
    fn offscreen_particles_are_skipped() {
        let mut canvas = Canvas::new(10, 10, config());
        canvas.draw_particle(&particle(-50.0, -50.0));
        assert!(canvas.image().pixels().all(|p| p.0 == [0, 0, 0, 255]));
    }

    #[test]
    fn gradient_has_three_stops() {
        assert_eq!(gradient_at(0.0), 1.0);
        assert!((gradient_at(0.4) - 0.5).abs() < 1e-6);
        assert_eq!(gradient_at(1.0), 0.0);
    }

    #[test]
    fn canvas_saves_as_png() {
        let mut canvas = Canvas::new(16, 16, config());
        canvas.draw_particle(&particle(8.0, 8.0));
        let path = std::env::temp_dir().join(format!("mirror_field_canvas_{}.png", std::process::id()));
        canvas.save_png(&path).expect("Error Saving File.");
        let loaded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(loaded.dimensions(), (16, 16));
        let _ = std::fs::remove_file(path);
    }
}
