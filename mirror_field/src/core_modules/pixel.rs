// THEORY:
// The `Pixel` module is the smallest unit the engine reasons about: one RGBA
// sample of the downsampled camera grid. It is a "dumb" data container with a
// few single-sample heuristics. Anything that needs a second sample (frame
// differences, gradients) lives in higher modules like the motion detector.

pub mod pixel {
    pub type Channel = u8;
    pub type Brightness = f32;

    pub const CHANNELS: usize = 4;

    /// A single RGBA sample.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct Pixel {
        pub red: Channel,
        pub green: Channel,
        pub blue: Channel,
        pub alpha: Channel,
    }

    impl Pixel {
        pub fn new(red: Channel, green: Channel, blue: Channel, alpha: Channel) -> Self {
            Self {
                red,
                green,
                blue,
                alpha,
            }
        }

        /// Mean of the three colour channels, 0..255.
        pub fn brightness(&self) -> Brightness {
            (self.red as Brightness + self.green as Brightness + self.blue as Brightness) / 3.0
        }

        /// Mean absolute per-channel difference against another sample, alpha ignored.
        pub fn mean_abs_difference(&self, other: &Pixel) -> f32 {
            let dr = (self.red as i16 - other.red as i16).unsigned_abs();
            let dg = (self.green as i16 - other.green as i16).unsigned_abs();
            let db = (self.blue as i16 - other.blue as i16).unsigned_abs();
            (dr + dg + db) as f32 / 3.0
        }
    }

    /// Reads a pixel from the first four bytes of an RGBA slice.
    /// Returns `None` when fewer than four bytes are available.
    pub fn from_rgba(bytes: &[u8]) -> Option<Pixel> {
        match bytes {
            [r, g, b, a, ..] => Some(Pixel::new(*r, *g, *b, *a)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::pixel::*;

    #[test]
    fn brightness_is_rgb_mean() {
        let p = Pixel::new(30, 60, 90, 0);
        assert_eq!(p.brightness(), 60.0);
    }

    #[test]
    fn difference_ignores_alpha() {
        let a = Pixel::new(10, 10, 10, 255);
        let b = Pixel::new(40, 10, 10, 0);
        assert_eq!(a.mean_abs_difference(&b), 10.0);
        assert_eq!(b.mean_abs_difference(&a), 10.0);
    }

    #[test]
    fn short_slices_are_rejected() {
        assert!(from_rgba(&[1, 2, 3]).is_none());
        assert_eq!(from_rgba(&[1, 2, 3, 4, 5]), Some(Pixel::new(1, 2, 3, 4)));
    }
}
