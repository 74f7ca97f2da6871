//! 21-point hand landmark sets as produced by hand-tracking models.
//!
//! Coordinates are in whatever space the tracking model reports (usually
//! pixels of the frame it was given). Only the ordering is fixed.

use crate::error::{FieldError, Result};

pub const LANDMARK_COUNT: usize = 21;

pub const WRIST: usize = 0;
pub const THUMB_TIP: usize = 4;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_TIP: usize = 12;
pub const RING_TIP: usize = 16;
pub const PINKY_TIP: usize = 20;

/// Fingertips from thumb to pinky. Adjacent entries are adjacent fingers.
pub const FINGERTIPS: [usize; 5] = [THUMB_TIP, INDEX_TIP, MIDDLE_TIP, RING_TIP, PINKY_TIP];

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y, z: 0.0 }
    }

    /// Planar distance; depth is ignored like the tracking heuristics do.
    pub fn distance(&self, other: &Landmark) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HandLandmarks {
    points: [Landmark; LANDMARK_COUNT],
}

impl HandLandmarks {
    pub fn new(points: [Landmark; LANDMARK_COUNT]) -> Self {
        Self { points }
    }

    /// Builds a set from exactly 21 landmarks.
    pub fn from_slice(points: &[Landmark]) -> Result<Self> {
        let points: [Landmark; LANDMARK_COUNT] = points
            .try_into()
            .map_err(|_| FieldError::InvalidLandmarks(points.len()))?;
        Ok(Self { points })
    }

    pub fn from_xy(points: &[(f32, f32)]) -> Result<Self> {
        let landmarks: Vec<Landmark> = points.iter().map(|&(x, y)| Landmark::new(x, y)).collect();
        Self::from_slice(&landmarks)
    }

    pub fn points(&self) -> &[Landmark; LANDMARK_COUNT] {
        &self.points
    }

    pub fn wrist(&self) -> Landmark {
        self.points[WRIST]
    }

    pub fn fingertips(&self) -> [Landmark; 5] {
        FINGERTIPS.map(|i| self.points[i])
    }

    /// A schematic hand: wrist at `wrist`, middle knuckle `palm` straight up,
    /// each fingertip `reach[i]` from the wrist and spaced `spread` apart
    /// horizontally. Used by scripted trackers and demos.
    pub fn posed(wrist: (f32, f32), palm: f32, reach: [f32; 5], spread: f32) -> Self {
        let mut points = [Landmark::new(wrist.0, wrist.1); LANDMARK_COUNT];
        points[MIDDLE_MCP] = Landmark::new(wrist.0, wrist.1 - palm);
        for (finger, &tip) in FINGERTIPS.iter().enumerate() {
            let dx = (finger as f32 - 2.0) * spread;
            let dy = -(reach[finger] * reach[finger] - dx * dx).max(0.0).sqrt();
            points[tip] = Landmark::new(wrist.0 + dx, wrist.1 + dy);
        }
        Self { points }
    }

    /// Wrist to middle-finger knuckle. Barely changes between an open hand
    /// and a fist, so it works as a size reference.
    pub fn palm_length(&self) -> f32 {
        self.points[WRIST].distance(&self.points[MIDDLE_MCP])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requires_exactly_21_points() {
        let err = HandLandmarks::from_xy(&[(0.0, 0.0); 20]).unwrap_err();
        assert!(matches!(err, FieldError::InvalidLandmarks(20)));
        assert!(HandLandmarks::from_xy(&[(0.0, 0.0); 21]).is_ok());
    }

    #[test]
    fn fingertips_follow_model_indices() {
        let mut points = [(0.0, 0.0); 21];
        for (i, p) in points.iter_mut().enumerate() {
            *p = (i as f32, 0.0);
        }
        let hand = HandLandmarks::from_xy(&points).unwrap();
        let tips: Vec<f32> = hand.fingertips().iter().map(|l| l.x).collect();
        assert_eq!(tips, vec![4.0, 8.0, 12.0, 16.0, 20.0]);
        assert_eq!(hand.palm_length(), 9.0);
    }

    #[test]
    fn posed_hand_places_tips_at_reach() {
        let hand = HandLandmarks::posed((100.0, 100.0), 50.0, [120.0, 80.0, 60.0, 80.0, 120.0], 30.0);
        let wrist = hand.wrist();
        let reach: Vec<f32> = hand.fingertips().iter().map(|t| t.distance(&wrist)).collect();
        for (got, want) in reach.iter().zip([120.0, 80.0, 60.0, 80.0, 120.0]) {
            assert!((got - want).abs() < 1e-3, "{got} vs {want}");
        }
        assert_eq!(hand.palm_length(), 50.0);
    }
}
