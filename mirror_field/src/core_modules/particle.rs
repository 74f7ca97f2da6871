// THEORY:
// A `Particle` is one point mass anchored to a fixed rest position on the grid.
// External forcing (camera motion) pushes it around; a weak spring, a friction
// multiplier and a hard speed cap pull it back. The combination keeps motion
// bounded no matter how noisy or extreme the forcing is, so the field can never
// fly off screen.
//
// Per-tick order in `update`:
//   wave -> spring -> integrate acceleration -> friction -> clamp speed
//   -> integrate position (+ wave) -> clear acceleration -> radius pulse

use crate::config::FieldConfig;
use std::ops::{Add, AddAssign, Mul, Sub};

/// A 2D vector in canvas pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn distance(self, other: Vec2) -> f32 {
        (self - other).length()
    }

    /// Scales the vector down so its length is at most `max`.
    pub fn clamp_length(self, max: f32) -> Self {
        let len = self.length();
        if len > max && len > 0.0 {
            self * (max / len)
        } else {
            self
        }
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;
    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

/// The three discrete particle sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticleSize {
    Small,
    Medium,
    Large,
}

impl ParticleSize {
    pub const ALL: [ParticleSize; 3] = [ParticleSize::Small, ParticleSize::Medium, ParticleSize::Large];

    pub fn radius(self) -> f32 {
        match self {
            ParticleSize::Small => 1.5,
            ParticleSize::Medium => 2.5,
            ParticleSize::Large => 4.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    /// Grid cell (col, row) this particle belongs to.
    pub cell: (u32, u32),
    pub rest_position: Vec2,
    pub position: Vec2,
    pub velocity: Vec2,
    pub acceleration: Vec2,
    pub size: ParticleSize,
    pub radius: f32,
    pub mass: f32,
    pub base_opacity: f32,
    /// Phase offset of the idle wave, in radians.
    pub phase: f32,
    pub attracted: bool,
    /// Local motion mapped to 0..1.
    pub motion_strength: f32,
    /// Radius to draw this tick, including the pulse.
    pub current_radius: f32,
}

impl Particle {
    pub fn new(cell: (u32, u32), rest_position: Vec2, size: ParticleSize, base_opacity: f32, phase: f32) -> Self {
        let radius = size.radius();
        Self {
            cell,
            rest_position,
            position: rest_position,
            velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            size,
            radius,
            mass: radius,
            base_opacity,
            phase,
            attracted: false,
            motion_strength: 0.0,
            current_radius: radius,
        }
    }

    /// Accumulates an external force and records the local motion state.
    pub fn apply_force(&mut self, force: Vec2, motion: f32, config: &FieldConfig) {
        self.acceleration += force * (1.0 / self.mass);
        self.motion_strength = motion_strength(motion, config);
        self.attracted = motion > config.attraction_threshold;
    }

    /// Advances the particle one tick at field time `time` (seconds).
    pub fn update(&mut self, brightness: f32, motion: f32, time: f32, config: &FieldConfig) {
        let angle = time * config.wave_speed + self.phase;
        let wave = Vec2::new(angle.sin(), (angle * 0.8).cos()) * config.wave_amplitude;

        self.acceleration += (self.rest_position - self.position) * config.spring;
        self.velocity += self.acceleration;
        self.velocity = self.velocity * config.friction;
        self.velocity = self.velocity.clamp_length(config.max_speed);
        self.position += self.velocity + wave;
        self.acceleration = Vec2::ZERO;

        self.current_radius = if self.attracted {
            let pulse = motion_strength(motion, config)
                .max(self.motion_strength)
                .max((brightness / 255.0).clamp(0.0, 1.0));
            self.radius * (1.0 + pulse * config.pulse_gain)
        } else {
            self.radius
        };
    }

    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }

    pub fn distance_to_rest(&self) -> f32 {
        self.position.distance(self.rest_position)
    }

    /// Opacity to draw with; attracted particles are boosted, capped at 1.
    pub fn opacity(&self, attracted_boost: f32) -> f32 {
        if self.attracted {
            (self.base_opacity * attracted_boost).min(1.0)
        } else {
            self.base_opacity
        }
    }
}

fn motion_strength(motion: f32, config: &FieldConfig) -> f32 {
    if config.motion_scale <= 0.0 {
        return 0.0;
    }
    (motion / config.motion_scale).clamp(0.0, 1.0)
}
