pub mod audio;
pub mod frame;
pub mod gesture;
pub mod hold_timer;
pub mod landmarks;
pub mod motion_detector;
pub mod navigation;
pub mod particle;
pub mod particle_field;
pub mod pixel;
pub mod renderer;
pub mod sampler;
