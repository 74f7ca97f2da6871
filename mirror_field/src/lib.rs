// THEORY:
// This file is the entry point of the `mirror_field` library crate. It exposes
// two independent halves of the engine:
//
// - `FieldPipeline` (in `pipeline`): the synchronous per-frame path that turns
//   camera frames into a rendered particle canvas.
// - `GestureLoop` (in `gesture_loop`): the slow async path that turns hand
//   landmarks into navigation requests.
//
// The building blocks live in `core_modules` and remain public for hosts that
// want to wire the stages differently. Configuration and the error type sit at
// the top level because every stage shares them.

pub mod config;
pub mod core_modules;
pub mod error;
pub mod gesture_loop;
pub mod pipeline;

pub use config::AppConfig;
pub use core_modules::audio::{AudioController, AudioSink, AudioState, NullSink};
pub use core_modules::frame::{DeniedSource, Frame, FrameSource, SyntheticSource};
pub use core_modules::gesture::GestureState;
pub use core_modules::navigation::{LoggingNavigator, NavigationRequest, NavigationTarget, Navigator};
pub use error::{FieldError, Result};
pub use gesture_loop::{GestureLoop, HandTracker, LandmarkPublisher, ScriptedTracker};
pub use pipeline::{FieldPipeline, FrameReport, InputState};
