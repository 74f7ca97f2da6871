//! Background audio lifecycle.
//!
//! One [`AudioController`] lives in the application context and is passed
//! around explicitly. Playback itself is delegated to an [`AudioSink`].

use crate::error::{FieldError, Result};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioState {
    Uninitialized,
    Ready,
    Playing,
    Paused,
}

/// Whatever actually produces sound.
pub trait AudioSink {
    fn start(&mut self);
    fn stop(&mut self);
}

/// A sink that produces nothing.
#[derive(Debug, Default)]
pub struct NullSink;

impl AudioSink for NullSink {
    fn start(&mut self) {}
    fn stop(&mut self) {}
}

pub struct AudioController<S: AudioSink = NullSink> {
    sink: S,
    state: AudioState,
}

impl<S: AudioSink> AudioController<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            state: AudioState::Uninitialized,
        }
    }

    /// Prepares the sink. Calling it again is a no-op.
    pub fn init(&mut self) {
        if self.state == AudioState::Uninitialized {
            self.state = AudioState::Ready;
            info!("audio initialised");
        }
    }

    pub fn play(&mut self) -> Result<()> {
        match self.state {
            AudioState::Uninitialized => Err(FieldError::AudioNotInitialized),
            AudioState::Playing => Ok(()),
            AudioState::Ready | AudioState::Paused => {
                self.sink.start();
                self.state = AudioState::Playing;
                debug!("audio playing");
                Ok(())
            }
        }
    }

    pub fn pause(&mut self) -> Result<()> {
        match self.state {
            AudioState::Uninitialized => Err(FieldError::AudioNotInitialized),
            AudioState::Playing => {
                self.sink.stop();
                self.state = AudioState::Paused;
                debug!("audio paused");
                Ok(())
            }
            AudioState::Ready | AudioState::Paused => Ok(()),
        }
    }

    pub fn state(&self) -> AudioState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == AudioState::Playing
    }
}

impl Default for AudioController<NullSink> {
    fn default() -> Self {
        Self::new(NullSink)
    }
}
