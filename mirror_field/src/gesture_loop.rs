// THEORY:
// Gesture recognition runs beside the animation, never inside it. Inference
// (a `HandTracker`) publishes the most recent landmark sets into a `watch`
// channel whenever it has them. The gesture loop wakes once per poll interval,
// reads whatever is latest, classifies it and feeds the hold timer. Stale
// landmarks are fine: the loop only ever cares about "now".
//
// The loop owns the classifier and the hold timer. Confirmed gestures leave
// as `NavigationRequest`s on an mpsc channel. When every landmark publisher is
// gone the loop ends, and dropping the hold timer aborts any pending hold.
//
// A tracker that fails to load disables gestures without touching the
// animation. `LandmarkPublisher::load` turns that failure into `None` and a
// warning.

use crate::config::AppConfig;
use crate::core_modules::frame::Frame;
use crate::core_modules::gesture::{GestureClassifier, GestureState};
use crate::core_modules::hold_timer::HoldTimer;
use crate::core_modules::landmarks::HandLandmarks;
use crate::core_modules::navigation::{Destinations, NavigationRequest};
use crate::error::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// The inference collaborator: finds hands in a frame.
pub trait HandTracker {
    fn estimate_hands(&mut self, frame: &Frame) -> Result<Vec<HandLandmarks>>;
}

/// Replays a fixed script of hand sets, one entry per call, looping forever.
/// An empty script never sees any hands.
#[derive(Debug, Clone, Default)]
pub struct ScriptedTracker {
    script: Vec<Vec<HandLandmarks>>,
    cursor: usize,
}

impl ScriptedTracker {
    pub fn new(script: Vec<Vec<HandLandmarks>>) -> Self {
        Self { script, cursor: 0 }
    }

    /// Holds each entry for `repeat` consecutive calls.
    pub fn stretched(script: Vec<Vec<HandLandmarks>>, repeat: usize) -> Self {
        let repeat = repeat.max(1);
        let script = script
            .into_iter()
            .flat_map(|hands| std::iter::repeat(hands).take(repeat))
            .collect();
        Self::new(script)
    }
}

impl HandTracker for ScriptedTracker {
    fn estimate_hands(&mut self, _frame: &Frame) -> Result<Vec<HandLandmarks>> {
        if self.script.is_empty() {
            return Ok(Vec::new());
        }
        let hands = self.script[self.cursor].clone();
        self.cursor = (self.cursor + 1) % self.script.len();
        Ok(hands)
    }
}

/// Runs a tracker on frames and publishes the result for the gesture loop.
pub struct LandmarkPublisher<T: HandTracker> {
    tracker: T,
    latest: watch::Sender<Vec<HandLandmarks>>,
}

impl<T: HandTracker> LandmarkPublisher<T> {
    pub fn new(tracker: T) -> (Self, watch::Receiver<Vec<HandLandmarks>>) {
        let (latest, receiver) = watch::channel(Vec::new());
        (Self { tracker, latest }, receiver)
    }

    /// Like `new`, for a tracker that may have failed to load. A failure is
    /// logged and gestures stay disabled.
    pub fn load(tracker: Result<T>) -> Option<(Self, watch::Receiver<Vec<HandLandmarks>>)> {
        match tracker {
            Ok(tracker) => Some(Self::new(tracker)),
            Err(err) => {
                warn!(error = %err, "hand tracker unavailable, gestures disabled");
                None
            }
        }
    }

    /// Runs inference on one frame. A failed estimate publishes no hands
    /// rather than keeping the previous ones alive.
    pub fn process(&mut self, frame: &Frame) {
        let hands = match self.tracker.estimate_hands(frame) {
            Ok(hands) => hands,
            Err(err) => {
                debug!(error = %err, "hand estimation failed");
                Vec::new()
            }
        };
        self.latest.send_replace(hands);
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<HandLandmarks>> {
        self.latest.subscribe()
    }
}

pub struct GestureLoop {
    handle: JoinHandle<()>,
    states: watch::Receiver<Option<GestureState>>,
}

impl GestureLoop {
    /// Starts the loop on the ambient tokio runtime.
    pub fn spawn(
        config: &AppConfig,
        landmarks: watch::Receiver<Vec<HandLandmarks>>,
        requests: mpsc::UnboundedSender<NavigationRequest>,
    ) -> Self {
        let classifier = GestureClassifier::new(config.gesture.clone());
        let rng = match config.field.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let timer = HoldTimer::new(
            &config.gesture,
            Destinations::new(config.navigation.clone()),
            requests,
        )
        .with_rng(rng);
        let period = config.gesture.poll_interval();
        let (state_tx, states) = watch::channel(None);

        let handle = tokio::spawn(run(classifier, timer, landmarks, state_tx, period));
        Self { handle, states }
    }

    /// The classification from the most recent tick.
    pub fn current_state(&self) -> Option<GestureState> {
        *self.states.borrow()
    }

    pub fn states(&self) -> watch::Receiver<Option<GestureState>> {
        self.states.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub fn stop(self) {
        self.handle.abort();
    }

    /// Waits for the loop to end on its own.
    pub async fn join(self) {
        if let Err(err) = self.handle.await {
            if !err.is_cancelled() {
                warn!(error = %err, "gesture loop ended abnormally");
            }
        }
    }
}

async fn run(
    classifier: GestureClassifier,
    mut timer: HoldTimer,
    mut landmarks: watch::Receiver<Vec<HandLandmarks>>,
    states: watch::Sender<Option<GestureState>>,
    period: std::time::Duration,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(period_ms = period.as_millis() as u64, "gesture loop started");

    loop {
        ticker.tick().await;
        if landmarks.has_changed().is_err() {
            break;
        }
        let state = classifier.classify_hands(&landmarks.borrow_and_update());
        if timer.observe(state) {
            states.send_replace(Some(state));
        }
    }

    info!("landmark source closed, gesture loop stopped");
}
