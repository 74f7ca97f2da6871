// THEORY:
// The hold timer is the debounce between "the classifier saw a fist once" and
// "navigate home". A gesture has to persist for its full hold duration before
// anything happens, and any change of classification in between starts over.
//
// Each transition spawns one delayed task: sleep for the hold duration of the
// new state, then send a `NavigationRequest`. Observing the same state again
// leaves that task alone (the hold keeps counting). Observing a different state
// aborts it before spawning the next one, so holds are never accumulated
// across interruptions. A task fires at most once.
//
// `observe` spawns onto the ambient tokio runtime and must be called from
// inside one.

use crate::config::GestureConfig;
use crate::core_modules::gesture::GestureState;
use crate::core_modules::navigation::{Destinations, NavigationRequest};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

pub struct HoldTimer {
    open_hold: Duration,
    closed_hold: Duration,
    idle_hold: Duration,
    destinations: Destinations,
    rng: StdRng,
    current: Option<GestureState>,
    pending: Option<JoinHandle<()>>,
    requests: mpsc::UnboundedSender<NavigationRequest>,
}

impl HoldTimer {
    pub fn new(
        config: &GestureConfig,
        destinations: Destinations,
        requests: mpsc::UnboundedSender<NavigationRequest>,
    ) -> Self {
        Self {
            open_hold: Duration::from_millis(config.open_hold_ms),
            closed_hold: Duration::from_millis(config.closed_hold_ms),
            idle_hold: Duration::from_millis(config.idle_hold_ms),
            destinations,
            rng: StdRng::from_entropy(),
            current: None,
            pending: None,
            requests,
        }
    }

    /// Replaces the RNG used to pick candidate pages.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn hold_for(&self, state: GestureState) -> Duration {
        match state {
            GestureState::Open => self.open_hold,
            GestureState::Closed => self.closed_hold,
            GestureState::None => self.idle_hold,
        }
    }

    /// Feeds one classification. Returns `true` when it was a transition.
    pub fn observe(&mut self, state: GestureState) -> bool {
        if self.current == Some(state) {
            return false;
        }
        self.cancel();
        debug!(from = ?self.current, to = %state, "gesture transition");
        self.current = Some(state);

        let hold = self.hold_for(state);
        let request = self.destinations.for_state(state, &mut self.rng);
        let requests = self.requests.clone();
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(hold).await;
            info!(trigger = %request.trigger, target = %request.target, "gesture hold confirmed");
            let _ = requests.send(request);
        }));
        true
    }

    /// Aborts the pending hold, if any. The current state is kept.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    pub fn state(&self) -> Option<GestureState> {
        self.current
    }

    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for HoldTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NavigationConfig;
    use crate::core_modules::navigation::NavigationTarget;
    use tokio::time::sleep;

    fn timer() -> (HoldTimer, mpsc::UnboundedReceiver<NavigationRequest>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let timer = HoldTimer::new(
            &GestureConfig::default(),
            Destinations::new(NavigationConfig::default()),
            tx,
        )
        .with_rng(StdRng::seed_from_u64(9));
        (timer, rx)
    }

    fn secs(s: f64) -> Duration {
        Duration::from_secs_f64(s)
    }

    #[tokio::test(start_paused = true)]
    async fn sustained_open_navigates_to_a_candidate() {
        let (mut timer, mut rx) = timer();
        assert!(timer.observe(GestureState::Open));
        let request = rx.recv().await.unwrap();
        assert_eq!(request.trigger, GestureState::Open);
        assert!(matches!(request.target, NavigationTarget::Page(_)));
        assert!(NavigationConfig::default()
            .candidates
            .contains(&request.target.url().to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn interrupted_open_does_not_fire() {
        let (mut timer, mut rx) = timer();
        timer.observe(GestureState::Open);
        sleep(secs(4.0)).await;
        timer.observe(GestureState::None);
        sleep(secs(1.0)).await;
        timer.observe(GestureState::Open);
        sleep(secs(4.0)).await;
        assert!(rx.try_recv().is_err(), "hold must restart after interruption");

        sleep(secs(1.5)).await;
        assert_eq!(rx.try_recv().unwrap().trigger, GestureState::Open);
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_state_keeps_counting() {
        let (mut timer, mut rx) = timer();
        timer.observe(GestureState::Closed);
        sleep(secs(3.0)).await;
        assert!(!timer.observe(GestureState::Closed));
        sleep(secs(2.5)).await;
        let request = rx.try_recv().unwrap();
        assert_eq!(request.target, NavigationTarget::Home("index.html".into()));
    }

    #[tokio::test(start_paused = true)]
    async fn fires_once_per_transition() {
        let (mut timer, mut rx) = timer();
        timer.observe(GestureState::Closed);
        sleep(secs(30.0)).await;
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
        assert!(!timer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn idle_returns_home_after_a_minute() {
        let (mut timer, mut rx) = timer();
        timer.observe(GestureState::None);
        sleep(secs(59.0)).await;
        assert!(rx.try_recv().is_err());
        sleep(secs(1.5)).await;
        let request = rx.try_recv().unwrap();
        assert_eq!(request.trigger, GestureState::None);
        assert_eq!(request.target, NavigationTarget::Home("index.html".into()));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_pending_hold() {
        let (mut timer, mut rx) = timer();
        timer.observe(GestureState::Open);
        assert!(timer.is_pending());
        timer.cancel();
        sleep(secs(10.0)).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(timer.state(), Some(GestureState::Open));
    }
}
