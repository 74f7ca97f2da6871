//! Navigation requests produced by sustained gestures.
//!
//! The engine never loads pages itself. It decides *where* to go and hands a
//! [`NavigationRequest`] to whatever [`Navigator`] the host provides.

use crate::config::NavigationConfig;
use crate::core_modules::gesture::GestureState;
use rand::seq::SliceRandom;
use rand::Rng;
use std::fmt;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationTarget {
    /// One of the candidate experiences.
    Page(String),
    Home(String),
}

impl NavigationTarget {
    pub fn url(&self) -> &str {
        match self {
            Self::Page(url) | Self::Home(url) => url,
        }
    }
}

impl fmt::Display for NavigationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationRequest {
    /// The gesture state whose hold fired this request.
    pub trigger: GestureState,
    pub target: NavigationTarget,
}

/// Picks destinations for confirmed gestures.
#[derive(Debug, Clone)]
pub struct Destinations {
    config: NavigationConfig,
}

impl Destinations {
    pub fn new(config: NavigationConfig) -> Self {
        Self { config }
    }

    pub fn home(&self) -> NavigationTarget {
        NavigationTarget::Home(self.config.home.clone())
    }

    /// A uniformly random candidate page, or home when there are none.
    pub fn random_page<R: Rng + ?Sized>(&self, rng: &mut R) -> NavigationTarget {
        match self.config.candidates.choose(rng) {
            Some(url) => NavigationTarget::Page(url.clone()),
            None => self.home(),
        }
    }

    /// Where a sustained `state` leads: open goes somewhere new, closed and
    /// idle go home.
    pub fn for_state<R: Rng + ?Sized>(&self, state: GestureState, rng: &mut R) -> NavigationRequest {
        let target = match state {
            GestureState::Open => self.random_page(rng),
            GestureState::Closed | GestureState::None => self.home(),
        };
        NavigationRequest { trigger: state, target }
    }
}

/// The host side of navigation.
pub trait Navigator {
    fn navigate(&mut self, request: &NavigationRequest);
}

/// Logs requests and remembers them. Used by the driver and in tests.
#[derive(Debug, Default)]
pub struct LoggingNavigator {
    history: Vec<NavigationRequest>,
}

impl LoggingNavigator {
    pub fn history(&self) -> &[NavigationRequest] {
        &self.history
    }
}

impl Navigator for LoggingNavigator {
    fn navigate(&mut self, request: &NavigationRequest) {
        info!(trigger = %request.trigger, target = %request.target, "navigation requested");
        self.history.push(request.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn open_picks_every_candidate_eventually() {
        let destinations = Destinations::new(NavigationConfig::default());
        let mut rng = StdRng::seed_from_u64(3);
        let seen: HashSet<String> = (0..200)
            .map(|_| destinations.for_state(GestureState::Open, &mut rng).target.url().to_string())
            .collect();
        assert_eq!(seen.len(), NavigationConfig::default().candidates.len());
    }

    #[test]
    fn closed_and_idle_go_home() {
        let destinations = Destinations::new(NavigationConfig::default());
        let mut rng = StdRng::seed_from_u64(0);
        for state in [GestureState::Closed, GestureState::None] {
            let request = destinations.for_state(state, &mut rng);
            assert_eq!(request.target, NavigationTarget::Home("index.html".into()));
            assert_eq!(request.trigger, state);
        }
    }

    #[test]
    fn empty_candidates_fall_back_home() {
        let destinations = Destinations::new(NavigationConfig {
            candidates: Vec::new(),
            home: "home.html".into(),
        });
        let target = destinations.random_page(&mut StdRng::seed_from_u64(1));
        assert_eq!(target, NavigationTarget::Home("home.html".into()));
    }

    #[test]
    fn logging_navigator_records_requests() {
        let mut navigator = LoggingNavigator::default();
        navigator.navigate(&NavigationRequest {
            trigger: GestureState::Closed,
            target: NavigationTarget::Home("index.html".into()),
        });
        assert_eq!(navigator.history().len(), 1);
    }
}
