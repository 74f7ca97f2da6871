// THEORY:
// The gesture classifier turns one 21-point hand landmark set into one of three
// labels. It is a pure threshold heuristic over distances:
//
// - **Open**: enough fingertips are far from the wrist (fingers extended).
// - **Closed**: every pair of adjacent fingertips is bunched together (fist).
// - **None**: anything else, including no hand at all.
//
// Open is checked first, so a hand that satisfies both reads as open.
//
// Raw distances are in the tracking model's coordinate space, which makes the
// thresholds depend on camera resolution and how close the hand is. The
// `PalmScale` metric divides every distance by the palm length (wrist to the
// middle finger's knuckle), which stays stable whether the hand is open or
// curled, and compares against ratio thresholds instead.

use crate::config::GestureConfig;
use crate::core_modules::landmarks::HandLandmarks;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How landmark distances are measured before thresholding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// Distances in the tracking model's units.
    #[default]
    Raw,
    /// Distances divided by the palm length.
    PalmScale,
}

/// The label for one classification tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GestureState {
    Open,
    Closed,
    None,
}

impl GestureState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::None => "none",
        }
    }
}

impl fmt::Display for GestureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct GestureClassifier {
    config: GestureConfig,
}

impl GestureClassifier {
    pub fn new(config: GestureConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    pub fn classify(&self, hand: &HandLandmarks) -> GestureState {
        let (scale, open_threshold, closed_threshold) = match self.config.metric {
            DistanceMetric::Raw => (1.0, self.config.open_distance, self.config.closed_distance),
            DistanceMetric::PalmScale => {
                let palm = hand.palm_length();
                if palm <= f32::EPSILON {
                    return GestureState::None;
                }
                (palm, self.config.open_ratio, self.config.closed_ratio)
            }
        };

        let wrist = hand.wrist();
        let tips = hand.fingertips();

        let extended = tips
            .iter()
            .filter(|tip| tip.distance(&wrist) / scale > open_threshold)
            .count();
        if extended >= self.config.min_extended {
            return GestureState::Open;
        }

        let bunched = tips
            .windows(2)
            .all(|pair| pair[0].distance(&pair[1]) / scale < closed_threshold);
        if bunched {
            return GestureState::Closed;
        }

        GestureState::None
    }

    /// The first hand that reads as open or closed wins; no hands is `None`.
    pub fn classify_hands(&self, hands: &[HandLandmarks]) -> GestureState {
        hands
            .iter()
            .map(|hand| self.classify(hand))
            .find(|state| *state != GestureState::None)
            .unwrap_or(GestureState::None)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::core_modules::landmarks::HandLandmarks;

    pub fn hand(origin: (f32, f32), palm: f32, reach: [f32; 5], spread: f32) -> HandLandmarks {
        HandLandmarks::posed(origin, palm, reach, spread)
    }

    pub fn open_hand() -> HandLandmarks {
        hand((200.0, 300.0), 60.0, [150.0; 5], 40.0)
    }

    pub fn closed_hand() -> HandLandmarks {
        hand((200.0, 300.0), 60.0, [60.0; 5], 10.0)
    }

    /// Two fingers extended, the rest half-curled and spread.
    pub fn ambiguous_hand() -> HandLandmarks {
        hand((200.0, 300.0), 60.0, [60.0, 150.0, 150.0, 60.0, 60.0], 40.0)
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    fn classifier() -> GestureClassifier {
        GestureClassifier::new(GestureConfig::default())
    }

    #[test]
    fn all_fingers_extended_is_open() {
        assert_eq!(classifier().classify(&open_hand()), GestureState::Open);
    }

    #[test]
    fn three_fingers_are_enough() {
        let hand = hand((0.0, 0.0), 60.0, [150.0, 150.0, 150.0, 50.0, 50.0], 40.0);
        assert_eq!(classifier().classify(&hand), GestureState::Open);
    }

    #[test]
    fn bunched_fingertips_are_closed() {
        assert_eq!(classifier().classify(&closed_hand()), GestureState::Closed);
    }

    #[test]
    fn two_fingers_is_neither() {
        assert_eq!(classifier().classify(&ambiguous_hand()), GestureState::None);
    }

    #[test]
    fn no_hands_is_none() {
        assert_eq!(classifier().classify_hands(&[]), GestureState::None);
    }

    #[test]
    fn first_decisive_hand_wins() {
        let hands = vec![ambiguous_hand(), closed_hand(), open_hand()];
        assert_eq!(classifier().classify_hands(&hands), GestureState::Closed);
    }

    #[test]
    fn palm_scale_metric_ignores_absolute_size() {
        let config = GestureConfig {
            metric: DistanceMetric::PalmScale,
            ..GestureConfig::default()
        };
        let scaled = GestureClassifier::new(config);
        // The fixture shapes at a tenth of the size.
        let tiny_open = hand((20.0, 30.0), 6.0, [15.0; 5], 4.0);
        let tiny_closed = hand((20.0, 30.0), 6.0, [6.0; 5], 1.0);
        assert_eq!(scaled.classify(&tiny_open), GestureState::Open);
        assert_eq!(scaled.classify(&tiny_closed), GestureState::Closed);
        // Raw thresholds misread the small open hand as a fist.
        assert_eq!(classifier().classify(&tiny_open), GestureState::Closed);
    }

    #[test]
    fn metric_names_round_trip_through_json() {
        let config = crate::config::AppConfig::from_json_str(r#"{ "gesture": { "metric": "palm_scale" } }"#)
            .unwrap();
        assert_eq!(config.gesture.metric, DistanceMetric::PalmScale);
        assert_eq!(serde_json::to_string(&DistanceMetric::PalmScale).unwrap(), r#""palm_scale""#);
        assert_eq!(serde_json::to_string(&DistanceMetric::Raw).unwrap(), r#""raw""#);
        assert!(crate::config::AppConfig::from_json_str(r#"{ "gesture": { "metric": "bogus" } }"#).is_err());
    }

    #[test]
    fn degenerate_palm_is_none() {
        let config = GestureConfig {
            metric: DistanceMetric::PalmScale,
            ..GestureConfig::default()
        };
        let hand = hand((0.0, 0.0), 0.0, [150.0; 5], 40.0);
        assert_eq!(GestureClassifier::new(config).classify(&hand), GestureState::None);
    }
}
