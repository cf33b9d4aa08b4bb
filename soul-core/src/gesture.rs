//! Gesture interpretation: raw hand landmarks to control signals.
//!
//! The interpreter owns the Control Signal State: per-frame targets derived
//! from one or two hands, plus exponentially smoothed copies that the
//! particle simulator reads. Targets are clamped before smoothing, so the
//! smoothed values converge toward them without overshoot.

use core::f32::consts::PI;

use soul_shared::{ControlSignals, LandmarkSet, FINGERTIPS, MIDDLE_MCP, PINKY_TIP, THUMB_TIP, WRIST};

use crate::math;

/// Exponential smoothing factor per incoming video frame. A first-order
/// low-pass with a ~3-frame time constant: enough to suppress landmark
/// jitter while staying responsive for live interaction.
pub const SMOOTHING: f32 = 0.3;

/// Empirical fingertip-to-hand-scale ratio observed for a closed fist
const OPEN_RATIO_MIN: f32 = 0.7;
/// ... and for a fully open palm
const OPEN_RATIO_MAX: f32 = 1.5;

/// Above this openness the dispersion target is amplified so the open-hand
/// "explode" reads more immediately than the close-hand "gather".
const SNAP_THRESHOLD: f32 = 0.5;
const SNAP_GAIN: f32 = 1.4;

const TWO_HAND_EXPANSION_GAIN: f32 = 3.5;
const ONE_HAND_SPREAD_GAIN: f32 = 7.0;

fn lerp(start: f32, end: f32, amount: f32) -> f32 {
    (1.0 - amount) * start + amount * end
}

/// Stateful interpreter: call [`GestureInterpreter::process`] once per
/// available video frame.
#[derive(Debug, Clone)]
pub struct GestureInterpreter {
    smoothed: ControlSignals,
    last_timestamp_ms: f64,
}

impl Default for GestureInterpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl GestureInterpreter {
    pub fn new() -> Self {
        Self {
            smoothed: ControlSignals::default(),
            last_timestamp_ms: -1.0,
        }
    }

    /// Current smoothed control signals.
    pub fn signals(&self) -> ControlSignals {
        self.smoothed
    }

    /// Hand openness in [0, 1]: 0 = closed fist, 1 = fully open palm.
    ///
    /// Average image-plane distance from the wrist to the five fingertips,
    /// normalized by the wrist-to-middle-knuckle distance so the metric is
    /// invariant to how close the hand is to the camera. `None` when the
    /// hand has no usable scale.
    pub fn openness(set: &LandmarkSet) -> Option<f32> {
        if set.is_degenerate() {
            return None;
        }

        let wrist = set.point(WRIST);
        let hand_size = wrist.distance_xy(&set.point(MIDDLE_MCP));
        if !hand_size.is_finite() || hand_size <= f32::EPSILON {
            return None;
        }

        let mut avg_dist = 0.0;
        for &tip in FINGERTIPS.iter() {
            avg_dist += wrist.distance_xy(&set.point(tip));
        }
        avg_dist /= FINGERTIPS.len() as f32;

        let ratio = avg_dist / hand_size;
        Some(((ratio - OPEN_RATIO_MIN) / (OPEN_RATIO_MAX - OPEN_RATIO_MIN)).clamp(0.0, 1.0))
    }

    /// Pre-smoothing targets for a frame's landmark sets.
    ///
    /// Exactly one or two usable hands drive the signals; any other count
    /// (including sets rejected as degenerate) yields the defaults.
    pub fn interpret(sets: &[LandmarkSet]) -> ControlSignals {
        let mut hands: [Option<&LandmarkSet>; 2] = [None, None];
        let mut usable = 0usize;
        for set in sets {
            if set.is_degenerate() {
                continue;
            }
            if usable < 2 {
                hands[usable] = Some(set);
            }
            usable += 1;
        }

        match (usable, hands) {
            (2, [Some(first), Some(second)]) => {
                Self::interpret_two_hands(first, second).unwrap_or_default()
            }
            (1, [Some(hand), None]) => Self::interpret_one_hand(hand).unwrap_or_default(),
            _ => ControlSignals::default(),
        }
    }

    fn interpret_two_hands(first: &LandmarkSet, second: &LandmarkSet) -> Option<ControlSignals> {
        let openness = (Self::openness(first)? + Self::openness(second)?) / 2.0;

        let h1 = first.point(MIDDLE_MCP);
        let h2 = second.point(MIDDLE_MCP);

        let expansion = (h1.distance_xy(&h2) * TWO_HAND_EXPANSION_GAIN).clamp(0.2, 4.0);
        // Negated: image y grows downward
        let rotation = -math::atan2f(h2.y - h1.y, h2.x - h1.x);

        Some(ControlSignals {
            expansion,
            dispersion: openness,
            rotation,
        })
    }

    fn interpret_one_hand(hand: &LandmarkSet) -> Option<ControlSignals> {
        let openness = Self::openness(hand)?;

        let wrist = hand.point(WRIST);
        let middle_mcp = hand.point(MIDDLE_MCP);

        // Roll of the hand in the image plane, offset so an upright hand
        // reads as zero
        let rotation =
            -math::atan2f(middle_mcp.y - wrist.y, middle_mcp.x - wrist.x) - PI / 2.0;

        let spread = hand.point(THUMB_TIP).distance_xy(&hand.point(PINKY_TIP));
        let expansion = (spread * ONE_HAND_SPREAD_GAIN).clamp(0.5, 3.5);

        let mut dispersion = openness;
        if dispersion > SNAP_THRESHOLD {
            dispersion = (dispersion * SNAP_GAIN).min(1.0);
        }

        Some(ControlSignals {
            expansion,
            dispersion,
            rotation,
        })
    }

    /// Interpret one video frame and fold it into the smoothed state.
    ///
    /// Frames are deduplicated by timestamp: reprocessing the timestamp of
    /// the previous call leaves the state untouched and returns the current
    /// snapshot.
    pub fn process(&mut self, timestamp_ms: f64, sets: &[LandmarkSet]) -> ControlSignals {
        if timestamp_ms == self.last_timestamp_ms {
            return self.smoothed;
        }
        self.last_timestamp_ms = timestamp_ms;

        let target = Self::interpret(sets);
        self.smoothed.expansion = lerp(self.smoothed.expansion, target.expansion, SMOOTHING);
        self.smoothed.dispersion = lerp(self.smoothed.dispersion, target.dispersion, SMOOTHING);
        self.smoothed.rotation = lerp(self.smoothed.rotation, target.rotation, SMOOTHING);
        self.smoothed
    }
}
