#![cfg_attr(not(feature = "std"), no_std)]

use serde::{Deserialize, Serialize};

/// Number of keypoints in one hand landmark set (MediaPipe hand topology)
pub const LANDMARK_COUNT: usize = 21;

/// Keypoint indices within a landmark set
pub const WRIST: usize = 0;
pub const THUMB_TIP: usize = 4;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_TIP: usize = 12;
pub const RING_TIP: usize = 16;
pub const PINKY_TIP: usize = 20;

/// The five fingertip indices, thumb to pinky
pub const FINGERTIPS: [usize; 5] = [THUMB_TIP, INDEX_TIP, MIDDLE_TIP, RING_TIP, PINKY_TIP];

/// A single hand keypoint. `x` and `y` are normalized image coordinates in
/// [0, 1]; `z` is relative depth as reported by the vision model.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance in the image plane (z ignored)
    pub fn distance_xy(&self, other: &Landmark) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        libm::sqrtf(dx * dx + dy * dy)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// One detected hand: exactly [`LANDMARK_COUNT`] ordered keypoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LandmarkSet {
    points: [Landmark; LANDMARK_COUNT],
}

impl LandmarkSet {
    pub fn new(points: [Landmark; LANDMARK_COUNT]) -> Self {
        Self { points }
    }

    /// Build from a slice; `None` unless it holds exactly 21 points.
    pub fn from_slice(points: &[Landmark]) -> Option<Self> {
        let points: [Landmark; LANDMARK_COUNT] = points.try_into().ok()?;
        Some(Self { points })
    }

    pub fn point(&self, index: usize) -> Landmark {
        self.points[index]
    }

    pub fn points(&self) -> &[Landmark] {
        &self.points
    }

    /// A set with any non-finite coordinate carries no usable gesture and
    /// is treated as if the hand were absent.
    pub fn is_degenerate(&self) -> bool {
        self.points.iter().any(|p| !p.is_finite())
    }
}

/// The three scalar signals a gesture drives: shape scale, shape-vs-chaos
/// blend, and roll around the view axis.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ControlSignals {
    pub expansion: f32,
    pub dispersion: f32,
    /// Radians, unbounded
    pub rotation: f32,
}

impl Default for ControlSignals {
    fn default() -> Self {
        Self {
            expansion: 1.0,
            dispersion: 0.0,
            rotation: 0.0,
        }
    }
}

/// Target point-cloud templates the particles assemble into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Shape {
    Heart,
    Flower,
    #[default]
    Saturn,
    Buddha,
    Fireworks,
    Sphere,
}

impl Shape {
    pub const ALL: [Shape; 6] = [
        Shape::Heart,
        Shape::Flower,
        Shape::Saturn,
        Shape::Buddha,
        Shape::Fireworks,
        Shape::Sphere,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Shape::Heart => "heart",
            Shape::Flower => "flower",
            Shape::Saturn => "saturn",
            Shape::Buddha => "buddha",
            Shape::Fireworks => "fireworks",
            Shape::Sphere => "sphere",
        }
    }

    /// Case-insensitive lookup by name, for CLI and UI selectors.
    pub fn parse(name: &str) -> Option<Shape> {
        Shape::ALL
            .iter()
            .copied()
            .find(|s| s.name().eq_ignore_ascii_case(name.trim()))
    }
}

/// Externally settable display parameters. The core only reacts to changes;
/// it never mutates these itself.
#[cfg(feature = "std")]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VisualSettings {
    pub shape: Shape,
    /// Hex display color, e.g. "#ffcc00"
    pub color: String,
    pub particle_count: usize,
    pub camera_enabled: bool,
}

#[cfg(feature = "std")]
impl Default for VisualSettings {
    fn default() -> Self {
        Self {
            shape: Shape::default(),
            color: String::from("#ffcc00"),
            particle_count: 14_000,
            camera_enabled: true,
        }
    }
}

/// Vision-pipeline health surfaced to the UI: whether hands are currently
/// recognized, and whether backend/camera initialization is still in flight.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct TrackerStatus {
    pub hands_detected: bool,
    pub loading: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landmark_distance_xy() {
        let a = Landmark::new(0.0, 0.0, 0.5);
        let b = Landmark::new(0.3, 0.4, -0.5);
        assert_eq!(a.distance_xy(&b), 0.5);
    }

    #[test]
    fn test_landmark_set_from_slice_requires_21_points() {
        let short = [Landmark::default(); 20];
        assert!(LandmarkSet::from_slice(&short).is_none());

        let exact = [Landmark::default(); LANDMARK_COUNT];
        assert!(LandmarkSet::from_slice(&exact).is_some());
    }

    #[test]
    fn test_degenerate_set_detection() {
        let mut points = [Landmark::new(0.5, 0.5, 0.0); LANDMARK_COUNT];
        let set = LandmarkSet::new(points);
        assert!(!set.is_degenerate());

        points[MIDDLE_MCP].y = f32::NAN;
        let set = LandmarkSet::new(points);
        assert!(set.is_degenerate());
    }

    #[test]
    fn test_default_control_signals() {
        let signals = ControlSignals::default();
        assert_eq!(signals.expansion, 1.0);
        assert_eq!(signals.dispersion, 0.0);
        assert_eq!(signals.rotation, 0.0);
    }

    #[test]
    fn test_shape_parse_round_trip() {
        for shape in Shape::ALL {
            assert_eq!(Shape::parse(shape.name()), Some(shape));
        }
        assert_eq!(Shape::parse("SATURN"), Some(Shape::Saturn));
        assert_eq!(Shape::parse(" heart "), Some(Shape::Heart));
        assert_eq!(Shape::parse("cube"), None);
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_visual_settings_defaults() {
        let settings = VisualSettings::default();
        assert_eq!(settings.shape, Shape::Saturn);
        assert_eq!(settings.color, "#ffcc00");
        assert_eq!(settings.particle_count, 14_000);
        assert!(settings.camera_enabled);
    }
}
