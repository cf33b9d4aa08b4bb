//! Per-frame particle simulation.
//!
//! The [`ParticleSystem`] owns three flat 3×N buffers: the shape target
//! cloud (regenerated only on shape or count change), fixed per-particle
//! random offsets (the chaos direction each particle flies toward when
//! dispersed), and the rendered positions, the only buffer mutated every
//! frame. Positions ease toward a blend of the expanded shape and the
//! chaotic state, which gives the particles inertia instead of snapping.

use rand::Rng;
use soul_shared::{ControlSignals, Shape};

use crate::shapes;

/// Exponential easing rate per render frame, for positions and the
/// gesture-driven roll alike
pub const EASE: f32 = 0.25;

/// Ambient y-spin per frame, independent of gesture input
const AMBIENT_SPIN: f32 = 0.001;

/// Per-axis half-range of the fixed chaos offsets
const OFFSET_RANGE: f32 = 2.5;

pub struct ParticleSystem {
    shape: Shape,
    count: usize,
    /// Base (unscaled, unrotated) target position per particle
    targets: Vec<f32>,
    /// Fixed chaos direction per particle, never mutated after init
    offsets: Vec<f32>,
    /// Rendered positions; starts at the origin and eases outward
    positions: Vec<f32>,
    /// Euler angles (x rocking, y ambient spin, z gesture roll) for the
    /// renderer to apply to the whole cloud
    orientation: [f32; 3],
}

impl ParticleSystem {
    pub fn new(shape: Shape, count: usize) -> Self {
        log::debug!("particle system: {} x{}", shape.name(), count);
        Self {
            shape,
            count,
            targets: shapes::generate(shape, count),
            offsets: random_offsets(count),
            positions: vec![0.0; count * 3],
            orientation: [0.0; 3],
        }
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn particle_count(&self) -> usize {
        self.count
    }

    /// Flat (x, y, z) position buffer, ready for GPU upload. The simulator
    /// is the only writer.
    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    /// Object-space Euler angles for the renderer.
    pub fn orientation(&self) -> [f32; 3] {
        self.orientation
    }

    /// Switch the target shape. A full O(count) resample, paid once per
    /// change; rendered positions are kept so particles morph over.
    pub fn set_shape(&mut self, shape: Shape) {
        if shape == self.shape {
            return;
        }
        log::debug!("shape change: {} -> {}", self.shape.name(), shape.name());
        self.shape = shape;
        self.targets = shapes::generate(shape, self.count);
    }

    /// Resize the system. Regenerates all three buffers; new particles
    /// start from the origin again.
    pub fn set_particle_count(&mut self, count: usize) {
        if count == self.count {
            return;
        }
        log::debug!("particle count change: {} -> {}", self.count, count);
        self.count = count;
        self.targets = shapes::generate(self.shape, count);
        self.offsets = random_offsets(count);
        self.positions = vec![0.0; count * 3];
    }

    /// Advance one render frame. `time` is elapsed seconds on the render
    /// clock; `signals` is the latest control snapshot.
    ///
    /// If the target buffer does not match the position buffer the call is
    /// a no-op rather than a fault.
    pub fn advance(&mut self, time: f32, signals: &ControlSignals) {
        if self.targets.len() != self.positions.len() || self.positions.is_empty() {
            return;
        }

        let mut expansion = signals.expansion;
        if self.shape == Shape::Heart {
            // Heartbeat pulse
            expansion *= 1.0 + (time * 3.0).sin() * 0.05;
        }
        let dispersion = signals.dispersion;

        for i in 0..self.count {
            let i3 = i * 3;
            // Traveling wave, phase-offset by index so it ripples across
            // the cloud while dispersed
            let wave = (2.0 * time + i as f32 * 0.1).sin() * 0.2;

            for axis in 0..3 {
                let shape_pos = self.targets[i3 + axis] * expansion;
                let chaos_pos = shape_pos + (self.offsets[i3 + axis] + wave) * dispersion;
                let blended = shape_pos * (1.0 - dispersion) + chaos_pos * dispersion;
                self.positions[i3 + axis] += (blended - self.positions[i3 + axis]) * EASE;
            }
        }

        // Gesture roll eases at the same rate as positions; the ambient
        // spin and rocking keep the piece alive without any hands
        self.orientation[2] += (signals.rotation - self.orientation[2]) * EASE;
        self.orientation[1] += AMBIENT_SPIN;
        self.orientation[0] = (time * 0.2).sin() * 0.05;
    }
}

fn random_offsets(count: usize) -> Vec<f32> {
    let mut rng = rand::thread_rng();
    (0..count * 3)
        .map(|_| rng.gen_range(-OFFSET_RANGE..OFFSET_RANGE))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn max_error(system: &ParticleSystem) -> f32 {
        system
            .positions
            .iter()
            .zip(system.targets.iter())
            .map(|(p, t)| (p - t).abs())
            .fold(0.0f32, f32::max)
    }

    #[test]
    fn test_buffers_sized_and_zero_initialized() {
        let system = ParticleSystem::new(Shape::Sphere, 100);
        assert_eq!(system.positions().len(), 300);
        assert_eq!(system.targets.len(), 300);
        assert_eq!(system.offsets.len(), 300);
        assert!(system.positions().iter().all(|&p| p == 0.0));
        assert!(system
            .offsets
            .iter()
            .all(|o| (-OFFSET_RANGE..OFFSET_RANGE).contains(o)));
    }

    #[test]
    fn test_converges_to_targets_under_default_signals() {
        let mut system = ParticleSystem::new(Shape::Sphere, 200);
        let signals = ControlSignals::default();

        let mut previous = max_error(&system);
        for frame in 0..80 {
            system.advance(frame as f32 / 60.0, &signals);
            let error = max_error(&system);
            assert!(error <= previous + 1e-6, "frame {frame}: {error} > {previous}");
            previous = error;
        }
        assert!(previous < 1e-3, "residual error {previous}");
    }

    #[test]
    fn test_dispersion_pushes_particles_off_shape() {
        let mut system = ParticleSystem::new(Shape::Sphere, 200);
        let calm = ControlSignals::default();
        for frame in 0..120 {
            system.advance(frame as f32 / 60.0, &calm);
        }

        let dispersed = ControlSignals {
            dispersion: 1.0,
            ..ControlSignals::default()
        };
        for frame in 120..240 {
            system.advance(frame as f32 / 60.0, &dispersed);
        }

        // With full dispersion the chaos offsets dominate; the cloud must
        // no longer sit on the target shape
        assert!(max_error(&system) > 0.5);
    }

    #[test]
    fn test_expansion_scales_the_cloud() {
        let mut system = ParticleSystem::new(Shape::Sphere, 200);
        let expanded = ControlSignals {
            expansion: 3.0,
            ..ControlSignals::default()
        };
        for frame in 0..120 {
            system.advance(frame as f32 / 60.0, &expanded);
        }

        for (p, t) in system.positions.iter().zip(system.targets.iter()) {
            assert!((p - t * 3.0).abs() < 1e-2);
        }
    }

    #[test]
    fn test_mismatched_target_buffer_is_a_no_op() {
        let mut system = ParticleSystem::new(Shape::Sphere, 100);
        system.advance(0.0, &ControlSignals::default());
        let before = system.positions().to_vec();

        // Simulate a half-applied reconfiguration
        system.targets.truncate(30);
        system.advance(1.0, &ControlSignals::default());
        assert_eq!(system.positions(), &before[..]);
    }

    #[test]
    fn test_empty_system_advances_without_panic() {
        let mut system = ParticleSystem::new(Shape::Fireworks, 0);
        system.advance(0.5, &ControlSignals::default());
        assert!(system.positions().is_empty());
    }

    #[test]
    fn test_set_shape_regenerates_targets_only() {
        let mut system = ParticleSystem::new(Shape::Sphere, 150);
        let offsets_before = system.offsets.clone();
        system.advance(0.0, &ControlSignals::default());
        let positions_before = system.positions().to_vec();

        system.set_shape(Shape::Heart);
        assert_eq!(system.shape(), Shape::Heart);
        assert_eq!(system.targets.len(), 150 * 3);
        // Chaos directions and rendered positions survive a shape change
        assert_eq!(system.offsets, offsets_before);
        assert_eq!(system.positions(), &positions_before[..]);
    }

    #[test]
    fn test_set_particle_count_resets_positions() {
        let mut system = ParticleSystem::new(Shape::Sphere, 100);
        system.advance(0.0, &ControlSignals::default());

        system.set_particle_count(250);
        assert_eq!(system.particle_count(), 250);
        assert_eq!(system.positions().len(), 750);
        assert_eq!(system.targets.len(), 750);
        assert_eq!(system.offsets.len(), 750);
        assert!(system.positions().iter().all(|&p| p == 0.0));
    }

    #[test]
    fn test_same_shape_or_count_does_not_resample() {
        let mut system = ParticleSystem::new(Shape::Saturn, 100);
        let targets = system.targets.clone();
        system.set_shape(Shape::Saturn);
        system.set_particle_count(100);
        assert_eq!(system.targets, targets);
    }

    #[test]
    fn test_gesture_roll_eases_and_ambient_motion_runs() {
        let mut system = ParticleSystem::new(Shape::Sphere, 10);
        let rotated = ControlSignals {
            rotation: 1.0,
            ..ControlSignals::default()
        };

        for frame in 0..60 {
            system.advance(frame as f32 / 60.0, &rotated);
        }
        let [rock, spin, roll] = system.orientation();
        assert!((roll - 1.0).abs() < 1e-3, "roll {roll}");
        assert!((spin - 60.0 * AMBIENT_SPIN).abs() < 1e-6, "spin {spin}");
        // Rocking follows sin(0.2 t) of the last frame time
        assert!((rock - (59.0_f32 / 60.0 * 0.2).sin() * 0.05).abs() < 1e-6);
    }

    #[test]
    fn test_heart_pulse_modulates_expansion() {
        let mut system = ParticleSystem::new(Shape::Heart, 50);
        let signals = ControlSignals::default();

        // Settle at a time where sin(3t) = 1 so the pulse is +5%
        let peak = core::f32::consts::FRAC_PI_2 / 3.0;
        for _ in 0..200 {
            system.advance(peak, &signals);
        }
        for (p, t) in system.positions.iter().zip(system.targets.iter()) {
            assert!((p - t * 1.05).abs() < 1e-2);
        }
    }
}
