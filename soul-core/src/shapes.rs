//! Shape sampling: one target point cloud distribution per [`Shape`].
//!
//! Each variant has its own sampling function drawing a single particle
//! position; [`generate`] fills a flat 3×N buffer. Sampling is random with
//! no fixed seed, so regeneration produces a fresh cloud from the same
//! statistical envelope.

use core::f32::consts::{PI, TAU};

use rand::Rng;
use soul_shared::Shape;

/// Saturn's axial tilt, applied to the whole cloud after sampling
const SATURN_TILT: f32 = PI / 6.0;

/// Sample a flat position buffer (x, y, z per particle) for `shape`.
///
/// O(count); callers regenerate only when shape identity or particle count
/// changes, never per render frame.
pub fn generate(shape: Shape, count: usize) -> Vec<f32> {
    let mut rng = rand::thread_rng();
    let mut positions = Vec::with_capacity(count * 3);
    for _ in 0..count {
        positions.extend_from_slice(&sample(shape, &mut rng));
    }
    positions
}

/// Draw one particle position from the shape's distribution.
pub fn sample<R: Rng>(shape: Shape, rng: &mut R) -> [f32; 3] {
    match shape {
        Shape::Heart => sample_heart(rng),
        Shape::Flower => sample_flower(rng),
        Shape::Saturn => sample_saturn(rng),
        Shape::Buddha => sample_buddha(rng),
        Shape::Fireworks => sample_fireworks(rng),
        Shape::Sphere => sample_sphere(rng),
    }
}

/// Parametric heart curve with positional jitter for volumetric thickness.
fn sample_heart<R: Rng>(rng: &mut R) -> [f32; 3] {
    let t = rng.gen_range(0.0..TAU);

    let hx = 16.0 * t.sin().powi(3);
    let hy = 13.0 * t.cos() - 5.0 * (2.0 * t).cos() - 2.0 * (3.0 * t).cos() - (4.0 * t).cos();
    let hz = 8.0 * t.cos() * t.sin();

    [
        hx * 0.1 + rng.gen_range(-0.25..0.25),
        hy * 0.1 + rng.gen_range(-0.25..0.25),
        hz * 0.1 + rng.gen_range(-1.0..1.0),
    ]
}

/// Four-petal polar rose, flattened on z, with radial spread for volume.
fn sample_flower<R: Rng>(rng: &mut R) -> [f32; 3] {
    let theta = rng.gen_range(0.0..TAU);
    let phi = rng.gen_range(0.0..PI);
    let r = 2.0 * (4.0 * theta).cos() + 1.0;
    let spread = rng.gen_range(0.0..2.0);

    [
        spread * r * phi.sin() * theta.cos(),
        spread * r * phi.sin() * theta.sin(),
        spread * r * phi.cos() * 0.3,
    ]
}

/// Thin ring (60% of particles) around a solid sphere (40%), the whole
/// cloud tilted 30 degrees about the z-axis.
fn sample_saturn<R: Rng>(rng: &mut R) -> [f32; 3] {
    let (x, y, z);
    if rng.gen::<f32>() > 0.4 {
        // Ring
        let theta = rng.gen_range(0.0..TAU);
        let r = 2.5 + rng.gen_range(0.0..1.5);
        x = r * theta.cos();
        z = r * theta.sin();
        y = rng.gen_range(-0.05..0.05);
    } else {
        // Planet body; acos keeps the elevation area-uniform
        let theta = rng.gen_range(0.0..TAU);
        let phi = (2.0 * rng.gen::<f32>() - 1.0).acos();
        let r = 1.5;
        x = r * phi.sin() * theta.cos();
        y = r * phi.sin() * theta.sin();
        z = r * phi.cos();
    }

    [
        x * SATURN_TILT.cos() - y * SATURN_TILT.sin(),
        x * SATURN_TILT.sin() + y * SATURN_TILT.cos(),
        z,
    ]
}

/// Meditative figure approximated as three stacked mass regions: head,
/// body, and a vertically flattened base for the seated silhouette.
fn sample_buddha<R: Rng>(rng: &mut R) -> [f32; 3] {
    let part = rng.gen::<f32>();
    let (center_y, r, y_squash) = if part < 0.25 {
        (1.8, 0.6, 1.0)
    } else if part < 0.6 {
        (0.5, 1.0, 1.0)
    } else {
        (-1.0, 1.6, 0.6)
    };

    let theta = rng.gen_range(0.0..TAU);
    let phi = (2.0 * rng.gen::<f32>() - 1.0).acos();

    [
        r * phi.sin() * theta.cos(),
        center_y + r * phi.sin() * theta.sin() * y_squash,
        r * phi.cos(),
    ]
}

/// Explosion rays: uniform spherical direction scaled by a random speed.
/// The magnitude doubles as the burst radius once the simulator scales it.
fn sample_fireworks<R: Rng>(rng: &mut R) -> [f32; 3] {
    let theta = rng.gen_range(0.0..TAU);
    let phi = (2.0 * rng.gen::<f32>() - 1.0).acos();
    let speed = 0.5 + rng.gen_range(0.0..4.0);

    [
        speed * phi.sin() * theta.cos(),
        speed * phi.sin() * theta.sin(),
        speed * phi.cos(),
    ]
}

fn sample_sphere<R: Rng>(rng: &mut R) -> [f32; 3] {
    let theta = rng.gen_range(0.0..TAU);
    let phi = (2.0 * rng.gen::<f32>() - 1.0).acos();
    let r = 2.0;

    [
        r * phi.sin() * theta.cos(),
        r * phi.sin() * theta.sin(),
        r * phi.cos(),
    ]
}
