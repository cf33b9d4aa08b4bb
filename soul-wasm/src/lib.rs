//! Browser frontend for the particle visualization.
//!
//! The host page runs the vision model (e.g. MediaPipe HandLandmarker) and
//! owns the camera; it feeds raw landmark arrays in, drives `advance` from
//! `requestAnimationFrame`, and this crate projects the particle cloud onto
//! a 2D canvas.

use soul_core::{GestureInterpreter, ParticleSystem};
use soul_shared::{ControlSignals, Landmark, LandmarkSet, Shape, LANDMARK_COUNT};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console)]
    fn log(s: &str);
}

macro_rules! console_log {
    ($($t:tt)*) => (log(&format_args!($($t)*).to_string()))
}

const CAMERA_DISTANCE: f32 = 8.0;
const FOV_DEGREES: f32 = 60.0;

#[wasm_bindgen]
pub struct SoulVisualization {
    system: ParticleSystem,
    interpreter: GestureInterpreter,
    signals: ControlSignals,
    hands_detected: bool,
    color: String,
    canvas: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
}

#[wasm_bindgen]
impl SoulVisualization {
    #[wasm_bindgen(constructor)]
    pub fn new(canvas_id: &str, particle_count: usize) -> Result<SoulVisualization, JsValue> {
        console_log!(
            "initializing particle soul with {} particles",
            particle_count
        );

        let window = web_sys::window().ok_or("no global window")?;
        let document = window.document().ok_or("no document")?;
        let canvas = document
            .get_element_by_id(canvas_id)
            .ok_or("canvas not found")?
            .dyn_into::<HtmlCanvasElement>()?;

        let context = canvas
            .get_context("2d")?
            .ok_or("no 2d context")?
            .dyn_into::<CanvasRenderingContext2d>()?;

        Ok(SoulVisualization {
            system: ParticleSystem::new(Shape::default(), particle_count),
            interpreter: GestureInterpreter::new(),
            signals: ControlSignals::default(),
            hands_detected: false,
            color: String::from("#ffcc00"),
            canvas,
            context,
        })
    }

    /// Feed one video frame of landmarks: a flat `[hands x 21 x 3]` array
    /// of normalized x, y, z. Stale timestamps are skipped; a count other
    /// than one or two hands falls back to default signals.
    pub fn process_landmarks(&mut self, landmarks: &js_sys::Float32Array, timestamp_ms: f64) {
        let flat = landmarks.to_vec();
        let mut sets = Vec::new();
        for hand in flat.chunks_exact(LANDMARK_COUNT * 3) {
            let mut points = [Landmark::default(); LANDMARK_COUNT];
            for (i, coords) in hand.chunks_exact(3).enumerate() {
                points[i] = Landmark::new(coords[0], coords[1], coords[2]);
            }
            sets.push(LandmarkSet::new(points));
        }

        self.hands_detected = sets.iter().any(|s| !s.is_degenerate());
        self.signals = self.interpreter.process(timestamp_ms, &sets);
    }

    /// Call when the host's vision pipeline is stopped: gesture state
    /// restarts from defaults, ambient motion keeps running.
    pub fn clear_hands(&mut self) {
        self.interpreter = GestureInterpreter::new();
        self.signals = ControlSignals::default();
        self.hands_detected = false;
    }

    /// Advance one render frame. `time_secs` is the host's elapsed clock.
    pub fn advance(&mut self, time_secs: f32) {
        self.system.advance(time_secs, &self.signals);
    }

    pub fn render(&self) -> Result<(), JsValue> {
        let width = self.canvas.width() as f64;
        let height = self.canvas.height() as f64;

        self.context.set_global_alpha(1.0);
        self.context.set_fill_style_str("#050505");
        self.context.fill_rect(0.0, 0.0, width, height);

        self.context.set_fill_style_str(&self.color);
        self.context.set_global_alpha(0.8);

        let focal = (height as f32 / 2.0) / (FOV_DEGREES.to_radians() / 2.0).tan();
        let [rot_x, rot_y, rot_z] = self.system.orientation();

        for chunk in self.system.positions().chunks_exact(3) {
            let [x, y, z] = rotate(chunk[0], chunk[1], chunk[2], rot_x, rot_y, rot_z);
            let depth = CAMERA_DISTANCE - z;
            if depth < 0.1 {
                continue;
            }
            let scale = focal / depth;
            let px = width / 2.0 + (x * scale) as f64;
            let py = height / 2.0 - (y * scale) as f64;
            self.context.fill_rect(px, py, 2.0, 2.0);
        }

        Ok(())
    }

    pub fn set_shape(&mut self, name: &str) -> Result<(), JsValue> {
        let shape = Shape::parse(name)
            .ok_or_else(|| JsValue::from_str(&format!("unknown shape {name:?}")))?;
        self.system.set_shape(shape);
        Ok(())
    }

    pub fn shape_name(&self) -> String {
        self.system.shape().name().to_string()
    }

    pub fn set_color(&mut self, color: &str) {
        self.color = color.to_string();
    }

    pub fn set_particle_count(&mut self, count: usize) {
        self.system.set_particle_count(count);
        console_log!("particle count set to {}", count);
    }

    pub fn particle_count(&self) -> usize {
        self.system.particle_count()
    }

    pub fn hands_detected(&self) -> bool {
        self.hands_detected
    }

    pub fn expansion(&self) -> f32 {
        self.signals.expansion
    }

    pub fn dispersion(&self) -> f32 {
        self.signals.dispersion
    }

    pub fn rotation(&self) -> f32 {
        self.signals.rotation
    }
}

/// Euler rotation of the whole cloud: gesture roll (z), ambient spin (y),
/// rocking (x).
fn rotate(x: f32, y: f32, z: f32, rot_x: f32, rot_y: f32, rot_z: f32) -> [f32; 3] {
    let (sz, cz) = rot_z.sin_cos();
    let (x, y) = (x * cz - y * sz, x * sz + y * cz);

    let (sy, cy) = rot_y.sin_cos();
    let (x, z) = (x * cy + z * sy, -x * sy + z * cy);

    let (sx, cx) = rot_x.sin_cos();
    let (y, z) = (y * cx - z * sx, y * sx + z * cx);

    [x, y, z]
}
