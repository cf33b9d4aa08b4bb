//! Software point-cloud preview.
//!
//! Stands in for the GPU pipeline: perspective-projects the simulator's
//! position buffer into a BGR image, applies the cloud orientation and the
//! selected color, and shows it in a `highgui` window. A demo surface of
//! the rendering boundary, not a renderer.

use anyhow::Result;
use opencv::{
    core::{Mat, Point, Scalar, CV_8UC3},
    highgui, imgproc,
    prelude::*,
};

/// Camera distance along +z, matching the original scene setup
const CAMERA_DISTANCE: f32 = 8.0;
/// Vertical field of view in degrees
const FOV_DEGREES: f32 = 60.0;

/// Parse "#rrggbb" (leading '#' optional) into RGB components.
pub fn parse_hex_color(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.trim().trim_start_matches('#');
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some((r, g, b))
}

pub struct Preview {
    window: String,
    width: i32,
    height: i32,
    color: Scalar,
}

impl Preview {
    pub fn new(window: &str, width: i32, height: i32, color: &str) -> Result<Self> {
        highgui::named_window(window, highgui::WINDOW_AUTOSIZE)?;
        let mut preview = Self {
            window: window.to_string(),
            width,
            height,
            color: Scalar::new(0.0, 204.0, 255.0, 0.0),
        };
        preview.set_color(color);
        Ok(preview)
    }

    pub fn set_color(&mut self, color: &str) {
        match parse_hex_color(color) {
            Some((r, g, b)) => {
                self.color = Scalar::new(b as f64, g as f64, r as f64, 0.0);
            }
            None => log::warn!("ignoring unparseable color {:?}", color),
        }
    }

    /// Project and draw one frame of the position buffer.
    pub fn draw(&self, positions: &[f32], orientation: [f32; 3], overlay: &str) -> Result<()> {
        let mut canvas = Mat::new_rows_cols_with_default(
            self.height,
            self.width,
            CV_8UC3,
            Scalar::new(5.0, 5.0, 5.0, 0.0),
        )?;

        let focal = (self.height as f32 / 2.0) / (FOV_DEGREES.to_radians() / 2.0).tan();
        let (cx, cy) = (self.width as f32 / 2.0, self.height as f32 / 2.0);
        let [rot_x, rot_y, rot_z] = orientation;

        for chunk in positions.chunks_exact(3) {
            let [x, y, z] = rotate(chunk[0], chunk[1], chunk[2], rot_x, rot_y, rot_z);

            let depth = CAMERA_DISTANCE - z;
            if depth < 0.1 {
                continue;
            }
            let scale = focal / depth;
            let px = (cx + x * scale) as i32;
            // Image y grows downward
            let py = (cy - y * scale) as i32;
            if px < 0 || px >= self.width || py < 0 || py >= self.height {
                continue;
            }

            imgproc::circle(
                &mut canvas,
                Point::new(px, py),
                1,
                self.color,
                -1,
                imgproc::LINE_8,
                0,
            )?;
        }

        imgproc::put_text(
            &mut canvas,
            overlay,
            Point::new(10, 30),
            imgproc::FONT_HERSHEY_SIMPLEX,
            0.6,
            Scalar::new(255.0, 255.0, 255.0, 0.0),
            1,
            imgproc::LINE_8,
            false,
        )?;

        highgui::imshow(&self.window, &canvas)?;
        Ok(())
    }
}

/// Apply the cloud's Euler angles: gesture roll (z), then ambient spin (y),
/// then rocking (x).
fn rotate(x: f32, y: f32, z: f32, rot_x: f32, rot_y: f32, rot_z: f32) -> [f32; 3] {
    let (sz, cz) = rot_z.sin_cos();
    let (x, y) = (x * cz - y * sz, x * sz + y * cz);

    let (sy, cy) = rot_y.sin_cos();
    let (x, z) = (x * cy + z * sy, -x * sy + z * cy);

    let (sx, cx) = rot_x.sin_cos();
    let (y, z) = (y * cx - z * sx, y * sx + z * cx);

    [x, y, z]
}
