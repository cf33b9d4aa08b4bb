//! Landmark estimation boundary.
//!
//! The core consumes 21-point landmark sets and does not care where they
//! come from. [`LandmarkEstimator`] is that seam; [`CentroidEstimator`] is
//! the bundled implementation, a deliberately rough skin-color contour
//! estimator that maps a convex hull onto the 21-point hand topology. Good
//! enough to drive the visualization in a demo; swap in bindings to a real
//! hand-pose model for production tracking.

use anyhow::Result;
use opencv::{
    core::{self, Mat, Point, Scalar, Size, Vector, BORDER_DEFAULT},
    imgproc,
    prelude::*,
};
use soul_shared::{Landmark, LandmarkSet, FINGERTIPS, LANDMARK_COUNT, WRIST};

/// Anything that can turn a video frame into zero or more hand landmark
/// sets. Timestamps are supplied so implementations may cache per-frame
/// work; deduplication itself happens upstream in the pipeline.
pub trait LandmarkEstimator {
    fn detect(&mut self, frame: &Mat, timestamp_ms: f64) -> Result<Vec<LandmarkSet>>;
}

/// Skin-mask contour estimator. Detects at most one hand.
pub struct CentroidEstimator {
    min_contour_area: f64,
}

impl CentroidEstimator {
    pub fn new() -> Result<Self> {
        Ok(Self {
            // Smaller blobs are noise, not hands
            min_contour_area: 5000.0,
        })
    }

    fn skin_mask(&self, frame: &Mat) -> Result<Mat> {
        let mut hsv = Mat::default();
        imgproc::cvt_color(frame, &mut hsv, imgproc::COLOR_BGR2HSV, 0)?;

        // Works for a range of skin tones under indoor light
        let lower_skin = Scalar::new(0.0, 20.0, 70.0, 0.0);
        let upper_skin = Scalar::new(20.0, 255.0, 255.0, 0.0);

        let mut mask = Mat::default();
        core::in_range(&hsv, &lower_skin, &upper_skin, &mut mask)?;

        let kernel = imgproc::get_structuring_element(
            imgproc::MORPH_ELLIPSE,
            Size::new(5, 5),
            Point::new(-1, -1),
        )?;

        let mut closed = Mat::default();
        imgproc::morphology_ex(
            &mask,
            &mut closed,
            imgproc::MORPH_CLOSE,
            &kernel,
            Point::new(-1, -1),
            2,
            BORDER_DEFAULT,
            core::Scalar::default(),
        )?;
        let mut opened = Mat::default();
        imgproc::morphology_ex(
            &closed,
            &mut opened,
            imgproc::MORPH_OPEN,
            &kernel,
            Point::new(-1, -1),
            2,
            BORDER_DEFAULT,
            core::Scalar::default(),
        )?;

        let mut smoothed = Mat::default();
        imgproc::gaussian_blur(
            &opened,
            &mut smoothed,
            Size::new(5, 5),
            0.0,
            0.0,
            BORDER_DEFAULT,
        )?;

        Ok(smoothed)
    }

    fn largest_contour(&self, mask: &Mat) -> Result<Option<Vector<Point>>> {
        let mut contours = Vector::<Vector<Point>>::new();
        imgproc::find_contours(
            mask,
            &mut contours,
            imgproc::RETR_EXTERNAL,
            imgproc::CHAIN_APPROX_SIMPLE,
            Point::new(0, 0),
        )?;

        let mut best: Option<(f64, Vector<Point>)> = None;
        for contour in contours.iter() {
            let area = imgproc::contour_area(&contour, false)?;
            if area > self.min_contour_area && best.as_ref().map_or(true, |(a, _)| area > *a) {
                best = Some((area, contour));
            }
        }
        Ok(best.map(|(_, contour)| contour))
    }

    /// Map the contour onto the 21-point topology: wrist at the bottom of
    /// the blob, palm center from image moments, fingertips from the
    /// topmost convex-hull vertices, finger joints interpolated along the
    /// palm-to-tip rays.
    fn contour_to_landmarks(
        &self,
        contour: &Vector<Point>,
        frame_width: f32,
        frame_height: f32,
    ) -> Result<Option<LandmarkSet>> {
        let moments = imgproc::moments(contour, false)?;
        if moments.m00 == 0.0 {
            return Ok(None);
        }
        let palm = Point::new(
            (moments.m10 / moments.m00) as i32,
            (moments.m01 / moments.m00) as i32,
        );

        let mut wrist = contour.get(0)?;
        for point in contour.iter() {
            if point.y > wrist.y {
                wrist = point;
            }
        }

        let mut hull_indices = Vector::<i32>::new();
        imgproc::convex_hull_idx(contour, &mut hull_indices, false, false)?;

        let mut candidates = Vec::new();
        for idx in hull_indices.iter() {
            let point = contour.get(idx as usize)?;
            // Fingertips live above the palm center
            if point.y < palm.y {
                candidates.push(point);
            }
        }
        if candidates.is_empty() {
            return Ok(None);
        }

        candidates.sort_by_key(|p| p.y);
        candidates.truncate(FINGERTIPS.len());
        // Left-to-right so the thumb-to-pinky ordering is stable
        candidates.sort_by_key(|p| p.x);
        if let Some(&last) = candidates.last() {
            while candidates.len() < FINGERTIPS.len() {
                candidates.push(last);
            }
        }

        let normalize =
            |p: Point| Landmark::new(p.x as f32 / frame_width, p.y as f32 / frame_height, 0.0);

        let mut points = [Landmark::default(); LANDMARK_COUNT];
        points[WRIST] = normalize(wrist);
        for (finger, tip) in candidates.iter().enumerate() {
            let base = 1 + finger * 4;
            for joint in 0..4 {
                let t = (joint + 1) as f32 / 4.0;
                let x = palm.x as f32 + (tip.x - palm.x) as f32 * t;
                let y = palm.y as f32 + (tip.y - palm.y) as f32 * t;
                points[base + joint] =
                    Landmark::new(x / frame_width, y / frame_height, 0.0);
            }
        }

        Ok(Some(LandmarkSet::new(points)))
    }
}

impl LandmarkEstimator for CentroidEstimator {
    fn detect(&mut self, frame: &Mat, _timestamp_ms: f64) -> Result<Vec<LandmarkSet>> {
        let width = frame.cols() as f32;
        let height = frame.rows() as f32;
        if width <= 0.0 || height <= 0.0 {
            return Ok(Vec::new());
        }

        let mask = self.skin_mask(frame)?;
        let Some(contour) = self.largest_contour(&mask)? else {
            return Ok(Vec::new());
        };

        match self.contour_to_landmarks(&contour, width, height)? {
            Some(set) => Ok(vec![set]),
            None => Ok(Vec::new()),
        }
    }
}
