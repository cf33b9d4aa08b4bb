//! Vision pipeline lifecycle tests against a scripted backend; no camera
//! or live model needed.

use anyhow::Result;
use opencv::core::Mat;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use soul_client::estimator::LandmarkEstimator;
use soul_client::pipeline::{Backend, PipelineState, VisionPipeline};
use soul_shared::{Landmark, LandmarkSet, FINGERTIPS, LANDMARK_COUNT, MIDDLE_MCP};

/// Upright synthetic hand with its middle knuckle at `(mcp_x, mcp_y)`.
fn synthetic_hand(mcp_x: f32, mcp_y: f32, tip_dist: f32) -> LandmarkSet {
    let (cx, cy) = (mcp_x, mcp_y + 0.1);
    let mut points = [Landmark::new(cx, cy, 0.0); LANDMARK_COUNT];
    points[MIDDLE_MCP] = Landmark::new(mcp_x, mcp_y, 0.0);
    for &tip in FINGERTIPS.iter() {
        points[tip] = Landmark::new(cx + tip_dist, cy, 0.0);
    }
    LandmarkSet::new(points)
}

/// Frame source yielding empty frames with scripted timestamps; flags its
/// own drop so tests can observe the device release.
struct ScriptedSource {
    timestamps: Vec<f64>,
    cursor: usize,
    released: Arc<AtomicBool>,
}

impl soul_client::pipeline::FrameSource for ScriptedSource {
    fn grab(&mut self) -> Result<Option<(Mat, f64)>> {
        let Some(&timestamp) = self.timestamps.get(self.cursor) else {
            return Ok(None);
        };
        self.cursor += 1;
        Ok(Some((Mat::default(), timestamp)))
    }
}

impl Drop for ScriptedSource {
    fn drop(&mut self) {
        self.released.store(true, Ordering::SeqCst);
    }
}

/// Estimator returning the same hands every call, counting invocations.
struct ScriptedEstimator {
    hands: Vec<LandmarkSet>,
    calls: Arc<AtomicUsize>,
}

impl LandmarkEstimator for ScriptedEstimator {
    fn detect(&mut self, _frame: &Mat, _timestamp_ms: f64) -> Result<Vec<LandmarkSet>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.hands.clone())
    }
}

struct Probe {
    opens: Arc<AtomicUsize>,
    detections: Arc<AtomicUsize>,
    released: Arc<AtomicBool>,
}

fn scripted_pipeline(timestamps: Vec<f64>, hands: Vec<LandmarkSet>) -> (VisionPipeline, Probe) {
    let probe = Probe {
        opens: Arc::new(AtomicUsize::new(0)),
        detections: Arc::new(AtomicUsize::new(0)),
        released: Arc::new(AtomicBool::new(false)),
    };

    let opens = probe.opens.clone();
    let detections = probe.detections.clone();
    let released = probe.released.clone();
    let pipeline = VisionPipeline::new(Box::new(move || {
        opens.fetch_add(1, Ordering::SeqCst);
        let source = ScriptedSource {
            timestamps: timestamps.clone(),
            cursor: 0,
            released: released.clone(),
        };
        let estimator = ScriptedEstimator {
            hands: hands.clone(),
            calls: detections.clone(),
        };
        let backend: Backend = (Box::new(source), Box::new(estimator));
        Ok(backend)
    }));

    (pipeline, probe)
}

#[test]
fn test_idle_pipeline_reports_defaults() {
    let (mut pipeline, probe) = scripted_pipeline(vec![1.0], vec![]);

    let (signals, status) = pipeline.poll();
    assert_eq!(signals, soul_shared::ControlSignals::default());
    assert!(!status.hands_detected);
    assert!(!status.loading);
    assert_eq!(probe.opens.load(Ordering::SeqCst), 0);
}

#[test]
fn test_disable_before_first_poll_cancels_initialization() {
    let (mut pipeline, probe) = scripted_pipeline(vec![1.0, 2.0], vec![synthetic_hand(0.5, 0.5, 0.2)]);

    pipeline.enable();
    assert_eq!(pipeline.state(), PipelineState::Initializing);

    // Cancelled before initialization ever ran: the backend must never open
    pipeline.disable();
    for _ in 0..5 {
        pipeline.poll();
    }
    assert_eq!(probe.opens.load(Ordering::SeqCst), 0);
    assert_eq!(probe.detections.load(Ordering::SeqCst), 0);
    assert_eq!(pipeline.state(), PipelineState::Idle);
}

#[test]
fn test_disable_releases_source_and_stops_inference() {
    let timestamps = vec![1.0, 2.0, 3.0, 4.0, 5.0];
    let (mut pipeline, probe) = scripted_pipeline(timestamps, vec![synthetic_hand(0.5, 0.5, 0.2)]);

    pipeline.enable();
    pipeline.poll(); // initialization
    pipeline.poll();
    pipeline.poll();
    assert_eq!(pipeline.state(), PipelineState::Running);
    let detections_before = probe.detections.load(Ordering::SeqCst);
    assert_eq!(detections_before, 2);
    assert!(!probe.released.load(Ordering::SeqCst));

    pipeline.disable();
    assert!(probe.released.load(Ordering::SeqCst), "capture not released");

    for _ in 0..5 {
        let (signals, status) = pipeline.poll();
        assert!(!status.hands_detected);
        assert_eq!(signals, soul_shared::ControlSignals::default());
    }
    assert_eq!(probe.detections.load(Ordering::SeqCst), detections_before);
}

#[test]
fn test_duplicate_timestamps_skip_inference() {
    let timestamps = vec![10.0, 10.0, 10.0, 20.0];
    let (mut pipeline, probe) = scripted_pipeline(timestamps, vec![synthetic_hand(0.5, 0.5, 0.2)]);

    pipeline.enable();
    pipeline.poll(); // initialization
    for _ in 0..4 {
        pipeline.poll();
    }

    // 10.0 runs once, the two replays are skipped, 20.0 runs once
    assert_eq!(probe.detections.load(Ordering::SeqCst), 2);
}

#[test]
fn test_failed_initialization_is_recoverable_and_non_fatal() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let attempts_in_opener = attempts.clone();
    let mut pipeline = VisionPipeline::new(Box::new(move || {
        attempts_in_opener.fetch_add(1, Ordering::SeqCst);
        anyhow::bail!("camera is gone")
    }));

    pipeline.enable();
    let (signals, status) = pipeline.poll();
    assert_eq!(pipeline.state(), PipelineState::Failed);
    assert_eq!(signals, soul_shared::ControlSignals::default());
    assert!(!status.hands_detected);

    // Failed state does not retry on its own...
    pipeline.poll();
    assert_eq!(attempts.load(Ordering::SeqCst), 1);

    // ...but re-enabling starts over from scratch
    pipeline.enable();
    pipeline.poll();
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[test]
fn test_two_hand_snapshot_drives_signals() {
    let hands = vec![
        synthetic_hand(0.3, 0.5, 0.1),
        synthetic_hand(0.7, 0.5, 0.1),
    ];
    let timestamps: Vec<f64> = (1..120).map(|i| i as f64 * 33.0).collect();
    let (mut pipeline, _probe) = scripted_pipeline(timestamps, hands);

    pipeline.enable();
    let mut snapshot = pipeline.poll();
    for _ in 0..100 {
        snapshot = pipeline.poll();
    }

    let (signals, status) = snapshot;
    assert!(status.hands_detected);
    // Horizontal hands 0.4 apart: expansion 0.4 * 3.5, rotation level
    assert!((signals.expansion - 1.4).abs() < 1e-3, "expansion {}", signals.expansion);
    assert!(signals.rotation.abs() < 1e-3, "rotation {}", signals.rotation);
}

#[test]
fn test_source_exhaustion_keeps_last_signals() {
    let (mut pipeline, _probe) = scripted_pipeline(vec![1.0], vec![synthetic_hand(0.5, 0.5, 0.32)]);

    pipeline.enable();
    pipeline.poll(); // initialization
    let (after_frame, _) = pipeline.poll();
    assert!(after_frame.dispersion > 0.0);

    // Out of frames: polls are quiet, signals hold
    let (held, status) = pipeline.poll();
    assert_eq!(held, after_frame);
    assert_eq!(pipeline.state(), PipelineState::Running);
    assert!(status.hands_detected);
}
