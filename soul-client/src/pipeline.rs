//! Vision pipeline lifecycle and the control-signal handoff.
//!
//! The pipeline owns the camera and estimator behind a cancellable state
//! machine: `enable` only marks initialization pending, the next `poll`
//! performs it, so a `disable` arriving in between cancels cleanly before
//! the camera is ever touched. Disabling drops the frame source, which
//! releases the capture device synchronously; re-enabling starts over from
//! scratch, with no resume semantics.
//!
//! Each `poll` yields a `(ControlSignals, TrackerStatus)` snapshot for the
//! render loop. The intended wiring is single-writer/single-reader: one
//! vision thread publishing snapshots over a channel, one render loop
//! draining it and keeping the latest.

use anyhow::Result;
use opencv::{
    core::Mat,
    prelude::*,
    videoio::{self, VideoCapture, VideoCaptureAPIs},
};
use std::time::Instant;

use soul_core::GestureInterpreter;
use soul_shared::{ControlSignals, TrackerStatus};

use crate::estimator::{CentroidEstimator, LandmarkEstimator};

/// A live video frame source. Dropping it must release the underlying
/// device.
pub trait FrameSource {
    /// Next frame with its capture timestamp in milliseconds, or `None`
    /// when no frame is available right now.
    fn grab(&mut self) -> Result<Option<(Mat, f64)>>;
}

/// Camera-backed frame source (default capture: 640x480).
pub struct CameraSource {
    capture: VideoCapture,
    epoch: Instant,
}

impl CameraSource {
    pub fn open(camera_id: i32) -> Result<Self> {
        log::info!("opening camera device {}...", camera_id);
        let mut capture = VideoCapture::new(camera_id, VideoCaptureAPIs::CAP_ANY as i32)?;
        if !capture.is_opened()? {
            anyhow::bail!("failed to open camera device {}", camera_id);
        }
        capture.set(videoio::CAP_PROP_FRAME_WIDTH, 640.0)?;
        capture.set(videoio::CAP_PROP_FRAME_HEIGHT, 480.0)?;
        log::info!("camera device {} opened", camera_id);

        Ok(Self {
            capture,
            epoch: Instant::now(),
        })
    }
}

impl FrameSource for CameraSource {
    fn grab(&mut self) -> Result<Option<(Mat, f64)>> {
        let mut frame = Mat::default();
        self.capture.read(&mut frame)?;
        if frame.empty() {
            return Ok(None);
        }

        let mut timestamp_ms = self.capture.get(videoio::CAP_PROP_POS_MSEC)?;
        if timestamp_ms <= 0.0 {
            // Some backends report no stream position; fall back to the
            // capture clock
            timestamp_ms = self.epoch.elapsed().as_secs_f64() * 1000.0;
        }
        Ok(Some((frame, timestamp_ms)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Camera disabled; nothing held, nothing polled
    Idle,
    /// Enable requested; backend opens on the next poll
    Initializing,
    Running,
    /// Initialization or capture failed; recoverable by re-enabling
    Failed,
}

pub type Backend = (Box<dyn FrameSource + Send>, Box<dyn LandmarkEstimator + Send>);
pub type BackendOpener = Box<dyn FnMut() -> Result<Backend> + Send>;

pub struct VisionPipeline {
    opener: BackendOpener,
    state: PipelineState,
    backend: Option<Backend>,
    interpreter: GestureInterpreter,
    last_timestamp_ms: f64,
    hands_detected: bool,
}

impl VisionPipeline {
    pub fn new(opener: BackendOpener) -> Self {
        Self {
            opener,
            state: PipelineState::Idle,
            backend: None,
            interpreter: GestureInterpreter::new(),
            last_timestamp_ms: -1.0,
            hands_detected: false,
        }
    }

    /// Pipeline over a real camera and the bundled skin-mask estimator.
    pub fn with_camera(camera_id: i32) -> Self {
        Self::new(Box::new(move || {
            let source = CameraSource::open(camera_id)?;
            let estimator = CentroidEstimator::new()?;
            Ok((
                Box::new(source) as Box<dyn FrameSource + Send>,
                Box::new(estimator) as Box<dyn LandmarkEstimator + Send>,
            ))
        }))
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn is_enabled(&self) -> bool {
        matches!(
            self.state,
            PipelineState::Initializing | PipelineState::Running
        )
    }

    /// Request the camera. Initialization itself happens on the next
    /// [`VisionPipeline::poll`].
    pub fn enable(&mut self) {
        if matches!(self.state, PipelineState::Idle | PipelineState::Failed) {
            self.state = PipelineState::Initializing;
        }
    }

    /// Turn the camera off. Synchronously releases the capture device and
    /// cancels any initialization that has not run yet; no further
    /// estimator calls happen until re-enabled.
    pub fn disable(&mut self) {
        if self.backend.is_some() {
            log::info!("camera released");
        }
        self.backend = None;
        self.state = PipelineState::Idle;
        self.hands_detected = false;
        // No resume semantics: gesture state restarts from defaults
        self.interpreter = GestureInterpreter::new();
        self.last_timestamp_ms = -1.0;
    }

    /// Drive the pipeline one step and return the current snapshot.
    pub fn poll(&mut self) -> (ControlSignals, TrackerStatus) {
        match self.state {
            PipelineState::Idle | PipelineState::Failed => {}
            PipelineState::Initializing => self.initialize(),
            PipelineState::Running => self.pump_frame(),
        }

        let status = TrackerStatus {
            hands_detected: self.hands_detected,
            loading: self.state == PipelineState::Initializing,
        };
        (self.interpreter.signals(), status)
    }

    fn initialize(&mut self) {
        match (self.opener)() {
            Ok(backend) => {
                self.backend = Some(backend);
                self.state = PipelineState::Running;
            }
            Err(err) => {
                // Non-fatal: the visualization keeps running on defaults
                log::warn!("vision backend initialization failed: {:#}", err);
                self.state = PipelineState::Failed;
            }
        }
    }

    fn pump_frame(&mut self) {
        let Some((source, estimator)) = self.backend.as_mut() else {
            self.state = PipelineState::Failed;
            return;
        };

        let grabbed = match source.grab() {
            Ok(grabbed) => grabbed,
            Err(err) => {
                log::warn!("camera read failed, releasing device: {:#}", err);
                self.backend = None;
                self.state = PipelineState::Failed;
                self.hands_detected = false;
                return;
            }
        };
        let Some((frame, timestamp_ms)) = grabbed else {
            return;
        };

        // Stale frame: skip inference entirely
        if timestamp_ms == self.last_timestamp_ms {
            return;
        }
        self.last_timestamp_ms = timestamp_ms;

        let sets = match estimator.detect(&frame, timestamp_ms) {
            Ok(sets) => sets,
            Err(err) => {
                // Degenerate inference counts as "no hands", never an error
                log::debug!("landmark estimation failed: {:#}", err);
                Vec::new()
            }
        };

        self.hands_detected = sets.iter().any(|s| !s.is_degenerate());
        self.interpreter.process(timestamp_ms, &sets);
    }
}
