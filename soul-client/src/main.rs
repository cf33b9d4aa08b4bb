use anyhow::{Context, Result};
use clap::Parser;
use opencv::highgui;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use soul_core::ParticleSystem;
use soul_shared::{ControlSignals, Shape, TrackerStatus, VisualSettings};

use soul_client::pipeline::VisionPipeline;
use soul_client::preview::Preview;

#[derive(Parser, Debug)]
#[command(author, version, about = "Gesture-driven particle visualization", long_about = None)]
struct Args {
    /// Initial shape template (heart, flower, saturn, buddha, fireworks, sphere)
    #[arg(short, long, default_value = "saturn")]
    shape: String,

    /// Particle color as a hex string
    #[arg(long, default_value = "#ffcc00")]
    color: String,

    /// Number of particles
    #[arg(short = 'n', long, default_value_t = 14_000)]
    particles: usize,

    /// Camera device id
    #[arg(short, long, default_value_t = 0)]
    camera: i32,

    /// Start with the camera disabled (ambient motion only)
    #[arg(long)]
    no_camera: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

enum VisionCommand {
    Enable,
    Disable,
    Shutdown,
}

/// Vision loop: one thread driving the pipeline at roughly camera rate and
/// publishing snapshots. The render loop drains the channel and keeps the
/// latest, so the two sides never share mutable state.
fn run_vision_loop(
    mut pipeline: VisionPipeline,
    snapshots: Sender<(ControlSignals, TrackerStatus)>,
    commands: Receiver<VisionCommand>,
) {
    loop {
        match commands.try_recv() {
            Ok(VisionCommand::Enable) => pipeline.enable(),
            Ok(VisionCommand::Disable) => pipeline.disable(),
            Ok(VisionCommand::Shutdown) | Err(TryRecvError::Disconnected) => break,
            Err(TryRecvError::Empty) => {}
        }

        let snapshot = pipeline.poll();
        if snapshots.send(snapshot).is_err() {
            break;
        }
        thread::sleep(Duration::from_millis(15));
    }
    pipeline.disable();
}

fn shape_for_key(key: i32) -> Option<Shape> {
    let index = (key - '1' as i32) as usize;
    Shape::ALL.get(index).copied()
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.debug {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    }

    let shape = Shape::parse(&args.shape)
        .with_context(|| format!("unknown shape {:?}", args.shape))?;
    let mut settings = VisualSettings {
        shape,
        color: args.color.clone(),
        particle_count: args.particles,
        camera_enabled: !args.no_camera,
    };
    log::info!("particle soul starting...");
    log::debug!(
        "settings: {}",
        serde_json::to_string(&settings).context("serializing settings")?
    );

    let mut system = ParticleSystem::new(settings.shape, settings.particle_count);
    let preview = Preview::new("Particle Soul", 960, 720, &settings.color)?;

    let (snapshot_tx, snapshot_rx) = mpsc::channel();
    let (command_tx, command_rx) = mpsc::channel();
    let mut pipeline = VisionPipeline::with_camera(args.camera);
    if settings.camera_enabled {
        pipeline.enable();
    }
    let vision = thread::spawn(move || run_vision_loop(pipeline, snapshot_tx, command_rx));

    let start = Instant::now();
    let mut signals = ControlSignals::default();
    let mut status = TrackerStatus::default();
    let mut frame_count = 0u32;
    let mut last_fps_time = Instant::now();
    let mut fps = 0.0;

    loop {
        // Keep only the newest published snapshot
        for snapshot in snapshot_rx.try_iter() {
            (signals, status) = snapshot;
        }

        system.advance(start.elapsed().as_secs_f32(), &signals);

        frame_count += 1;
        if last_fps_time.elapsed().as_secs() >= 1 {
            fps = frame_count as f64 / last_fps_time.elapsed().as_secs_f64();
            frame_count = 0;
            last_fps_time = Instant::now();
        }

        let tracker_text = if !settings.camera_enabled {
            "camera off"
        } else if status.loading {
            "init..."
        } else if status.hands_detected {
            "hands detected"
        } else {
            "waiting for hands..."
        };
        let overlay = format!(
            "{} | {} | {:.1} fps",
            system.shape().name(),
            tracker_text,
            fps
        );
        preview.draw(system.positions(), system.orientation(), &overlay)?;

        let key = highgui::wait_key(16)?;
        if key == 'q' as i32 {
            log::info!("quit requested");
            break;
        } else if key == 'c' as i32 {
            settings.camera_enabled = !settings.camera_enabled;
            let command = if settings.camera_enabled {
                VisionCommand::Enable
            } else {
                VisionCommand::Disable
            };
            if command_tx.send(command).is_err() {
                log::warn!("vision thread is gone");
            }
            if !settings.camera_enabled {
                // No gesture control without a camera
                signals = ControlSignals::default();
                status = TrackerStatus::default();
            }
        } else if let Some(shape) = shape_for_key(key) {
            settings.shape = shape;
            system.set_shape(shape);
        }
    }

    let _ = command_tx.send(VisionCommand::Shutdown);
    if vision.join().is_err() {
        log::warn!("vision thread panicked");
    }

    Ok(())
}
