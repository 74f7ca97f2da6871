// Drives the particle field headlessly: pulls frames from a source, runs the
// field pipeline at the configured frame rate, dumps canvas and motion PNGs,
// and runs the gesture loop against a scripted hand tracker.
//
// Usage: field_tester [--frames N] [--out DIR] [--source synthetic|denied|camera]
//                     [--config FILE] [--every K] [--width W] [--height H]

#[cfg(feature = "camera")]
mod camera;

use anyhow::{bail, Context};
use futures::StreamExt;
use mirror_field::core_modules::landmarks::HandLandmarks;
use mirror_field::core_modules::renderer::save_rgba_png;
use mirror_field::{
    AppConfig, AudioController, AudioSink, DeniedSource, FieldPipeline, Frame, FrameSource,
    GestureLoop, LandmarkPublisher, LoggingNavigator, NavigationRequest, Navigator, ScriptedTracker, SyntheticSource,
};
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Seconds each scripted hand pose is held.
const POSE_SECONDS: f32 = 6.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceKind {
    Synthetic,
    Denied,
    Camera,
}

#[derive(Debug)]
struct Args {
    frames: u64,
    out: PathBuf,
    source: SourceKind,
    config: Option<PathBuf>,
    every: u64,
    width: u32,
    height: u32,
}

impl Args {
    fn parse(mut args: impl Iterator<Item = String>) -> anyhow::Result<Self> {
        let mut parsed = Args {
            frames: 1200,
            out: PathBuf::from("field_output"),
            source: SourceKind::Synthetic,
            config: None,
            every: 60,
            width: 1200,
            height: 600,
        };
        while let Some(flag) = args.next() {
            let mut value = || args.next().with_context(|| format!("{flag} needs a value"));
            match flag.as_str() {
                "--frames" => parsed.frames = value()?.parse().context("--frames")?,
                "--out" => parsed.out = PathBuf::from(value()?),
                "--config" => parsed.config = Some(PathBuf::from(value()?)),
                "--every" => parsed.every = value()?.parse::<u64>().context("--every")?.max(1),
                "--width" => parsed.width = value()?.parse().context("--width")?,
                "--height" => parsed.height = value()?.parse().context("--height")?,
                "--source" => {
                    parsed.source = match value()?.as_str() {
                        "synthetic" => SourceKind::Synthetic,
                        "denied" => SourceKind::Denied,
                        "camera" => SourceKind::Camera,
                        other => bail!("unknown source `{other}`"),
                    }
                }
                other => bail!("unknown argument `{other}`"),
            }
        }
        Ok(parsed)
    }
}

fn open_source(kind: SourceKind, width: u32, height: u32) -> Box<dyn FrameSource> {
    match kind {
        SourceKind::Synthetic => Box::new(SyntheticSource::new(width / 4, height / 4)),
        SourceKind::Denied => Box::new(DeniedSource),
        SourceKind::Camera => open_camera(),
    }
}

#[cfg(feature = "camera")]
fn open_camera() -> Box<dyn FrameSource> {
    match camera::CameraSource::open(0) {
        Ok(camera) => Box::new(camera),
        Err(err) => {
            warn!(error = %err, "camera unavailable, continuing without it");
            Box::new(DeniedSource)
        }
    }
}

#[cfg(not(feature = "camera"))]
fn open_camera() -> Box<dyn FrameSource> {
    warn!("built without the `camera` feature, continuing without a camera");
    Box::new(DeniedSource)
}

/// Open hand, then a fist, then no hands, each held for `frames_per_pose`.
fn demo_tracker(width: u32, height: u32, frames_per_pose: usize) -> ScriptedTracker {
    let wrist = (width as f32 / 2.0, height as f32 * 0.75);
    let open = HandLandmarks::posed(wrist, 60.0, [150.0; 5], 40.0);
    let fist = HandLandmarks::posed(wrist, 60.0, [60.0; 5], 10.0);
    ScriptedTracker::stretched(vec![vec![open], vec![fist], Vec::new()], frames_per_pose)
}

/// Initialises the background track and starts it.
fn start_audio<S: AudioSink>(audio: &mut AudioController<S>) {
    audio.init();
    if let Err(err) = audio.play() {
        warn!(error = %err, "background audio not started");
    }
}

fn stop_audio<S: AudioSink>(audio: &mut AudioController<S>) {
    if let Err(err) = audio.pause() {
        warn!(error = %err, "background audio not paused");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse(env::args().skip(1))?;
    let config = AppConfig::load(args.config.as_deref())
        .with_context(|| format!("loading config {:?}", args.config))?;
    std::fs::create_dir_all(&args.out)
        .with_context(|| format!("creating {}", args.out.display()))?;
    info!(?args, "field tester starting");

    let frame_period = Duration::from_secs_f32(config.field.time_step);
    let fps = (1.0 / config.field.time_step).round().max(1.0);
    let frames_per_pose = (fps * POSE_SECONDS) as usize;

    let mut source = open_source(args.source, args.width, args.height);
    let mut pipeline = FieldPipeline::new(config.clone(), args.width, args.height)?;

    let (nav_tx, nav_rx) = mpsc::unbounded_channel::<NavigationRequest>();
    let gestures = LandmarkPublisher::load(Ok(demo_tracker(args.width, args.height, frames_per_pose)))
        .map(|(publisher, landmarks)| (publisher, GestureLoop::spawn(&config, landmarks, nav_tx)));

    let navigation = tokio::spawn(async move {
        let mut navigator = LoggingNavigator::default();
        let requests = futures::stream::unfold(nav_rx, |mut rx| async move {
            rx.recv().await.map(|request| (request, rx))
        });
        futures::pin_mut!(requests);
        while let Some(request) = requests.next().await {
            navigator.navigate(&request);
        }
        navigator
    });

    let (mut publisher, gesture_loop) = match gestures {
        Some((publisher, gesture_loop)) => (Some(publisher), Some(gesture_loop)),
        None => (None, None),
    };

    let mut audio = AudioController::default();
    start_audio(&mut audio);

    let blank = Frame::empty();
    let mut ticker = tokio::time::interval(frame_period);
    for index in 0..args.frames {
        ticker.tick().await;
        let frame = source.next_frame();
        let report = pipeline.tick(frame.as_ref());
        if let Some(publisher) = publisher.as_mut() {
            publisher.process(frame.as_ref().unwrap_or(&blank));
        }

        if index % args.every == 0 {
            let canvas_path = args.out.join(format!("canvas_{index:05}.png"));
            pipeline.canvas().save_png(&canvas_path)?;
            if let Some(motion) = pipeline.last_motion() {
                let motion_path = args.out.join(format!("motion_{index:05}.png"));
                save_rgba_png(&motion_path, motion.cols(), motion.rows(), &motion.to_rgba())?;
            }
            info!(
                frame = index,
                input = ?report.input,
                attracted = report.attracted,
                max_speed = report.max_speed,
                "frame written"
            );
        }
    }

    stop_audio(&mut audio);

    // Closing the landmark channel ends the gesture loop, which closes the
    // navigation channel in turn.
    drop(publisher);
    if let Some(gesture_loop) = gesture_loop {
        gesture_loop.join().await;
    }
    let navigator = navigation.await.context("navigation task")?;

    info!(
        frames = pipeline.frames_processed(),
        navigations = navigator.history().len(),
        "field tester finished"
    );
    for request in navigator.history() {
        println!("{} -> {}", request.trigger, request.target);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirror_field::AudioState;

    fn parse(args: &[&str]) -> anyhow::Result<Args> {
        Args::parse(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn defaults_without_arguments() {
        let args = parse(&[]).unwrap();
        assert_eq!(args.frames, 1200);
        assert_eq!(args.source, SourceKind::Synthetic);
        assert!(args.config.is_none());
    }

    #[test]
    fn parses_every_flag() {
        let args = parse(&[
            "--frames", "10", "--out", "/tmp/x", "--source", "denied", "--config", "scene.json",
            "--every", "0", "--width", "320", "--height", "200",
        ])
        .unwrap();
        assert_eq!(args.frames, 10);
        assert_eq!(args.out, PathBuf::from("/tmp/x"));
        assert_eq!(args.source, SourceKind::Denied);
        assert_eq!(args.config, Some(PathBuf::from("scene.json")));
        assert_eq!(args.every, 1);
        assert_eq!((args.width, args.height), (320, 200));
    }

    #[test]
    fn audio_runs_for_the_session() {
        let mut audio = AudioController::default();
        start_audio(&mut audio);
        assert_eq!(audio.state(), AudioState::Playing);
        stop_audio(&mut audio);
        assert_eq!(audio.state(), AudioState::Paused);
    }

    #[test]
    fn stopping_audio_that_never_started_is_harmless() {
        let mut audio = AudioController::default();
        stop_audio(&mut audio);
        assert_eq!(audio.state(), AudioState::Uninitialized);
    }

    #[test]
    fn rejects_unknown_input() {
        assert!(parse(&["--source", "webcam"]).is_err());
        assert!(parse(&["--bogus"]).is_err());
        assert!(parse(&["--frames"]).is_err());
    }
}
