//! demo - end-to-end synthetic run of the Fieldwatch alert pipeline
//!
//! Plays a scripted scene against the real pipeline: a tiger enters and
//! lingers (episode opens, SMS delivered), leaves (episode closes
//! silently), a farmhand walks through (ignored), a boar arrives (new
//! episode, new SMS), leaves, and the tiger returns (new episode, SMS
//! suppressed by the per-label cooldown).

use anyhow::{anyhow, Result};
use clap::Parser;

use fieldwatch::{
    AlertWorker, BoundingBox, CameraConfig, CameraSource, Detection, FieldwatchConfig,
    LogAlertTransport, LogSoundTransport, NullRenderer, Pipeline, ScriptedBackend,
    ScriptedClassifier,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Smoothing window size (N).
    #[arg(long, default_value_t = 5)]
    window: usize,
    /// Minimum agreeing votes to confirm a label (M).
    #[arg(long, default_value_t = 3)]
    min_agreement: usize,
    /// Consecutive absent ticks before an episode closes (A).
    #[arg(long, default_value_t = 4)]
    absence: u32,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if args.min_agreement == 0 || args.min_agreement > args.window {
        return Err(anyhow!("min-agreement must be in 1..=window"));
    }
    if args.absence == 0 {
        return Err(anyhow!("absence must be >= 1"));
    }

    let mut cfg = FieldwatchConfig::default();
    cfg.detection.stride = 1;
    cfg.smoothing.window = args.window;
    cfg.smoothing.min_agreement = args.min_agreement;
    cfg.episode.absence_ticks = args.absence;
    cfg.alerts.sms_enabled = true;
    cfg.alerts.destination = "+15550006789".to_string();
    cfg.validate()?;

    // One scene per frame: animal sightings, empty gaps, one human pass.
    let animal = || vec![Detection::new(BoundingBox::new(40, 40, 200, 200), 0.85, 17)];
    let human = || vec![Detection::new(BoundingBox::new(60, 20, 140, 220), 0.90, 0)];
    let empty = Vec::new;

    let mut scenes: Vec<Vec<Detection>> = Vec::new();
    let mut classifications: Vec<(&str, f32)> = Vec::new();

    stage("scene: tiger enters and lingers");
    for _ in 0..6 {
        scenes.push(animal());
        classifications.push(("tiger", 0.90));
    }
    stage("scene: tiger leaves");
    scenes.extend(std::iter::repeat_with(empty).take(6));
    stage("scene: farmhand walks through");
    scenes.extend(std::iter::repeat_with(human).take(3));
    stage("scene: boar arrives");
    for _ in 0..6 {
        scenes.push(animal());
        classifications.push(("boar", 0.88));
    }
    stage("scene: boar leaves");
    scenes.extend(std::iter::repeat_with(empty).take(6));
    stage("scene: tiger returns (cooldown should suppress the SMS)");
    for _ in 0..6 {
        scenes.push(animal());
        classifications.push(("tiger", 0.90));
    }

    let total_frames = scenes.len() as u64;
    let mut source = CameraSource::new(CameraConfig {
        uri: "stub://demo".to_string(),
        target_fps: 10,
        width: 320,
        height: 240,
        frame_limit: Some(total_frames),
    })?;
    source.connect()?;

    let worker = AlertWorker::spawn(
        Box::new(LogAlertTransport),
        Box::new(LogSoundTransport),
        cfg.alerts.queue_depth,
    );

    let mut pipeline = Pipeline::new(
        &cfg,
        Box::new(ScriptedBackend::new(scenes)),
        Box::new(ScriptedClassifier::new(classifications)),
        Box::new(worker),
        Box::new(NullRenderer),
    );

    stage("run pipeline");
    let mut frames = 0u64;
    let mut closes = 0u64;
    let mut deliveries = 0u64;
    while let Some(frame) = source.next_frame()? {
        let report = pipeline.tick(&frame);
        frames += 1;
        if report.closed {
            closes += 1;
        }
        if report.delivered {
            deliveries += 1;
        }
        if let Some(transition) = &report.transition {
            eprintln!(
                "demo:   frame {:>2}: {} -> {} (episode #{})",
                frame.index,
                transition.reason.as_str(),
                transition.label,
                transition.sequence
            );
        }
    }

    println!("demo summary:");
    println!("  frames processed: {}", frames);
    println!("  episodes opened: {}", pipeline.total_episodes());
    println!("  episodes closed: {}", closes);
    println!("  sms deliveries: {}", deliveries);
    println!("  alert history:");
    for entry in pipeline.history().entries() {
        println!("    #{} {} at {}", entry.sequence, entry.label, entry.at);
    }
    println!("next steps:");
    println!("  cargo run --bin fieldwatchd");
    println!("  FIELDWATCH_DETECT_STRIDE=1 cargo run --bin fieldwatchd");

    if pipeline.total_episodes() != 3 || deliveries != 2 {
        return Err(anyhow!(
            "expected 3 episodes and 2 deliveries, got {} and {}",
            pipeline.total_episodes(),
            deliveries
        ));
    }
    Ok(())
}

fn stage(msg: &str) {
    eprintln!("demo: {}", msg);
}
