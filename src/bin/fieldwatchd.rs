//! fieldwatchd - Fieldwatch intrusion-alerting daemon
//!
//! This daemon:
//! 1. Ingests frames from the configured camera source
//! 2. Runs detection on every Nth frame, triaging boxes (human exclusion,
//!    degenerate crops) before classification
//! 3. Smooths labels over a rolling window and tracks intrusion episodes
//! 4. Dispatches at-most-once-per-episode alerts through a background
//!    worker that can never stall frame processing
//! 5. Publishes per-tick render snapshots for a display layer

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use fieldwatch::{
    AlertTransport, AlertWorker, CameraConfig, CameraSource, FieldwatchConfig, LogAlertTransport,
    LogRenderer, LogSoundTransport, Pipeline, ScriptedBackend, ScriptedClassifier,
};

fn main() -> Result<()> {
    // Initialize logging (simple stderr for MVP)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg = FieldwatchConfig::load()?;

    let camera_config = CameraConfig {
        uri: cfg.camera.uri.clone(),
        target_fps: cfg.camera.target_fps,
        width: cfg.camera.width,
        height: cfg.camera.height,
        frame_limit: cfg.camera.frame_limit,
    };
    let mut source = CameraSource::new(camera_config)?;
    source.connect()?;

    // Detection and classification are external collaborators; without a
    // real model wired in, the daemon runs the quiet scripted backend the
    // way stub:// camera sources run synthetic frames.
    let detector = Box::new(ScriptedBackend::quiet());
    let classifier = Box::new(ScriptedClassifier::new(Vec::<(String, f32)>::new()));

    let alert_transport = build_alert_transport(&cfg)?;
    let worker = AlertWorker::spawn(
        alert_transport,
        Box::new(LogSoundTransport),
        cfg.alerts.queue_depth,
    );

    let mut pipeline = Pipeline::new(
        &cfg,
        detector,
        classifier,
        Box::new(worker),
        Box::new(LogRenderer),
    );

    let stop = Arc::new(AtomicBool::new(false));
    let stop_handler = stop.clone();
    ctrlc::set_handler(move || {
        stop_handler.store(true, Ordering::SeqCst);
    })?;

    log::info!("fieldwatchd running on {}", cfg.camera.uri);
    log::info!(
        "smoothing window={} min_agreement={} absence_ticks={} stride={}",
        cfg.smoothing.window,
        cfg.smoothing.min_agreement,
        cfg.episode.absence_ticks,
        cfg.detection.stride
    );
    log::info!(
        "sms alerts {} (destination {})",
        if cfg.alerts.sms_enabled {
            "enabled"
        } else {
            "disabled"
        },
        if cfg.alerts.destination.is_empty() {
            "unset"
        } else {
            cfg.alerts.destination.as_str()
        }
    );

    let pace = Duration::from_millis(1000 / u64::from(cfg.camera.target_fps.max(1)));
    let stats = pipeline.run(&mut source, &stop, pace);

    log::info!(
        "run finished: {} frames ({} sampled), {} episodes, {} deliveries",
        stats.frames_seen,
        stats.sampled_frames,
        pipeline.total_episodes(),
        stats.deliveries
    );
    Ok(())
}

/// Select the SMS transport: HTTP gateway when built and configured,
/// otherwise degrade without failing startup. Alerting is a side channel,
/// never a precondition for perception.
fn build_alert_transport(cfg: &FieldwatchConfig) -> Result<Box<dyn AlertTransport>> {
    if !cfg.alerts.sms_enabled {
        return Ok(Box::new(LogAlertTransport));
    }
    #[cfg(feature = "alert-http")]
    {
        use fieldwatch::{HttpSmsTransport, NoopAlertTransport};
        if let Some(transport) = HttpSmsTransport::from_env(&cfg.alerts.destination)? {
            return Ok(Box::new(transport));
        }
        Ok(Box::new(NoopAlertTransport::new(
            "sms enabled but FIELDWATCH_SMS_GATEWAY is not set",
        )))
    }
    #[cfg(not(feature = "alert-http"))]
    {
        use fieldwatch::NoopAlertTransport;
        Ok(Box::new(NoopAlertTransport::new(
            "sms enabled but fieldwatch was built without the alert-http feature",
        )))
    }
}
