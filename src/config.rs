use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::Path;

use crate::episode::ChangePolicy;

const DEFAULT_CAMERA_URI: &str = "stub://field_camera";
const DEFAULT_CAMERA_FPS: u32 = 10;
const DEFAULT_CAMERA_WIDTH: u32 = 640;
const DEFAULT_CAMERA_HEIGHT: u32 = 480;
const DEFAULT_DETECT_CONFIDENCE: f32 = 0.5;
const DEFAULT_DETECT_STRIDE: u32 = 30;
const DEFAULT_HUMAN_CLASS_ID: u32 = 0;
const DEFAULT_HUMAN_CONFIDENCE: f32 = 0.6;
const DEFAULT_CONFIRM_CONFIDENCE: f32 = 0.7;
const DEFAULT_DISPLAY_CONFIDENCE: f32 = 0.5;
const DEFAULT_WINDOW: usize = 7;
const DEFAULT_MIN_AGREEMENT: usize = 4;
const DEFAULT_ABSENCE_TICKS: u32 = 10;
const DEFAULT_ALERT_QUEUE_DEPTH: usize = 8;

#[derive(Debug, Deserialize, Default)]
struct FieldwatchConfigFile {
    camera: Option<CameraConfigFile>,
    detection: Option<DetectionConfigFile>,
    classify: Option<ClassifyConfigFile>,
    smoothing: Option<SmoothingConfigFile>,
    episode: Option<EpisodeConfigFile>,
    alerts: Option<AlertConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct CameraConfigFile {
    uri: Option<String>,
    target_fps: Option<u32>,
    width: Option<u32>,
    height: Option<u32>,
    frame_limit: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct DetectionConfigFile {
    confidence: Option<f32>,
    stride: Option<u32>,
    human_class_id: Option<u32>,
    human_confidence: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
struct ClassifyConfigFile {
    confirm_confidence: Option<f32>,
    display_confidence: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
struct SmoothingConfigFile {
    window: Option<usize>,
    min_agreement: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
struct EpisodeConfigFile {
    absence_ticks: Option<u32>,
    change_policy: Option<ChangePolicy>,
}

#[derive(Debug, Deserialize, Default)]
struct AlertConfigFile {
    sms_enabled: Option<bool>,
    destination: Option<String>,
    queue_depth: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct FieldwatchConfig {
    pub camera: CameraSettings,
    pub detection: DetectionSettings,
    pub classify: ClassifySettings,
    pub smoothing: SmoothingSettings,
    pub episode: EpisodeSettings,
    pub alerts: AlertSettings,
}

#[derive(Debug, Clone)]
pub struct CameraSettings {
    pub uri: String,
    pub target_fps: u32,
    pub width: u32,
    pub height: u32,
    pub frame_limit: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct DetectionSettings {
    /// Minimum detector confidence for a box to be classified at all.
    pub confidence: f32,
    /// Run detection on every Nth frame; frames in between reuse the last
    /// detections for rendering only.
    pub stride: u32,
    pub human_class_id: u32,
    /// Human-exclusion threshold: above this, a person box skips the classifier.
    pub human_confidence: f32,
}

#[derive(Debug, Clone)]
pub struct ClassifySettings {
    /// Minimum classifier confidence for a label to enter the smoothing buffer.
    pub confirm_confidence: f32,
    /// Minimum detector confidence for a box to be drawn at all.
    pub display_confidence: f32,
}

#[derive(Debug, Clone)]
pub struct SmoothingSettings {
    /// Window capacity N.
    pub window: usize,
    /// Minimum stable count M (must satisfy 1 <= M <= N).
    pub min_agreement: usize,
}

#[derive(Debug, Clone)]
pub struct EpisodeSettings {
    /// Consecutive non-confirming sampled ticks before an episode closes.
    pub absence_ticks: u32,
    pub change_policy: ChangePolicy,
}

#[derive(Debug, Clone)]
pub struct AlertSettings {
    pub sms_enabled: bool,
    /// E.164 destination, required when sms_enabled.
    pub destination: String,
    /// Bounded alert queue depth for the background worker.
    pub queue_depth: usize,
}

impl Default for FieldwatchConfig {
    fn default() -> Self {
        Self::from_file(FieldwatchConfigFile::default())
    }
}

impl FieldwatchConfig {
    /// Load from the file named by `FIELDWATCH_CONFIG` (JSON, all fields
    /// optional), apply environment overrides, then validate.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("FIELDWATCH_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: FieldwatchConfigFile) -> Self {
        let camera = CameraSettings {
            uri: file
                .camera
                .as_ref()
                .and_then(|camera| camera.uri.clone())
                .unwrap_or_else(|| DEFAULT_CAMERA_URI.to_string()),
            target_fps: file
                .camera
                .as_ref()
                .and_then(|camera| camera.target_fps)
                .unwrap_or(DEFAULT_CAMERA_FPS),
            width: file
                .camera
                .as_ref()
                .and_then(|camera| camera.width)
                .unwrap_or(DEFAULT_CAMERA_WIDTH),
            height: file
                .camera
                .as_ref()
                .and_then(|camera| camera.height)
                .unwrap_or(DEFAULT_CAMERA_HEIGHT),
            frame_limit: file.camera.as_ref().and_then(|camera| camera.frame_limit),
        };
        let detection = DetectionSettings {
            confidence: file
                .detection
                .as_ref()
                .and_then(|detection| detection.confidence)
                .unwrap_or(DEFAULT_DETECT_CONFIDENCE),
            stride: file
                .detection
                .as_ref()
                .and_then(|detection| detection.stride)
                .unwrap_or(DEFAULT_DETECT_STRIDE),
            human_class_id: file
                .detection
                .as_ref()
                .and_then(|detection| detection.human_class_id)
                .unwrap_or(DEFAULT_HUMAN_CLASS_ID),
            human_confidence: file
                .detection
                .as_ref()
                .and_then(|detection| detection.human_confidence)
                .unwrap_or(DEFAULT_HUMAN_CONFIDENCE),
        };
        let classify = ClassifySettings {
            confirm_confidence: file
                .classify
                .as_ref()
                .and_then(|classify| classify.confirm_confidence)
                .unwrap_or(DEFAULT_CONFIRM_CONFIDENCE),
            display_confidence: file
                .classify
                .as_ref()
                .and_then(|classify| classify.display_confidence)
                .unwrap_or(DEFAULT_DISPLAY_CONFIDENCE),
        };
        let smoothing = SmoothingSettings {
            window: file
                .smoothing
                .as_ref()
                .and_then(|smoothing| smoothing.window)
                .unwrap_or(DEFAULT_WINDOW),
            min_agreement: file
                .smoothing
                .as_ref()
                .and_then(|smoothing| smoothing.min_agreement)
                .unwrap_or(DEFAULT_MIN_AGREEMENT),
        };
        let episode = EpisodeSettings {
            absence_ticks: file
                .episode
                .as_ref()
                .and_then(|episode| episode.absence_ticks)
                .unwrap_or(DEFAULT_ABSENCE_TICKS),
            change_policy: file
                .episode
                .as_ref()
                .and_then(|episode| episode.change_policy)
                .unwrap_or_default(),
        };
        let alerts = AlertSettings {
            sms_enabled: file
                .alerts
                .as_ref()
                .and_then(|alerts| alerts.sms_enabled)
                .unwrap_or(false),
            destination: file
                .alerts
                .as_ref()
                .and_then(|alerts| alerts.destination.clone())
                .unwrap_or_default(),
            queue_depth: file
                .alerts
                .and_then(|alerts| alerts.queue_depth)
                .unwrap_or(DEFAULT_ALERT_QUEUE_DEPTH),
        };
        Self {
            camera,
            detection,
            classify,
            smoothing,
            episode,
            alerts,
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(uri) = std::env::var("FIELDWATCH_CAMERA_URI") {
            if !uri.trim().is_empty() {
                self.camera.uri = uri;
            }
        }
        if let Ok(destination) = std::env::var("FIELDWATCH_SMS_TO") {
            if !destination.trim().is_empty() {
                self.alerts.destination = destination;
            }
        }
        if let Ok(enabled) = std::env::var("FIELDWATCH_SMS_ENABLED") {
            self.alerts.sms_enabled = parse_bool(&enabled).ok_or_else(|| {
                anyhow!("FIELDWATCH_SMS_ENABLED must be one of: 1, 0, true, false")
            })?;
        }
        if let Ok(stride) = std::env::var("FIELDWATCH_DETECT_STRIDE") {
            let stride: u32 = stride
                .parse()
                .map_err(|_| anyhow!("FIELDWATCH_DETECT_STRIDE must be an integer"))?;
            self.detection.stride = stride;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("detection.confidence", self.detection.confidence),
            ("detection.human_confidence", self.detection.human_confidence),
            ("classify.confirm_confidence", self.classify.confirm_confidence),
            ("classify.display_confidence", self.classify.display_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(anyhow!("{} must be within 0..=1, got {}", name, value));
            }
        }
        if self.detection.stride == 0 {
            return Err(anyhow!("detection.stride must be >= 1"));
        }
        if self.smoothing.window == 0 {
            return Err(anyhow!("smoothing.window must be >= 1"));
        }
        if self.smoothing.min_agreement == 0
            || self.smoothing.min_agreement > self.smoothing.window
        {
            return Err(anyhow!(
                "smoothing.min_agreement must satisfy 1 <= M <= window (M={}, window={})",
                self.smoothing.min_agreement,
                self.smoothing.window
            ));
        }
        if self.episode.absence_ticks == 0 {
            return Err(anyhow!("episode.absence_ticks must be >= 1"));
        }
        if self.alerts.queue_depth == 0 {
            return Err(anyhow!("alerts.queue_depth must be >= 1"));
        }
        if self.alerts.sms_enabled {
            crate::validate_destination(&self.alerts.destination)?;
        }
        Ok(())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim() {
        "1" | "true" | "TRUE" | "True" => Some(true),
        "0" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

fn read_config_file(path: &Path) -> Result<FieldwatchConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}
