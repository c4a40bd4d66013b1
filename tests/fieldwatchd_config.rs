use std::sync::Mutex;

use tempfile::NamedTempFile;

use fieldwatch::config::FieldwatchConfig;
use fieldwatch::ChangePolicy;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "FIELDWATCH_CONFIG",
        "FIELDWATCH_CAMERA_URI",
        "FIELDWATCH_SMS_TO",
        "FIELDWATCH_SMS_ENABLED",
        "FIELDWATCH_DETECT_STRIDE",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{
        "camera": {
            "uri": "rtsp://barn-camera",
            "target_fps": 15,
            "width": 1280,
            "height": 720
        },
        "detection": {
            "confidence": 0.4,
            "stride": 10,
            "human_confidence": 0.55
        },
        "smoothing": {
            "window": 9,
            "min_agreement": 5
        },
        "episode": {
            "absence_ticks": 6,
            "change_policy": "new-episode"
        },
        "alerts": {
            "sms_enabled": true,
            "destination": "+15550001111"
        }
    }"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");

    std::env::set_var("FIELDWATCH_CONFIG", file.path());
    std::env::set_var("FIELDWATCH_SMS_TO", "+919876543210");
    std::env::set_var("FIELDWATCH_DETECT_STRIDE", "5");

    let cfg = FieldwatchConfig::load().expect("load config");

    assert_eq!(cfg.camera.uri, "rtsp://barn-camera");
    assert_eq!(cfg.camera.target_fps, 15);
    assert_eq!(cfg.camera.width, 1280);
    assert_eq!(cfg.camera.height, 720);
    assert!((cfg.detection.confidence - 0.4).abs() < f32::EPSILON);
    assert!((cfg.detection.human_confidence - 0.55).abs() < f32::EPSILON);
    assert_eq!(cfg.smoothing.window, 9);
    assert_eq!(cfg.smoothing.min_agreement, 5);
    assert_eq!(cfg.episode.absence_ticks, 6);
    assert_eq!(cfg.episode.change_policy, ChangePolicy::NewEpisode);
    assert!(cfg.alerts.sms_enabled);
    // Env overrides beat the file.
    assert_eq!(cfg.alerts.destination, "+919876543210");
    assert_eq!(cfg.detection.stride, 5);
    // Unset fields fall back to defaults.
    assert!((cfg.classify.confirm_confidence - 0.7).abs() < f32::EPSILON);
    assert_eq!(cfg.alerts.queue_depth, 8);

    clear_env();
}

#[test]
fn defaults_load_without_any_config() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = FieldwatchConfig::load().expect("load defaults");
    assert_eq!(cfg.camera.uri, "stub://field_camera");
    assert_eq!(cfg.detection.stride, 30);
    assert_eq!(cfg.smoothing.window, 7);
    assert_eq!(cfg.smoothing.min_agreement, 4);
    assert!(!cfg.alerts.sms_enabled);

    clear_env();
}

#[test]
fn sms_enabled_with_bad_destination_fails_load() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("FIELDWATCH_SMS_ENABLED", "1");
    std::env::set_var("FIELDWATCH_SMS_TO", "call-me-maybe");

    assert!(FieldwatchConfig::load().is_err());

    std::env::set_var("FIELDWATCH_SMS_TO", "+15550001111");
    assert!(FieldwatchConfig::load().is_ok());

    clear_env();
}

#[test]
fn bad_boolean_env_is_rejected() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("FIELDWATCH_SMS_ENABLED", "yes please");
    assert!(FieldwatchConfig::load().is_err());

    clear_env();
}
