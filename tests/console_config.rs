use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use tempfile::NamedTempFile;

use traffic_console::config::ConsoleConfig;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "CONSOLE_CONFIG",
        "CONSOLE_MODEL",
        "CONSOLE_CADENCE_MS",
        "CONSOLE_SHUTDOWN_TIMEOUT_SECS",
        "CONSOLE_CATEGORIES",
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
        "model_path": "models/custom.onnx",
        "cadence_ms": 40,
        "shutdown_timeout_secs": 2,
        "categories": ["car", "bus"],
        "sites": [
            { "name": "Puente Norte", "latitude": 25.70, "longitude": -100.31, "direction": "North-South" },
            { "name": "Puente Sur", "latitude": 25.62, "longitude": -100.30 }
        ],
        "map": { "latitude": 25.66, "longitude": -100.30 }
    }"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");

    std::env::set_var("CONSOLE_CONFIG", file.path());
    std::env::set_var("CONSOLE_CADENCE_MS", "80");

    let cfg = ConsoleConfig::load().expect("load config");

    assert_eq!(cfg.model_path, PathBuf::from("models/custom.onnx"));
    // Env override wins over the file value.
    assert_eq!(cfg.cadence, Duration::from_millis(80));
    assert_eq!(cfg.shutdown_timeout, Duration::from_secs(2));
    assert_eq!(cfg.categories, vec!["car", "bus"]);
    assert_eq!(cfg.sites.len(), 2);
    assert_eq!(cfg.sites[0].direction, "North-South");
    assert_eq!(cfg.sites[1].direction, "N/A");
    assert_eq!(cfg.map_center, (25.66, -100.30));

    clear_env();
}

#[test]
fn defaults_apply_without_config_file() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = ConsoleConfig::load().expect("load config");

    assert_eq!(cfg.model_path, PathBuf::from("models/yolov8n.onnx"));
    assert_eq!(cfg.cadence, Duration::from_millis(100));
    assert_eq!(cfg.shutdown_timeout, Duration::from_secs(5));
    assert_eq!(cfg.categories.len(), 6);
    assert_eq!(cfg.sites.len(), 3);

    clear_env();
}

#[test]
fn rejects_duplicate_site_names() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{
        "sites": [
            { "name": "Puente Norte", "latitude": 25.70, "longitude": -100.31 },
            { "name": "Puente Norte", "latitude": 25.62, "longitude": -100.30 }
        ]
    }"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");
    std::env::set_var("CONSOLE_CONFIG", file.path());

    let err = ConsoleConfig::load().unwrap_err();
    assert!(err.to_string().contains("unique"));

    clear_env();
}

#[test]
fn rejects_zero_cadence() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("CONSOLE_CADENCE_MS", "0");
    let err = ConsoleConfig::load().unwrap_err();
    assert!(err.to_string().contains("cadence"));

    clear_env();
}
