use std::sync::Mutex;
use std::time::Duration;

use tempfile::NamedTempFile;

use facetrack::config::FacetrackdConfig;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "FACETRACK_CONFIG",
        "FACETRACK_SERVER",
        "FACETRACK_PORT",
        "FACETRACK_READ_TIMEOUT_SECS",
        "FACETRACK_DETECTORS",
        "FACETRACK_FACE_MODEL",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn defaults_match_the_original_deployment() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = FacetrackdConfig::load().expect("load config");

    assert_eq!(cfg.server_address, "http://127.0.0.1");
    assert_eq!(cfg.listen_port, 8000);
    assert_eq!(cfg.read_timeout, None);
    assert_eq!(cfg.detectors, vec!["stub"]);

    clear_env();
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{
        "server_address": "http://192.168.1.50:8080",
        "listen_port": 9000,
        "read_timeout_secs": 30,
        "detectors": ["face", "stub"],
        "face_model": "models/custom.onnx"
    }"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");

    std::env::set_var("FACETRACK_CONFIG", file.path());
    std::env::set_var("FACETRACK_PORT", "9001");
    std::env::set_var("FACETRACK_DETECTORS", "stub");

    let cfg = FacetrackdConfig::load().expect("load config");

    assert_eq!(cfg.server_address, "http://192.168.1.50:8080");
    assert_eq!(cfg.listen_port, 9001);
    assert_eq!(cfg.read_timeout, Some(Duration::from_secs(30)));
    assert_eq!(cfg.detectors, vec!["stub"]);
    assert_eq!(cfg.face_model, "models/custom.onnx");

    clear_env();
}

#[test]
fn rejects_non_http_server_address() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("FACETRACK_SERVER", "ftp://127.0.0.1");
    let err = FacetrackdConfig::load().unwrap_err();
    assert!(err.to_string().contains("scheme"), "{}", err);

    clear_env();
}

#[test]
fn rejects_zero_read_timeout() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("FACETRACK_READ_TIMEOUT_SECS", "0");
    let err = FacetrackdConfig::load().unwrap_err();
    assert!(err.to_string().contains("read timeout"), "{}", err);

    clear_env();
}

#[test]
fn rejects_unparseable_port() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("FACETRACK_PORT", "not-a-port");
    let err = FacetrackdConfig::load().unwrap_err();
    assert!(err.to_string().contains("FACETRACK_PORT"), "{}", err);

    clear_env();
}
