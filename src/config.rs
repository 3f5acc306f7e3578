use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, Result};
use serde::Deserialize;
use url::Url;

const DEFAULT_SERVER_ADDRESS: &str = "http://127.0.0.1";
const DEFAULT_LISTEN_PORT: u16 = 8000;
const DEFAULT_DETECTORS: &[&str] = &["stub"];
const DEFAULT_FACE_MODEL: &str = "models/ultraface-rfb-320.onnx";

#[derive(Debug, Deserialize, Default)]
struct FacetrackdConfigFile {
    server_address: Option<String>,
    listen_port: Option<u16>,
    read_timeout_secs: Option<u64>,
    detectors: Option<Vec<String>>,
    face_model: Option<String>,
}

/// Daemon configuration.
///
/// Layering: config file (`FACETRACK_CONFIG`) under env overrides under
/// CLI flags, with built-in defaults at the bottom. Defaults match the
/// original deployment: commands to `http://127.0.0.1`, camera stream
/// on port 8000, reads that block indefinitely.
#[derive(Debug, Clone)]
pub struct FacetrackdConfig {
    /// Base address of the controller server commands are sent to.
    pub server_address: String,
    /// Port the camera stream socket listens on (all interfaces).
    pub listen_port: u16,
    /// Socket read timeout. `None` blocks indefinitely.
    pub read_timeout: Option<Duration>,
    /// Detector names in priority order.
    pub detectors: Vec<String>,
    /// ONNX model path for the `face` detector.
    pub face_model: String,
}

impl FacetrackdConfig {
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("FACETRACK_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: FacetrackdConfigFile) -> Self {
        Self {
            server_address: file
                .server_address
                .unwrap_or_else(|| DEFAULT_SERVER_ADDRESS.to_string()),
            listen_port: file.listen_port.unwrap_or(DEFAULT_LISTEN_PORT),
            read_timeout: file.read_timeout_secs.map(Duration::from_secs),
            detectors: file.detectors.unwrap_or_else(|| {
                DEFAULT_DETECTORS.iter().map(|s| s.to_string()).collect()
            }),
            face_model: file
                .face_model
                .unwrap_or_else(|| DEFAULT_FACE_MODEL.to_string()),
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(server) = std::env::var("FACETRACK_SERVER") {
            if !server.trim().is_empty() {
                self.server_address = server;
            }
        }
        if let Ok(port) = std::env::var("FACETRACK_PORT") {
            if !port.trim().is_empty() {
                self.listen_port = port
                    .parse()
                    .map_err(|_| anyhow!("FACETRACK_PORT must be a TCP port number"))?;
            }
        }
        if let Ok(timeout) = std::env::var("FACETRACK_READ_TIMEOUT_SECS") {
            if !timeout.trim().is_empty() {
                let secs: u64 = timeout.parse().map_err(|_| {
                    anyhow!("FACETRACK_READ_TIMEOUT_SECS must be an integer number of seconds")
                })?;
                self.read_timeout = Some(Duration::from_secs(secs));
            }
        }
        if let Ok(detectors) = std::env::var("FACETRACK_DETECTORS") {
            let parsed = split_csv(&detectors);
            if !parsed.is_empty() {
                self.detectors = parsed;
            }
        }
        if let Ok(model) = std::env::var("FACETRACK_FACE_MODEL") {
            if !model.trim().is_empty() {
                self.face_model = model;
            }
        }
        Ok(())
    }

    /// Re-run after CLI overrides have been applied on top.
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.server_address)
            .map_err(|e| anyhow!("invalid server address {}: {}", self.server_address, e))?;
        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(anyhow!(
                    "unsupported server scheme '{}'; expected http(s)",
                    other
                ))
            }
        }
        if self.detectors.is_empty() {
            return Err(anyhow!("at least one detector must be configured"));
        }
        if let Some(timeout) = self.read_timeout {
            if timeout.is_zero() {
                return Err(anyhow!(
                    "read timeout must be greater than zero (omit it to block indefinitely)"
                ));
            }
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<FacetrackdConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}

pub fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|entry| entry.trim())
        .filter(|entry| !entry.is_empty())
        .map(|entry| entry.to_string())
        .collect()
}
