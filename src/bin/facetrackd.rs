//! facetrackd - camera-follow steering daemon
//!
//! This daemon:
//! 1. Accepts exactly one TCP connection carrying length-prefixed stills
//! 2. Runs the configured detector chain on each decoded frame
//! 3. Derives steering/throttle commands from the first detection
//! 4. Dispatches each command to the controller server over HTTP GET

use std::net::TcpListener;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::Parser;

use facetrack::config::{split_csv, FacetrackdConfig};
use facetrack::detect::{DetectorChain, StubDetector};
use facetrack::dispatch::HttpCommandSink;
use facetrack::pilot;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Address of the controller server commands are sent to.
    #[arg(short, long)]
    server: Option<String>,
    /// Port the camera stream socket listens on.
    #[arg(short, long)]
    port: Option<u16>,
    /// Socket read timeout in seconds (blocks indefinitely when omitted).
    #[arg(long)]
    read_timeout_secs: Option<u64>,
    /// Comma-separated detector names, in priority order.
    #[arg(long)]
    detectors: Option<String>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut cfg = FacetrackdConfig::load()?;
    if let Some(server) = args.server {
        cfg.server_address = server;
    }
    if let Some(port) = args.port {
        cfg.listen_port = port;
    }
    if let Some(secs) = args.read_timeout_secs {
        cfg.read_timeout = Some(Duration::from_secs(secs));
    }
    if let Some(detectors) = args.detectors {
        cfg.detectors = split_csv(&detectors);
    }
    cfg.validate()?;

    let mut chain = build_chain(&cfg)?;
    chain.warm_up()?;

    let quit = Arc::new(AtomicBool::new(false));
    {
        let quit = quit.clone();
        ctrlc::set_handler(move || quit.store(true, Ordering::Relaxed))
            .context("install quit handler")?;
    }

    let listener = TcpListener::bind(("0.0.0.0", cfg.listen_port))
        .with_context(|| format!("bind camera socket on 0.0.0.0:{}", cfg.listen_port))?;
    log::info!(
        "facetrackd listening for the camera stream on 0.0.0.0:{}",
        cfg.listen_port
    );
    log::info!(
        "commands go to {}/command/ using detectors [{}]",
        cfg.server_address,
        chain.names().join(", ")
    );

    // One connection for the lifetime of the process; no reconnect.
    let (mut connection, peer) = listener.accept().context("accept camera connection")?;
    log::info!("camera connected from {}", peer);
    connection
        .set_read_timeout(cfg.read_timeout)
        .context("set read timeout")?;

    let mut sink = HttpCommandSink::new(&cfg.server_address);
    let report = pilot::run(&mut connection, &mut chain, &mut sink, &quit)?;
    log::info!(
        "stopped: {} frames processed, {} skipped, {} commands sent",
        report.frames_processed,
        report.frames_skipped,
        report.commands_sent
    );
    Ok(())
}

fn build_chain(cfg: &FacetrackdConfig) -> Result<DetectorChain> {
    let mut chain = DetectorChain::new();
    for name in &cfg.detectors {
        match name.as_str() {
            "stub" => chain.push(StubDetector::new()),
            #[cfg(feature = "detect-tract")]
            "face" => chain.push(facetrack::detect::TractFaceDetector::new(&cfg.face_model)?),
            #[cfg(not(feature = "detect-tract"))]
            "face" => {
                return Err(anyhow!(
                    "detector 'face' requires a build with the detect-tract feature"
                ))
            }
            other => return Err(anyhow!("unknown detector '{}'", other)),
        }
    }
    Ok(chain)
}
