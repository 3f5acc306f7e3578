//! The read-detect-dispatch control loop.
//!
//! One iteration: build a fresh frame context, read one length-prefixed
//! frame, decode it, run the detector chain, derive commands from the
//! first detection, then flush the command queue in order. A zero-length
//! frame skips the iteration; a clean end of stream or the quit flag
//! stops the loop.
//!
//! Strictly sequential: detection and dispatch for frame `n` finish
//! before frame `n + 1` is read. The connection and listener are owned
//! by the caller and released exactly once by drop, on every exit path.

use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;

use crate::command::FrameContext;
use crate::detect::DetectorChain;
use crate::dispatch::{flush, CommandSink};
use crate::frame::{read_frame, DecodedFrame, FrameRead};

/// Loop state. `Stopped` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PilotState {
    Running,
    Stopped,
}

/// Counters reported when the loop stops.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PilotReport {
    pub frames_processed: u64,
    pub frames_skipped: u64,
    pub commands_sent: u64,
}

/// Run the control loop until end of stream, quit request, or failure.
pub fn run<R: Read>(
    connection: &mut R,
    chain: &mut DetectorChain,
    sink: &mut dyn CommandSink,
    quit: &AtomicBool,
) -> Result<PilotReport> {
    let mut report = PilotReport::default();
    let mut state = PilotState::Running;

    while state == PilotState::Running {
        let mut context = FrameContext::new();

        let payload = match read_frame(connection)? {
            FrameRead::Frame(payload) => payload,
            FrameRead::Skip => {
                log::debug!("zero-length frame, skipping cycle");
                report.frames_skipped += 1;
                continue;
            }
            FrameRead::EndOfStream => {
                log::info!("camera stream closed");
                state = PilotState::Stopped;
                continue;
            }
        };

        let frame = DecodedFrame::decode(&payload)?;
        let gray = frame.luma();
        let detections = chain.first_match(&gray, frame.width(), frame.height())?;
        context.observe(detections.as_ref(), frame.width());

        for (key, value) in context.status.iter() {
            log::debug!("status {}: {}", key, value);
        }
        if let Some(hit) = &detections {
            log::info!(
                "{}: primary ({}, {}) {}x{}, {} extra",
                hit.detector,
                hit.primary.x,
                hit.primary.y,
                hit.primary.w,
                hit.primary.h,
                hit.extras.len()
            );
        }

        flush(sink, &context.commands)?;
        report.commands_sent += context.commands.len() as u64;
        report.frames_processed += 1;

        if quit.load(Ordering::Relaxed) {
            log::info!("quit requested");
            state = PilotState::Stopped;
        }
    }

    Ok(report)
}
