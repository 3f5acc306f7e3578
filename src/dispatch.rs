//! Outbound command delivery.
//!
//! Each queued command becomes one HTTP GET against the controller
//! server. Responses are read fully and logged, never parsed. There is
//! no retry and no per-command guard: a transport failure aborts the
//! rest of the frame's queue and propagates to the loop.

use std::io::Read;

use anyhow::{Context, Result};

use crate::command::Command;

/// Sink for one frame's derived commands.
///
/// The HTTP sink is the production implementation; tests substitute a
/// recording sink.
pub trait CommandSink {
    fn send(&mut self, command: &Command) -> Result<()>;
}

/// Sends commands to the controller server as `GET {base}/command/?command={c}`.
pub struct HttpCommandSink {
    base: String,
}

impl HttpCommandSink {
    pub fn new(base: &str) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }
}

impl CommandSink for HttpCommandSink {
    fn send(&mut self, command: &Command) -> Result<()> {
        // The command vocabulary is plain ASCII with hyphens and digits,
        // so the query string needs no encoding.
        let url = format!("{}/command/?command={}", self.base, command);
        let response = ureq::get(&url)
            .call()
            .with_context(|| format!("dispatch command {}", command))?;
        let mut body = String::new();
        response
            .into_reader()
            .read_to_string(&mut body)
            .context("read command response")?;
        log::info!("command {} -> {}", command, body.trim_end());
        Ok(())
    }
}

/// Drain one frame's queue in order.
pub fn flush(sink: &mut dyn CommandSink, commands: &[Command]) -> Result<()> {
    for command in commands {
        sink.send(command)?;
    }
    Ok(())
}
