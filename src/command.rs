//! Steering and throttle command derivation.
//!
//! One detection box per frame drives the rover: the horizontal
//! off-center fraction picks the steering command and the box width,
//! standing in for subject distance, picks the throttle command. The
//! numeric constants map straight onto the controller's servo ranges
//! and must stay exact for compatibility with deployed controllers.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::detect::{DetectionBox, FrameDetections};

/// Off-center fractions inside this deadband count as centered.
pub const CENTER_DEADBAND: f32 = 0.01;
/// Affine steering map: `turn = off_center_fraction * TURN_GAIN + TURN_NEUTRAL`.
pub const TURN_GAIN: f32 = 150.0;
pub const TURN_NEUTRAL: f32 = 75.0;
/// Box widths strictly inside this band ramp the forward throttle down
/// as the subject gets closer.
pub const FORWARD_MIN_WIDTH: i32 = 40;
pub const FORWARD_MAX_WIDTH: i32 = 70;
/// Box widths above this reverse at a fixed rate. Widths in the gap
/// between the bands stop.
pub const REVERSE_WIDTH: i32 = 120;

/// One outbound actuator instruction.
///
/// `Display` renders the exact wire vocabulary the controller parses.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Command {
    TurnNeutral,
    Turn(f32),
    Forward(f32),
    Reverse,
    Stop,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::TurnNeutral => write!(f, "manual-turn-neutral"),
            Command::Turn(amount) => write!(f, "manual-turn-{}", amount),
            Command::Forward(amount) => write!(f, "manual-throttle-forward-{}", amount),
            Command::Reverse => write!(f, "manual-throttle-reverse"),
            Command::Stop => write!(f, "manual-throttle-stop"),
        }
    }
}

/// Derive the per-frame command sequence from the primary detection box.
///
/// Always two commands: a turn followed by a throttle. Band boundaries
/// are deliberate: `w == 40`, `w == 70` and everything in `[70, 120]`
/// stop rather than move.
pub fn derive_commands(bbox: &DetectionBox, frame_width: u32) -> Vec<Command> {
    let frame_width = frame_width as f32;
    let off_center = bbox.x as f32 + bbox.w as f32 / 2.0 - frame_width / 2.0;
    let off_center_percent = off_center / frame_width;

    let mut commands = Vec::with_capacity(2);
    if off_center_percent.abs() > CENTER_DEADBAND {
        commands.push(Command::Turn(off_center_percent * TURN_GAIN + TURN_NEUTRAL));
    } else {
        commands.push(Command::TurnNeutral);
    }

    if bbox.w < FORWARD_MAX_WIDTH && bbox.w > FORWARD_MIN_WIDTH {
        commands.push(Command::Forward((FORWARD_MAX_WIDTH - bbox.w) as f32));
    } else if bbox.w > REVERSE_WIDTH {
        commands.push(Command::Reverse);
    } else {
        commands.push(Command::Stop);
    }
    commands
}

/// Human-readable status map, rebuilt from scratch every frame.
///
/// Insertion order is preserved so log output reads the way the
/// controller UI displayed it.
#[derive(Clone, Debug, Default)]
pub struct RobotStatus {
    entries: Vec<(String, String)>,
}

impl RobotStatus {
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| k == key) {
            entry.1 = value;
        } else {
            self.entries.push((key.to_string(), value));
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Everything produced while processing one frame.
///
/// Built fresh per iteration and dropped afterwards; nothing here
/// survives to the next frame.
#[derive(Clone, Debug)]
pub struct FrameContext {
    pub status: RobotStatus,
    pub commands: Vec<Command>,
}

impl FrameContext {
    pub fn new() -> Self {
        let mut status = RobotStatus::default();
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        status.set("Timestamp", now.to_string());
        status.set("Has Camera", "true");
        Self {
            status,
            commands: Vec::new(),
        }
    }

    /// Fold one frame's detection outcome into status and commands.
    ///
    /// No detection leaves the command queue empty.
    pub fn observe(&mut self, detections: Option<&FrameDetections>, frame_width: u32) {
        let Some(hit) = detections else {
            self.status.set("General", "No face found");
            return;
        };

        let bbox = &hit.primary;
        self.status.set("General", "Face found");
        self.status
            .set("Face Center X", format!("X: {}", bbox.center_x()));
        self.status
            .set("Face Center Y", format!("Y: {}", bbox.center_y()));
        let off_center = bbox.x as f32 + bbox.w as f32 / 2.0 - frame_width as f32 / 2.0;
        self.status.set("Face Off Center", off_center.to_string());

        self.commands = derive_commands(bbox, frame_width);
        for command in &self.commands {
            match command {
                Command::Turn(amount) => {
                    self.status.set("Direction", format!("Turning to: {}", amount));
                }
                Command::TurnNeutral => self.status.set("Direction", "Neutral"),
                Command::Forward(_) => self.status.set("Movement", "Forward"),
                Command::Reverse => self.status.set("Movement", "Reverse"),
                Command::Stop => self.status.set("Movement", "None"),
            }
        }
    }
}

impl Default for FrameContext {
    fn default() -> Self {
        Self::new()
    }
}
