//! facetrack - camera-follow steering for the RC rover.
//!
//! The daemon (`facetrackd`) owns one TCP connection carrying
//! length-prefixed still images from the camera. Each frame is decoded,
//! run through an ordered chain of object detectors, and the first
//! detection is turned into steering and throttle commands that are
//! posted to the controller server over HTTP.
//!
//! The loop is single-threaded and blocking throughout: frame `n` is
//! fully dispatched before frame `n + 1` is read.

pub mod command;
pub mod config;
pub mod detect;
pub mod dispatch;
pub mod frame;
pub mod pilot;

pub use command::{derive_commands, Command, FrameContext, RobotStatus};
#[cfg(feature = "detect-tract")]
pub use detect::TractFaceDetector;
pub use detect::{DetectionBox, Detector, DetectorChain, FrameDetections, StubDetector};
pub use dispatch::{flush, CommandSink, HttpCommandSink};
pub use frame::{read_frame, DecodedFrame, FrameRead};
pub use pilot::{PilotReport, PilotState};
