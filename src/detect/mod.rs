mod backends;
mod chain;
mod detector;

pub use backends::StubDetector;
#[cfg(feature = "detect-tract")]
pub use backends::TractFaceDetector;
pub use chain::{DetectorChain, FrameDetections};
pub use detector::{DetectionBox, Detector};
