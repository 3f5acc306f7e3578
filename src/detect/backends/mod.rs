mod stub;
#[cfg(feature = "detect-tract")]
mod tract;

pub use stub::StubDetector;
#[cfg(feature = "detect-tract")]
pub use tract::TractFaceDetector;
