use std::collections::VecDeque;

use anyhow::Result;

use crate::detect::detector::{DetectionBox, Detector};

/// Stub detector for testing and dry runs.
///
/// Plays back a scripted sequence of per-frame box lists; once the
/// script runs out it reports nothing, which keeps the daemon runnable
/// without any model on disk.
pub struct StubDetector {
    frames: VecDeque<Vec<DetectionBox>>,
}

impl StubDetector {
    pub fn new() -> Self {
        Self {
            frames: VecDeque::new(),
        }
    }

    pub fn with_frames<I: IntoIterator<Item = Vec<DetectionBox>>>(frames: I) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    /// Queue the box list to return for the next unscripted frame.
    pub fn push_frame(&mut self, boxes: Vec<DetectionBox>) {
        self.frames.push_back(boxes);
    }
}

impl Default for StubDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for StubDetector {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn detect(&mut self, _pixels: &[u8], _width: u32, _height: u32) -> Result<Vec<DetectionBox>> {
        Ok(self.frames.pop_front().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plays_back_script_then_reports_nothing() {
        let bbox = DetectionBox {
            x: 1,
            y: 2,
            w: 3,
            h: 4,
        };
        let mut stub = StubDetector::with_frames([vec![bbox], vec![]]);

        assert_eq!(stub.detect(&[], 320, 240).unwrap(), vec![bbox]);
        assert_eq!(stub.detect(&[], 320, 240).unwrap(), vec![]);
        assert_eq!(stub.detect(&[], 320, 240).unwrap(), vec![]);
    }
}
