use anyhow::Result;

use super::detector::{DetectionBox, Detector};

/// All boxes found in one frame.
///
/// `primary` is the first box returned by the first detector that found
/// anything; it alone drives movement. Every other box in the frame,
/// including boxes from detectors later in the chain, lands in `extras`
/// for status/display purposes only.
#[derive(Clone, Debug)]
pub struct FrameDetections {
    /// Name of the detector that supplied the primary box.
    pub detector: &'static str,
    pub primary: DetectionBox,
    pub extras: Vec<DetectionBox>,
}

/// Ordered, prioritized list of detectors, iterated once per frame.
///
/// Priority is list order: the first detector returning a non-empty
/// result wins. Later detectors still run so their boxes can be
/// reported, but they never influence commands.
pub struct DetectorChain {
    detectors: Vec<Box<dyn Detector>>,
}

impl DetectorChain {
    pub fn new() -> Self {
        Self {
            detectors: Vec::new(),
        }
    }

    /// Append a detector at the lowest priority so far.
    pub fn push<D: Detector + 'static>(&mut self, detector: D) {
        self.detectors.push(Box::new(detector));
    }

    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }

    /// Detector names in priority order.
    pub fn names(&self) -> Vec<&'static str> {
        self.detectors.iter().map(|d| d.name()).collect()
    }

    /// Warm every detector up before the loop starts.
    pub fn warm_up(&mut self) -> Result<()> {
        for detector in &mut self.detectors {
            detector.warm_up()?;
        }
        Ok(())
    }

    /// Run the chain over one frame, first-match-wins.
    pub fn first_match(
        &mut self,
        pixels: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Option<FrameDetections>> {
        let mut found: Option<FrameDetections> = None;
        for detector in &mut self.detectors {
            let boxes = detector.detect(pixels, width, height)?;
            match &mut found {
                Some(hit) => hit.extras.extend(boxes),
                None => {
                    let mut boxes = boxes.into_iter();
                    if let Some(primary) = boxes.next() {
                        found = Some(FrameDetections {
                            detector: detector.name(),
                            primary,
                            extras: boxes.collect(),
                        });
                    }
                }
            }
        }
        Ok(found)
    }
}

impl Default for DetectorChain {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::StubDetector;

    fn bx(x: i32, w: i32) -> DetectionBox {
        DetectionBox { x, y: 0, w, h: 10 }
    }

    #[test]
    fn first_nonempty_detector_supplies_primary() {
        let mut chain = DetectorChain::new();
        chain.push(StubDetector::with_frames([vec![]]));
        chain.push(StubDetector::with_frames([vec![bx(50, 20), bx(90, 30)]]));

        let hit = chain.first_match(&[], 320, 240).unwrap().unwrap();
        assert_eq!(hit.primary, bx(50, 20));
        assert_eq!(hit.extras, vec![bx(90, 30)]);
    }

    #[test]
    fn later_detectors_only_add_extras() {
        let mut chain = DetectorChain::new();
        chain.push(StubDetector::with_frames([vec![bx(10, 60), bx(20, 30)]]));
        chain.push(StubDetector::with_frames([vec![bx(200, 40)]]));

        let hit = chain.first_match(&[], 320, 240).unwrap().unwrap();
        assert_eq!(hit.primary, bx(10, 60));
        assert_eq!(hit.extras, vec![bx(20, 30), bx(200, 40)]);
    }

    #[test]
    fn empty_chain_and_empty_detectors_find_nothing() {
        let mut chain = DetectorChain::new();
        assert!(chain.is_empty());
        assert!(chain.first_match(&[], 320, 240).unwrap().is_none());

        chain.push(StubDetector::with_frames([vec![]]));
        assert_eq!(chain.len(), 1);
        assert_eq!(chain.names(), vec!["stub"]);
        assert!(chain.first_match(&[], 320, 240).unwrap().is_none());
    }
}
