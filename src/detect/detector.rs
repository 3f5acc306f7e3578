use anyhow::Result;

/// Axis-aligned detection rectangle in frame pixel coordinates.
///
/// One per detected region, produced fresh each frame; never retained
/// across frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DetectionBox {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl DetectionBox {
    /// Horizontal center in whole pixels, as the controller UI reports it.
    pub fn center_x(&self) -> i32 {
        self.x + self.w / 2
    }

    /// Vertical center in whole pixels.
    pub fn center_y(&self) -> i32 {
        self.y + self.h / 2
    }
}

/// Object detector trait.
///
/// Implementations receive the grayscale plane of one frame and return
/// zero or more candidate boxes. The detection algorithm itself is an
/// external concern; this crate only sequences detectors and consumes
/// their boxes.
pub trait Detector: Send {
    /// Detector identifier, used in config and status output.
    fn name(&self) -> &'static str;

    /// Run detection on one frame.
    ///
    /// `pixels` is the row-major grayscale plane, `width * height` bytes.
    fn detect(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<Vec<DetectionBox>>;

    /// Optional warm-up hook, run once before the loop starts.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}
