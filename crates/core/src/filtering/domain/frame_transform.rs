use crate::shared::error::ProcessingError;
use crate::shared::frame::Frame;

/// One per-frame operation applied by the frame processor.
///
/// Returning `Ok(None)` means the frame was consumed without producing
/// anything to display (e.g. the frame that seeds a background model).
pub trait FrameTransform: Send {
    fn name(&self) -> &str;

    fn apply(&mut self, frame: Frame) -> Result<Option<Frame>, ProcessingError>;

    /// Point-in-time metrics about the last applied frame. Default: none.
    fn metrics(&self) -> Vec<(&'static str, f64)> {
        Vec::new()
    }
}
