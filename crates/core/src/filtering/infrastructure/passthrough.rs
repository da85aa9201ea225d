use crate::filtering::domain::frame_transform::FrameTransform;
use crate::shared::error::ProcessingError;
use crate::shared::frame::Frame;

/// Displays frames unchanged (plain playback).
pub struct Passthrough;

impl FrameTransform for Passthrough {
    fn name(&self) -> &str {
        "play"
    }

    fn apply(&mut self, frame: Frame) -> Result<Option<Frame>, ProcessingError> {
        Ok(Some(frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::frame::PixelFormat;

    #[test]
    fn test_returns_frame_unchanged() {
        let frame = Frame::new(vec![1, 2, 3, 4, 5, 6], 2, 1, PixelFormat::Bgr, 3);
        let out = Passthrough.apply(frame.clone()).unwrap().unwrap();
        assert_eq!(out, frame);
    }
}
