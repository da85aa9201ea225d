use crate::shared::error::ProcessingError;
use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;

/// Destination for processed frames, standing in for an on-screen window.
pub trait FrameSink: Send {
    fn open(&mut self, metadata: &VideoMetadata) -> Result<(), ProcessingError>;

    fn display(&mut self, frame: &Frame) -> Result<(), ProcessingError>;

    /// Flushes and releases the sink. Safe to call repeatedly.
    fn close(&mut self) -> Result<(), ProcessingError>;
}
