use crate::shared::error::ProcessingError;
use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::shared::video_source::VideoSource;

/// Reads frames from a video or image source.
///
/// Implementations handle I/O details (codec, container format, etc.)
/// while the pipeline works with the abstract `Frame` and `VideoMetadata`
/// types. Frames come out in BGR order with sequential indices.
pub trait VideoReader: Send {
    /// Opens a file or capture device and returns its metadata.
    ///
    /// Sources the reader cannot handle are `SourceUnavailable`.
    fn open(&mut self, source: &VideoSource) -> Result<VideoMetadata, ProcessingError>;

    /// Decodes the next frame. `Ok(None)` marks the end of the stream.
    fn read_frame(&mut self) -> Result<Option<Frame>, ProcessingError>;

    /// Iterates the remaining frames in decode order.
    fn frames(&mut self) -> Box<dyn Iterator<Item = Result<Frame, ProcessingError>> + '_> {
        Box::new(std::iter::from_fn(move || self.read_frame().transpose()))
    }

    /// Releases any resources held by the reader. Safe to call repeatedly.
    fn close(&mut self);
}
