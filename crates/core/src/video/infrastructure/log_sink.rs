use crate::shared::error::ProcessingError;
use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::frame_sink::FrameSink;

/// Sink used when no output is requested: reports each frame through `log`.
#[derive(Default)]
pub struct LogSink {
    displayed: usize,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn displayed(&self) -> usize {
        self.displayed
    }
}

fn mean_intensity(frame: &Frame) -> f64 {
    let data = frame.data();
    if data.is_empty() {
        return 0.0;
    }
    data.iter().map(|&v| v as u64).sum::<u64>() as f64 / data.len() as f64
}

impl FrameSink for LogSink {
    fn open(&mut self, metadata: &VideoMetadata) -> Result<(), ProcessingError> {
        self.displayed = 0;
        log::info!(
            "Displaying {}x{} frames (no output file)",
            metadata.width,
            metadata.height
        );
        Ok(())
    }

    fn display(&mut self, frame: &Frame) -> Result<(), ProcessingError> {
        self.displayed += 1;
        log::debug!(
            "Frame {}: {}x{} {:?}, mean {:.1}",
            frame.index(),
            frame.width(),
            frame.height(),
            frame.format(),
            mean_intensity(frame)
        );
        Ok(())
    }

    fn close(&mut self) -> Result<(), ProcessingError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::frame::PixelFormat;
    use approx::assert_relative_eq;

    #[test]
    fn test_counts_displayed_frames() {
        let mut sink = LogSink::new();
        sink.open(&VideoMetadata::still_image(2, 1, std::path::Path::new("a.png")))
            .unwrap();
        let frame = Frame::new(vec![0, 10, 20, 30, 40, 50], 2, 1, PixelFormat::Bgr, 0);
        sink.display(&frame).unwrap();
        sink.display(&frame).unwrap();
        sink.close().unwrap();
        assert_eq!(sink.displayed(), 2);
    }

    #[test]
    fn test_mean_intensity() {
        let frame = Frame::new(vec![0, 10, 20, 30], 2, 2, PixelFormat::Gray, 0);
        assert_relative_eq!(mean_intensity(&frame), 15.0);
    }
}
