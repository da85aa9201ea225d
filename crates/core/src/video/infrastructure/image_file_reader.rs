use crate::shared::error::ProcessingError;
use crate::shared::frame::{Frame, PixelFormat};
use crate::shared::video_metadata::VideoMetadata;
use crate::shared::video_source::VideoSource;
use crate::video::domain::video_reader::VideoReader;

/// Adapts a single image file to the [`VideoReader`] interface.
///
/// Treats the image as a one-frame video with `fps=0` and `total_frames=1`,
/// allowing the pipeline to process images and videos uniformly.
pub struct ImageFileReader {
    frame: Option<Frame>,
    opened: bool,
}

impl ImageFileReader {
    pub fn new() -> Self {
        Self {
            frame: None,
            opened: false,
        }
    }
}

impl Default for ImageFileReader {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoReader for ImageFileReader {
    fn open(&mut self, source: &VideoSource) -> Result<VideoMetadata, ProcessingError> {
        let path = source.path().ok_or_else(|| {
            ProcessingError::source_unavailable(source, "not an image file")
        })?;
        let rgb = image::open(path)
            .map_err(|e| ProcessingError::source_unavailable(path.display(), e))?
            .to_rgb8();
        let (width, height) = rgb.dimensions();

        let mut data = rgb.into_raw();
        for px in data.chunks_exact_mut(3) {
            px.swap(0, 2);
        }

        log::info!("Opened image {} ({width}x{height})", path.display());
        self.frame = Some(Frame::new(data, width, height, PixelFormat::Bgr, 0));
        self.opened = true;
        Ok(VideoMetadata::still_image(width, height, path))
    }

    fn read_frame(&mut self) -> Result<Option<Frame>, ProcessingError> {
        if !self.opened {
            return Err(ProcessingError::invalid("ImageFileReader: not opened"));
        }
        Ok(self.frame.take())
    }

    fn close(&mut self) {
        self.frame = None;
        self.opened = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};

    fn write_test_image(dir: &Path, width: u32, height: u32) -> PathBuf {
        let path = dir.join("lena.png");
        let mut img = image::RgbImage::new(width, height);
        for pixel in img.pixels_mut() {
            *pixel = image::Rgb([50, 100, 200]);
        }
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn test_open_returns_still_image_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_test_image(dir.path(), 100, 80);
        let mut reader = ImageFileReader::new();
        let meta = reader.open(&VideoSource::file(&path)).unwrap();
        assert_eq!(meta.width, 100);
        assert_eq!(meta.height, 80);
        assert!(meta.is_still_image());
        assert_eq!(meta.source_path, Some(path));
    }

    #[test]
    fn test_open_nonexistent_is_source_unavailable() {
        let mut reader = ImageFileReader::new();
        assert!(matches!(
            reader.open(&VideoSource::file("/nonexistent/lena.png")),
            Err(ProcessingError::SourceUnavailable { .. })
        ));
    }

    #[test]
    fn test_camera_is_source_unavailable() {
        let mut reader = ImageFileReader::new();
        assert!(matches!(
            reader.open(&VideoSource::Camera(0)),
            Err(ProcessingError::SourceUnavailable { .. })
        ));
        assert!(reader.read_frame().is_err());
    }

    #[test]
    fn test_yields_single_frame_then_end_of_stream() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_test_image(dir.path(), 100, 80);
        let mut reader = ImageFileReader::new();
        reader.open(&VideoSource::file(&path)).unwrap();

        let frames: Vec<_> = reader.frames().map(|f| f.unwrap()).collect();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].index(), 0);
        assert!(reader.read_frame().unwrap().is_none());
    }

    #[test]
    fn test_frame_is_bgr() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_test_image(dir.path(), 100, 80);
        let mut reader = ImageFileReader::new();
        reader.open(&VideoSource::file(&path)).unwrap();

        let frame = reader.read_frame().unwrap().unwrap();
        assert_eq!(frame.format(), PixelFormat::Bgr);
        assert_eq!(&frame.data()[..3], &[200, 100, 50]);
        assert_eq!(frame.width(), 100);
        assert_eq!(frame.height(), 80);
    }

    #[test]
    fn test_read_without_open_returns_error() {
        let mut reader = ImageFileReader::new();
        assert!(reader.read_frame().is_err());
    }

    #[test]
    fn test_close_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_test_image(dir.path(), 10, 10);
        let mut reader = ImageFileReader::new();
        reader.open(&VideoSource::file(&path)).unwrap();
        reader.close();
        reader.close();
        assert!(reader.read_frame().is_err());
    }
}
