use std::path::{Path, PathBuf};

use crate::filtering::infrastructure::color;
use crate::shared::error::ProcessingError;
use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::frame_sink::FrameSink;

fn save_frame(path: &Path, frame: &Frame) -> Result<(), ProcessingError> {
    let rgb = color::to_rgb(frame);
    let img = image::RgbImage::from_raw(rgb.width(), rgb.height(), rgb.into_data())
        .ok_or_else(|| ProcessingError::sink("frame buffer does not match its dimensions"))?;
    img.save(path)
        .map_err(|e| ProcessingError::sink(format!("{}: {e}", path.display())))
}

/// Keeps a single image file updated with the most recently displayed frame.
pub struct SnapshotWriter {
    path: PathBuf,
    written: usize,
}

impl SnapshotWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            written: 0,
        }
    }
}

impl FrameSink for SnapshotWriter {
    fn open(&mut self, _metadata: &VideoMetadata) -> Result<(), ProcessingError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(ProcessingError::sink)?;
        }
        self.written = 0;
        Ok(())
    }

    fn display(&mut self, frame: &Frame) -> Result<(), ProcessingError> {
        save_frame(&self.path, frame)?;
        self.written += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), ProcessingError> {
        if self.written > 0 {
            log::info!("Saved last of {} frames to {}", self.written, self.path.display());
            self.written = 0;
        }
        Ok(())
    }
}

/// Writes every displayed frame as `frame_NNNNN.png` inside a directory.
pub struct ImageSequenceWriter {
    dir: PathBuf,
    written: usize,
}

impl ImageSequenceWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            written: 0,
        }
    }

    pub fn frame_path(&self, index: usize) -> PathBuf {
        self.dir.join(format!("frame_{index:05}.png"))
    }
}

impl FrameSink for ImageSequenceWriter {
    fn open(&mut self, _metadata: &VideoMetadata) -> Result<(), ProcessingError> {
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| ProcessingError::sink(format!("{}: {e}", self.dir.display())))?;
        self.written = 0;
        Ok(())
    }

    fn display(&mut self, frame: &Frame) -> Result<(), ProcessingError> {
        save_frame(&self.frame_path(frame.index()), frame)?;
        self.written += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), ProcessingError> {
        if self.written > 0 {
            log::info!("Wrote {} frames to {}", self.written, self.dir.display());
            self.written = 0;
        }
        Ok(())
    }
}
