use crate::filtering::domain::frame_transform::FrameTransform;
use crate::shared::error::ProcessingError;
use crate::shared::frame::Frame;

use super::border;

pub fn validate_ksize(ksize: usize) -> Result<(), ProcessingError> {
    if ksize == 0 || ksize % 2 == 0 {
        return Err(ProcessingError::invalid(format!(
            "median kernel size must be a positive odd integer, got {ksize}"
        )));
    }
    Ok(())
}

/// Replaces each pixel by the median of its `ksize x ksize` neighbourhood,
/// per channel, with replicated borders.
pub fn median_blur(frame: &Frame, ksize: usize) -> Result<Frame, ProcessingError> {
    validate_ksize(ksize)?;
    if ksize == 1 {
        return Ok(frame.clone());
    }

    let width = frame.width() as usize;
    let height = frame.height() as usize;
    let channels = frame.channels();
    let src = frame.data();
    let half = (ksize / 2) as isize;
    let mid = ksize * ksize / 2;

    let mut out = vec![0u8; src.len()];
    let mut window = Vec::with_capacity(ksize * ksize);

    for y in 0..height {
        for x in 0..width {
            for c in 0..channels {
                window.clear();
                for dy in -half..=half {
                    let sy = border::replicate(y as isize + dy, height);
                    for dx in -half..=half {
                        let sx = border::replicate(x as isize + dx, width);
                        window.push(src[(sy * width + sx) * channels + c]);
                    }
                }
                let (_, median, _) = window.select_nth_unstable(mid);
                out[(y * width + x) * channels + c] = *median;
            }
        }
    }

    Ok(frame.with_data(out, frame.format()))
}

pub struct MedianFilter {
    ksize: usize,
}

impl MedianFilter {
    pub fn new(ksize: usize) -> Result<Self, ProcessingError> {
        validate_ksize(ksize)?;
        Ok(Self { ksize })
    }
}

impl FrameTransform for MedianFilter {
    fn name(&self) -> &str {
        "median"
    }

    fn apply(&mut self, frame: Frame) -> Result<Option<Frame>, ProcessingError> {
        median_blur(&frame, self.ksize).map(Some)
    }
}
