use crate::filtering::domain::frame_transform::FrameTransform;
use crate::shared::error::ProcessingError;
use crate::shared::frame::Frame;

use super::border;

fn validate_window(kw: usize, kh: usize) -> Result<(), ProcessingError> {
    if kw == 0 || kh == 0 {
        return Err(ProcessingError::invalid(format!(
            "box window must be at least 1x1, got {kw}x{kh}"
        )));
    }
    Ok(())
}

/// Normalised moving-average filter with independent horizontal (`kw`) and
/// vertical (`kh`) windows, anchored at the window centre.
pub fn box_blur(frame: &Frame, kw: usize, kh: usize) -> Result<Frame, ProcessingError> {
    validate_window(kw, kh)?;

    let width = frame.width() as usize;
    let height = frame.height() as usize;
    let channels = frame.channels();
    let src = frame.data();
    if width == 0 || height == 0 {
        return Ok(frame.clone());
    }

    let x0 = -((kw / 2) as isize);
    let y0 = -((kh / 2) as isize);

    // Horizontal sums: src → temp
    let mut temp = vec![0u32; src.len()];
    for y in 0..height {
        for x in 0..width {
            for c in 0..channels {
                let mut sum = 0u32;
                for k in 0..kw as isize {
                    let sx = border::reflect_101(x as isize + x0 + k, width);
                    sum += src[(y * width + sx) * channels + c] as u32;
                }
                temp[(y * width + x) * channels + c] = sum;
            }
        }
    }

    // Vertical sums: temp → out
    let area = (kw * kh) as u32;
    let mut out = vec![0u8; src.len()];
    for y in 0..height {
        for x in 0..width {
            for c in 0..channels {
                let mut sum = 0u32;
                for k in 0..kh as isize {
                    let sy = border::reflect_101(y as isize + y0 + k, height);
                    sum += temp[(sy * width + x) * channels + c];
                }
                out[(y * width + x) * channels + c] = ((sum + area / 2) / area).min(255) as u8;
            }
        }
    }

    Ok(frame.with_data(out, frame.format()))
}

pub struct BoxFilter {
    kw: usize,
    kh: usize,
}

impl BoxFilter {
    pub fn new(kw: usize, kh: usize) -> Result<Self, ProcessingError> {
        validate_window(kw, kh)?;
        Ok(Self { kw, kh })
    }
}

impl FrameTransform for BoxFilter {
    fn name(&self) -> &str {
        "box"
    }

    fn apply(&mut self, frame: Frame) -> Result<Option<Frame>, ProcessingError> {
        box_blur(&frame, self.kw, self.kh).map(Some)
    }
}
