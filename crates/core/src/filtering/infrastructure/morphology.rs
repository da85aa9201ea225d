use crate::filtering::domain::frame_transform::FrameTransform;
use crate::shared::error::ProcessingError;
use crate::shared::frame::Frame;

/// Dilation minus erosion with a rectangular `size x size` element, per channel.
///
/// Pixels outside the frame are ignored, so borders neither grow nor shrink
/// the extrema.
pub fn morphological_gradient(frame: &Frame, size: usize) -> Result<Frame, ProcessingError> {
    if size == 0 {
        return Err(ProcessingError::invalid(
            "structuring element size must be at least 1",
        ));
    }

    let width = frame.width() as usize;
    let height = frame.height() as usize;
    let channels = frame.channels();
    let src = frame.data();
    let before = (size / 2) as isize;
    let after = size as isize - 1 - before;

    let mut out = vec![0u8; src.len()];
    for y in 0..height {
        let y_lo = (y as isize - before).max(0) as usize;
        let y_hi = ((y as isize + after) as usize).min(height - 1);
        for x in 0..width {
            let x_lo = (x as isize - before).max(0) as usize;
            let x_hi = ((x as isize + after) as usize).min(width - 1);
            for c in 0..channels {
                let mut lo = u8::MAX;
                let mut hi = u8::MIN;
                for sy in y_lo..=y_hi {
                    for sx in x_lo..=x_hi {
                        let v = src[(sy * width + sx) * channels + c];
                        lo = lo.min(v);
                        hi = hi.max(v);
                    }
                }
                out[(y * width + x) * channels + c] = hi - lo;
            }
        }
    }

    Ok(frame.with_data(out, frame.format()))
}

pub struct MorphologicalGradient {
    size: usize,
}

impl MorphologicalGradient {
    pub fn new(size: usize) -> Result<Self, ProcessingError> {
        if size == 0 {
            return Err(ProcessingError::invalid(
                "structuring element size must be at least 1",
            ));
        }
        Ok(Self { size })
    }
}

impl FrameTransform for MorphologicalGradient {
    fn name(&self) -> &str {
        "gradient"
    }

    fn apply(&mut self, frame: Frame) -> Result<Option<Frame>, ProcessingError> {
        morphological_gradient(&frame, self.size).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::frame::PixelFormat;

    #[test]
    fn test_flat_region_has_zero_gradient() {
        let frame = Frame::new(vec![77u8; 6 * 6 * 3], 6, 6, PixelFormat::Bgr, 0);
        let out = morphological_gradient(&frame, 3).unwrap();
        assert!(out.data().iter().all(|&v| v == 0));
    }

    #[test]
    fn test_step_edge_marks_both_sides() {
        let data: Vec<u8> = (0..8 * 4)
            .map(|i| if i % 8 < 4 { 10 } else { 210 })
            .collect();
        let frame = Frame::new(data, 8, 4, PixelFormat::Gray, 0);
        let out = morphological_gradient(&frame, 3).unwrap();
        for y in 0..4 {
            assert_eq!(out.data()[y * 8 + 2], 0);
            assert_eq!(out.data()[y * 8 + 3], 200);
            assert_eq!(out.data()[y * 8 + 4], 200);
            assert_eq!(out.data()[y * 8 + 5], 0);
        }
    }

    #[test]
    fn test_zero_size_rejected() {
        let frame = Frame::new(vec![0u8; 4], 2, 2, PixelFormat::Gray, 0);
        assert!(morphological_gradient(&frame, 0).is_err());
        assert!(MorphologicalGradient::new(0).is_err());
    }
}
