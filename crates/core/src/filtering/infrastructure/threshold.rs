use crate::filtering::domain::frame_transform::FrameTransform;
use crate::shared::error::ProcessingError;
use crate::shared::frame::Frame;

use super::color;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThresholdKind {
    /// Passing pixels become `max_value`, the rest 0.
    Binary,
    /// Passing pixels keep their value, the rest become 0.
    ToZero,
}

/// `Binary` passes pixels strictly above the cutoff; `ToZero` keeps pixels at
/// or above it.
pub fn threshold_value(value: u8, cutoff: u8, max_value: u8, kind: ThresholdKind) -> u8 {
    let passes = match kind {
        ThresholdKind::Binary => value > cutoff,
        ThresholdKind::ToZero => value >= cutoff,
    };
    match (kind, passes) {
        (ThresholdKind::Binary, true) => max_value,
        (ThresholdKind::ToZero, true) => value,
        (_, false) => 0,
    }
}

/// Applies the threshold to every byte of the frame, keeping its format.
pub fn threshold(frame: &Frame, cutoff: u8, max_value: u8, kind: ThresholdKind) -> Frame {
    let data = frame
        .data()
        .iter()
        .map(|&v| threshold_value(v, cutoff, max_value, kind))
        .collect();
    frame.with_data(data, frame.format())
}

/// Gray-replicates the frame, then zeroes every pixel below the cutoff.
pub struct ToZeroThreshold {
    cutoff: u8,
}

impl ToZeroThreshold {
    pub fn new(cutoff: u8) -> Self {
        Self { cutoff }
    }
}

impl FrameTransform for ToZeroThreshold {
    fn name(&self) -> &str {
        "threshold"
    }

    fn apply(&mut self, frame: Frame) -> Result<Option<Frame>, ProcessingError> {
        let gray = color::gray_replicated(&frame);
        Ok(Some(threshold(&gray, self.cutoff, u8::MAX, ThresholdKind::ToZero)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::frame::PixelFormat;
    use rstest::rstest;

    #[rstest]
    #[case::below(66, 0)]
    #[case::at_cutoff(67, 67)]
    #[case::above(200, 200)]
    #[case::zero(0, 0)]
    #[case::max(255, 255)]
    fn test_to_zero_keeps_pixels_at_or_above_cutoff(#[case] value: u8, #[case] expected: u8) {
        assert_eq!(
            threshold_value(value, 67, 255, ThresholdKind::ToZero),
            expected
        );
    }

    #[rstest]
    #[case::below(2, 0)]
    #[case::at_cutoff(3, 0)]
    #[case::just_above(4, 255)]
    #[case::above(90, 255)]
    fn test_binary_saturates_pixels_above_cutoff(#[case] value: u8, #[case] expected: u8) {
        assert_eq!(
            threshold_value(value, 3, 255, ThresholdKind::Binary),
            expected
        );
    }

    #[test]
    fn test_to_zero_over_every_intensity() {
        let data: Vec<u8> = (0..=255).collect();
        let frame = Frame::new(data.clone(), 256, 1, PixelFormat::Gray, 0);
        let out = threshold(&frame, 67, 255, ThresholdKind::ToZero);
        for (&p, &o) in data.iter().zip(out.data()) {
            if p >= 67 {
                assert_eq!(o, p);
            } else {
                assert_eq!(o, 0);
            }
        }
    }

    #[test]
    fn test_transform_outputs_thresholded_gray_in_three_channels() {
        // BGR white and dark blue: gray 255 and 29
        let frame = Frame::new(vec![255, 255, 255, 255, 0, 0], 2, 1, PixelFormat::Bgr, 4);
        let out = ToZeroThreshold::new(67).apply(frame).unwrap().unwrap();
        assert_eq!(out.channels(), 3);
        assert_eq!(out.index(), 4);
        assert_eq!(out.data(), &[255, 255, 255, 0, 0, 0]);
    }
}
