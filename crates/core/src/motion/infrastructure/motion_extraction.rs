use crate::filtering::domain::frame_transform::FrameTransform;
use crate::motion::domain::motion_extractor::{MotionExtractor, MotionParams, MotionStep};
use crate::motion::infrastructure::contour_drawer::draw_contours;
use crate::shared::constants::{CONTOUR_COLOR, CONTOUR_THICKNESS};
use crate::shared::error::ProcessingError;
use crate::shared::frame::Frame;

/// Outlines moving objects on the original colour frame.
///
/// The first frame only seeds the background and is not displayed.
pub struct MotionExtraction {
    extractor: MotionExtractor,
    color: [u8; 3],
    thickness: u32,
    last_contours: usize,
    last_mask_pixels: usize,
}

impl MotionExtraction {
    pub fn new(params: MotionParams) -> Result<Self, ProcessingError> {
        Ok(Self {
            extractor: MotionExtractor::new(params)?,
            color: CONTOUR_COLOR,
            thickness: CONTOUR_THICKNESS,
            last_contours: 0,
            last_mask_pixels: 0,
        })
    }

    pub fn with_style(mut self, color: [u8; 3], thickness: u32) -> Self {
        self.color = color;
        self.thickness = thickness;
        self
    }

    pub fn extractor(&self) -> &MotionExtractor {
        &self.extractor
    }
}

impl FrameTransform for MotionExtraction {
    fn name(&self) -> &str {
        if self.extractor.params().smoothing.is_some() {
            "motion-smoothed"
        } else {
            "motion"
        }
    }

    fn apply(&mut self, frame: Frame) -> Result<Option<Frame>, ProcessingError> {
        match self.extractor.process(&frame)? {
            MotionStep::Seeded => Ok(None),
            MotionStep::Tracked { mask, contours } => {
                self.last_contours = contours.len();
                self.last_mask_pixels = mask.iter().filter(|&&v| v > 0).count();
                log::debug!(
                    "Frame {}: {} moving pixels, {} contours",
                    frame.index(),
                    self.last_mask_pixels,
                    self.last_contours
                );
                let mut annotated = frame;
                draw_contours(&mut annotated, &contours, self.color, self.thickness);
                Ok(Some(annotated))
            }
        }
    }

    fn metrics(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("contours", self.last_contours as f64),
            ("moving_pixels", self.last_mask_pixels as f64),
        ]
    }
}
