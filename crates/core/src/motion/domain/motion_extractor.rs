use ndarray::Array2;

use crate::filtering::infrastructure::color;
use crate::filtering::infrastructure::gaussian::GaussianKernel;
use crate::motion::domain::contour::{find_external_contours, Contour};
use crate::motion::domain::running_average::{abs_diff, binary_mask, RunningAverage};
use crate::shared::constants::{
    DEFAULT_GAUSSIAN_SIGMA, DEFAULT_MOTION_CUTOFF, DEFAULT_MOTION_DECAY,
    DEFAULT_MOTION_SMOOTH_KSIZE, DEFAULT_SMOOTHED_MOTION_DECAY,
};
use crate::shared::error::ProcessingError;
use crate::shared::frame::Frame;

/// Gaussian pre-smoothing applied to each grayscale frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Smoothing {
    pub ksize: usize,
    pub sigma: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotionParams {
    /// Weight of the running average history, in (0, 1).
    pub decay: f32,
    /// Background differences above this count as motion.
    pub cutoff: u8,
    pub smoothing: Option<Smoothing>,
}

impl MotionParams {
    /// Settings of the unsmoothed variant.
    pub fn plain() -> Self {
        Self {
            decay: DEFAULT_MOTION_DECAY,
            cutoff: DEFAULT_MOTION_CUTOFF,
            smoothing: None,
        }
    }

    /// Settings of the Gaussian pre-smoothed variant.
    pub fn smoothed() -> Self {
        Self {
            decay: DEFAULT_SMOOTHED_MOTION_DECAY,
            cutoff: DEFAULT_MOTION_CUTOFF,
            smoothing: Some(Smoothing {
                ksize: DEFAULT_MOTION_SMOOTH_KSIZE,
                sigma: DEFAULT_GAUSSIAN_SIGMA,
            }),
        }
    }

    pub fn validate(&self) -> Result<(), ProcessingError> {
        if !(self.decay > 0.0 && self.decay < 1.0) {
            return Err(ProcessingError::invalid(format!(
                "decay weight must lie in (0, 1), got {}",
                self.decay
            )));
        }
        Ok(())
    }
}

impl Default for MotionParams {
    fn default() -> Self {
        Self::plain()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MotionState {
    /// No frame seen yet; the background is empty.
    Uninitialized,
    Tracking,
}

#[derive(Debug)]
pub enum MotionStep {
    /// The frame seeded the background; nothing to report.
    Seeded,
    Tracked {
        mask: Array2<u8>,
        contours: Vec<Contour>,
    },
}

/// Running-average background subtraction.
///
/// Each frame is converted to gray (optionally Gaussian-smoothed), folded into
/// the background, and compared with the rounded background; differences above
/// the cutoff form the motion mask, whose outer boundaries are returned.
pub struct MotionExtractor {
    params: MotionParams,
    kernel: Option<GaussianKernel>,
    background: RunningAverage,
}

impl MotionExtractor {
    pub fn new(params: MotionParams) -> Result<Self, ProcessingError> {
        params.validate()?;
        let kernel = params
            .smoothing
            .map(|s| GaussianKernel::new(s.ksize, s.ksize, s.sigma, s.sigma))
            .transpose()?;
        Ok(Self {
            params,
            kernel,
            background: RunningAverage::new(),
        })
    }

    pub fn params(&self) -> &MotionParams {
        &self.params
    }

    pub fn state(&self) -> MotionState {
        if self.background.is_seeded() {
            MotionState::Tracking
        } else {
            MotionState::Uninitialized
        }
    }

    pub fn background(&self) -> &RunningAverage {
        &self.background
    }

    pub fn process(&mut self, frame: &Frame) -> Result<MotionStep, ProcessingError> {
        let gray = color::to_gray(frame);
        let gray = match &self.kernel {
            Some(kernel) => kernel.apply(&gray),
            None => gray,
        };
        let plane = gray
            .plane()
            .ok_or_else(|| ProcessingError::invalid("grayscale conversion produced a colour frame"))?;

        let was_seeded = self.background.is_seeded();
        self.background.accumulate(plane, self.params.decay)?;
        if !was_seeded {
            log::debug!(
                "Background seeded from frame {} ({}x{})",
                frame.index(),
                frame.width(),
                frame.height()
            );
            return Ok(MotionStep::Seeded);
        }

        let background = self
            .background
            .rounded()
            .ok_or_else(|| ProcessingError::invalid("background is not seeded"))?;
        let diff = abs_diff(plane, background.view());
        let mask = binary_mask(diff.view(), self.params.cutoff);
        let contours = find_external_contours(mask.view());

        Ok(MotionStep::Tracked { mask, contours })
    }
}
