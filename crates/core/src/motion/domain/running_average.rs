use ndarray::{Array2, ArrayView2, Zip};

use crate::shared::error::ProcessingError;

/// Exponentially weighted average of grayscale planes, used as a dynamic
/// background estimate.
///
/// Empty until the first plane arrives, which seeds it; every later plane
/// updates it in place with `avg = decay * avg + (1 - decay) * plane`.
#[derive(Clone, Debug, Default)]
pub struct RunningAverage {
    avg: Option<Array2<f32>>,
}

impl RunningAverage {
    pub fn new() -> Self {
        Self { avg: None }
    }

    pub fn is_seeded(&self) -> bool {
        self.avg.is_some()
    }

    pub fn values(&self) -> Option<&Array2<f32>> {
        self.avg.as_ref()
    }

    /// Seeds the average with `plane`, or folds `plane` into it.
    ///
    /// `decay` must lie in (0, 1) and `plane` must match the seeded shape.
    pub fn accumulate(&mut self, plane: ArrayView2<'_, u8>, decay: f32) -> Result<(), ProcessingError> {
        if !(decay > 0.0 && decay < 1.0) {
            return Err(ProcessingError::invalid(format!(
                "decay weight must lie in (0, 1), got {decay}"
            )));
        }

        match self.avg.as_mut() {
            None => {
                self.avg = Some(plane.mapv(f32::from));
            }
            Some(avg) => {
                if avg.dim() != plane.dim() {
                    return Err(ProcessingError::invalid(format!(
                        "frame size {:?} does not match background size {:?}",
                        plane.dim(),
                        avg.dim()
                    )));
                }
                let fresh = 1.0 - decay;
                Zip::from(avg).and(&plane).for_each(|a, &p| {
                    *a = decay * *a + fresh * f32::from(p);
                });
            }
        }
        Ok(())
    }

    /// The average rounded (halves to even) and saturated back to 8-bit
    /// intensities.
    pub fn rounded(&self) -> Option<Array2<u8>> {
        self.avg
            .as_ref()
            .map(|avg| avg.mapv(|v| v.round_ties_even().clamp(0.0, 255.0) as u8))
    }
}

/// Per-pixel `|a - b|`. Both planes must have the same shape.
pub fn abs_diff(a: ArrayView2<'_, u8>, b: ArrayView2<'_, u8>) -> Array2<u8> {
    Zip::from(&a).and(&b).map_collect(|&x, &y| x.abs_diff(y))
}

/// 255 where `diff > cutoff`, 0 elsewhere. A cutoff of 0 marks every
/// changed pixel.
pub fn binary_mask(diff: ArrayView2<'_, u8>, cutoff: u8) -> Array2<u8> {
    diff.mapv(|d| if d > cutoff { u8::MAX } else { 0 })
}
