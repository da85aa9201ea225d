use crate::filtering::domain::frame_transform::FrameTransform;
use crate::shared::error::ProcessingError;
use crate::shared::frame::Frame;

use super::border;

/// Sigma used when the caller passes `sigma <= 0`, derived from the kernel size.
pub fn default_sigma(kernel_size: usize) -> f64 {
    0.3 * ((kernel_size as f64 - 1.0) * 0.5 - 1.0) + 0.8
}

fn validate_kernel_size(axis: &str, kernel_size: usize) -> Result<(), ProcessingError> {
    if kernel_size == 0 || kernel_size % 2 == 0 {
        return Err(ProcessingError::invalid(format!(
            "gaussian kernel {axis} size must be a positive odd integer, got {kernel_size}"
        )));
    }
    Ok(())
}

/// Precompute a normalised 1D Gaussian kernel.
///
/// `kernel_size` must be odd and >= 1. Weights fall off with the squared
/// distance from the centre; `sigma <= 0` selects [`default_sigma`].
pub fn gaussian_kernel_1d(kernel_size: usize, sigma: f64) -> Vec<f32> {
    debug_assert!(kernel_size >= 1 && kernel_size % 2 == 1);
    let sigma = if sigma > 0.0 {
        sigma
    } else {
        default_sigma(kernel_size)
    };
    let half = (kernel_size / 2) as f64;
    let mut kernel_f64: Vec<f64> = (0..kernel_size)
        .map(|i| {
            let x = i as f64 - half;
            (-x * x / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: f64 = kernel_f64.iter().sum();
    for v in &mut kernel_f64 {
        *v /= sum;
    }
    kernel_f64.iter().map(|&v| v as f32).collect()
}

/// Horizontal and vertical kernels, computed once and reused across frames.
#[derive(Clone, Debug)]
pub struct GaussianKernel {
    horizontal: Vec<f32>,
    vertical: Vec<f32>,
}

impl GaussianKernel {
    /// `sigma_y <= 0` reuses `sigma_x`, as does OpenCV.
    pub fn new(
        kx: usize,
        ky: usize,
        sigma_x: f64,
        sigma_y: f64,
    ) -> Result<Self, ProcessingError> {
        validate_kernel_size("width", kx)?;
        validate_kernel_size("height", ky)?;
        let sigma_y = if sigma_y > 0.0 { sigma_y } else { sigma_x };
        Ok(Self {
            horizontal: gaussian_kernel_1d(kx, sigma_x),
            vertical: gaussian_kernel_1d(ky, sigma_y),
        })
    }

    pub fn horizontal(&self) -> &[f32] {
        &self.horizontal
    }

    pub fn vertical(&self) -> &[f32] {
        &self.vertical
    }

    pub fn apply(&self, frame: &Frame) -> Frame {
        let mut data = frame.data().to_vec();
        let mut temp = Vec::new();
        separable_gaussian_blur_with_kernel(
            &mut data,
            frame.width() as usize,
            frame.height() as usize,
            frame.channels(),
            self,
            &mut temp,
        );
        frame.with_data(data, frame.format())
    }
}

/// Blurs a frame with a `kx x ky` Gaussian.
pub fn gaussian_blur(
    frame: &Frame,
    kx: usize,
    ky: usize,
    sigma_x: f64,
    sigma_y: f64,
) -> Result<Frame, ProcessingError> {
    Ok(GaussianKernel::new(kx, ky, sigma_x, sigma_y)?.apply(frame))
}

/// Apply a separable Gaussian blur in place, reusing `temp`.
///
/// Borders are reflect-101.
pub fn separable_gaussian_blur_with_kernel(
    data: &mut [u8],
    width: usize,
    height: usize,
    channels: usize,
    kernel: &GaussianKernel,
    temp: &mut Vec<f32>,
) {
    if width == 0 || height == 0 {
        return;
    }
    let hk = &kernel.horizontal;
    let vk = &kernel.vertical;
    if hk.len() <= 1 && vk.len() <= 1 {
        return;
    }
    let h_half = (hk.len() / 2) as isize;
    let v_half = (vk.len() / 2) as isize;

    temp.resize(width * height * channels, 0.0);

    // Horizontal pass: data → temp
    for y in 0..height {
        for x in 0..width {
            for c in 0..channels {
                let mut sum = 0.0f32;
                for (k, &w) in hk.iter().enumerate() {
                    let sx = border::reflect_101(x as isize + k as isize - h_half, width);
                    sum += data[(y * width + sx) * channels + c] as f32 * w;
                }
                temp[(y * width + x) * channels + c] = sum;
            }
        }
    }

    // Vertical pass: temp → data
    for y in 0..height {
        for x in 0..width {
            for c in 0..channels {
                let mut sum = 0.0f32;
                for (k, &w) in vk.iter().enumerate() {
                    let sy = border::reflect_101(y as isize + k as isize - v_half, height);
                    sum += temp[(sy * width + x) * channels + c] * w;
                }
                data[(y * width + x) * channels + c] = sum.round().clamp(0.0, 255.0) as u8;
            }
        }
    }
}

pub struct GaussianFilter {
    kernel: GaussianKernel,
}

impl GaussianFilter {
    pub fn new(kx: usize, ky: usize, sigma: f64) -> Result<Self, ProcessingError> {
        Ok(Self {
            kernel: GaussianKernel::new(kx, ky, sigma, 0.0)?,
        })
    }
}

impl FrameTransform for GaussianFilter {
    fn name(&self) -> &str {
        "gaussian"
    }

    fn apply(&mut self, frame: Frame) -> Result<Option<Frame>, ProcessingError> {
        Ok(Some(self.kernel.apply(&frame)))
    }
}
