/// To-zero threshold cutoff used by the `threshold` demo.
pub const DEFAULT_THRESHOLD_CUTOFF: u8 = 67;

/// Difference cutoff for the motion mask.
pub const DEFAULT_MOTION_CUTOFF: u8 = 3;

/// Running-average decay weight without pre-smoothing.
pub const DEFAULT_MOTION_DECAY: f32 = 0.9;

/// Running-average decay weight when frames are Gaussian pre-smoothed.
pub const DEFAULT_SMOOTHED_MOTION_DECAY: f32 = 0.8;

pub const DEFAULT_MEDIAN_KSIZE: usize = 5;
pub const DEFAULT_BOX_SIZE: (usize, usize) = (5, 5);
pub const DEFAULT_GAUSSIAN_KSIZE: (usize, usize) = (3, 3);
pub const DEFAULT_GAUSSIAN_SIGMA: f64 = 1.3;
pub const DEFAULT_MOTION_SMOOTH_KSIZE: usize = 7;
pub const DEFAULT_GRADIENT_SIZE: usize = 3;

/// Contour colour in BGR order (green).
pub const CONTOUR_COLOR: [u8; 3] = [0, 255, 0];
pub const CONTOUR_THICKNESS: u32 = 3;

/// Delay between displayed frames (~20 fps playback).
pub const DEFAULT_FRAME_DELAY_MS: u64 = 50;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];

pub const VIDEO_EXTENSIONS: &[&str] = &["avi", "mp4", "mkv", "mov", "webm", "m4v"];
