use crate::filtering::domain::frame_transform::FrameTransform;
use crate::shared::error::ProcessingError;
use crate::shared::frame::{Frame, PixelFormat};

const R_WEIGHT: f32 = 0.299;
const G_WEIGHT: f32 = 0.587;
const B_WEIGHT: f32 = 0.114;

fn luma(r: u8, g: u8, b: u8) -> u8 {
    (R_WEIGHT * r as f32 + G_WEIGHT * g as f32 + B_WEIGHT * b as f32)
        .round()
        .clamp(0.0, 255.0) as u8
}

/// Single-channel luma (ITU-R BT.601 weights), honouring the channel order.
pub fn to_gray(frame: &Frame) -> Frame {
    let data = match frame.format() {
        PixelFormat::Gray => return frame.clone(),
        PixelFormat::Bgr => frame
            .data()
            .chunks_exact(3)
            .map(|px| luma(px[2], px[1], px[0]))
            .collect(),
        PixelFormat::Rgb => frame
            .data()
            .chunks_exact(3)
            .map(|px| luma(px[0], px[1], px[2]))
            .collect(),
    };
    frame.with_data(data, PixelFormat::Gray)
}

/// Gray replicated into all three channels.
///
/// A colour input keeps its format tag; a gray input comes back tagged BGR.
pub fn gray_replicated(frame: &Frame) -> Frame {
    let gray = to_gray(frame);
    let format = match frame.format() {
        PixelFormat::Gray => PixelFormat::Bgr,
        other => other,
    };
    let data = gray.data().iter().flat_map(|&v| [v, v, v]).collect();
    frame.with_data(data, format)
}

/// Reverses the channel order (BGR <-> RGB).
pub fn swap_red_blue(frame: &Frame) -> Result<Frame, ProcessingError> {
    let format = match frame.format() {
        PixelFormat::Bgr => PixelFormat::Rgb,
        PixelFormat::Rgb => PixelFormat::Bgr,
        PixelFormat::Gray => {
            return Err(ProcessingError::invalid(
                "cannot swap red and blue on a gray frame",
            ))
        }
    };
    let data = frame
        .data()
        .chunks_exact(3)
        .flat_map(|px| [px[2], px[1], px[0]])
        .collect();
    Ok(frame.with_data(data, format))
}

/// Converts any frame to RGB for encoders and image files.
pub fn to_rgb(frame: &Frame) -> Frame {
    match frame.format() {
        PixelFormat::Rgb => frame.clone(),
        PixelFormat::Bgr => {
            let data = frame
                .data()
                .chunks_exact(3)
                .flat_map(|px| [px[2], px[1], px[0]])
                .collect();
            frame.with_data(data, PixelFormat::Rgb)
        }
        PixelFormat::Gray => {
            let data = frame.data().iter().flat_map(|&v| [v, v, v]).collect();
            frame.with_data(data, PixelFormat::Rgb)
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorMode {
    /// BGR to RGB channel swap.
    Rgb,
    /// Gray replicated to three channels.
    Gray,
}

pub struct ColorConvert {
    mode: ColorMode,
}

impl ColorConvert {
    pub fn new(mode: ColorMode) -> Self {
        Self { mode }
    }
}

impl FrameTransform for ColorConvert {
    fn name(&self) -> &str {
        match self.mode {
            ColorMode::Rgb => "color-rgb",
            ColorMode::Gray => "color-gray",
        }
    }

    fn apply(&mut self, frame: Frame) -> Result<Option<Frame>, ProcessingError> {
        let out = match self.mode {
            ColorMode::Rgb => swap_red_blue(&frame)?,
            ColorMode::Gray => gray_replicated(&frame),
        };
        Ok(Some(out))
    }
}
