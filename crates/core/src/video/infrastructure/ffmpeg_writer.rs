use std::path::{Path, PathBuf};

use crate::filtering::infrastructure::color;
use crate::shared::error::ProcessingError;
use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::frame_sink::FrameSink;

const FALLBACK_FPS: i32 = 30;

/// Encodes displayed frames to an MPEG-4 video file via ffmpeg-next.
pub struct FfmpegWriter {
    output_path: PathBuf,
    encoding: Option<EncodeState>,
}

struct EncodeState {
    octx: ffmpeg_next::format::context::Output,
    encoder: ffmpeg_next::codec::encoder::video::Encoder,
    scaler: ffmpeg_next::software::scaling::Context,
    width: u32,
    height: u32,
    fps: i32,
    frame_count: usize,
}

// Safety: FfmpegWriter is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegWriter {}

impl FfmpegWriter {
    pub fn new(output_path: impl Into<PathBuf>) -> Self {
        Self {
            output_path: output_path.into(),
            encoding: None,
        }
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }
}

/// Rounds the source rate to a whole number; still images and unknown rates
/// fall back to 30 fps.
fn encoder_fps(fps: f64) -> i32 {
    let fps_i = fps.round() as i32;
    if fps_i <= 0 {
        FALLBACK_FPS
    } else {
        fps_i
    }
}

impl FrameSink for FfmpegWriter {
    fn open(&mut self, metadata: &VideoMetadata) -> Result<(), ProcessingError> {
        ffmpeg_next::init().map_err(ProcessingError::sink)?;

        let mut octx =
            ffmpeg_next::format::output(&self.output_path).map_err(ProcessingError::sink)?;

        let global_header = octx
            .format()
            .flags()
            .contains(ffmpeg_next::format::Flags::GLOBAL_HEADER);

        let codec = ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::MPEG4)
            .ok_or_else(|| ProcessingError::sink("MPEG4 encoder not found"))?;

        let mut ost = octx.add_stream(Some(codec)).map_err(ProcessingError::sink)?;

        let mut encoder_ctx = ffmpeg_next::codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()
            .map_err(ProcessingError::sink)?;

        let fps = encoder_fps(metadata.fps);
        encoder_ctx.set_width(metadata.width);
        encoder_ctx.set_height(metadata.height);
        encoder_ctx.set_format(ffmpeg_next::format::Pixel::YUV420P);
        encoder_ctx.set_time_base(ffmpeg_next::Rational(1, fps));
        encoder_ctx.set_frame_rate(Some(ffmpeg_next::Rational(fps, 1)));

        if global_header {
            encoder_ctx.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
        }

        let encoder = encoder_ctx
            .open_with(ffmpeg_next::Dictionary::new())
            .map_err(ProcessingError::sink)?;
        ost.set_parameters(&encoder);

        octx.write_header().map_err(ProcessingError::sink)?;

        let scaler = ffmpeg_next::software::scaling::Context::get(
            ffmpeg_next::format::Pixel::RGB24,
            metadata.width,
            metadata.height,
            ffmpeg_next::format::Pixel::YUV420P,
            metadata.width,
            metadata.height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )
        .map_err(ProcessingError::sink)?;

        log::info!(
            "Writing {}x{} @ {fps} fps to {}",
            metadata.width,
            metadata.height,
            self.output_path.display()
        );

        self.encoding = Some(EncodeState {
            octx,
            encoder,
            scaler,
            width: metadata.width,
            height: metadata.height,
            fps,
            frame_count: 0,
        });
        Ok(())
    }

    fn display(&mut self, frame: &Frame) -> Result<(), ProcessingError> {
        let state = self
            .encoding
            .as_mut()
            .ok_or_else(|| ProcessingError::sink("FfmpegWriter: not opened"))?;

        if frame.width() != state.width || frame.height() != state.height {
            return Err(ProcessingError::sink(format!(
                "frame is {}x{} but the video is {}x{}",
                frame.width(),
                frame.height(),
                state.width,
                state.height
            )));
        }

        let rgb = color::to_rgb(frame);
        let mut rgb_frame = ffmpeg_next::util::frame::video::Video::new(
            ffmpeg_next::format::Pixel::RGB24,
            state.width,
            state.height,
        );

        let row_bytes = state.width as usize * 3;
        let stride = rgb_frame.stride(0);
        let data = rgb_frame.data_mut(0);
        for (row, src) in rgb.data().chunks_exact(row_bytes).enumerate() {
            let dst_start = row * stride;
            data[dst_start..dst_start + row_bytes].copy_from_slice(src);
        }

        let mut yuv_frame = ffmpeg_next::util::frame::video::Video::empty();
        state
            .scaler
            .run(&rgb_frame, &mut yuv_frame)
            .map_err(ProcessingError::sink)?;
        yuv_frame.set_pts(Some(state.frame_count as i64));

        state
            .encoder
            .send_frame(&yuv_frame)
            .map_err(ProcessingError::sink)?;
        state.write_packets()?;

        state.frame_count += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), ProcessingError> {
        let Some(mut state) = self.encoding.take() else {
            return Ok(());
        };

        state.encoder.send_eof().map_err(ProcessingError::sink)?;
        state.write_packets()?;
        state.octx.write_trailer().map_err(ProcessingError::sink)?;

        log::info!(
            "Wrote {} frames to {}",
            state.frame_count,
            self.output_path.display()
        );
        Ok(())
    }
}

impl EncodeState {
    fn write_packets(&mut self) -> Result<(), ProcessingError> {
        let ost_time_base = self
            .octx
            .stream(0)
            .ok_or_else(|| ProcessingError::sink("output stream missing"))?
            .time_base();

        let mut encoded = ffmpeg_next::Packet::empty();
        while self.encoder.receive_packet(&mut encoded).is_ok() {
            encoded.set_stream(0);
            encoded.rescale_ts(ffmpeg_next::Rational(1, self.fps), ost_time_base);
            encoded
                .write_interleaved(&mut self.octx)
                .map_err(ProcessingError::sink)?;
        }
        Ok(())
    }
}
