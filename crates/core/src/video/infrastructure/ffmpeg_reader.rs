use crate::shared::error::ProcessingError;
use crate::shared::frame::{Frame, PixelFormat};
use crate::shared::video_metadata::VideoMetadata;
use crate::shared::video_source::VideoSource;
use crate::video::domain::video_reader::VideoReader;

/// Decodes video frames via ffmpeg-next (libavformat + libavcodec).
///
/// Files are demuxed directly; cameras go through the platform capture
/// device of libavdevice. Each decoded frame is converted to BGR24 and
/// wrapped in a [`Frame`].
/// Decoding is lazy: one frame is pulled per [`VideoReader::read_frame`] call.
pub struct FfmpegReader {
    state: Option<DecodeState>,
    frame_index: usize,
}

struct DecodeState {
    ictx: ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: ffmpeg_next::software::scaling::Context,
    video_stream_index: usize,
    width: u32,
    height: u32,
    flushing: bool,
    done: bool,
}

// Safety: FfmpegReader is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegReader {}

impl FfmpegReader {
    pub fn new() -> Self {
        Self {
            state: None,
            frame_index: 0,
        }
    }
}

impl Default for FfmpegReader {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoReader for FfmpegReader {
    fn open(&mut self, source: &VideoSource) -> Result<VideoMetadata, ProcessingError> {
        self.close();
        let unavailable = |reason: &dyn std::fmt::Display| {
            ProcessingError::source_unavailable(source, reason)
        };

        ffmpeg_next::init().map_err(|e| unavailable(&e))?;
        let ictx = open_input(source).map_err(|reason| unavailable(&reason))?;

        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or_else(|| unavailable(&"no video stream found"))?;

        let video_stream_index = stream.index();
        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())
            .map_err(|e| unavailable(&e))?;
        let decoder = codec_ctx.decoder().video().map_err(|e| unavailable(&e))?;

        let rate = stream.rate();
        let fps = if rate.denominator() != 0 {
            rate.numerator() as f64 / rate.denominator() as f64
        } else {
            0.0
        };

        let width = decoder.width();
        let height = decoder.height();
        let metadata = VideoMetadata {
            width,
            height,
            fps,
            total_frames: stream.frames().max(0) as usize,
            codec: decoder
                .codec()
                .map(|c| c.name().to_string())
                .unwrap_or_default(),
            source_path: source.path().map(|p| p.to_path_buf()),
        };

        let scaler = ffmpeg_next::software::scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg_next::format::Pixel::BGR24,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )
        .map_err(|e| unavailable(&e))?;

        log::info!(
            "Opened {} ({}x{} @ {:.2} fps, {} frames, codec {})",
            source,
            metadata.width,
            metadata.height,
            metadata.fps,
            metadata.total_frames,
            metadata.codec
        );

        self.state = Some(DecodeState {
            ictx,
            decoder,
            scaler,
            video_stream_index,
            width,
            height,
            flushing: false,
            done: false,
        });
        self.frame_index = 0;

        Ok(metadata)
    }

    fn read_frame(&mut self) -> Result<Option<Frame>, ProcessingError> {
        let index = self.frame_index;
        let state = self
            .state
            .as_mut()
            .ok_or_else(|| ProcessingError::invalid("FfmpegReader: not opened"))?;

        let frame = state.next_frame(index)?;
        if frame.is_some() {
            self.frame_index += 1;
        }
        Ok(frame)
    }

    fn close(&mut self) {
        if self.state.take().is_some() {
            log::debug!("Closed video reader after {} frames", self.frame_index);
        }
    }
}

/// ffmpeg input device format and device URL for camera `index`, or `None`
/// where no capture backend is wired up.
pub fn capture_device(index: u32) -> Option<(&'static str, String)> {
    if cfg!(target_os = "linux") {
        Some(("v4l2", format!("/dev/video{index}")))
    } else if cfg!(target_os = "macos") {
        Some(("avfoundation", index.to_string()))
    } else {
        None
    }
}

fn open_input(source: &VideoSource) -> Result<ffmpeg_next::format::context::Input, String> {
    let index = match source {
        VideoSource::File(path) => {
            return ffmpeg_next::format::input(path).map_err(|e| e.to_string());
        }
        VideoSource::Camera(index) => *index,
    };

    let (format_name, device) = capture_device(index)
        .ok_or_else(|| "camera capture is not supported on this platform".to_string())?;
    ffmpeg_next::device::register_all();
    let format = find_capture_format(format_name)
        .ok_or_else(|| format!("ffmpeg has no {format_name} capture device"))?;

    match ffmpeg_next::format::open_with(&device, &format, ffmpeg_next::Dictionary::new()) {
        Ok(ffmpeg_next::format::Context::Input(input)) => Ok(input),
        Ok(ffmpeg_next::format::Context::Output(_)) => {
            Err(format!("{device} opened as an output"))
        }
        Err(e) => Err(format!("{device}: {e}")),
    }
}

fn find_capture_format(name: &str) -> Option<ffmpeg_next::Format> {
    ffmpeg_next::device::input::video()
        // With no devices registered the iterator yields a single null format.
        .take_while(|format| match format {
            ffmpeg_next::Format::Input(input) => unsafe { !input.as_ptr().is_null() },
            ffmpeg_next::Format::Output(_) => false,
        })
        .find(|format| format.name() == name)
}

impl DecodeState {
    fn next_frame(&mut self, index: usize) -> Result<Option<Frame>, ProcessingError> {
        if self.done {
            return Ok(None);
        }

        loop {
            if let Some(frame) = self.try_receive(index)? {
                return Ok(Some(frame));
            }

            if self.flushing {
                self.done = true;
                return Ok(None);
            }

            let Some((stream, packet)) = self.ictx.packets().next() else {
                let _ = self.decoder.send_eof();
                self.flushing = true;
                continue;
            };

            if stream.index() != self.video_stream_index {
                continue;
            }

            self.decoder
                .send_packet(&packet)
                .map_err(|e| ProcessingError::DecodeFailure {
                    index,
                    reason: e.to_string(),
                })?;
        }
    }

    fn try_receive(&mut self, index: usize) -> Result<Option<Frame>, ProcessingError> {
        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        if self.decoder.receive_frame(&mut decoded).is_err() {
            return Ok(None);
        }

        let mut bgr_frame = ffmpeg_next::util::frame::video::Video::empty();
        self.scaler
            .run(&decoded, &mut bgr_frame)
            .map_err(|e| ProcessingError::DecodeFailure {
                index,
                reason: e.to_string(),
            })?;

        let pixels = extract_packed_pixels(&bgr_frame, self.width, self.height);
        Ok(Some(Frame::new(
            pixels,
            self.width,
            self.height,
            PixelFormat::Bgr,
            index,
        )))
    }
}

/// Copies pixel data from an ffmpeg frame into a contiguous 3-byte-per-pixel buffer.
///
/// ffmpeg frames may have padding bytes at the end of each row (stride > width*3).
/// This function strips that padding to produce a tightly-packed pixel buffer.
fn extract_packed_pixels(
    frame: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let stride = frame.stride(0);
    let data = frame.data(0);
    let w = width as usize;
    let h = height as usize;

    let mut pixels = Vec::with_capacity(w * h * 3);
    for row in 0..h {
        let row_start = row * stride;
        pixels.extend_from_slice(&data[row_start..row_start + w * 3]);
    }
    pixels
}
