use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::filtering::domain::frame_transform::FrameTransform;
use crate::pipeline::pacer::Pacer;
use crate::pipeline::pipeline_logger::{NullPipelineLogger, PipelineLogger};
use crate::shared::error::ProcessingError;
use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::shared::video_source::VideoSource;
use crate::video::domain::frame_sink::FrameSink;
use crate::video::domain::video_reader::VideoReader;

#[derive(Clone, Debug, PartialEq)]
pub enum ProcessorState {
    Closed,
    Open(VideoMetadata),
    /// The source ran out of frames (or a frame failed to decode).
    Exhausted,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    EndOfStream,
    /// The stop flag was raised.
    Interrupted,
    FrameLimit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunReport {
    pub frames_read: usize,
    pub frames_displayed: usize,
    pub stop_reason: StopReason,
}

/// Pulls frames from a source one at a time and pushes each through a single
/// transform into a sink.
///
/// Owns the source handle for its whole lifetime and releases it whenever a
/// run ends, on error paths, and on drop.
pub struct FrameProcessor {
    reader: Box<dyn VideoReader>,
    state: ProcessorState,
    pacer: Pacer,
    max_frames: Option<usize>,
    stop: Arc<AtomicBool>,
    logger: Box<dyn PipelineLogger>,
}

fn elapsed_ms(since: Instant) -> f64 {
    since.elapsed().as_secs_f64() * 1000.0
}

impl FrameProcessor {
    pub fn new(reader: Box<dyn VideoReader>) -> Self {
        Self {
            reader,
            state: ProcessorState::Closed,
            pacer: Pacer::disabled(),
            max_frames: None,
            stop: Arc::new(AtomicBool::new(false)),
            logger: Box::new(NullPipelineLogger),
        }
    }

    pub fn with_pacer(mut self, pacer: Pacer) -> Self {
        self.pacer = pacer;
        self
    }

    pub fn with_max_frames(mut self, max_frames: Option<usize>) -> Self {
        self.max_frames = max_frames;
        self
    }

    pub fn with_logger(mut self, logger: Box<dyn PipelineLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Flag that ends a run before the next frame is read once set.
    ///
    /// This is the hook for an embedding application (a UI button, a signal
    /// handler) to interrupt a run from another thread. The `framelab` binary
    /// does not raise it; its only early stop is `--max-frames`.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub fn state(&self) -> &ProcessorState {
        &self.state
    }

    pub fn metadata(&self) -> Option<&VideoMetadata> {
        match &self.state {
            ProcessorState::Open(metadata) => Some(metadata),
            _ => None,
        }
    }

    /// Opens `source`, closing any source opened earlier.
    ///
    /// The reader reports what it opened; the processor only tracks state.
    pub fn open(&mut self, source: &VideoSource) -> Result<VideoMetadata, ProcessingError> {
        self.close();
        let metadata = self.reader.open(source)?;
        self.state = ProcessorState::Open(metadata.clone());
        Ok(metadata)
    }

    /// Reads the next frame, or `None` once the stream has ended.
    ///
    /// A frame that fails to decode ends the stream.
    pub fn next_frame(&mut self) -> Result<Option<Frame>, ProcessingError> {
        match self.state {
            ProcessorState::Open(_) => {}
            ProcessorState::Exhausted => return Ok(None),
            ProcessorState::Closed => {
                return Err(ProcessingError::invalid("no source is open"));
            }
        }

        match self.reader.read_frame() {
            Ok(Some(frame)) => Ok(Some(frame)),
            Ok(None) => {
                log::debug!("End of stream");
                self.state = ProcessorState::Exhausted;
                Ok(None)
            }
            Err(ProcessingError::DecodeFailure { index, reason }) => {
                log::warn!("Frame {index} could not be decoded ({reason}); stopping");
                self.state = ProcessorState::Exhausted;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Runs read, transform, display until the stream ends, the stop flag is
    /// raised, or the frame limit is reached.
    ///
    /// The sink and the source are closed before returning, whatever the outcome.
    pub fn run(
        &mut self,
        transform: &mut dyn FrameTransform,
        sink: &mut dyn FrameSink,
    ) -> Result<RunReport, ProcessingError> {
        let Some(metadata) = self.metadata().cloned() else {
            return Err(ProcessingError::invalid("open a source before running"));
        };

        if let Err(e) = sink.open(&metadata) {
            self.close();
            return Err(e);
        }

        self.logger
            .info(&format!("Running '{}' transform", transform.name()));
        let result = self.drive(&metadata, transform, sink);
        let closed = sink.close();
        self.close();
        self.logger.summary();

        match (result, closed) {
            (Ok(report), Ok(())) => {
                log::info!(
                    "Stopped ({:?}) after {} frames read, {} displayed",
                    report.stop_reason,
                    report.frames_read,
                    report.frames_displayed
                );
                Ok(report)
            }
            (Ok(_), Err(e)) => Err(e),
            (Err(e), closed) => {
                if let Err(close_err) = closed {
                    log::warn!("Sink failed to close after error: {close_err}");
                }
                Err(e)
            }
        }
    }

    fn drive(
        &mut self,
        metadata: &VideoMetadata,
        transform: &mut dyn FrameTransform,
        sink: &mut dyn FrameSink,
    ) -> Result<RunReport, ProcessingError> {
        let mut frames_read = 0;
        let mut frames_displayed = 0;

        let stop_reason = loop {
            if self.stop.load(Ordering::Relaxed) {
                break StopReason::Interrupted;
            }
            if self.max_frames.is_some_and(|max| frames_read >= max) {
                break StopReason::FrameLimit;
            }

            let started = Instant::now();
            let Some(frame) = self.next_frame()? else {
                break StopReason::EndOfStream;
            };
            self.logger.timing("read", elapsed_ms(started));
            frames_read += 1;
            self.logger.progress(frames_read, metadata.total_frames);

            let started = Instant::now();
            let output = transform.apply(frame)?;
            self.logger.timing("transform", elapsed_ms(started));

            let Some(output) = output else {
                continue;
            };
            for (name, value) in transform.metrics() {
                self.logger.metric(name, value);
            }

            self.pacer.wait();
            let started = Instant::now();
            sink.display(&output)?;
            self.logger.timing("display", elapsed_ms(started));
            frames_displayed += 1;
        };

        Ok(RunReport {
            frames_read,
            frames_displayed,
            stop_reason,
        })
    }

    /// Releases the source. Safe to call in any state.
    pub fn close(&mut self) {
        if self.state != ProcessorState::Closed {
            self.reader.close();
            self.state = ProcessorState::Closed;
        }
    }
}

impl Drop for FrameProcessor {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    use crate::filtering::infrastructure::passthrough::Passthrough;
    use crate::motion::domain::motion_extractor::MotionParams;
    use crate::motion::infrastructure::motion_extraction::MotionExtraction;
    use crate::shared::frame::PixelFormat;

    type Script = Vec<Result<Option<Frame>, ProcessingError>>;

    struct ScriptedReader {
        script: Script,
        pending: VecDeque<Result<Option<Frame>, ProcessingError>>,
        closes: Arc<AtomicUsize>,
    }

    impl ScriptedReader {
        fn new(script: Script) -> (Self, Arc<AtomicUsize>) {
            let closes = Arc::new(AtomicUsize::new(0));
            let reader = Self {
                script,
                pending: VecDeque::new(),
                closes: Arc::clone(&closes),
            };
            (reader, closes)
        }
    }

    impl VideoReader for ScriptedReader {
        fn open(&mut self, source: &VideoSource) -> Result<VideoMetadata, ProcessingError> {
            if source == &VideoSource::file("missing.avi") {
                return Err(ProcessingError::source_unavailable(source, "not found"));
            }
            self.pending = std::mem::take(&mut self.script).into();
            Ok(VideoMetadata {
                width: 4,
                height: 2,
                fps: 10.0,
                total_frames: self.pending.len(),
                codec: "test".to_string(),
                source_path: source.path().map(|p| p.to_path_buf()),
            })
        }

        fn read_frame(&mut self) -> Result<Option<Frame>, ProcessingError> {
            self.pending.pop_front().unwrap_or(Ok(None))
        }

        fn close(&mut self) {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        opened: bool,
        closed: bool,
        displayed: Vec<usize>,
        fail_on: Option<usize>,
    }

    impl FrameSink for RecordingSink {
        fn open(&mut self, _metadata: &VideoMetadata) -> Result<(), ProcessingError> {
            self.opened = true;
            Ok(())
        }

        fn display(&mut self, frame: &Frame) -> Result<(), ProcessingError> {
            if self.fail_on == Some(frame.index()) {
                return Err(ProcessingError::sink("window closed"));
            }
            self.displayed.push(frame.index());
            Ok(())
        }

        fn close(&mut self) -> Result<(), ProcessingError> {
            self.closed = true;
            Ok(())
        }
    }

    struct FailingTransform;

    impl FrameTransform for FailingTransform {
        fn name(&self) -> &str {
            "failing"
        }

        fn apply(&mut self, _frame: Frame) -> Result<Option<Frame>, ProcessingError> {
            Err(ProcessingError::invalid("median kernel size must be odd, got 4"))
        }
    }

    /// Collects the messages sent through [`PipelineLogger::info`].
    #[derive(Clone, Default)]
    struct RecordingLogger {
        messages: Arc<Mutex<Vec<String>>>,
    }

    impl PipelineLogger for RecordingLogger {
        fn progress(&mut self, _current: usize, _total: usize) {}
        fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
        fn metric(&mut self, _name: &str, _value: f64) {}
        fn info(&mut self, message: &str) {
            self.messages.lock().unwrap().push(message.to_string());
        }
    }

    fn vtest() -> VideoSource {
        VideoSource::file("Vtest.avi")
    }

    fn frame(index: usize, value: u8) -> Frame {
        Frame::new(vec![value; 24], 4, 2, PixelFormat::Bgr, index)
    }

    fn frames(n: usize) -> Script {
        (0..n).map(|i| Ok(Some(frame(i, 10 * i as u8)))).collect()
    }

    fn processor(script: Script) -> (FrameProcessor, Arc<AtomicUsize>) {
        let (reader, closes) = ScriptedReader::new(script);
        (FrameProcessor::new(Box::new(reader)), closes)
    }

    #[test]
    fn test_runs_to_end_of_stream() {
        let (mut processor, closes) = processor(frames(3));
        processor.open(&vtest()).unwrap();
        let mut sink = RecordingSink::default();

        let report = processor.run(&mut Passthrough, &mut sink).unwrap();

        assert_eq!(
            report,
            RunReport {
                frames_read: 3,
                frames_displayed: 3,
                stop_reason: StopReason::EndOfStream,
            }
        );
        assert_eq!(sink.displayed, vec![0, 1, 2]);
        assert!(sink.opened && sink.closed);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
        assert_eq!(processor.state(), &ProcessorState::Closed);
    }

    #[test]
    fn test_decode_failure_ends_stream() {
        let mut script = frames(1);
        script.push(Err(ProcessingError::DecodeFailure {
            index: 1,
            reason: "corrupt packet".to_string(),
        }));
        script.push(Ok(Some(frame(2, 0))));
        let (mut processor, _) = processor(script);
        processor.open(&vtest()).unwrap();

        let report = processor
            .run(&mut Passthrough, &mut RecordingSink::default())
            .unwrap();

        assert_eq!(report.frames_read, 1);
        assert_eq!(report.stop_reason, StopReason::EndOfStream);
    }

    #[test]
    fn test_next_frame_after_exhaustion_stays_none() {
        let (mut processor, _) = processor(frames(1));
        processor.open(&vtest()).unwrap();
        assert!(processor.next_frame().unwrap().is_some());
        assert!(processor.next_frame().unwrap().is_none());
        assert_eq!(processor.state(), &ProcessorState::Exhausted);
        assert!(processor.next_frame().unwrap().is_none());
    }

    #[test]
    fn test_unavailable_source_aborts() {
        let (mut processor, _) = processor(frames(1));
        let err = processor.open(&VideoSource::file("missing.avi")).unwrap_err();
        assert!(matches!(err, ProcessingError::SourceUnavailable { .. }));
        assert_eq!(processor.state(), &ProcessorState::Closed);
        assert!(processor.next_frame().is_err());
    }

    #[test]
    fn test_run_requires_open_source() {
        let (mut processor, _) = processor(frames(1));
        let mut sink = RecordingSink::default();
        assert!(matches!(
            processor.run(&mut Passthrough, &mut sink),
            Err(ProcessingError::InvalidParameter(_))
        ));
        assert!(!sink.opened);
    }

    #[test]
    fn test_transform_error_still_releases_resources() {
        let (mut processor, closes) = processor(frames(3));
        processor.open(&vtest()).unwrap();
        let mut sink = RecordingSink::default();

        let result = processor.run(&mut FailingTransform, &mut sink);

        assert!(matches!(result, Err(ProcessingError::InvalidParameter(_))));
        assert!(sink.closed);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
        assert_eq!(processor.state(), &ProcessorState::Closed);
    }

    #[test]
    fn test_sink_failure_is_fatal() {
        let (mut processor, closes) = processor(frames(3));
        processor.open(&vtest()).unwrap();
        let mut sink = RecordingSink {
            fail_on: Some(1),
            ..Default::default()
        };

        let result = processor.run(&mut Passthrough, &mut sink);

        assert!(matches!(result, Err(ProcessingError::SinkFailure(_))));
        assert_eq!(sink.displayed, vec![0]);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_stop_flag_interrupts_run() {
        let (mut processor, closes) = processor(frames(3));
        processor.open(&vtest()).unwrap();
        processor.stop_handle().store(true, Ordering::SeqCst);

        let report = processor
            .run(&mut Passthrough, &mut RecordingSink::default())
            .unwrap();

        assert_eq!(report.stop_reason, StopReason::Interrupted);
        assert_eq!(report.frames_read, 0);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_frame_limit() {
        let (processor, _) = processor(frames(5));
        let mut processor = processor.with_max_frames(Some(2));
        processor.open(&vtest()).unwrap();

        let report = processor
            .run(&mut Passthrough, &mut RecordingSink::default())
            .unwrap();

        assert_eq!(report.frames_read, 2);
        assert_eq!(report.stop_reason, StopReason::FrameLimit);
    }

    #[test]
    fn test_seeding_frame_is_not_displayed() {
        let (mut processor, _) = processor(frames(4));
        processor.open(&vtest()).unwrap();
        let mut motion = MotionExtraction::new(MotionParams::plain()).unwrap();
        let mut sink = RecordingSink::default();

        let report = processor.run(&mut motion, &mut sink).unwrap();

        assert_eq!(report.frames_read, 4);
        assert_eq!(report.frames_displayed, 3);
        assert_eq!(sink.displayed, vec![1, 2, 3]);
    }

    #[test]
    fn test_reopen_closes_previous_source() {
        let (mut processor, closes) = processor(frames(2));
        processor.open(&vtest()).unwrap();
        processor.open(&vtest()).unwrap();
        assert_eq!(closes.load(Ordering::SeqCst), 1);
        assert!(processor.metadata().is_some());
    }

    #[test]
    fn test_drop_releases_source() {
        let (mut processor, closes) = processor(frames(2));
        processor.open(&vtest()).unwrap();
        drop(processor);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_close_is_idempotent() {
        let (mut processor, closes) = processor(frames(2));
        processor.open(&vtest()).unwrap();
        processor.close();
        processor.close();
        drop(processor);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_open_leaves_source_reporting_to_the_reader() {
        let (processor, _) = processor(frames(2));
        let logger = RecordingLogger::default();
        let mut processor = processor.with_logger(Box::new(logger.clone()));
        processor.open(&vtest()).unwrap();
        processor
            .run(&mut Passthrough, &mut RecordingSink::default())
            .unwrap();

        let messages = logger.messages.lock().unwrap();
        assert_eq!(*messages, vec!["Running 'play' transform".to_string()]);
    }

    #[test]
    fn test_camera_source_reaches_reader() {
        let (mut processor, _) = processor(frames(1));
        let metadata = processor.open(&VideoSource::Camera(0)).unwrap();
        assert!(metadata.source_path.is_none());
        assert!(processor.next_frame().unwrap().is_some());
    }
}
