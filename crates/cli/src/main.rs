use std::convert::Infallible;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};

use framelab_core::filtering::domain::frame_transform::FrameTransform;
use framelab_core::filtering::infrastructure::box_filter::BoxFilter;
use framelab_core::filtering::infrastructure::color::{ColorConvert, ColorMode};
use framelab_core::filtering::infrastructure::gaussian::GaussianFilter;
use framelab_core::filtering::infrastructure::median::MedianFilter;
use framelab_core::filtering::infrastructure::morphology::MorphologicalGradient;
use framelab_core::filtering::infrastructure::passthrough::Passthrough;
use framelab_core::filtering::infrastructure::threshold::ToZeroThreshold;
use framelab_core::motion::domain::motion_extractor::{MotionParams, Smoothing};
use framelab_core::motion::infrastructure::motion_extraction::MotionExtraction;
use framelab_core::pipeline::frame_processor::FrameProcessor;
use framelab_core::pipeline::pacer::Pacer;
use framelab_core::pipeline::pipeline_logger::{NullPipelineLogger, StdoutPipelineLogger};
use framelab_core::shared::constants::{
    DEFAULT_BOX_SIZE, DEFAULT_FRAME_DELAY_MS, DEFAULT_GAUSSIAN_KSIZE, DEFAULT_GAUSSIAN_SIGMA,
    DEFAULT_GRADIENT_SIZE, DEFAULT_MEDIAN_KSIZE, DEFAULT_MOTION_CUTOFF, DEFAULT_MOTION_DECAY,
    DEFAULT_SMOOTHED_MOTION_DECAY, DEFAULT_THRESHOLD_CUTOFF, IMAGE_EXTENSIONS, VIDEO_EXTENSIONS,
};
use framelab_core::shared::error::ProcessingError;
use framelab_core::shared::video_source::VideoSource;
use framelab_core::video::domain::frame_sink::FrameSink;
use framelab_core::video::domain::video_reader::VideoReader;
use framelab_core::video::infrastructure::ffmpeg_reader::FfmpegReader;
use framelab_core::video::infrastructure::ffmpeg_writer::FfmpegWriter;
use framelab_core::video::infrastructure::image_file_reader::ImageFileReader;
use framelab_core::video::infrastructure::image_file_writer::{ImageSequenceWriter, SnapshotWriter};
use framelab_core::video::infrastructure::log_sink::LogSink;

/// Apply one classic image operation to every frame of a video or image.
#[derive(Parser)]
#[command(name = "framelab")]
struct Cli {
    /// Input video or image file, or a camera index such as 0.
    #[arg(value_parser = parse_source)]
    input: VideoSource,

    /// Where displayed frames go: a video file, an image file (latest frame),
    /// or a directory of numbered PNGs. Frames are only logged when omitted.
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Minimum delay between displayed frames in milliseconds (0 = no pacing).
    /// Defaults to 50 without --output and 0 otherwise.
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Stop after reading this many frames. A camera otherwise runs until
    /// the process is killed.
    #[arg(long)]
    max_frames: Option<usize>,

    /// Suppress progress and the timing summary.
    #[arg(long, short)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show frames unchanged.
    Play,
    /// Convert colour: swap to RGB or replicate grayscale.
    Color {
        #[arg(long, value_enum, default_value = "gray")]
        mode: ColorArg,
    },
    /// Gray, then zero every pixel below the cutoff.
    Threshold {
        #[arg(long, default_value_t = DEFAULT_THRESHOLD_CUTOFF)]
        cutoff: u8,
    },
    /// Morphological gradient (dilation minus erosion).
    Gradient {
        #[arg(long, default_value_t = DEFAULT_GRADIENT_SIZE)]
        size: usize,
    },
    /// Median filter (odd kernel size).
    Median {
        #[arg(long, default_value_t = DEFAULT_MEDIAN_KSIZE)]
        ksize: usize,
    },
    /// Normalised box (moving average) filter.
    #[command(name = "box")]
    BoxBlur {
        #[arg(long, default_value_t = DEFAULT_BOX_SIZE.0)]
        width: usize,
        #[arg(long, default_value_t = DEFAULT_BOX_SIZE.1)]
        height: usize,
    },
    /// Gaussian filter (odd kernel sizes; sigma <= 0 derives it from the size).
    Gaussian {
        #[arg(long, default_value_t = DEFAULT_GAUSSIAN_KSIZE.0)]
        ksize_x: usize,
        #[arg(long, default_value_t = DEFAULT_GAUSSIAN_KSIZE.1)]
        ksize_y: usize,
        #[arg(long, default_value_t = DEFAULT_GAUSSIAN_SIGMA)]
        sigma: f64,
    },
    /// Outline moving objects against a running-average background.
    Motion {
        /// History weight in (0, 1). Defaults to 0.9, or 0.8 with --smooth-ksize.
        #[arg(long)]
        decay: Option<f32>,
        #[arg(long, default_value_t = DEFAULT_MOTION_CUTOFF)]
        cutoff: u8,
        /// Gaussian pre-smoothing kernel size (e.g. 7).
        #[arg(long)]
        smooth_ksize: Option<usize>,
        #[arg(long, default_value_t = DEFAULT_GAUSSIAN_SIGMA)]
        sigma: f64,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ColorArg {
    Rgb,
    Gray,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;
    let mut transform = build_transform(&cli.command)?;

    let delay_ms = cli.delay_ms.unwrap_or(if cli.output.is_none() {
        DEFAULT_FRAME_DELAY_MS
    } else {
        0
    });
    let mut processor = FrameProcessor::new(open_reader(&cli.input))
        .with_pacer(Pacer::from_millis(delay_ms))
        .with_max_frames(cli.max_frames);
    processor = if cli.quiet {
        processor.with_logger(Box::new(NullPipelineLogger))
    } else {
        processor.with_logger(Box::new(StdoutPipelineLogger::default()))
    };

    processor.open(&cli.input)?;
    let mut sink = open_sink(cli.output.as_deref());
    let report = processor.run(transform.as_mut(), sink.as_mut())?;

    log::info!(
        "{}: {} frames read, {} displayed ({:?})",
        transform.name(),
        report.frames_read,
        report.frames_displayed,
        report.stop_reason
    );
    if let Some(output) = &cli.output {
        log::info!("Output written to {}", output.display());
    }
    Ok(())
}

fn parse_source(input: &str) -> Result<VideoSource, Infallible> {
    Ok(VideoSource::parse(input))
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(path) = cli.input.path() {
        if !path.exists() {
            return Err(ProcessingError::source_unavailable(&cli.input, "file not found").into());
        }
    }
    if cli.max_frames == Some(0) {
        return Err(ProcessingError::invalid("--max-frames must be at least 1").into());
    }
    if let Some(output) = &cli.output {
        if cli.input.path() == Some(output.as_path()) {
            return Err(ProcessingError::invalid("--output must differ from the input").into());
        }
    }
    Ok(())
}

/// Builds the per-frame operation; every constructor rejects bad parameters.
fn build_transform(command: &Command) -> Result<Box<dyn FrameTransform>, ProcessingError> {
    Ok(match *command {
        Command::Play => Box::new(Passthrough),
        Command::Color { mode } => Box::new(ColorConvert::new(match mode {
            ColorArg::Rgb => ColorMode::Rgb,
            ColorArg::Gray => ColorMode::Gray,
        })),
        Command::Threshold { cutoff } => Box::new(ToZeroThreshold::new(cutoff)),
        Command::Gradient { size } => Box::new(MorphologicalGradient::new(size)?),
        Command::Median { ksize } => Box::new(MedianFilter::new(ksize)?),
        Command::BoxBlur { width, height } => Box::new(BoxFilter::new(width, height)?),
        Command::Gaussian {
            ksize_x,
            ksize_y,
            sigma,
        } => Box::new(GaussianFilter::new(ksize_x, ksize_y, sigma)?),
        Command::Motion {
            decay,
            cutoff,
            smooth_ksize,
            sigma,
        } => {
            let smoothing = smooth_ksize.map(|ksize| Smoothing { ksize, sigma });
            let default_decay = if smoothing.is_some() {
                DEFAULT_SMOOTHED_MOTION_DECAY
            } else {
                DEFAULT_MOTION_DECAY
            };
            Box::new(MotionExtraction::new(MotionParams {
                decay: decay.unwrap_or(default_decay),
                cutoff,
                smoothing,
            })?)
        }
    })
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn is_still_image(source: &VideoSource) -> bool {
    source
        .path()
        .is_some_and(|path| has_extension(path, IMAGE_EXTENSIONS))
}

fn open_reader(source: &VideoSource) -> Box<dyn VideoReader> {
    if is_still_image(source) {
        Box::new(ImageFileReader::new())
    } else {
        Box::new(FfmpegReader::new())
    }
}

fn open_sink(output: Option<&Path>) -> Box<dyn FrameSink> {
    match output {
        None => Box::new(LogSink::new()),
        Some(path) if has_extension(path, VIDEO_EXTENSIONS) => Box::new(FfmpegWriter::new(path)),
        Some(path) if has_extension(path, IMAGE_EXTENSIONS) => Box::new(SnapshotWriter::new(path)),
        Some(path) => Box::new(ImageSequenceWriter::new(path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults_follow_constants() {
        let cli = parse(&["framelab", "Vtest.avi", "median"]);
        assert!(matches!(cli.command, Command::Median { ksize: 5 }));
        assert!(cli.output.is_none());

        let cli = parse(&["framelab", "lena.jpg", "threshold"]);
        assert!(matches!(cli.command, Command::Threshold { cutoff: 67 }));
    }

    #[test]
    fn test_even_median_kernel_rejected_before_io() {
        let cli = parse(&["framelab", "Vtest.avi", "median", "--ksize", "4"]);
        assert!(matches!(
            build_transform(&cli.command),
            Err(ProcessingError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_motion_decay_follows_variant() {
        let plain = parse(&["framelab", "Vtest.avi", "motion"]);
        assert_eq!(build_transform(&plain.command).unwrap().name(), "motion");

        let smoothed = parse(&["framelab", "Vtest.avi", "motion", "--smooth-ksize", "7"]);
        assert_eq!(
            build_transform(&smoothed.command).unwrap().name(),
            "motion-smoothed"
        );

        let bad = parse(&["framelab", "Vtest.avi", "motion", "--decay", "1.5"]);
        assert!(build_transform(&bad.command).is_err());
    }

    #[test]
    fn test_box_subcommand_name() {
        let cli = parse(&["framelab", "Vtest.avi", "box", "--width", "3"]);
        assert!(matches!(
            cli.command,
            Command::BoxBlur {
                width: 3,
                height: 5
            }
        ));
    }

    #[test]
    fn test_missing_input_fails_validation() {
        let cli = parse(&["framelab", "/nonexistent/Vtest.avi", "play"]);
        assert!(validate(&cli).is_err());
    }

    #[test]
    fn test_numeric_input_selects_camera() {
        let cli = parse(&["framelab", "0", "motion"]);
        assert_eq!(cli.input, VideoSource::Camera(0));
        assert!(validate(&cli).is_ok());
        assert!(!is_still_image(&cli.input));

        let cli = parse(&["framelab", "Vtest.avi", "play"]);
        assert_eq!(cli.input, VideoSource::file("Vtest.avi"));
    }

    #[test]
    fn test_still_image_routing() {
        assert!(is_still_image(&VideoSource::file("lena.jpg")));
        assert!(!is_still_image(&VideoSource::file("Vtest.avi")));
        assert!(!is_still_image(&VideoSource::Camera(1)));
    }

    #[test]
    fn test_extension_routing() {
        assert!(has_extension(Path::new("a/lena.JPG"), IMAGE_EXTENSIONS));
        assert!(has_extension(Path::new("Vtest.avi"), VIDEO_EXTENSIONS));
        assert!(!has_extension(Path::new("frames"), VIDEO_EXTENSIONS));
        assert!(!has_extension(Path::new("frames"), IMAGE_EXTENSIONS));
    }
}
