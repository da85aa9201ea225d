use std::fmt;
use std::path::{Path, PathBuf};

/// Where frames are read from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VideoSource {
    /// A video or still image on disk.
    File(PathBuf),
    /// A capture device, by index.
    Camera(u32),
}

impl VideoSource {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        VideoSource::File(path.into())
    }

    /// Interprets a command-line input: a plain decimal number selects a
    /// camera, anything else is a path.
    pub fn parse(input: &str) -> Self {
        let all_digits = !input.is_empty() && input.bytes().all(|b| b.is_ascii_digit());
        match input.parse::<u32>() {
            Ok(index) if all_digits => VideoSource::Camera(index),
            _ => VideoSource::File(PathBuf::from(input)),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            VideoSource::File(path) => Some(path),
            VideoSource::Camera(_) => None,
        }
    }

    pub fn is_camera(&self) -> bool {
        matches!(self, VideoSource::Camera(_))
    }
}

impl From<&Path> for VideoSource {
    fn from(path: &Path) -> Self {
        VideoSource::File(path.to_path_buf())
    }
}

impl From<PathBuf> for VideoSource {
    fn from(path: PathBuf) -> Self {
        VideoSource::File(path)
    }
}

impl fmt::Display for VideoSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VideoSource::File(path) => write!(f, "{}", path.display()),
            VideoSource::Camera(index) => write!(f, "camera {index}"),
        }
    }
}
