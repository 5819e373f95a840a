use thiserror::Error;

/// A single frame could not be turned into a brightness sample.
///
/// Extraction treats this as the end of the stream: the samples gathered so
/// far are kept and analysis continues on the shorter signal.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("frame {index} is empty")]
    EmptyFrame { index: usize },
    #[error("frame {index} has {found} channels, expected {expected}")]
    ChannelMismatch {
        index: usize,
        expected: u8,
        found: u8,
    },
    #[error("frame {index} has {found} bytes, expected {expected} for its raster size")]
    ShortBuffer {
        index: usize,
        expected: usize,
        found: usize,
    },
    #[error("decoder failed at frame {index}: {message}")]
    Backend { index: usize, message: String },
}

/// Failures that abort one analysis run.
#[derive(Debug, Error)]
pub enum PulseError {
    #[error("need at least {required} brightness samples, got {samples}")]
    InsufficientData { samples: usize, required: usize },
    #[error("no peaks at or above the threshold {threshold:.3}")]
    NoPeaksDetected { threshold: f64 },
    #[error("strongest peak at index {index} (value {value:.3}) has no following peak")]
    NoSubsequentPeak { index: usize, value: f64 },
    #[error("inter-peak interval of {frames} frames is not positive")]
    DegenerateInterval { frames: isize },
    #[error("sampling rate must be positive, got {fs}")]
    InvalidSamplingRate { fs: f64 },
}

impl PulseError {
    /// Short advice for the person holding the camera.
    pub fn hint(&self) -> &'static str {
        match self {
            PulseError::InsufficientData { .. } => {
                "the recording is too short; record a few seconds with the finger on the lens"
            }
            PulseError::NoPeaksDetected { .. } => {
                "could not detect a clear heartbeat; try a lighter finger press or better lighting"
            }
            PulseError::NoSubsequentPeak { .. } => {
                "the strongest beat is at the end of the recording; try holding steadier for longer"
            }
            PulseError::DegenerateInterval { .. } => "internal error while pairing peaks",
            PulseError::InvalidSamplingRate { .. } => {
                "the video does not report a usable frame rate"
            }
        }
    }
}
