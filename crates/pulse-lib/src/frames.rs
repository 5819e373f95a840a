use crate::{error::DecodeError, signal::TimeSeries};
use std::collections::VecDeque;

/// One decoded raster, interleaved channels, row-major, no padding.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub channels: u8,
    pub data: Vec<u8>,
}

impl Frame {
    pub fn new(width: u32, height: u32, channels: u8, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            channels,
            data,
        }
    }

    /// Solid-colour frame, handy for tests and synthetic recordings.
    pub fn filled(width: u32, height: u32, pixel: &[u8]) -> Self {
        let count = width as usize * height as usize;
        let mut data = Vec::with_capacity(count * pixel.len());
        for _ in 0..count {
            data.extend_from_slice(pixel);
        }
        Self::new(width, height, pixel.len() as u8, data)
    }

    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * self.channels as usize
    }

    /// Mean over every channel of every pixel.
    pub fn mean_intensity(&self) -> f64 {
        if self.data.is_empty() {
            return 0.0;
        }
        let sum: u64 = self.data.iter().map(|&v| v as u64).sum();
        sum as f64 / self.data.len() as f64
    }
}

/// Anything that yields decoded frames at a fixed rate.
///
/// The sequence is finite and cannot be restarted once consumed. An error
/// from `next_frame` ends extraction; the frames already read still count.
pub trait FrameSource {
    /// Frames per second.
    fn sampling_rate(&self) -> f64;
    /// Frame count reported by the container; may overstate what decodes.
    fn frame_count_hint(&self) -> usize;
    fn next_frame(&mut self) -> Result<Option<Frame>, DecodeError>;
}

/// Frames already held in memory.
pub struct MemoryFrameSource {
    fps: f64,
    total: usize,
    frames: VecDeque<Result<Frame, DecodeError>>,
}

impl MemoryFrameSource {
    pub fn new(fps: f64, frames: Vec<Frame>) -> Self {
        Self::with_results(fps, frames.into_iter().map(Ok).collect())
    }

    /// Source that replays decode failures as well, in order.
    pub fn with_results(fps: f64, frames: Vec<Result<Frame, DecodeError>>) -> Self {
        Self {
            fps,
            total: frames.len(),
            frames: frames.into(),
        }
    }
}

impl FrameSource for MemoryFrameSource {
    fn sampling_rate(&self) -> f64 {
        self.fps
    }

    fn frame_count_hint(&self) -> usize {
        self.total
    }

    fn next_frame(&mut self) -> Result<Option<Frame>, DecodeError> {
        self.frames.pop_front().transpose()
    }
}

/// Frames a decoder has produced but not yet handed out.
///
/// Codecs emit frames in batches. When a batch breaks partway, the frames
/// already queued come out first and the error after them, once.
#[derive(Debug, Default)]
pub struct FrameQueue {
    frames: VecDeque<Frame>,
    failure: Option<DecodeError>,
}

impl FrameQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, frame: Frame) {
        self.frames.push_back(frame);
    }

    /// Record the error that ended decoding; only the first one is kept.
    pub fn fail(&mut self, err: DecodeError) {
        self.failure.get_or_insert(err);
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty() && self.failure.is_none()
    }

    pub fn pop(&mut self) -> Option<Result<Frame, DecodeError>> {
        match self.frames.pop_front() {
            Some(frame) => Some(Ok(frame)),
            None => self.failure.take().map(Err),
        }
    }
}

/// Extraction progress, reported after every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub decoded: usize,
    pub total_hint: usize,
}

impl Progress {
    /// Fraction done in [0, 1]; the hint may be wrong, so it is clamped.
    pub fn fraction(&self) -> f64 {
        if self.total_hint == 0 {
            return 0.0;
        }
        (self.decoded as f64 / self.total_hint as f64).min(1.0)
    }
}

fn check_frame(frame: &Frame, index: usize, channels: Option<u8>) -> Result<(), DecodeError> {
    if frame.data.is_empty() || frame.channels == 0 {
        return Err(DecodeError::EmptyFrame { index });
    }
    if let Some(expected) = channels {
        if frame.channels != expected {
            return Err(DecodeError::ChannelMismatch {
                index,
                expected,
                found: frame.channels,
            });
        }
    }
    if frame.data.len() < frame.expected_len() {
        return Err(DecodeError::ShortBuffer {
            index,
            expected: frame.expected_len(),
            found: frame.data.len(),
        });
    }
    Ok(())
}

/// Reduce every frame of `source` to its mean intensity.
///
/// Stops at the first frame that fails to decode or does not match the
/// channel depth of the first frame; this is logged, not returned.
pub fn extract_brightness<S, F>(source: &mut S, mut progress: F) -> TimeSeries
where
    S: FrameSource + ?Sized,
    F: FnMut(Progress),
{
    let fs = source.sampling_rate();
    let total_hint = source.frame_count_hint();
    let mut data = Vec::with_capacity(total_hint);
    let mut channels = None;
    loop {
        let index = data.len();
        let frame = match source.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => break,
            Err(err) => {
                log::warn!("stopping extraction after {} frame(s): {}", index, err);
                break;
            }
        };
        if let Err(err) = check_frame(&frame, index, channels) {
            log::warn!("stopping extraction after {} frame(s): {}", index, err);
            break;
        }
        channels.get_or_insert(frame.channels);
        data.push(frame.mean_intensity());
        progress(Progress {
            decoded: data.len(),
            total_hint,
        });
    }
    if data.len() < total_hint {
        log::info!("decoded {} of {} reported frames", data.len(), total_hint);
    }
    TimeSeries { fs, data }
}
