use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Container extensions accepted at the ingestion boundary.
pub const SUPPORTED_CONTAINERS: &[&str] = &["mp4", "mov", "avi"];

pub fn is_supported_container(ext: &str) -> bool {
    SUPPORTED_CONTAINERS
        .iter()
        .any(|known| known.eq_ignore_ascii_case(ext))
}

/// Reject paths whose extension is not on the allow-list.
pub fn ensure_supported_container(path: &Path) -> Result<()> {
    match path.extension().and_then(|s| s.to_str()) {
        Some(ext) if is_supported_container(ext) => Ok(()),
        Some(ext) => anyhow::bail!(
            "unsupported video container .{} (expected one of {})",
            ext,
            SUPPORTED_CONTAINERS.join(", ")
        ),
        None => anyhow::bail!(
            "{} has no extension (expected one of {})",
            path.display(),
            SUPPORTED_CONTAINERS.join(", ")
        ),
    }
}

/// What the container says about itself.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    pub fps: f64,
    pub frame_count: usize,
    pub duration_s: f64,
    pub width: u32,
    pub height: u32,
}

impl VideoInfo {
    pub fn new(fps: f64, frame_count: usize, width: u32, height: u32) -> Self {
        let duration_s = if fps > 0.0 {
            frame_count as f64 / fps
        } else {
            0.0
        };
        Self {
            fps,
            frame_count,
            duration_s,
            width,
            height,
        }
    }
}

#[cfg(feature = "video")]
pub use ffmpeg_source::FfmpegFrameSource;

#[cfg(feature = "video")]
mod ffmpeg_source {
    use super::{ensure_supported_container, VideoInfo};
    use crate::{
        error::DecodeError,
        frames::{Frame, FrameQueue, FrameSource},
    };
    use anyhow::{Context, Result};
    use ffmpeg_next as ffmpeg;
    use ffmpeg::{
        codec, decoder,
        format::{self, Pixel},
        media,
        software::scaling,
        util::frame::video::Video,
        Packet,
    };
    use std::path::Path;

    /// Decodes the best video stream of a container into RGB frames.
    ///
    /// The demuxer and decoder are released when the source is dropped, also
    /// when extraction stops before the end of the stream.
    pub struct FfmpegFrameSource {
        input: format::context::Input,
        decoder: decoder::Video,
        scaler: Option<scaling::Context>,
        stream_index: usize,
        info: VideoInfo,
        queue: FrameQueue,
        decoded: usize,
        flushed: bool,
    }

    impl FfmpegFrameSource {
        pub fn open(path: &Path) -> Result<Self> {
            ensure_supported_container(path)?;
            ffmpeg::init().context("initialising ffmpeg")?;
            let input = format::input(&path)
                .with_context(|| format!("failed to open video {}", path.display()))?;
            let stream = input
                .streams()
                .best(media::Type::Video)
                .context("no video stream found")?;
            let stream_index = stream.index();
            let fps = f64::from(stream.avg_frame_rate());
            let reported = stream.frames().max(0) as usize;
            let decoder = codec::context::Context::from_parameters(stream.parameters())
                .context("creating codec context")?
                .decoder()
                .video()
                .context("creating video decoder")?;
            let frame_count = if reported > 0 {
                reported
            } else if fps > 0.0 && input.duration() > 0 {
                // container duration is in AV_TIME_BASE (microseconds)
                (input.duration() as f64 / 1_000_000.0 * fps).round() as usize
            } else {
                0
            };
            let info = VideoInfo::new(fps, frame_count, decoder.width(), decoder.height());
            log::debug!("opened {}: {:?}", path.display(), info);
            Ok(Self {
                input,
                decoder,
                scaler: None,
                stream_index,
                info,
                queue: FrameQueue::new(),
                decoded: 0,
                flushed: false,
            })
        }

        pub fn info(&self) -> VideoInfo {
            self.info
        }

        fn backend_error(&self, err: impl std::fmt::Display) -> DecodeError {
            DecodeError::Backend {
                index: self.decoded + self.queue.len(),
                message: err.to_string(),
            }
        }

        fn to_rgb(&mut self, decoded: &Video) -> Result<Frame, DecodeError> {
            if self.scaler.is_none() {
                let scaler = scaling::Context::get(
                    decoded.format(),
                    decoded.width(),
                    decoded.height(),
                    Pixel::RGB24,
                    decoded.width(),
                    decoded.height(),
                    scaling::Flags::BILINEAR,
                )
                .map_err(|e| self.backend_error(e))?;
                self.scaler = Some(scaler);
            }
            let index = self.decoded + self.queue.len();
            let mut rgb = Video::empty();
            if let Some(scaler) = self.scaler.as_mut() {
                scaler.run(decoded, &mut rgb).map_err(|e| DecodeError::Backend {
                    index,
                    message: e.to_string(),
                })?;
            }
            let width = rgb.width() as usize;
            let height = rgb.height() as usize;
            let stride = rgb.stride(0);
            let plane = rgb.data(0);
            let mut data = Vec::with_capacity(width * height * 3);
            for row in 0..height {
                let start = row * stride;
                let end = start + width * 3;
                if end > plane.len() {
                    break;
                }
                data.extend_from_slice(&plane[start..end]);
            }
            Ok(Frame::new(width as u32, height as u32, 3, data))
        }

        /// Queue every frame the decoder has ready. A conversion failure
        /// leaves the frames queued so far in place.
        fn drain_decoder(&mut self) -> Result<(), DecodeError> {
            let mut decoded = Video::empty();
            while self.decoder.receive_frame(&mut decoded).is_ok() {
                let frame = self.to_rgb(&decoded)?;
                self.queue.push(frame);
            }
            Ok(())
        }

        /// Feed the decoder one more packet of our stream, or the end of input.
        fn decode_more(&mut self) -> Result<(), DecodeError> {
            let mut packet = Packet::empty();
            match packet.read(&mut self.input) {
                Ok(()) => {
                    if packet.stream() != self.stream_index {
                        return Ok(());
                    }
                    self.decoder
                        .send_packet(&packet)
                        .map_err(|e| self.backend_error(e))?;
                }
                Err(ffmpeg::Error::Eof) => {
                    self.decoder.send_eof().map_err(|e| self.backend_error(e))?;
                    self.flushed = true;
                }
                Err(err) => return Err(self.backend_error(err)),
            }
            self.drain_decoder()
        }
    }

    impl FrameSource for FfmpegFrameSource {
        fn sampling_rate(&self) -> f64 {
            self.info.fps
        }

        fn frame_count_hint(&self) -> usize {
            self.info.frame_count
        }

        fn next_frame(&mut self) -> Result<Option<Frame>, DecodeError> {
            loop {
                match self.queue.pop() {
                    Some(Ok(frame)) => {
                        self.decoded += 1;
                        return Ok(Some(frame));
                    }
                    Some(Err(err)) => return Err(err),
                    None if self.flushed => return Ok(None),
                    None => {}
                }
                if let Err(err) = self.decode_more() {
                    // nothing more is decoded once the queue reports this
                    self.queue.fail(err);
                    self.flushed = true;
                }
            }
        }
    }
}
