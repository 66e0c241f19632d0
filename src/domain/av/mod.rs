//! Frame-level video input and output.

pub mod reader;
pub mod writer;

use image::RgbImage;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VideoError {
    #[error("ffmpeg error: {0}")]
    Ffmpeg(#[from] ffmpeg_next::Error),

    #[error("no video stream found")]
    NoVideoStream,

    #[error("no {0} encoder available")]
    EncoderNotFound(&'static str),

    #[error("frame is {got_width}x{got_height}, expected {width}x{height}")]
    FrameSize {
        width: u32,
        height: u32,
        got_width: u32,
        got_height: u32,
    },

    #[error("H.264/yuv420p output needs even dimensions, got {width}x{height}")]
    OddDimensions { width: u32, height: u32 },

    #[error("invalid frame: {0}")]
    InvalidFrame(String),
}

/// Frames per second as a fraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRate {
    pub num: i32,
    pub den: i32,
}

impl FrameRate {
    pub fn new(num: i32, den: i32) -> Self {
        Self { num, den }
    }

    pub fn is_valid(&self) -> bool {
        self.num > 0 && self.den > 0
    }

    pub fn as_f64(&self) -> f64 {
        if self.den == 0 {
            0.0
        } else {
            self.num as f64 / self.den as f64
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoFormat {
    pub width: u32,
    pub height: u32,
    pub frame_rate: FrameRate,
}

/// A finite, one-shot sequence of decoded RGB frames.
pub trait FrameSource {
    fn format(&self) -> VideoFormat;

    /// Next frame in presentation order, `None` once the input is exhausted.
    fn next_frame(&mut self) -> Result<Option<RgbImage>, VideoError>;
}

/// Encoded video output accepting RGB frames of a fixed format.
pub trait FrameSink {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<(), VideoError>;

    /// Flush pending frames and close the container. Calling it twice is a no-op.
    fn finish(&mut self) -> Result<(), VideoError>;

    fn frames_written(&self) -> usize;
}
