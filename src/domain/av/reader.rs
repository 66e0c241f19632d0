use super::{FrameRate, FrameSource, VideoError, VideoFormat};
use ffmpeg_next as ffmpeg;
use image::RgbImage;
use std::path::Path;
use tracing::{debug, warn};

const FALLBACK_FRAME_RATE: FrameRate = FrameRate { num: 30, den: 1 };

/// Decodes the best video stream of a file into RGB frames.
pub struct FfmpegReader {
    input: ffmpeg::format::context::Input,
    decoder: ffmpeg::decoder::Video,
    stream_index: usize,
    scaler: ffmpeg::software::scaling::Context,
    format: VideoFormat,
    eof_sent: bool,
}

impl FfmpegReader {
    pub fn open(path: &Path) -> Result<Self, VideoError> {
        ffmpeg::init()?;

        let input = ffmpeg::format::input(&path)?;
        let (stream_index, frame_rate, decoder) = {
            let stream = input
                .streams()
                .best(ffmpeg::media::Type::Video)
                .ok_or(VideoError::NoVideoStream)?;

            let frame_rate = stream_frame_rate(stream.avg_frame_rate(), stream.rate());
            let context = ffmpeg::codec::context::Context::from_parameters(stream.parameters())?;
            (stream.index(), frame_rate, context.decoder().video()?)
        };

        let scaler = ffmpeg::software::scaling::Context::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            ffmpeg::format::Pixel::RGB24,
            decoder.width(),
            decoder.height(),
            ffmpeg::software::scaling::flag::Flags::BILINEAR,
        )?;

        let format = VideoFormat {
            width: decoder.width(),
            height: decoder.height(),
            frame_rate,
        };
        debug!(
            path = %path.display(),
            width = format.width,
            height = format.height,
            fps = format.frame_rate.as_f64(),
            "opened input video"
        );

        Ok(Self {
            input,
            decoder,
            stream_index,
            scaler,
            format,
            eof_sent: false,
        })
    }

    /// Feed the decoder the next packet of our stream, or EOF when there is none.
    fn feed(&mut self) -> Result<(), VideoError> {
        for (stream, packet) in self.input.packets() {
            if stream.index() == self.stream_index {
                self.decoder.send_packet(&packet)?;
                return Ok(());
            }
        }
        self.decoder.send_eof()?;
        self.eof_sent = true;
        Ok(())
    }

    fn to_rgb(&mut self, decoded: &ffmpeg::util::frame::Video) -> Result<RgbImage, VideoError> {
        let mut rgb = ffmpeg::util::frame::Video::empty();
        self.scaler.run(decoded, &mut rgb)?;

        let (width, height) = (rgb.width(), rgb.height());
        let stride = rgb.stride(0);
        let row = width as usize * 3;
        let data = rgb.data(0);

        let mut pixels = Vec::with_capacity(row * height as usize);
        for y in 0..height as usize {
            let start = y * stride;
            pixels.extend_from_slice(&data[start..start + row]);
        }

        RgbImage::from_raw(width, height, pixels)
            .ok_or_else(|| VideoError::InvalidFrame(format!("{}x{} RGB buffer", width, height)))
    }
}

impl FrameSource for FfmpegReader {
    fn format(&self) -> VideoFormat {
        self.format
    }

    fn next_frame(&mut self) -> Result<Option<RgbImage>, VideoError> {
        let mut decoded = ffmpeg::util::frame::Video::empty();
        loop {
            match self.decoder.receive_frame(&mut decoded) {
                Ok(()) => return self.to_rgb(&decoded).map(Some),
                Err(ffmpeg::Error::Eof) => return Ok(None),
                Err(_) if self.eof_sent => return Ok(None),
                Err(_) => self.feed()?,
            }
        }
    }
}

fn stream_frame_rate(average: ffmpeg::Rational, base: ffmpeg::Rational) -> FrameRate {
    let average = FrameRate::new(average.numerator(), average.denominator());
    if average.is_valid() {
        return average;
    }
    let base = FrameRate::new(base.numerator(), base.denominator());
    if base.is_valid() {
        return base;
    }
    warn!("could not determine frame rate, defaulting to 30 fps");
    FALLBACK_FRAME_RATE
}
