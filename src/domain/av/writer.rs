use super::{FrameSink, VideoError, VideoFormat};
use ffmpeg_next as ffmpeg;
use image::RgbImage;
use std::path::Path;
use tracing::debug;

/// Encodes RGB frames as H.264 (yuv420p) into a container chosen from the
/// output file extension.
pub struct FfmpegWriter {
    output: ffmpeg::format::context::Output,
    encoder: ffmpeg::encoder::Video,
    scaler: ffmpeg::software::scaling::Context,
    encoder_time_base: ffmpeg::Rational,
    stream_time_base: ffmpeg::Rational,
    format: VideoFormat,
    next_pts: i64,
    written: usize,
    finished: bool,
}

impl FfmpegWriter {
    /// Open `path` for writing. yuv420p subsamples chroma by two in both
    /// directions, so odd widths or heights are refused up front.
    pub fn create(path: &Path, format: VideoFormat) -> Result<Self, VideoError> {
        if format.width % 2 != 0 || format.height % 2 != 0 {
            return Err(VideoError::OddDimensions {
                width: format.width,
                height: format.height,
            });
        }
        ffmpeg::init()?;

        let mut output = ffmpeg::format::output(&path)?;
        let global_header = output
            .format()
            .flags()
            .contains(ffmpeg::format::Flags::GLOBAL_HEADER);

        let codec = ffmpeg::encoder::find(ffmpeg::codec::Id::H264)
            .ok_or(VideoError::EncoderNotFound("h264"))?;

        let rate = ffmpeg::Rational::new(format.frame_rate.num, format.frame_rate.den);
        let time_base = rate.invert();

        let encoder = {
            let mut stream = output.add_stream(codec)?;

            let mut encoder = ffmpeg::codec::context::Context::new_with_codec(codec)
                .encoder()
                .video()?;
            encoder.set_width(format.width);
            encoder.set_height(format.height);
            encoder.set_format(ffmpeg::format::Pixel::YUV420P);
            encoder.set_time_base(time_base);
            encoder.set_frame_rate(Some(rate));
            if global_header {
                encoder.set_flags(ffmpeg::codec::Flags::GLOBAL_HEADER);
            }

            let encoder = encoder.open_as(codec)?;
            stream.set_parameters(&encoder);
            stream.set_time_base(time_base);
            encoder
        };

        output.write_header()?;
        let stream_time_base = output
            .stream(0)
            .map(|stream| stream.time_base())
            .unwrap_or(time_base);

        let scaler = ffmpeg::software::scaling::Context::get(
            ffmpeg::format::Pixel::RGB24,
            format.width,
            format.height,
            ffmpeg::format::Pixel::YUV420P,
            format.width,
            format.height,
            ffmpeg::software::scaling::flag::Flags::BILINEAR,
        )?;

        debug!(
            path = %path.display(),
            width = format.width,
            height = format.height,
            fps = format.frame_rate.as_f64(),
            "opened output video"
        );

        Ok(Self {
            output,
            encoder,
            scaler,
            encoder_time_base: time_base,
            stream_time_base,
            format,
            next_pts: 0,
            written: 0,
            finished: false,
        })
    }

    fn drain_packets(&mut self) -> Result<(), VideoError> {
        let mut packet = ffmpeg::Packet::empty();
        while self.encoder.receive_packet(&mut packet).is_ok() {
            packet.set_stream(0);
            packet.rescale_ts(self.encoder_time_base, self.stream_time_base);
            packet.write_interleaved(&mut self.output)?;
        }
        Ok(())
    }
}

impl FrameSink for FfmpegWriter {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<(), VideoError> {
        let (width, height) = frame.dimensions();
        if (width, height) != (self.format.width, self.format.height) {
            return Err(VideoError::FrameSize {
                width: self.format.width,
                height: self.format.height,
                got_width: width,
                got_height: height,
            });
        }

        let mut rgb = ffmpeg::util::frame::Video::new(ffmpeg::format::Pixel::RGB24, width, height);
        let stride = rgb.stride(0);
        let row = width as usize * 3;
        let data = rgb.data_mut(0);
        for (y, src) in frame.as_raw().chunks_exact(row).enumerate() {
            let start = y * stride;
            data[start..start + row].copy_from_slice(src);
        }

        let mut yuv = ffmpeg::util::frame::Video::empty();
        self.scaler.run(&rgb, &mut yuv)?;
        yuv.set_pts(Some(self.next_pts));
        self.next_pts += 1;

        self.encoder.send_frame(&yuv)?;
        self.written += 1;
        self.drain_packets()
    }

    fn finish(&mut self) -> Result<(), VideoError> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;

        self.encoder.send_eof()?;
        self.drain_packets()?;
        self.output.write_trailer()?;
        Ok(())
    }

    fn frames_written(&self) -> usize {
        self.written
    }
}
