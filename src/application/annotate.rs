use crate::domain::av::reader::FfmpegReader;
use crate::domain::av::writer::FfmpegWriter;
use crate::domain::av::{FrameSink, FrameSource, VideoError};
use crate::domain::detection::{Detection, CONFIDENCE_THRESHOLD};
use crate::domain::overlay::draw_detections;
use crate::ports::annotate::{AnnotateStats, VideoAnnotator};
use crate::ports::model::{Detector, DetectorError};
use std::error::Error;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum AnnotateError {
    #[error(transparent)]
    Video(#[from] VideoError),

    #[error("detection failed on frame {frame}")]
    Detect {
        frame: usize,
        #[source]
        source: DetectorError,
    },
}

/// Run every frame of `source` through `detector`, draw the detections and
/// append the frame to `sink`, in order.
///
/// The sink is finished whether or not the loop succeeds; the first error wins.
pub fn annotate_frames<S, K, D>(
    source: &mut S,
    sink: &mut K,
    detector: &D,
    confidence: f32,
) -> Result<usize, AnnotateError>
where
    S: FrameSource + ?Sized,
    K: FrameSink + ?Sized,
    D: Detector + ?Sized,
{
    let pumped = pump(source, sink, detector, confidence);
    let finished = sink.finish();

    let frames = pumped?;
    finished?;
    Ok(frames)
}

fn pump<S, K, D>(
    source: &mut S,
    sink: &mut K,
    detector: &D,
    confidence: f32,
) -> Result<usize, AnnotateError>
where
    S: FrameSource + ?Sized,
    K: FrameSink + ?Sized,
    D: Detector + ?Sized,
{
    let mut index = 0;
    while let Some(mut frame) = source.next_frame()? {
        let detections = detector
            .detect(&frame, confidence)
            .map_err(|source| AnnotateError::Detect {
                frame: index,
                source,
            })?;
        draw_detections(&mut frame, &detections);
        sink.write_frame(&frame)?;

        if index % 100 == 0 {
            debug!(
                frame = index,
                detections = detections.len(),
                strongest = detections.first().map(Detection::class_name).unwrap_or("-"),
                "annotated frame"
            );
        }
        index += 1;
    }
    Ok(index)
}

/// Annotates video files with ffmpeg and a shared detector.
pub struct FfmpegAnnotator {
    detector: Arc<dyn Detector>,
    confidence: f32,
}

impl FfmpegAnnotator {
    pub fn new(detector: Arc<dyn Detector>) -> Self {
        Self {
            detector,
            confidence: CONFIDENCE_THRESHOLD,
        }
    }
}

impl VideoAnnotator for FfmpegAnnotator {
    fn annotate(
        &self,
        input: &Path,
        output: &Path,
    ) -> Result<AnnotateStats, Box<dyn Error + Send + Sync>> {
        let mut reader = FfmpegReader::open(input)?;
        let format = reader.format();
        let mut writer = FfmpegWriter::create(output, format)?;

        let frames =
            annotate_frames(&mut reader, &mut writer, self.detector.as_ref(), self.confidence)?;
        debug!(frames, output = %output.display(), "annotated video");

        Ok(AnnotateStats {
            frames,
            width: format.width,
            height: format.height,
            fps: format.frame_rate.as_f64(),
        })
    }
}
