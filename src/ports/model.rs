use crate::domain::detection::Detection;
use image::RgbImage;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    #[error("inference error: {0}")]
    Inference(String),
}

/// A loaded object-detection model.
///
/// Implementations are shared by every running job and must be safe to call
/// concurrently through `&self`.
#[cfg_attr(test, mockall::automock)]
pub trait Detector: Send + Sync {
    /// Detections scoring at least `confidence`, with boxes normalised to the frame.
    fn detect(&self, frame: &RgbImage, confidence: f32) -> Result<Vec<Detection>, DetectorError>;
}
