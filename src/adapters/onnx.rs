//! YOLOv8 detector backed by ONNX Runtime.

use crate::domain::detection::{decode_yolov8, Detection, Letterbox, INPUT_SIZE, LETTERBOX_FILL};
use crate::ports::model::{Detector, DetectorError};
use image::imageops::{self, FilterType};
use image::RgbImage;
use ndarray::Array4;
use ort::session::Session;
use ort::value::TensorRef;
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

/// A loaded YOLOv8 model.
///
/// `Session::run` needs exclusive access, so calls from concurrent jobs are
/// serialised on the session lock.
pub struct YoloDetector {
    session: Mutex<Session>,
    input_size: u32,
}

/// Parse the model at `path` into a detector.
pub fn load_model(path: &Path) -> Result<YoloDetector, DetectorError> {
    info!(path = %path.display(), "loading model");

    let session = Session::builder()
        .map_err(|e| DetectorError::ModelLoad(e.to_string()))?
        .commit_from_file(path)
        .map_err(|e| DetectorError::ModelLoad(e.to_string()))?;

    debug!(input_size = INPUT_SIZE, "model loaded");
    Ok(YoloDetector {
        session: Mutex::new(session),
        input_size: INPUT_SIZE,
    })
}

/// Letterbox `frame` into a `[1, 3, size, size]` tensor scaled to `0.0..=1.0`,
/// returning the fit so boxes can be mapped back onto the frame.
pub fn preprocess(frame: &RgbImage, size: u32) -> (Array4<f32>, Letterbox) {
    let letterbox = Letterbox::fit(frame.width(), frame.height(), size);

    let resized;
    let content = if frame.dimensions() == (letterbox.width, letterbox.height) {
        frame
    } else {
        resized = imageops::resize(frame, letterbox.width, letterbox.height, FilterType::Triangle);
        &resized
    };

    let fill = LETTERBOX_FILL as f32 / 255.0;
    let mut array = Array4::from_elem((1, 3, size as usize, size as usize), fill);
    for (x, y, pixel) in content.enumerate_pixels() {
        let x = (x + letterbox.pad_x) as usize;
        let y = (y + letterbox.pad_y) as usize;
        array[[0, 0, y, x]] = pixel[0] as f32 / 255.0;
        array[[0, 1, y, x]] = pixel[1] as f32 / 255.0;
        array[[0, 2, y, x]] = pixel[2] as f32 / 255.0;
    }
    (array, letterbox)
}

impl Detector for YoloDetector {
    fn detect(&self, frame: &RgbImage, confidence: f32) -> Result<Vec<Detection>, DetectorError> {
        let (input, letterbox) = preprocess(frame, self.input_size);
        let input = input.into_dyn();
        let tensor = TensorRef::from_array_view(input.view())
            .map_err(|e| DetectorError::Inference(e.to_string()))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| DetectorError::Inference("session lock poisoned".to_string()))?;
        let outputs = session
            .run(ort::inputs![tensor])
            .map_err(|e| DetectorError::Inference(e.to_string()))?;

        let (shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| DetectorError::Inference(e.to_string()))?;

        // [1, 4 + classes, anchors]
        if shape.len() != 3 || shape[1] <= 4 {
            return Err(DetectorError::Inference(format!(
                "unexpected output shape {:?}",
                shape.to_vec()
            )));
        }
        let (num_features, num_anchors) = (shape[1] as usize, shape[2] as usize);

        let detections = decode_yolov8(data, num_features, num_anchors, confidence)
            .into_iter()
            .map(|mut detection| {
                detection.bbox = letterbox.to_frame(&detection.bbox);
                detection
            })
            .collect();
        Ok(detections)
    }
}
