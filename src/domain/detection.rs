//! Detection values and YOLOv8 output decoding.
//!
//! Boxes are kept in coordinates normalised to the model input, so they map
//! onto any frame size by scaling with the frame's width and height.

use std::cmp::Ordering;

/// Confidence a detection needs to be drawn.
pub const CONFIDENCE_THRESHOLD: f32 = 0.5;

/// Overlap above which a weaker box of the same class is suppressed.
pub const IOU_THRESHOLD: f32 = 0.7;

pub const MAX_DETECTIONS: usize = 300;

/// Side of the square YOLOv8 input tensor.
pub const INPUT_SIZE: u32 = 640;

/// Grey the letterbox padding is filled with.
pub const LETTERBOX_FILL: u8 = 114;

/// Box with coordinates normalised to 0..1, origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[inline]
    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = (self.x + self.width).min(other.x + other.width);
        let bottom = (self.y + self.height).min(other.y + other.height);

        let intersection = (right - left).max(0.0) * (bottom - top).max(0.0);
        let union = self.area() + other.area() - intersection;

        if union > 0.0 {
            intersection / union
        } else {
            0.0
        }
    }

    /// Pixel rectangle `(x, y, width, height)` on a `frame_width` x `frame_height`
    /// frame, clipped to the frame. `None` when nothing of the box is visible.
    pub fn to_pixels(&self, frame_width: u32, frame_height: u32) -> Option<(i32, i32, u32, u32)> {
        let fw = frame_width as f32;
        let fh = frame_height as f32;

        let left = (self.x * fw).max(0.0);
        let top = (self.y * fh).max(0.0);
        let right = ((self.x + self.width) * fw).min(fw);
        let bottom = ((self.y + self.height) * fh).min(fh);

        let width = (right - left).round();
        let height = (bottom - top).round();
        if width < 1.0 || height < 1.0 {
            return None;
        }

        Some((
            left.round() as i32,
            top.round() as i32,
            width as u32,
            height as u32,
        ))
    }
}

/// How a frame is fitted into the square model input: scaled to keep its
/// aspect ratio, then centred on a padded canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    pub scale: f32,
    /// Size of the scaled frame inside the canvas
    pub width: u32,
    pub height: u32,
    pub pad_x: u32,
    pub pad_y: u32,
    frame_width: u32,
    frame_height: u32,
    input_size: u32,
}

impl Letterbox {
    pub fn fit(frame_width: u32, frame_height: u32, input_size: u32) -> Self {
        let (frame_width, frame_height) = (frame_width.max(1), frame_height.max(1));
        let side = input_size as f32;
        let scale = (side / frame_width as f32).min(side / frame_height as f32);
        let width = ((frame_width as f32 * scale).round() as u32).clamp(1, input_size);
        let height = ((frame_height as f32 * scale).round() as u32).clamp(1, input_size);

        Self {
            scale,
            width,
            height,
            pad_x: (input_size - width) / 2,
            pad_y: (input_size - height) / 2,
            frame_width,
            frame_height,
            input_size,
        }
    }

    /// Map a box normalised to the model input onto one normalised to the frame.
    pub fn to_frame(&self, bbox: &BoundingBox) -> BoundingBox {
        let side = self.input_size as f32;
        let (fw, fh) = (self.frame_width as f32, self.frame_height as f32);

        let x = (bbox.x * side - self.pad_x as f32) / self.scale;
        let y = (bbox.y * side - self.pad_y as f32) / self.scale;
        let width = bbox.width * side / self.scale;
        let height = bbox.height * side / self.scale;

        BoundingBox::new(x / fw, y / fh, width / fw, height / fh)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// COCO class id (0-79)
    pub class_id: u8,
    pub confidence: f32,
    pub bbox: BoundingBox,
}

impl Detection {
    pub fn class_name(&self) -> &'static str {
        coco_class_name(self.class_id)
    }
}

/// Decode a raw YOLOv8 output tensor laid out as `[1, 4 + classes, anchors]`.
///
/// Each anchor contributes its best class if that score reaches `confidence`;
/// the survivors go through per-class non-maximum suppression.
pub fn decode_yolov8(
    data: &[f32],
    num_features: usize,
    num_anchors: usize,
    confidence: f32,
) -> Vec<Detection> {
    if num_features <= 4 || data.len() < num_features * num_anchors {
        return Vec::new();
    }
    let num_classes = num_features - 4;
    let scale = INPUT_SIZE as f32;
    let feature = |f: usize, anchor: usize| data[f * num_anchors + anchor];

    let mut candidates = Vec::new();
    for anchor in 0..num_anchors {
        let mut best_class = 0usize;
        let mut best_score = 0.0f32;
        for class in 0..num_classes {
            let score = feature(4 + class, anchor);
            if score > best_score {
                best_score = score;
                best_class = class;
            }
        }

        if best_score < confidence {
            continue;
        }

        let cx = feature(0, anchor);
        let cy = feature(1, anchor);
        let w = feature(2, anchor);
        let h = feature(3, anchor);

        candidates.push(Detection {
            class_id: best_class.min(u8::MAX as usize) as u8,
            confidence: best_score,
            bbox: BoundingBox::new(
                (cx - w / 2.0) / scale,
                (cy - h / 2.0) / scale,
                w / scale,
                h / scale,
            ),
        });
    }

    let mut kept = non_max_suppression(candidates, IOU_THRESHOLD);
    kept.truncate(MAX_DETECTIONS);
    kept
}

/// Keep the strongest box of each overlapping same-class cluster, strongest first.
pub fn non_max_suppression(mut detections: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    detections.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
    });

    let mut kept: Vec<Detection> = Vec::with_capacity(detections.len());
    for candidate in detections {
        let suppressed = kept.iter().any(|k| {
            k.class_id == candidate.class_id && k.bbox.iou(&candidate.bbox) >= iou_threshold
        });
        if !suppressed {
            kept.push(candidate);
        }
    }
    kept
}

pub fn coco_class_name(class_id: u8) -> &'static str {
    COCO_CLASSES.get(class_id as usize).copied().unwrap_or("unknown")
}

pub const COCO_CLASSES: [&str; 80] = [
    "person", "bicycle", "car", "motorcycle", "airplane", "bus", "train", "truck", "boat",
    "traffic light", "fire hydrant", "stop sign", "parking meter", "bench", "bird", "cat", "dog",
    "horse", "sheep", "cow", "elephant", "bear", "zebra", "giraffe", "backpack", "umbrella",
    "handbag", "tie", "suitcase", "frisbee", "skis", "snowboard", "sports ball", "kite",
    "baseball bat", "baseball glove", "skateboard", "surfboard", "tennis racket", "bottle",
    "wine glass", "cup", "fork", "knife", "spoon", "bowl", "banana", "apple", "sandwich",
    "orange", "broccoli", "carrot", "hot dog", "pizza", "donut", "cake", "chair", "couch",
    "potted plant", "bed", "dining table", "toilet", "tv", "laptop", "mouse", "remote",
    "keyboard", "cell phone", "microwave", "oven", "toaster", "sink", "refrigerator", "book",
    "clock", "vase", "scissors", "teddy bear", "hair drier", "toothbrush",
];

#[cfg(test)]
mod tests {
    use super::*;

    fn det(class_id: u8, confidence: f32, x: f32, y: f32) -> Detection {
        Detection {
            class_id,
            confidence,
            bbox: BoundingBox::new(x, y, 0.2, 0.2),
        }
    }

    /// Lay anchors out the way the model does: feature-major.
    fn tensor(anchors: &[[f32; 6]]) -> Vec<f32> {
        let n = anchors.len();
        let mut data = vec![0.0; 6 * n];
        for (a, values) in anchors.iter().enumerate() {
            for (f, v) in values.iter().enumerate() {
                data[f * n + a] = *v;
            }
        }
        data
    }

    #[test]
    fn test_iou() {
        let a = BoundingBox::new(0.0, 0.0, 0.5, 0.5);
        assert!((a.iou(&a) - 1.0).abs() < 1e-6);
        assert_eq!(a.iou(&BoundingBox::new(0.6, 0.6, 0.2, 0.2)), 0.0);

        let half = a.iou(&BoundingBox::new(0.25, 0.0, 0.5, 0.5));
        assert!((half - 1.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_to_pixels_clips_to_frame() {
        let bbox = BoundingBox::new(-0.1, 0.5, 0.6, 0.75);
        assert_eq!(bbox.to_pixels(100, 200), Some((0, 100, 50, 100)));

        let outside = BoundingBox::new(1.2, 0.1, 0.1, 0.1);
        assert_eq!(outside.to_pixels(100, 100), None);
    }

    #[test]
    fn test_nms_suppresses_same_class_only() {
        let detections = vec![
            det(0, 0.6, 0.10, 0.10),
            det(0, 0.9, 0.11, 0.11),
            det(2, 0.7, 0.11, 0.11),
            det(0, 0.8, 0.70, 0.70),
        ];

        let kept = non_max_suppression(detections, IOU_THRESHOLD);
        let confidences: Vec<f32> = kept.iter().map(|d| d.confidence).collect();
        assert_eq!(confidences, vec![0.9, 0.8, 0.7]);
    }

    #[test]
    fn test_decode_applies_threshold_and_normalises() {
        // cx, cy, w, h, class0, class1
        let data = tensor(&[
            [320.0, 320.0, 64.0, 128.0, 0.1, 0.8],
            [100.0, 100.0, 10.0, 10.0, 0.3, 0.2],
        ]);

        let detections = decode_yolov8(&data, 6, 2, CONFIDENCE_THRESHOLD);
        assert_eq!(detections.len(), 1);

        let d = &detections[0];
        assert_eq!(d.class_id, 1);
        assert_eq!(d.class_name(), "bicycle");
        assert!((d.bbox.x - 0.45).abs() < 1e-6);
        assert!((d.bbox.y - 0.4).abs() < 1e-6);
        assert!((d.bbox.width - 0.1).abs() < 1e-6);
        assert!((d.bbox.height - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_decode_rejects_short_tensor() {
        assert!(decode_yolov8(&[0.0; 5], 6, 2, 0.5).is_empty());
        assert!(decode_yolov8(&[0.0; 8], 4, 2, 0.5).is_empty());
    }

    #[test]
    fn test_letterbox_pads_the_short_side() {
        let wide = Letterbox::fit(1280, 720, 640);
        assert_eq!(wide.scale, 0.5);
        assert_eq!((wide.width, wide.height), (640, 360));
        assert_eq!((wide.pad_x, wide.pad_y), (0, 140));

        let tall = Letterbox::fit(480, 640, 640);
        assert_eq!((tall.width, tall.height), (480, 640));
        assert_eq!((tall.pad_x, tall.pad_y), (80, 0));
    }

    #[test]
    fn test_letterbox_maps_boxes_back_to_frame() {
        let letterbox = Letterbox::fit(1280, 720, 640);

        // the whole content area of the canvas
        let content = BoundingBox::new(0.0, 140.0 / 640.0, 1.0, 360.0 / 640.0);
        let frame = letterbox.to_frame(&content);
        assert!(frame.x.abs() < 1e-5);
        assert!(frame.y.abs() < 1e-5);
        assert!((frame.width - 1.0).abs() < 1e-5);
        assert!((frame.height - 1.0).abs() < 1e-5);

        // a 64x64 canvas box at (320, 320) is a 128x128 frame box at (640, 360)
        let square = BoundingBox::new(0.5, 0.5, 0.1, 0.1);
        let mapped = letterbox.to_frame(&square);
        assert_eq!(mapped.to_pixels(1280, 720), Some((640, 360, 128, 128)));
    }

    #[test]
    fn test_class_names() {
        assert_eq!(COCO_CLASSES.len(), 80);
        assert_eq!(coco_class_name(0), "person");
        assert_eq!(coco_class_name(79), "toothbrush");
        assert_eq!(coco_class_name(200), "unknown");
    }
}
