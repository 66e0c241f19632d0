use super::detection::Detection;
use ab_glyph::{FontRef, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use std::sync::OnceLock;
use tracing::warn;

const BOX_THICKNESS: u32 = 2;
const LABEL_HEIGHT: u32 = 14;
const LABEL_SCALE: f32 = 12.0;
const LABEL_PADDING: u32 = 2;

static FONT_DATA: &[u8] = include_bytes!("../../assets/DejaVuSansMono.ttf");

const PALETTE: [[u8; 3]; 10] = [
    [255, 56, 56],
    [255, 157, 151],
    [255, 112, 31],
    [255, 178, 29],
    [207, 210, 49],
    [72, 249, 10],
    [26, 147, 52],
    [0, 212, 187],
    [52, 69, 147],
    [203, 56, 255],
];

pub fn class_color(class_id: u8) -> Rgb<u8> {
    Rgb(PALETTE[class_id as usize % PALETTE.len()])
}

/// Black on light backgrounds, white on dark ones.
fn text_color(background: Rgb<u8>) -> Rgb<u8> {
    let [r, g, b] = background.0;
    let luma = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
    if luma > 150.0 {
        Rgb([0, 0, 0])
    } else {
        Rgb([255, 255, 255])
    }
}

fn label_font() -> Option<&'static FontRef<'static>> {
    static FONT: OnceLock<Option<FontRef<'static>>> = OnceLock::new();
    FONT.get_or_init(|| match FontRef::try_from_slice(FONT_DATA) {
        Ok(font) => Some(font),
        Err(e) => {
            warn!(error = %e, "label font unusable, drawing boxes without text");
            None
        }
    })
    .as_ref()
}

/// `"<class> <confidence>"`, e.g. `person 0.87`.
pub fn label_text(detection: &Detection) -> String {
    format!("{} {:.2}", detection.class_name(), detection.confidence)
}

/// Draw every detection onto `frame` in place.
///
/// Each box gets a class-coloured outline and a filled tab carrying its label.
/// The tab sits above the box, or just inside its top edge when there is no
/// room above.
pub fn draw_detections(frame: &mut RgbImage, detections: &[Detection]) {
    let (width, height) = frame.dimensions();
    let scale = PxScale::from(LABEL_SCALE);
    let font = label_font();

    for detection in detections {
        let Some((x, y, w, h)) = detection.bbox.to_pixels(width, height) else {
            continue;
        };
        let color = class_color(detection.class_id);

        for inset in 0..BOX_THICKNESS {
            let (iw, ih) = (w.saturating_sub(2 * inset), h.saturating_sub(2 * inset));
            if iw == 0 || ih == 0 {
                break;
            }
            let rect = Rect::at(x + inset as i32, y + inset as i32).of_size(iw, ih);
            draw_hollow_rect_mut(frame, rect, color);
        }

        let label = label_text(detection);
        let text_width = font.map_or(0, |font| text_size(scale, font, &label).0);
        let tab_y = if y >= LABEL_HEIGHT as i32 {
            y - LABEL_HEIGHT as i32
        } else {
            y
        };
        let tab = Rect::at(x, tab_y).of_size(text_width + 2 * LABEL_PADDING, LABEL_HEIGHT);
        draw_filled_rect_mut(frame, tab, color);

        if let Some(font) = font {
            let (text_x, text_y) = (x + LABEL_PADDING as i32, tab_y + 1);
            draw_text_mut(frame, text_color(color), text_x, text_y, scale, font, &label);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::detection::BoundingBox;

    const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

    fn detection(class_id: u8, confidence: f32, bbox: BoundingBox) -> Detection {
        Detection {
            class_id,
            confidence,
            bbox,
        }
    }

    fn tab_pixels(frame: &RgbImage, x: u32, y: u32, width: u32) -> Vec<Rgb<u8>> {
        (y..y + LABEL_HEIGHT)
            .flat_map(|py| (x..x + width).map(move |px| (px, py)))
            .filter(|&(px, py)| px < frame.width() && py < frame.height())
            .map(|(px, py)| *frame.get_pixel(px, py))
            .collect()
    }

    #[test]
    fn test_draws_outline_and_leaves_interior() {
        let mut frame = RgbImage::from_pixel(100, 100, BLACK);
        let d = detection(0, 1.0, BoundingBox::new(0.2, 0.2, 0.5, 0.5));

        draw_detections(&mut frame, &[d]);

        let color = class_color(0);
        assert_eq!(*frame.get_pixel(20, 40), color);
        assert_eq!(*frame.get_pixel(21, 40), color);
        assert_eq!(*frame.get_pixel(69, 40), color);
        assert_eq!(*frame.get_pixel(45, 45), BLACK);
        // label tab sits above the box
        assert_eq!(*frame.get_pixel(20, 6), color);
    }

    #[test]
    fn test_label_text_names_class_and_confidence() {
        let d = detection(0, 0.876, BoundingBox::new(0.0, 0.0, 0.1, 0.1));
        assert_eq!(label_text(&d), "person 0.88");

        let d = detection(10, 0.5, BoundingBox::new(0.0, 0.0, 0.1, 0.1));
        assert_eq!(label_text(&d), "fire hydrant 0.50");
    }

    #[test]
    fn test_tab_carries_rendered_text() {
        let mut frame = RgbImage::from_pixel(200, 100, BLACK);
        let d = detection(0, 0.9, BoundingBox::new(0.1, 0.3, 0.5, 0.5));

        draw_detections(&mut frame, &[d]);

        // box at (20, 30): tab spans rows 16..30
        let color = class_color(0);
        let tab = tab_pixels(&frame, 20, 16, 100);
        assert!(tab.iter().any(|p| *p == color));
        assert!(
            tab.iter().any(|p| *p != color && *p != BLACK),
            "no glyph pixels inside the label tab"
        );
    }

    #[test]
    fn test_classes_sharing_a_colour_are_told_apart_by_label() {
        assert_eq!(class_color(0), class_color(10));
        let bbox = BoundingBox::new(0.1, 0.3, 0.5, 0.5);

        let mut person = RgbImage::from_pixel(200, 100, BLACK);
        draw_detections(&mut person, &[detection(0, 0.9, bbox)]);
        let mut hydrant = RgbImage::from_pixel(200, 100, BLACK);
        draw_detections(&mut hydrant, &[detection(10, 0.9, bbox)]);

        assert_ne!(tab_pixels(&person, 20, 16, 120), tab_pixels(&hydrant, 20, 16, 120));
    }

    #[test]
    fn test_label_moves_inside_box_at_top_edge() {
        let mut frame = RgbImage::from_pixel(100, 60, BLACK);
        let d = detection(5, 0.7, BoundingBox::new(0.1, 0.0, 0.6, 0.8));

        draw_detections(&mut frame, &[d]);

        assert_eq!(*frame.get_pixel(10, 0), class_color(5));
        assert_eq!(*frame.get_pixel(11, 12), class_color(5));
    }

    #[test]
    fn test_text_color_contrasts_with_tab() {
        assert_eq!(text_color(Rgb([255, 178, 29])), BLACK);
        assert_eq!(text_color(Rgb([52, 69, 147])), Rgb([255, 255, 255]));
    }

    #[test]
    fn test_no_detections_leaves_frame_untouched() {
        let mut frame = RgbImage::from_pixel(32, 16, BLACK);
        draw_detections(&mut frame, &[]);
        assert!(frame.pixels().all(|p| *p == BLACK));
    }

    #[test]
    fn test_boxes_outside_frame_are_skipped() {
        let mut frame = RgbImage::from_pixel(40, 40, BLACK);
        let d = detection(3, 0.9, BoundingBox::new(1.5, 1.5, 0.2, 0.2));

        draw_detections(&mut frame, &[d]);
        assert!(frame.pixels().all(|p| *p == BLACK));
    }

    #[test]
    fn test_box_touching_edge_does_not_panic() {
        let mut frame = RgbImage::from_pixel(50, 30, BLACK);
        let d = detection(7, 0.5, BoundingBox::new(0.8, -0.2, 0.5, 0.5));

        draw_detections(&mut frame, &[d]);
        assert_eq!(*frame.get_pixel(49, 0), class_color(7));
    }

    #[test]
    fn test_palette_wraps() {
        assert_eq!(class_color(0), class_color(10));
        assert_ne!(class_color(0), class_color(1));
    }
}
