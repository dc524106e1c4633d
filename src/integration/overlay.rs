//! Annotated replay of a processed video: boxes, track labels and center dots.

use std::collections::HashMap;

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect as PixelRect;
use tracing::info;

use crate::error::{Error, Result};
use crate::integration::{Detection, VideoSource};

const BOX_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const LABEL_BACKGROUND: Rgb<u8> = Rgb([0, 0, 0]);
const LABEL_COLOR: Rgb<u8> = Rgb([255, 255, 255]);
const DOT_RADIUS: i32 = 4;
/// Each glyph cell is drawn as a square of this many pixels.
const GLYPH_SCALE: i32 = 3;
const LABEL_PADDING: i32 = 3;

/// Destination for annotated frames, typically a video encoder.
pub trait FrameSink {
    type Error: std::error::Error + Send + Sync + 'static;

    fn write_frame(&mut self, frame: &RgbImage) -> std::result::Result<(), Self::Error>;
}

/// Draws the buffered detections of a job onto the frames they came from.
#[derive(Debug, Clone, Default)]
pub struct OverlayRenderer {
    by_frame: HashMap<u64, Vec<Detection>>,
}

impl OverlayRenderer {
    pub fn new(detections: &[Detection]) -> Self {
        let mut by_frame: HashMap<u64, Vec<Detection>> = HashMap::new();
        for det in detections {
            by_frame.entry(det.frame_index).or_default().push(*det);
        }
        Self { by_frame }
    }

    /// Number of detections recorded for `frame_index`.
    pub fn detections_on(&self, frame_index: u64) -> usize {
        self.by_frame.get(&frame_index).map_or(0, Vec::len)
    }

    /// Annotate `frame` in place with every detection of `frame_index`.
    pub fn draw(&self, frame_index: u64, frame: &mut RgbImage) {
        let Some(detections) = self.by_frame.get(&frame_index) else {
            return;
        };
        for det in detections {
            draw_detection(frame, det);
        }
    }
}

/// Replay `video`, annotate each frame and pass it to `sink`.
///
/// Returns the number of frames written.
pub fn render_overlay<V, S>(video: &mut V, sink: &mut S, detections: &[Detection]) -> Result<u64>
where
    V: VideoSource<Frame = RgbImage>,
    S: FrameSink,
{
    let renderer = OverlayRenderer::new(detections);
    let mut frame_index = 0u64;
    while let Some(mut frame) = video.next_frame().map_err(|e| Error::Video {
        frame_index,
        source: Box::new(e),
    })? {
        renderer.draw(frame_index, &mut frame);
        sink.write_frame(&frame).map_err(|e| Error::Sink {
            source: Box::new(e),
        })?;
        frame_index += 1;
    }
    info!(frames = frame_index, "overlay video rendered");
    Ok(frame_index)
}

fn draw_detection(frame: &mut RgbImage, det: &Detection) {
    let [x1, y1, x2, y2] = det.bbox.to_tlbr().map(|v| v.round() as i32);

    // two pixels thick
    for inset in 0..2 {
        if let Some(r) = pixel_rect(x1 + inset, y1 + inset, x2 - x1 - 2 * inset, y2 - y1 - 2 * inset)
        {
            draw_hollow_rect_mut(frame, r, BOX_COLOR);
        }
    }

    let label = format!("ID {}", det.track_id);
    let glyph_w = 3 * GLYPH_SCALE;
    let glyph_h = 5 * GLYPH_SCALE;
    let count = label.chars().count() as i32;
    let tab_w = count * (glyph_w + GLYPH_SCALE) - GLYPH_SCALE + 2 * LABEL_PADDING;
    let tab_h = glyph_h + 2 * LABEL_PADDING;
    // above the box when there is room, otherwise just inside its top edge
    let tab_y = if y1 - tab_h >= 0 { y1 - tab_h } else { y1 };
    if let Some(r) = pixel_rect(x1, tab_y, tab_w, tab_h) {
        draw_filled_rect_mut(frame, r, LABEL_BACKGROUND);
    }
    draw_text(frame, &label, x1 + LABEL_PADDING, tab_y + LABEL_PADDING);

    let (cx, cy) = det.bbox.center();
    draw_filled_circle_mut(frame, (cx.round() as i32, cy.round() as i32), DOT_RADIUS, LABEL_COLOR);
}

fn draw_text(frame: &mut RgbImage, text: &str, x: i32, y: i32) {
    let mut pen = x;
    for ch in text.chars() {
        for (row, bits) in glyph(ch).iter().enumerate() {
            for col in 0..3 {
                if bits & (0b100 >> col) == 0 {
                    continue;
                }
                if let Some(r) = pixel_rect(
                    pen + col * GLYPH_SCALE,
                    y + row as i32 * GLYPH_SCALE,
                    GLYPH_SCALE,
                    GLYPH_SCALE,
                ) {
                    draw_filled_rect_mut(frame, r, LABEL_COLOR);
                }
            }
        }
        pen += 4 * GLYPH_SCALE;
    }
}

/// 3x5 bitmap rows, most significant bit leftmost.
fn glyph(ch: char) -> [u8; 5] {
    match ch {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        _ => [0; 5],
    }
}

fn pixel_rect(x: i32, y: i32, w: i32, h: i32) -> Option<PixelRect> {
    (w > 0 && h > 0).then(|| PixelRect::at(x, y).of_size(w as u32, h as u32))
}
