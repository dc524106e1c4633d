//! Builder for creating TrackedBox values from various box formats.

use crate::geometry::Rect;
use crate::integration::TrackedBox;

/// Builder for `TrackedBox`, for adapters around trackers with their own box layout.
#[derive(Debug, Clone, Default)]
pub struct TrackedBoxBuilder {
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
    track_id: u64,
    confidence: f32,
    confirmed: bool,
}

impl TrackedBoxBuilder {
    /// Create a builder for the given track identity. Boxes start confirmed.
    pub fn new(track_id: u64) -> Self {
        Self {
            track_id,
            confirmed: true,
            ..Self::default()
        }
    }

    /// Set bounding box in TLBR format (x1, y1, x2, y2).
    pub fn tlbr(mut self, x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        self.x1 = x1;
        self.y1 = y1;
        self.x2 = x2;
        self.y2 = y2;
        self
    }

    /// Set bounding box in XYWH format (center_x, center_y, width, height).
    pub fn xywh(mut self, cx: f32, cy: f32, w: f32, h: f32) -> Self {
        self.x1 = cx - w / 2.0;
        self.y1 = cy - h / 2.0;
        self.x2 = cx + w / 2.0;
        self.y2 = cy + h / 2.0;
        self
    }

    /// Set bounding box in TLWH format (left, top, width, height).
    pub fn tlwh(mut self, l: f32, t: f32, w: f32, h: f32) -> Self {
        self.x1 = l;
        self.y1 = t;
        self.x2 = l + w;
        self.y2 = t + h;
        self
    }

    pub fn confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    /// Mark the track as tentative (not yet confirmed by the tracker).
    pub fn tentative(mut self) -> Self {
        self.confirmed = false;
        self
    }

    pub fn build(self) -> TrackedBox {
        TrackedBox {
            bbox: Rect::from_tlbr(self.x1, self.y1, self.x2, self.y2),
            track_id: self.track_id,
            confidence: self.confidence,
            confirmed: self.confirmed,
        }
    }
}
