//! Interfaces of the external collaborators: video decoding and the
//! person detector/tracker.

use serde::{Deserialize, Serialize};

use crate::geometry::Rect;

/// One tracked box as reported by the external tracker for a single frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackedBox {
    pub bbox: Rect,
    /// Identity that stays stable across frames for one person.
    pub track_id: u64,
    pub confidence: f32,
    /// Only confirmed tracks are counted.
    pub confirmed: bool,
}

/// One confirmed observation, buffered for the spatial pass and the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub frame_index: u64,
    /// Box in camera pixels.
    pub bbox: Rect,
    pub track_id: u64,
    pub confidence: f32,
}

/// Sequential frame source for one video.
///
/// # Example
///
/// ```ignore
/// struct Decoder { /* ... */ }
///
/// impl VideoSource for Decoder {
///     type Frame = image::RgbImage;
///     type Error = std::io::Error;
///
///     fn frame_count(&self) -> u64 { self.frames }
///     fn fps(&self) -> f64 { self.fps }
///     fn next_frame(&mut self) -> Result<Option<Self::Frame>, Self::Error> {
///         // Decode the next frame, or Ok(None) at end of stream
///     }
/// }
/// ```
pub trait VideoSource {
    type Frame;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Total number of frames reported by the container. May be an estimate.
    fn frame_count(&self) -> u64;

    /// Frames per second, or `0.0` when unknown.
    fn fps(&self) -> f64;

    /// Next frame in presentation order, `None` once the stream is exhausted.
    fn next_frame(&mut self) -> Result<Option<Self::Frame>, Self::Error>;
}

/// Person detector and multi-object tracker, treated as one black box.
///
/// Called once per frame, in order; identities must persist across calls.
pub trait TrackSource<F> {
    type Error: std::error::Error + Send + Sync + 'static;

    fn track(&mut self, frame: &F) -> Result<Vec<TrackedBox>, Self::Error>;
}
