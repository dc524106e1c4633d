//! Error type shared by every stage of the analytics pipeline.

use thiserror::Error;

/// Boxed error reported by an external collaborator (video decoder, tracker, writer).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum Error {
    /// The video source could not be opened or reports no frames.
    #[error("invalid video: {reason}")]
    InvalidVideo { reason: String },

    /// The calibration points do not define a usable homography.
    #[error("degenerate calibration geometry: {reason}; recalibrate the four floor corners")]
    DegenerateGeometry { reason: String },

    /// Frames were observed out of order.
    #[error("frame {got} observed after frame {previous}")]
    FrameOrder { previous: u64, got: u64 },

    /// The external detector/tracker failed on one frame, which aborts the job.
    #[error("tracker failed on frame {frame_index}: {source}")]
    Tracker {
        frame_index: u64,
        #[source]
        source: BoxError,
    },

    /// The video source failed to decode a frame.
    #[error("video source failed on frame {frame_index}: {source}")]
    Video {
        frame_index: u64,
        #[source]
        source: BoxError,
    },

    /// The overlay frame writer rejected a frame.
    #[error("frame sink failed: {source}")]
    Sink {
        #[source]
        source: BoxError,
    },

    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn degenerate(reason: impl Into<String>) -> Self {
        Self::DegenerateGeometry {
            reason: reason.into(),
        }
    }
}
