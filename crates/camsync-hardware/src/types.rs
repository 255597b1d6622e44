//! Value types shared by camera implementations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: i64,
    pub height: i64,
}

impl Dimensions {
    pub const fn new(width: i64, height: i64) -> Self {
        Self { width, height }
    }
}

/// Inclusive integer range reported by a feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntRange {
    pub min: i64,
    pub max: i64,
}

impl IntRange {
    pub const fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    #[must_use]
    pub fn contains(&self, value: i64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// Metadata of one acquired frame, passed to the frame callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameInfo {
    /// Monotonic per-device frame counter, starting at 1.
    pub frame_id: u64,
    pub width: u32,
    pub height: u32,
    /// Host time at which the frame was handed to the callback.
    pub timestamp: DateTime<Utc>,
}

/// Callback run on the driver's acquisition thread for every frame.
///
/// Implementations must return quickly: no blocking, no locks held by the
/// control path.
pub type FrameCallback = Arc<dyn Fn(&FrameInfo) + Send + Sync>;
