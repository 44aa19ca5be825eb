//! Surface dimensions.
//!
//! A surface has two independent sizes. The *backing store* is the pixel grid
//! the engine renders into ([`PixelSize`], device pixels). The *displayed*
//! size is the room the surface takes up in layout ([`LogicalSize`], layout
//! units). Neither is derived from the other: a 1000x1000 backing store shown
//! at 500x500 draws at full device resolution on a 2x display.
//!
//! ```
//! use render_host::surface::{device_pixel_ratio, LogicalSize, PixelSize};
//!
//! let backing = PixelSize::new(1000, 1000);
//! let display = LogicalSize::new(500, 500);
//! assert_eq!(device_pixel_ratio(backing, display), 2.0);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Size of a backing store in device pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelSize {
    pub width: u32,
    pub height: u32,
}

impl PixelSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True when either dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for PixelSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Displayed size in layout units (CSS pixels on the web).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogicalSize {
    pub width: u32,
    pub height: u32,
}

impl LogicalSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for LogicalSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}px", self.width, self.height)
    }
}

/// Horizontal device pixels per layout unit.
///
/// Returns `0.0` if the displayed width is `0` to avoid division by zero.
pub fn device_pixel_ratio(backing: PixelSize, display: LogicalSize) -> f32 {
    if display.width == 0 {
        0.0
    } else {
        backing.width as f32 / display.width as f32
    }
}
