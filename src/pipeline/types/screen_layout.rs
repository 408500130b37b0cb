use crate::pipeline::services::image::analysis::core::ImageRegion;
use serde::Serialize;
use std::fmt;

/// Native horizontal resolution of one DS screen.
pub const DS_WIDTH: u32 = 256;
/// Native vertical resolution of one DS screen.
pub const DS_HEIGHT: u32 = 192;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreenPosition {
    /// Side-by-side recording, top screen on the left.
    Left,
    /// Side-by-side recording, top screen on the right.
    Right,
    /// Stacked recording, top screen above the touch screen.
    Top,
    /// The frame shows only the top screen.
    Full,
}

impl fmt::Display for ScreenPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScreenPosition::Left => "left",
            ScreenPosition::Right => "right",
            ScreenPosition::Top => "top",
            ScreenPosition::Full => "full",
        };
        write!(f, "{}", name)
    }
}

/// Where the top screen sits inside a recorded frame and how much it is magnified.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScreenLayout {
    pub position: ScreenPosition,
    pub origin: (u32, u32),
    pub width: u32,
    pub height: u32,
    pub scale: f64,
    pub frame_size: (u32, u32),
}

impl ScreenLayout {
    pub fn new(
        position: ScreenPosition,
        origin: (u32, u32),
        scale: f64,
        frame_size: (u32, u32),
    ) -> Self {
        Self {
            position,
            origin,
            width: (f64::from(DS_WIDTH) * scale).round() as u32,
            height: (f64::from(DS_HEIGHT) * scale).round() as u32,
            scale,
            frame_size,
        }
    }

    /// Layout of a recording that is exactly the native top screen.
    pub fn native() -> Self {
        Self::new(ScreenPosition::Full, (0, 0), 1.0, (DS_WIDTH, DS_HEIGHT))
    }

    fn scaled(&self, value: u32) -> u32 {
        (f64::from(value) * self.scale).round() as u32
    }

    /// Maps a region given in native screen pixels onto frame pixels.
    /// Edges are rounded independently so adjacent regions never overlap.
    pub fn project(&self, native: ImageRegion) -> ImageRegion {
        let x0 = self.scaled(native.x);
        let y0 = self.scaled(native.y);
        let x1 = self.scaled(native.right());
        let y1 = self.scaled(native.bottom());
        ImageRegion::new(
            self.origin.0 + x0,
            self.origin.1 + y0,
            x1.saturating_sub(x0).max(1),
            y1.saturating_sub(y0).max(1),
        )
    }

    pub fn bounds(&self) -> ImageRegion {
        ImageRegion::new(self.origin.0, self.origin.1, self.width, self.height)
    }

    pub fn matches_frame(&self, width: u32, height: u32) -> bool {
        self.frame_size == (width, height)
    }

    pub fn is_consistent(&self) -> bool {
        self.scale > 0.0 && self.bounds().fits_within(self.frame_size.0, self.frame_size.1)
    }
}
