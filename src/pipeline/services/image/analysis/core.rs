use image::{GrayImage, RgbImage};
use serde::{Deserialize, Serialize};

/// Rectangular region of an image for focused analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl ImageRegion {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn full_image(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    pub fn contains_point(&self, x: u32, y: u32) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }

    pub fn area(&self) -> u32 {
        self.width * self.height
    }

    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    /// True when the region lies entirely inside an image of the given size.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.right() <= width && self.bottom() <= height
    }
}

/// Brightness threshold and tolerance used by a strip whiteness test.
///
/// A pixel is white when all three channels exceed `intensity`. A region is
/// white unless `strictness * not_white > white`, so a strictness of 1 accepts
/// a region that is at least half white while 50 tolerates roughly 2% ink.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WhitenessCheck {
    pub intensity: u8,
    pub strictness: u32,
}

impl WhitenessCheck {
    /// Crisp textbox borders and the strip under the second line.
    pub const BORDER: Self = Self {
        intensity: 235,
        strictness: 1,
    };
    /// Anti-aliased gaps between text lines.
    pub const GAP: Self = Self {
        intensity: 225,
        strictness: 50,
    };
    /// Whole text region emptiness.
    pub const EMPTY: Self = Self {
        intensity: 235,
        strictness: 40,
    };

    pub fn is_white_pixel(&self, pixel: [u8; 3]) -> bool {
        pixel.iter().all(|&c| c > self.intensity)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PixelTally {
    pub white: u64,
    pub not_white: u64,
}

impl PixelTally {
    pub fn total(&self) -> u64 {
        self.white + self.not_white
    }
}

/// Counts white and non-white pixels inside `region`. Pixels outside the image are ignored.
pub fn tally_whiteness(rgb: &RgbImage, region: ImageRegion, check: WhitenessCheck) -> PixelTally {
    let mut tally = PixelTally::default();
    for y in region.y..region.bottom() {
        for x in region.x..region.right() {
            if let Some(pixel) = rgb.get_pixel_checked(x, y) {
                if check.is_white_pixel(pixel.0) {
                    tally.white += 1;
                } else {
                    tally.not_white += 1;
                }
            }
        }
    }
    tally
}

/// Parameterized strip whiteness test shared by every textbox predicate.
/// A region with no pixels inside the image is never white.
pub fn is_region_white(rgb: &RgbImage, region: ImageRegion, check: WhitenessCheck) -> bool {
    let tally = tally_whiteness(rgb, region, check);
    if tally.total() == 0 {
        return false;
    }
    u64::from(check.strictness) * tally.not_white <= tally.white
}

pub fn mean_luma(gray: &GrayImage) -> f64 {
    let count = u64::from(gray.width()) * u64::from(gray.height());
    if count == 0 {
        return 0.0;
    }
    let sum: u64 = gray.pixels().map(|p| u64::from(p.0[0])).sum();
    sum as f64 / count as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb};

    fn strip_with_ink(ink_pixels: u32) -> RgbImage {
        let mut img = RgbImage::from_pixel(166, 1, Rgb([255, 255, 255]));
        for x in 0..ink_pixels {
            img.put_pixel(x, 0, Rgb([80, 80, 80]));
        }
        img
    }

    #[test]
    fn gap_check_tolerates_a_few_ink_pixels() {
        let region = ImageRegion::new(0, 0, 166, 1);
        assert!(is_region_white(&strip_with_ink(0), region, WhitenessCheck::GAP));
        assert!(is_region_white(&strip_with_ink(3), region, WhitenessCheck::GAP));
        assert!(!is_region_white(&strip_with_ink(4), region, WhitenessCheck::GAP));
    }

    #[test]
    fn border_check_accepts_half_white() {
        let region = ImageRegion::new(0, 0, 166, 1);
        assert!(is_region_white(&strip_with_ink(83), region, WhitenessCheck::BORDER));
        assert!(!is_region_white(&strip_with_ink(84), region, WhitenessCheck::BORDER));
    }

    #[test]
    fn pixel_must_exceed_intensity_on_every_channel() {
        let check = WhitenessCheck::BORDER;
        assert!(check.is_white_pixel([236, 240, 250]));
        assert!(!check.is_white_pixel([235, 255, 255]));
        assert!(!check.is_white_pixel([255, 255, 100]));
    }

    #[test]
    fn region_outside_image_is_not_white() {
        let img = RgbImage::from_pixel(10, 10, Rgb([255, 255, 255]));
        let region = ImageRegion::new(20, 20, 5, 5);
        assert!(!is_region_white(&img, region, WhitenessCheck::BORDER));
    }

    #[test]
    fn region_helpers() {
        let region = ImageRegion::new(4, 6, 10, 2);
        assert!(region.contains_point(4, 6));
        assert!(!region.contains_point(14, 6));
        assert_eq!(region.area(), 20);
        assert!(region.fits_within(14, 8));
        assert!(!region.fits_within(13, 8));
    }

    #[test]
    fn mean_luma_of_uniform_image() {
        let gray = GrayImage::from_pixel(4, 4, Luma([200]));
        assert!((mean_luma(&gray) - 200.0).abs() < f64::EPSILON);
        assert_eq!(mean_luma(&GrayImage::new(0, 0)), 0.0);
    }
}
