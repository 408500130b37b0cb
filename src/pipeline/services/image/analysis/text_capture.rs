use super::config::{ClassifierThresholds, GameProfile};
use super::core::{is_region_white, ImageRegion, WhitenessCheck};
use crate::pipeline::types::ScreenLayout;
use image::imageops;
use image::{GrayImage, Luma, RgbImage};

/// Frame pixels of the text region, retained between frames for diffing and
/// late recognition.
#[derive(Debug, Clone)]
pub struct TextCapture {
    pixels: RgbImage,
    scale: f64,
    native_width: u32,
    native_height: u32,
}

impl TextCapture {
    pub fn capture(frame: &RgbImage, layout: &ScreenLayout, profile: &GameProfile) -> Self {
        let native = profile.text_region();
        let region = layout.project(native);
        let (frame_width, frame_height) = frame.dimensions();
        let x = region.x.min(frame_width);
        let y = region.y.min(frame_height);
        let width = region.width.min(frame_width - x);
        let height = region.height.min(frame_height - y);
        let pixels = imageops::crop_imm(frame, x, y, width, height).to_image();
        Self {
            pixels,
            scale: layout.scale,
            native_width: native.width,
            native_height: native.height,
        }
    }

    pub fn pixels(&self) -> &RgbImage {
        &self.pixels
    }

    /// True when the whole text region reads as white.
    pub fn is_empty(&self, check: WhitenessCheck) -> bool {
        let (width, height) = self.pixels.dimensions();
        is_region_white(&self.pixels, ImageRegion::full_image(width, height), check)
    }

    /// Whether `other` shows a different textbox rather than the same one with
    /// a few more characters. The changed-pixel threshold grows with scale squared.
    pub fn differs_from(&self, other: &TextCapture, thresholds: &ClassifierThresholds) -> bool {
        if self.pixels.dimensions() != other.pixels.dimensions() {
            return true;
        }
        let delta = thresholds.diff_delta;
        let changed = self
            .pixels
            .pixels()
            .zip(other.pixels.pixels())
            .filter(|(a, b)| a.0.iter().zip(b.0.iter()).any(|(x, y)| x.abs_diff(*y) > delta))
            .count();
        changed as f64 > thresholds.diff_pixels * self.scale * self.scale
    }

    /// Grayscale text region resampled to native resolution.
    pub fn rectify(&self) -> GrayImage {
        if self.pixels.width() == 0 || self.pixels.height() == 0 {
            return GrayImage::from_pixel(self.native_width, self.native_height, Luma([255]));
        }
        let gray = imageops::grayscale(&self.pixels);
        if gray.dimensions() == (self.native_width, self.native_height) {
            return gray;
        }
        sample_nearest(&gray, self.native_width, self.native_height)
    }
}

/// Nearest-neighbour resampling that reads each destination pixel from the
/// centre of its source cell, so nearest-upscaled recordings map back exactly.
fn sample_nearest(source: &GrayImage, width: u32, height: u32) -> GrayImage {
    let x_ratio = f64::from(source.width()) / f64::from(width);
    let y_ratio = f64::from(source.height()) / f64::from(height);
    GrayImage::from_fn(width, height, |x, y| {
        let sx = ((f64::from(x) + 0.5) * x_ratio) as u32;
        let sy = ((f64::from(y) + 0.5) * y_ratio) as u32;
        *source.get_pixel(
            sx.min(source.width() - 1),
            sy.min(source.height() - 1),
        )
    })
}

/// Rows `top..top + height` of a rectified text region, padded with white when short.
pub fn text_line(rectified: &GrayImage, top: u32, height: u32) -> GrayImage {
    let mut line = GrayImage::from_pixel(rectified.width(), height, Luma([255]));
    for y in 0..height {
        for x in 0..rectified.width() {
            if let Some(pixel) = rectified.get_pixel_checked(x, top + y) {
                line.put_pixel(x, y, *pixel);
            }
        }
    }
    line
}
