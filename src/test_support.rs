//! Synthetic DS frames and a deterministic glyph set for tests.

use crate::common::frame::Frame;
use crate::pipeline::services::recognition::font::{self, CHAR_HEIGHT};
use crate::pipeline::services::recognition::{GlyphScale, TemplateLibrary};
use crate::pipeline::types::{DS_HEIGHT, DS_WIDTH};
use image::{imageops, GrayImage, Luma, Rgb, RgbImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const INK: u8 = 80;
pub const SCENE: Rgb<u8> = Rgb([48, 96, 64]);
pub const BORDER: Rgb<u8> = Rgb([72, 104, 168]);
pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
pub const TEXT_X: u32 = 14;

const GLYPHS: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789.,!?'- ";

/// Deterministic bitmap for `glyph`: a full-height stem in column 0, random
/// interior columns that never touch row 2, and a blank last column.
pub fn glyph_bitmap(glyph: char) -> GrayImage {
    let width = font::glyph_width(glyph);
    let mut bitmap = GrayImage::from_pixel(width, CHAR_HEIGHT, Luma([255]));
    if glyph == ' ' {
        return bitmap;
    }
    for y in 2..=12 {
        bitmap.put_pixel(0, y, Luma([INK]));
    }
    let mut rng = StdRng::seed_from_u64(u64::from(u32::from(glyph)) * 7919 + 17);
    for x in 1..width.saturating_sub(1) {
        let mut inked = 0;
        for y in 3..=12 {
            if rng.random_bool(0.5) {
                bitmap.put_pixel(x, y, Luma([INK]));
                inked += 1;
            }
        }
        if inked < 2 {
            bitmap.put_pixel(x, 4 + x % 3, Luma([INK]));
            bitmap.put_pixel(x, 10 - x % 3, Luma([INK]));
        }
    }
    bitmap
}

pub fn synthetic_library() -> TemplateLibrary {
    synthetic_library_filtered(|_| true)
}

pub fn synthetic_library_without(missing: char) -> TemplateLibrary {
    synthetic_library_filtered(|c| c != missing)
}

fn synthetic_library_filtered(keep: impl Fn(char) -> bool) -> TemplateLibrary {
    let bitmaps = GLYPHS
        .chars()
        .filter(|c| keep(*c))
        .map(|c| (c, glyph_bitmap(c)));
    TemplateLibrary::from_bitmaps(bitmaps, 120).expect("synthetic glyphs form a library")
}

/// Draws `text` the way the game lays out a line: glyph after glyph, each
/// advancing by its width.
pub fn render_line(library: &TemplateLibrary, text: &str, scale: GlyphScale) -> GrayImage {
    let height = match scale {
        GlyphScale::Normal => CHAR_HEIGHT,
        GlyphScale::Stretched => CHAR_HEIGHT * 2,
    };
    let advances: Vec<(char, u32)> = text
        .chars()
        .map(|c| {
            let width = library
                .entry_for(c)
                .map(|e| e.get(scale).width())
                .unwrap_or_else(|| font::glyph_width(c));
            (c, width)
        })
        .collect();
    let total: u32 = advances.iter().map(|(_, w)| w).sum();
    let mut line = GrayImage::from_pixel(total.max(1), height, Luma([255]));
    let mut x = 0;
    for (c, width) in advances {
        if let Some(entry) = library.entry_for(c) {
            imageops::replace(&mut line, entry.get(scale).bitmap(), i64::from(x), 0);
        }
        x += width;
    }
    line
}

/// Builder for a native-resolution top screen.
#[derive(Default, Clone)]
pub struct SyntheticScreen {
    textbox: bool,
    lines: Option<(GrayImage, GrayImage)>,
    big: Option<GrayImage>,
    scroll_phase: u32,
}

impl SyntheticScreen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_textbox(mut self) -> Self {
        self.textbox = true;
        self
    }

    pub fn with_lines(mut self, library: &TemplateLibrary, line1: &str, line2: &str) -> Self {
        self.lines = Some((
            render_line(library, line1, GlyphScale::Normal),
            render_line(library, line2, GlyphScale::Normal),
        ));
        self
    }

    pub fn with_big_text(mut self, library: &TemplateLibrary, text: &str) -> Self {
        self.big = Some(render_line(library, text, GlyphScale::Stretched));
        self
    }

    /// Shifts both lines up by four pixels per phase, as the scroll animation does.
    pub fn with_scroll_phase(mut self, phase: u32) -> Self {
        self.scroll_phase = phase;
        self
    }

    pub fn render(&self) -> RgbImage {
        let mut screen = RgbImage::from_pixel(DS_WIDTH, DS_HEIGHT, SCENE);
        if !self.textbox {
            return screen;
        }
        for y in 144..DS_HEIGHT {
            for x in 0..DS_WIDTH {
                let interior = (8..248).contains(&x) && (148..188).contains(&y);
                screen.put_pixel(x, y, if interior { WHITE } else { BORDER });
            }
        }
        let shift = 4 * self.scroll_phase as i64;
        if let Some((line1, line2)) = &self.lines {
            draw_ink(&mut screen, line1, 152 - shift);
            draw_ink(&mut screen, line2, 168 - shift);
        }
        if let Some(big) = &self.big {
            draw_ink(&mut screen, big, 152);
        }
        screen
    }
}

/// Copies the dark pixels of `line` into the textbox interior.
fn draw_ink(screen: &mut RgbImage, line: &GrayImage, top: i64) {
    for (x, y, pixel) in line.enumerate_pixels() {
        let value = pixel.0[0];
        if value == 255 {
            continue;
        }
        let sx = i64::from(TEXT_X + x);
        let sy = top + i64::from(y);
        if (8..248).contains(&sx) && (148..188).contains(&sy) {
            screen.put_pixel(sx as u32, sy as u32, Rgb([value, value, value]));
        }
    }
}

/// Nearest-neighbour enlargement in which every source pixel covers a block of
/// `floor` mapped destination pixels.
pub fn upscale(screen: &RgbImage, scale: f64) -> RgbImage {
    let width = (f64::from(screen.width()) * scale).round() as u32;
    let height = (f64::from(screen.height()) * scale).round() as u32;
    RgbImage::from_fn(width, height, |x, y| {
        let sx = ((f64::from(x) / scale) as u32).min(screen.width() - 1);
        let sy = ((f64::from(y) / scale) as u32).min(screen.height() - 1);
        *screen.get_pixel(sx, sy)
    })
}

pub fn place_screen(frame: &mut RgbImage, screen: &RgbImage, x: u32, y: u32) {
    imageops::replace(frame, screen, i64::from(x), i64::from(y));
}

/// Wraps native screens as consecutive frames starting at index 0.
pub fn frames(screens: &[RgbImage]) -> Vec<Frame> {
    screens
        .iter()
        .enumerate()
        .map(|(i, screen)| Frame::new(i as u64, screen.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glyph_bitmaps_are_deterministic_and_distinct() {
        assert_eq!(glyph_bitmap('a'), glyph_bitmap('a'));
        assert_ne!(glyph_bitmap('a'), glyph_bitmap('b'));
        assert_eq!(glyph_bitmap('m').width(), 7);
        assert!(glyph_bitmap(' ').pixels().all(|p| p.0[0] == 255));
    }

    #[test]
    fn upscale_covers_whole_pixels() {
        let screen = SyntheticScreen::new().with_textbox().render();
        let doubled = upscale(&screen, 2.0);
        assert_eq!(doubled.dimensions(), (512, 384));
        assert_eq!(doubled.get_pixel(17, 301), screen.get_pixel(8, 150));
    }
}
