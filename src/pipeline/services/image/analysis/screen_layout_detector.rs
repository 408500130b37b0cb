use super::config::TextboxGeometry;
use super::textbox_classifier::TextboxClassifier;
use crate::error::LayoutError;
use crate::pipeline::types::{ScreenLayout, ScreenPosition, TextboxState, DS_HEIGHT, DS_WIDTH};
use image::RgbImage;
use tracing::debug;

const NATIVE_ASPECT: f64 = DS_WIDTH as f64 / DS_HEIGHT as f64;

/// Locates the top screen inside recorded frames.
///
/// Single-screen recordings must be close to 4:3. Wider frames are treated as
/// side-by-side recordings sized by frame height, taller frames as stacked
/// recordings sized by frame width.
#[derive(Debug, Clone)]
pub struct ScreenLayoutDetector {
    aspect_tolerance: f64,
    side_by_side_min_aspect: f64,
    stacked_min_aspect: f64,
    boundary_search: u32,
    min_offset: u32,
    geometry: TextboxGeometry,
}

impl ScreenLayoutDetector {
    pub fn new() -> Self {
        Self {
            aspect_tolerance: 0.05,
            side_by_side_min_aspect: 1.5,
            stacked_min_aspect: 1.45,
            boundary_search: 100,
            min_offset: 10,
            geometry: TextboxGeometry::default(),
        }
    }

    pub fn with_aspect_tolerance(mut self, tolerance: f64) -> Self {
        self.aspect_tolerance = tolerance;
        self
    }

    /// Half-width of the window searched for a screen edge displaced by overlays.
    pub fn with_boundary_search(mut self, pixels: u32) -> Self {
        self.boundary_search = pixels;
        self
    }

    /// Textbox strips used to tell equally sized side-by-side screens apart.
    pub fn with_geometry(mut self, geometry: TextboxGeometry) -> Self {
        self.geometry = geometry;
        self
    }

    /// Derives the layout from the probe frames. Frames whose size differs from
    /// the first one are ignored.
    pub fn detect(&self, frames: &[&RgbImage]) -> Result<ScreenLayout, LayoutError> {
        let first = frames
            .first()
            .ok_or_else(|| LayoutError::LayoutDetectionFailed {
                width: 0,
                height: 0,
                reason: "no frames to probe".to_string(),
            })?;
        let (width, height) = first.dimensions();
        if width == 0 || height == 0 {
            return Err(fail(width, height, "empty frame"));
        }
        let probes: Vec<&RgbImage> = frames
            .iter()
            .copied()
            .filter(|f| f.dimensions() == (width, height))
            .collect();

        let aspect = f64::from(width) / f64::from(height);
        let layout = if (aspect / NATIVE_ASPECT - 1.0).abs() <= self.aspect_tolerance {
            self.single_screen(width, height)
        } else if aspect >= self.side_by_side_min_aspect {
            self.side_by_side(&probes, width, height)?
        } else if f64::from(height) / f64::from(width) >= self.stacked_min_aspect {
            self.stacked(width, height)?
        } else {
            return Err(fail(
                width,
                height,
                &format!("aspect ratio {:.3} matches no known screen arrangement", aspect),
            ));
        };

        if !layout.is_consistent() {
            return Err(fail(width, height, "top screen does not fit inside the frame"));
        }
        debug!(
            "Detected {} top screen at {:?}, {}x{}, scale {:.3}",
            layout.position, layout.origin, layout.width, layout.height, layout.scale
        );
        Ok(layout)
    }

    fn single_screen(&self, width: u32, height: u32) -> ScreenLayout {
        let scale = (f64::from(width) / f64::from(DS_WIDTH))
            .min(f64::from(height) / f64::from(DS_HEIGHT));
        let mut layout = ScreenLayout::new(ScreenPosition::Full, (0, 0), scale, (width, height));
        layout.origin = (
            width.saturating_sub(layout.width) / 2,
            height.saturating_sub(layout.height) / 2,
        );
        layout
    }

    fn stacked(&self, width: u32, height: u32) -> Result<ScreenLayout, LayoutError> {
        let scale = f64::from(width) / f64::from(DS_WIDTH);
        let layout = ScreenLayout::new(ScreenPosition::Top, (0, 0), scale, (width, height));
        if layout.height * 2 > height + 1 {
            return Err(fail(width, height, "stacked frame is too short for two screens"));
        }
        Ok(layout)
    }

    fn side_by_side(
        &self,
        probes: &[&RgbImage],
        width: u32,
        height: u32,
    ) -> Result<ScreenLayout, LayoutError> {
        let scale = f64::from(height) / f64::from(DS_HEIGHT);
        let top_width = (f64::from(DS_WIDTH) * scale).round() as u32;
        if top_width > width {
            return Err(fail(width, height, "top screen is wider than the frame"));
        }
        let touch_width = width - top_width;
        if touch_width > top_width {
            return Err(fail(
                width,
                height,
                "frame is too wide for a side-by-side recording",
            ));
        }

        let profile = column_edge_profile(probes);
        let right_boundary = touch_width;
        let left_boundary = top_width;
        let right_edge = peak_near(&profile, right_boundary, 2);
        let left_edge = peak_near(&profile, left_boundary, 2);
        let position = if left_boundary == right_boundary {
            // Both screens share the middle edge, so only their content differs.
            self.textbox_side(probes, scale, width, height, top_width)
        } else if left_edge > right_edge {
            ScreenPosition::Left
        } else {
            ScreenPosition::Right
        };

        let nominal_x = match position {
            ScreenPosition::Left => 0,
            _ => right_boundary,
        };
        let boundary = match position {
            ScreenPosition::Left => left_boundary,
            _ => right_boundary,
        };
        let origin_x = match self.displaced_boundary(&profile, boundary) {
            Some(edge) => {
                let candidate = match position {
                    ScreenPosition::Left => edge.checked_sub(top_width),
                    _ => Some(edge),
                };
                match candidate {
                    Some(x) if x + top_width <= width => {
                        debug!(
                            "Screen boundary displaced from {} to {}, likely an overlay",
                            boundary, edge
                        );
                        x
                    }
                    _ => nominal_x,
                }
            }
            None => nominal_x,
        };

        Ok(ScreenLayout::new(position, (origin_x, 0), scale, (width, height)))
    }

    /// Picks the half in which more probe frames show an open textbox. Ties go right.
    fn textbox_side(
        &self,
        probes: &[&RgbImage],
        scale: f64,
        width: u32,
        height: u32,
        top_width: u32,
    ) -> ScreenPosition {
        let classifier = TextboxClassifier::new(self.geometry.clone());
        let votes = |position: ScreenPosition, origin_x: u32| {
            let layout = ScreenLayout::new(position, (origin_x, 0), scale, (width, height));
            probes
                .iter()
                .filter(|probe| {
                    classifier.classify_image(probe, &layout).state != TextboxState::Closed
                })
                .count()
        };
        let left = votes(ScreenPosition::Left, 0);
        let right = votes(ScreenPosition::Right, width - top_width);
        debug!(
            "Equal side-by-side screens, textbox seen {} time(s) on the left and {} on the right",
            left, right
        );
        if left > right {
            ScreenPosition::Left
        } else {
            ScreenPosition::Right
        }
    }

    /// Strongest edge near `boundary` when it is both dominant and away from the nominal column.
    fn displaced_boundary(&self, profile: &[f64], boundary: u32) -> Option<u32> {
        let global_max = profile.iter().cloned().fold(0.0, f64::max);
        if global_max <= 0.0 {
            return None;
        }
        let start = boundary.saturating_sub(self.boundary_search) as usize;
        let end = ((boundary + self.boundary_search) as usize).min(profile.len());
        let (best_x, best_val) = profile
            .get(start..end)?
            .iter()
            .enumerate()
            .fold((0usize, 0.0f64), |acc, (i, &v)| if v > acc.1 { (i, v) } else { acc });
        let edge = (start + best_x) as u32;
        if best_val > global_max * 0.5 && edge.abs_diff(boundary) > self.min_offset {
            Some(edge)
        } else {
            None
        }
    }
}

impl Default for ScreenLayoutDetector {
    fn default() -> Self {
        Self::new()
    }
}

fn fail(width: u32, height: u32, reason: &str) -> LayoutError {
    LayoutError::LayoutDetectionFailed {
        width,
        height,
        reason: reason.to_string(),
    }
}

/// Summed absolute luma difference between each column and its left neighbour.
fn column_edge_profile(frames: &[&RgbImage]) -> Vec<f64> {
    let Some(first) = frames.first() else {
        return Vec::new();
    };
    let mut profile = vec![0.0; first.width() as usize];
    for frame in frames {
        let gray = image::imageops::grayscale(*frame);
        for y in 0..gray.height() {
            for x in 1..gray.width() {
                let left = i32::from(gray.get_pixel(x - 1, y).0[0]);
                let here = i32::from(gray.get_pixel(x, y).0[0]);
                profile[x as usize] += f64::from((here - left).abs());
            }
        }
    }
    profile
}

fn peak_near(profile: &[f64], column: u32, radius: u32) -> f64 {
    let start = column.saturating_sub(radius) as usize;
    let end = ((column + radius + 1) as usize).min(profile.len());
    profile
        .get(start..end)
        .map(|window| window.iter().cloned().fold(0.0, f64::max))
        .unwrap_or(0.0)
}
