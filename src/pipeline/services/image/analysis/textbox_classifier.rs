use super::config::TextboxGeometry;
use super::core::{is_region_white, ImageRegion};
use crate::common::frame::Frame;
use crate::pipeline::types::{ScreenLayout, TextboxState, DS_HEIGHT, DS_WIDTH};
use image::RgbImage;
use tracing::warn;

/// Whiteness of every strip the classifier looks at, in one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StripReadings {
    pub bottom: bool,
    pub left_border: bool,
    pub right_border: bool,
    pub gap: bool,
    pub top: bool,
    pub extra_bottom: bool,
    pub scroll_gaps: [bool; 3],
}

/// A reading that matches no rendering phase of the textbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StripAnomaly {
    /// The line gap is white but the strip above line 1 is not.
    GapWithoutTop,
    /// A shifted gap is white while the strip under the text is not.
    InconsistentScrollGaps,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub state: TextboxState,
    pub readings: StripReadings,
    pub anomaly: Option<StripAnomaly>,
}

/// Classifies the dialogue textbox from thin strips of the top screen.
#[derive(Debug, Clone)]
pub struct TextboxClassifier {
    geometry: TextboxGeometry,
}

impl TextboxClassifier {
    pub fn new(geometry: TextboxGeometry) -> Self {
        Self { geometry }
    }

    pub fn geometry(&self) -> &TextboxGeometry {
        &self.geometry
    }

    pub fn classify(&self, frame: &Frame, layout: &ScreenLayout) -> Classification {
        let classification = self.classify_image(frame.image(), layout);
        if let Some(anomaly) = classification.anomaly {
            warn!(
                "Frame {}: inconsistent textbox strips ({:?}), treating as closed",
                frame.index(),
                anomaly
            );
        }
        classification
    }

    pub fn classify_image(&self, image: &RgbImage, layout: &ScreenLayout) -> Classification {
        let readings = self.read_strips(image, layout);
        let (state, anomaly) = decide(&readings);
        Classification {
            state,
            readings,
            anomaly,
        }
    }

    pub fn read_strips(&self, image: &RgbImage, layout: &ScreenLayout) -> StripReadings {
        let g = &self.geometry;
        let white = |native: ImageRegion, check| is_region_white(image, layout.project(native), check);
        let border_height = DS_HEIGHT.saturating_sub(g.box_top);

        StripReadings {
            bottom: white(g.strip(g.bottom_strip_y, 1), g.border_check),
            left_border: white(
                ImageRegion::new(0, g.box_top, g.border_width, border_height),
                g.border_check,
            ),
            right_border: white(
                ImageRegion::new(
                    DS_WIDTH - g.border_width,
                    g.box_top,
                    g.border_width,
                    border_height,
                ),
                g.border_check,
            ),
            gap: white(g.strip(g.gap_y, 1), g.gap_check),
            top: white(g.strip(g.top_strip_y, 1), g.gap_check),
            extra_bottom: white(
                g.strip(g.extra_bottom_y, g.extra_bottom_height),
                g.gap_check,
            ),
            scroll_gaps: g.scroll_gap_ys.map(|y| white(g.strip(y, 1), g.gap_check)),
        }
    }
}

impl Default for TextboxClassifier {
    fn default() -> Self {
        Self::new(TextboxGeometry::default())
    }
}

/// Applies the strip precedence order. When several shifted gaps read white,
/// the earliest scroll phase wins.
pub fn decide(r: &StripReadings) -> (TextboxState, Option<StripAnomaly>) {
    if !r.bottom {
        return (TextboxState::Closed, None);
    }
    if r.left_border || r.right_border {
        return (TextboxState::Closed, None);
    }
    if r.gap {
        return if r.top {
            (TextboxState::Open, None)
        } else {
            (TextboxState::Closed, Some(StripAnomaly::GapWithoutTop))
        };
    }

    let [gap1, gap2, gap3] = r.scroll_gaps;
    if r.extra_bottom && gap1 {
        (TextboxState::Scroll1, None)
    } else if r.extra_bottom && gap2 {
        (TextboxState::Scroll2, None)
    } else if r.extra_bottom && gap3 {
        (TextboxState::Scroll3, None)
    } else if !gap1 && !gap2 && !gap3 {
        if r.top {
            (TextboxState::BigText, None)
        } else {
            (TextboxState::Closed, None)
        }
    } else {
        (
            TextboxState::Closed,
            Some(StripAnomaly::InconsistentScrollGaps),
        )
    }
}
