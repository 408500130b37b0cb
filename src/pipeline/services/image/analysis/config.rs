use super::core::{ImageRegion, WhitenessCheck};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Per-title coordinate table, in native top-screen pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameProfile {
    pub id: String,
    pub name: String,
    pub line1_y: u32,
    pub line2_y: u32,
    pub char_height: u32,
    pub big_char_height: u32,
    pub text_x: u32,
    pub text_region_width: u32,
    pub text_region_height: u32,
    /// Minimum mean brightness of a captured line before it is treated as textbox content.
    pub validity_threshold: u8,
    #[serde(default)]
    pub geometry: TextboxGeometry,
}

/// Strip positions probed by the textbox classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextboxGeometry {
    pub strip_x: u32,
    pub strip_width: u32,
    pub bottom_strip_y: u32,
    pub extra_bottom_y: u32,
    pub extra_bottom_height: u32,
    pub gap_y: u32,
    /// Gap positions during scroll phases 1, 2 and 3.
    pub scroll_gap_ys: [u32; 3],
    pub top_strip_y: u32,
    pub border_width: u32,
    pub box_top: u32,
    pub border_check: WhitenessCheck,
    pub gap_check: WhitenessCheck,
    pub empty_check: WhitenessCheck,
}

impl Default for TextboxGeometry {
    fn default() -> Self {
        Self {
            strip_x: 28,
            strip_width: 166,
            bottom_strip_y: 183,
            extra_bottom_y: 182,
            extra_bottom_height: 2,
            gap_y: 168,
            scroll_gap_ys: [164, 160, 156],
            top_strip_y: 152,
            border_width: 8,
            box_top: 144,
            border_check: WhitenessCheck::BORDER,
            gap_check: WhitenessCheck::GAP,
            empty_check: WhitenessCheck::EMPTY,
        }
    }
}

impl TextboxGeometry {
    pub fn strip(&self, y: u32, height: u32) -> ImageRegion {
        ImageRegion::new(self.strip_x, y, self.strip_width, height)
    }
}

/// Thresholds for deciding that a textbox was replaced rather than extended.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassifierThresholds {
    /// Per-channel absolute difference above which a pixel counts as changed.
    pub diff_delta: u8,
    /// Changed-pixel count at native scale; multiplied by scale squared.
    pub diff_pixels: f64,
}

impl Default for ClassifierThresholds {
    fn default() -> Self {
        Self {
            diff_delta: 50,
            diff_pixels: 300.0,
        }
    }
}

impl GameProfile {
    pub fn diamond_pearl() -> Self {
        Self {
            id: "diamond_pearl".to_string(),
            name: "Pokemon Diamond/Pearl".to_string(),
            line1_y: 152,
            line2_y: 168,
            char_height: 15,
            big_char_height: 30,
            text_x: 14,
            text_region_width: 232,
            text_region_height: 33,
            validity_threshold: 200,
            geometry: TextboxGeometry::default(),
        }
    }

    pub fn platinum() -> Self {
        Self {
            id: "platinum".to_string(),
            name: "Pokemon Platinum".to_string(),
            text_x: 13,
            text_region_width: 220,
            ..Self::diamond_pearl()
        }
    }

    pub fn hgss() -> Self {
        Self {
            id: "hgss".to_string(),
            name: "Pokemon HeartGold/SoulSilver".to_string(),
            text_x: 8,
            text_region_width: 248,
            validity_threshold: 150,
            ..Self::diamond_pearl()
        }
    }

    pub fn builtin() -> Vec<Self> {
        vec![Self::diamond_pearl(), Self::platinum(), Self::hgss()]
    }

    pub fn by_id(id: &str) -> Result<Self, ConfigError> {
        let normalized = id.trim().to_ascii_lowercase().replace('-', "_");
        let alias = match normalized.as_str() {
            "dp" | "diamond" | "pearl" => "diamond_pearl",
            "pt" => "platinum",
            "heartgold" | "soulsilver" => "hgss",
            other => other,
        };
        Self::builtin()
            .into_iter()
            .find(|profile| profile.id == alias)
            .ok_or_else(|| ConfigError::UnknownGame(id.to_string()))
    }

    /// Native region holding both text lines.
    pub fn text_region(&self) -> ImageRegion {
        ImageRegion::new(
            self.text_x,
            self.line1_y,
            self.text_region_width,
            self.text_region_height,
        )
    }

    /// Row of the second line inside the text region.
    pub fn line2_offset(&self) -> u32 {
        self.line2_y.saturating_sub(self.line1_y)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.line2_y <= self.line1_y {
            return Err(ConfigError::Invalid(format!(
                "profile {}: line2_y ({}) must be below line1_y ({})",
                self.id, self.line2_y, self.line1_y
            )));
        }
        if self.line2_offset() + self.char_height > self.text_region_height {
            return Err(ConfigError::Invalid(format!(
                "profile {}: second line does not fit in a {}px text region",
                self.id, self.text_region_height
            )));
        }
        if self.big_char_height > self.text_region_height {
            return Err(ConfigError::Invalid(format!(
                "profile {}: big text height {} exceeds the text region",
                self.id, self.big_char_height
            )));
        }
        if self.text_x + self.text_region_width > crate::pipeline::types::DS_WIDTH {
            return Err(ConfigError::Invalid(format!(
                "profile {}: text region overflows the screen width",
                self.id
            )));
        }
        Ok(())
    }
}
