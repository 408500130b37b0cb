use super::font;
use super::templates::{CharacterTemplate, GlyphScale, TemplateLibrary};
use crate::error::RecognitionError;
use crate::pipeline::types::{RecognizedGlyph, RecognizedLine, UNKNOWN_GLYPH};
use image::GrayImage;
use std::sync::Arc;

/// Turns a rectified text line into characters.
pub trait LineRecognizer: Send + Sync {
    fn recognize(
        &self,
        line: &GrayImage,
        scale: GlyphScale,
    ) -> Result<RecognizedLine, RecognitionError>;
    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecognizerSettings {
    pub match_threshold: f32,
    /// Stretched glyphs correlate worse, so big text gets a looser threshold.
    pub big_match_threshold: f32,
    /// A column is ink when its darkest pixel is below this.
    pub darkness_threshold: u8,
    /// A column is background when its darkest pixel is above this.
    pub space_threshold: u8,
    /// Scores this close count as a tie.
    pub tie_margin: f32,
}

impl Default for RecognizerSettings {
    fn default() -> Self {
        Self {
            match_threshold: 0.90,
            big_match_threshold: 0.80,
            darkness_threshold: 120,
            space_threshold: 245,
            tie_margin: 0.001,
        }
    }
}

impl RecognizerSettings {
    pub fn threshold(&self, scale: GlyphScale) -> f32 {
        match scale {
            GlyphScale::Normal => self.match_threshold,
            GlyphScale::Stretched => self.big_match_threshold,
        }
    }
}

/// Sliding-window matcher over a fixed-font template library.
pub struct TemplateRecognizer {
    library: Arc<TemplateLibrary>,
    settings: RecognizerSettings,
}

impl TemplateRecognizer {
    pub fn new(library: Arc<TemplateLibrary>) -> Self {
        Self {
            library,
            settings: RecognizerSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: RecognizerSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn library(&self) -> &TemplateLibrary {
        &self.library
    }

    pub fn read_line(&self, line: &GrayImage, scale: GlyphScale) -> RecognizedLine {
        let templates: Vec<&CharacterTemplate> = self
            .library
            .templates(scale)
            .filter(|t| t.is_matchable())
            .collect();
        let narrowest = self.library.narrowest_width(scale);
        let space_width = self.library.space_width().max(1);
        let threshold = self.settings.threshold(scale);
        let width = line.width();

        let mut out = RecognizedLine::default();
        let mut cursor = 0u32;
        let mut x = 0u32;
        while x < width {
            if column_min(line, x) >= self.settings.darkness_threshold {
                x += 1;
                continue;
            }

            let gap = x.saturating_sub(cursor);
            if !out.glyphs.is_empty()
                && gap > narrowest
                && (cursor..x).all(|c| column_min(line, c) > self.settings.space_threshold)
            {
                for i in 0..(gap / space_width).max(1) {
                    out.push(RecognizedGlyph {
                        glyph: ' ',
                        x: cursor + i * space_width,
                        width: space_width,
                        confidence: 1.0,
                    });
                }
            }

            match self.best_match(&templates, line, x) {
                Some((template, score)) if score >= threshold => {
                    let left = i64::from(x) - i64::from(template.ink_offset().unwrap_or(0));
                    let end = left + i64::from(template.width());
                    out.push(RecognizedGlyph {
                        glyph: template.glyph(),
                        x: left.max(0) as u32,
                        width: template.width(),
                        confidence: score,
                    });
                    cursor = end.max(i64::from(x) + 1) as u32;
                }
                best => {
                    out.push(RecognizedGlyph {
                        glyph: UNKNOWN_GLYPH,
                        x,
                        width: font::DEFAULT_WIDTH,
                        confidence: best.map(|(_, score)| score).unwrap_or(0.0),
                    });
                    cursor = x + font::DEFAULT_WIDTH;
                }
            }
            x = cursor;
        }
        out
    }

    /// Highest scoring template aligned on its first ink column at `x`.
    /// Near ties prefer letters and digits over symbols, then the wider glyph.
    fn best_match<'a>(
        &self,
        templates: &[&'a CharacterTemplate],
        line: &GrayImage,
        x: u32,
    ) -> Option<(&'a CharacterTemplate, f32)> {
        let margin = self.settings.tie_margin;
        let mut best: Option<(&'a CharacterTemplate, f32)> = None;
        for &template in templates {
            let left = i64::from(x) - i64::from(template.ink_offset().unwrap_or(0));
            let score = template.correlate(line, left);
            best = match best {
                None => Some((template, score)),
                Some((current, current_score)) => {
                    if score > current_score + margin
                        || ((score - current_score).abs() <= margin && preferred(template, current))
                    {
                        Some((template, score))
                    } else {
                        Some((current, current_score))
                    }
                }
            };
        }
        best
    }
}

impl LineRecognizer for TemplateRecognizer {
    fn recognize(
        &self,
        line: &GrayImage,
        scale: GlyphScale,
    ) -> Result<RecognizedLine, RecognitionError> {
        Ok(self.read_line(line, scale))
    }

    fn name(&self) -> &'static str {
        "template"
    }
}

fn preferred(candidate: &CharacterTemplate, current: &CharacterTemplate) -> bool {
    let candidate_alnum = candidate.glyph().is_alphanumeric();
    let current_alnum = current.glyph().is_alphanumeric();
    if candidate_alnum != current_alnum {
        return candidate_alnum;
    }
    candidate.width() > current.width()
}

fn column_min(line: &GrayImage, x: u32) -> u8 {
    (0..line.height())
        .filter_map(|y| line.get_pixel_checked(x, y))
        .map(|p| p.0[0])
        .min()
        .unwrap_or(255)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{render_line, synthetic_library, synthetic_library_without};

    fn recognizer() -> TemplateRecognizer {
        TemplateRecognizer::new(Arc::new(synthetic_library()))
    }

    #[test]
    fn every_glyph_round_trips() {
        let recognizer = recognizer();
        let library = recognizer.library();
        let glyphs: String = library.glyphs().filter(|c| !c.is_whitespace()).collect();
        for chunk in glyphs.chars().collect::<Vec<_>>().chunks(20) {
            let text: String = chunk.iter().collect();
            let line = render_line(library, &text, GlyphScale::Normal);
            let read = recognizer.read_line(&line, GlyphScale::Normal);
            assert_eq!(read.text(), text);
            assert!(read.glyphs.iter().all(|g| g.confidence > 0.999));
        }
    }

    #[test]
    fn spaces_between_words_are_preserved() {
        let recognizer = recognizer();
        let text = "Hello there, how are you?";
        let line = render_line(recognizer.library(), text, GlyphScale::Normal);
        assert_eq!(recognizer.read_line(&line, GlyphScale::Normal).text(), text);

        let double = "Wait  what";
        let line = render_line(recognizer.library(), double, GlyphScale::Normal);
        assert_eq!(recognizer.read_line(&line, GlyphScale::Normal).text(), double);
    }

    #[test]
    fn big_text_reads_like_normal_text() {
        let recognizer = recognizer();
        let text = "Ho ho! 42 Pokemon.";
        let normal = render_line(recognizer.library(), text, GlyphScale::Normal);
        let big = render_line(recognizer.library(), text, GlyphScale::Stretched);
        let from_normal = recognizer.read_line(&normal, GlyphScale::Normal).text();
        let from_big = recognizer.read_line(&big, GlyphScale::Stretched).text();
        assert_eq!(from_big, text);
        assert_eq!(from_big, from_normal);
    }

    #[test]
    fn unknown_glyph_becomes_marker_and_scan_continues() {
        let full = synthetic_library();
        let line = render_line(&full, "ZOO", GlyphScale::Normal);
        let partial = TemplateRecognizer::new(Arc::new(synthetic_library_without('Z')));
        let read = partial.read_line(&line, GlyphScale::Normal);
        assert_eq!(read.text(), "\u{FFFD}OO");
        assert_eq!(read.unknown_count(), 1);
    }

    #[test]
    fn blank_line_reads_as_empty() {
        let line = GrayImage::from_pixel(232, 15, image::Luma([255]));
        assert!(recognizer().read_line(&line, GlyphScale::Normal).is_empty());
    }

    #[test]
    fn thresholds_depend_on_scale() {
        let settings = RecognizerSettings::default();
        assert_eq!(settings.threshold(GlyphScale::Normal), 0.90);
        assert_eq!(settings.threshold(GlyphScale::Stretched), 0.80);
    }
}
