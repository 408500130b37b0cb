use serde::Serialize;

/// Marker emitted for a glyph region that no template matched.
pub const UNKNOWN_GLYPH: char = '\u{FFFD}';

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecognizedGlyph {
    pub glyph: char,
    /// Left edge of the glyph cell in native pixels.
    pub x: u32,
    pub width: u32,
    pub confidence: f32,
}

/// Ordered glyphs read from one text line.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecognizedLine {
    pub glyphs: Vec<RecognizedGlyph>,
}

impl RecognizedLine {
    pub fn new(glyphs: Vec<RecognizedGlyph>) -> Self {
        Self { glyphs }
    }

    /// Builds a line from plain text, as returned by an external OCR engine.
    pub fn from_text(text: &str) -> Self {
        let glyphs = text
            .chars()
            .filter(|c| *c != '\n' && *c != '\r')
            .enumerate()
            .map(|(i, glyph)| RecognizedGlyph {
                glyph,
                x: i as u32,
                width: 1,
                confidence: 1.0,
            })
            .collect();
        Self { glyphs }
    }

    pub fn push(&mut self, glyph: RecognizedGlyph) {
        self.glyphs.push(glyph);
    }

    pub fn text(&self) -> String {
        self.glyphs.iter().map(|g| g.glyph).collect()
    }

    /// Text with leading and trailing whitespace removed; internal spacing is kept.
    pub fn stripped_text(&self) -> String {
        self.text().trim().to_string()
    }

    /// Number of characters after stripping, spaces included.
    pub fn len(&self) -> usize {
        self.stripped_text().chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn unknown_count(&self) -> usize {
        self.glyphs
            .iter()
            .filter(|g| g.glyph == UNKNOWN_GLYPH)
            .count()
    }

    pub fn mean_confidence(&self) -> f32 {
        let scored: Vec<f32> = self
            .glyphs
            .iter()
            .filter(|g| !g.glyph.is_whitespace())
            .map(|g| g.confidence)
            .collect();
        if scored.is_empty() {
            return 0.0;
        }
        scored.iter().sum::<f32>() / scored.len() as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stripping_keeps_internal_spaces() {
        let line = RecognizedLine::from_text("  Hello  there ");
        assert_eq!(line.stripped_text(), "Hello  there");
        assert_eq!(line.len(), 12);
    }

    #[test]
    fn unknown_glyphs_are_counted() {
        let mut line = RecognizedLine::from_text("ab");
        line.push(RecognizedGlyph {
            glyph: UNKNOWN_GLYPH,
            x: 10,
            width: 5,
            confidence: 0.3,
        });
        assert_eq!(line.unknown_count(), 1);
        assert_eq!(line.text(), "ab\u{FFFD}");
    }

    #[test]
    fn engine_text_drops_line_breaks() {
        let line = RecognizedLine::from_text("Hi!\n");
        assert_eq!(line.text(), "Hi!");
        assert!(!line.is_empty());
        assert!(RecognizedLine::default().is_empty());
    }
}
