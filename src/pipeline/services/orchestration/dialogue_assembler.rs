use crate::common::frame::Frame;
use crate::error::RecognitionError;
use crate::pipeline::services::image::analysis::{
    mean_luma, text_line, ClassifierThresholds, GameProfile, TextCapture,
};
use crate::pipeline::services::recognition::{is_garbage_text, GlyphScale, LineRecognizer};
use crate::pipeline::types::{DialogueEntry, ScreenLayout, TextboxState};
use image::GrayImage;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssemblerSettings {
    /// More characters than this in the first open frame marks instant text.
    pub instant_text_min_chars: usize,
    pub discard_garbage: bool,
    pub thresholds: ClassifierThresholds,
}

impl Default for AssemblerSettings {
    fn default() -> Self {
        Self {
            instant_text_min_chars: 3,
            discard_garbage: false,
            thresholds: ClassifierThresholds::default(),
        }
    }
}

/// Where the current box opened, reported in debug output when it ends.
#[derive(Debug, Clone, Copy, Default)]
struct OpeningTrace {
    opened_at: Option<u64>,
    opening_length: usize,
}

/// Cross-frame memory of one session. Only the assembler touches it.
#[derive(Debug, Clone)]
pub struct PipelineState {
    previous: Option<TextCapture>,
    previous_state: TextboxState,
    insta_text: bool,
    only_second_line: bool,
    opening: OpeningTrace,
}

impl Default for PipelineState {
    fn default() -> Self {
        Self {
            previous: None,
            previous_state: TextboxState::Closed,
            insta_text: false,
            only_second_line: false,
            opening: OpeningTrace::default(),
        }
    }
}

impl PipelineState {
    pub fn previous_state(&self) -> TextboxState {
        self.previous_state
    }

    pub fn is_instant_text(&self) -> bool {
        self.insta_text
    }

    pub fn only_second_line(&self) -> bool {
        self.only_second_line
    }
}

/// Turns the per-frame textbox state stream into finished dialogue entries.
pub struct DialogueAssembler {
    profile: GameProfile,
    recognizer: Arc<dyn LineRecognizer>,
    settings: AssemblerSettings,
    state: PipelineState,
}

impl DialogueAssembler {
    pub fn new(profile: GameProfile, recognizer: Arc<dyn LineRecognizer>) -> Self {
        Self {
            profile,
            recognizer,
            settings: AssemblerSettings::default(),
            state: PipelineState::default(),
        }
    }

    pub fn with_settings(mut self, settings: AssemblerSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    pub fn profile(&self) -> &GameProfile {
        &self.profile
    }

    /// Feeds one classified frame. Returns the entry flushed by this
    /// transition, if any. Entries always describe frames before `frame`.
    pub fn process(
        &mut self,
        frame: &Frame,
        layout: &ScreenLayout,
        current: TextboxState,
    ) -> Result<Option<DialogueEntry>, RecognitionError> {
        let capture = TextCapture::capture(frame.image(), layout, &self.profile);
        let previous = self.state.previous_state;
        let index = frame.index();
        let mut emitted = None;

        if previous == TextboxState::Closed && current.is_open_like() {
            self.state.only_second_line = false;
            self.check_opening(&capture, current, index)?;
        } else if previous.is_open_like() {
            if current == TextboxState::Closed {
                if !self.state.insta_text {
                    emitted = self.flush(index, false)?;
                } else {
                    debug!("Frame {}: instant textbox closed, discarded", index);
                }
            } else if current.is_open_like() {
                let replaced = self.state.previous.as_ref().is_some_and(|prev| {
                    prev.differs_from(&capture, &self.settings.thresholds)
                });
                if replaced && !self.state.insta_text {
                    debug!("Frame {}: textbox replaced", index);
                    emitted = self.flush(index, false)?;
                    self.check_opening(&capture, current, index)?;
                } else if replaced {
                    debug!("Frame {}: instant textbox replaced, discarded", index);
                    self.state.insta_text = false;
                }
            } else if current.is_scroll() && !self.state.insta_text {
                debug!("Frame {}: scroll started", index);
                emitted = self.flush(index, true)?;
            }
        } else if previous.is_scroll() {
            self.state.only_second_line = true;
        }

        if current == TextboxState::Closed {
            self.state.insta_text = false;
        }
        self.state.previous = Some(capture);
        self.state.previous_state = current;
        Ok(emitted)
    }

    /// Drops whatever box is still open. Used when the input ends or is aborted.
    pub fn discard_open_box(&mut self) {
        if self.state.previous_state != TextboxState::Closed {
            debug!(
                "Discarding {} textbox opened at frame {:?}",
                self.state.previous_state, self.state.opening.opened_at
            );
        }
        self.state = PipelineState::default();
    }

    fn check_opening(
        &mut self,
        capture: &TextCapture,
        current: TextboxState,
        index: u64,
    ) -> Result<(), RecognitionError> {
        self.state.opening = OpeningTrace {
            opened_at: Some(index),
            opening_length: 0,
        };
        if capture.is_empty(self.profile.geometry.empty_check) {
            self.state.insta_text = false;
            return Ok(());
        }
        let (line1, line2) = self.read_capture(capture, current, false)?;
        let length = line1.chars().count() + line2.chars().count();
        self.state.opening.opening_length = length;
        if length > self.settings.instant_text_min_chars {
            debug!("Frame {}: {} characters on opening, instant text", index, length);
            self.state.insta_text = true;
        }
        Ok(())
    }

    /// Emits the text of the previous frame, the last fully drawn one.
    fn flush(
        &mut self,
        index: u64,
        continues: bool,
    ) -> Result<Option<DialogueEntry>, RecognitionError> {
        let only_second_line = std::mem::take(&mut self.state.only_second_line);
        let Some(previous) = self.state.previous.as_ref() else {
            return Ok(None);
        };
        let (line1, line2) =
            self.read_capture(previous, self.state.previous_state, only_second_line)?;
        let entry = DialogueEntry::new(line1, line2, index).with_continuation(continues);
        debug!(
            "Frame {}: flushing box opened at {:?} ({} -> {} characters)",
            index,
            self.state.opening.opened_at,
            self.state.opening.opening_length,
            entry.character_count()
        );
        if entry.is_empty() {
            return Ok(None);
        }
        if self.settings.discard_garbage {
            let text = entry.lines().collect::<Vec<_>>().join(" ");
            if is_garbage_text(&text) {
                debug!("Frame {}: discarding artefact {:?}", index, text);
                return Ok(None);
            }
        }
        Ok(Some(entry))
    }

    fn read_capture(
        &self,
        capture: &TextCapture,
        state: TextboxState,
        only_second_line: bool,
    ) -> Result<(String, String), RecognitionError> {
        let rectified = capture.rectify();
        let profile = &self.profile;
        if state == TextboxState::BigText {
            let line = text_line(&rectified, 0, profile.big_char_height);
            return Ok((self.read_line(&line, GlyphScale::Stretched)?, String::new()));
        }
        let second = text_line(&rectified, profile.line2_offset(), profile.char_height);
        let second = self.read_line(&second, GlyphScale::Normal)?;
        if only_second_line {
            return Ok((second, String::new()));
        }
        let first = text_line(&rectified, 0, profile.char_height);
        Ok((self.read_line(&first, GlyphScale::Normal)?, second))
    }

    fn read_line(&self, line: &GrayImage, scale: GlyphScale) -> Result<String, RecognitionError> {
        // Dark captures come from scenes drawn over the box area, not from a textbox.
        if mean_luma(line) < f64::from(self.profile.validity_threshold) {
            return Ok(String::new());
        }
        match self.recognizer.recognize(line, scale) {
            Ok(recognized) => {
                debug!(
                    "{} read {} characters, mean confidence {:.3}",
                    self.recognizer.name(),
                    recognized.len(),
                    recognized.mean_confidence()
                );
                Ok(recognized.stripped_text())
            }
            Err(e @ RecognitionError::EngineNotFound(_)) => Err(e),
            Err(e) => {
                warn!(
                    "{} failed on a line, treating it as unread: {}",
                    self.recognizer.name(),
                    e
                );
                Ok(String::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::services::image::analysis::TextboxClassifier;
    use crate::pipeline::services::recognition::{TemplateLibrary, TemplateRecognizer};
    use crate::pipeline::types::RecognizedLine;
    use crate::test_support::{frames, synthetic_library, SyntheticScreen};
    use image::RgbImage;

    fn assembler(library: &TemplateLibrary) -> DialogueAssembler {
        let recognizer = TemplateRecognizer::new(Arc::new(library.clone()));
        DialogueAssembler::new(GameProfile::diamond_pearl(), Arc::new(recognizer))
    }

    fn run(assembler: &mut DialogueAssembler, screens: &[RgbImage]) -> Vec<DialogueEntry> {
        let layout = ScreenLayout::native();
        let classifier = TextboxClassifier::default();
        let mut entries = Vec::new();
        for frame in frames(screens) {
            let state = classifier.classify(&frame, &layout).state;
            if let Some(entry) = assembler.process(&frame, &layout, state).unwrap() {
                entries.push(entry);
            }
        }
        entries
    }

    /// Screens for a box whose two lines appear one character per frame.
    fn typed(library: &TemplateLibrary, line1: &str, line2: &str) -> Vec<RgbImage> {
        let mut screens = vec![SyntheticScreen::new().with_textbox().render()];
        for n in 1..=line1.chars().count() {
            let partial: String = line1.chars().take(n).collect();
            screens.push(
                SyntheticScreen::new()
                    .with_textbox()
                    .with_lines(library, &partial, "")
                    .render(),
            );
        }
        for n in 1..=line2.chars().count() {
            let partial: String = line2.chars().take(n).collect();
            screens.push(
                SyntheticScreen::new()
                    .with_textbox()
                    .with_lines(library, line1, &partial)
                    .render(),
            );
        }
        screens
    }

    fn closed() -> RgbImage {
        SyntheticScreen::new().render()
    }

    #[test]
    fn no_textbox_yields_nothing() {
        let library = synthetic_library();
        let mut assembler = assembler(&library);
        let entries = run(&mut assembler, &vec![closed(); 12]);
        assert!(entries.is_empty());
    }

    #[test]
    fn slow_text_is_emitted_on_close() {
        let library = synthetic_library();
        let mut assembler = assembler(&library);
        let mut screens = vec![closed()];
        screens.extend(typed(&library, "Welcome to the world", "of Pokemon!"));
        screens.push(closed());
        let entries = run(&mut assembler, &screens);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].line1, "Welcome to the world");
        assert_eq!(entries[0].line2, "of Pokemon!");
        assert!(!entries[0].continues);
        assert_eq!(entries[0].frame, screens.len() as u64 - 1);
    }

    #[test]
    fn instant_text_is_never_emitted() {
        let library = synthetic_library();
        let mut assembler = assembler(&library);
        let full = SyntheticScreen::new()
            .with_textbox()
            .with_lines(&library, "Your bag is full", "of items")
            .render();
        let mut screens = vec![closed(), full.clone(), full.clone(), full, closed()];
        screens.extend(typed(&library, "Hi", ""));
        screens.push(closed());
        let entries = run(&mut assembler, &screens);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].line1, "Hi");
    }

    #[test]
    fn instant_box_replaced_in_place_is_dropped() {
        let library = synthetic_library();
        let mut assembler = assembler(&library);
        let layout = ScreenLayout::native();
        let classifier = TextboxClassifier::default();
        let full = SyntheticScreen::new()
            .with_textbox()
            .with_lines(&library, "Your bag is full", "of items")
            .render();
        let feed = |assembler: &mut DialogueAssembler, index: usize, screen: &RgbImage| {
            let frame = Frame::new(index as u64, screen.clone());
            let state = classifier.classify(&frame, &layout).state;
            assembler.process(&frame, &layout, state).unwrap()
        };

        let mut entries = Vec::new();
        let mut index = 0;
        for screen in [closed(), full.clone(), full] {
            entries.extend(feed(&mut assembler, index, &screen));
            index += 1;
        }
        assert!(assembler.state().is_instant_text());

        // `typed` starts with the empty box that replaces the instant one.
        let mut slow = typed(&library, "Slow words here", "").into_iter();
        if let Some(empty) = slow.next() {
            entries.extend(feed(&mut assembler, index, &empty));
            index += 1;
        }
        assert!(!assembler.state().is_instant_text());
        for screen in slow.chain(std::iter::once(closed())) {
            entries.extend(feed(&mut assembler, index, &screen));
            index += 1;
        }

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].line1, "Slow words here");
        assert!(entries[0].line2.is_empty());
    }

    struct FailingRecognizer(fn() -> RecognitionError);

    impl LineRecognizer for FailingRecognizer {
        fn recognize(
            &self,
            _line: &GrayImage,
            _scale: GlyphScale,
        ) -> Result<RecognizedLine, RecognitionError> {
            Err((self.0)())
        }

        fn name(&self) -> &'static str {
            "failing"
        }
    }

    #[test]
    fn engine_failures_leave_the_line_unread() {
        let library = synthetic_library();
        let screen = SyntheticScreen::new()
            .with_textbox()
            .with_lines(&library, "Hi", "")
            .render();
        let layout = ScreenLayout::native();
        let opened = Frame::new(0, screen);

        let failing = FailingRecognizer(|| RecognitionError::EngineFailed("bad line".to_string()));
        let mut assembler = DialogueAssembler::new(GameProfile::diamond_pearl(), Arc::new(failing));
        assert!(assembler.process(&opened, &layout, TextboxState::Open).unwrap().is_none());
        assert!(!assembler.state().is_instant_text());

        let missing = FailingRecognizer(|| RecognitionError::EngineNotFound("tesseract".into()));
        let mut assembler = DialogueAssembler::new(GameProfile::diamond_pearl(), Arc::new(missing));
        assert!(matches!(
            assembler.process(&opened, &layout, TextboxState::Open),
            Err(RecognitionError::EngineNotFound(_))
        ));
    }

    #[test]
    fn new_page_flushes_previous_page() {
        let library = synthetic_library();
        let mut assembler = assembler(&library);
        let mut screens = vec![closed()];
        screens.extend(typed(&library, "First page of text", "goes here"));
        screens.extend(typed(&library, "Second page", "follows it"));
        screens.push(closed());
        let entries = run(&mut assembler, &screens);
        let lines: Vec<(&str, &str)> = entries
            .iter()
            .map(|e| (e.line1.as_str(), e.line2.as_str()))
            .collect();
        assert_eq!(
            lines,
            vec![("First page of text", "goes here"), ("Second page", "follows it")]
        );
    }

    #[test]
    fn scroll_emits_each_line_once() {
        let library = synthetic_library();
        let mut assembler = assembler(&library);
        let (a, b, c) = ("Line number one here", "and line number two", "then line three");
        let mut screens = vec![closed()];
        screens.extend(typed(&library, a, b));
        for phase in 1..=3 {
            screens.push(
                SyntheticScreen::new()
                    .with_textbox()
                    .with_lines(&library, a, b)
                    .with_scroll_phase(phase)
                    .render(),
            );
        }
        screens.push(SyntheticScreen::new().with_textbox().with_lines(&library, b, "").render());
        for n in 1..=c.chars().count() {
            let partial: String = c.chars().take(n).collect();
            screens.push(
                SyntheticScreen::new()
                    .with_textbox()
                    .with_lines(&library, b, &partial)
                    .render(),
            );
        }
        screens.push(closed());

        let entries = run(&mut assembler, &screens);
        assert_eq!(entries.len(), 2);
        assert_eq!((entries[0].line1.as_str(), entries[0].line2.as_str()), (a, b));
        assert!(entries[0].continues);
        assert_eq!(entries[1].line1, c);
        assert!(entries[1].line2.is_empty());
        assert!(!assembler.state().only_second_line());
    }

    #[test]
    fn big_text_uses_stretched_templates() {
        // States are supplied directly: a half-typed big line can read as any
        // state while fewer than a handful of glyphs cross the probe strips.
        let library = synthetic_library();
        let mut assembler = assembler(&library);
        let layout = ScreenLayout::native();
        let text = "Hello there";
        let mut screens = vec![
            (closed(), TextboxState::Closed),
            (SyntheticScreen::new().with_textbox().render(), TextboxState::Open),
        ];
        for n in 1..=text.chars().count() {
            let partial: String = text.chars().take(n).collect();
            let screen = SyntheticScreen::new()
                .with_textbox()
                .with_big_text(&library, &partial)
                .render();
            screens.push((screen, TextboxState::BigText));
        }
        screens.push((closed(), TextboxState::Closed));

        let mut entries = Vec::new();
        for (index, (screen, state)) in screens.into_iter().enumerate() {
            let frame = Frame::new(index as u64, screen);
            entries.extend(assembler.process(&frame, &layout, state).unwrap());
        }
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].line1, text);
        assert!(entries[0].line2.is_empty());
    }

    #[test]
    fn open_box_at_end_of_input_is_discarded() {
        let library = synthetic_library();
        let mut assembler = assembler(&library);
        let mut screens = vec![closed()];
        screens.extend(typed(&library, "Never finished", ""));
        let entries = run(&mut assembler, &screens);
        assert!(entries.is_empty());
        assert!(assembler.state().previous_state().is_open_like());
        assembler.discard_open_box();
        assert_eq!(assembler.state().previous_state(), TextboxState::Closed);
    }

    #[test]
    fn dark_captures_read_as_empty() {
        let library = synthetic_library();
        let mut assembler = assembler(&library);
        let layout = ScreenLayout::native();
        let dark = Frame::new(0, RgbImage::new(256, 192));
        assert!(assembler.process(&dark, &layout, TextboxState::Open).unwrap().is_none());
        let closed = Frame::new(1, RgbImage::new(256, 192));
        let flushed = assembler.process(&closed, &layout, TextboxState::Closed).unwrap();
        assert!(flushed.is_none());
    }
}
