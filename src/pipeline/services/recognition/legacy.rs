use super::template_recognizer::LineRecognizer;
use super::templates::GlyphScale;
use crate::error::RecognitionError;
use crate::pipeline::types::RecognizedLine;
use image::imageops::{self, FilterType};
use image::GrayImage;
use std::io::ErrorKind;
use std::process::Command;
use tempfile::NamedTempFile;
use tracing::debug;

/// External OCR engine: raw bitmap in, raw string out.
pub trait OcrEngine: Send + Sync {
    fn read_text(&self, bitmap: &GrayImage) -> Result<String, RecognitionError>;
    fn name(&self) -> &'static str;
}

/// Runs the `tesseract` executable on a temporary PNG.
#[derive(Debug, Clone)]
pub struct TesseractCli {
    executable: String,
    language: String,
    upscale: u32,
}

impl TesseractCli {
    pub fn new() -> Self {
        Self {
            executable: "tesseract".to_string(),
            language: "eng".to_string(),
            upscale: 3,
        }
    }

    pub fn with_executable(mut self, executable: impl Into<String>) -> Self {
        self.executable = executable.into();
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }
}

impl Default for TesseractCli {
    fn default() -> Self {
        Self::new()
    }
}

impl OcrEngine for TesseractCli {
    fn read_text(&self, bitmap: &GrayImage) -> Result<String, RecognitionError> {
        // Native 15px glyphs are too small for the engine.
        let enlarged = imageops::resize(
            bitmap,
            bitmap.width() * self.upscale,
            bitmap.height() * self.upscale,
            FilterType::Nearest,
        );
        let input = NamedTempFile::with_suffix(".png").map_err(RecognitionError::Staging)?;
        enlarged
            .save(input.path())
            .map_err(RecognitionError::Encode)?;

        let output = Command::new(&self.executable)
            .arg(input.path())
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .arg("--psm")
            .arg("7") // Single text line
            .arg("-c")
            .arg("tessedit_char_blacklist=*_=+|[]")
            .output()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => RecognitionError::EngineNotFound(self.executable.clone()),
                _ => RecognitionError::Spawn(e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RecognitionError::EngineFailed(stderr.trim().to_string()));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn name(&self) -> &'static str {
        "tesseract"
    }
}

/// Adapts an [`OcrEngine`] to the line recognizer used by the dialogue assembler.
pub struct EngineRecognizer<E: OcrEngine> {
    engine: E,
}

impl<E: OcrEngine> EngineRecognizer<E> {
    pub fn new(engine: E) -> Self {
        Self { engine }
    }
}

impl<E: OcrEngine> LineRecognizer for EngineRecognizer<E> {
    fn recognize(
        &self,
        line: &GrayImage,
        _scale: GlyphScale,
    ) -> Result<RecognizedLine, RecognitionError> {
        let raw = self.engine.read_text(line)?;
        debug!("{} read {:?}", self.engine.name(), raw);
        let text = raw.lines().next().unwrap_or("").trim();
        Ok(RecognizedLine::from_text(text))
    }

    fn name(&self) -> &'static str {
        self.engine.name()
    }
}
