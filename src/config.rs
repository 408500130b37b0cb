use crate::error::ConfigError;
use crate::intake::frame::FrameWindow;
use crate::pipeline::services::image::analysis::{
    ClassifierThresholds, GameProfile, ScreenLayoutDetector, TextboxGeometry,
};
use crate::pipeline::services::orchestration::AssemblerSettings;
use crate::pipeline::services::recognition::{RecognizerSettings, TesseractCli};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const ENV_PREFIX: &str = "POKETEXT";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Built-in profile id, see [`GameProfile::by_id`].
    pub game: String,
    /// Replaces the built-in coordinate table when set.
    pub profile: Option<GameProfile>,
    pub templates_dir: PathBuf,
    pub fps: f64,
    pub start_seconds: Option<f64>,
    pub end_seconds: Option<f64>,
    pub layout_probe_frames: usize,
    /// Allowed relative deviation from 4:3 for single-screen recordings.
    pub aspect_tolerance: f64,
    pub boundary_search: u32,
    pub discard_garbage: bool,
    pub match_threshold: f32,
    pub big_match_threshold: f32,
    pub darkness_threshold: u8,
    pub space_threshold: u8,
    pub instant_text_min_chars: usize,
    pub diff_delta: u8,
    pub diff_pixels: f64,
    pub tesseract_executable: String,
    pub tesseract_language: String,
}

impl Default for Configuration {
    fn default() -> Self {
        let recognizer = RecognizerSettings::default();
        let thresholds = ClassifierThresholds::default();
        Self {
            game: "diamond_pearl".to_string(),
            profile: None,
            templates_dir: PathBuf::from("templates"),
            fps: 60.0,
            start_seconds: None,
            end_seconds: None,
            layout_probe_frames: 5,
            aspect_tolerance: 0.05,
            boundary_search: 100,
            discard_garbage: false,
            match_threshold: recognizer.match_threshold,
            big_match_threshold: recognizer.big_match_threshold,
            darkness_threshold: recognizer.darkness_threshold,
            space_threshold: recognizer.space_threshold,
            instant_text_min_chars: 3,
            diff_delta: thresholds.diff_delta,
            diff_pixels: thresholds.diff_pixels,
            tesseract_executable: "tesseract".to_string(),
            tesseract_language: "eng".to_string(),
        }
    }
}

impl Configuration {
    /// Defaults, then the optional TOML file, then `POKETEXT_*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        let configuration: Configuration = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()?;
        configuration.validate()?;
        Ok(configuration)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.fps.is_finite() && self.fps > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "fps must be positive, got {}",
                self.fps
            )));
        }
        for (name, value) in [
            ("start_seconds", self.start_seconds),
            ("end_seconds", self.end_seconds),
        ] {
            if value.is_some_and(|v| !v.is_finite() || v < 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "{} must not be negative",
                    name
                )));
            }
        }
        if let (Some(start), Some(end)) = (self.start_seconds, self.end_seconds) {
            if end <= start {
                return Err(ConfigError::Invalid(format!(
                    "end_seconds ({}) must be after start_seconds ({})",
                    end, start
                )));
            }
        }
        if self.layout_probe_frames == 0 {
            return Err(ConfigError::Invalid(
                "layout_probe_frames must be at least 1".to_string(),
            ));
        }
        if !(self.aspect_tolerance > 0.0 && self.aspect_tolerance < 0.5) {
            return Err(ConfigError::Invalid(format!(
                "aspect_tolerance must be in (0, 0.5), got {}",
                self.aspect_tolerance
            )));
        }
        if self.tesseract_language.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "tesseract_language must not be empty".to_string(),
            ));
        }
        for (name, value) in [
            ("match_threshold", self.match_threshold),
            ("big_match_threshold", self.big_match_threshold),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(ConfigError::Invalid(format!(
                    "{} must be in (0, 1], got {}",
                    name, value
                )));
            }
        }
        if self.space_threshold <= self.darkness_threshold {
            return Err(ConfigError::Invalid(format!(
                "space_threshold ({}) must be above darkness_threshold ({})",
                self.space_threshold, self.darkness_threshold
            )));
        }
        if self.diff_pixels <= 0.0 {
            return Err(ConfigError::Invalid(
                "diff_pixels must be positive".to_string(),
            ));
        }
        self.game_profile()?.validate()
    }

    pub fn game_profile(&self) -> Result<GameProfile, ConfigError> {
        match &self.profile {
            Some(profile) => Ok(profile.clone()),
            None => GameProfile::by_id(&self.game),
        }
    }

    pub fn recognizer_settings(&self) -> RecognizerSettings {
        RecognizerSettings {
            match_threshold: self.match_threshold,
            big_match_threshold: self.big_match_threshold,
            darkness_threshold: self.darkness_threshold,
            space_threshold: self.space_threshold,
            ..RecognizerSettings::default()
        }
    }

    pub fn assembler_settings(&self) -> AssemblerSettings {
        AssemblerSettings {
            instant_text_min_chars: self.instant_text_min_chars,
            discard_garbage: self.discard_garbage,
            thresholds: ClassifierThresholds {
                diff_delta: self.diff_delta,
                diff_pixels: self.diff_pixels,
            },
        }
    }

    pub fn frame_window(&self) -> FrameWindow {
        FrameWindow::new(self.start_seconds, self.end_seconds)
    }

    pub fn layout_detector(&self, geometry: TextboxGeometry) -> ScreenLayoutDetector {
        ScreenLayoutDetector::new()
            .with_aspect_tolerance(self.aspect_tolerance)
            .with_boundary_search(self.boundary_search)
            .with_geometry(geometry)
    }

    pub fn tesseract(&self) -> TesseractCli {
        TesseractCli::new()
            .with_executable(self.tesseract_executable.clone())
            .with_language(self.tesseract_language.clone())
    }
}
