use crate::{
    config::Configuration,
    error::AppError,
    intake::frame::ImageSequenceReader,
    pipeline::{
        services::{
            image::analysis::GameProfile,
            recognition::{LineRecognizer, TemplateLibrary, TemplateRecognizer},
        },
        DialogueAssembler, DialogueSession, Transcript,
    },
};
use futures::future::join_all;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

/// Runs one session per input. Sessions run side by side on blocking tasks,
/// each one strictly sequential over its own frames.
pub struct Coordinator {
    configuration: Configuration,
    profile: GameProfile,
    recognizer: Arc<dyn LineRecognizer>,
}

impl Coordinator {
    pub async fn run(&self, inputs: Vec<PathBuf>) -> Vec<(PathBuf, Result<Transcript, AppError>)> {
        info!(
            "Processing {} input(s) for {} with the {} recognizer",
            inputs.len(),
            self.profile.name,
            self.recognizer.name()
        );
        let tasks = inputs.into_iter().map(|input| {
            let configuration = self.configuration.clone();
            let profile = self.profile.clone();
            let recognizer = Arc::clone(&self.recognizer);
            let path = input.clone();
            let task = tokio::task::spawn_blocking(move || {
                Self::run_session(&path, &configuration, profile, recognizer)
            });
            async move {
                let result = match task.await {
                    Ok(result) => result,
                    Err(e) => Err(AppError::Task(e)),
                };
                if let Err(e) = &result {
                    error!("{}: {}", input.display(), e);
                }
                (input, result)
            }
        });
        join_all(tasks).await
    }

    fn run_session(
        input: &Path,
        configuration: &Configuration,
        profile: GameProfile,
        recognizer: Arc<dyn LineRecognizer>,
    ) -> Result<Transcript, AppError> {
        let reader = ImageSequenceReader::open(input)?
            .with_fps(configuration.fps)
            .with_window(configuration.frame_window());
        let detector = configuration.layout_detector(profile.geometry.clone());
        let assembler = DialogueAssembler::new(profile, recognizer)
            .with_settings(configuration.assembler_settings());
        DialogueSession::new(input.display().to_string(), assembler)
            .with_detector(detector)
            .with_probe_frames(configuration.layout_probe_frames)
            .run(reader)
    }
}

pub struct CoordinatorBuilder {
    configuration: Configuration,
    recognizer: Option<Arc<dyn LineRecognizer>>,
}

impl CoordinatorBuilder {
    pub fn new(configuration: Configuration) -> Self {
        Self {
            configuration,
            recognizer: None,
        }
    }

    // Selects the game profile, this will override the configuration.
    pub fn game(mut self, game: impl Into<String>) -> Self {
        self.configuration.game = game.into();
        self.configuration.profile = None;
        self
    }

    // Sets the template directory, this will override the configuration.
    pub fn templates_dir(mut self, templates_dir: PathBuf) -> Self {
        self.configuration.templates_dir = templates_dir;
        self
    }

    // Sets the recording frame rate, this will override the configuration.
    pub fn fps(mut self, fps: f64) -> Self {
        self.configuration.fps = fps;
        self
    }

    // Limits processing to a time window, this will override the configuration.
    pub fn window(mut self, start_seconds: Option<f64>, end_seconds: Option<f64>) -> Self {
        if start_seconds.is_some() {
            self.configuration.start_seconds = start_seconds;
        }
        if end_seconds.is_some() {
            self.configuration.end_seconds = end_seconds;
        }
        self
    }

    /// Uses `recognizer` instead of templates loaded from `templates_dir`.
    pub fn recognizer(mut self, recognizer: Arc<dyn LineRecognizer>) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    pub fn build(self) -> Result<Coordinator, AppError> {
        self.configuration.validate()?;
        let profile = self.configuration.game_profile()?;
        let recognizer = match self.recognizer {
            Some(recognizer) => recognizer,
            None => {
                let library = TemplateLibrary::load_dir(
                    &self.configuration.templates_dir,
                    self.configuration.darkness_threshold,
                )?;
                Arc::new(
                    TemplateRecognizer::new(Arc::new(library))
                        .with_settings(self.configuration.recognizer_settings()),
                )
            }
        };
        Ok(Coordinator {
            configuration: self.configuration,
            profile,
            recognizer,
        })
    }
}
