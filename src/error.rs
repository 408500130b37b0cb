use std::path::PathBuf;
use thiserror::Error;

// Main Application Error Type

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Layout Error: {0}")]
    Layout(#[from] LayoutError),
    #[error("Template Error: {0}")]
    Template(#[from] TemplateError),
    #[error("Source Error: {0}")]
    Source(#[from] SourceError),
    #[error("Configuration Error: {0}")]
    Config(#[from] ConfigError),
    #[error("Recognition Error: {0}")]
    Recognition(#[from] RecognitionError),
    #[error("Failed to write output to {1}: {0}")]
    Output(std::io::Error, PathBuf),
    #[error("Failed to serialize transcript: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Session task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

// Screen layout detection. Unrecoverable: a run aborts before any frame is classified.
#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("Layout detection failed for a {width}x{height} frame: {reason}")]
    LayoutDetectionFailed {
        width: u32,
        height: u32,
        reason: String,
    },
}

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Template directory not found: {0}")]
    DirectoryNotFound(PathBuf),
    #[error("Failed to list template directory {1}: {0}")]
    ReadDirectory(std::io::Error, PathBuf),
    #[error("Failed to load template {1}: {0}")]
    Load(image::ImageError, PathBuf),
    #[error("No usable glyph templates in {0}")]
    Empty(PathBuf),
    #[error("Template catalog is empty")]
    EmptyCatalog,
    #[error("Stretched template for '{glyph}' is {actual}px tall, expected {expected}px")]
    StretchedSize {
        glyph: char,
        expected: u32,
        actual: u32,
    },
}

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Frame source not found: {0}")]
    NotFound(PathBuf),
    #[error("Failed to list frames in {1}: {0}")]
    ReadDirectory(std::io::Error, PathBuf),
    #[error("No decodable frames in {0}")]
    Empty(PathBuf),
    #[error("Failed to decode frame {1}: {0}")]
    Decode(image::ImageError, PathBuf),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
    #[error("Unknown game profile '{0}' (expected diamond_pearl, platinum or hgss)")]
    UnknownGame(String),
}

#[derive(Error, Debug)]
pub enum RecognitionError {
    #[error("OCR engine executable not found: {0}")]
    EngineNotFound(String),
    #[error("Failed to stage bitmap for the OCR engine: {0}")]
    Staging(std::io::Error),
    #[error("Failed to encode bitmap for the OCR engine: {0}")]
    Encode(image::ImageError),
    #[error("Failed to run the OCR engine: {0}")]
    Spawn(std::io::Error),
    #[error("OCR engine failed: {0}")]
    EngineFailed(String),
}
