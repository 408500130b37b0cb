pub mod image;
pub mod orchestration;
pub mod recognition;

pub use orchestration::{DialogueAssembler, DialogueSession};
pub use recognition::{LineRecognizer, TemplateLibrary, TemplateRecognizer};
